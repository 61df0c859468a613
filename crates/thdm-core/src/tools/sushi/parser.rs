//! Readers for the SusHi output file.

use std::fs;
use std::path::Path;

use crate::domain::PointFailure;
use crate::lha::LhaFile;

/// Parsed SusHi output for one neutral state at one model point.
#[derive(Debug)]
pub struct SusHiOutput {
    file: LhaFile,
}

impl SusHiOutput {
    pub fn parse(text: &str) -> Result<Self, PointFailure> {
        let file = LhaFile::parse(text)
            .map_err(|error| PointFailure::Parse(format!("SusHi output: {error}")))?;
        Ok(Self { file })
    }

    pub fn from_path(path: &Path) -> Result<Self, PointFailure> {
        let text = fs::read_to_string(path).map_err(|source| {
            PointFailure::Execution(format!("cannot read '{}': {source}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// Gluon-fusion cross section in pb.
    pub fn gg_xs(&self) -> Result<f64, PointFailure> {
        self.real_entry("SUSHIggh", "1")
    }

    /// Cross section at the lower edge of the scale variation.
    pub fn gg_xs_scale_down(&self) -> Result<f64, PointFailure> {
        self.real_entry("SUSHIggh", "102")
    }

    /// Cross section at the upper edge of the scale variation.
    pub fn gg_xs_scale_up(&self) -> Result<f64, PointFailure> {
        self.real_entry("SUSHIggh", "103")
    }

    /// Bottom-quark-annihilation cross section in pb.
    pub fn bb_xs(&self) -> Result<f64, PointFailure> {
        self.real_entry("SUSHIbbh", "1")
    }

    /// Mass SusHi actually ran with, cross-checked against 2HDMC.
    pub fn mass(&self) -> Result<f64, PointFailure> {
        self.real_entry("MASSOUT", "1")
    }

    fn real_entry(&self, block: &str, key: &str) -> Result<f64, PointFailure> {
        self.file.real(block, key).map_err(PointFailure::from)
    }
}

#[cfg(test)]
mod tests {
    use super::SusHiOutput;
    use crate::domain::PointFailure;

    const HEAVY_OUTPUT: &str = "\
# SusHi output
Block SUSHIggh # Bon appetit
    1\t4.89666677e-01 #  ggh XS in pb
  101\t-2.9401e-02 #  muR unc. -
  102\t4.520561e-01 #  muR unc. lower XS
  103\t5.380111e-01 #  muR unc. upper XS
Block SUSHIbbh # Bon appetit
    1\t7.2529e-01 #  bbh XS in pb
Block MASSOUT
    1\t300.0 #  Mass of the Higgs boson
    2\t4.18 #  m_b(m_b)";

    #[test]
    fn reads_cross_sections_and_mass() {
        let output = SusHiOutput::parse(HEAVY_OUTPUT).unwrap();
        assert_eq!(output.gg_xs().unwrap(), 0.489666677);
        assert_eq!(output.gg_xs_scale_down().unwrap(), 0.4520561);
        assert_eq!(output.gg_xs_scale_up().unwrap(), 0.5380111);
        assert_eq!(output.bb_xs().unwrap(), 0.72529);
        assert_eq!(output.mass().unwrap(), 300.0);
    }

    #[test]
    fn truncated_output_is_a_parse_failure() {
        let output = SusHiOutput::parse("# SusHi output\nBlock SUSHIggh\n    1\t0.5 #  xs").unwrap();
        assert!(output.gg_xs().is_ok());
        assert!(matches!(output.bb_xs(), Err(PointFailure::Parse(_))));
        assert!(matches!(
            output.gg_xs_scale_down(),
            Err(PointFailure::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_execution_failure() {
        let result = SusHiOutput::from_path(std::path::Path::new("/no/such/sushi.out"));
        assert!(matches!(result, Err(PointFailure::Execution(_))));
    }
}
