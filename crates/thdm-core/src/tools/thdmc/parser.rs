//! Readers for the `CalcHybrid` output file.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::domain::{HiggsBoson, PointFailure};
use crate::lha::LhaFile;
use crate::lha::numbers::parse_real;

/// PDG ids of the tau pair looked up in the decay tables.
const TAU_PAIR: (i32, i32) = (15, -15);

/// Parsed `CalcHybrid` output for one model point.
#[derive(Debug)]
pub struct ThdmcOutput {
    file: LhaFile,
}

impl ThdmcOutput {
    pub fn parse(text: &str) -> Result<Self, PointFailure> {
        let file = LhaFile::parse(text)
            .map_err(|error| PointFailure::Parse(format!("2HDMC output: {error}")))?;
        Ok(Self { file })
    }

    pub fn from_path(path: &Path) -> Result<Self, PointFailure> {
        let text = fs::read_to_string(path).map_err(|source| {
            PointFailure::Execution(format!("cannot read '{}': {source}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// Whether 2HDMC judged the point theoretically sound. The `THDM` block
    /// carries four 0/1 flags (stability, unitarity, perturbativity, EW
    /// precision); the point counts as valid only when all four are set.
    pub fn valid_model(&self) -> Result<bool, PointFailure> {
        let mut sum = 0.0;
        for flag in 1..=4 {
            sum += self.real_entry("THDM", &flag.to_string())?;
        }
        Ok(sum == 4.0)
    }

    /// Mass of a neutral state in GeV.
    pub fn mass(&self, boson: HiggsBoson) -> Result<f64, PointFailure> {
        self.real_entry("MASS", &boson.pdg_id().to_string())
    }

    /// Mass of the charged state in GeV.
    pub fn charged_mass(&self) -> Result<f64, PointFailure> {
        self.real_entry("MASS", "37")
    }

    /// Branching ratio of a neutral state into tau pairs. A missing tau row
    /// in an otherwise present decay table means the channel is closed, so
    /// it reads as zero.
    pub fn br_tautau(&self, boson: HiggsBoson) -> Result<f64, PointFailure> {
        let pdg = boson.pdg_id();
        let decay = self.file.decay(pdg).ok_or_else(|| {
            PointFailure::Parse(format!("2HDMC output: no decay table for particle {pdg}"))
        })?;
        match decay.branching_ratio(TAU_PAIR.0, TAU_PAIR.1) {
            Some(token) => parse_real(token).map_err(PointFailure::from),
            None => {
                warn!(boson = %boson, "no tau-pair row in the decay table, assuming BR = 0");
                Ok(0.0)
            }
        }
    }

    fn real_entry(&self, block: &str, key: &str) -> Result<f64, PointFailure> {
        self.file.real(block, key).map_err(PointFailure::from)
    }
}
