//! 2HDMC's `CalcHybrid` front end.
//!
//! `CalcHybrid` takes the hybrid-basis parameters as positional command-line
//! arguments and writes one SLHA file with the mass spectrum, the decay
//! tables and the theory-consistency flags.

pub mod parser;

pub use parser::ThdmcOutput;

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::domain::{ModelInput, PointFailure};
use crate::lha::numbers::format_decimal;
use crate::tools::exec::{CancelToken, ExecRequest, run_captured};

/// Positional `CalcHybrid` arguments for one model point, output path last.
pub fn calc_hybrid_args(input: &ModelInput, output_path: &Path) -> Vec<String> {
    vec![
        format_decimal(input.m_light),
        format_decimal(input.m_heavy),
        format_decimal(input.cos_betal),
        format_decimal(input.z4),
        format_decimal(input.z5),
        format_decimal(input.z7),
        format_decimal(input.tanb),
        input.yukawa_type.code().to_string(),
        output_path.display().to_string(),
    ]
}

/// Runs `CalcHybrid` and parses the file it leaves at `output_path`.
pub fn run(
    executable: &Path,
    input: &ModelInput,
    output_path: &Path,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<ThdmcOutput, PointFailure> {
    let request = ExecRequest {
        program: executable.to_path_buf(),
        args: calc_hybrid_args(input, output_path),
        timeout,
    };
    let capture = run_captured(&request, cancel)?;
    debug!(
        elapsed_ms = capture.elapsed.as_millis() as u64,
        output = %output_path.display(),
        "CalcHybrid finished"
    );
    if !output_path.exists() {
        return Err(PointFailure::Execution(format!(
            "CalcHybrid exited cleanly but left no output at '{}'",
            output_path.display()
        )));
    }
    ThdmcOutput::from_path(output_path)
}

#[cfg(test)]
mod tests {
    use super::calc_hybrid_args;
    use crate::domain::{ModelInput, YukawaType};
    use std::path::Path;

    #[test]
    fn arguments_follow_the_calchybrid_order() {
        let input = ModelInput {
            m_light: 125.0,
            m_heavy: 300.0,
            cos_betal: 0.1,
            z4: 0.1,
            z5: 0.1,
            z7: 0.0,
            tanb: 8.5,
            yukawa_type: YukawaType::TypeTwo,
        };
        let args = calc_hybrid_args(&input, Path::new("out/2HDMC_output.tag.out"));
        assert_eq!(
            args,
            vec![
                "125.0",
                "300.0",
                "0.1",
                "0.1",
                "0.1",
                "0.0",
                "8.5",
                "2",
                "out/2HDMC_output.tag.out",
            ]
        );
    }
}
