//! SusHi invocation.
//!
//! SusHi reads a prepared deck and writes its results next to it; the argv
//! contract is just `sushi <input> <output>`. The deck is kept on disk after
//! the run so a point can be reproduced by hand.

pub mod deck;
pub mod parser;

pub use parser::SusHiOutput;

use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::domain::{HiggsBoson, ModelInput, PointFailure};
use crate::tools::exec::{CancelToken, ExecRequest, run_captured};

/// One SusHi invocation: which state, which PDF member, which files.
#[derive(Debug, Clone, Copy)]
pub struct SusHiJob<'a> {
    pub boson: HiggsBoson,
    pub pdf_member: Option<u32>,
    pub input_path: &'a Path,
    pub output_path: &'a Path,
}

/// Writes the deck for the job and executes SusHi on it.
pub fn run(
    executable: &Path,
    input: &ModelInput,
    job: SusHiJob<'_>,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<SusHiOutput, PointFailure> {
    let deck = deck::input_deck(input, job.boson, job.pdf_member);
    fs::write(job.input_path, deck.render()).map_err(|source| {
        PointFailure::Execution(format!(
            "cannot write SusHi input '{}': {source}",
            job.input_path.display()
        ))
    })?;
    let request = ExecRequest {
        program: executable.to_path_buf(),
        args: vec![
            job.input_path.display().to_string(),
            job.output_path.display().to_string(),
        ],
        timeout,
    };
    let capture = run_captured(&request, cancel)?;
    debug!(
        boson = %job.boson,
        pdf_member = job.pdf_member,
        elapsed_ms = capture.elapsed.as_millis() as u64,
        "SusHi finished"
    );
    if !job.output_path.exists() {
        return Err(PointFailure::Execution(format!(
            "SusHi exited cleanly but left no output at '{}'",
            job.output_path.display()
        )));
    }
    SusHiOutput::from_path(job.output_path)
}
