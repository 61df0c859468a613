mod commands;
mod helpers;

use clap::Parser;
use thdm_core::ScanError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            error.exit_code()
        }
    }
}

/// Callable entry point; prepends the binary name clap expects.
pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("thdm-scan".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{err}");
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "thdm-scan",
    about = "Two-parameter 2HDM grid scans over 2HDMC and SusHi"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Run every grid point, aggregate and write the artifact
    Scan(commands::ScanArgs),
    /// Run a single grid point by linear index
    Point(commands::PointArgs),
    /// Aggregate previously produced per-point outputs without running tools
    Collect(commands::CollectArgs),
    /// Print the enumerated grid of a scenario as "index x y"
    Points(commands::PointsArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Scan(args) => commands::run_scan_command(args),
        CliCommand::Point(args) => commands::run_point_command(args),
        CliCommand::Collect(args) => commands::run_collect_command(args),
        CliCommand::Points(args) => commands::run_points_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Scan(error) => error.exit_code(),
            Self::Internal(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, run};

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        let error = run(["frobnicate"]).unwrap_err();
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn missing_scenario_is_a_usage_error() {
        let error = run([
            "points",
            "--scenario",
            "no_such_scenario",
            "--scenario-dir",
            "/nonexistent",
        ])
        .unwrap_err();
        assert!(matches!(error, CliError::Usage(_)));
        let message = error.to_string();
        assert!(message.contains("no_such_scenario"), "{message}");
    }

    #[test]
    fn help_exits_cleanly() {
        assert_eq!(run(["--help"]).unwrap(), 0);
    }
}
