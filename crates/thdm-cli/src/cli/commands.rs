use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thdm_core::driver;
use thdm_core::{
    CancelToken, DuplicatePolicy, PointContext, ScanConfig, ScanDriver, ScanError, ToolPaths,
    render_human_summary,
};

use super::CliError;
use super::helpers;

/// Flags shared by every subcommand that names a scenario.
#[derive(clap::Args)]
pub(super) struct ScenarioFlags {
    /// Scenario name under the scenario directory, or a path to a YAML file
    #[arg(long)]
    pub(super) scenario: String,

    /// Directory searched when --scenario is a bare name
    #[arg(long, default_value = "scenarios")]
    pub(super) scenario_dir: PathBuf,
}

/// Flags shared by the subcommands that produce or read per-point output.
#[derive(clap::Args)]
pub(super) struct RunFlags {
    /// Version tag separating repeated runs of the same scenario
    #[arg(long)]
    pub(super) version: String,

    /// Also run the PDF member variations and record pdf+alphas bands
    #[arg(long)]
    pub(super) pdf_uncertainties: bool,

    /// Seconds each tool invocation may take
    #[arg(long, default_value_t = 300)]
    pub(super) timeout_secs: u64,

    /// Root under which <scenario>/<version>/ is created
    #[arg(long, default_value = "data")]
    pub(super) output_root: PathBuf,
}

/// Where to find CalcHybrid and SusHi.
#[derive(clap::Args)]
pub(super) struct ToolFlags {
    /// Root containing 2HDMC/ and SusHi/; defaults to $THEORY_CODE_PATH
    #[arg(long)]
    pub(super) tools_root: Option<PathBuf>,

    /// Explicit CalcHybrid binary, overrides the root layout
    #[arg(long)]
    pub(super) thdmc_bin: Option<PathBuf>,

    /// Explicit SusHi binary, overrides the root layout
    #[arg(long)]
    pub(super) sushi_bin: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(super) enum DuplicateFlag {
    Overwrite,
    Reject,
}

impl DuplicateFlag {
    const fn policy(self) -> DuplicatePolicy {
        match self {
            Self::Overwrite => DuplicatePolicy::Overwrite,
            Self::Reject => DuplicatePolicy::Reject,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct ScanArgs {
    #[command(flatten)]
    scenario: ScenarioFlags,

    #[command(flatten)]
    run: RunFlags,

    #[command(flatten)]
    tools: ToolFlags,

    /// Worker pool size
    #[arg(long, default_value_t = helpers::default_jobs())]
    jobs: usize,

    /// What to do when two results land on the same grid cell
    #[arg(long, value_enum, default_value_t = DuplicateFlag::Overwrite)]
    on_duplicate: DuplicateFlag,
}

#[derive(clap::Args)]
pub(super) struct PointArgs {
    #[command(flatten)]
    scenario: ScenarioFlags,

    #[command(flatten)]
    run: RunFlags,

    #[command(flatten)]
    tools: ToolFlags,

    /// Linear grid index as printed by `points`
    #[arg(long)]
    index: usize,
}

#[derive(clap::Args)]
pub(super) struct CollectArgs {
    #[command(flatten)]
    scenario: ScenarioFlags,

    #[command(flatten)]
    run: RunFlags,
}

#[derive(clap::Args)]
pub(super) struct PointsArgs {
    #[command(flatten)]
    scenario: ScenarioFlags,
}

pub(super) fn run_scan_command(args: ScanArgs) -> Result<i32, CliError> {
    let scenario = helpers::load_scenario(&args.scenario)?;
    let config = ScanConfig {
        version: args.run.version,
        output_root: args.run.output_root,
        tools: helpers::resolve_tools(args.tools)?,
        jobs: args.jobs,
        timeout: Duration::from_secs(args.run.timeout_secs),
        pdf_uncertainties: args.run.pdf_uncertainties,
        duplicate_policy: args.on_duplicate.policy(),
    };
    let mut driver = ScanDriver::new(scenario, config);
    let report = driver.run(&CancelToken::new())?;
    println!("{}", render_human_summary(&report));
    Ok(0)
}

pub(super) fn run_point_command(args: PointArgs) -> Result<i32, CliError> {
    let scenario = helpers::load_scenario(&args.scenario)?;
    scenario.validate()?;
    let grid = scenario.grid()?;
    let Some(point) = grid.point_at(args.index) else {
        return Err(CliError::Usage(format!(
            "grid index {} is out of range; the grid has {} points",
            args.index,
            grid.len()
        )));
    };
    let config = ScanConfig {
        version: args.run.version,
        output_root: args.run.output_root,
        tools: helpers::resolve_tools(args.tools)?,
        jobs: 1,
        timeout: Duration::from_secs(args.run.timeout_secs),
        pdf_uncertainties: args.run.pdf_uncertainties,
        duplicate_policy: DuplicatePolicy::Overwrite,
    };
    let out_dir = config
        .output_root
        .join(&scenario.name)
        .join(&config.version);
    fs::create_dir_all(&out_dir).map_err(|source| ScanError::io(&out_dir, source))?;
    let cancel = CancelToken::new();
    let ctx = PointContext {
        scenario: &scenario,
        config: &config,
        out_dir: &out_dir,
        cancel: &cancel,
    };
    match driver::run_point(&ctx, point) {
        Ok(record) => {
            println!(
                "point {} {point} finished, model {}",
                args.index,
                if record.valid_model {
                    "valid"
                } else {
                    "invalid"
                }
            );
            Ok(0)
        }
        Err(failure) => {
            eprintln!(
                "point {} {point} failed [{}]: {failure}",
                args.index,
                failure.kind()
            );
            Ok(4)
        }
    }
}

pub(super) fn run_collect_command(args: CollectArgs) -> Result<i32, CliError> {
    let scenario = helpers::load_scenario(&args.scenario)?;
    let config = ScanConfig {
        version: args.run.version,
        output_root: args.run.output_root,
        // collect never invokes the tools
        tools: ToolPaths::under_root(Path::new(".")),
        jobs: 1,
        timeout: Duration::from_secs(args.run.timeout_secs),
        pdf_uncertainties: args.run.pdf_uncertainties,
        duplicate_policy: DuplicatePolicy::Overwrite,
    };
    let mut driver = ScanDriver::new(scenario, config);
    let report = driver.collect()?;
    println!("{}", render_human_summary(&report));
    Ok(0)
}

pub(super) fn run_points_command(args: PointsArgs) -> Result<i32, CliError> {
    let scenario = helpers::load_scenario(&args.scenario)?;
    scenario.validate()?;
    let grid = scenario.grid()?;
    for (index, point) in grid.points().enumerate() {
        println!("{index}\t{}\t{}", point.x, point.y);
    }
    Ok(0)
}
