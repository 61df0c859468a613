//! Scan orchestration.
//!
//! The driver expands path configuration around a [`Scenario`], fans the
//! grid out over a worker pool, runs the tool chain per point and hands all
//! outcomes to the aggregator. A failing point is recorded and the scan
//! moves on; only configuration problems, i/o trouble or a fully failed
//! grid abort the run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{self, DuplicatePolicy};
use crate::domain::errors::{PointFailure, ScanError, ScanResult};
use crate::domain::{HiggsBoson, PointRecord};
use crate::grid::GridPoint;
use crate::harvest::{self, PDF_MEMBER_COUNT, SusHiHarvest};
use crate::scenario::Scenario;
use crate::tools::exec::CancelToken;
use crate::tools::{ToolPaths, naming, sushi, thdmc};

/// Lifecycle of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Pending,
    Running,
    Collecting,
    Done,
}

/// Everything a scan needs besides the scenario itself.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Version tag separating repeated runs of the same scenario.
    pub version: String,
    /// Root under which `<scenario>/<version>/` is created.
    pub output_root: PathBuf,
    pub tools: ToolPaths,
    /// Worker pool size.
    pub jobs: usize,
    /// Wall-clock limit per tool invocation.
    pub timeout: Duration,
    /// Run the 102 PDF member variations per state and point.
    pub pdf_uncertainties: bool,
    pub duplicate_policy: DuplicatePolicy,
}

/// Borrowed per-point execution context, shared across the worker pool.
#[derive(Debug, Clone, Copy)]
pub struct PointContext<'a> {
    pub scenario: &'a Scenario,
    pub config: &'a ScanConfig,
    pub out_dir: &'a Path,
    pub cancel: &'a CancelToken,
}

/// Runs the full tool chain for one grid point and assembles its record.
pub fn run_point(ctx: &PointContext<'_>, point: GridPoint) -> Result<PointRecord, PointFailure> {
    if ctx.cancel.is_cancelled() {
        return Err(PointFailure::Cancelled);
    }
    let input = ctx.scenario.model_input_for(point)?;
    let tag = naming::point_tag(ctx.scenario.x_parameter(), ctx.scenario.y_parameter(), point);
    let thdmc_path = ctx.out_dir.join(naming::thdmc_output_name(&tag));
    let thdmc_output = thdmc::run(
        &ctx.config.tools.calc_hybrid,
        &input,
        &thdmc_path,
        ctx.config.timeout,
        ctx.cancel,
    )?;
    let mut harvests = Vec::with_capacity(HiggsBoson::ALL.len());
    for boson in HiggsBoson::ALL {
        let nominal = sushi::run(
            &ctx.config.tools.sushi,
            &input,
            sushi::SusHiJob {
                boson,
                pdf_member: None,
                input_path: &ctx.out_dir.join(naming::sushi_input_name(&tag, boson, None)),
                output_path: &ctx.out_dir.join(naming::sushi_output_name(&tag, boson, None)),
            },
            ctx.config.timeout,
            ctx.cancel,
        )?;
        let mut pdf_members = Vec::new();
        if ctx.config.pdf_uncertainties {
            pdf_members.reserve(PDF_MEMBER_COUNT as usize);
            for member in 1..=PDF_MEMBER_COUNT {
                pdf_members.push(sushi::run(
                    &ctx.config.tools.sushi,
                    &input,
                    sushi::SusHiJob {
                        boson,
                        pdf_member: Some(member),
                        input_path: &ctx
                            .out_dir
                            .join(naming::sushi_input_name(&tag, boson, Some(member))),
                        output_path: &ctx
                            .out_dir
                            .join(naming::sushi_output_name(&tag, boson, Some(member))),
                    },
                    ctx.config.timeout,
                    ctx.cancel,
                )?);
            }
        }
        harvests.push(SusHiHarvest {
            nominal,
            pdf_members,
        });
    }
    let record = harvest::assemble_point(&input, &thdmc_output, &harvests)?;
    debug!(%point, valid = record.valid_model, "grid point finished");
    Ok(record)
}

/// Re-reads the tool outputs an earlier run left behind for one grid point.
pub fn harvest_point(
    ctx: &PointContext<'_>,
    point: GridPoint,
) -> Result<PointRecord, PointFailure> {
    let input = ctx.scenario.model_input_for(point)?;
    let tag = naming::point_tag(ctx.scenario.x_parameter(), ctx.scenario.y_parameter(), point);
    let thdmc_output =
        thdmc::ThdmcOutput::from_path(&ctx.out_dir.join(naming::thdmc_output_name(&tag)))?;
    let mut harvests = Vec::with_capacity(HiggsBoson::ALL.len());
    for boson in HiggsBoson::ALL {
        let nominal = sushi::SusHiOutput::from_path(
            &ctx.out_dir.join(naming::sushi_output_name(&tag, boson, None)),
        )?;
        let mut pdf_members = Vec::new();
        if ctx.config.pdf_uncertainties {
            pdf_members.reserve(PDF_MEMBER_COUNT as usize);
            for member in 1..=PDF_MEMBER_COUNT {
                pdf_members.push(sushi::SusHiOutput::from_path(
                    &ctx.out_dir
                        .join(naming::sushi_output_name(&tag, boson, Some(member))),
                )?);
            }
        }
        harvests.push(SusHiHarvest {
            nominal,
            pdf_members,
        });
    }
    harvest::assemble_point(&input, &thdmc_output, &harvests)
}

/// Summary of a finished scan, also written as JSON next to the artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scenario: String,
    pub version: String,
    pub total_points: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub artifact_path: PathBuf,
    pub failures: Vec<ReportFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportFailure {
    pub x: f64,
    pub y: f64,
    pub kind: String,
    pub message: String,
}

/// The one-screen summary printed after a scan.
pub fn render_human_summary(report: &ScanReport) -> String {
    let mut lines = vec![
        format!(
            "scan '{}' version '{}': {} of {} points succeeded, {} failed",
            report.scenario, report.version, report.succeeded, report.total_points, report.failed
        ),
        format!("artifact: {}", report.artifact_path.display()),
    ];
    for failure in &report.failures {
        lines.push(format!(
            "  failed ({}, {}) [{}]: {}",
            failure.x, failure.y, failure.kind, failure.message
        ));
    }
    lines.join("\n")
}

/// Drives one scenario through run or collect.
#[derive(Debug)]
pub struct ScanDriver {
    scenario: Scenario,
    config: ScanConfig,
    state: ScanState,
}

impl ScanDriver {
    pub fn new(scenario: Scenario, config: ScanConfig) -> Self {
        Self {
            scenario,
            config,
            state: ScanState::Pending,
        }
    }

    pub const fn state(&self) -> ScanState {
        self.state
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Directory holding every file of this scenario/version pair.
    pub fn output_dir(&self) -> PathBuf {
        self.config
            .output_root
            .join(&self.scenario.name)
            .join(&self.config.version)
    }

    /// Runs the whole grid and aggregates the results.
    pub fn run(&mut self, cancel: &CancelToken) -> ScanResult<ScanReport> {
        self.scenario.validate()?;
        self.validate_config()?;
        let grid = self.scenario.grid()?;
        let out_dir = self.output_dir();
        fs::create_dir_all(&out_dir).map_err(|source| ScanError::io(&out_dir, source))?;
        let points: Vec<GridPoint> = grid.points().collect();
        info!(
            scenario = %self.scenario.name,
            version = %self.config.version,
            points = points.len(),
            jobs = self.config.jobs,
            pdf_uncertainties = self.config.pdf_uncertainties,
            "starting scan"
        );
        self.state = ScanState::Running;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()
            .map_err(|source| {
                ScanError::configuration(format!("cannot build worker pool: {source}"))
            })?;
        let ctx = PointContext {
            scenario: &self.scenario,
            config: &self.config,
            out_dir: &out_dir,
            cancel,
        };
        let results: Vec<(GridPoint, Result<PointRecord, PointFailure>)> = pool.install(|| {
            points
                .par_iter()
                .map(|&point| {
                    let outcome = run_point(&ctx, point);
                    if let Err(failure) = &outcome {
                        warn!(%point, kind = failure.kind(), %failure, "grid point failed");
                    }
                    (point, outcome)
                })
                .collect()
        });
        self.state = ScanState::Collecting;
        let report = self.finish(results)?;
        self.state = ScanState::Done;
        Ok(report)
    }

    /// Harvest-only pass over the outputs of an earlier run.
    pub fn collect(&mut self) -> ScanResult<ScanReport> {
        self.scenario.validate()?;
        let grid = self.scenario.grid()?;
        let out_dir = self.output_dir();
        if !out_dir.is_dir() {
            return Err(ScanError::configuration(format!(
                "output directory '{}' does not exist; run the scan first",
                out_dir.display()
            )));
        }
        info!(
            scenario = %self.scenario.name,
            version = %self.config.version,
            points = grid.len(),
            "collecting existing outputs"
        );
        self.state = ScanState::Collecting;
        let cancel = CancelToken::new();
        let ctx = PointContext {
            scenario: &self.scenario,
            config: &self.config,
            out_dir: &out_dir,
            cancel: &cancel,
        };
        let results: Vec<(GridPoint, Result<PointRecord, PointFailure>)> = grid
            .points()
            .map(|point| {
                let outcome = harvest_point(&ctx, point);
                if let Err(failure) = &outcome {
                    warn!(%point, kind = failure.kind(), %failure, "grid point not harvestable");
                }
                (point, outcome)
            })
            .collect();
        let report = self.finish(results)?;
        self.state = ScanState::Done;
        Ok(report)
    }

    /// Aggregates results, writes the artifact and the JSON report.
    fn finish(
        &self,
        results: Vec<(GridPoint, Result<PointRecord, PointFailure>)>,
    ) -> ScanResult<ScanReport> {
        let grid = self.scenario.grid()?;
        let scan_grid = aggregate::aggregate(grid, results, self.config.duplicate_policy)?;
        let out_dir = self.output_dir();
        let artifact_path = out_dir.join(naming::artifact_name(&self.scenario.name));
        let artifact = scan_grid.artifact(&self.scenario.name, &self.config.version);
        write_pretty_json(&artifact_path, &artifact)?;
        let report = ScanReport {
            scenario: self.scenario.name.clone(),
            version: self.config.version.clone(),
            total_points: scan_grid.grid().len(),
            succeeded: scan_grid.success_count(),
            failed: scan_grid.failure_count() + scan_grid.missing_count(),
            artifact_path,
            failures: artifact
                .failures
                .into_iter()
                .map(|failure| ReportFailure {
                    x: failure.x,
                    y: failure.y,
                    kind: failure.kind,
                    message: failure.message,
                })
                .collect(),
        };
        write_pretty_json(&out_dir.join(naming::REPORT_FILE), &report)?;
        info!(
            scenario = %report.scenario,
            succeeded = report.succeeded,
            failed = report.failed,
            artifact = %report.artifact_path.display(),
            "scan finished"
        );
        Ok(report)
    }

    fn validate_config(&self) -> ScanResult<()> {
        if self.config.jobs == 0 {
            return Err(ScanError::configuration(
                "worker pool size must be at least 1",
            ));
        }
        if self.config.timeout.is_zero() {
            return Err(ScanError::configuration(
                "tool timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> ScanResult<()> {
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).map_err(|source| ScanError::io(path, source))
}
