//! Fan-in of per-point results.
//!
//! The aggregator owns the scan grid as a dense cell vector, maps every
//! incoming result to its cell and finally renders the JSON artifact with
//! one 2D layer per observable. Failed cells hold their failure record so a
//! partially successful scan still states exactly what went wrong where.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::domain::PointRecord;
use crate::domain::errors::{PointFailure, ScanError, ScanResult};
use crate::grid::{GridPoint, ParameterGrid, ScanAxis};

/// What to do when a second result arrives for an already filled cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Keep the newer result and log the collision.
    #[default]
    Overwrite,
    /// Fail the scan; duplicates mean the caller mixed up runs.
    Reject,
}

/// State of one grid cell after aggregation.
#[derive(Debug, Clone)]
pub enum GridCell {
    Missing,
    Failed { kind: String, message: String },
    Filled(Box<PointRecord>),
}

/// Dense result grid in axis enumeration order.
#[derive(Debug)]
pub struct ScanGrid {
    grid: ParameterGrid,
    cells: Vec<GridCell>,
}

impl ScanGrid {
    pub fn new(grid: ParameterGrid) -> Self {
        let cells = vec![GridCell::Missing; grid.len()];
        Self { grid, cells }
    }

    pub fn grid(&self) -> &ParameterGrid {
        &self.grid
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn cell(&self, point: GridPoint) -> Option<&GridCell> {
        self.grid.cell_index(point).map(|index| &self.cells[index])
    }

    pub fn success_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, GridCell::Filled(_)))
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, GridCell::Failed { .. }))
            .count()
    }

    pub fn missing_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, GridCell::Missing))
            .count()
    }

    /// Files one result under its grid cell. Off-grid coordinates are a
    /// configuration error since they cannot come from the grid's own
    /// enumeration.
    pub fn insert(
        &mut self,
        point: GridPoint,
        outcome: Result<PointRecord, PointFailure>,
        policy: DuplicatePolicy,
    ) -> ScanResult<()> {
        let index = self.grid.cell_index(point).ok_or_else(|| {
            ScanError::configuration(format!("result for {point} does not lie on the scan grid"))
        })?;
        if !matches!(self.cells[index], GridCell::Missing) {
            match policy {
                DuplicatePolicy::Overwrite => {
                    warn!(%point, "duplicate result for a grid cell, keeping the newer one");
                }
                DuplicatePolicy::Reject => {
                    return Err(ScanError::configuration(format!(
                        "duplicate result for grid point {point}"
                    )));
                }
            }
        }
        self.cells[index] = match outcome {
            Ok(record) => GridCell::Filled(Box::new(record)),
            Err(failure) => GridCell::Failed {
                kind: failure.kind().to_string(),
                message: failure.to_string(),
            },
        };
        Ok(())
    }

    /// Renders the aggregated grid into the serializable artifact.
    pub fn artifact(&self, scenario: &str, version: &str) -> GridArtifact {
        let nx = self.grid.x_axis().steps;
        let ny = self.grid.y_axis().steps;
        let mut histograms: BTreeMap<String, Vec<Vec<Option<f64>>>> = BTreeMap::new();
        let mut status = vec![vec!["missing".to_string(); ny]; nx];
        let mut failures = Vec::new();
        for (index, cell) in self.cells.iter().enumerate() {
            let ix = index / ny;
            let iy = index % ny;
            match cell {
                GridCell::Missing => {}
                GridCell::Failed { kind, message } => {
                    status[ix][iy] = "failed".to_string();
                    // point_at cannot fail for an index produced by iterating
                    // our own cells.
                    if let Some(point) = self.grid.point_at(index) {
                        failures.push(CellFailure {
                            x: point.x,
                            y: point.y,
                            kind: kind.clone(),
                            message: message.clone(),
                        });
                    }
                }
                GridCell::Filled(record) => {
                    status[ix][iy] = "ok".to_string();
                    for (name, value) in record.observables() {
                        histograms
                            .entry(name)
                            .or_insert_with(|| vec![vec![None; ny]; nx])[ix][iy] = Some(value);
                    }
                }
            }
        }
        GridArtifact {
            scenario: scenario.to_string(),
            version: version.to_string(),
            x_axis: AxisBinning::from_axis(self.grid.x_axis()),
            y_axis: AxisBinning::from_axis(self.grid.y_axis()),
            histograms,
            status,
            failures,
        }
    }
}

/// Folds raw per-point outcomes into a grid. Fails the whole scan only when
/// not a single point succeeded.
pub fn aggregate(
    grid: ParameterGrid,
    results: Vec<(GridPoint, Result<PointRecord, PointFailure>)>,
    policy: DuplicatePolicy,
) -> ScanResult<ScanGrid> {
    let total = grid.len();
    let mut scan_grid = ScanGrid::new(grid);
    for (point, outcome) in results {
        scan_grid.insert(point, outcome, policy)?;
    }
    if scan_grid.success_count() == 0 {
        return Err(ScanError::IncompleteScan {
            failed: total - scan_grid.success_count(),
            total,
        });
    }
    Ok(scan_grid)
}

/// Axis description stored in the artifact: the sampled range plus the outer
/// bin edges for plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisBinning {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub steps: usize,
    pub lower_edge: f64,
    pub upper_edge: f64,
}

impl AxisBinning {
    fn from_axis(axis: &ScanAxis) -> Self {
        let (lower_edge, upper_edge) = axis.edges();
        Self {
            name: axis.name.clone(),
            min: axis.min,
            max: axis.max,
            steps: axis.steps,
            lower_edge,
            upper_edge,
        }
    }
}

/// One failed cell as recorded in the artifact.
#[derive(Debug, Clone, Serialize)]
pub struct CellFailure {
    pub x: f64,
    pub y: f64,
    pub kind: String,
    pub message: String,
}

/// The aggregated scan result written to `<scenario>.json`. Histogram layers
/// are indexed `[ix][iy]`; cells without a successful result hold `null`.
#[derive(Debug, Serialize)]
pub struct GridArtifact {
    pub scenario: String,
    pub version: String,
    pub x_axis: AxisBinning,
    pub y_axis: AxisBinning,
    pub histograms: BTreeMap<String, Vec<Vec<Option<f64>>>>,
    pub status: Vec<Vec<String>>,
    pub failures: Vec<CellFailure>,
}
