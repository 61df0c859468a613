//! Scan orchestration for the two-parameter 2HDM parameter scans.
//!
//! The crate wraps two externally built physics codes, 2HDMC's `CalcHybrid`
//! and SusHi, into a grid-scan pipeline: [`grid`] enumerates the scan plane,
//! [`scenario`] supplies the model parameters for every point, [`tools`]
//! builds the tool inputs and shells out to the executables, [`harvest`]
//! turns their SLHA output files into per-point observables, and
//! [`aggregate`] folds the per-point results into the final grid artifact.
//! [`driver`] ties the stages together and owns the scan lifecycle.

pub mod aggregate;
pub mod domain;
pub mod driver;
pub mod grid;
pub mod harvest;
pub mod lha;
pub mod scenario;
pub mod tools;

pub use aggregate::{DuplicatePolicy, GridCell, ScanGrid};
pub use domain::errors::{PointFailure, ScanError, ScanResult};
pub use domain::{HiggsBoson, HiggsProperties, ModelInput, PointRecord, YukawaType};
pub use driver::{PointContext, ScanConfig, ScanDriver, ScanReport, ScanState, render_human_summary};
pub use grid::{GridPoint, ParameterGrid, ScanAxis};
pub use scenario::Scenario;
pub use tools::ToolPaths;
pub use tools::exec::CancelToken;
