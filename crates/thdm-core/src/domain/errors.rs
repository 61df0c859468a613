use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub type ScanResult<T> = Result<T, ScanError>;

/// Fatal error that aborts a whole scan.
///
/// Anything that only breaks a single grid point is a [`PointFailure`] and is
/// recorded in the grid instead of propagated.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cannot read or write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scenario is not valid YAML: {0}")]
    ScenarioParse(#[from] serde_yaml::Error),

    #[error("artifact serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no grid point succeeded ({failed} of {total} failed)")]
    IncompleteScan { failed: usize, total: usize },
}

impl ScanError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Process exit code for this error, matching the long-standing contract
    /// of the batch wrappers around the scan: 2 for bad input, 3 for i/o
    /// trouble, 4 for a scan that produced nothing, 5 for internal faults.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::ScenarioParse(_) => 2,
            Self::Io { .. } => 3,
            Self::IncompleteScan { .. } => 4,
            Self::Serialize(_) => 5,
        }
    }
}

/// Failure of a single grid point.
///
/// These never abort the scan; the driver records them per cell and the
/// aggregate step reports them at the end.
#[derive(Debug, Clone, Error)]
pub enum PointFailure {
    #[error("cannot build tool input: {0}")]
    Template(String),

    #[error("{0}")]
    Execution(String),

    #[error("cannot interpret tool output: {0}")]
    Parse(String),

    #[error("tool did not finish within {limit:?}")]
    Timeout { limit: Duration },

    #[error("point was cancelled before completion")]
    Cancelled,
}

impl PointFailure {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Template(_) => "template",
            Self::Execution(_) => "execution",
            Self::Parse(_) => "parse",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
        }
    }
}
