//! The external tool layer: processes, file naming, decks and parsers.

pub mod exec;
pub mod naming;
pub mod sushi;
pub mod thdmc;

use std::path::{Path, PathBuf};

/// Resolved locations of the two executables a scan shells out to.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub calc_hybrid: PathBuf,
    pub sushi: PathBuf,
}

impl ToolPaths {
    /// Standard layout under one installation root: `2HDMC/CalcHybrid` and
    /// `SusHi/bin/sushi`.
    pub fn under_root(root: &Path) -> Self {
        Self {
            calc_hybrid: root.join("2HDMC").join("CalcHybrid"),
            sushi: root.join("SusHi").join("bin").join("sushi"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ToolPaths;
    use std::path::Path;

    #[test]
    fn root_layout_matches_the_installation_convention() {
        let tools = ToolPaths::under_root(Path::new("/opt/theory"));
        assert_eq!(
            tools.calc_hybrid,
            Path::new("/opt/theory/2HDMC/CalcHybrid")
        );
        assert_eq!(tools.sushi, Path::new("/opt/theory/SusHi/bin/sushi"));
    }
}
