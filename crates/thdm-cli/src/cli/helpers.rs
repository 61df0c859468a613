use std::env;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::Context;
use thdm_core::{Scenario, ToolPaths};

use super::CliError;
use super::commands::{ScenarioFlags, ToolFlags};

pub(super) fn load_scenario(flags: &ScenarioFlags) -> Result<Scenario, CliError> {
    let path = resolve_scenario_path(&flags.scenario, &flags.scenario_dir)?;
    Ok(Scenario::from_file(&path)?)
}

/// Accepts a direct file path or a bare name looked up under the scenario
/// directory with a `.yaml` or `.yml` extension.
pub(super) fn resolve_scenario_path(spec: &str, scenario_dir: &Path) -> Result<PathBuf, CliError> {
    let direct = Path::new(spec);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }
    for extension in ["yaml", "yml"] {
        let candidate = scenario_dir.join(format!("{spec}.{extension}"));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    let known = available_scenarios(scenario_dir).unwrap_or_default();
    let hint = if known.is_empty() {
        format!("no scenario files found in '{}'", scenario_dir.display())
    } else {
        format!(
            "available in '{}': {}",
            scenario_dir.display(),
            known.join(", ")
        )
    };
    Err(CliError::Usage(format!(
        "scenario '{spec}' is neither a file nor a name under the scenario directory; {hint}"
    )))
}

pub(super) fn available_scenarios(scenario_dir: &Path) -> anyhow::Result<Vec<String>> {
    let entries = fs::read_dir(scenario_dir).with_context(|| {
        format!(
            "failed to list scenario directory '{}'",
            scenario_dir.display()
        )
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| {
                format!(
                    "failed to list scenario directory '{}'",
                    scenario_dir.display()
                )
            })?
            .path();
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if !is_yaml {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Tool locations come from, in order: explicit binary flags, --tools-root,
/// the THEORY_CODE_PATH environment variable.
pub(super) fn resolve_tools(flags: ToolFlags) -> Result<ToolPaths, CliError> {
    let root = flags
        .tools_root
        .or_else(|| env::var_os("THEORY_CODE_PATH").map(PathBuf::from));
    let mut tools = match root {
        Some(root) => ToolPaths::under_root(&root),
        None => match (&flags.thdmc_bin, &flags.sushi_bin) {
            (Some(_), Some(_)) => ToolPaths {
                calc_hybrid: PathBuf::new(),
                sushi: PathBuf::new(),
            },
            _ => {
                return Err(CliError::Usage(
                    "no tool location given; pass --tools-root, set THEORY_CODE_PATH, \
                     or pass both --thdmc-bin and --sushi-bin"
                        .to_string(),
                ));
            }
        },
    };
    if let Some(path) = flags.thdmc_bin {
        tools.calc_hybrid = path;
    }
    if let Some(path) = flags.sushi_bin {
        tools.sushi = path;
    }
    Ok(tools)
}

pub(super) fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
