//! Scenario files.
//!
//! A scenario is a small YAML document naming the two scanned parameters
//! (with their ranges) and pinning every remaining hybrid-basis parameter to
//! a fixed value. Map order matters: the first `scan` entry is the x axis,
//! the second the y axis, which is why the maps deserialize into `IndexMap`.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{PointFailure, ScanError, ScanResult};
use crate::domain::{ModelInput, YukawaType};
use crate::grid::{GridPoint, ParameterGrid, ScanAxis};

/// The complete hybrid-basis parameter set a scenario must account for,
/// between its `scan` and `fixed` maps.
pub const HYBRID_BASIS_PARAMETERS: [&str; 8] =
    ["mh", "mH", "cos_betal", "Z4", "Z5", "Z7", "tanb", "thdm_type"];

/// Range of one scanned parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisSpec {
    pub min: f64,
    pub max: f64,
    pub steps: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    /// Scanned parameters in axis order: x first, y second.
    pub scan: IndexMap<String, AxisSpec>,
    /// Every non-scanned parameter with its value.
    #[serde(default)]
    pub fixed: IndexMap<String, f64>,
}

impl Scenario {
    pub fn from_yaml(text: &str) -> ScanResult<Self> {
        let scenario: Self = serde_yaml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_file(path: &Path) -> ScanResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ScanError::io(path, source))?;
        Self::from_yaml(&text)
    }

    pub fn validate(&self) -> ScanResult<()> {
        if self.name.trim().is_empty() {
            return Err(ScanError::configuration("scenario has no name"));
        }
        if self.scan.len() != 2 {
            return Err(ScanError::configuration(format!(
                "scenario '{}': exactly two parameters must be scanned, found {}",
                self.name,
                self.scan.len()
            )));
        }
        for parameter in self.scan.keys().chain(self.fixed.keys()) {
            if !HYBRID_BASIS_PARAMETERS.contains(&parameter.as_str()) {
                return Err(ScanError::configuration(format!(
                    "scenario '{}': unknown parameter '{parameter}'",
                    self.name
                )));
            }
        }
        for parameter in self.scan.keys() {
            if self.fixed.contains_key(parameter) {
                return Err(ScanError::configuration(format!(
                    "scenario '{}': parameter '{parameter}' is both scanned and fixed",
                    self.name
                )));
            }
        }
        for parameter in HYBRID_BASIS_PARAMETERS {
            if !self.scan.contains_key(parameter) && !self.fixed.contains_key(parameter) {
                return Err(ScanError::configuration(format!(
                    "scenario '{}': parameter '{parameter}' is neither scanned nor fixed",
                    self.name
                )));
            }
        }
        if self.scan.contains_key("thdm_type") {
            return Err(ScanError::configuration(format!(
                "scenario '{}': the Yukawa type cannot be scanned",
                self.name
            )));
        }
        if let Some(&code) = self.fixed.get("thdm_type") {
            if code.fract() != 0.0 || YukawaType::from_code(code as i64).is_none() {
                return Err(ScanError::configuration(format!(
                    "scenario '{}': thdm_type must be 1 or 2, found {code}",
                    self.name
                )));
            }
        }
        self.grid()?;
        Ok(())
    }

    pub fn x_parameter(&self) -> &str {
        self.scan
            .get_index(0)
            .map(|(name, _)| name.as_str())
            .unwrap_or_default()
    }

    pub fn y_parameter(&self) -> &str {
        self.scan
            .get_index(1)
            .map(|(name, _)| name.as_str())
            .unwrap_or_default()
    }

    pub fn grid(&self) -> ScanResult<ParameterGrid> {
        let mut axes = self.scan.iter().map(|(name, spec)| {
            ScanAxis::new(name.as_str(), spec.min, spec.max, spec.steps)
        });
        let (Some(x), Some(y)) = (axes.next(), axes.next()) else {
            return Err(ScanError::configuration(format!(
                "scenario '{}': exactly two parameters must be scanned",
                self.name
            )));
        };
        ParameterGrid::new(x?, y?)
    }

    fn parameter_value(&self, parameter: &str, point: GridPoint) -> Result<f64, PointFailure> {
        if self.x_parameter() == parameter {
            return Ok(point.x);
        }
        if self.y_parameter() == parameter {
            return Ok(point.y);
        }
        self.fixed.get(parameter).copied().ok_or_else(|| {
            PointFailure::Template(format!(
                "scenario '{}' does not define parameter '{parameter}'",
                self.name
            ))
        })
    }

    /// Resolves a grid point into the full model input handed to the tools.
    pub fn model_input_for(&self, point: GridPoint) -> Result<ModelInput, PointFailure> {
        let type_code = self.parameter_value("thdm_type", point)?;
        let yukawa_type = YukawaType::from_code(type_code as i64).ok_or_else(|| {
            PointFailure::Template(format!(
                "scenario '{}': thdm_type must be 1 or 2, found {type_code}",
                self.name
            ))
        })?;
        Ok(ModelInput {
            m_light: self.parameter_value("mh", point)?,
            m_heavy: self.parameter_value("mH", point)?,
            cos_betal: self.parameter_value("cos_betal", point)?,
            z4: self.parameter_value("Z4", point)?,
            z5: self.parameter_value("Z5", point)?,
            z7: self.parameter_value("Z7", point)?,
            tanb: self.parameter_value("tanb", point)?,
            yukawa_type,
        })
    }
}
