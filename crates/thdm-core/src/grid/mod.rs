//! The two-dimensional scan plane.
//!
//! An axis samples a closed interval at a fixed number of evenly spaced
//! values, endpoints included. The grid is the Cartesian product of the two
//! axes; points enumerate x-major so that re-running a scan visits cells in
//! the same order it aggregates them.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::errors::{ScanError, ScanResult};

/// A single coordinate pair in the scan plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: f64,
    pub y: f64,
}

impl Display for GridPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One scan axis: `steps` samples spread evenly over `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanAxis {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub steps: usize,
}

impl ScanAxis {
    pub fn new(name: impl Into<String>, min: f64, max: f64, steps: usize) -> ScanResult<Self> {
        let axis = Self {
            name: name.into(),
            min,
            max,
            steps,
        };
        axis.validate()?;
        Ok(axis)
    }

    pub fn validate(&self) -> ScanResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ScanError::configuration(format!(
                "axis '{}': bounds must be finite numbers",
                self.name
            )));
        }
        if self.steps == 0 {
            return Err(ScanError::configuration(format!(
                "axis '{}': needs at least one step",
                self.name
            )));
        }
        if self.min > self.max {
            return Err(ScanError::configuration(format!(
                "axis '{}': min {} exceeds max {}",
                self.name, self.min, self.max
            )));
        }
        if self.steps > 1 && self.min == self.max {
            return Err(ScanError::configuration(format!(
                "axis '{}': {} steps over a zero-width range would repeat points",
                self.name, self.steps
            )));
        }
        Ok(())
    }

    /// The sampled value at `index`. Endpoints are reproduced exactly.
    pub fn value_at(&self, index: usize) -> f64 {
        if self.steps < 2 || index == 0 {
            return self.min;
        }
        if index >= self.steps - 1 {
            return self.max;
        }
        self.min + (self.max - self.min) * index as f64 / (self.steps - 1) as f64
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.steps).map(|index| self.value_at(index))
    }

    /// Distance between neighbouring samples; 1.0 for a single-step axis so
    /// bin edges stay well defined.
    pub fn spacing(&self) -> f64 {
        if self.steps < 2 {
            1.0
        } else {
            (self.max - self.min) / (self.steps - 1) as f64
        }
    }

    /// Maps a coordinate back to its sample index. Values that do not sit on
    /// the axis (beyond rounding noise) yield `None`.
    pub fn index_of(&self, value: f64) -> Option<usize> {
        let relative = (value - self.min) / self.spacing();
        let nearest = relative.round();
        if nearest < 0.0 || nearest as usize >= self.steps {
            return None;
        }
        if (relative - nearest).abs() > 1.0e-6 {
            return None;
        }
        Some(nearest as usize)
    }

    /// Outer bin edges, half a spacing beyond the sampled endpoints.
    pub fn edges(&self) -> (f64, f64) {
        let half = self.spacing() / 2.0;
        (self.min - half, self.max + half)
    }
}

/// The full scan grid, `x` varying slowest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    x: ScanAxis,
    y: ScanAxis,
}

impl ParameterGrid {
    pub fn new(x: ScanAxis, y: ScanAxis) -> ScanResult<Self> {
        x.validate()?;
        y.validate()?;
        Ok(Self { x, y })
    }

    pub fn x_axis(&self) -> &ScanAxis {
        &self.x
    }

    pub fn y_axis(&self) -> &ScanAxis {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.steps * self.y.steps
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All grid points in enumeration order.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        let y = &self.y;
        self.x
            .values()
            .flat_map(move |x| y.values().map(move |y| GridPoint { x, y }))
    }

    /// The point at a flat enumeration index, if it is in range.
    pub fn point_at(&self, index: usize) -> Option<GridPoint> {
        if index >= self.len() {
            return None;
        }
        let ix = index / self.y.steps;
        let iy = index % self.y.steps;
        Some(GridPoint {
            x: self.x.value_at(ix),
            y: self.y.value_at(iy),
        })
    }

    /// Flat cell index for a coordinate pair, `None` if it is off-grid.
    pub fn cell_index(&self, point: GridPoint) -> Option<usize> {
        let ix = self.x.index_of(point.x)?;
        let iy = self.y.index_of(point.y)?;
        Some(ix * self.y.steps + iy)
    }
}
