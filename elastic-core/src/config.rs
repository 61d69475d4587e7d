//! Simulation parameters.
//!
//! Parameters can be built in code or read from TOML. Every field has a
//! default, so a configuration file only needs to name what it changes:
//!
//! ```toml
//! length = 3.0
//! height = 3.0
//! dx = 0.1
//! dt = 0.01
//! total_time = 1.0
//! workers = 4
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Ratios closer than this to an integer are snapped to it.
const INTEGER_SNAP: f64 = 1e-9;

/// Domain, discretisation and scheduling parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Domain extent along x.
    pub length: f64,
    /// Domain extent along y.
    pub height: f64,
    /// Grid spacing (same along both axes).
    pub dx: f64,
    /// Time step.
    pub dt: f64,
    /// Simulated duration.
    pub total_time: f64,
    /// Parallel workers for the velocity and strain phases (0 = automatic).
    pub workers: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            length: 3.0,
            height: 3.0,
            dx: 0.1,
            dt: 0.01,
            total_time: 1.0,
            workers: 0,
        }
    }
}

/// Integer part of `ratio`, snapping values within [`INTEGER_SNAP`] of the
/// next integer up so that e.g. 0.3 / 0.1 counts as 3.
fn whole_count(ratio: f64) -> usize {
    let nearest = ratio.round();
    if (ratio - nearest).abs() <= INTEGER_SNAP * nearest.max(1.0) {
        nearest as usize
    } else {
        ratio.floor() as usize
    }
}

impl SimulationConfig {
    /// Configuration for a grid of exactly `columns` x `rows` cells.
    pub fn for_grid(columns: usize, rows: usize, dx: f64, dt: f64) -> Self {
        Self {
            length: columns as f64 * dx,
            height: rows as f64 * dx,
            dx,
            dt,
            total_time: dt,
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(contents)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self)
            .map_err(|e| Error::InvalidConfig(format!("failed to serialize configuration: {}", e)))
    }

    /// Check that the parameters describe a runnable simulation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a non-positive or non-finite
    /// domain size or spacing, a negative or non-finite time step or
    /// duration, a domain smaller than one cell, or a cell count that does
    /// not fit in `usize`.
    pub fn validate(&self) -> Result<()> {
        let positive = [("length", self.length), ("height", self.height), ("dx", self.dx)];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        let non_negative = [("dt", self.dt), ("total_time", self.total_time)];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be non-negative and finite, got {}",
                    name, value
                )));
            }
        }
        for (name, extent) in [("length", self.length), ("height", self.height)] {
            if extent / self.dx >= usize::MAX as f64 {
                return Err(Error::InvalidConfig(format!(
                    "{} {} spans too many cells of size {}",
                    name, extent, self.dx
                )));
            }
        }
        let (columns, rows) = self.grid_dimensions();
        if columns.checked_mul(rows).is_none() {
            return Err(Error::InvalidConfig(format!(
                "domain {} x {} has too many cells of size {}",
                self.length, self.height, self.dx
            )));
        }
        if columns == 0 || rows == 0 {
            return Err(Error::InvalidConfig(format!(
                "domain {} x {} is smaller than one cell of size {}",
                self.length, self.height, self.dx
            )));
        }
        Ok(())
    }

    /// Grid dimensions `(columns, rows)` = (length / dx, height / dx).
    pub fn grid_dimensions(&self) -> (usize, usize) {
        (whole_count(self.length / self.dx), whole_count(self.height / self.dx))
    }

    /// Number of steps in `total_time`; zero when `dt` is zero.
    pub fn total_steps(&self) -> usize {
        if self.dt <= 0.0 {
            return 0;
        }
        whole_count(self.total_time / self.dt)
    }
}
