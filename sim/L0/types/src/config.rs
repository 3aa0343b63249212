//! Configuration types for simulation.
//!
//! This module provides the global solver constants, the per-world
//! [`Tolerances`] derived from them, and [`SimulationConfig`] which controls
//! timestep, gravity and iteration counts.

use nalgebra::Vector2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// Positivity threshold for ratios and effective masses.
pub const EPSILON: f64 = f64::EPSILON;

/// Length below which positional quantities are treated as zero or converged.
pub const LINEAR_SLOP: f64 = 0.005;

/// Largest position correction applied by a single position iteration.
pub const MAX_LINEAR_CORRECTION: f64 = 0.2;

/// Tunable tolerances consumed by the velocity and position passes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tolerances {
    /// Degenerate-length and convergence threshold (m).
    pub linear_slop: f64,
    /// Per-iteration position correction clamp (m).
    pub max_linear_correction: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            linear_slop: LINEAR_SLOP,
            max_linear_correction: MAX_LINEAR_CORRECTION,
        }
    }
}

impl Tolerances {
    /// Validate the tolerances.
    pub fn validate(&self) -> Result<()> {
        if !(self.linear_slop.is_finite() && self.linear_slop > 0.0) {
            return Err(SimError::invalid_config("linear_slop must be positive"));
        }

        if !(self.max_linear_correction.is_finite() && self.max_linear_correction > 0.0) {
            return Err(SimError::invalid_config(
                "max_linear_correction must be positive",
            ));
        }

        Ok(())
    }
}

/// Main configuration for a simulation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Fixed timestep for physics integration (seconds).
    pub timestep: f64,
    /// Gravity acceleration (m/s²).
    pub gravity: Vector2<f64>,
    /// Number of velocity iterations per step.
    pub velocity_iterations: usize,
    /// Maximum number of position iterations per step.
    pub position_iterations: usize,
    /// Reuse the previous step's impulses as a starting point.
    pub warm_starting: bool,
    /// Solver tolerances.
    pub tolerances: Tolerances,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 60.0,
            gravity: Vector2::new(0.0, -9.81),
            velocity_iterations: 8,
            position_iterations: 3,
            warm_starting: true,
            tolerances: Tolerances::default(),
        }
    }
}

impl SimulationConfig {
    /// Create a new simulation config with the given timestep.
    #[must_use]
    pub fn with_timestep(timestep: f64) -> Self {
        Self {
            timestep,
            ..Default::default()
        }
    }

    /// Real-time configuration (60 Hz, 8/3 iterations).
    #[must_use]
    pub fn realtime() -> Self {
        Self::default()
    }

    /// High-accuracy configuration (240 Hz, 10/4 iterations).
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            timestep: 1.0 / 240.0,
            velocity_iterations: 10,
            position_iterations: 4,
            ..Default::default()
        }
    }

    /// Set the gravity.
    #[must_use]
    pub fn gravity(mut self, gravity: Vector2<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Disable gravity.
    #[must_use]
    pub fn zero_gravity(mut self) -> Self {
        self.gravity = Vector2::zeros();
        self
    }

    /// Set the number of solver iterations.
    #[must_use]
    pub fn iterations(mut self, velocity: usize, position: usize) -> Self {
        self.velocity_iterations = velocity;
        self.position_iterations = position;
        self
    }

    /// Disable warm starting.
    #[must_use]
    pub fn without_warm_starting(mut self) -> Self {
        self.warm_starting = false;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(SimError::InvalidTimestep(self.timestep));
        }

        if self.timestep > 1.0 {
            return Err(SimError::invalid_config(
                "timestep > 1 second is likely an error",
            ));
        }

        if self.velocity_iterations == 0 {
            return Err(SimError::invalid_config(
                "velocity_iterations must be at least 1",
            ));
        }

        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(SimError::invalid_config("gravity must be finite"));
        }

        self.tolerances.validate()
    }

    /// Get the frequency in Hz.
    #[must_use]
    pub fn frequency(&self) -> f64 {
        1.0 / self.timestep
    }
}
