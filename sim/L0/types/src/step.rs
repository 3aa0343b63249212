//! Per-step solver context.

use crate::Tolerances;

/// Information handed to every constraint for one simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    /// Timestep (seconds).
    pub dt: f64,
    /// Inverse timestep (0 when `dt` is 0).
    pub inv_dt: f64,
    /// Current `dt` divided by the previous step's `dt`.
    ///
    /// Accumulated impulses scale with the timestep, so warm-start impulses
    /// are multiplied by this when the timestep changes.
    pub dt_ratio: f64,
    /// Whether accumulated impulses carry over from the previous step.
    pub warm_starting: bool,
    /// Slop and correction bounds.
    pub tolerances: Tolerances,
}

impl StepContext {
    /// Build a step context.
    ///
    /// `previous_dt` is `None` on the first step, which yields a ratio of 1.
    #[must_use]
    pub fn new(dt: f64, previous_dt: Option<f64>, warm_starting: bool) -> Self {
        let inv_dt = if dt > 0.0 { 1.0 / dt } else { 0.0 };
        let dt_ratio = match previous_dt {
            Some(prev) if prev > 0.0 => dt / prev,
            _ => 1.0,
        };
        Self {
            dt,
            inv_dt,
            dt_ratio,
            warm_starting,
            tolerances: Tolerances::default(),
        }
    }

    /// Replace the tolerances.
    #[must_use]
    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }
}
