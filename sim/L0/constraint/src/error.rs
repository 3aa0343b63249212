//! Error types for constraint setup and solving.

use sim_types::{BodyId, SimError};
use thiserror::Error;

/// Errors raised by joint construction and the per-step lifecycle.
///
/// All of these indicate a broken setup (bad definition, zero-mass pair,
/// missing body), not a recoverable runtime condition.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConstraintError {
    /// Pulley ratio at or below the positivity threshold, or not finite.
    #[error("invalid pulley ratio {ratio} (must be positive and finite)")]
    InvalidRatio {
        /// The rejected ratio.
        ratio: f64,
    },

    /// A joint definition contains a non-finite value.
    #[error("invalid joint definition: {0}")]
    InvalidDefinition(String),

    /// Both sides of the joint reference the same body.
    #[error("joint connects {0} to itself")]
    SameBody(BodyId),

    /// An effective mass came out non-positive.
    ///
    /// Happens when both bodies on a constraint axis are immovable.
    #[error("degenerate effective mass {mass} on {constraint} constraint")]
    DegenerateMass {
        /// Which sub-constraint produced the mass.
        constraint: &'static str,
        /// The non-inverted mass value.
        mass: f64,
    },

    /// A joint references a body that is not in the body set.
    #[error("body not found: {0}")]
    BodyNotFound(BodyId),

    /// Error from the body/config layer.
    #[error(transparent)]
    Sim(#[from] SimError),
}

impl ConstraintError {
    /// Create an invalid definition error.
    #[must_use]
    pub fn invalid_definition(reason: impl Into<String>) -> Self {
        Self::InvalidDefinition(reason.into())
    }

    /// Check if this error comes from a bad joint or solver setup.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRatio { .. } | Self::InvalidDefinition(_) | Self::SameBody(_)
        ) || matches!(self, Self::Sim(err) if err.is_config_error())
    }
}

/// Result type for constraint operations.
pub type Result<T> = std::result::Result<T, ConstraintError>;
