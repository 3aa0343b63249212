//! Limit states shared by joint types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which bound, if any, a sub-constraint is currently pressed against.
///
/// The full set is kept for every joint type even when a joint only ever
/// reaches some of the states; a pulley is one-sided and never reports
/// [`AtLower`](Self::AtLower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LimitState {
    /// Within bounds; the sub-constraint applies no impulse.
    #[default]
    Inactive,

    /// At or past the lower bound.
    AtLower,

    /// At or past the upper bound.
    AtUpper,
}

impl LimitState {
    /// State of a quantity that may only grow up to `max`.
    ///
    /// Reaching `max` exactly already counts as [`AtUpper`](Self::AtUpper).
    #[must_use]
    pub fn upper(value: f64, max: f64) -> Self {
        if value < max {
            Self::Inactive
        } else {
            Self::AtUpper
        }
    }

    /// Check if the sub-constraint is currently enforced.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Inactive)
    }
}
