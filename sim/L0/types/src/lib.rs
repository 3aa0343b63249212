//! Core types for planar constraint solving.
//!
//! This crate provides the foundational types shared by the constraint
//! crates:
//!
//! - [`RigidBody`] - Pose, sweep, velocity and inverse mass of a planar body
//! - [`StepContext`] - Timestep, warm-start flag and `dt` ratio for one step
//! - [`Tolerances`] - Linear slop and position correction bounds
//! - [`SimulationConfig`] - Timestep, gravity and iteration counts
//!
//! # Design Philosophy
//!
//! These types are mostly data. The only behavior on [`RigidBody`] is the
//! accessor set a constraint needs: read the transform, read inverse mass
//! and inertia, write velocity and sweep, then re-synchronize the transform.
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: up
//! - Angles counter-clockwise positive
//!
//! # Example
//!
//! ```
//! use sim_types::{BodyId, MassProperties, Pose, RigidBody};
//! use nalgebra::Point2;
//!
//! let body = RigidBody::dynamic(
//!     BodyId::new(1),
//!     Pose::from_position(Point2::new(0.0, 1.0)),
//!     MassProperties::disc(2.0, 0.5),
//! )?;
//!
//! assert_eq!(body.world_center(), Point2::new(0.0, 1.0));
//! assert_eq!(body.inv_mass(), 0.5);
//! # Ok::<(), sim_types::SimError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

mod body;
mod config;
mod error;
mod step;

pub use body::{BodyId, MassProperties, Pose, RigidBody, Sweep, Twist};
pub use config::{
    SimulationConfig, Tolerances, EPSILON, LINEAR_SLOP, MAX_LINEAR_CORRECTION,
};
pub use error::SimError;
pub use step::StepContext;

// Re-export math types for convenience
pub use nalgebra::{Point2, UnitComplex, Vector2};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
