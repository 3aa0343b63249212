//! Joint constraints for planar rigid bodies.
//!
//! This crate provides the pulley joint and the sequential-impulse driver
//! that steps it:
//!
//! - [`PulleyJoint`] - Two bodies hanging from fixed ground anchors through a
//!   rope of constant weighted length
//! - [`Joint`] - The per-step lifecycle every joint exposes to the solver
//! - [`ConstraintSolver`] - Gravity, velocity iterations, position
//!   integration and position correction for a set of joints
//!
//! # Pulley Constraint
//!
//! With side lengths `l_a`, `l_b` and ratio `r`, the pulley enforces
//!
//! ```text
//! l_a + r * l_b <= total_length
//! l_a <= max_length_a
//! l_b <= max_length_b
//! ```
//!
//! All three are inequalities. Each one is solved as a separate
//! sub-constraint with its own accumulated impulse, clamped so that the rope
//! only ever pulls.
//!
//! # Step Lifecycle
//!
//! ```text
//! init_velocity_constraints      once per step
//! solve_velocity_constraints     velocity_iterations times
//! (integrate positions)
//! solve_position_constraints     until converged or position_iterations
//! ```
//!
//! # Quick Start
//!
//! ```
//! use sim_constraint::{BodySet, ConstraintSolver, PulleyJoint, PulleyJointDef};
//! use sim_types::{BodyId, MassProperties, Pose, RigidBody};
//! use nalgebra::Point2;
//!
//! let a = RigidBody::dynamic(
//!     BodyId::new(1),
//!     Pose::from_position(Point2::new(-2.0, 7.0)),
//!     MassProperties::point_mass(1.0),
//! )?;
//! let b = RigidBody::dynamic(
//!     BodyId::new(2),
//!     Pose::from_position(Point2::new(2.0, 7.0)),
//!     MassProperties::point_mass(2.0),
//! )?;
//!
//! // A 2:1 pulley: the heavier body balances the lighter one.
//! let def = PulleyJointDef::initialize(
//!     &a,
//!     &b,
//!     Point2::new(-2.0, 10.0),
//!     Point2::new(2.0, 10.0),
//!     a.world_center(),
//!     b.world_center(),
//!     2.0,
//! )?;
//! let mut joints = vec![PulleyJoint::new(&def)?];
//! let mut bodies: BodySet = [a, b].into_iter().collect();
//!
//! let mut solver = ConstraintSolver::default_solver();
//! for _ in 0..60 {
//!     solver.step(&mut joints, &mut bodies, 1.0 / 60.0)?;
//! }
//!
//! let a = bodies.get(BodyId::new(1)).ok_or("missing body")?;
//! assert!((joints[0].length_a(a) - 3.0).abs() < 1e-6);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![doc(html_root_url = "https://docs.rs/sim-constraint/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::suboptimal_flops,
    clippy::many_single_char_names
)]
#![cfg_attr(test, allow(clippy::float_cmp, clippy::let_underscore_must_use))]

pub mod error;
pub mod joint;
pub mod limits;
pub mod pulley;
pub mod solver;

// Re-export main types at crate root
pub use error::{ConstraintError, Result};
pub use joint::{Joint, JointDef, JointType};
pub use limits::LimitState;
pub use pulley::{PulleyJoint, PulleyJointDef, MIN_PULLEY_LENGTH};
pub use solver::{BodySet, ConstraintSolver, ConstraintSolverConfig, SolverResult};
