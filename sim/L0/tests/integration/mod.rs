//! Integration tests for the sim-* constraint crates.
//!
//! These tests drive the pulley joint end to end:
//! - Hanging rigs stepped through `ConstraintSolver`
//! - The joint lifecycle called directly on hand-placed bodies
//! - Degenerate geometry and invalid configuration

pub mod pulley_scenarios;
pub mod solver_pipeline;
