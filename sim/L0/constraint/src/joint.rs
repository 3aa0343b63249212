//! The joint lifecycle contract and the configuration shared by all joints.

use nalgebra::{Point2, Vector2};
use sim_types::{BodyId, RigidBody, StepContext};

use crate::{ConstraintError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type of joint constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum JointType {
    /// Two bodies hanging from fixed ground anchors through a rope of
    /// constant weighted length.
    Pulley,
}

/// Fields every joint definition carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointDef {
    /// First attached body.
    pub body_a: BodyId,
    /// Second attached body.
    pub body_b: BodyId,
    /// Whether the two attached bodies should still collide with each other.
    pub collide_connected: bool,
}

impl JointDef {
    /// Create a definition connecting two bodies. Connected bodies don't collide.
    #[must_use]
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            body_b,
            collide_connected: false,
        }
    }

    /// Set whether the connected bodies collide.
    #[must_use]
    pub fn with_collide_connected(mut self, collide_connected: bool) -> Self {
        self.collide_connected = collide_connected;
        self
    }

    /// Validate the definition.
    pub fn validate(&self) -> Result<()> {
        if self.body_a == self.body_b {
            return Err(ConstraintError::SameBody(self.body_a));
        }
        Ok(())
    }
}

/// Per-step lifecycle every joint exposes to the solver.
///
/// Within one step the solver calls
/// [`init_velocity_constraints`](Self::init_velocity_constraints) once,
/// [`solve_velocity_constraints`](Self::solve_velocity_constraints) once per
/// velocity iteration, integrates positions, and then calls
/// [`solve_position_constraints`](Self::solve_position_constraints) until it
/// reports convergence or the iteration budget runs out.
///
/// The bodies passed in must be the ones named by [`body_a`](Self::body_a)
/// and [`body_b`](Self::body_b), in that order.
pub trait Joint: std::fmt::Debug {
    /// Get the joint type.
    fn joint_type(&self) -> JointType;

    /// First attached body.
    fn body_a(&self) -> BodyId;

    /// Second attached body.
    fn body_b(&self) -> BodyId;

    /// Whether the attached bodies collide with each other.
    fn collide_connected(&self) -> bool;

    /// Anchor on the first body in world coordinates.
    fn anchor_a(&self, body_a: &RigidBody) -> Point2<f64>;

    /// Anchor on the second body in world coordinates.
    fn anchor_b(&self, body_b: &RigidBody) -> Point2<f64>;

    /// Force applied to the second body during the last step.
    fn reaction_force(&self, inv_dt: f64) -> Vector2<f64>;

    /// Torque applied to the second body during the last step.
    fn reaction_torque(&self, inv_dt: f64) -> f64;

    /// Prepare the step: axes, active states, effective masses, warm start.
    fn init_velocity_constraints(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        step: &StepContext,
    ) -> Result<()>;

    /// Run one sequential-impulse velocity iteration.
    fn solve_velocity_constraints(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        step: &StepContext,
    );

    /// Run one position correction iteration. Returns `true` once converged.
    fn solve_position_constraints(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        step: &StepContext,
    ) -> bool;
}

impl<J: Joint + ?Sized> Joint for Box<J> {
    fn joint_type(&self) -> JointType {
        (**self).joint_type()
    }

    fn body_a(&self) -> BodyId {
        (**self).body_a()
    }

    fn body_b(&self) -> BodyId {
        (**self).body_b()
    }

    fn collide_connected(&self) -> bool {
        (**self).collide_connected()
    }

    fn anchor_a(&self, body_a: &RigidBody) -> Point2<f64> {
        (**self).anchor_a(body_a)
    }

    fn anchor_b(&self, body_b: &RigidBody) -> Point2<f64> {
        (**self).anchor_b(body_b)
    }

    fn reaction_force(&self, inv_dt: f64) -> Vector2<f64> {
        (**self).reaction_force(inv_dt)
    }

    fn reaction_torque(&self, inv_dt: f64) -> f64 {
        (**self).reaction_torque(inv_dt)
    }

    fn init_velocity_constraints(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        step: &StepContext,
    ) -> Result<()> {
        (**self).init_velocity_constraints(body_a, body_b, step)
    }

    fn solve_velocity_constraints(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        step: &StepContext,
    ) {
        (**self).solve_velocity_constraints(body_a, body_b, step);
    }

    fn solve_position_constraints(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        step: &StepContext,
    ) -> bool {
        (**self).solve_position_constraints(body_a, body_b, step)
    }
}
