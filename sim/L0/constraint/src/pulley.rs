//! Pulley joint: two bodies hanging from fixed ground anchors.
//!
//! The rope runs from the anchor on body A up to ground anchor A, over the
//! pulley, and down from ground anchor B to the anchor on body B. The joint
//! keeps
//!
//! ```text
//! length_a + ratio * length_b <= total_length
//! ```
//!
//! and additionally caps each side at its own maximum length. All three
//! sub-constraints are one-sided: a rope pulls, it never pushes, so every
//! accumulated impulse stays non-negative.
//!
//! ```text
//!   ground_a ●           ● ground_b
//!            |           |
//!   length_a |           | length_b
//!            |           |
//!   anchor_a ●           ● anchor_b
//!          [ A ]       [ B ]
//! ```
//!
//! # Example
//!
//! ```
//! use sim_constraint::{PulleyJoint, PulleyJointDef};
//! use sim_types::{BodyId, MassProperties, Pose, RigidBody};
//! use nalgebra::Point2;
//!
//! let a = RigidBody::dynamic(
//!     BodyId::new(1),
//!     Pose::from_position(Point2::new(-2.0, 7.0)),
//!     MassProperties::disc(1.0, 0.5),
//! )?;
//! let b = RigidBody::dynamic(
//!     BodyId::new(2),
//!     Pose::from_position(Point2::new(2.0, 7.0)),
//!     MassProperties::disc(2.0, 0.5),
//! )?;
//!
//! let def = PulleyJointDef::initialize(
//!     &a,
//!     &b,
//!     Point2::new(-2.0, 10.0),
//!     Point2::new(2.0, 10.0),
//!     a.world_center(),
//!     b.world_center(),
//!     2.0,
//! )?;
//! let joint = PulleyJoint::new(&def)?;
//!
//! assert_eq!(joint.total_length(), 9.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use nalgebra::{Point2, Vector2};
use sim_types::{BodyId, RigidBody, StepContext, EPSILON};
use tracing::trace;

use crate::{ConstraintError, Joint, JointDef, JointType, LimitState, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shortest length either side of the rope may be pulled to.
pub const MIN_PULLEY_LENGTH: f64 = 2.0;

/// Configuration for a [`PulleyJoint`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PulleyJointDef {
    /// Bodies and collision flag.
    pub base: JointDef,
    /// Fixed world point the rope on side A hangs from.
    pub ground_anchor_a: Point2<f64>,
    /// Fixed world point the rope on side B hangs from.
    pub ground_anchor_b: Point2<f64>,
    /// Rope attachment on body A, in body A's frame.
    pub local_anchor_a: Point2<f64>,
    /// Rope attachment on body B, in body B's frame.
    pub local_anchor_b: Point2<f64>,
    /// Reference length of side A.
    pub length_a: f64,
    /// Hard limit on side A.
    pub max_length_a: f64,
    /// Reference length of side B.
    pub length_b: f64,
    /// Hard limit on side B.
    pub max_length_b: f64,
    /// Weight of side B in the conserved length.
    pub ratio: f64,
}

impl PulleyJointDef {
    /// Definition with the stock anchors, zero lengths and a 1:1 ratio.
    ///
    /// Connected bodies collide by default, since a rope does not keep them
    /// apart.
    #[must_use]
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            base: JointDef::new(body_a, body_b).with_collide_connected(true),
            ground_anchor_a: Point2::new(-1.0, 1.0),
            ground_anchor_b: Point2::new(1.0, 1.0),
            local_anchor_a: Point2::new(-1.0, 0.0),
            local_anchor_b: Point2::new(1.0, 0.0),
            length_a: 0.0,
            max_length_a: 0.0,
            length_b: 0.0,
            max_length_b: 0.0,
            ratio: 1.0,
        }
    }

    /// Build a definition from world-space anchors on the current body poses.
    ///
    /// Reference lengths are measured from the anchors to their ground
    /// points. The maximum lengths are derived so that, at either limit, the
    /// other side still keeps [`MIN_PULLEY_LENGTH`] of rope.
    pub fn initialize(
        body_a: &RigidBody,
        body_b: &RigidBody,
        ground_anchor_a: Point2<f64>,
        ground_anchor_b: Point2<f64>,
        anchor_a: Point2<f64>,
        anchor_b: Point2<f64>,
        ratio: f64,
    ) -> Result<Self> {
        check_ratio(ratio)?;

        let length_a = (anchor_a - ground_anchor_a).norm();
        let length_b = (anchor_b - ground_anchor_b).norm();
        let total_length = length_a + ratio * length_b;

        Ok(Self {
            base: JointDef::new(body_a.id(), body_b.id()).with_collide_connected(true),
            ground_anchor_a,
            ground_anchor_b,
            local_anchor_a: body_a.local_point(&anchor_a),
            local_anchor_b: body_b.local_point(&anchor_b),
            length_a,
            max_length_a: total_length - ratio * MIN_PULLEY_LENGTH,
            length_b,
            max_length_b: (total_length - MIN_PULLEY_LENGTH) / ratio,
            ratio,
        })
    }

    /// Set whether the connected bodies collide.
    #[must_use]
    pub fn with_collide_connected(mut self, collide_connected: bool) -> Self {
        self.base.collide_connected = collide_connected;
        self
    }

    /// Validate the definition.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        check_ratio(self.ratio)?;

        let points = [
            self.ground_anchor_a,
            self.ground_anchor_b,
            self.local_anchor_a,
            self.local_anchor_b,
        ];
        if !points.iter().all(|p| p.coords.iter().all(|x| x.is_finite())) {
            return Err(ConstraintError::invalid_definition(
                "pulley anchors must be finite",
            ));
        }

        let lengths = [
            self.length_a,
            self.length_b,
            self.max_length_a,
            self.max_length_b,
        ];
        if !lengths.iter().all(|l| l.is_finite()) {
            return Err(ConstraintError::invalid_definition(
                "pulley lengths must be finite",
            ));
        }

        Ok(())
    }
}

fn check_ratio(ratio: f64) -> Result<()> {
    if ratio.is_finite() && ratio > EPSILON {
        Ok(())
    } else {
        Err(ConstraintError::InvalidRatio { ratio })
    }
}

/// A pulley joint between two bodies.
///
/// Created from a [`PulleyJointDef`]; the anchors, ratio and length budget
/// are fixed for the joint's lifetime. Axes, states and effective masses are
/// recomputed every step, while the accumulated impulses carry over for warm
/// starting.
#[derive(Debug, Clone, PartialEq)]
pub struct PulleyJoint {
    body_a: BodyId,
    body_b: BodyId,
    collide_connected: bool,

    ground_anchor_a: Point2<f64>,
    ground_anchor_b: Point2<f64>,
    local_anchor_a: Point2<f64>,
    local_anchor_b: Point2<f64>,
    ratio: f64,
    total_length: f64,
    max_length_a: f64,
    max_length_b: f64,

    // Unit axes from ground anchor to body anchor, zero when degenerate.
    u_a: Vector2<f64>,
    u_b: Vector2<f64>,

    pulley_mass: f64,
    limit_mass_a: f64,
    limit_mass_b: f64,

    impulse: f64,
    limit_impulse_a: f64,
    limit_impulse_b: f64,

    state: LimitState,
    limit_state_a: LimitState,
    limit_state_b: LimitState,
}

impl PulleyJoint {
    /// Create a joint from a validated definition.
    ///
    /// The length budget comes from the definition's reference lengths, not
    /// from the live body positions. Each maximum length is tightened to the
    /// stricter of the definition's value and the one implied by the budget
    /// and [`MIN_PULLEY_LENGTH`].
    pub fn new(def: &PulleyJointDef) -> Result<Self> {
        def.validate()?;

        let ratio = def.ratio;
        let total_length = def.length_a + ratio * def.length_b;

        Ok(Self {
            body_a: def.base.body_a,
            body_b: def.base.body_b,
            collide_connected: def.base.collide_connected,
            ground_anchor_a: def.ground_anchor_a,
            ground_anchor_b: def.ground_anchor_b,
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            ratio,
            total_length,
            max_length_a: def
                .max_length_a
                .min(total_length - ratio * MIN_PULLEY_LENGTH),
            max_length_b: def
                .max_length_b
                .min((total_length - MIN_PULLEY_LENGTH) / ratio),
            u_a: Vector2::zeros(),
            u_b: Vector2::zeros(),
            pulley_mass: 0.0,
            limit_mass_a: 0.0,
            limit_mass_b: 0.0,
            impulse: 0.0,
            limit_impulse_a: 0.0,
            limit_impulse_b: 0.0,
            state: LimitState::Inactive,
            limit_state_a: LimitState::Inactive,
            limit_state_b: LimitState::Inactive,
        })
    }

    /// Ground anchor of side A in world coordinates.
    #[must_use]
    pub fn ground_anchor_a(&self) -> Point2<f64> {
        self.ground_anchor_a
    }

    /// Ground anchor of side B in world coordinates.
    #[must_use]
    pub fn ground_anchor_b(&self) -> Point2<f64> {
        self.ground_anchor_b
    }

    /// Attachment point in body A's frame.
    #[must_use]
    pub fn local_anchor_a(&self) -> Point2<f64> {
        self.local_anchor_a
    }

    /// Attachment point in body B's frame.
    #[must_use]
    pub fn local_anchor_b(&self) -> Point2<f64> {
        self.local_anchor_b
    }

    /// Current length of side A.
    #[must_use]
    pub fn length_a(&self, body_a: &RigidBody) -> f64 {
        (body_a.world_point(&self.local_anchor_a) - self.ground_anchor_a).norm()
    }

    /// Current length of side B.
    #[must_use]
    pub fn length_b(&self, body_b: &RigidBody) -> f64 {
        (body_b.world_point(&self.local_anchor_b) - self.ground_anchor_b).norm()
    }

    /// Weight of side B in the conserved length.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Budget for `length_a + ratio * length_b`.
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Effective limit on side A.
    #[must_use]
    pub fn max_length_a(&self) -> f64 {
        self.max_length_a
    }

    /// Effective limit on side B.
    #[must_use]
    pub fn max_length_b(&self) -> f64 {
        self.max_length_b
    }

    /// Accumulated impulse of the main rope constraint.
    #[must_use]
    pub fn impulse(&self) -> f64 {
        self.impulse
    }

    /// Accumulated impulse of the side A length limit.
    #[must_use]
    pub fn limit_impulse_a(&self) -> f64 {
        self.limit_impulse_a
    }

    /// Accumulated impulse of the side B length limit.
    #[must_use]
    pub fn limit_impulse_b(&self) -> f64 {
        self.limit_impulse_b
    }

    /// State of the main rope constraint.
    #[must_use]
    pub fn state(&self) -> LimitState {
        self.state
    }

    /// State of the side A length limit.
    #[must_use]
    pub fn limit_state_a(&self) -> LimitState {
        self.limit_state_a
    }

    /// State of the side B length limit.
    #[must_use]
    pub fn limit_state_b(&self) -> LimitState {
        self.limit_state_b
    }
}

impl Joint for PulleyJoint {
    fn joint_type(&self) -> JointType {
        JointType::Pulley
    }

    fn body_a(&self) -> BodyId {
        self.body_a
    }

    fn body_b(&self) -> BodyId {
        self.body_b
    }

    fn collide_connected(&self) -> bool {
        self.collide_connected
    }

    fn anchor_a(&self, body_a: &RigidBody) -> Point2<f64> {
        body_a.world_point(&self.local_anchor_a)
    }

    fn anchor_b(&self, body_b: &RigidBody) -> Point2<f64> {
        body_b.world_point(&self.local_anchor_b)
    }

    fn reaction_force(&self, inv_dt: f64) -> Vector2<f64> {
        self.u_b * (inv_dt * self.impulse)
    }

    fn reaction_torque(&self, _inv_dt: f64) -> f64 {
        0.0
    }

    fn init_velocity_constraints(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        step: &StepContext,
    ) -> Result<()> {
        debug_assert_eq!(body_a.id(), self.body_a);
        debug_assert_eq!(body_b.id(), self.body_b);

        let slop = step.tolerances.linear_slop;
        let r_a = anchor_arm(body_a, &self.local_anchor_a);
        let r_b = anchor_arm(body_b, &self.local_anchor_b);

        let (u_a, length_a) = pulley_axis(
            &(body_a.world_center() + r_a),
            &self.ground_anchor_a,
            slop,
        );
        let (u_b, length_b) = pulley_axis(
            &(body_b.world_center() + r_b),
            &self.ground_anchor_b,
            slop,
        );
        self.u_a = u_a;
        self.u_b = u_b;

        let slack = self.total_length - length_a - self.ratio * length_b;
        let state = if slack > 0.0 {
            LimitState::Inactive
        } else {
            LimitState::AtUpper
        };
        self.state = transition("pulley", self.state, state);
        if !self.state.is_active() {
            self.impulse = 0.0;
        }

        self.limit_state_a = transition(
            "limit a",
            self.limit_state_a,
            LimitState::upper(length_a, self.max_length_a),
        );
        if !self.limit_state_a.is_active() {
            self.limit_impulse_a = 0.0;
        }

        self.limit_state_b = transition(
            "limit b",
            self.limit_state_b,
            LimitState::upper(length_b, self.max_length_b),
        );
        if !self.limit_state_b.is_active() {
            self.limit_impulse_b = 0.0;
        }

        let cr_a = r_a.perp(&self.u_a);
        let cr_b = r_b.perp(&self.u_b);
        let k_a = body_a.inv_mass() + body_a.inv_inertia() * cr_a * cr_a;
        let k_b = body_b.inv_mass() + body_b.inv_inertia() * cr_b * cr_b;
        let k_pulley = k_a + self.ratio * self.ratio * k_b;

        self.limit_mass_a = 1.0 / positive_mass("limit a", k_a)?;
        self.limit_mass_b = 1.0 / positive_mass("limit b", k_b)?;
        self.pulley_mass = 1.0 / positive_mass("pulley", k_pulley)?;

        if step.warm_starting {
            self.impulse *= step.dt_ratio;
            self.limit_impulse_a *= step.dt_ratio;
            self.limit_impulse_b *= step.dt_ratio;

            let p_a = self.u_a * -(self.impulse + self.limit_impulse_a);
            let p_b = self.u_b * -(self.ratio * self.impulse + self.limit_impulse_b);
            apply_velocity_impulse(body_a, &r_a, &p_a);
            apply_velocity_impulse(body_b, &r_b, &p_b);
        } else {
            self.impulse = 0.0;
            self.limit_impulse_a = 0.0;
            self.limit_impulse_b = 0.0;
        }

        Ok(())
    }

    fn solve_velocity_constraints(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        _step: &StepContext,
    ) {
        let r_a = anchor_arm(body_a, &self.local_anchor_a);
        let r_b = anchor_arm(body_b, &self.local_anchor_b);

        if self.state.is_active() {
            let v_a = body_a.twist().velocity_at_point(&r_a);
            let v_b = body_b.twist().velocity_at_point(&r_b);

            let cdot = -self.u_a.dot(&v_a) - self.ratio * self.u_b.dot(&v_b);
            let impulse = accumulate(&mut self.impulse, -self.pulley_mass * cdot);

            apply_velocity_impulse(body_a, &r_a, &(self.u_a * -impulse));
            apply_velocity_impulse(body_b, &r_b, &(self.u_b * (-self.ratio * impulse)));
        }

        if self.limit_state_a.is_active() {
            let v_a = body_a.twist().velocity_at_point(&r_a);

            let cdot = -self.u_a.dot(&v_a);
            let impulse = accumulate(&mut self.limit_impulse_a, -self.limit_mass_a * cdot);

            apply_velocity_impulse(body_a, &r_a, &(self.u_a * -impulse));
        }

        if self.limit_state_b.is_active() {
            let v_b = body_b.twist().velocity_at_point(&r_b);

            let cdot = -self.u_b.dot(&v_b);
            let impulse = accumulate(&mut self.limit_impulse_b, -self.limit_mass_b * cdot);

            apply_velocity_impulse(body_b, &r_b, &(self.u_b * -impulse));
        }
    }

    fn solve_position_constraints(
        &mut self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        step: &StepContext,
    ) -> bool {
        let tol = step.tolerances;
        let mut linear_error: f64 = 0.0;

        if self.state.is_active() {
            let r_a = anchor_arm(body_a, &self.local_anchor_a);
            let r_b = anchor_arm(body_b, &self.local_anchor_b);
            let (u_a, length_a) = pulley_axis(
                &(body_a.world_center() + r_a),
                &self.ground_anchor_a,
                tol.linear_slop,
            );
            let (u_b, length_b) = pulley_axis(
                &(body_b.world_center() + r_b),
                &self.ground_anchor_b,
                tol.linear_slop,
            );

            let c = self.total_length - length_a - self.ratio * length_b;
            linear_error = linear_error.max(-c);

            let c = (c + tol.linear_slop).clamp(-tol.max_linear_correction, 0.0);
            let impulse = -self.pulley_mass * c;

            apply_position_impulse(body_a, &r_a, &(u_a * -impulse));
            apply_position_impulse(body_b, &r_b, &(u_b * (-self.ratio * impulse)));
        }

        if self.limit_state_a.is_active() {
            let r_a = anchor_arm(body_a, &self.local_anchor_a);
            let (u_a, length_a) = pulley_axis(
                &(body_a.world_center() + r_a),
                &self.ground_anchor_a,
                tol.linear_slop,
            );

            let c = self.max_length_a - length_a;
            linear_error = linear_error.max(-c);

            let c = (c + tol.linear_slop).clamp(-tol.max_linear_correction, 0.0);
            let impulse = -self.limit_mass_a * c;

            apply_position_impulse(body_a, &r_a, &(u_a * -impulse));
        }

        if self.limit_state_b.is_active() {
            let r_b = anchor_arm(body_b, &self.local_anchor_b);
            let (u_b, length_b) = pulley_axis(
                &(body_b.world_center() + r_b),
                &self.ground_anchor_b,
                tol.linear_slop,
            );

            let c = self.max_length_b - length_b;
            linear_error = linear_error.max(-c);

            let c = (c + tol.linear_slop).clamp(-tol.max_linear_correction, 0.0);
            let impulse = -self.limit_mass_b * c;

            apply_position_impulse(body_b, &r_b, &(u_b * -impulse));
        }

        linear_error < tol.linear_slop
    }
}

/// World-space offset of a local anchor from the body's center of mass.
fn anchor_arm(body: &RigidBody, local_anchor: &Point2<f64>) -> Vector2<f64> {
    body.pose()
        .transform_vector(&(local_anchor.coords - body.local_center()))
}

/// Unit axis from `ground` to `anchor` and the distance between them.
///
/// Below `slop` the axis is zero so the side contributes nothing this step.
fn pulley_axis(anchor: &Point2<f64>, ground: &Point2<f64>, slop: f64) -> (Vector2<f64>, f64) {
    let d = anchor - ground;
    let length = d.norm();
    if length > slop {
        (d / length, length)
    } else {
        (Vector2::zeros(), length)
    }
}

fn positive_mass(constraint: &'static str, mass: f64) -> Result<f64> {
    if mass > EPSILON {
        Ok(mass)
    } else {
        Err(ConstraintError::DegenerateMass { constraint, mass })
    }
}

/// Add `delta` to a non-negative running total; returns what was actually added.
fn accumulate(total: &mut f64, delta: f64) -> f64 {
    let old = *total;
    *total = (old + delta).max(0.0);
    *total - old
}

fn transition(constraint: &'static str, from: LimitState, to: LimitState) -> LimitState {
    if from != to {
        trace!(constraint, ?from, ?to, "pulley state change");
    }
    to
}

fn apply_velocity_impulse(body: &mut RigidBody, r: &Vector2<f64>, p: &Vector2<f64>) {
    let inv_mass = body.inv_mass();
    let inv_inertia = body.inv_inertia();
    let twist = body.twist_mut();
    twist.linear += p * inv_mass;
    twist.angular += inv_inertia * r.perp(p);
}

fn apply_position_impulse(body: &mut RigidBody, r: &Vector2<f64>, p: &Vector2<f64>) {
    let inv_mass = body.inv_mass();
    let inv_inertia = body.inv_inertia();
    let sweep = body.sweep_mut();
    sweep.c += p * inv_mass;
    sweep.a += inv_inertia * r.perp(p);
    body.synchronize_transform();
}
