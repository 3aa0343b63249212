//! Shared fixtures for the constraint scenario tests.
//!
//! The standard rig hangs body A under ground anchor `(-2, 10)` and body B
//! under ground anchor `(2, 10)`, with each rope attached at the body's
//! center of mass. Both sides start vertical, so the pulley axes point
//! straight down.

#![warn(missing_docs)]

use nalgebra::Point2;
use sim_constraint::{
    BodySet, ConstraintSolver, PulleyJoint, PulleyJointDef, Result, SolverResult,
};
use sim_types::{BodyId, MassProperties, Pose, RigidBody};

/// Body ID of side A in [`PulleyRig`].
pub const BODY_A: BodyId = BodyId::new(1);

/// Body ID of side B in [`PulleyRig`].
pub const BODY_B: BodyId = BodyId::new(2);

/// Height of both ground anchors.
pub const GROUND_HEIGHT: f64 = 10.0;

/// Two point masses on a vertical pulley.
#[derive(Debug, Clone)]
pub struct PulleyRig {
    /// The joint under test.
    pub joint: PulleyJoint,
    /// Bodies A and B.
    pub bodies: BodySet,
}

impl PulleyRig {
    /// Hang A `length_a` and B `length_b` below their ground anchors.
    pub fn hanging(
        length_a: f64,
        length_b: f64,
        ratio: f64,
        mass_a: f64,
        mass_b: f64,
    ) -> Result<Self> {
        let def = Self::definition(length_a, length_b, ratio, mass_a, mass_b)?;
        Self::from_definition(&def, length_a, length_b, mass_a, mass_b)
    }

    /// The definition [`hanging`](Self::hanging) would build, for tweaking
    /// before construction.
    pub fn definition(
        length_a: f64,
        length_b: f64,
        ratio: f64,
        mass_a: f64,
        mass_b: f64,
    ) -> Result<PulleyJointDef> {
        let a = point_mass(BODY_A, -2.0, GROUND_HEIGHT - length_a, mass_a)?;
        let b = point_mass(BODY_B, 2.0, GROUND_HEIGHT - length_b, mass_b)?;
        PulleyJointDef::initialize(
            &a,
            &b,
            ground_anchor_a(),
            ground_anchor_b(),
            a.world_center(),
            b.world_center(),
            ratio,
        )
    }

    /// Build a rig from an explicit definition, placing the bodies at the
    /// given lengths below their ground anchors.
    pub fn from_definition(
        def: &PulleyJointDef,
        length_a: f64,
        length_b: f64,
        mass_a: f64,
        mass_b: f64,
    ) -> Result<Self> {
        let joint = PulleyJoint::new(def)?;
        let bodies = [
            point_mass(BODY_A, -2.0, GROUND_HEIGHT - length_a, mass_a)?,
            point_mass(BODY_B, 2.0, GROUND_HEIGHT - length_b, mass_b)?,
        ]
        .into_iter()
        .collect();
        Ok(Self { joint, bodies })
    }

    /// Body A, if still present.
    pub fn body_a(&self) -> Option<&RigidBody> {
        self.bodies.get(BODY_A)
    }

    /// Body B, if still present.
    pub fn body_b(&self) -> Option<&RigidBody> {
        self.bodies.get(BODY_B)
    }

    /// Current side lengths.
    pub fn lengths(&self) -> Option<(f64, f64)> {
        Some((
            self.joint.length_a(self.body_a()?),
            self.joint.length_b(self.body_b()?),
        ))
    }

    /// `total_length - length_a - ratio * length_b`; negative when over-extended.
    pub fn slack(&self) -> Option<f64> {
        let (la, lb) = self.lengths()?;
        Some(self.joint.total_length() - la - self.joint.ratio() * lb)
    }

    /// Run one solver step on this rig.
    pub fn step(&mut self, solver: &mut ConstraintSolver, dt: f64) -> Result<SolverResult> {
        solver.step(std::slice::from_mut(&mut self.joint), &mut self.bodies, dt)
    }

    /// Move body A's center of mass straight down by `dy`.
    pub fn lower_a(&mut self, dy: f64) {
        lower(&mut self.bodies, BODY_A, dy);
    }

    /// Move body B's center of mass straight down by `dy`.
    pub fn lower_b(&mut self, dy: f64) {
        lower(&mut self.bodies, BODY_B, dy);
    }
}

/// Ground anchor of side A.
pub fn ground_anchor_a() -> Point2<f64> {
    Point2::new(-2.0, GROUND_HEIGHT)
}

/// Ground anchor of side B.
pub fn ground_anchor_b() -> Point2<f64> {
    Point2::new(2.0, GROUND_HEIGHT)
}

/// A non-rotating body at `(x, y)`.
pub fn point_mass(id: BodyId, x: f64, y: f64, mass: f64) -> Result<RigidBody> {
    Ok(RigidBody::dynamic(
        id,
        Pose::from_position(Point2::new(x, y)),
        MassProperties::point_mass(mass),
    )?)
}

fn lower(bodies: &mut BodySet, id: BodyId, dy: f64) {
    if let Some(body) = bodies.get_mut(id) {
        body.sweep_mut().c.y -= dy;
        body.synchronize_transform();
    }
}
