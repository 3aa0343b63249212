//! Planar rigid body state types.
//!
//! This module provides the body abstraction constraints operate on: a pose
//! (position + orientation), a twist (linear + angular velocity), a sweep used
//! by position correction, and the mass properties that determine how a body
//! responds to impulses.
//!
//! Joints only touch a body through the narrow accessor set on [`RigidBody`]:
//! transform reads, inverse mass/inertia, and mutable access to the twist and
//! sweep followed by [`RigidBody::synchronize_transform`].

use nalgebra::{Point2, UnitComplex, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// Unique identifier for a rigid body in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

impl BodyId {
    /// Create a new body ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for BodyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Position and orientation of a body in the plane.
///
/// # Example
///
/// ```
/// use sim_types::Pose;
/// use nalgebra::Point2;
///
/// let pose = Pose::from_position(Point2::new(1.0, 2.0));
/// let world = pose.transform_point(&Point2::new(1.0, 0.0));
/// assert_eq!(world, Point2::new(2.0, 2.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position of the body origin in world coordinates.
    pub position: Point2<f64>,
    /// Orientation.
    pub rotation: UnitComplex<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point2::origin(),
            rotation: UnitComplex::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point2<f64>) -> Self {
        Self {
            position,
            rotation: UnitComplex::identity(),
        }
    }

    /// Create a pose from a position and a rotation angle in radians.
    #[must_use]
    pub fn new(position: Point2<f64>, angle: f64) -> Self {
        Self {
            position,
            rotation: UnitComplex::new(angle),
        }
    }

    /// Rotation angle in radians.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.rotation.angle()
    }

    /// Transform a point from local to world coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point2<f64>) -> Point2<f64> {
        self.position + self.rotation * local.coords
    }

    /// Transform a vector from local to world coordinates (rotation only).
    #[must_use]
    pub fn transform_vector(&self, local: &Vector2<f64>) -> Vector2<f64> {
        self.rotation * local
    }

    /// Transform a point from world to local coordinates.
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point2<f64>) -> Point2<f64> {
        Point2::from(self.rotation.inverse() * (world - self.position))
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite()) && self.rotation.angle().is_finite()
    }
}

/// Linear and angular velocity of a planar body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist {
    /// Linear velocity of the center of mass (m/s).
    pub linear: Vector2<f64>,
    /// Angular velocity (rad/s, counter-clockwise positive).
    pub angular: f64,
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl Twist {
    /// Create a twist with specified linear and angular velocity.
    #[must_use]
    pub const fn new(linear: Vector2<f64>, angular: f64) -> Self {
        Self { linear, angular }
    }

    /// Create a zero twist (at rest).
    #[must_use]
    pub fn zero() -> Self {
        Self {
            linear: Vector2::zeros(),
            angular: 0.0,
        }
    }

    /// Create a twist with linear velocity only.
    #[must_use]
    pub fn linear(v: Vector2<f64>) -> Self {
        Self {
            linear: v,
            angular: 0.0,
        }
    }

    /// Velocity of a point at `offset` from the center of mass.
    ///
    /// `v_point` = `v_linear` + ω × r
    #[must_use]
    pub fn velocity_at_point(&self, offset: &Vector2<f64>) -> Vector2<f64> {
        self.linear + Vector2::new(-self.angular * offset.y, self.angular * offset.x)
    }

    /// Check if the twist contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.linear.iter().all(|x| x.is_finite()) && self.angular.is_finite()
    }
}

/// Center of mass and angle that position correction works on.
///
/// Position correction moves `c` and `a` directly; the body pose is rebuilt
/// from them by [`RigidBody::synchronize_transform`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sweep {
    /// Center of mass in body-local coordinates.
    pub local_center: Vector2<f64>,
    /// Current world center of mass.
    pub c: Point2<f64>,
    /// Current angle.
    pub a: f64,
}

impl Sweep {
    /// Create a sweep at rest for a body at `pose`.
    #[must_use]
    pub fn at_pose(pose: &Pose, local_center: Vector2<f64>) -> Self {
        let c = pose.transform_point(&Point2::from(local_center));
        let a = pose.angle();
        Self {
            local_center,
            c,
            a,
        }
    }

    /// Pose described by the current center and angle.
    #[must_use]
    pub fn pose(&self) -> Pose {
        let rotation = UnitComplex::new(self.a);
        Pose {
            position: self.c - rotation * self.local_center,
            rotation,
        }
    }
}

/// Mass properties of a planar rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Total mass in kg.
    pub mass: f64,
    /// Center of mass offset from the body origin, in local coordinates.
    pub local_center: Vector2<f64>,
    /// Rotational inertia about the center of mass (kg·m²).
    pub inertia: f64,
}

impl MassProperties {
    /// Create mass properties with given values.
    #[must_use]
    pub const fn new(mass: f64, local_center: Vector2<f64>, inertia: f64) -> Self {
        Self {
            mass,
            local_center,
            inertia,
        }
    }

    /// A point mass at the body origin. Cannot rotate.
    #[must_use]
    pub fn point_mass(mass: f64) -> Self {
        Self {
            mass,
            local_center: Vector2::zeros(),
            inertia: 0.0,
        }
    }

    /// Uniform disc: I = ½ m r².
    #[must_use]
    pub fn disc(mass: f64, radius: f64) -> Self {
        Self {
            mass,
            local_center: Vector2::zeros(),
            inertia: 0.5 * mass * radius * radius,
        }
    }

    /// Uniform box with the given half extents: I = m (w² + h²) / 12.
    #[must_use]
    pub fn box_shape(mass: f64, half_extents: Vector2<f64>) -> Self {
        let w2 = 4.0 * half_extents.x * half_extents.x;
        let h2 = 4.0 * half_extents.y * half_extents.y;
        Self {
            mass,
            local_center: Vector2::zeros(),
            inertia: mass * (w2 + h2) / 12.0,
        }
    }

    /// Move the center of mass.
    #[must_use]
    pub fn with_local_center(mut self, local_center: Vector2<f64>) -> Self {
        self.local_center = local_center;
        self
    }

    /// Inverse mass (0 for static bodies).
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        if self.is_static() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Inverse rotational inertia (0 when the body cannot rotate).
    #[must_use]
    pub fn inverse_inertia(&self) -> f64 {
        if self.inertia <= 0.0 || self.inertia.is_infinite() {
            0.0
        } else {
            1.0 / self.inertia
        }
    }

    /// Check if this represents a static (immovable) body.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.mass <= 0.0 || self.mass.is_infinite()
    }

    /// Validate that the mass properties are physically valid.
    pub fn validate(&self) -> Result<()> {
        if self.mass.is_nan() || self.mass < 0.0 {
            return Err(SimError::invalid_mass("mass must be non-negative"));
        }

        if self.inertia.is_nan() || self.inertia < 0.0 {
            return Err(SimError::invalid_mass("inertia must be non-negative"));
        }

        if !self.local_center.iter().all(|x| x.is_finite()) {
            return Err(SimError::invalid_mass("center of mass must be finite"));
        }

        Ok(())
    }
}

/// A planar rigid body as seen by the constraint solver.
///
/// The cached [`Pose`] is what joints read for anchor transforms. Position
/// correction writes to the [`Sweep`] and must call
/// [`synchronize_transform`](Self::synchronize_transform) afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    id: BodyId,
    mass: MassProperties,
    inv_mass: f64,
    inv_inertia: f64,
    pose: Pose,
    sweep: Sweep,
    twist: Twist,
}

impl RigidBody {
    /// Create a dynamic body at `pose`.
    ///
    /// A zero mass is accepted and behaves like a static body.
    pub fn dynamic(id: BodyId, pose: Pose, mass: MassProperties) -> Result<Self> {
        mass.validate()?;
        if !pose.is_finite() {
            return Err(SimError::invalid_config(format!(
                "{id} has a non-finite pose"
            )));
        }

        Ok(Self {
            id,
            inv_mass: mass.inverse_mass(),
            inv_inertia: mass.inverse_inertia(),
            sweep: Sweep::at_pose(&pose, mass.local_center),
            pose,
            mass,
            twist: Twist::zero(),
        })
    }

    /// Create an immovable body at `pose`.
    #[must_use]
    pub fn fixed(id: BodyId, pose: Pose) -> Self {
        Self {
            id,
            mass: MassProperties::point_mass(0.0),
            inv_mass: 0.0,
            inv_inertia: 0.0,
            sweep: Sweep::at_pose(&pose, Vector2::zeros()),
            pose,
            twist: Twist::zero(),
        }
    }

    /// Set the initial velocity.
    #[must_use]
    pub fn with_twist(mut self, twist: Twist) -> Self {
        self.twist = twist;
        self
    }

    /// Body identifier.
    #[must_use]
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Mass properties.
    #[must_use]
    pub fn mass_properties(&self) -> &MassProperties {
        &self.mass
    }

    /// Cached world transform.
    #[must_use]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Center of mass in body-local coordinates.
    #[must_use]
    pub fn local_center(&self) -> Vector2<f64> {
        self.sweep.local_center
    }

    /// Current world center of mass.
    #[must_use]
    pub fn world_center(&self) -> Point2<f64> {
        self.sweep.c
    }

    /// Local point to world coordinates using the cached transform.
    #[must_use]
    pub fn world_point(&self, local: &Point2<f64>) -> Point2<f64> {
        self.pose.transform_point(local)
    }

    /// World point to local coordinates using the cached transform.
    #[must_use]
    pub fn local_point(&self, world: &Point2<f64>) -> Point2<f64> {
        self.pose.inverse_transform_point(world)
    }

    /// Inverse mass (0 for static bodies).
    #[must_use]
    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    /// Inverse rotational inertia about the center of mass.
    #[must_use]
    pub fn inv_inertia(&self) -> f64 {
        self.inv_inertia
    }

    /// Whether impulses can move this body.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0 && self.inv_inertia == 0.0
    }

    /// Current velocity.
    #[must_use]
    pub fn twist(&self) -> &Twist {
        &self.twist
    }

    /// Mutable velocity, for impulse application.
    pub fn twist_mut(&mut self) -> &mut Twist {
        &mut self.twist
    }

    /// Current sweep.
    #[must_use]
    pub fn sweep(&self) -> &Sweep {
        &self.sweep
    }

    /// Mutable sweep, for position correction.
    pub fn sweep_mut(&mut self) -> &mut Sweep {
        &mut self.sweep
    }

    /// Rebuild the cached transform from the sweep.
    pub fn synchronize_transform(&mut self) {
        self.pose = self.sweep.pose();
    }

    /// Apply gravity to the velocity of a movable body.
    pub fn integrate_velocity(&mut self, gravity: &Vector2<f64>, dt: f64) {
        if self.inv_mass == 0.0 {
            return;
        }
        self.twist.linear += gravity * dt;
    }

    /// Advance the sweep by `dt` using the current velocity.
    pub fn integrate_position(&mut self, dt: f64) {
        self.sweep.c += self.twist.linear * dt;
        self.sweep.a += self.twist.angular * dt;
        self.synchronize_transform();
    }

    /// Check if the state contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.pose.is_finite() && self.twist.is_finite()
    }
}
