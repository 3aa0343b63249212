//! Sequential-impulse step driver for joint constraints.
//!
//! # Solver Approach
//!
//! One call to [`ConstraintSolver::step`] runs the classic sequential-impulse
//! pipeline:
//!
//! 1. Integrate gravity into body velocities
//! 2. Initialize every joint (axes, states, effective masses, warm start)
//! 3. Run the velocity iterations over all joints
//! 4. Integrate positions from the corrected velocities
//! 5. Run position iterations until every joint reports convergence or the
//!    iteration budget runs out
//!
//! Joints are handed to the solver by slice and keep their accumulated
//! impulses between calls, so warm starting works across steps as long as the
//! same joints are passed in.

use std::collections::HashMap;

use nalgebra::Vector2;
use sim_types::{BodyId, RigidBody, SimError, SimulationConfig, StepContext, Tolerances};
use tracing::{debug, warn};

use crate::{ConstraintError, Joint, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the constraint solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstraintSolverConfig {
    /// Number of velocity iterations.
    pub velocity_iterations: usize,

    /// Maximum number of position iterations.
    pub position_iterations: usize,

    /// Whether to warm-start from the previous step's impulses.
    pub warm_starting: bool,

    /// Gravity applied to every movable body (m/s²).
    pub gravity: Vector2<f64>,

    /// Slop and per-iteration correction bounds.
    pub tolerances: Tolerances,
}

impl Default for ConstraintSolverConfig {
    fn default() -> Self {
        Self {
            velocity_iterations: 8,
            position_iterations: 3,
            warm_starting: true,
            gravity: Vector2::new(0.0, -9.81),
            tolerances: Tolerances::default(),
        }
    }
}

impl ConstraintSolverConfig {
    /// High-accuracy configuration for robotics.
    #[must_use]
    pub fn robotics() -> Self {
        Self {
            velocity_iterations: 16,
            position_iterations: 8,
            ..Default::default()
        }
    }

    /// Fast configuration for real-time applications.
    #[must_use]
    pub fn realtime() -> Self {
        Self {
            velocity_iterations: 4,
            position_iterations: 2,
            ..Default::default()
        }
    }

    /// Set the gravity.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vector2<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Enable or disable warm starting.
    #[must_use]
    pub fn with_warm_starting(mut self, warm_starting: bool) -> Self {
        self.warm_starting = warm_starting;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.velocity_iterations == 0 {
            return Err(SimError::invalid_config("velocity_iterations must be at least 1").into());
        }
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(SimError::invalid_config("gravity must be finite").into());
        }
        self.tolerances.validate()?;
        Ok(())
    }
}

impl From<&SimulationConfig> for ConstraintSolverConfig {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            velocity_iterations: config.velocity_iterations,
            position_iterations: config.position_iterations,
            warm_starting: config.warm_starting,
            gravity: config.gravity,
            tolerances: config.tolerances,
        }
    }
}

/// Rigid bodies addressed by [`BodyId`].
#[derive(Debug, Clone, Default)]
pub struct BodySet {
    bodies: Vec<RigidBody>,
    index: HashMap<BodyId, usize>,
}

impl BodySet {
    /// Create an empty body set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a body, replacing and returning any body with the same ID.
    pub fn insert(&mut self, body: RigidBody) -> Option<RigidBody> {
        if let Some(&i) = self.index.get(&body.id()) {
            return Some(std::mem::replace(&mut self.bodies[i], body));
        }
        self.index.insert(body.id(), self.bodies.len());
        self.bodies.push(body);
        None
    }

    /// Look up a body.
    #[must_use]
    pub fn get(&self, id: BodyId) -> Option<&RigidBody> {
        self.index.get(&id).map(|&i| &self.bodies[i])
    }

    /// Look up a body mutably.
    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.index.get(&id).map(|&i| &mut self.bodies[i])
    }

    /// Check whether a body is present.
    #[must_use]
    pub fn contains(&self, id: BodyId) -> bool {
        self.index.contains_key(&id)
    }

    /// Borrow two distinct bodies mutably at once.
    pub fn pair_mut(&mut self, a: BodyId, b: BodyId) -> Result<(&mut RigidBody, &mut RigidBody)> {
        if a == b {
            return Err(ConstraintError::SameBody(a));
        }
        let ia = *self.index.get(&a).ok_or(ConstraintError::BodyNotFound(a))?;
        let ib = *self.index.get(&b).ok_or(ConstraintError::BodyNotFound(b))?;

        if ia < ib {
            let (lo, hi) = self.bodies.split_at_mut(ib);
            Ok((&mut lo[ia], &mut hi[0]))
        } else {
            let (lo, hi) = self.bodies.split_at_mut(ia);
            Ok((&mut hi[0], &mut lo[ib]))
        }
    }

    /// Number of bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Iterate over bodies in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RigidBody> {
        self.bodies.iter()
    }

    /// Iterate mutably over bodies in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RigidBody> {
        self.bodies.iter_mut()
    }
}

impl FromIterator<RigidBody> for BodySet {
    fn from_iter<T: IntoIterator<Item = RigidBody>>(iter: T) -> Self {
        let mut set = Self::new();
        for body in iter {
            set.insert(body);
        }
        set
    }
}

/// The constraint solver.
#[derive(Debug, Clone)]
pub struct ConstraintSolver {
    /// Solver configuration.
    config: ConstraintSolverConfig,

    /// Timestep of the last completed step, for warm-start rescaling.
    previous_dt: Option<f64>,
}

impl ConstraintSolver {
    /// Create a new constraint solver.
    #[must_use]
    pub fn new(config: ConstraintSolverConfig) -> Self {
        Self {
            config,
            previous_dt: None,
        }
    }

    /// Create a solver with default configuration.
    #[must_use]
    pub fn default_solver() -> Self {
        Self::new(ConstraintSolverConfig::default())
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ConstraintSolverConfig {
        &self.config
    }

    /// Timestep of the last completed step.
    #[must_use]
    pub fn previous_dt(&self) -> Option<f64> {
        self.previous_dt
    }

    /// Forget the previous timestep; the next step uses a `dt_ratio` of 1.
    pub fn reset(&mut self) {
        self.previous_dt = None;
    }

    /// Advance `bodies` by `dt` while enforcing `joints`.
    ///
    /// Every joint must reference two distinct bodies present in `bodies`;
    /// this is checked before anything is mutated. An error from joint
    /// initialization (a degenerate effective mass) aborts the step with the
    /// bodies partially advanced.
    ///
    /// # Example
    ///
    /// ```
    /// use sim_constraint::{BodySet, ConstraintSolver, PulleyJoint, PulleyJointDef};
    /// use sim_types::{BodyId, MassProperties, Pose, RigidBody};
    /// use nalgebra::Point2;
    ///
    /// let a = RigidBody::dynamic(
    ///     BodyId::new(1),
    ///     Pose::from_position(Point2::new(-2.0, 7.0)),
    ///     MassProperties::point_mass(1.0),
    /// )?;
    /// let b = RigidBody::dynamic(
    ///     BodyId::new(2),
    ///     Pose::from_position(Point2::new(2.0, 7.0)),
    ///     MassProperties::point_mass(1.0),
    /// )?;
    /// let def = PulleyJointDef::initialize(
    ///     &a,
    ///     &b,
    ///     Point2::new(-2.0, 10.0),
    ///     Point2::new(2.0, 10.0),
    ///     a.world_center(),
    ///     b.world_center(),
    ///     1.0,
    /// )?;
    ///
    /// let mut joints = vec![PulleyJoint::new(&def)?];
    /// let mut bodies: BodySet = [a, b].into_iter().collect();
    ///
    /// let mut solver = ConstraintSolver::default_solver();
    /// let result = solver.step(&mut joints, &mut bodies, 1.0 / 60.0)?;
    /// assert!(result.converged);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn step<J: Joint>(
        &mut self,
        joints: &mut [J],
        bodies: &mut BodySet,
        dt: f64,
    ) -> Result<SolverResult> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::InvalidTimestep(dt).into());
        }
        self.config.validate()?;

        for joint in joints.iter() {
            for id in [joint.body_a(), joint.body_b()] {
                if !bodies.contains(id) {
                    warn!(body = %id, joint = ?joint.joint_type(), "joint references missing body");
                    return Err(ConstraintError::BodyNotFound(id));
                }
            }
        }

        for body in bodies.iter_mut() {
            body.integrate_velocity(&self.config.gravity, dt);
        }

        let ctx = StepContext::new(dt, self.previous_dt, self.config.warm_starting)
            .with_tolerances(self.config.tolerances);

        for joint in joints.iter_mut() {
            let (a, b) = bodies.pair_mut(joint.body_a(), joint.body_b())?;
            joint.init_velocity_constraints(a, b, &ctx)?;
        }

        for _ in 0..self.config.velocity_iterations {
            for joint in joints.iter_mut() {
                let (a, b) = bodies.pair_mut(joint.body_a(), joint.body_b())?;
                joint.solve_velocity_constraints(a, b, &ctx);
            }
        }

        for body in bodies.iter_mut() {
            body.integrate_position(dt);
        }

        let mut position_iterations = 0;
        let mut converged = false;
        while position_iterations < self.config.position_iterations {
            position_iterations += 1;

            let mut all_ok = true;
            for joint in joints.iter_mut() {
                let (a, b) = bodies.pair_mut(joint.body_a(), joint.body_b())?;
                let ok = joint.solve_position_constraints(a, b, &ctx);
                all_ok = all_ok && ok;
            }

            if all_ok {
                converged = true;
                break;
            }
        }

        if let Some(body) = bodies.iter().find(|b| !b.is_finite()) {
            warn!(body = %body.id(), "non-finite body state after constraint step");
            return Err(SimError::diverged(format!("{} has a non-finite state", body.id())).into());
        }

        self.previous_dt = Some(dt);

        debug!(
            joints = joints.len(),
            bodies = bodies.len(),
            position_iterations,
            converged,
            "constraint step"
        );

        Ok(SolverResult {
            velocity_iterations: self.config.velocity_iterations,
            position_iterations,
            converged,
        })
    }
}

/// Result of one solver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverResult {
    /// Velocity iterations run.
    pub velocity_iterations: usize,
    /// Position iterations run before convergence or the budget ran out.
    pub position_iterations: usize,
    /// Whether every joint reported positional convergence.
    pub converged: bool,
}
