//! Pulley scenarios with known analytical outcomes.
//!
//! All rigs hang point masses straight below their ground anchors, so every
//! expected value follows from one-dimensional Atwood-machine arithmetic.

use approx::assert_relative_eq;
use sim_conformance_tests::PulleyRig;
use sim_constraint::{ConstraintSolver, Joint, LimitState};
use sim_types::{StepContext, LINEAR_SLOP};

const DT: f64 = 1.0 / 60.0;
const G: f64 = 9.81;

// ============================================================================
// Stepped through the solver
// ============================================================================

/// A 2:1 pulley with a 1 kg and a 2 kg body is in equilibrium: tension on A
/// equals `m_a g`, and B feels twice that.
#[test]
fn test_balanced_ratio_stays_at_rest() {
    let mut rig = PulleyRig::hanging(3.0, 3.0, 2.0, 1.0, 2.0).unwrap();
    let mut solver = ConstraintSolver::default_solver();

    for _ in 0..120 {
        let result = rig.step(&mut solver, DT).unwrap();
        assert!(result.converged);
    }

    let (la, lb) = rig.lengths().unwrap();
    assert_relative_eq!(la, 3.0, epsilon = 1e-9);
    assert_relative_eq!(lb, 3.0, epsilon = 1e-9);
    assert_relative_eq!(rig.body_a().unwrap().twist().linear.norm(), 0.0, epsilon = 1e-9);
    assert_relative_eq!(rig.body_b().unwrap().twist().linear.norm(), 0.0, epsilon = 1e-9);

    // Rope tension along side B's axis, which points down.
    let force = rig.joint.reaction_force(1.0 / DT);
    assert_relative_eq!(force.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(force.y, -G, epsilon = 1e-6);
    assert_eq!(rig.joint.reaction_torque(1.0 / DT), 0.0);
}

/// Atwood machine with masses 2 and 1 over a 1:1 pulley: acceleration g/3.
#[test]
fn test_heavier_side_descends() {
    let mut rig = PulleyRig::hanging(3.0, 3.0, 1.0, 2.0, 1.0).unwrap();
    let mut solver = ConstraintSolver::default_solver();

    // Half a second: A stays well short of its 4 m limit.
    for _ in 0..30 {
        rig.step(&mut solver, DT).unwrap();
    }

    let a = rig.body_a().unwrap();
    let b = rig.body_b().unwrap();
    assert_relative_eq!(a.twist().linear.y, -0.5 * G / 3.0, epsilon = 1e-9);
    assert_relative_eq!(b.twist().linear.y, 0.5 * G / 3.0, epsilon = 1e-9);

    // The rope neither stretches nor goes slack.
    let (la, lb) = rig.lengths().unwrap();
    assert!(la > 3.0);
    assert_relative_eq!(la - 3.0, 3.0 - lb, epsilon = 1e-9);
    assert!(rig.slack().unwrap().abs() < LINEAR_SLOP);
}

/// With a 2:1 ratio, B moves half as far as A at the same tension balance.
#[test]
fn test_ratio_scales_motion() {
    let mut rig = PulleyRig::hanging(3.0, 3.0, 2.0, 3.0, 1.0).unwrap();
    let mut solver = ConstraintSolver::default_solver();

    for _ in 0..30 {
        rig.step(&mut solver, DT).unwrap();
    }

    let (la, lb) = rig.lengths().unwrap();
    assert!(la > 3.0, "A should descend, length {la}");
    assert_relative_eq!(la - 3.0, 2.0 * (3.0 - lb), epsilon = 1e-9);
}

/// A side that reaches its maximum length stops there even though the rope
/// budget would let it go further.
#[test]
fn test_side_limit_stops_descent() {
    let mut def = PulleyRig::definition(3.0, 3.0, 1.0, 3.0, 1.0).unwrap();
    def.max_length_a = 3.5;
    let mut rig = PulleyRig::from_definition(&def, 3.0, 3.0, 3.0, 1.0).unwrap();
    assert_relative_eq!(rig.joint.max_length_a(), 3.5);

    let mut solver = ConstraintSolver::default_solver();
    for _ in 0..240 {
        rig.step(&mut solver, DT).unwrap();
    }

    let (la, _) = rig.lengths().unwrap();
    assert!(la > 3.4, "A stopped early at {la}");
    assert!(la < 3.5 + LINEAR_SLOP + 0.01, "A overshot to {la}");
}

/// Without gravity nothing pulls on the rope.
#[test]
fn test_zero_gravity_is_inert() {
    let mut rig = PulleyRig::hanging(3.0, 3.0, 1.0, 1.0, 1.0).unwrap();
    let config = sim_types::SimulationConfig::default().zero_gravity();
    let mut solver = ConstraintSolver::new((&config).into());

    let before = rig.clone();
    for _ in 0..10 {
        rig.step(&mut solver, DT).unwrap();
    }

    assert_eq!(rig.body_a(), before.body_a());
    assert_eq!(rig.body_b(), before.body_b());
    assert_eq!(rig.joint.impulse(), 0.0);
}

// ============================================================================
// Driving the lifecycle directly
// ============================================================================

/// Ratio 2 with lengths 3 and 2: the rope budget is 7. Pulling A out to 5
/// over-extends the rope by 2 and also pushes A past its own limit of 3.
#[test]
fn test_overextended_rope_is_pulled_back() {
    let mut rig = PulleyRig::hanging(3.0, 2.0, 2.0, 1.0, 1.0).unwrap();
    assert_relative_eq!(rig.joint.total_length(), 7.0);
    assert_relative_eq!(rig.joint.max_length_a(), 3.0);
    assert_relative_eq!(rig.joint.max_length_b(), 2.5);

    rig.lower_a(2.0);
    assert_relative_eq!(rig.slack().unwrap(), -2.0, epsilon = 1e-12);

    let step = StepContext::new(DT, None, true);
    let (a, b) = rig
        .bodies
        .pair_mut(rig.joint.body_a(), rig.joint.body_b())
        .unwrap();
    rig.joint.init_velocity_constraints(a, b, &step).unwrap();
    assert_eq!(rig.joint.state(), LimitState::AtUpper);
    assert_eq!(rig.joint.limit_state_a(), LimitState::AtUpper);
    assert_eq!(rig.joint.limit_state_b(), LimitState::Inactive);

    let b_start = b.world_center();
    for _ in 0..30 {
        rig.joint.solve_position_constraints(a, b, &step);
    }
    // B was hauled up toward its ground anchor.
    assert!(b.world_center().y > b_start.y);

    let (la, _) = rig.lengths().unwrap();
    assert!(rig.slack().unwrap() >= -LINEAR_SLOP - 1e-9);
    assert!(la <= rig.joint.max_length_a() + LINEAR_SLOP + 1e-9);
}

/// The first position iteration on the main constraint moves B exactly
/// `ratio` times as far as A.
#[test]
fn test_position_correction_split_follows_ratio() {
    let mut rig = PulleyRig::hanging(3.0, 4.0, 2.0, 1.0, 1.0).unwrap();
    rig.lower_a(1.0);

    let step = StepContext::new(DT, None, true);
    let (a, b) = rig
        .bodies
        .pair_mut(rig.joint.body_a(), rig.joint.body_b())
        .unwrap();
    rig.joint.init_velocity_constraints(a, b, &step).unwrap();
    assert_eq!(rig.joint.limit_state_a(), LimitState::Inactive);

    let (ya, yb) = (a.world_center().y, b.world_center().y);
    rig.joint.solve_position_constraints(a, b, &step);
    let da = a.world_center().y - ya;
    let db = b.world_center().y - yb;

    assert_relative_eq!(db, 2.0 * da, epsilon = 1e-12);
}

/// The convergence flag compares the worst violation against the slop.
#[test]
fn test_convergence_flag_tracks_linear_error() {
    let step = StepContext::new(DT, None, true);

    for (overshoot, expected) in [(0.5 * LINEAR_SLOP, true), (2.0 * LINEAR_SLOP, false)] {
        let mut rig = PulleyRig::hanging(3.0, 4.0, 2.0, 1.0, 1.0).unwrap();
        rig.lower_a(overshoot);

        let (a, b) = rig
            .bodies
            .pair_mut(rig.joint.body_a(), rig.joint.body_b())
            .unwrap();
        rig.joint.init_velocity_constraints(a, b, &step).unwrap();
        assert_eq!(rig.joint.state(), LimitState::AtUpper);

        assert_eq!(rig.joint.solve_position_constraints(a, b, &step), expected);
    }
}
