//! Step driver behavior across multiple steps: warm starting, timestep
//! changes, determinism and setup errors.

use approx::assert_relative_eq;
use sim_conformance_tests::{PulleyRig, BODY_A};
use sim_constraint::{ConstraintError, ConstraintSolver, ConstraintSolverConfig};

const DT: f64 = 1.0 / 60.0;
const G: f64 = 9.81;

#[test]
fn test_warm_start_carries_tension() {
    let mut rig = PulleyRig::hanging(3.0, 3.0, 2.0, 1.0, 2.0).unwrap();
    let mut solver = ConstraintSolver::default_solver();

    rig.step(&mut solver, DT).unwrap();
    let first = rig.joint.impulse();
    assert_relative_eq!(first, G * DT, epsilon = 1e-12);

    // The warm-started impulse already balances gravity; iterations add nothing.
    rig.step(&mut solver, DT).unwrap();
    assert_relative_eq!(rig.joint.impulse(), first, epsilon = 1e-12);
}

#[test]
fn test_timestep_change_rescales_impulse() {
    let mut rig = PulleyRig::hanging(3.0, 3.0, 2.0, 1.0, 2.0).unwrap();
    let mut solver = ConstraintSolver::default_solver();

    rig.step(&mut solver, DT).unwrap();
    rig.step(&mut solver, DT / 2.0).unwrap();

    assert_relative_eq!(rig.joint.impulse(), G * DT / 2.0, epsilon = 1e-12);
    let a = rig.body_a().unwrap();
    assert_relative_eq!(a.twist().linear.norm(), 0.0, epsilon = 1e-12);
}

#[test]
fn test_cold_start_still_balances() {
    let mut rig = PulleyRig::hanging(3.0, 3.0, 2.0, 1.0, 2.0).unwrap();
    let config = ConstraintSolverConfig::default().with_warm_starting(false);
    let mut solver = ConstraintSolver::new(config);

    for _ in 0..10 {
        rig.step(&mut solver, DT).unwrap();
    }

    assert_relative_eq!(rig.joint.impulse(), G * DT, epsilon = 1e-12);
    let (la, lb) = rig.lengths().unwrap();
    assert_relative_eq!(la, 3.0, epsilon = 1e-9);
    assert_relative_eq!(lb, 3.0, epsilon = 1e-9);
}

#[test]
fn test_reset_forgets_previous_timestep() {
    let mut rig = PulleyRig::hanging(3.0, 3.0, 1.0, 1.0, 1.0).unwrap();
    let mut solver = ConstraintSolver::default_solver();

    rig.step(&mut solver, DT).unwrap();
    assert_eq!(solver.previous_dt(), Some(DT));

    solver.reset();
    assert_eq!(solver.previous_dt(), None);
}

#[test]
fn test_identical_runs_are_bit_identical() {
    let mut first = PulleyRig::hanging(3.0, 4.0, 1.5, 2.0, 1.0).unwrap();
    let mut second = first.clone();
    let mut solver_1 = ConstraintSolver::default_solver();
    let mut solver_2 = ConstraintSolver::default_solver();

    for i in 0..100 {
        // Vary the timestep to exercise warm-start rescaling.
        let dt = if i % 3 == 0 { DT } else { DT / 2.0 };
        let r1 = first.step(&mut solver_1, dt).unwrap();
        let r2 = second.step(&mut solver_2, dt).unwrap();
        assert_eq!(r1, r2);
    }

    assert_eq!(first.joint, second.joint);
    assert_eq!(first.body_a(), second.body_a());
    assert_eq!(first.body_b(), second.body_b());
}

#[test]
fn test_massless_pair_aborts_step() {
    let mut rig = PulleyRig::hanging(3.0, 3.0, 1.0, 0.0, 0.0).unwrap();
    let mut solver = ConstraintSolver::default_solver();

    let err = rig.step(&mut solver, DT).unwrap_err();
    assert!(matches!(err, ConstraintError::DegenerateMass { .. }));
    assert!(!err.is_config_error());
    assert_eq!(solver.previous_dt(), None);
}

#[test]
fn test_bad_timestep_leaves_bodies_untouched() {
    let mut rig = PulleyRig::hanging(3.0, 3.0, 1.0, 2.0, 1.0).unwrap();
    let mut solver = ConstraintSolver::default_solver();
    let before = rig.bodies.get(BODY_A).cloned();

    let err = rig.step(&mut solver, -DT).unwrap_err();
    assert!(err.is_config_error());
    assert_eq!(rig.bodies.get(BODY_A).cloned(), before);
}
