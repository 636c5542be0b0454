//! Driver behaviour without aerodynamics and on unrecoverable steps.

use ax_core::FailureKind;
use ax_sim::{
    AcceptedStep, CantileverCase, CouplingScheme, DriverOptions, SimError, SimProgress,
    SimulationConfig, WingCase, run, run_with_progress,
};
use ax_structure::StructuralDynamics;

fn static_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.structure.dynamics = StructuralDynamics::Static;
    config.driver = DriverOptions {
        dt: 1.0,
        t_end: 1.0,
        ..Default::default()
    };
    config
}

#[test]
fn cantilever_tip_load_matches_beam_theory() {
    let case = CantileverCase::default();
    let model = case.build().unwrap();
    let record = run(&model, &static_config()).unwrap();

    assert_eq!(record.accepted_steps, 1);
    assert_eq!(record.steps.len(), 1);
    let last = record.last().unwrap();
    assert_eq!(last.diagnostics.iterations, 1);
    assert!(last.aero.is_none());

    let ei = case.section.ei[0];
    let expected = case.tip_load * case.length.powi(3) / (3.0 * ei);
    let tip = last.structure.node(case.tip()).unwrap().position.z;
    assert!(
        (tip - expected).abs() < 0.01 * expected,
        "tip deflection {tip} vs {expected}"
    );
}

#[test]
fn records_are_decimated_and_progress_is_reported() {
    let model = CantileverCase::default().build().unwrap();
    let mut config = SimulationConfig::default();
    config.driver = DriverOptions {
        dt: 0.01,
        t_end: 0.05,
        record_every: 2,
        ..Default::default()
    };

    let mut seen: Vec<SimProgress> = Vec::new();
    let mut callback = |p: SimProgress| seen.push(p);
    let record = run_with_progress(&model, &config, Some(&mut callback)).unwrap();

    assert_eq!(record.accepted_steps, 5);
    let steps: Vec<usize> = record.steps.iter().map(|r| r.step).collect();
    assert_eq!(steps, vec![2, 4, 5]);
    assert_eq!(record.cutback_retries, 0);

    assert_eq!(seen.len(), 5);
    assert!(seen.windows(2).all(|w| w[1].sim_time > w[0].sim_time));
    assert!((seen[4].fraction_complete - 1.0).abs() < 1e-9);
    // Loaded beam starts moving towards +z
    let tip = CantileverCase::default().tip();
    assert!(record.steps[0].structure.node(tip).unwrap().position.z > 0.0);
}

#[test]
fn structural_failure_is_retried_then_fatal() {
    let case = CantileverCase {
        tip_load: 1e4,
        ..Default::default()
    };
    let model = case.build().unwrap();
    let mut config = static_config();
    config.driver.dt = 0.1;
    config.driver.t_end = 0.1;
    config.driver.min_dt = 0.02;
    // One Newton iteration cannot reach a large-deflection equilibrium
    config.structure.newton.max_iterations = 1;

    let err = run(&model, &config).unwrap_err();
    assert_eq!(err.kind(), FailureKind::NonConvergence);
    assert_eq!(err.last_accepted(), None);
    match err {
        SimError::Fatal {
            step, time, source, ..
        } => {
            assert_eq!(step, 1);
            // Cut twice (0.05, 0.025) before relaxation took over
            assert!((time - 0.025).abs() < 1e-15);
            assert!(matches!(*source, SimError::Structure(_)));
        }
        other => panic!("expected a fatal error, got {other:?}"),
    }
}

#[test]
fn coupling_that_never_converges_is_fatal() {
    let model = WingCase::default().build().unwrap();
    let mut config = SimulationConfig::default();
    config.coupling.scheme = CouplingScheme::Strong;
    config.coupling.max_iterations = 2;
    config.coupling.tolerance = 0.0;
    config.coupling.abs_tolerance = 0.0;
    config.driver = DriverOptions {
        dt: 0.02,
        t_end: 0.1,
        min_dt: 0.005,
        ..Default::default()
    };

    let err = run(&model, &config).unwrap_err();
    assert_eq!(err.kind(), FailureKind::NonConvergence);
    match err {
        SimError::Fatal {
            last_accepted: None,
            step: 1,
            source,
            ..
        } => assert!(matches!(*source, SimError::Diverged { iterations: 2, .. })),
        other => panic!("expected a fatal divergence, got {other:?}"),
    }
}

#[test]
fn running_out_of_steps_before_the_end_time_is_an_error() {
    let model = CantileverCase::default().build().unwrap();
    let mut config = SimulationConfig::default();
    config.driver = DriverOptions {
        dt: 0.01,
        t_end: 1.0,
        max_steps: 3,
        ..Default::default()
    };

    let err = run(&model, &config).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Setup);
    match err {
        SimError::StepBudget {
            max_steps,
            time,
            t_end,
            last_accepted: Some(last),
        } => {
            assert_eq!(max_steps, 3);
            assert_eq!(last.step, 3);
            assert!((last.time - 0.03).abs() < 1e-12);
            assert_eq!(time, last.time);
            assert_eq!(t_end, 1.0);
        }
        other => panic!("expected the step budget error, got {other:?}"),
    }
}

#[test]
fn invalid_options_are_rejected_before_running() {
    let model = CantileverCase::default().build().unwrap();
    let mut config = SimulationConfig::default();
    config.driver.record_every = 0;
    assert!(matches!(
        run(&model, &config),
        Err(SimError::InvalidArg { .. })
    ));
}

#[test]
fn fatal_error_reports_last_accepted_step() {
    let err = SimError::Fatal {
        last_accepted: Some(AcceptedStep { step: 2, time: 0.2 }),
        step: 3,
        time: 0.3,
        source: Box::new(SimError::InvalidArg { what: "x" }),
    };
    assert_eq!(err.last_accepted().map(|a| a.step), Some(2));
    assert_eq!(err.kind(), FailureKind::Setup);
}
