//! Time marching with step-size control.

use ax_core::timing::solver_timing;

use crate::config::SimulationConfig;
use crate::context::{ResidualNorms, StepContext};
use crate::controller::{CoupledState, StepOutcome, advance};
use crate::error::{AcceptedStep, SimError, SimResult};
use crate::model::AeroelasticModel;
use crate::record::{SimRecord, StepDiagnostics, StepRecord};
use crate::retry::{Adjustment, RetryPolicy};

/// Progress snapshot passed to the callback after every accepted step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimProgress {
    pub step: usize,
    pub sim_time: f64,
    pub t_end: f64,
    pub fraction_complete: f64,
    pub cutback_retries: usize,
}

/// Run the coupled simulation from the undeformed state at rest.
pub fn run(model: &AeroelasticModel, config: &SimulationConfig) -> SimResult<SimRecord> {
    run_with_progress(model, config, None)
}

/// Run the coupled simulation, reporting progress after each accepted step.
pub fn run_with_progress(
    model: &AeroelasticModel,
    config: &SimulationConfig,
    mut progress: Option<&mut dyn FnMut(SimProgress)>,
) -> SimResult<SimRecord> {
    config.validate()?;
    solver_timing::reset_all();
    let opts = &config.driver;
    let policy = RetryPolicy::new(opts);
    let inflow = model.aero.as_ref().map(|a| &*a.inflow);
    let end_tol = 1e-12 * opts.t_end.max(1.0);

    let mut state = CoupledState::initial(model);
    let mut record = SimRecord::default();
    let mut last_accepted: Option<AcceptedStep> = None;
    let mut last_diagnostics = StepDiagnostics::default();
    let mut time = 0.0;
    let mut dt = opts.dt;
    let mut last_dt = 0.0;
    let mut step = 0;

    tracing::info!(
        t_end = opts.t_end,
        dt = opts.dt,
        scheme = ?config.coupling.scheme,
        surfaces = model.aero.as_ref().map_or(0, |a| a.initial.surfaces.len()),
        "starting coupled run"
    );
    if let Some(horizon) = model.input_horizon().filter(|&h| h < opts.t_end) {
        tracing::warn!(horizon, t_end = opts.t_end, "disturbance inputs end before the run does");
    }

    while opts.t_end - time > end_tol && step < opts.max_steps {
        let index = step + 1;
        let mut attempt_dt = dt.min(opts.t_end - time);
        let mut relaxation = config.coupling.relaxation_at(index);
        let mut failures = 0;

        let (converged, step_time) = loop {
            let step_time = time + attempt_dt;
            let fatal = |source: SimError| SimError::Fatal {
                last_accepted,
                step: index,
                time: step_time,
                source: Box::new(source),
            };

            let (structural_inputs, control_deflections) =
                model.sample_inputs(time, step_time).map_err(|e| {
                    tracing::error!(step = index, time = step_time, error = %e, "disturbance input unavailable");
                    fatal(e)
                })?;
            let mut ctx = StepContext {
                step: index,
                time: step_time,
                dt: attempt_dt,
                relaxation,
                iteration: 0,
                residuals: ResidualNorms::default(),
                inflow,
                control_deflections,
                structural_inputs,
            };

            match advance(model, config, &mut ctx, &state) {
                Ok(StepOutcome::Converged(c)) => break (c, step_time),
                Ok(StepOutcome::Diverged(cause)) => {
                    failures += 1;
                    record.cutback_retries += 1;
                    match policy.on_failure(attempt_dt, relaxation, failures) {
                        Some(Adjustment::StepSize(smaller)) => {
                            tracing::warn!(step = index, dt = smaller, error = %cause, "cutting step size");
                            attempt_dt = smaller;
                        }
                        Some(Adjustment::Relaxation(weaker)) => {
                            tracing::warn!(step = index, relaxation = weaker, error = %cause, "reducing load relaxation");
                            relaxation = weaker;
                        }
                        None => {
                            tracing::error!(step = index, time = step_time, failures, error = %cause, "step cannot be recovered");
                            return Err(fatal(cause));
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(step = index, time = step_time, error = %e, "fatal failure");
                    return Err(fatal(e));
                }
            }
        };

        let net_before = state.aero.as_ref().map(|a| a.circulation_balance().net());
        step = index;
        time = step_time;
        last_dt = attempt_dt;
        state = converged.state;
        last_accepted = Some(AcceptedStep { step, time });
        let circulation = state.aero.as_ref().map(|a| a.circulation_balance());
        last_diagnostics = StepDiagnostics {
            iterations: converged.iterations,
            residuals: converged.residuals,
            newton_iterations: converged.newton_iterations,
            retries: failures,
            relaxation,
            circulation,
            kelvin_defect: circulation
                .zip(net_before)
                .map(|(balance, before)| balance.net() - before),
        };
        tracing::info!(
            step,
            time,
            dt = attempt_dt,
            iterations = converged.iterations,
            retries = failures,
            "step accepted"
        );

        if step % opts.record_every == 0 {
            record.steps.push(snapshot(step, time, attempt_dt, &state, last_diagnostics));
        }
        if let Some(cb) = progress.as_mut() {
            cb(SimProgress {
                step,
                sim_time: time,
                t_end: opts.t_end,
                fraction_complete: if opts.t_end > 0.0 { (time / opts.t_end).min(1.0) } else { 1.0 },
                cutback_retries: record.cutback_retries,
            });
        }
        dt = policy.after_success(attempt_dt);
    }

    if opts.t_end - time > end_tol {
        tracing::error!(
            max_steps = opts.max_steps,
            time,
            t_end = opts.t_end,
            "step budget exhausted before the end time"
        );
        return Err(SimError::StepBudget {
            max_steps: opts.max_steps,
            time,
            t_end: opts.t_end,
            last_accepted,
        });
    }

    // Always record the final accepted step
    if step > 0 && step % opts.record_every != 0 {
        record.steps.push(snapshot(step, time, last_dt, &state, last_diagnostics));
    }
    record.accepted_steps = step;

    tracing::info!(
        steps = step,
        time,
        retries = record.cutback_retries,
        "coupled run finished"
    );
    solver_timing::log_summary();
    Ok(record)
}

fn snapshot(
    step: usize,
    time: f64,
    dt: f64,
    state: &CoupledState,
    diagnostics: StepDiagnostics,
) -> StepRecord {
    StepRecord {
        step,
        time,
        dt,
        structure: state.structure.clone(),
        aero: state.aero.clone(),
        diagnostics,
    }
}
