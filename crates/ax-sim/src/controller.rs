//! Coupling of the structural and aerodynamic solves within one step.
//!
//! The controller is a small state machine:
//!
//! ```text
//! AwaitingStructural → AwaitingAerodynamic → CheckConvergence ─┬→ Converged
//!        ↑                                                      ├→ Diverged
//!        └──────────────── NeedsAnotherIteration ←──────────────┘
//! ```
//!
//! The structure is solved under the current load iterate, the surfaces are
//! placed on the new structural state and solved, and the resulting loads
//! are compared with the iterate. Between iterations the loads are
//! under-relaxed, `L ← L + ω (L_aero − L)`. A staggered step stops after one
//! pass; without surfaces a step is a single structural solve.

use ax_aero::{AerodynamicState, VelocityField, begin_step, solve};
use ax_core::AxError;
use ax_coupling::{geometry_from_structure, loads_from_aero};
use ax_structure::{NodalLoads, StructuralState, step};

use crate::config::{CouplingConfig, CouplingScheme, SimulationConfig};
use crate::context::{ResidualNorms, StepContext};
use crate::error::{SimError, SimResult};
use crate::model::{AeroAttachment, AeroelasticModel};

/// Phase of the coupling iteration within a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CouplingPhase {
    AwaitingStructural,
    AwaitingAerodynamic,
    CheckConvergence,
    Converged,
    NeedsAnotherIteration,
    Diverged,
}

/// Joint state of structure and surfaces at an accepted step.
#[derive(Clone, Debug, PartialEq)]
pub struct CoupledState {
    pub structure: StructuralState,
    pub aero: Option<AerodynamicState>,
    /// Aerodynamic nodal loads consistent with `structure` and `aero`
    pub loads: NodalLoads,
}

impl CoupledState {
    /// Undeformed structure at rest, surfaces without wake.
    pub fn initial(model: &AeroelasticModel) -> Self {
        Self {
            structure: StructuralState::at_rest(&model.structure),
            aero: model.aero.as_ref().map(|a| a.initial.clone()),
            loads: NodalLoads::zeros(model.structure.topology().nodes().len()),
        }
    }
}

/// Successful step with its convergence diagnostics.
#[derive(Clone, Debug)]
pub struct ConvergedStep {
    pub state: CoupledState,
    pub iterations: usize,
    pub residuals: ResidualNorms,
    /// Newton iterations summed over all structural solves of the step
    pub newton_iterations: usize,
}

#[derive(Debug)]
pub enum StepOutcome {
    Converged(ConvergedStep),
    /// The step failed in a way a smaller step or stronger relaxation may cure.
    Diverged(SimError),
}

struct Surfaces<'m, 'f> {
    attachment: &'m AeroAttachment,
    inflow: &'f dyn VelocityField,
    state: AerodynamicState,
}

/// Attempt the step described by `ctx`, starting from `start`.
///
/// Retryable failures come back as `StepOutcome::Diverged`; anything else
/// is returned as an error.
pub fn advance(
    model: &AeroelasticModel,
    config: &SimulationConfig,
    ctx: &mut StepContext<'_>,
    start: &CoupledState,
) -> SimResult<StepOutcome> {
    let span = tracing::debug_span!("coupling_step", step = ctx.step, time = ctx.time, dt = ctx.dt);
    let _enter = span.enter();

    let coupling = &config.coupling;
    let inflow = ctx.inflow;
    let mut surfaces = match (&model.aero, &start.aero, inflow) {
        (None, _, _) => None,
        (Some(attachment), Some(previous), Some(inflow)) => Some(Surfaces {
            attachment,
            inflow,
            state: begin_step(previous, &config.aero, inflow, ctx.dt)?,
        }),
        _ => {
            return Err(AxError::Invariant {
                what: "lifting surfaces need an inflow and an aerodynamic state",
            }
            .into());
        }
    };

    let mut phase = CouplingPhase::AwaitingStructural;
    let mut loads = start.loads.clone();
    let mut new_loads = NodalLoads::zeros(loads.len());
    let mut previous_iterate = start.structure.clone();
    let mut structure = start.structure.clone();
    let mut newton_iterations = 0;
    ctx.iteration = 0;

    loop {
        match phase {
            CouplingPhase::AwaitingStructural => {
                ctx.iteration += 1;
                let mut total = loads.clone();
                total.accumulate(&model.applied);
                match step(
                    &model.structure,
                    &config.structure,
                    &start.structure,
                    &total,
                    &ctx.structural_inputs,
                    ctx.dt,
                ) {
                    Ok(report) => {
                        newton_iterations += report.newton_iterations;
                        structure = report.state;
                    }
                    Err(e) if e.kind().is_retryable() => {
                        tracing::debug!(iteration = ctx.iteration, error = %e, "structural solve failed");
                        return Ok(StepOutcome::Diverged(e.into()));
                    }
                    Err(e) => return Err(e.into()),
                }
                phase = if surfaces.is_some() {
                    CouplingPhase::AwaitingAerodynamic
                } else {
                    CouplingPhase::CheckConvergence
                };
            }
            CouplingPhase::AwaitingAerodynamic => {
                if let Some(s) = surfaces.as_mut() {
                    let controls = &s.attachment.controls;
                    let motions = geometry_from_structure(
                        &s.attachment.map,
                        &structure,
                        controls,
                        &ctx.control_deflections,
                    )?;
                    solve(&mut s.state, &config.aero, s.inflow, &motions)?;
                    new_loads = loads_from_aero(&s.attachment.map, &structure, &s.state)?;
                }
                phase = CouplingPhase::CheckConvergence;
            }
            CouplingPhase::CheckConvergence => {
                ctx.residuals = ResidualNorms {
                    displacement: structure.displacement_distance(&previous_iterate),
                    force: new_loads.distance(&loads),
                };
                let step_motion = structure.displacement_distance(&start.structure);
                let converged = surfaces.is_none()
                    || coupling.scheme == CouplingScheme::Staggered
                    || (ctx.iteration >= coupling.min_iterations
                        && within(ctx.residuals.displacement, step_motion, coupling)
                        && within(ctx.residuals.force, new_loads.norm(), coupling));
                tracing::debug!(
                    iteration = ctx.iteration,
                    displacement = ctx.residuals.displacement,
                    force = ctx.residuals.force,
                    converged,
                    "coupling iteration"
                );
                phase = if converged {
                    CouplingPhase::Converged
                } else if ctx.iteration >= coupling.max_iterations {
                    CouplingPhase::Diverged
                } else {
                    CouplingPhase::NeedsAnotherIteration
                };
            }
            CouplingPhase::NeedsAnotherIteration => {
                loads = new_loads.relaxed(&loads, ctx.relaxation);
                previous_iterate = structure.clone();
                phase = CouplingPhase::AwaitingStructural;
            }
            CouplingPhase::Converged => {
                return Ok(StepOutcome::Converged(ConvergedStep {
                    state: CoupledState {
                        structure,
                        aero: surfaces.map(|s| s.state),
                        loads: new_loads,
                    },
                    iterations: ctx.iteration,
                    residuals: ctx.residuals,
                    newton_iterations,
                }));
            }
            CouplingPhase::Diverged => {
                tracing::debug!(iterations = ctx.iteration, "coupling iteration diverged");
                return Ok(StepOutcome::Diverged(SimError::Diverged {
                    iterations: ctx.iteration,
                    displacement: ctx.residuals.displacement,
                    force: ctx.residuals.force,
                }));
            }
        }
    }
}

/// Change small relative to `scale`, or below the absolute floor.
fn within(change: f64, scale: f64, coupling: &CouplingConfig) -> bool {
    change <= coupling.abs_tolerance || change <= coupling.tolerance * scale
}
