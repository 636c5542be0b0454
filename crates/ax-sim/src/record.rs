//! Per-step output of a run.

use ax_aero::{AerodynamicState, CirculationBalance};
use ax_structure::StructuralState;

use crate::context::ResidualNorms;

/// Convergence and conservation diagnostics of an accepted step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepDiagnostics {
    pub iterations: usize,
    pub residuals: ResidualNorms,
    pub newton_iterations: usize,
    /// Failed attempts before this step was accepted
    pub retries: usize,
    /// Load relaxation factor the step converged with
    pub relaxation: f64,
    pub circulation: Option<CirculationBalance>,
    /// Change over the step of bound circulation net of the released wake
    pub kelvin_defect: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StepRecord {
    pub step: usize,
    /// End-of-step time (s)
    pub time: f64,
    pub dt: f64,
    pub structure: StructuralState,
    pub aero: Option<AerodynamicState>,
    pub diagnostics: StepDiagnostics,
}

/// Time-ordered records of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimRecord {
    pub steps: Vec<StepRecord>,
    /// Accepted steps, recorded or not
    pub accepted_steps: usize,
    /// Failed attempts over the whole run
    pub cutback_retries: usize,
}

impl SimRecord {
    pub fn times(&self) -> Vec<f64> {
        self.steps.iter().map(|r| r.time).collect()
    }

    pub fn last(&self) -> Option<&StepRecord> {
        self.steps.last()
    }

    /// Largest Kelvin defect magnitude over the recorded steps.
    pub fn max_kelvin_defect(&self) -> Option<f64> {
        self.steps
            .iter()
            .filter_map(|r| r.diagnostics.kelvin_defect)
            .map(f64::abs)
            .reduce(f64::max)
    }
}
