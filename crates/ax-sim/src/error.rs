//! Error types for coupled simulation runs.

use ax_aero::AeroError;
use ax_core::{AxError, FailureKind};
use ax_coupling::CouplingError;
use ax_structure::StructureError;
use thiserror::Error;

/// Last step the driver accepted before a failure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AcceptedStep {
    pub step: usize,
    pub time: f64,
}

/// Errors encountered during a coupled run.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Coupling iteration did not converge after {iterations} iterations (displacement change {displacement:e}, load change {force:e})")]
    Diverged {
        iterations: usize,
        displacement: f64,
        force: f64,
    },

    #[error("Invalid settings: {message}")]
    Settings { message: String },

    #[error("Step {step} at t = {time} s failed: {source}")]
    Fatal {
        /// `None` when the very first step failed
        last_accepted: Option<AcceptedStep>,
        step: usize,
        time: f64,
        source: Box<SimError>,
    },

    #[error("Step budget of {max_steps} steps spent at t = {time} s, before t_end = {t_end} s")]
    StepBudget {
        max_steps: usize,
        time: f64,
        t_end: f64,
        last_accepted: Option<AcceptedStep>,
    },

    #[error("Structure: {0}")]
    Structure(#[from] StructureError),

    #[error("Aerodynamics: {0}")]
    Aero(#[from] AeroError),

    #[error("Coupling: {0}")]
    Coupling(#[from] CouplingError),

    #[error(transparent)]
    Core(#[from] AxError),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// Classify this error within the simulation failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            SimError::InvalidArg { .. }
            | SimError::Settings { .. }
            | SimError::StepBudget { .. } => FailureKind::Setup,
            SimError::Diverged { .. } => FailureKind::NonConvergence,
            SimError::Fatal { source, .. } => source.kind(),
            SimError::Structure(e) => e.kind(),
            SimError::Aero(e) => e.kind(),
            SimError::Coupling(e) => e.kind(),
            SimError::Core(e) => e.kind(),
        }
    }

    /// Last accepted step of a run that stopped early.
    pub fn last_accepted(&self) -> Option<AcceptedStep> {
        match self {
            SimError::Fatal { last_accepted, .. } | SimError::StepBudget { last_accepted, .. } => {
                *last_accepted
            }
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for SimError {
    fn from(e: serde_yaml::Error) -> Self {
        SimError::Settings {
            message: e.to_string(),
        }
    }
}
