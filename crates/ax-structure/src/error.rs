//! Error types for structural solves.

use ax_core::{AxError, FailureKind, JointId};
use ax_topology::TopologyError;
use thiserror::Error;

/// Errors that can occur while building or advancing the structure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    #[error("Model setup error: {what}")]
    Setup { what: String },

    #[error("Newton iteration did not converge after {iterations} iterations (residual = {residual:e})")]
    NonConvergence { iterations: usize, residual: f64 },

    #[error("Singular structural system: {what}")]
    SingularSystem { what: String },

    #[error("Joint {joint} constraint residual {residual:e} exceeds tolerance")]
    ConstraintViolation { joint: JointId, residual: f64 },

    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Core(#[from] AxError),
}

pub type StructureResult<T> = Result<T, StructureError>;

impl StructureError {
    /// Classify this error within the simulation failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            StructureError::NonConvergence { .. } => FailureKind::NonConvergence,
            StructureError::SingularSystem { .. } => FailureKind::SingularSystem,
            StructureError::ConstraintViolation { .. } => FailureKind::ConstraintViolation,
            StructureError::Core(e) => e.kind(),
            StructureError::Setup { .. } | StructureError::Topology(_) => FailureKind::Setup,
        }
    }
}
