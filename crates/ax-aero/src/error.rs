//! Error types for the aerodynamic solver.

use ax_core::{AxError, FailureKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AeroError {
    #[error("Singular aerodynamic system: {what}")]
    SingularSystem { what: String },

    #[error("Invalid lattice: {what}")]
    InvalidLattice { what: String },

    #[error(transparent)]
    Core(#[from] AxError),
}

pub type AeroResult<T> = Result<T, AeroError>;

impl AeroError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AeroError::SingularSystem { .. } => FailureKind::SingularSystem,
            AeroError::InvalidLattice { .. } => FailureKind::Setup,
            AeroError::Core(e) => e.kind(),
        }
    }
}
