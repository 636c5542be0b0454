//! Error types for the coupling interpolator.

use ax_aero::AeroError;
use ax_core::{AxError, FailureKind};
use ax_structure::StructureError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CouplingError {
    #[error("Coupling map error: {what}")]
    Mapping { what: String },

    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),

    #[error("Aerodynamic error: {0}")]
    Aero(#[from] AeroError),

    #[error(transparent)]
    Core(#[from] AxError),
}

pub type CouplingResult<T> = Result<T, CouplingError>;

impl CouplingError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CouplingError::Mapping { .. } => FailureKind::Setup,
            CouplingError::Structure(e) => e.kind(),
            CouplingError::Aero(e) => e.kind(),
            CouplingError::Core(e) => e.kind(),
        }
    }
}
