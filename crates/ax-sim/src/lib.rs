//! Coupled aeroelastic time marching.
//!
//! Provides:
//! - Run configuration (coupling scheme, relaxation, step-size control) with YAML settings
//! - The per-step coupling controller between structure and aerodynamics
//! - A time-marching driver with step cutback and relaxation fallback
//! - Per-step records with convergence and circulation diagnostics
//! - Built-in demonstration cases

pub mod cases;
pub mod config;
pub mod context;
pub mod controller;
pub mod driver;
pub mod error;
pub mod model;
pub mod record;
pub mod retry;

pub use cases::{CantileverCase, GustCase, WingCase};
pub use config::{CouplingConfig, CouplingScheme, DriverOptions, SimulationConfig};
pub use context::{ResidualNorms, StepContext};
pub use controller::{CoupledState, ConvergedStep, CouplingPhase, StepOutcome, advance};
pub use driver::{SimProgress, run, run_with_progress};
pub use error::{AcceptedStep, SimError, SimResult};
pub use model::{AeroAttachment, AeroelasticModel};
pub use record::{SimRecord, StepDiagnostics, StepRecord};
pub use retry::{Adjustment, RetryPolicy};
