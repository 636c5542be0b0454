//! Unsteady vortex-lattice aerodynamics.
//!
//! Lifting surfaces are lattices of vortex rings. Each step the wake behind
//! every surface is convected and a new row of rings is shed at the trailing
//! edge; bound ring strengths follow from the no-penetration condition with
//! an implicit Kutta condition on the newest wake ring.
//!
//! Contains:
//! - lattice (grid points, ring corners, panel geometry)
//! - biot_savart (regularised vortex segment kernel)
//! - wake (index arena of shed rings)
//! - field (freestream and gust velocity fields)
//! - state (per-surface and whole-model aerodynamic state)
//! - solver (step begin, per-iteration solve, forces)

pub mod biot_savart;
pub mod config;
pub mod error;
pub mod field;
pub mod lattice;
pub mod solver;
pub mod state;
pub mod wake;

pub use config::{AeroConfig, WakeModel};
pub use error::{AeroError, AeroResult};
pub use field::{CompositeField, OneMinusCosineGust, SteadyVelocityField, TabulatedGust, VelocityField};
pub use lattice::Lattice;
pub use solver::{SurfaceMotion, begin_step, solve};
pub use state::{AerodynamicState, CirculationBalance, SurfaceState};
pub use wake::WakeArena;
