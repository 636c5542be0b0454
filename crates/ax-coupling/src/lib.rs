//! Transfer between the structural beam model and the aerodynamic lattices.
//!
//! - map: which structural node carries each grid point, which element owns each panel
//! - transfer: structure → lattice geometry, grid forces → nodal loads
//! - control: control surface deflections

pub mod control;
pub mod error;
pub mod map;
pub mod transfer;

pub use control::{ControlSurface, ControlSystem};
pub use error::{CouplingError, CouplingResult};
pub use map::{CouplingMap, SurfaceBinding, SurfaceMap};
pub use transfer::{geometry_from_structure, loads_from_aero};
