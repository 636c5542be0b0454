//! Control surfaces: trailing-edge flaps rotated about a hinge line.

use ax_core::{AxError, AxResult, Schedule, SurfaceId};
use nalgebra::{Rotation3, Vector3};

use crate::error::{CouplingError, CouplingResult};
use crate::map::CouplingMap;

/// Grid rows aft of `hinge_row` in the columns `first_column..=last_column`
/// rotate about the material x axis through the hinge row.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlSurface {
    pub name: String,
    pub surface: SurfaceId,
    pub hinge_row: usize,
    pub first_column: usize,
    pub last_column: usize,
}

/// Control surfaces with their deflection schedules (rad).
#[derive(Debug, Default)]
pub struct ControlSystem {
    surfaces: Vec<ControlSurface>,
    schedules: Vec<Box<dyn Schedule>>,
}

impl ControlSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, surface: ControlSurface, schedule: impl Schedule + 'static) -> Self {
        self.surfaces.push(surface);
        self.schedules.push(Box::new(schedule));
        self
    }

    pub fn surfaces(&self) -> &[ControlSurface] {
        &self.surfaces
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Check every control surface against the lattices it deflects.
    pub fn validate(&self, map: &CouplingMap) -> CouplingResult<()> {
        for cs in &self.surfaces {
            let sm = map.surface(cs.surface).ok_or_else(|| CouplingError::Mapping {
                what: format!("control surface '{}' is on an unknown surface", cs.name),
            })?;
            if cs.hinge_row >= sm.m() || cs.first_column > cs.last_column || cs.last_column > sm.n()
            {
                return Err(CouplingError::Mapping {
                    what: format!("control surface '{}' lies outside its lattice", cs.name),
                });
            }
        }
        Ok(())
    }

    /// Deflection of every control surface at time `t`.
    pub fn sample(&self, t: f64) -> AxResult<Vec<f64>> {
        self.schedules.iter().map(|s| s.value(t)).collect()
    }

    /// Earliest end of the schedule domains.
    pub fn horizon(&self) -> Option<f64> {
        self.schedules
            .iter()
            .filter_map(|s| s.domain())
            .map(|(_, end)| end)
            .reduce(f64::min)
    }

    /// Apply `deflections` to the reference offsets of one surface.
    pub fn deflect(
        &self,
        surface: SurfaceId,
        map: &CouplingMap,
        offsets: &mut [Vector3<f64>],
        deflections: &[f64],
    ) -> AxResult<()> {
        if deflections.len() != self.surfaces.len() {
            return Err(AxError::Invariant {
                what: "one deflection per control surface is required",
            });
        }
        let Some(sm) = map.surface(surface) else {
            return Ok(());
        };
        for (cs, &delta) in self.surfaces.iter().zip(deflections) {
            if cs.surface != surface || delta == 0.0 {
                continue;
            }
            let rot = Rotation3::from_axis_angle(&Vector3::x_axis(), delta);
            for j in cs.first_column..=cs.last_column {
                let hinge = offsets[sm.point_index(cs.hinge_row, j)];
                for i in cs.hinge_row + 1..=sm.m() {
                    let k = sm.point_index(i, j);
                    offsets[k] = hinge + rot * (offsets[k] - hinge);
                }
            }
        }
        Ok(())
    }
}
