//! The coupled system: a structural model with optional lifting surfaces.

use ax_aero::{AerodynamicState, Lattice, VelocityField};
use ax_core::AxError;
use ax_coupling::{ControlSystem, CouplingMap, SurfaceBinding};
use ax_structure::{NodalLoads, StructuralInputs, StructuralModel};

use crate::error::{SimError, SimResult};

/// Lifting surfaces attached to the structure.
#[derive(Debug)]
pub struct AeroAttachment {
    /// Aerodynamic state at the start of the run
    pub initial: AerodynamicState,
    pub map: CouplingMap,
    pub controls: ControlSystem,
    pub inflow: Box<dyn VelocityField>,
}

/// Structure, surfaces and disturbances of one coupled run.
#[derive(Debug)]
pub struct AeroelasticModel {
    pub structure: StructuralModel,
    pub aero: Option<AeroAttachment>,
    /// Constant nodal loads added to the aerodynamic loads
    pub applied: NodalLoads,
}

impl AeroelasticModel {
    /// Structure alone; every step is a single structural solve.
    pub fn structural(structure: StructuralModel) -> Self {
        let applied = NodalLoads::zeros(structure.topology().nodes().len());
        Self {
            structure,
            aero: None,
            applied,
        }
    }

    /// Attach lattices to the structure through `bindings`.
    pub fn with_surfaces(
        structure: StructuralModel,
        lattices: Vec<(String, Lattice)>,
        bindings: &[SurfaceBinding],
        inflow: Box<dyn VelocityField>,
    ) -> SimResult<Self> {
        let initial = AerodynamicState::new(lattices)?;
        let map = CouplingMap::build(structure.topology(), &initial, bindings)?;
        let mut model = Self::structural(structure);
        model.aero = Some(AeroAttachment {
            initial,
            map,
            controls: ControlSystem::new(),
            inflow,
        });
        Ok(model)
    }

    /// Add control surfaces; they must lie on attached lattices.
    pub fn with_controls(mut self, controls: ControlSystem) -> SimResult<Self> {
        let Some(aero) = self.aero.as_mut() else {
            return Err(SimError::InvalidArg {
                what: "control surfaces need lifting surfaces",
            });
        };
        controls.validate(&aero.map)?;
        aero.controls = controls;
        Ok(self)
    }

    /// Apply a constant load on top of the aerodynamic loads.
    pub fn with_applied_loads(mut self, applied: NodalLoads) -> SimResult<Self> {
        if applied.len() != self.structure.topology().nodes().len() {
            return Err(SimError::InvalidArg {
                what: "applied loads need one entry per structural node",
            });
        }
        self.applied = applied;
        Ok(self)
    }

    /// Earliest end of any disturbance domain.
    pub fn input_horizon(&self) -> Option<f64> {
        let aero = self.aero.iter().flat_map(|a| {
            [
                a.controls.horizon(),
                a.inflow.domain().map(|(_, end)| end),
            ]
        });
        std::iter::once(self.structure.input_horizon())
            .chain(aero)
            .flatten()
            .reduce(f64::min)
    }

    /// Prescribed poses, joint angles and control deflections at the end of
    /// the step `[start, end]`.
    ///
    /// The wake is convected with the inflow at `start` and the surfaces see
    /// it at `end`, so the inflow domain must cover both.
    pub fn sample_inputs(&self, start: f64, end: f64) -> SimResult<(StructuralInputs, Vec<f64>)> {
        if let Some((from, to)) = self.aero.as_ref().and_then(|a| a.inflow.domain()) {
            for time in [start, end] {
                if !(from..=to).contains(&time) {
                    return Err(AxError::OutOfDomain {
                        what: "inflow",
                        time,
                        start: from,
                        end: to,
                    }
                    .into());
                }
            }
        }
        let structural = self.structure.sample_inputs(end)?;
        let deflections = match &self.aero {
            Some(aero) => aero.controls.sample(end)?,
            None => Vec::new(),
        };
        Ok((structural, deflections))
    }
}
