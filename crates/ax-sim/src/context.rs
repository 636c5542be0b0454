//! Per-step working record handed from the driver to the controller.

use ax_aero::VelocityField;
use ax_structure::StructuralInputs;

/// Changes between the last two coupling iterates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResidualNorms {
    /// Norm of the nodal position change (m)
    pub displacement: f64,
    /// Norm of the nodal load change (N, N·m)
    pub force: f64,
}

/// Disturbances and iteration bookkeeping of the step being attempted.
///
/// Created when the step starts and dropped when it is accepted or retried.
#[derive(Debug)]
pub struct StepContext<'a> {
    /// Index of the step being attempted (the first step is 1)
    pub step: usize,
    /// End-of-step time (s)
    pub time: f64,
    pub dt: f64,
    /// Load relaxation factor for this attempt
    pub relaxation: f64,
    /// Coupling iterations performed so far
    pub iteration: usize,
    pub residuals: ResidualNorms,
    /// Inflow seen by the aerodynamic surfaces
    pub inflow: Option<&'a dyn VelocityField>,
    /// Control surface deflections at `time` (rad)
    pub control_deflections: Vec<f64>,
    /// Prescribed node poses and joint angles at `time`
    pub structural_inputs: StructuralInputs,
}
