//! Structural solver configuration.

use ax_core::{AxError, AxResult, ensure_positive};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::newton::NewtonConfig;

/// Whether inertia participates in the structural equations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralDynamics {
    /// Quasi-static equilibrium at every step.
    Static,
    /// Newmark time integration.
    #[default]
    Dynamic,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralConfig {
    pub dynamics: StructuralDynamics,
    /// Newmark numerical damping α: β = ¼(1+α)², γ = ½+α
    pub newmark_damping: f64,
    /// Gravitational acceleration (m/s², global frame)
    pub gravity: [f64; 3],
    /// Stiffness multiplier applied to elements of rigid bodies
    pub rigid_stiffness_factor: f64,
    /// Maximum joint constraint residual accepted after a solve
    pub constraint_tol: f64,
    /// Relative step for finite-difference tangents
    pub fd_step: f64,
    pub newton: NewtonConfig,
}

impl Default for StructuralConfig {
    fn default() -> Self {
        Self {
            dynamics: StructuralDynamics::Dynamic,
            newmark_damping: 1e-4,
            gravity: [0.0; 3],
            rigid_stiffness_factor: 1e3,
            constraint_tol: 1e-6,
            fd_step: 1e-6,
            newton: NewtonConfig::default(),
        }
    }
}

impl StructuralConfig {
    pub fn gravity_vector(&self) -> Vector3<f64> {
        Vector3::from(self.gravity)
    }

    pub fn validate(&self) -> AxResult<()> {
        if !(0.0..=0.5).contains(&self.newmark_damping) {
            return Err(AxError::InvalidArg {
                what: "newmark_damping must lie in [0, 0.5]",
            });
        }
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(AxError::InvalidArg {
                what: "gravity must be finite",
            });
        }
        ensure_positive(self.rigid_stiffness_factor, "rigid_stiffness_factor")?;
        ensure_positive(self.constraint_tol, "constraint_tol")?;
        ensure_positive(self.fd_step, "fd_step")?;
        self.newton.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(StructuralConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_excessive_damping() {
        let config = StructuralConfig {
            newmark_damping: 0.8,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
