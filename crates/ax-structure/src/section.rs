//! Beam cross-section properties.

use ax_core::{AxResult, ensure_finite, ensure_positive};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Diagonal cross-section stiffness and inertia, in the element frame
/// (x along the beam axis).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeamSection {
    /// Axial stiffness EA (N)
    pub ea: f64,
    /// Shear stiffnesses GA₂, GA₃ (N)
    pub ga: [f64; 2],
    /// Torsional stiffness GJ (N·m²)
    pub gj: f64,
    /// Bending stiffnesses EI₂, EI₃ (N·m²)
    pub ei: [f64; 2],
    /// Mass per unit length (kg/m)
    pub mass_per_length: f64,
    /// Rotary inertia per unit length about element x, y, z (kg·m)
    pub inertia_per_length: [f64; 3],
}

impl BeamSection {
    /// Isotropic section with equal shear and bending stiffness in both
    /// transverse directions.
    pub fn uniform(ea: f64, ga: f64, gj: f64, ei: f64, mass_per_length: f64) -> Self {
        Self {
            ea,
            ga: [ga, ga],
            gj,
            ei: [ei, ei],
            mass_per_length,
            inertia_per_length: [0.0; 3],
        }
    }

    pub fn with_inertia(mut self, inertia_per_length: [f64; 3]) -> Self {
        self.inertia_per_length = inertia_per_length;
        self
    }

    /// Force-strain stiffness `C_γ = diag(EA, GA₂, GA₃)`.
    pub fn force_stiffness(&self) -> Matrix3<f64> {
        Matrix3::from_diagonal(&Vector3::new(self.ea, self.ga[0], self.ga[1]))
    }

    /// Moment-curvature stiffness `C_κ = diag(GJ, EI₂, EI₃)`.
    pub fn moment_stiffness(&self) -> Matrix3<f64> {
        Matrix3::from_diagonal(&Vector3::new(self.gj, self.ei[0], self.ei[1]))
    }

    pub fn validate(&self) -> AxResult<()> {
        ensure_positive(self.ea, "section EA")?;
        ensure_positive(self.ga[0], "section GA2")?;
        ensure_positive(self.ga[1], "section GA3")?;
        ensure_positive(self.gj, "section GJ")?;
        ensure_positive(self.ei[0], "section EI2")?;
        ensure_positive(self.ei[1], "section EI3")?;
        ensure_finite(self.mass_per_length, "section mass per length")?;
        if self.mass_per_length < 0.0 {
            return Err(ax_core::AxError::InvalidArg {
                what: "section mass per length must be non-negative",
            });
        }
        for &j in &self.inertia_per_length {
            if !(j.is_finite() && j >= 0.0) {
                return Err(ax_core::AxError::InvalidArg {
                    what: "section rotary inertia must be finite and non-negative",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stiffness_matrices_are_diagonal() {
        let s = BeamSection::uniform(1e8, 5e7, 2e5, 1e6, 10.0);
        let c = s.moment_stiffness();
        assert_eq!(c[(0, 0)], 2e5);
        assert_eq!(c[(2, 2)], 1e6);
        assert_eq!(c[(0, 1)], 0.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn rejects_nonpositive_stiffness() {
        let s = BeamSection::uniform(0.0, 1.0, 1.0, 1.0, 1.0);
        assert!(s.validate().is_err());
        let s = BeamSection::uniform(1.0, 1.0, 1.0, 1.0, -1.0);
        assert!(s.validate().is_err());
    }
}
