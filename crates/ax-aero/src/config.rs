//! Aerodynamic solver settings.

use ax_core::{AxError, AxResult, Density, ensure_positive};
use serde::{Deserialize, Serialize};

/// How the wake moves after it is shed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeModel {
    /// Convected by the inflow plus the velocity induced by all vorticity.
    #[default]
    Free,
    /// Convected by the inflow only.
    Prescribed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AeroConfig {
    /// Air density (kg/m³)
    pub rho: f64,
    /// Vortex core cutoff radius (m); induced velocity vanishes inside it
    pub vortex_radius: f64,
    pub wake: WakeModel,
    /// Oldest wake ring rows beyond this count are dropped (at least 2)
    pub max_wake_rows: usize,
    /// Add the added-mass term `ρ Γ̇ A n` to the panel forces
    pub include_unsteady_force: bool,
    /// Number of initial steps with the added-mass term suppressed
    pub steps_without_unsteady_force: usize,
}

impl Default for AeroConfig {
    fn default() -> Self {
        Self {
            rho: ax_core::constants::RHO_SL_KGPM3,
            vortex_radius: 1e-6,
            wake: WakeModel::Free,
            max_wake_rows: 200,
            include_unsteady_force: true,
            steps_without_unsteady_force: 0,
        }
    }
}

impl AeroConfig {
    pub fn with_density(mut self, rho: Density) -> Self {
        self.rho = rho.value;
        self
    }

    pub fn validate(&self) -> AxResult<()> {
        if !(self.rho.is_finite() && self.rho >= 0.0) {
            return Err(AxError::InvalidArg {
                what: "air density must be finite and non-negative",
            });
        }
        ensure_positive(self.vortex_radius, "vortex_radius")?;
        if self.max_wake_rows < 2 {
            return Err(AxError::InvalidArg {
                what: "max_wake_rows must be at least 2",
            });
        }
        Ok(())
    }
}
