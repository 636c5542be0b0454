//! Run configuration: coupling scheme, time stepping and solver settings.
//!
//! Every struct has documented defaults and accepts partial YAML
//! (`#[serde(default)]`), so a settings file only needs the values it
//! changes.

use ax_aero::AeroConfig;
use ax_core::ensure_positive;
use ax_structure::StructuralConfig;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// How structure and aerodynamics are advanced within a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouplingScheme {
    /// One structural and one aerodynamic solve per step, structure first
    /// with the loads of the previous step.
    Staggered,
    /// Fixed-point iteration to a consistent state.
    #[default]
    Strong,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouplingConfig {
    pub scheme: CouplingScheme,
    /// Iteration budget of the strong scheme
    pub max_iterations: usize,
    /// Iterations performed before convergence may be declared
    pub min_iterations: usize,
    /// Relative tolerance on displacement and load changes between iterations
    pub tolerance: f64,
    /// Absolute floor below which a change counts as converged (m, N)
    pub abs_tolerance: f64,
    /// Load under-relaxation factor ω at the first step
    pub relaxation_factor: f64,
    /// ω reached after `relaxation_steps` steps
    pub final_relaxation_factor: f64,
    /// Steps over which ω ramps linearly (0 keeps `relaxation_factor`)
    pub relaxation_steps: usize,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            scheme: CouplingScheme::Strong,
            max_iterations: 50,
            min_iterations: 1,
            tolerance: 1e-5,
            abs_tolerance: 1e-9,
            relaxation_factor: 0.7,
            final_relaxation_factor: 0.7,
            relaxation_steps: 0,
        }
    }
}

impl CouplingConfig {
    /// Relaxation factor at step `step` (1-based).
    pub fn relaxation_at(&self, step: usize) -> f64 {
        if self.relaxation_steps == 0 {
            return self.relaxation_factor;
        }
        let s = (step.saturating_sub(1) as f64 / self.relaxation_steps as f64).min(1.0);
        self.relaxation_factor + (self.final_relaxation_factor - self.relaxation_factor) * s
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.max_iterations == 0 {
            return Err(SimError::InvalidArg {
                what: "max_iterations must be positive",
            });
        }
        if self.min_iterations > self.max_iterations {
            return Err(SimError::InvalidArg {
                what: "min_iterations cannot exceed max_iterations",
            });
        }
        if !(self.tolerance >= 0.0 && self.abs_tolerance >= 0.0) {
            return Err(SimError::InvalidArg {
                what: "coupling tolerances must be non-negative",
            });
        }
        for omega in [self.relaxation_factor, self.final_relaxation_factor] {
            if !(omega > 0.0 && omega <= 1.0) {
                return Err(SimError::InvalidArg {
                    what: "relaxation factors must lie in (0, 1]",
                });
            }
        }
        Ok(())
    }
}

/// Time stepping and step-size control.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverOptions {
    /// Nominal time step (s)
    pub dt: f64,
    /// Final simulation time (s)
    pub t_end: f64,
    /// Maximum number of accepted steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th accepted step (the last one is always recorded)
    pub record_every: usize,
    /// Smallest step the cutback may reach (s)
    pub min_dt: f64,
    /// Failed attempts allowed per step
    pub max_retries: usize,
    /// Step multiplier on a failed attempt
    pub cutback_factor: f64,
    /// Step multiplier after an accepted step, capped at `dt`
    pub grow_factor: f64,
    /// Relaxation multiplier once the step cannot shrink further
    pub relaxation_cutback: f64,
    /// Smallest relaxation factor the cutback may reach
    pub min_relaxation: f64,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            dt: 1e-2,
            t_end: 1.0,
            max_steps: 100_000,
            record_every: 1,
            min_dt: 1e-5,
            max_retries: 8,
            cutback_factor: 0.5,
            grow_factor: 1.5,
            relaxation_cutback: 0.5,
            min_relaxation: 0.05,
        }
    }
}

impl DriverOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if !(self.t_end >= 0.0 && self.t_end.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "t_end must be non-negative",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        ensure_positive(self.min_dt, "min_dt")?;
        if self.min_dt > self.dt {
            return Err(SimError::InvalidArg {
                what: "min_dt cannot exceed dt",
            });
        }
        for factor in [self.cutback_factor, self.relaxation_cutback] {
            if !(factor > 0.0 && factor < 1.0) {
                return Err(SimError::InvalidArg {
                    what: "cutback factors must lie in (0, 1)",
                });
            }
        }
        if !(self.grow_factor >= 1.0 && self.grow_factor.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "grow_factor must be at least 1",
            });
        }
        ensure_positive(self.min_relaxation, "min_relaxation")?;
        Ok(())
    }
}

/// Everything a coupled run is configured with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub structure: StructuralConfig,
    pub aero: AeroConfig,
    pub coupling: CouplingConfig,
    pub driver: DriverOptions,
}

impl SimulationConfig {
    /// Parse settings from YAML; absent keys keep their defaults.
    pub fn from_yaml(text: &str) -> SimResult<Self> {
        let config: SimulationConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> SimResult<()> {
        self.structure.validate()?;
        self.aero.validate()?;
        self.coupling.validate()?;
        self.driver.validate()
    }
}
