//! Newton solver with backtracking line search.

use crate::error::{StructureError, StructureResult};
use ax_core::{AxError, AxResult, ensure_positive};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Newton solver configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm
    pub rel_tol: f64,
    /// Stop once the Newton step satisfies ‖dx‖ ≤ step_tol (1 + ‖x‖); the
    /// residual must still meet `abs_tol` or `rel_tol`
    pub step_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            abs_tol: 1e-6,
            rel_tol: 1e-8,
            step_tol: 1e-10,
            line_search_beta: 0.5,
            max_line_search_iters: 10,
        }
    }
}

impl NewtonConfig {
    pub fn validate(&self) -> AxResult<()> {
        if self.max_iterations == 0 {
            return Err(AxError::InvalidArg {
                what: "newton max_iterations must be at least 1",
            });
        }
        ensure_positive(self.abs_tol, "newton abs_tol")?;
        ensure_positive(self.rel_tol, "newton rel_tol")?;
        ensure_positive(self.step_tol, "newton step_tol")?;
        if !(self.line_search_beta > 0.0 && self.line_search_beta < 1.0) {
            return Err(AxError::InvalidArg {
                what: "line_search_beta must lie in (0, 1)",
            });
        }
        Ok(())
    }
}

fn converged(r_norm: f64, r0_norm: f64, config: &NewtonConfig) -> bool {
    r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm
}

/// Newton iteration result.
#[derive(Debug)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Final residual norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Newton solver with line search.
///
/// Fails with `NonConvergence` when the iteration budget is exhausted or the
/// step becomes negligible above tolerance, and with `SingularSystem` when
/// the Jacobian cannot be factorized.
pub fn newton_solve<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
) -> StructureResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> StructureResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> StructureResult<DMatrix<f64>>,
{
    newton_solve_with_floor(x0, residual_fn, jacobian_fn, config, 0.0)
}

/// [`newton_solve`] for residuals evaluated with round-off of order
/// `noise_floor`: a negligible step is also accepted once the residual is
/// within that floor.
pub fn newton_solve_with_floor<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
    noise_floor: f64,
) -> StructureResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> StructureResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> StructureResult<DMatrix<f64>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;

    for iter in 0..config.max_iterations {
        if !r_norm.is_finite() {
            return Err(AxError::NonFinite {
                what: "structural residual",
                value: r_norm,
            }
            .into());
        }

        if converged(r_norm, r0_norm, config) {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
            });
        }

        // Solve J * dx = -r
        let jac = jacobian_fn(&x)?;
        let dx = jac
            .lu()
            .solve(&(-&r))
            .ok_or_else(|| StructureError::SingularSystem {
                what: format!("tangent factorization failed at iteration {iter}"),
            })?;

        // Negligible Newton step: nothing more to gain, so stop either way
        if dx.norm() <= config.step_tol * (1.0 + x.norm()) {
            let x = x + &dx;
            let residual_norm = residual_fn(&x)?.norm();
            if converged(residual_norm, r0_norm, config) || residual_norm <= noise_floor {
                return Ok(NewtonResult {
                    x,
                    residual_norm,
                    iterations: iter + 1,
                });
            }
            tracing::debug!(
                iteration = iter,
                residual = residual_norm,
                step = dx.norm(),
                "structural newton stalled"
            );
            return Err(StructureError::NonConvergence {
                iterations: iter + 1,
                residual: residual_norm,
            });
        }

        // Backtrack until the residual decreases
        let mut alpha = 1.0;
        let mut x_new = &x + &dx;
        let mut r_new = residual_fn(&x_new)?;
        let mut r_new_norm = r_new.norm();
        for _ in 0..config.max_line_search_iters {
            if r_new_norm.is_finite() && r_new_norm < r_norm {
                break;
            }
            alpha *= config.line_search_beta;
            x_new = &x + alpha * &dx;
            r_new = residual_fn(&x_new)?;
            r_new_norm = r_new.norm();
        }

        tracing::debug!(
            iteration = iter,
            residual = r_new_norm,
            step = alpha * dx.norm(),
            alpha,
            "structural newton"
        );

        x = x_new;
        r = r_new;
        r_norm = r_new_norm;
    }

    if converged(r_norm, r0_norm, config) {
        return Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations: config.max_iterations,
        });
    }

    Err(StructureError::NonConvergence {
        iterations: config.max_iterations,
        residual: r_norm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_quadratic() {
        // Solve x^2 - 4 = 0 from x = 3
        let residual = |x: &DVector<f64>| -> StructureResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0] - 4.0))
        };
        let jacobian = |x: &DVector<f64>| -> StructureResult<DMatrix<f64>> {
            Ok(DMatrix::from_element(1, 1, 2.0 * x[0]))
        };

        let x0 = DVector::from_element(1, 3.0);
        let result = newton_solve(x0, residual, jacobian, &NewtonConfig::default()).unwrap();
        assert!((result.x[0] - 2.0).abs() < 1e-6);
        assert!(result.iterations > 0);
    }

    #[test]
    fn singular_jacobian_is_reported() {
        let residual =
            |_: &DVector<f64>| -> StructureResult<DVector<f64>> { Ok(DVector::from_element(1, 1.0)) };
        let jacobian =
            |_: &DVector<f64>| -> StructureResult<DMatrix<f64>> { Ok(DMatrix::zeros(1, 1)) };
        let err = newton_solve(DVector::zeros(1), residual, jacobian, &NewtonConfig::default())
            .unwrap_err();
        assert!(matches!(err, StructureError::SingularSystem { .. }));
    }

    #[test]
    fn iteration_budget_exhaustion_is_non_convergence() {
        // Jacobian deliberately wrong by a factor of 100: tiny steps, no convergence
        let residual = |x: &DVector<f64>| -> StructureResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] - 1.0))
        };
        let jacobian =
            |_: &DVector<f64>| -> StructureResult<DMatrix<f64>> { Ok(DMatrix::from_element(1, 1, 100.0)) };
        let config = NewtonConfig {
            max_iterations: 3,
            ..Default::default()
        };
        let err = newton_solve(DVector::zeros(1), residual, jacobian, &config).unwrap_err();
        assert!(matches!(
            err,
            StructureError::NonConvergence { iterations: 3, .. }
        ));
    }

    #[test]
    fn stalled_step_above_tolerance_is_non_convergence() {
        // Tangent far too stiff: the first step is negligible, the residual is not
        let residual = |x: &DVector<f64>| -> StructureResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] - 1.0))
        };
        let jacobian =
            |_: &DVector<f64>| -> StructureResult<DMatrix<f64>> { Ok(DMatrix::from_element(1, 1, 1e12)) };
        let err = newton_solve(DVector::zeros(1), residual, jacobian, &NewtonConfig::default())
            .unwrap_err();
        match err {
            StructureError::NonConvergence { iterations, residual } => {
                assert_eq!(iterations, 1);
                assert!((residual - 1.0).abs() < 1e-9);
            }
            other => panic!("expected NonConvergence, got {other:?}"),
        }
    }

    #[test]
    fn stalled_step_at_noise_floor_is_accepted() {
        let residual = |x: &DVector<f64>| -> StructureResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] - 1.0))
        };
        let jacobian =
            |_: &DVector<f64>| -> StructureResult<DMatrix<f64>> { Ok(DMatrix::from_element(1, 1, 1e12)) };
        let config = NewtonConfig::default();
        let result =
            newton_solve_with_floor(DVector::zeros(1), residual, jacobian, &config, 1.5).unwrap();
        assert_eq!(result.iterations, 1);
        assert!(newton_solve_with_floor(DVector::zeros(1), residual, jacobian, &config, 0.5).is_err());
    }
}
