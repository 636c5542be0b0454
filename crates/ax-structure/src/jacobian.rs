//! Finite difference Jacobian computation.

use crate::error::StructureResult;
use nalgebra::{DMatrix, DVector};

/// Compute Jacobian using central finite differences.
///
/// Column j perturbs x[j] by `epsilon * max(|x[j]|, 1)` in both directions.
pub fn central_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> StructureResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> StructureResult<DVector<f64>>,
{
    let n = x.len();
    let mut jac: Option<DMatrix<f64>> = None;

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);

        let mut x_plus = x.clone();
        x_plus[j] += dx;
        let f_plus = f(&x_plus)?;

        let mut x_minus = x.clone();
        x_minus[j] -= dx;
        let f_minus = f(&x_minus)?;

        let jac = jac.get_or_insert_with(|| DMatrix::zeros(f_plus.len(), n));
        jac.set_column(j, &((f_plus - f_minus) / (2.0 * dx)));
    }

    match jac {
        Some(jac) => Ok(jac),
        None => Ok(DMatrix::zeros(f(x)?.len(), 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_quadratic() {
        // f(x) = [x0^2, x0 x1], J = [[2 x0, 0], [x1, x0]]
        let f = |x: &DVector<f64>| -> StructureResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![x[0] * x[0], x[0] * x[1]]))
        };

        let x = DVector::from_vec(vec![3.0, -2.0]);
        let jac = central_difference_jacobian(&x, f, 1e-6).unwrap();

        assert!((jac[(0, 0)] - 6.0).abs() < 1e-6);
        assert!(jac[(0, 1)].abs() < 1e-6);
        assert!((jac[(1, 0)] + 2.0).abs() < 1e-6);
        assert!((jac[(1, 1)] - 3.0).abs() < 1e-6);
    }
}
