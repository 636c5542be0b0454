//! Finite-rotation helpers.
//!
//! Orientations are `UnitQuaternion`s mapping a node's material frame to the
//! global frame. Increments are rotation vectors composed on the left
//! (`R = exp(Θ) R_n`), so large rotations never accumulate additive drift.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

/// Skew-symmetric cross-product matrix: `skew(a) * b == a × b`.
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Exponential map: rotation vector → unit quaternion.
pub fn exp_map(theta: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_scaled_axis(*theta)
}

/// Logarithmic map: unit quaternion → rotation vector with angle in [0, π].
pub fn log_map(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    q.scaled_axis()
}

/// Compose a left (spatial) rotation increment with an orientation.
pub fn compose(theta: &Vector3<f64>, base: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    exp_map(theta) * base
}

/// Tangent operator `T(Θ)` of the exponential map.
///
/// A variation `δΘ` of the rotation vector produces the spatial rotation
/// increment `δφ = T(Θ) δΘ`, i.e. `exp(Θ + δΘ) ≈ exp(T(Θ) δΘ) exp(Θ)`.
pub fn tangent_operator(theta: &Vector3<f64>) -> Matrix3<f64> {
    let angle = theta.norm();
    let s = skew(theta);
    let (a, b) = if angle < 1e-4 {
        let a2 = angle * angle;
        (0.5 - a2 / 24.0, 1.0 / 6.0 - a2 / 120.0)
    } else {
        let a2 = angle * angle;
        (
            (1.0 - angle.cos()) / a2,
            (angle - angle.sin()) / (a2 * angle),
        )
    };
    Matrix3::identity() + s * a + s * s * b
}

/// Rotation matrix of a unit quaternion.
pub fn matrix(q: &UnitQuaternion<f64>) -> Matrix3<f64> {
    q.to_rotation_matrix().into_inner()
}

/// Two unit vectors completing `axis` to a right-handed orthonormal basis.
pub fn orthonormal_complement(axis: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let a = axis.normalize();
    let trial = if a.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let p1 = (trial - a * a.dot(&trial)).normalize();
    let p2 = a.cross(&p1);
    (p1, p2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skew_matches_cross() {
        let a = Vector3::new(1.0, -2.0, 0.5);
        let b = Vector3::new(0.3, 0.7, -1.1);
        let diff = skew(&a) * b - a.cross(&b);
        assert!(diff.norm() < 1e-15);
    }

    #[test]
    fn tangent_operator_small_angle_is_identity() {
        let t = tangent_operator(&Vector3::zeros());
        assert!((t - Matrix3::identity()).norm() < 1e-15);
    }

    #[test]
    fn tangent_operator_matches_finite_difference() {
        let theta = Vector3::new(0.4, -0.9, 1.3);
        let t = tangent_operator(&theta);
        let base = exp_map(&theta);
        let eps = 1e-6;
        for k in 0..3 {
            let mut d = Vector3::zeros();
            d[k] = eps;
            let plus = exp_map(&(theta + d));
            let dphi = log_map(&(plus * base.inverse())) / eps;
            let expected = t.column(k).into_owned();
            assert!((dphi - expected).norm() < 1e-5, "column {k}");
        }
    }

    #[test]
    fn orthonormal_complement_is_orthonormal() {
        let axis = Vector3::new(0.2, 0.0, 1.0);
        let (p1, p2) = orthonormal_complement(&axis);
        let a = axis.normalize();
        assert!(p1.dot(&a).abs() < 1e-14);
        assert!(p2.dot(&a).abs() < 1e-14);
        assert!(p1.dot(&p2).abs() < 1e-14);
        assert!((p1.norm() - 1.0).abs() < 1e-14);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn log_inverts_exp(x in -1.5_f64..1.5, y in -1.5_f64..1.5, z in -1.5_f64..1.5) {
            let theta = Vector3::new(x, y, z);
            prop_assume!(theta.norm() < 3.0);
            let back = log_map(&exp_map(&theta));
            prop_assert!((back - theta).norm() < 1e-12);
        }

        #[test]
        fn composition_is_not_additive_but_consistent(
            x in -1.0_f64..1.0, y in -1.0_f64..1.0, z in -1.0_f64..1.0
        ) {
            let a = Vector3::new(x, y, z);
            let b = Vector3::new(z, x, -y);
            let composed = compose(&a, &exp_map(&b));
            let direct = exp_map(&a) * exp_map(&b);
            prop_assert!(composed.angle_to(&direct) < 1e-12);
        }
    }
}
