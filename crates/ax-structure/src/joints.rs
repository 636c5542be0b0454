//! Joint constraint equations.
//!
//! Constraints are written in terms of the rotation of each node away from
//! its reference orientation, `ΔR = R R₀ᵀ`, and the relative rotation
//! `Rel = ΔR_aᵀ ΔR_b` of the child side as seen from the parent side. A hinge
//! axis is given in the global reference frame and convects with the parent.
//! The gap rows and the rotational rows of a prescribed joint are both
//! global, so its multipliers are the global reaction force and moment.

use ax_core::rotation::{exp_map, log_map, orthonormal_complement};
use ax_topology::JointKind;
use nalgebra::{DVector, UnitQuaternion, Vector3};

use crate::element::Placement;

/// Relative rotation vector `log(ΔR_aᵀ ΔR_b)`.
pub fn relative_rotation(
    reference: [&UnitQuaternion<f64>; 2],
    a: &UnitQuaternion<f64>,
    b: &UnitQuaternion<f64>,
) -> Vector3<f64> {
    let da = a * reference[0].inverse();
    let db = b * reference[1].inverse();
    log_map(&(da.inverse() * db))
}

/// Constraint residual `g` of a joint; zero when the joint is satisfied.
///
/// `angle` is the commanded rotation of a prescribed joint (ignored otherwise).
pub fn constraint(
    kind: &JointKind,
    reference: [&UnitQuaternion<f64>; 2],
    a: &Placement,
    b: &Placement,
    angle: f64,
) -> DVector<f64> {
    let mut g = DVector::zeros(kind.constraint_count());
    let gap = b.position - a.position;
    g.fixed_rows_mut::<3>(0).copy_from(&gap);

    match kind {
        JointKind::Spherical => {}
        JointKind::Hinge { axis } => {
            let psi = relative_rotation(reference, &a.orientation, &b.orientation);
            let (p1, p2) = orthonormal_complement(axis);
            g[3] = p1.dot(&psi);
            g[4] = p2.dot(&psi);
        }
        JointKind::Prescribed { axis } => {
            let h = axis.normalize();
            let da = a.orientation * reference[0].inverse();
            let db = b.orientation * reference[1].inverse();
            let rel = da.inverse() * db;
            let err = da * log_map(&(exp_map(&(h * -angle)) * rel));
            g.fixed_rows_mut::<3>(3).copy_from(&err);
        }
    }
    g
}

/// Joint angle: rotation about the axis, or the relative rotation magnitude
/// for spherical joints.
pub fn joint_angle(kind: &JointKind, psi: &Vector3<f64>) -> f64 {
    match kind.axis() {
        Some(axis) => axis.normalize().dot(psi),
        None => psi.norm(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, q: UnitQuaternion<f64>) -> Placement {
        Placement::new(Vector3::new(x, 0.0, 0.0), q)
    }

    #[test]
    fn hinge_allows_rotation_about_axis_only() {
        let id = UnitQuaternion::identity();
        let kind = JointKind::Hinge { axis: Vector3::y() };
        let about_axis = UnitQuaternion::from_scaled_axis(Vector3::new(0.0, 0.4, 0.0));
        let g = constraint(&kind, [&id, &id], &at(1.0, id), &at(1.0, about_axis), 0.0);
        assert!(g.norm() < 1e-14);

        let off_axis = UnitQuaternion::from_scaled_axis(Vector3::new(0.1, 0.4, 0.0));
        let g = constraint(&kind, [&id, &id], &at(1.0, id), &at(1.0, off_axis), 0.0);
        assert!(g.norm() > 1e-3);
    }

    #[test]
    fn hinge_axis_convects_with_parent() {
        let id = UnitQuaternion::identity();
        let kind = JointKind::Hinge { axis: Vector3::y() };
        let parent = UnitQuaternion::from_scaled_axis(Vector3::new(0.0, 0.0, 0.7));
        let child = parent * UnitQuaternion::from_scaled_axis(Vector3::new(0.0, -0.3, 0.0));
        let g = constraint(&kind, [&id, &id], &at(2.0, parent), &at(2.0, child), 0.0);
        assert!(g.norm() < 1e-14);
        let psi = relative_rotation([&id, &id], &parent, &child);
        assert!((joint_angle(&kind, &psi) + 0.3).abs() < 1e-14);
    }

    #[test]
    fn prescribed_joint_tracks_commanded_angle() {
        let id = UnitQuaternion::identity();
        let kind = JointKind::Prescribed { axis: Vector3::z() };
        let child = UnitQuaternion::from_scaled_axis(Vector3::new(0.0, 0.0, 0.25));
        let g = constraint(&kind, [&id, &id], &at(0.0, id), &at(0.0, child), 0.25);
        assert!(g.norm() < 1e-14);
        let g = constraint(&kind, [&id, &id], &at(0.0, id), &at(0.0, child), 0.0);
        assert!((g[5] - 0.25).abs() < 1e-14);
    }

    #[test]
    fn prescribed_rotation_error_is_global() {
        let kind = JointKind::Prescribed { axis: Vector3::z() };
        let id = UnitQuaternion::identity();
        // Parent yawed a quarter turn; child lags the command by 0.1 about the
        // convected axis, which is still global z
        let parent = UnitQuaternion::from_scaled_axis(Vector3::new(0.0, 0.0, 0.5));
        let child = parent * UnitQuaternion::from_scaled_axis(Vector3::new(0.0, 0.0, 0.2));
        let g = constraint(&kind, [&id, &id], &at(0.0, parent), &at(0.0, child), 0.3);
        assert!((g.fixed_rows::<3>(3) - Vector3::new(0.0, 0.0, -0.1)).norm() < 1e-14);

        // Tilted parent: the error vector turns with it
        let parent = UnitQuaternion::from_scaled_axis(Vector3::new(0.0, 0.6, 0.0));
        let child = parent * UnitQuaternion::from_scaled_axis(Vector3::new(0.05, 0.0, 0.0));
        let g = constraint(&kind, [&id, &id], &at(0.0, parent), &at(0.0, child), 0.0);
        let expected = parent * Vector3::new(0.05, 0.0, 0.0);
        assert!((g.fixed_rows::<3>(3) - expected).norm() < 1e-14);
    }

    #[test]
    fn spherical_only_constrains_position() {
        let id = UnitQuaternion::identity();
        let q = UnitQuaternion::from_scaled_axis(Vector3::new(0.3, 0.2, 0.1));
        let g = constraint(&JointKind::Spherical, [&id, &id], &at(1.0, id), &at(1.5, q), 0.0);
        assert_eq!(g.len(), 3);
        assert!((g[0] - 0.5).abs() < 1e-15);
    }
}
