//! Induced velocity of straight vortex filaments.

use nalgebra::Vector3;

const FOUR_PI: f64 = 4.0 * std::f64::consts::PI;

/// Velocity induced at `p` by a filament from `a` to `b` of circulation `gamma`.
///
/// Returns zero when `p` lies within `cutoff` of either end point or of the
/// filament line.
pub fn segment(
    p: &Vector3<f64>,
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    gamma: f64,
    cutoff: f64,
) -> Vector3<f64> {
    let r0 = b - a;
    let r1 = p - a;
    let r2 = p - b;
    let r1n = r1.norm();
    let r2n = r2.norm();
    let cross = r1.cross(&r2);
    let cross_sq = cross.norm_squared();
    if r1n < cutoff || r2n < cutoff || cross_sq <= (cutoff * cutoff) * r0.norm_squared() {
        return Vector3::zeros();
    }
    let k = gamma / (FOUR_PI * cross_sq) * r0.dot(&(r1 / r1n - r2 / r2n));
    cross * k
}

/// Velocity induced at `p` by a closed ring `c0 → c1 → c2 → c3 → c0`.
pub fn ring(p: &Vector3<f64>, c: &[Vector3<f64>; 4], gamma: f64, cutoff: f64) -> Vector3<f64> {
    segment(p, &c[0], &c[1], gamma, cutoff)
        + segment(p, &c[1], &c[2], gamma, cutoff)
        + segment(p, &c[2], &c[3], gamma, cutoff)
        + segment(p, &c[3], &c[0], gamma, cutoff)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn ring_velocity_is_linear_in_circulation(
            x in -2.0_f64..2.0, y in -2.0_f64..2.0, z in 0.1_f64..2.0, gamma in -5.0_f64..5.0,
        ) {
            let c = [
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::new(1.0, 1.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
            ];
            let p = Vector3::new(x, y, z);
            let unit = ring(&p, &c, 1.0, 1e-6);
            let scaled = ring(&p, &c, gamma, 1e-6);
            prop_assert!((scaled - unit * gamma).norm() <= 1e-12 * (1.0 + unit.norm() * gamma.abs()));
        }

        #[test]
        fn segment_velocity_is_normal_to_the_filament(
            x in -2.0_f64..2.0, y in 0.1_f64..2.0, z in -2.0_f64..2.0,
        ) {
            let a = Vector3::zeros();
            let b = Vector3::new(1.0, 0.0, 0.0);
            let v = segment(&Vector3::new(x, y, z), &a, &b, 1.0, 1e-6);
            prop_assert!(v.x.abs() <= 1e-12);
        }
    }
}
