//! Prescribed node motion (supports, imposed trajectories).
//!
//! A prescribed node carries no unknowns: its pose and rates at the end of
//! each step come straight from its `PrescribedMotion`.

use ax_core::rotation::exp_map;
use ax_core::schedule::interpolate;
use ax_core::{AxError, AxResult};
use nalgebra::{UnitQuaternion, Vector3};

/// Pose and rates of a node at one instant (global frame).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodePose {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub velocity: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
    pub angular_acceleration: Vector3<f64>,
}

impl NodePose {
    /// Pose with zero rates.
    pub fn stationary(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            acceleration: Vector3::zeros(),
            angular_acceleration: Vector3::zeros(),
        }
    }
}

/// Time history of a node's pose.
pub trait PrescribedMotion: Send + Sync + std::fmt::Debug {
    /// Pose at time `t`.
    fn pose(&self, t: f64) -> AxResult<NodePose>;

    /// Time interval on which the motion is defined (`None` = all time).
    fn domain(&self) -> Option<(f64, f64)> {
        None
    }
}

/// Clamped support at a fixed pose.
#[derive(Clone, Copy, Debug)]
pub struct FixedSupport {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl PrescribedMotion for FixedSupport {
    fn pose(&self, _t: f64) -> AxResult<NodePose> {
        Ok(NodePose::stationary(self.position, self.orientation))
    }
}

/// Smooth start-up oscillation `d(t) = A (1 − cos ωt)` in translation and
/// rotation about a base pose.
///
/// Starts from rest at the base pose, which makes it a clean plunge/pitch
/// excitation.
#[derive(Clone, Copy, Debug)]
pub struct HarmonicMotion {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    /// Translation amplitude (m)
    pub amplitude: Vector3<f64>,
    /// Rotation-vector amplitude (rad)
    pub rotation_amplitude: Vector3<f64>,
    /// Angular frequency (rad/s)
    pub omega: f64,
}

impl PrescribedMotion for HarmonicMotion {
    fn pose(&self, t: f64) -> AxResult<NodePose> {
        let w = self.omega;
        let (s, c) = (w * t).sin_cos();
        let shape = 1.0 - c;
        let rate = w * s;
        let accel = w * w * c;
        // Fixed rotation axis, so the rotation-vector rate is the angular velocity.
        Ok(NodePose {
            position: self.position + self.amplitude * shape,
            orientation: exp_map(&(self.rotation_amplitude * shape)) * self.orientation,
            velocity: self.amplitude * rate,
            angular_velocity: self.rotation_amplitude * rate,
            acceleration: self.amplitude * accel,
            angular_acceleration: self.rotation_amplitude * accel,
        })
    }
}

/// Piecewise-linear translation history at a fixed orientation.
///
/// Velocity is the slope of the active segment; acceleration is zero.
#[derive(Clone, Debug)]
pub struct TabulatedTrajectory {
    times: Vec<f64>,
    positions: Vec<Vector3<f64>>,
    orientation: UnitQuaternion<f64>,
}

impl TabulatedTrajectory {
    pub fn new(
        times: Vec<f64>,
        positions: Vec<Vector3<f64>>,
        orientation: UnitQuaternion<f64>,
    ) -> AxResult<Self> {
        if times.len() < 2 || times.len() != positions.len() {
            return Err(AxError::InvalidArg {
                what: "trajectory needs at least two samples with matching tables",
            });
        }
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AxError::InvalidArg {
                what: "trajectory times must be strictly increasing",
            });
        }
        Ok(Self {
            times,
            positions,
            orientation,
        })
    }
}

impl PrescribedMotion for TabulatedTrajectory {
    fn pose(&self, t: f64) -> AxResult<NodePose> {
        let (start, end) = (self.times[0], self.times[self.times.len() - 1]);
        if !(start..=end).contains(&t) {
            return Err(AxError::OutOfDomain {
                what: "prescribed trajectory",
                time: t,
                start,
                end,
            });
        }
        let mut position = Vector3::zeros();
        for k in 0..3 {
            let column: Vec<f64> = self.positions.iter().map(|p| p[k]).collect();
            position[k] = interpolate(&self.times, &column, t);
        }
        let seg = self
            .times
            .partition_point(|&x| x <= t)
            .clamp(1, self.times.len() - 1);
        let velocity = (self.positions[seg] - self.positions[seg - 1])
            / (self.times[seg] - self.times[seg - 1]);
        let mut pose = NodePose::stationary(position, self.orientation);
        pose.velocity = velocity;
        Ok(pose)
    }

    fn domain(&self) -> Option<(f64, f64)> {
        Some((self.times[0], self.times[self.times.len() - 1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harmonic_motion_starts_at_rest() {
        let m = HarmonicMotion {
            position: Vector3::new(1.0, 0.0, 0.0),
            orientation: UnitQuaternion::identity(),
            amplitude: Vector3::new(0.0, 0.0, 0.1),
            rotation_amplitude: Vector3::zeros(),
            omega: 2.0,
        };
        let p0 = m.pose(0.0).unwrap();
        assert_eq!(p0.position, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(p0.velocity, Vector3::zeros());
        let quarter = std::f64::consts::FRAC_PI_2 / 2.0;
        let p = m.pose(quarter).unwrap();
        assert!((p.position.z - 0.1).abs() < 1e-12);
        assert!((p.velocity.z - 0.2).abs() < 1e-12);
    }

    #[test]
    fn trajectory_interpolates_and_rejects_outside() {
        let traj = TabulatedTrajectory::new(
            vec![0.0, 1.0],
            vec![Vector3::zeros(), Vector3::new(2.0, 0.0, 0.0)],
            UnitQuaternion::identity(),
        )
        .unwrap();
        let p = traj.pose(0.5).unwrap();
        assert!((p.position.x - 1.0).abs() < 1e-15);
        assert!((p.velocity.x - 2.0).abs() < 1e-15);
        assert!(matches!(
            traj.pose(1.5),
            Err(AxError::OutOfDomain { .. })
        ));
        assert_eq!(traj.domain(), Some((0.0, 1.0)));
    }
}
