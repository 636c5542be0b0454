//! Newmark time integration of translation and rotation-vector increments.
//!
//! Rotational quantities use the spatial rotation-vector increment Θ of the
//! step (`R = exp(Θ) R_n`) in place of a displacement, with angular velocity
//! and acceleration in the global frame.

use nalgebra::Vector3;

/// Newmark-β coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Newmark {
    pub beta: f64,
    pub gamma: f64,
}

impl Newmark {
    /// Coefficients with numerical damping `α`: `β = ¼(1+α)²`, `γ = ½+α`.
    pub fn with_damping(alpha: f64) -> Self {
        Self {
            beta: 0.25 * (1.0 + alpha).powi(2),
            gamma: 0.5 + alpha,
        }
    }

    /// Predicted increment assuming constant acceleration over the step.
    pub fn predict(&self, dt: f64, rate: &Vector3<f64>, accel: &Vector3<f64>) -> Vector3<f64> {
        rate * dt + accel * (0.5 * dt * dt)
    }

    /// End-of-step rate and acceleration implied by an increment.
    pub fn rates(
        &self,
        dt: f64,
        increment: &Vector3<f64>,
        rate: &Vector3<f64>,
        accel: &Vector3<f64>,
    ) -> (Vector3<f64>, Vector3<f64>) {
        let a_new = (increment - rate * dt - accel * (dt * dt * (0.5 - self.beta)))
            / (self.beta * dt * dt);
        let v_new = rate + (accel * (1.0 - self.gamma) + a_new * self.gamma) * dt;
        (v_new, a_new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trapezoidal_rule_without_damping() {
        let nm = Newmark::with_damping(0.0);
        assert_eq!(nm.beta, 0.25);
        assert_eq!(nm.gamma, 0.5);
    }

    #[test]
    fn predictor_reproduces_current_acceleration() {
        let nm = Newmark::with_damping(0.02);
        let v = Vector3::new(1.0, -2.0, 0.5);
        let a = Vector3::new(0.3, 0.0, -9.8);
        let dt = 0.01;
        let u = nm.predict(dt, &v, &a);
        let (_, a_new) = nm.rates(dt, &u, &v, &a);
        assert!((a_new - a).norm() < 1e-9);
    }

    #[test]
    fn constant_acceleration_is_integrated_exactly() {
        let nm = Newmark::with_damping(0.0);
        let g = Vector3::new(0.0, 0.0, -9.81);
        let dt = 0.1;
        // x = ½ g t², starting from rest
        let u = g * (0.5 * dt * dt);
        let (v, a) = nm.rates(dt, &u, &Vector3::zeros(), &g);
        assert!((a - g).norm() < 1e-10);
        assert!((v - g * dt).norm() < 1e-10);
    }
}
