//! Incident velocity fields: freestream and gusts.

use ax_core::schedule::interpolate;
use ax_core::{AxError, AxResult, Length, Velocity};
use nalgebra::Vector3;

/// Incident (non-induced) flow velocity sampled at arbitrary space-time points.
pub trait VelocityField: Send + Sync + std::fmt::Debug {
    fn velocity(&self, point: &Vector3<f64>, t: f64) -> AxResult<Vector3<f64>>;

    /// Time interval on which the field is defined (`None` = all time).
    fn domain(&self) -> Option<(f64, f64)> {
        None
    }
}

/// Uniform, constant freestream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteadyVelocityField {
    pub velocity: Vector3<f64>,
}

impl SteadyVelocityField {
    pub fn new(speed: Velocity, direction: Vector3<f64>) -> AxResult<Self> {
        Ok(Self {
            velocity: unit(direction, "freestream direction")? * speed.value,
        })
    }

    /// No flow at all.
    pub fn still_air() -> Self {
        Self {
            velocity: Vector3::zeros(),
        }
    }
}

impl VelocityField for SteadyVelocityField {
    fn velocity(&self, _point: &Vector3<f64>, _t: f64) -> AxResult<Vector3<f64>> {
        Ok(self.velocity)
    }
}

/// Discrete `1 − cos` gust convecting with the freestream.
///
/// The gust front starts at `offset` along the freestream direction at
/// `t = 0`; a point at distance `s` behind the front sees
/// `w = ½ intensity (1 − cos 2πs/L)` along `direction` for `0 ≤ s ≤ L`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OneMinusCosineGust {
    freestream: Vector3<f64>,
    direction: Vector3<f64>,
    gust_length: f64,
    intensity: f64,
    offset: f64,
}

impl OneMinusCosineGust {
    pub fn new(
        freestream: Velocity,
        freestream_direction: Vector3<f64>,
        gust_length: Length,
        intensity: Velocity,
        gust_direction: Vector3<f64>,
        offset: Length,
    ) -> AxResult<Self> {
        if !(gust_length.value.is_finite() && gust_length.value > 0.0) {
            return Err(AxError::InvalidArg {
                what: "gust length must be positive",
            });
        }
        Ok(Self {
            freestream: unit(freestream_direction, "freestream direction")? * freestream.value,
            direction: unit(gust_direction, "gust direction")?,
            gust_length: gust_length.value,
            intensity: intensity.value,
            offset: offset.value,
        })
    }
}

impl VelocityField for OneMinusCosineGust {
    fn velocity(&self, point: &Vector3<f64>, t: f64) -> AxResult<Vector3<f64>> {
        let u = self.freestream.norm();
        if u == 0.0 {
            return Ok(self.freestream);
        }
        let along = point.dot(&self.freestream) / u;
        let s = u * t + self.offset - along;
        let w = if (0.0..=self.gust_length).contains(&s) {
            0.5 * self.intensity * (1.0 - (2.0 * std::f64::consts::PI * s / self.gust_length).cos())
        } else {
            0.0
        };
        Ok(self.freestream + self.direction * w)
    }
}

/// Spatially uniform velocity given as a time series, linearly interpolated.
///
/// Queries outside the tabulated times fail with `OutOfDomain`.
#[derive(Clone, Debug, PartialEq)]
pub struct TabulatedGust {
    times: Vec<f64>,
    components: [Vec<f64>; 3],
}

impl TabulatedGust {
    pub fn new(times: Vec<f64>, velocities: Vec<Vector3<f64>>) -> AxResult<Self> {
        if times.len() < 2 || times.len() != velocities.len() {
            return Err(AxError::InvalidArg {
                what: "tabulated gust needs at least two samples with matching tables",
            });
        }
        if times.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(AxError::InvalidArg {
                what: "tabulated gust times must be strictly increasing",
            });
        }
        let components = [0, 1, 2].map(|c| velocities.iter().map(|v| v[c]).collect());
        Ok(Self { times, components })
    }
}

impl VelocityField for TabulatedGust {
    fn velocity(&self, _point: &Vector3<f64>, t: f64) -> AxResult<Vector3<f64>> {
        let (start, end) = (self.times[0], self.times[self.times.len() - 1]);
        if !(start..=end).contains(&t) {
            return Err(AxError::OutOfDomain {
                what: "tabulated gust",
                time: t,
                start,
                end,
            });
        }
        Ok(Vector3::from_fn(|c, _| {
            interpolate(&self.times, &self.components[c], t)
        }))
    }

    fn domain(&self) -> Option<(f64, f64)> {
        Some((self.times[0], self.times[self.times.len() - 1]))
    }
}

/// Sum of several fields; defined where all of them are.
#[derive(Debug, Default)]
pub struct CompositeField {
    fields: Vec<Box<dyn VelocityField>>,
}

impl CompositeField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl VelocityField + 'static) -> Self {
        self.fields.push(Box::new(field));
        self
    }
}

impl VelocityField for CompositeField {
    fn velocity(&self, point: &Vector3<f64>, t: f64) -> AxResult<Vector3<f64>> {
        self.fields
            .iter()
            .try_fold(Vector3::zeros(), |acc, f| Ok(acc + f.velocity(point, t)?))
    }

    fn domain(&self) -> Option<(f64, f64)> {
        self.fields
            .iter()
            .filter_map(|f| f.domain())
            .reduce(|(a0, a1), (b0, b1)| (a0.max(b0), a1.min(b1)))
    }
}

fn unit(v: Vector3<f64>, what: &'static str) -> AxResult<Vector3<f64>> {
    let n = v.norm();
    if n.is_finite() && n > 0.0 {
        Ok(v / n)
    } else {
        Err(AxError::InvalidArg { what })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ax_core::{FailureKind, m, mps};

    #[test]
    fn gust_profile_peaks_mid_gust() {
        let gust = OneMinusCosineGust::new(
            mps(10.0),
            Vector3::x(),
            m(5.0),
            mps(2.0),
            Vector3::z(),
            m(0.0),
        )
        .unwrap();
        let origin = Vector3::zeros();
        // Front reaches the origin at t = 0, the peak at t = 0.25 s
        assert!((gust.velocity(&origin, 0.25).unwrap().z - 2.0).abs() < 1e-12);
        assert_eq!(gust.velocity(&origin, 0.6).unwrap().z, 0.0);
        assert_eq!(gust.velocity(&Vector3::new(1.0, 0.0, 0.0), 0.05).unwrap().z, 0.0);
        assert_eq!(gust.velocity(&origin, 0.1).unwrap().x, 10.0);
    }

    #[test]
    fn tabulated_gust_domain() {
        let gust = TabulatedGust::new(
            vec![0.0, 1.0],
            vec![Vector3::zeros(), Vector3::new(0.0, 0.0, 4.0)],
        )
        .unwrap();
        assert!((gust.velocity(&Vector3::zeros(), 0.25).unwrap().z - 1.0).abs() < 1e-15);
        let err = gust.velocity(&Vector3::zeros(), 1.5).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InputOutOfRange);
    }

    #[test]
    fn composite_sums_and_intersects_domains() {
        let field = CompositeField::new()
            .with(SteadyVelocityField::new(mps(20.0), Vector3::x()).unwrap())
            .with(TabulatedGust::new(vec![0.0, 2.0], vec![Vector3::z(), Vector3::z()]).unwrap())
            .with(TabulatedGust::new(vec![1.0, 3.0], vec![Vector3::y(), Vector3::y()]).unwrap());
        assert_eq!(field.domain(), Some((1.0, 2.0)));
        let v = field.velocity(&Vector3::zeros(), 1.5).unwrap();
        assert!((v - Vector3::new(20.0, 1.0, 1.0)).norm() < 1e-12);
        assert!(field.velocity(&Vector3::zeros(), 0.5).is_err());
    }
}
