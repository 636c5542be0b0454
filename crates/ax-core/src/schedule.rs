//! Scalar time schedules.
//!
//! Used for prescribed joint angles and control-surface deflection commands.
//! Schedules with a finite domain report `AxError::OutOfDomain` when queried
//! outside it instead of extrapolating.

use crate::error::{AxError, AxResult};

/// Scalar function of time.
pub trait Schedule: Send + Sync + std::fmt::Debug {
    /// Value at time `t`.
    fn value(&self, t: f64) -> AxResult<f64>;

    /// Time interval on which the schedule is defined (`None` = all time).
    fn domain(&self) -> Option<(f64, f64)> {
        None
    }
}

/// Constant value for all time.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstantSchedule(pub f64);

impl Schedule for ConstantSchedule {
    fn value(&self, _t: f64) -> AxResult<f64> {
        Ok(self.0)
    }
}

/// `offset + amplitude * sin(omega * t + phase)`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HarmonicSchedule {
    pub offset: f64,
    pub amplitude: f64,
    /// Angular frequency (rad/s)
    pub omega: f64,
    pub phase: f64,
}

impl Schedule for HarmonicSchedule {
    fn value(&self, t: f64) -> AxResult<f64> {
        Ok(self.offset + self.amplitude * (self.omega * t + self.phase).sin())
    }
}

/// Piecewise-linear table of `(time, value)` samples.
#[derive(Clone, Debug)]
pub struct TabulatedSchedule {
    what: &'static str,
    times: Vec<f64>,
    values: Vec<f64>,
}

impl TabulatedSchedule {
    /// Build a table; times must be strictly increasing.
    pub fn new(what: &'static str, times: Vec<f64>, values: Vec<f64>) -> AxResult<Self> {
        if times.is_empty() || times.len() != values.len() {
            return Err(AxError::InvalidArg {
                what: "schedule needs matching, non-empty time and value tables",
            });
        }
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AxError::InvalidArg {
                what: "schedule times must be strictly increasing",
            });
        }
        if times.iter().chain(values.iter()).any(|v| !v.is_finite()) {
            return Err(AxError::InvalidArg {
                what: "schedule samples must be finite",
            });
        }
        Ok(Self {
            what,
            times,
            values,
        })
    }
}

impl Schedule for TabulatedSchedule {
    fn value(&self, t: f64) -> AxResult<f64> {
        let (start, end) = (self.times[0], self.times[self.times.len() - 1]);
        if !(start..=end).contains(&t) {
            return Err(AxError::OutOfDomain {
                what: self.what,
                time: t,
                start,
                end,
            });
        }
        Ok(interpolate(&self.times, &self.values, t))
    }

    fn domain(&self) -> Option<(f64, f64)> {
        Some((self.times[0], self.times[self.times.len() - 1]))
    }
}

/// Linear interpolation on a sorted table; `t` must lie inside the table.
pub fn interpolate(times: &[f64], values: &[f64], t: f64) -> f64 {
    let upper = times.partition_point(|&x| x < t);
    if upper == 0 {
        return values[0];
    }
    if upper >= times.len() {
        return values[values.len() - 1];
    }
    let (t0, t1) = (times[upper - 1], times[upper]);
    let w = (t - t0) / (t1 - t0);
    values[upper - 1] * (1.0 - w) + values[upper] * w
}
