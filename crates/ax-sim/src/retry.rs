//! Step-size and relaxation control after a failed attempt.
//!
//! A failed step is first retried with a smaller step; once the step would
//! drop below `min_dt`, the load relaxation factor is reduced instead. When
//! neither can shrink further, or the retry budget is spent, the failure is
//! fatal.

use crate::config::DriverOptions;

/// What to change before the next attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Adjustment {
    StepSize(f64),
    Relaxation(f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    nominal_dt: f64,
    min_dt: f64,
    max_retries: usize,
    cutback_factor: f64,
    grow_factor: f64,
    relaxation_cutback: f64,
    min_relaxation: f64,
}

impl RetryPolicy {
    pub fn new(opts: &DriverOptions) -> Self {
        Self {
            nominal_dt: opts.dt,
            min_dt: opts.min_dt,
            max_retries: opts.max_retries,
            cutback_factor: opts.cutback_factor,
            grow_factor: opts.grow_factor,
            relaxation_cutback: opts.relaxation_cutback,
            min_relaxation: opts.min_relaxation,
        }
    }

    /// Adjustment after the `failures`-th failed attempt of a step taken
    /// with `dt` and `relaxation`, or `None` if the step cannot be saved.
    pub fn on_failure(&self, dt: f64, relaxation: f64, failures: usize) -> Option<Adjustment> {
        if failures > self.max_retries {
            return None;
        }
        let smaller_dt = dt * self.cutback_factor;
        if smaller_dt >= self.min_dt {
            return Some(Adjustment::StepSize(smaller_dt));
        }
        let weaker = relaxation * self.relaxation_cutback;
        if weaker >= self.min_relaxation {
            return Some(Adjustment::Relaxation(weaker));
        }
        None
    }

    /// Step to try after an accepted step of size `dt`.
    pub fn after_success(&self, dt: f64) -> f64 {
        (dt * self.grow_factor).min(self.nominal_dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(&DriverOptions {
            dt: 0.1,
            min_dt: 0.02,
            max_retries: 10,
            cutback_factor: 0.5,
            grow_factor: 2.0,
            relaxation_cutback: 0.5,
            min_relaxation: 0.2,
            ..Default::default()
        })
    }

    #[test]
    fn step_size_is_cut_before_relaxation() {
        let p = policy();
        assert_eq!(p.on_failure(0.1, 0.8, 1), Some(Adjustment::StepSize(0.05)));
        assert_eq!(p.on_failure(0.05, 0.8, 2), Some(Adjustment::StepSize(0.025)));
        // 0.0125 < min_dt: relax instead
        assert_eq!(p.on_failure(0.025, 0.8, 3), Some(Adjustment::Relaxation(0.4)));
        assert_eq!(p.on_failure(0.025, 0.4, 4), Some(Adjustment::Relaxation(0.2)));
        assert_eq!(p.on_failure(0.025, 0.2, 5), None);
    }

    #[test]
    fn retry_budget_is_enforced() {
        let p = RetryPolicy {
            max_retries: 1,
            ..policy()
        };
        assert!(p.on_failure(0.1, 0.8, 1).is_some());
        assert_eq!(p.on_failure(0.05, 0.8, 2), None);
    }

    #[test]
    fn step_grows_back_to_nominal() {
        let p = policy();
        assert_eq!(p.after_success(0.025), 0.05);
        assert_eq!(p.after_success(0.05), 0.1);
        assert_eq!(p.after_success(0.1), 0.1);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn retries_never_go_below_limits(
            dt in 1e-4_f64..1.0,
            relaxation in 0.05_f64..1.0,
            failures in 1_usize..12,
        ) {
            let opts = DriverOptions { dt: 1.0, ..Default::default() };
            let p = RetryPolicy::new(&opts);
            match p.on_failure(dt, relaxation, failures) {
                Some(Adjustment::StepSize(smaller)) => {
                    prop_assert!(smaller < dt && smaller >= opts.min_dt);
                }
                Some(Adjustment::Relaxation(weaker)) => {
                    prop_assert!(dt * opts.cutback_factor < opts.min_dt);
                    prop_assert!(weaker < relaxation && weaker >= opts.min_relaxation);
                }
                None => prop_assert!(
                    failures > opts.max_retries
                        || relaxation * opts.relaxation_cutback < opts.min_relaxation
                ),
            }
        }

        #[test]
        fn growth_is_capped_at_nominal(dt in 1e-5_f64..1e-2) {
            let p = RetryPolicy::new(&DriverOptions::default());
            let grown = p.after_success(dt);
            prop_assert!(grown >= dt && grown <= 1e-2);
        }
    }
}
