use thiserror::Error;

pub type AxResult<T> = Result<T, AxError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AxError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },

    #[error("Input out of range: {what} queried at t={time} (domain [{start}, {end}])")]
    OutOfDomain {
        what: &'static str,
        time: f64,
        start: f64,
        end: f64,
    },
}

impl AxError {
    /// Classify this error within the simulation failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            AxError::OutOfDomain { .. } => FailureKind::InputOutOfRange,
            _ => FailureKind::Setup,
        }
    }
}

/// Failure taxonomy shared by every solver crate.
///
/// `NonConvergence` and `ConstraintViolation` can be cured by a smaller time
/// step; the others cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Newton-Raphson or fixed-point iteration exceeded its iteration budget.
    NonConvergence,
    /// A structural or aerodynamic linear system is singular.
    SingularSystem,
    /// A joint residual exceeded its tolerance after a solve.
    ConstraintViolation,
    /// A disturbance or prescribed-motion query fell outside its domain.
    InputOutOfRange,
    /// Invalid model or configuration.
    Setup,
}

impl FailureKind {
    /// True if the driver may retry the step with a smaller step size.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureKind::NonConvergence | FailureKind::ConstraintViolation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(FailureKind::NonConvergence.is_retryable());
        assert!(FailureKind::ConstraintViolation.is_retryable());
        assert!(!FailureKind::SingularSystem.is_retryable());
        assert!(!FailureKind::InputOutOfRange.is_retryable());
        assert!(!FailureKind::Setup.is_retryable());
    }

    #[test]
    fn out_of_domain_is_input_out_of_range() {
        let err = AxError::OutOfDomain {
            what: "gust",
            time: 2.0,
            start: 0.0,
            end: 1.0,
        };
        assert_eq!(err.kind(), FailureKind::InputOutOfRange);
        assert!(err.to_string().contains("t=2"));
    }
}
