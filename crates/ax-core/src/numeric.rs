use crate::AxError;

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, AxError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(AxError::NonFinite { what, value: v })
    }
}

/// Finite and strictly positive.
pub fn ensure_positive(v: f64, what: &'static str) -> Result<f64, AxError> {
    if ensure_finite(v, what)? > 0.0 {
        Ok(v)
    } else {
        Err(AxError::InvalidArg { what })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;

    #[test]
    fn non_finite_values_are_named() {
        let err = ensure_finite(f64::NAN, "dt").unwrap_err();
        assert!(err.to_string().contains("dt"));
        assert_eq!(err.kind(), FailureKind::Setup);
    }

    #[test]
    fn positive_excludes_zero() {
        assert!(ensure_positive(0.0, "dt").is_err());
        assert!(ensure_positive(f64::INFINITY, "dt").is_err());
        assert_eq!(ensure_positive(0.5, "dt").unwrap(), 0.5);
    }
}
