//! Comparison of a device result against CPU baselines.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::{
    error::{dimension_mismatch, BenchError, Mismatch, Result},
    matrix::Matrix,
    reference::{naive_matmul, par_matmul},
};

/// Per-cell acceptance bound: `|expected - found| <= abs + rel * |expected|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub abs: f32,
    pub rel: f32,
}

impl Tolerance {
    pub const fn exact() -> Self {
        Self { abs: 0.0, rel: 0.0 }
    }

    #[inline]
    pub fn accepts(&self, expected: f32, found: f32) -> bool {
        if expected == found {
            return true;
        }
        // NaN never compares equal and must not slip through the bound check.
        let diff = (expected - found).abs();
        diff <= self.abs + self.rel * expected.abs()
    }
}

/// Integer-valued operands give exactly representable products, so the
/// default allows no relative slack.
impl Default for Tolerance {
    fn default() -> Self {
        Self { abs: 1e-3, rel: 0.0 }
    }
}

/// Outcome of comparing two matrices cell by cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub mismatches: usize,
    pub first_mismatch: Option<Mismatch>,
    pub max_abs_diff: f32,
}

impl Verification {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.mismatches == 0
    }
}

/// Compares `actual` against `expected` in row-major order.
pub fn compare(expected: &Matrix, actual: &Matrix, tolerance: Tolerance) -> Result<Verification> {
    if expected.rows() != actual.rows() || expected.cols() != actual.cols() {
        return Err(dimension_mismatch(format!(
            "expected a {}x{} result, found {}x{}",
            expected.rows(),
            expected.cols(),
            actual.rows(),
            actual.cols()
        )));
    }

    let cols = expected.cols().max(1);
    let mut verification = Verification {
        mismatches: 0,
        first_mismatch: None,
        max_abs_diff: 0.0,
    };

    for (idx, (&e, &f)) in expected
        .as_slice()
        .iter()
        .zip(actual.as_slice())
        .enumerate()
    {
        let diff = (e - f).abs();
        if diff > verification.max_abs_diff || diff.is_nan() {
            verification.max_abs_diff = diff;
        }
        if !tolerance.accepts(e, f) {
            verification.mismatches += 1;
            verification.first_mismatch.get_or_insert(Mismatch {
                row: idx / cols,
                col: idx % cols,
                expected: e,
                found: f,
            });
        }
    }

    Ok(verification)
}

/// CPU implementation a device result is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    Parallel,
    Naive,
}

impl Baseline {
    pub fn name(self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Naive => "naive",
        }
    }

    pub fn compute(self, a: &Matrix, b: &Matrix) -> Result<Matrix> {
        match self {
            Self::Parallel => par_matmul(a, b),
            Self::Naive => naive_matmul(a, b),
        }
    }
}

impl fmt::Display for Baseline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timing and comparison result of one baseline.
#[derive(Debug, Clone)]
pub struct BaselineOutcome {
    pub baseline: Baseline,
    /// Time spent recomputing the product on the CPU.
    pub elapsed: Duration,
    pub verification: Verification,
}

impl BaselineOutcome {
    /// Converts a failed comparison into an error.
    pub fn into_result(self) -> Result<Self> {
        if self.verification.is_success() {
            Ok(self)
        } else {
            Err(BenchError::VerificationFailed {
                baseline: self.baseline.name(),
                mismatches: self.verification.mismatches,
                first: self.verification.first_mismatch,
            })
        }
    }
}

/// Recomputes `a * b` with `baseline` and compares it to `device_result`.
///
/// # Arguments
///
/// * `baseline` - CPU implementation to recompute with
/// * `a`, `b` - The operands the device multiplied
/// * `device_result` - Product read back from the device
/// * `tolerance` - Per-cell acceptance bound
///
/// # Returns
///
/// The baseline's wall-clock time and the comparison. A disagreement is not
/// an error here; use [`BaselineOutcome::into_result`] to turn it into one.
pub fn verify_against(
    baseline: Baseline,
    a: &Matrix,
    b: &Matrix,
    device_result: &Matrix,
    tolerance: Tolerance,
) -> Result<BaselineOutcome> {
    let start = Instant::now();
    let expected = baseline.compute(a, b)?;
    let elapsed = start.elapsed();

    let verification = compare(&expected, device_result, tolerance)?;
    debug!(
        baseline = baseline.name(),
        mismatches = verification.mismatches,
        max_abs_diff = verification.max_abs_diff,
        "baseline compared"
    );

    Ok(BaselineOutcome {
        baseline,
        elapsed,
        verification,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> (Matrix, Matrix, Matrix) {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(&[[5.0, 6.0], [7.0, 8.0]]).unwrap();
        let c = Matrix::from_rows(&[[19.0, 22.0], [43.0, 50.0]]).unwrap();
        (a, b, c)
    }

    #[test]
    fn test_tolerance_exact() {
        let tol = Tolerance::exact();
        assert!(tol.accepts(1.0, 1.0));
        assert!(!tol.accepts(1.0, 1.0 + f32::EPSILON));
    }

    #[test]
    fn test_tolerance_relative() {
        let tol = Tolerance { abs: 0.0, rel: 1e-3 };
        assert!(tol.accepts(1000.0, 1000.5));
        assert!(!tol.accepts(1000.0, 1002.0));
    }

    #[test]
    fn test_default_tolerance_catches_small_errors_on_large_cells() {
        let tol = Tolerance::default();
        assert!(tol.accepts(5_000_000.0, 5_000_000.0));
        assert!(!tol.accepts(5_000_000.0, 5_000_001.0));
        assert!(!tol.accepts(5_000_000.0, 4_999_950.0));
        assert!(tol.accepts(19.0, 19.0005));
    }

    #[test]
    fn test_tolerance_rejects_nan() {
        let tol = Tolerance::default();
        assert!(!tol.accepts(1.0, f32::NAN));
        assert!(!tol.accepts(f32::NAN, f32::NAN));
    }

    #[test]
    fn test_compare_reports_first_mismatch() {
        let (_, _, expected) = two_by_two();
        let mut actual = expected.clone();
        actual[(1, 0)] = 42.0;
        actual[(1, 1)] = 0.0;

        let v = compare(&expected, &actual, Tolerance::default()).unwrap();
        assert!(!v.is_success());
        assert_eq!(v.mismatches, 2);
        assert_eq!(
            v.first_mismatch,
            Some(Mismatch {
                row: 1,
                col: 0,
                expected: 43.0,
                found: 42.0
            })
        );
        assert_eq!(v.max_abs_diff, 50.0);
    }

    #[test]
    fn test_compare_shape_mismatch() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(3, 2);
        assert!(compare(&a, &b, Tolerance::exact()).is_err());
    }

    #[test]
    fn test_verify_against_both_baselines() {
        let (a, b, c) = two_by_two();
        for baseline in [Baseline::Parallel, Baseline::Naive] {
            let outcome = verify_against(baseline, &a, &b, &c, Tolerance::exact())
                .unwrap()
                .into_result()
                .unwrap();
            assert_eq!(outcome.baseline, baseline);
            assert_eq!(outcome.verification.max_abs_diff, 0.0);
        }
    }

    #[test]
    fn test_verify_against_wrong_result_fails() {
        let (a, b, _) = two_by_two();
        let wrong = Matrix::filled(2, 2, 1.0);
        let err = verify_against(Baseline::Naive, &a, &b, &wrong, Tolerance::default())
            .unwrap()
            .into_result()
            .unwrap_err();
        match err {
            BenchError::VerificationFailed {
                baseline,
                mismatches,
                first,
            } => {
                assert_eq!(baseline, "naive");
                assert_eq!(mismatches, 4);
                assert_eq!(first.map(|m| (m.row, m.col)), Some((0, 0)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
