// THEORY:
// The chi-squared distance compares two histograms bin by bin, weighting each squared
// difference by how much mass the two bins hold together:
//
//     d(A, B) = 0.5 * Σ (A_i - B_i)^2 / (A_i + B_i + ε)
//
// Bins that are empty in both histograms would divide zero by zero, so a tiny ε is
// added to every denominator. It only matters when both bins are (near) zero; for
// any bin with real mass it is lost in rounding.
//
// The result is a dissimilarity score, not a metric: it is symmetric and zero on
// identical inputs, but there is no triangle inequality.

use crate::core_modules::descriptor::BinValue;
use crate::error::{RetrievalError, RetrievalResult};

/// Added to every denominator so that two empty bins contribute 0 instead of NaN.
pub const EPSILON: BinValue = 1e-10;

pub type Distance = f64;

/// Chi-squared distance between two equal-length non-negative vectors.
pub fn chi_squared_distance(a: &[BinValue], b: &[BinValue]) -> RetrievalResult<Distance> {
    if a.len() != b.len() {
        return Err(RetrievalError::MismatchedDescriptor {
            identifier: None,
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(chi_squared_unchecked(a, b))
}

/// The accumulation loop itself. Callers must have checked the lengths.
#[inline]
pub(crate) fn chi_squared_unchecked(a: &[BinValue], b: &[BinValue]) -> Distance {
    let sum: Distance = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let difference = x - y;
            difference * difference / (x + y + EPSILON)
        })
        .sum();
    0.5 * sum
}
