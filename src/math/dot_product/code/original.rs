//! Original (reference) implementation of the local dot product.
//!
//! Sequential multiply-accumulate in index order. Every other variant is
//! verified against this one.

/// Compute the dot product of two slices.
///
/// # Panics
/// Panics if the slices have different lengths.
///
/// # Example
/// ```
/// use cluster_fdotp::math::dot_product::fdotp_original;
///
/// let a = [1.0, 2.0, 3.0];
/// let b = [4.0, 5.0, 6.0];
/// assert_eq!(fdotp_original(&a, &b), 32.0);
/// ```
pub fn fdotp_original(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "Vectors must have the same length");

    a.iter().zip(b.iter()).fold(0.0, |acc, (x, y)| acc + x * y)
}
