//! Scalar implementation with 4x loop unrolling.

/// Compute the dot product with four independent accumulators.
///
/// Splitting the dependency chain lets the FPU pipeline overlap the adds.
/// The accumulators are combined pairwise at the end, so the rounding
/// differs slightly from [`super::fdotp_original`].
///
/// # Panics
/// Panics if the slices have different lengths.
pub fn fdotp_scalar_opt(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "Vectors must have the same length");

    let mut a_chunks = a.chunks_exact(4);
    let mut b_chunks = b.chunks_exact(4);

    let mut sum = [0.0f64; 4];
    for (ca, cb) in (&mut a_chunks).zip(&mut b_chunks) {
        sum[0] += ca[0] * cb[0];
        sum[1] += ca[1] * cb[1];
        sum[2] += ca[2] * cb[2];
        sum[3] += ca[3] * cb[3];
    }

    for (x, y) in a_chunks.remainder().iter().zip(b_chunks.remainder()) {
        sum[0] += x * y;
    }

    (sum[0] + sum[1]) + (sum[2] + sum[3])
}
