//! x86_64 SSE2 implementation.
//!
//! SSE2 is part of the x86_64 baseline, so this variant is always present on
//! that architecture. Two f64 lanes per 128-bit register.

use std::arch::x86_64::*;

/// Compute the dot product using SSE2 packed-double instructions.
///
/// # Panics
/// Panics if the slices have different lengths.
pub fn fdotp_x86_64_sse2(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "Vectors must have the same length");

    let len = a.len();
    let chunks = len / 2;

    // SAFETY: SSE2 is guaranteed on x86_64 and every load stays below
    // `chunks * 2 <= len` for both slices.
    let mut result = unsafe {
        let mut acc = _mm_setzero_pd();
        for i in 0..chunks {
            let idx = i * 2;
            let va = _mm_loadu_pd(a.as_ptr().add(idx));
            let vb = _mm_loadu_pd(b.as_ptr().add(idx));
            acc = _mm_add_pd(acc, _mm_mul_pd(va, vb));
        }
        // [lo, hi] -> lo + hi
        let hi = _mm_unpackhi_pd(acc, acc);
        _mm_cvtsd_f64(_mm_add_sd(acc, hi))
    };

    if len % 2 == 1 {
        result += a[len - 1] * b[len - 1];
    }
    result
}
