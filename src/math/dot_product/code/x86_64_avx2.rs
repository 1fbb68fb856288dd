//! x86_64 AVX2 implementation.
//!
//! Four f64 lanes per 256-bit register, with FMA when the target has it.
//! Only compiled when the crate is built with AVX2 enabled
//! (e.g. `RUSTFLAGS="-C target-cpu=native"`).

use std::arch::x86_64::*;

/// Compute the dot product using AVX2 instructions.
///
/// # Panics
/// Panics if the slices have different lengths.
pub fn fdotp_x86_64_avx2(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "Vectors must have the same length");

    let len = a.len();
    if len < 4 {
        return super::fdotp_original(a, b);
    }

    let chunks = len / 4;

    // SAFETY: this module is only compiled with target_feature = "avx2" and
    // every load stays below `chunks * 4 <= len`.
    let mut result = unsafe {
        let mut acc = _mm256_setzero_pd();
        for i in 0..chunks {
            let idx = i * 4;
            let va = _mm256_loadu_pd(a.as_ptr().add(idx));
            let vb = _mm256_loadu_pd(b.as_ptr().add(idx));

            #[cfg(target_feature = "fma")]
            {
                acc = _mm256_fmadd_pd(va, vb, acc);
            }
            #[cfg(not(target_feature = "fma"))]
            {
                acc = _mm256_add_pd(acc, _mm256_mul_pd(va, vb));
            }
        }

        // [a, b, c, d] -> [a+c, b+d] -> a+c+b+d
        let hi = _mm256_extractf128_pd(acc, 1);
        let lo = _mm256_castpd256_pd128(acc);
        let pair = _mm_add_pd(lo, hi);
        let upper = _mm_unpackhi_pd(pair, pair);
        _mm_cvtsd_f64(_mm_add_sd(pair, upper))
    };

    let base = chunks * 4;
    for i in base..len {
        result += a[i] * b[i];
    }
    result
}
