//! Tests for the local dot-product kernels.

use crate::math::dot_product::*;

const EPSILON: f64 = 1e-12;

fn assert_close(got: f64, want: f64, msg: &str) {
    let diff = (got - want).abs();
    assert!(
        diff < EPSILON,
        "{}: expected {}, got {}, diff = {}",
        msg,
        want,
        got,
        diff
    );
}

#[test]
fn test_original_basic() {
    let a = [1.0, 2.0, 3.0, 4.0];
    let b = [5.0, 6.0, 7.0, 8.0];
    // 5 + 12 + 21 + 32
    assert_close(fdotp_original(&a, &b), 70.0, "original basic");
}

#[test]
fn test_original_empty() {
    let a: [f64; 0] = [];
    let b: [f64; 0] = [];
    assert_close(fdotp_original(&a, &b), 0.0, "original empty");
}

#[test]
fn test_original_single() {
    assert_close(fdotp_original(&[3.0], &[4.0]), 12.0, "original single");
}

#[test]
#[should_panic(expected = "same length")]
fn test_original_rejects_length_mismatch() {
    fdotp_original(&[1.0, 2.0], &[1.0]);
}

#[test]
fn test_every_variant_small_lengths() {
    // Lengths below and around every unroll width
    for len in 0..=9 {
        let a: Vec<f64> = (0..len).map(|i| i as f64 + 1.0).collect();
        let b: Vec<f64> = (0..len).map(|i| 0.5 * i as f64).collect();
        let want = fdotp_original(&a, &b);
        for variant in available_variants() {
            assert_close((variant.function)(&a, &b), want, variant.name);
        }
    }
}

#[test]
fn test_verify_variants_passes() {
    verify_variants().unwrap();
}

#[test]
fn test_find_variant() {
    assert!(find_variant(REFERENCE_VARIANT).is_some());
    assert!(find_variant("scalar_opt").is_some());
    assert!(find_variant("no-such-kernel").is_none());
    #[cfg(target_arch = "x86_64")]
    assert!(find_variant("x86_64-sse2").is_some());
}

#[test]
fn test_variant_names_unique() {
    let variants = available_variants();
    for (i, v) in variants.iter().enumerate() {
        assert!(
            variants[i + 1..].iter().all(|w| w.name != v.name),
            "duplicate variant {}",
            v.name
        );
    }
}
