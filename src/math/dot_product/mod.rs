//! # Local dot-product kernel
//!
//! Each core reduces its own contiguous slice:
//!
//! `dot(a, b) = Σ(a[i] * b[i])`
//!
//! The kernel is opaque to the orchestrator: it only sees a [`DotProductFn`].
//! Variants differ in accumulation order, so their results agree with the
//! reference within a small tolerance rather than bit-for-bit.

pub mod code;
#[cfg(test)]
mod test;

pub use code::*;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Absolute tolerance used when comparing variants to the reference.
pub const VERIFY_TOLERANCE: f64 = 1e-9;

/// Verify every available variant against the reference implementation.
pub fn verify_variants() -> Result<(), String> {
    let mut rng = StdRng::seed_from_u64(0x00f0_d07b);
    // Odd length exercises every remainder path
    let size = 1023;
    let a: Vec<f64> = (0..size).map(|_| rng.random_range(-1.0..1.0)).collect();
    let b: Vec<f64> = (0..size).map(|_| rng.random_range(-1.0..1.0)).collect();

    let variants = code::available_variants();
    let reference = variants
        .iter()
        .find(|v| v.name == REFERENCE_VARIANT)
        .ok_or("No 'original' variant found for reference")?;

    let expected = (reference.function)(&a, &b);

    for variant in &variants {
        if variant.name == REFERENCE_VARIANT {
            continue;
        }

        let result = (variant.function)(&a, &b);
        let diff = (result - expected).abs();
        if diff > VERIFY_TOLERANCE {
            return Err(format!(
                "Variant '{}' failed verification. Expected {}, got {}, diff {}",
                variant.name, expected, result, diff
            ));
        }
    }

    Ok(())
}
