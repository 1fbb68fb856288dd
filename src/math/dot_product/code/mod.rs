//! Local dot-product kernels.
//!
//! Every variant has the signature [`DotProductFn`] so the orchestrator can
//! swap them without knowing how they are implemented.

#[cfg(c_kernel_active)]
mod c_impl;
mod original;
mod scalar_opt;
#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
mod x86_64_avx2;
#[cfg(target_arch = "x86_64")]
mod x86_64_sse2;

#[cfg(c_kernel_active)]
pub use c_impl::{fdotp_c_original, fdotp_c_unrolled};
pub use original::fdotp_original;
pub use scalar_opt::fdotp_scalar_opt;
#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
pub use x86_64_avx2::fdotp_x86_64_avx2;
#[cfg(target_arch = "x86_64")]
pub use x86_64_sse2::fdotp_x86_64_sse2;

use crate::utils::VariantInfo;

/// Signature shared by every kernel: two equal-length slices in, one scalar out.
pub type DotProductFn = fn(&[f64], &[f64]) -> f64;

/// Name of the reference variant.
pub const REFERENCE_VARIANT: &str = "original";

/// Whether the C kernels were compiled in.
pub const C_KERNELS_AVAILABLE: bool = cfg!(c_kernel_active);

/// Get all available variants for the current build target.
pub fn available_variants() -> Vec<VariantInfo<DotProductFn>> {
    let mut variants: Vec<VariantInfo<DotProductFn>> = vec![
        VariantInfo {
            name: REFERENCE_VARIANT,
            description: "Sequential multiply-accumulate reference",
            function: fdotp_original,
        },
        VariantInfo {
            name: "scalar_opt",
            description: "Scalar loop with four accumulators",
            function: fdotp_scalar_opt,
        },
    ];

    #[cfg(target_arch = "x86_64")]
    variants.push(VariantInfo {
        name: "x86_64-sse2",
        description: "x86_64 SSE2 packed doubles",
        function: fdotp_x86_64_sse2,
    });

    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    variants.push(VariantInfo {
        name: "x86_64-avx2",
        description: "x86_64 AVX2 packed doubles",
        function: fdotp_x86_64_avx2,
    });

    #[cfg(c_kernel_active)]
    {
        variants.push(VariantInfo {
            name: "c-original",
            description: "C reference loop",
            function: fdotp_c_original,
        });
        variants.push(VariantInfo {
            name: "c-unrolled",
            description: "C loop with four accumulators",
            function: fdotp_c_unrolled,
        });
    }

    variants
}

/// Look up a variant by name.
pub fn find_variant(name: &str) -> Option<VariantInfo<DotProductFn>> {
    available_variants().into_iter().find(|v| v.name == name)
}
