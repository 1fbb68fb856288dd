//! FFI bindings for the C kernels compiled by `build.rs`.

mod ffi {
    use std::os::raw::c_double;

    extern "C" {
        pub fn fdotp_c_original(a: *const c_double, b: *const c_double, len: usize) -> c_double;
        pub fn fdotp_c_unrolled(a: *const c_double, b: *const c_double, len: usize) -> c_double;
    }
}

/// C reference loop.
pub fn fdotp_c_original(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "Vectors must have the same length");
    // SAFETY: both pointers are valid for `a.len()` reads and the C side
    // only reads.
    unsafe { ffi::fdotp_c_original(a.as_ptr(), b.as_ptr(), a.len()) }
}

/// C loop with four accumulators.
pub fn fdotp_c_unrolled(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "Vectors must have the same length");
    // SAFETY: as above.
    unsafe { ffi::fdotp_c_unrolled(a.as_ptr(), b.as_ptr(), a.len()) }
}
