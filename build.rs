//! Build script to compile the C dot-product kernels.

use std::env;

fn main() {
    println!("cargo:rustc-check-cfg=cfg(c_kernel_active)");

    let probe = cc::Build::new();
    let compiler = probe.get_compiler();

    let compiler_name = if compiler.is_like_clang() {
        "Clang"
    } else if compiler.is_like_gnu() {
        "GCC"
    } else if compiler.is_like_msvc() {
        "MSVC"
    } else {
        println!("cargo:warning=C compiler is not compatible (needs GCC, Clang, or MSVC). C kernels disabled.");
        return;
    };

    let rustflags = env::var("RUSTFLAGS").unwrap_or_default();
    let encoded_rustflags = env::var("CARGO_ENCODED_RUSTFLAGS").unwrap_or_default();
    let is_rust_native =
        rustflags.contains("target-cpu=native") || encoded_rustflags.contains("target-cpu=native");

    let mut build = cc::Build::new();

    // Every kernel source under src/ goes into the same static library
    let c_files = match glob::glob("src/**/*.c") {
        Ok(paths) => paths.filter_map(|entry| entry.ok()).collect::<Vec<_>>(),
        Err(e) => {
            println!("cargo:warning=Failed to read glob pattern ({}). C kernels disabled.", e);
            return;
        }
    };
    if c_files.is_empty() {
        return;
    }

    for file in &c_files {
        println!("cargo:rerun-if-changed={}", file.display());
        build.file(file);
    }

    // Keep IEEE evaluation order (no -ffast-math)
    build.opt_level(3);

    if is_rust_native {
        build.flag_if_supported("-march=native");
    }

    if let Err(e) = build.try_compile("fdotp_c") {
        println!("cargo:warning=C kernels failed to compile ({}). C kernels disabled.", e);
        return;
    }

    println!("cargo:rustc-cfg=c_kernel_active");
    println!("cargo:rustc-env=C_COMPILER_NAME={}", compiler_name);
}
