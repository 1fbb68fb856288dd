//! Utility modules: timing, pinning and console output.

pub mod cpu_affinity;
pub mod cycles;
pub mod timer;
pub mod tui;

pub use cpu_affinity::CpuPinGuard;
pub use cycles::{read_cycles, CycleCounter, HardwareCounter};
pub use timer::{calculate_median, CycleStats};

/// C compiler name detected at build time
pub const C_COMPILER_NAME: Option<&str> = option_env!("C_COMPILER_NAME");

/// One implementation variant of a kernel.
/// Generic over F which is the function signature.
#[derive(Clone, Copy, Debug)]
pub struct VariantInfo<F> {
    /// Unique identifier for this variant (e.g., "original", "x86_64-sse2")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// The specific implementation function
    pub function: F,
}
