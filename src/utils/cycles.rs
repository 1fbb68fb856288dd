//! Cycle counter for timing the parallel region.
//!
//! With the default `cpu_cycles` feature this reads the architecture's
//! free-running counter. With `use_time`, or on targets without a supported
//! counter, it falls back to monotonic nanoseconds since first use.

/// Monotonic counter sampled around the timed region.
pub trait CycleCounter: Sync {
    fn now(&self) -> u64;
}

/// The host's cycle counter.
#[derive(Clone, Copy, Debug, Default)]
pub struct HardwareCounter;

impl CycleCounter for HardwareCounter {
    #[inline(always)]
    fn now(&self) -> u64 {
        read_cycles()
    }
}

/// Whether [`read_cycles`] returns real counter ticks rather than nanoseconds.
pub const HARDWARE_CYCLES: bool = cfg!(all(
    feature = "cpu_cycles",
    not(feature = "use_time"),
    any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")
));

/// Unit name for [`read_cycles`] values.
pub const fn unit_name() -> &'static str {
    if !HARDWARE_CYCLES {
        "ns"
    } else if cfg!(target_arch = "aarch64") {
        "ticks"
    } else {
        "cycles"
    }
}

/// Read the current counter value.
///
/// On x86_64: RDTSC fenced with LFENCE.
/// On aarch64: CNTVCT_EL0 (virtual timer, readable from userspace).
#[inline(always)]
pub fn read_cycles() -> u64 {
    #[cfg(all(feature = "cpu_cycles", not(feature = "use_time"), target_arch = "x86_64"))]
    {
        read_cycles_x86_64()
    }

    #[cfg(all(feature = "cpu_cycles", not(feature = "use_time"), target_arch = "x86"))]
    {
        read_cycles_x86()
    }

    #[cfg(all(feature = "cpu_cycles", not(feature = "use_time"), target_arch = "aarch64"))]
    {
        read_cycles_aarch64()
    }

    #[cfg(not(all(
        feature = "cpu_cycles",
        not(feature = "use_time"),
        any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")
    )))]
    {
        read_nanos()
    }
}

#[cfg(all(feature = "cpu_cycles", not(feature = "use_time"), target_arch = "x86_64"))]
#[inline(always)]
fn read_cycles_x86_64() -> u64 {
    use core::arch::x86_64::*;
    // SAFETY: LFENCE and RDTSC are available on every x86_64 CPU.
    unsafe {
        // Keep the read from drifting into or out of the measured code
        _mm_lfence();
        let cycles = _rdtsc();
        _mm_lfence();
        cycles
    }
}

#[cfg(all(feature = "cpu_cycles", not(feature = "use_time"), target_arch = "x86"))]
#[inline(always)]
fn read_cycles_x86() -> u64 {
    use core::arch::x86::*;
    // SAFETY: as above.
    unsafe {
        _mm_lfence();
        let cycles = _rdtsc();
        _mm_lfence();
        cycles
    }
}

#[cfg(all(feature = "cpu_cycles", not(feature = "use_time"), target_arch = "aarch64"))]
#[inline(always)]
fn read_cycles_aarch64() -> u64 {
    // Fixed-frequency timer, not core cycles, but consistent across cores
    let val: u64;
    // SAFETY: CNTVCT_EL0 is readable from EL0 on every supported OS.
    unsafe {
        core::arch::asm!("mrs {}, cntvct_el0", out(reg) val);
    }
    val
}

#[allow(dead_code)]
fn read_nanos() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}
