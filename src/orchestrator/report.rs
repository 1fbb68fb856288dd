//! Performance metrics and result validation.

use std::fmt;

use crate::cluster::TraceEvent;
use crate::error::{FdotpError, Result};

/// Absolute error allowed between the reduced result and the golden value.
pub const GOLDEN_THRESHOLD: f64 = 1e-5;

/// Floating-point operations per element: one multiply, one add.
pub const FLOPS_PER_ELEMENT: u64 = 2;

/// Whether `got` misses `want` by more than `threshold`.
///
/// A NaN on either side is always a mismatch.
#[inline]
pub fn fp_mismatch(got: f64, want: f64, threshold: f64) -> bool {
    !((got - want).abs() <= threshold)
}

/// Throughput figures for one timed region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Metrics {
    /// Elapsed cycles, never below 1.
    pub cycles: u64,
    /// Operations per 1000 cycles.
    pub performance: u64,
    /// Per-mille of the cluster's peak FPU throughput.
    pub utilization: u64,
}

impl Metrics {
    /// Derive throughput for `m` elements processed in `cycles`.
    ///
    /// A zero-length measurement is clamped to one cycle.
    pub fn derive(m: usize, cycles: u64, num_cores: usize, fpus_per_core: usize) -> Self {
        let cycles = cycles.max(1);
        let performance = 1000 * FLOPS_PER_ELEMENT * m as u64 / cycles;
        let peak = (FLOPS_PER_ELEMENT * num_cores as u64 * fpus_per_core as u64).max(1);
        Self {
            cycles,
            performance,
            utilization: performance / peak,
        }
    }
}

/// Everything the leader knows at the end of a run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Vector length.
    pub m: usize,
    pub num_cores: usize,
    /// Kernel variant used on every core.
    pub kernel: &'static str,
    pub metrics: Metrics,
    /// Partial sum of each core, in core order.
    pub partials: Vec<f64>,
    /// Reduced scalar.
    pub result: f64,
    /// Golden reference.
    pub golden: f64,
    /// Ordered barrier and slot events, when tracing was enabled.
    pub trace: Option<Vec<TraceEvent>>,
}

impl RunReport {
    /// Check the result against the golden value.
    pub fn check(&self, threshold: f64) -> Result<()> {
        if fp_mismatch(self.result, self.golden, threshold) {
            return Err(FdotpError::ResultMismatch {
                got: self.result,
                want: self.golden,
                report: Box::new(self.clone()),
            });
        }
        Ok(())
    }

    /// The report consumed into a verdict.
    pub fn into_verdict(self, threshold: f64) -> Result<Self> {
        self.check(threshold).map(|()| self)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----- ({}) dp fdotp -----", self.m)?;
        writeln!(f, "The execution took {} cycles.", self.metrics.cycles)?;
        write!(
            f,
            "The performance is {} OP/1000cycle ({}%o utilization).",
            self.metrics.performance, self.metrics.utilization
        )
    }
}
