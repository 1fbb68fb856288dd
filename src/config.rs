//! Run configuration and its validation.

use crate::cluster::scratchpad::{self, Scratchpad};
use crate::error::{FdotpError, Result};
use crate::math::dot_product::{self, DotProductFn, REFERENCE_VARIANT};
use crate::orchestrator::partition::{OffsetTable, Partition};
use crate::orchestrator::report::GOLDEN_THRESHOLD;
use crate::utils::VariantInfo;

/// Cores in the default cluster.
pub const DEFAULT_NUM_CORES: usize = 2;

/// FPUs per core in the default cluster.
pub const DEFAULT_FPUS_PER_CORE: usize = 4;

/// Parameters of one protocol run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Participating cores, fixed for the run.
    pub num_cores: usize,
    /// FPUs per core; sets the peak used for utilization.
    pub fpus_per_core: usize,
    /// Per-core start offsets in the padded buffers.
    pub offsets: OffsetTable,
    /// Allowed absolute error against the golden value.
    pub threshold: f64,
    /// Kernel variant name.
    pub kernel: String,
    /// Scratchpad capacity in bytes.
    pub scratchpad_bytes: usize,
    /// Pin each worker thread to its own host CPU.
    pub pin_cores: bool,
    /// Record barrier and slot events into the report.
    pub record_trace: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_cores: DEFAULT_NUM_CORES,
            fpus_per_core: DEFAULT_FPUS_PER_CORE,
            offsets: OffsetTable::new(),
            threshold: GOLDEN_THRESHOLD,
            kernel: REFERENCE_VARIANT.to_string(),
            scratchpad_bytes: scratchpad::DEFAULT_CAPACITY_BYTES,
            pin_cores: false,
            record_trace: false,
        }
    }
}

impl RunConfig {
    pub fn new(num_cores: usize) -> Self {
        Self {
            num_cores,
            ..Self::default()
        }
    }

    pub fn with_fpus_per_core(mut self, fpus: usize) -> Self {
        self.fpus_per_core = fpus;
        self
    }

    /// Shift `core`'s slice by `elements` in the padded buffers.
    pub fn with_padding(mut self, core: usize, elements: usize) -> Self {
        self.offsets = self.offsets.with(core, elements);
        self
    }

    pub fn with_offsets(mut self, offsets: OffsetTable) -> Self {
        self.offsets = offsets;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_kernel(mut self, name: impl Into<String>) -> Self {
        self.kernel = name.into();
        self
    }

    pub fn with_scratchpad_bytes(mut self, bytes: usize) -> Self {
        self.scratchpad_bytes = bytes;
        self
    }

    pub fn with_pinning(mut self, pin: bool) -> Self {
        self.pin_cores = pin;
        self
    }

    pub fn with_trace(mut self, record: bool) -> Self {
        self.record_trace = record;
        self
    }

    /// Resolve the configured kernel.
    pub fn kernel_variant(&self) -> Result<VariantInfo<DotProductFn>> {
        dot_product::find_variant(&self.kernel)
            .ok_or_else(|| FdotpError::UnknownKernel(self.kernel.clone()))
    }

    /// Check every precondition for a run over `m` elements.
    ///
    /// Nothing is started until this passes, so no worker can stall at a
    /// barrier because of bad input.
    pub fn validate(&self, m: usize) -> Result<Partition> {
        if self.fpus_per_core == 0 {
            return Err(FdotpError::Config("fpus_per_core must be > 0".into()));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(FdotpError::Config(format!(
                "threshold must be finite and non-negative, got {}",
                self.threshold
            )));
        }
        self.kernel_variant()?;

        let partition = Partition::new(m, self.num_cores, self.offsets.clone())?;

        let total = partition.total_elements();
        let required = Scratchpad::bytes_for(&[total, total, self.num_cores]).ok_or_else(|| {
            FdotpError::Config(format!("{total} elements overflow the address space"))
        })?;
        if required > self.scratchpad_bytes {
            return Err(FdotpError::OutOfScratchpad {
                requested: required,
                available: self.scratchpad_bytes,
            });
        }

        Ok(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let p = RunConfig::default().validate(4096).unwrap();
        assert_eq!(p.num_cores(), 2);
        assert_eq!(p.dim(), 2048);
    }

    #[test]
    fn test_builder() {
        let cfg = RunConfig::new(4)
            .with_fpus_per_core(2)
            .with_padding(3, 8)
            .with_kernel("scalar_opt")
            .with_trace(true);
        assert_eq!(cfg.num_cores, 4);
        assert_eq!(cfg.offsets.get(3), 8);
        assert_eq!(cfg.kernel_variant().unwrap().name, "scalar_opt");
        assert!(cfg.record_trace);
    }

    #[test]
    fn test_rejects_zero_fpus() {
        assert!(matches!(
            RunConfig::default().with_fpus_per_core(0).validate(4),
            Err(FdotpError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_bad_threshold() {
        for t in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(RunConfig::default().with_threshold(t).validate(4).is_err());
        }
    }

    #[test]
    fn test_rejects_unknown_kernel() {
        assert!(matches!(
            RunConfig::default().with_kernel("bogus").validate(4),
            Err(FdotpError::UnknownKernel(name)) if name == "bogus"
        ));
    }

    #[test]
    fn test_rejects_indivisible_length() {
        assert!(matches!(
            RunConfig::new(3).validate(10),
            Err(FdotpError::IndivisibleLength { m: 10, num_cores: 3 })
        ));
    }

    #[test]
    fn test_rejects_overflowing_padding() {
        assert!(matches!(
            RunConfig::new(2).with_padding(1, usize::MAX - 1).validate(4),
            Err(FdotpError::Config(_))
        ));
    }

    #[test]
    fn test_scratchpad_fit() {
        // 2 * 8 + 2 doubles = 144 bytes
        let cfg = RunConfig::default().with_scratchpad_bytes(144);
        assert!(cfg.validate(8).is_ok());
        assert!(matches!(
            cfg.with_padding(1, 1).validate(8),
            Err(FdotpError::OutOfScratchpad {
                requested: 160,
                available: 144
            })
        ));
    }
}
