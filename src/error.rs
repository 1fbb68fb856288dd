//! Error types for cluster-fdotp

use thiserror::Error;

use crate::orchestrator::report::RunReport;

/// Result type alias for cluster-fdotp operations
pub type Result<T> = std::result::Result<T, FdotpError>;

/// Exit code returned by the binary when the reduced result misses the golden value.
pub const MISMATCH_EXIT_CODE: u8 = 255;

/// Exit code for configuration and dataset errors.
pub const CONFIG_EXIT_CODE: u8 = 2;

/// Main error type for cluster-fdotp
#[derive(Error, Debug)]
pub enum FdotpError {
    /// Reduced result differs from the golden reference by more than the threshold
    #[error("Result = {got:.6}, Golden = {want:.6}")]
    ResultMismatch {
        /// Reduced scalar
        got: f64,
        /// Golden reference
        want: f64,
        /// Full report of the run, so timing can still be shown
        report: Box<RunReport>,
    },

    /// Vector length does not split evenly across the cores
    #[error("vector length {m} is not divisible by core count {num_cores}")]
    IndivisibleLength {
        /// Vector length
        m: usize,
        /// Participating cores
        num_cores: usize,
    },

    /// Zero-length input vectors
    #[error("input vectors are empty")]
    EmptyVector,

    /// Input vectors of different lengths
    #[error("length mismatch: a has {a} elements, b has {b}")]
    LengthMismatch {
        /// Length of A
        a: usize,
        /// Length of B
        b: usize,
    },

    /// Invalid configuration parameter
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Two cores' shifted ranges overlap in the padded layout
    #[error("cores {first} and {second} overlap in the padded layout")]
    OverlappingPartition {
        /// Lower-addressed core
        first: usize,
        /// Core whose range starts inside `first`'s
        second: usize,
    },

    /// Scratchpad cannot hold the requested region
    #[error("scratchpad exhausted: requested {requested} bytes, {available} available")]
    OutOfScratchpad {
        /// Bytes requested
        requested: usize,
        /// Bytes left
        available: usize,
    },

    /// No kernel variant with this name in the current build
    #[error("unknown kernel variant '{0}'")]
    UnknownKernel(String),

    /// Block transfer failed
    #[error("DMA error: {0}")]
    Dma(String),

    /// A core broke the barrier protocol
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// A worker thread panicked
    #[error("core {0} panicked")]
    CorePanicked(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset parse error
    #[error("dataset parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FdotpError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            FdotpError::ResultMismatch { .. } => MISMATCH_EXIT_CODE,
            FdotpError::IndivisibleLength { .. }
            | FdotpError::EmptyVector
            | FdotpError::LengthMismatch { .. }
            | FdotpError::Config(_)
            | FdotpError::OverlappingPartition { .. }
            | FdotpError::OutOfScratchpad { .. }
            | FdotpError::UnknownKernel(_)
            | FdotpError::Io(_)
            | FdotpError::Json(_) => CONFIG_EXIT_CODE,
            FdotpError::Dma(_) | FdotpError::Protocol(_) | FdotpError::CorePanicked(_) => 1,
        }
    }

    /// The run report carried by a result mismatch, if any.
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            FdotpError::ResultMismatch { report, .. } => Some(report),
            _ => None,
        }
    }

    pub(crate) fn report_mut(&mut self) -> Option<&mut RunReport> {
        match self {
            FdotpError::ResultMismatch { report, .. } => Some(report),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(FdotpError::EmptyVector.exit_code(), CONFIG_EXIT_CODE);
        assert_eq!(
            FdotpError::IndivisibleLength { m: 5, num_cores: 2 }.exit_code(),
            CONFIG_EXIT_CODE
        );
        assert_eq!(FdotpError::Protocol("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_indivisible_message() {
        let e = FdotpError::IndivisibleLength { m: 10, num_cores: 4 };
        assert_eq!(
            e.to_string(),
            "vector length 10 is not divisible by core count 4"
        );
    }
}
