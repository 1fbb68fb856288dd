//! # cluster-fdotp
//!
//! Double-precision dot product of two vectors split across a fixed cluster
//! of worker cores that share a scratchpad. The leader core loads the inputs,
//! every core reduces its own slice with a local kernel, and the leader
//! combines the partial sums, times the parallel region and checks the result
//! against a golden value.
//!
//! ```
//! use cluster_fdotp::prelude::*;
//!
//! let data = Dataset::new(vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0], 70.0).unwrap();
//! let report = run(&data, &RunConfig::new(2)).unwrap();
//! assert_eq!(report.result, 70.0);
//! ```

pub mod cluster;
pub mod config;
pub mod dataset;
pub mod error;
pub mod math;
pub mod orchestrator;
pub mod utils;

pub use error::{FdotpError, Result};

/// Re-export commonly used items
pub mod prelude {
    pub use crate::config::RunConfig;
    pub use crate::dataset::Dataset;
    pub use crate::error::{FdotpError, Result};
    pub use crate::orchestrator::{
        run, run_repeated, run_with, OffsetTable, Partition, RunReport, GOLDEN_THRESHOLD,
    };
}
