//! Cluster platform: the capabilities the orchestrator runs on.
//!
//! A fixed set of symmetric worker threads, one per core, started together
//! and joined together. No work queue and no dynamic spawning: every worker
//! runs the same body and picks its role from its core index.

pub mod barrier;
pub mod dma;
pub mod scratchpad;
pub mod trace;

pub use barrier::{ClusterBarrier, Phase};
pub use dma::DmaEngine;
pub use scratchpad::{Region, Scratchpad};
pub use trace::{EventLog, KernelMarker, NoopMarker, TraceEvent, TraceKind, TraceMarker};

use std::thread;

use tracing::{trace, warn};

use crate::error::{FdotpError, Result};
use crate::utils::cpu_affinity::{self, CpuPinGuard};

/// Index of the core that performs setup, reduction and reporting.
pub const LEADER: usize = 0;

/// Whether `cid` is the leader core.
#[inline]
pub fn is_leader(cid: usize) -> bool {
    cid == LEADER
}

/// Run `body(cid)` on `num_cores` workers and collect the results in core order.
///
/// With `pin` set, worker `cid` is pinned to host CPU `cid` (modulo the number
/// of online CPUs) for its whole lifetime.
pub fn launch<F, R>(num_cores: usize, pin: bool, body: F) -> Result<Vec<R>>
where
    F: Fn(usize) -> R + Sync,
    R: Send,
{
    let host_cores = if pin {
        cpu_affinity::get_core_ids().unwrap_or_default()
    } else {
        Vec::new()
    };
    if pin && host_cores.is_empty() {
        warn!("cpu pinning requested but no core ids are available");
    }

    thread::scope(|s| {
        let handles: Vec<_> = (0..num_cores)
            .map(|cid| {
                let body = &body;
                let host = (!host_cores.is_empty()).then(|| host_cores[cid % host_cores.len()]);
                s.spawn(move || {
                    let _pin = host.map(CpuPinGuard::with_core);
                    trace!(cid, host_cpu = ?host, "core up");
                    body(cid)
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(cid, h)| h.join().map_err(|_| FdotpError::CorePanicked(cid)))
            .collect()
    })
}
