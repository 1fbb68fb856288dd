//! Run instrumentation: dump markers and an ordered event log.

use std::sync::{Mutex, PoisonError};

use tracing::trace;

use super::barrier::Phase;

/// Marks the start and end of the region of interest for external tools.
pub trait KernelMarker: Sync {
    fn start(&self);
    fn stop(&self);
}

/// Marker that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMarker;

impl KernelMarker for NoopMarker {
    fn start(&self) {}
    fn stop(&self) {}
}

/// Marker that emits `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceMarker;

impl KernelMarker for TraceMarker {
    fn start(&self) {
        trace!("kernel start");
    }

    fn stop(&self) {
        trace!("kernel stop");
    }
}

/// What happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceKind {
    /// Core reached a barrier.
    Arrive(Phase),
    /// Core left a barrier.
    Depart(Phase),
    /// Core wrote a partial-result slot.
    SlotWrite { slot: usize },
    /// Core read a partial-result slot.
    SlotRead { slot: usize },
}

/// One entry of the log. `seq` gives a total order over all cores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceEvent {
    pub seq: u64,
    pub cid: usize,
    pub kind: TraceKind,
}

/// Append-only event log shared by every core.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<TraceEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Sequence numbers are assigned under the lock.
    pub fn record(&self, cid: usize, kind: TraceKind) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = events.len() as u64;
        events.push(TraceEvent { seq, cid, kind });
    }

    /// All events in sequence order.
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sequence number of the first event of `cid` matching `kind`.
pub fn find_seq(events: &[TraceEvent], cid: usize, kind: TraceKind) -> Option<u64> {
    events
        .iter()
        .find(|e| e.cid == cid && e.kind == kind)
        .map(|e| e.seq)
}
