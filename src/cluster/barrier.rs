//! Full-cluster barrier.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;

/// The rendezvous points of one protocol run, in program order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Input vectors are resident in scratchpad.
    Loaded,
    /// Every core has derived its slice; entry into the timed region.
    Partitioned,
    /// Every partial result is written.
    Published,
    /// The leader finished the reduction.
    Reduced,
    /// The leader finished reporting.
    Done,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Loaded,
        Phase::Partitioned,
        Phase::Published,
        Phase::Reduced,
        Phase::Done,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded => write!(f, "loaded"),
            Self::Partitioned => write!(f, "partitioned"),
            Self::Published => write!(f, "published"),
            Self::Reduced => write!(f, "reduced"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Reusable barrier over every core of the cluster.
///
/// There is no timeout: a core that never arrives stalls the others forever.
#[derive(Debug)]
pub struct ClusterBarrier {
    inner: Barrier,
    participants: usize,
    completed: AtomicUsize,
}

impl ClusterBarrier {
    pub fn new(participants: usize) -> Self {
        Self {
            inner: Barrier::new(participants),
            participants,
            completed: AtomicUsize::new(0),
        }
    }

    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Block until all participants have called `wait`.
    pub fn wait(&self) {
        if self.inner.wait().is_leader() {
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of rendezvous completed so far.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::thread;

    #[test]
    fn test_no_core_passes_early() {
        let barrier = ClusterBarrier::new(4);
        let arrived = AtomicUsize::new(0);
        let early = AtomicBool::new(false);

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for round in 1..=3 {
                        arrived.fetch_add(1, Ordering::SeqCst);
                        barrier.wait();
                        if arrived.load(Ordering::SeqCst) < round * 4 {
                            early.store(true, Ordering::SeqCst);
                        }
                        barrier.wait();
                    }
                });
            }
        });

        assert!(!early.load(Ordering::SeqCst));
        assert_eq!(barrier.completed(), 6);
    }

    #[test]
    fn test_single_participant() {
        let barrier = ClusterBarrier::new(1);
        barrier.wait();
        barrier.wait();
        assert_eq!(barrier.completed(), 2);
        assert_eq!(barrier.participants(), 1);
    }

    #[test]
    fn test_phase_order() {
        assert!(Phase::ALL.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Phase::Published.to_string(), "published");
    }
}
