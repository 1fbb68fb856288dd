//! Block-transfer engine moving data from backing storage into scratchpad.
//!
//! `start_1d` takes the destination region by value and returns immediately;
//! the copy runs on a separate thread. `wait_all` joins every outstanding
//! transfer and hands the regions back in issue order. Until then the issuing
//! core cannot touch the destination.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::trace;

use super::scratchpad::Region;
use crate::error::{FdotpError, Result};

/// Asynchronous one-dimensional copies issued by a single core.
#[derive(Debug, Default)]
pub struct DmaEngine {
    in_flight: Vec<JoinHandle<Region>>,
    bytes_issued: usize,
}

impl DmaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the first `elements` doubles of `src` into `dst`.
    pub fn start_1d(&mut self, mut dst: Region, src: Arc<[f64]>, elements: usize) -> Result<()> {
        if elements > dst.len() || elements > src.len() {
            return Err(FdotpError::Dma(format!(
                "transfer of {} elements exceeds source ({}) or destination ({})",
                elements,
                src.len(),
                dst.len()
            )));
        }

        let bytes = elements * std::mem::size_of::<f64>();
        trace!(dst = dst.base(), bytes, "dma start");
        self.bytes_issued += bytes;
        self.in_flight.push(thread::spawn(move || {
            dst.as_mut_slice()[..elements].copy_from_slice(&src[..elements]);
            dst
        }));
        Ok(())
    }

    /// Outstanding transfers.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Total bytes issued since creation.
    pub fn bytes_issued(&self) -> usize {
        self.bytes_issued
    }

    /// Block until every outstanding transfer completes.
    pub fn wait_all(&mut self) -> Result<Vec<Region>> {
        self.in_flight
            .drain(..)
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| FdotpError::Dma("transfer thread panicked".into()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::scratchpad::Scratchpad;

    #[test]
    fn test_copies_land_in_issue_order() {
        let mut l1 = Scratchpad::new(1024);
        let a = l1.allocate(3).unwrap();
        let b = l1.allocate(3).unwrap();

        let mut dma = DmaEngine::new();
        dma.start_1d(a, Arc::from(vec![1.0, 2.0, 3.0]), 3).unwrap();
        dma.start_1d(b, Arc::from(vec![4.0, 5.0, 6.0]), 3).unwrap();
        assert_eq!(dma.pending(), 2);
        assert_eq!(dma.bytes_issued(), 48);

        let done = dma.wait_all().unwrap();
        assert_eq!(dma.pending(), 0);
        assert_eq!(done[0].as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(done[1].as_slice(), &[4.0, 5.0, 6.0]);
        assert_eq!(done[1].base(), 24);
    }

    #[test]
    fn test_partial_copy_leaves_tail_untouched() {
        let mut l1 = Scratchpad::new(1024);
        let dst = l1.allocate(4).unwrap();
        let mut dma = DmaEngine::new();
        dma.start_1d(dst, Arc::from(vec![9.0, 9.0, 9.0, 9.0]), 2).unwrap();
        let done = dma.wait_all().unwrap();
        assert_eq!(done[0].as_slice(), &[9.0, 9.0, 0.0, 0.0]);
    }

    #[test]
    fn test_oversized_transfer_rejected() {
        let mut l1 = Scratchpad::new(1024);
        let dst = l1.allocate(2).unwrap();
        let mut dma = DmaEngine::new();
        assert!(dma.start_1d(dst, Arc::from(vec![1.0; 4]), 4).is_err());
        assert_eq!(dma.pending(), 0);
    }
}
