//! Bump allocator for the cluster's shared L1 scratchpad.
//!
//! Regions live for the whole run; there is no free. Each [`Region`] owns its
//! storage, so whoever holds it has exclusive access, and the block-transfer
//! engine can take it by value while a copy is in flight.

use crate::error::{FdotpError, Result};

/// Default scratchpad capacity (128 KiB).
pub const DEFAULT_CAPACITY_BYTES: usize = 128 * 1024;

const WORD_BYTES: usize = std::mem::size_of::<f64>();

/// A contiguous run of doubles carved out of the scratchpad.
#[derive(Debug)]
pub struct Region {
    base: usize,
    data: Vec<f64>,
}

impl Region {
    /// Byte offset of the region within the scratchpad.
    pub fn base(&self) -> usize {
        self.base
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Process-lifetime arena; allocation only moves the watermark up.
#[derive(Debug)]
pub struct Scratchpad {
    capacity: usize,
    used: usize,
}

impl Scratchpad {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity: capacity_bytes,
            used: 0,
        }
    }

    /// Bytes needed for regions of the given element counts.
    pub fn bytes_for(elements: &[usize]) -> Option<usize> {
        elements
            .iter()
            .try_fold(0usize, |acc, &n| acc.checked_add(n.checked_mul(WORD_BYTES)?))
    }

    /// Allocate `elements` zeroed doubles.
    pub fn allocate(&mut self, elements: usize) -> Result<Region> {
        let available = self.remaining();
        let requested = elements
            .checked_mul(WORD_BYTES)
            .filter(|&bytes| bytes <= available)
            .ok_or(FdotpError::OutOfScratchpad {
                requested: elements.saturating_mul(WORD_BYTES),
                available,
            })?;

        let base = self.used;
        self.used += requested;
        Ok(Region {
            base,
            data: vec![0.0; elements],
        })
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity
    }

    pub fn used_bytes(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.used
    }
}

impl Default for Scratchpad {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_BYTES)
    }
}
