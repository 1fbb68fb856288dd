//! Static partitioning of the vectors across cores.
//!
//! Core `k` owns the home segment `[k * dim, (k + 1) * dim)` of the logical
//! vector. In scratchpad the segment may sit `offset[k]` elements further up,
//! which lets one core's data avoid a bank conflict with its neighbour. The
//! backing image is laid out the same way, so the shift cancels and every core
//! still reads exactly its home segment.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::{FdotpError, Result};

/// Per-core start offsets, in elements. Cores without an entry use 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OffsetTable {
    offsets: BTreeMap<usize, usize>,
}

impl OffsetTable {
    /// Table with every offset at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with a single shifted core.
    pub fn single(core: usize, elements: usize) -> Self {
        Self::new().with(core, elements)
    }

    /// Set the offset of `core`. A zero offset removes the entry.
    pub fn with(mut self, core: usize, elements: usize) -> Self {
        if elements == 0 {
            self.offsets.remove(&core);
        } else {
            self.offsets.insert(core, elements);
        }
        self
    }

    /// Offset of `core`.
    pub fn get(&self, core: usize) -> usize {
        self.offsets.get(&core).copied().unwrap_or(0)
    }

    /// Padding reserved at the end of each buffer: the largest offset.
    pub fn padding(&self) -> usize {
        self.offsets.values().copied().max().unwrap_or(0)
    }

    /// Highest core index with an entry.
    pub fn max_core(&self) -> Option<usize> {
        self.offsets.keys().next_back().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// `(core, offset)` pairs in core order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.offsets.iter().map(|(&c, &o)| (c, o))
    }
}

/// A validated mapping from core index to scratchpad range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    m: usize,
    num_cores: usize,
    dim: usize,
    offsets: OffsetTable,
}

impl Partition {
    /// Partition `m` elements over `num_cores` cores.
    ///
    /// Rejects empty vectors, lengths that do not divide evenly, offsets for
    /// cores outside the cluster or past the address space, and offsets that
    /// make two ranges overlap.
    pub fn new(m: usize, num_cores: usize, offsets: OffsetTable) -> Result<Self> {
        if num_cores == 0 {
            return Err(FdotpError::Config("num_cores must be > 0".into()));
        }
        if m == 0 {
            return Err(FdotpError::EmptyVector);
        }
        if m % num_cores != 0 {
            return Err(FdotpError::IndivisibleLength { m, num_cores });
        }
        if let Some(core) = offsets.max_core().filter(|&c| c >= num_cores) {
            return Err(FdotpError::Config(format!(
                "offset given for core {core}, but the cluster has {num_cores} cores"
            )));
        }
        // Every shifted range ends at or below M + padding
        if m.checked_add(offsets.padding()).is_none() {
            return Err(FdotpError::Config(format!(
                "padding of {} elements overflows a buffer of {m}",
                offsets.padding()
            )));
        }

        let partition = Self {
            m,
            num_cores,
            dim: m / num_cores,
            offsets,
        };
        partition.check_disjoint()?;
        Ok(partition)
    }

    fn check_disjoint(&self) -> Result<()> {
        let mut ranges: Vec<(usize, Range<usize>)> =
            (0..self.num_cores).map(|c| (c, self.range(c))).collect();
        ranges.sort_by_key(|(_, r)| r.start);

        for pair in ranges.windows(2) {
            let (first, lo) = &pair[0];
            let (second, hi) = &pair[1];
            if lo.end > hi.start {
                return Err(FdotpError::OverlappingPartition {
                    first: *first,
                    second: *second,
                });
            }
        }
        Ok(())
    }

    /// Logical vector length.
    pub fn len(&self) -> usize {
        self.m
    }

    pub fn is_empty(&self) -> bool {
        self.m == 0
    }

    pub fn num_cores(&self) -> usize {
        self.num_cores
    }

    /// Elements per core.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    pub fn padding(&self) -> usize {
        self.offsets.padding()
    }

    /// Elements per scratchpad buffer: `M + padding`.
    pub fn total_elements(&self) -> usize {
        self.m + self.padding()
    }

    /// Unshifted range of `cid` in the logical vector.
    pub fn home_range(&self, cid: usize) -> Range<usize> {
        let start = self.dim * cid;
        start..start + self.dim
    }

    /// Range of `cid` in the padded scratchpad buffers.
    pub fn range(&self, cid: usize) -> Range<usize> {
        let start = self.dim * cid + self.offsets.get(cid);
        start..start + self.dim
    }

    /// Build the padded backing image of `src`.
    ///
    /// Each home segment is copied to its shifted range, unused elements are
    /// zero. `src` must hold exactly `M` elements.
    pub fn pad_image(&self, src: &[f64]) -> Result<Vec<f64>> {
        if src.len() != self.m {
            return Err(FdotpError::LengthMismatch {
                a: src.len(),
                b: self.m,
            });
        }

        let mut image = vec![0.0; self.total_elements()];
        for cid in 0..self.num_cores {
            image[self.range(cid)].copy_from_slice(&src[self.home_range(cid)]);
        }
        Ok(image)
    }
}
