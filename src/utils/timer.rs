//! Statistics over repeated cycle measurements.

/// Summary of cycle counts from several runs.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleStats {
    pub samples: usize,
    pub min: u64,
    pub median: u64,
    pub max: u64,
    pub mean: f64,
    pub std_dev: f64,
}

impl CycleStats {
    /// Summarise `cycles`. Returns `None` for an empty slice.
    pub fn from_samples(cycles: &[u64]) -> Option<Self> {
        if cycles.is_empty() {
            return None;
        }

        let mut sorted = cycles.to_vec();
        sorted.sort_unstable();

        let mean = cycles.iter().map(|&c| c as f64).sum::<f64>() / cycles.len() as f64;
        // Sample variance; a single run has none
        let variance = cycles
            .iter()
            .map(|&c| {
                let diff = c as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / (cycles.len() - 1).max(1) as f64;

        Some(Self {
            samples: cycles.len(),
            min: sorted[0],
            median: calculate_median(&sorted),
            max: sorted[sorted.len() - 1],
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Coefficient of variation in percent.
    pub fn cv_percent(&self) -> f64 {
        if self.mean > 0.0 {
            self.std_dev / self.mean * 100.0
        } else {
            0.0
        }
    }
}

/// Upper median of an already sorted slice.
pub fn calculate_median(sorted: &[u64]) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    sorted[sorted.len() / 2]
}
