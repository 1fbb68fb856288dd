//! Benchmark input: two vectors and the golden dot product.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{FdotpError, Result};
use crate::math::dot_product::fdotp_original;

/// Input vectors `a`, `b` of equal length and the expected result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatasetFile", into = "DatasetFile")]
pub struct Dataset {
    a: Vec<f64>,
    b: Vec<f64>,
    golden: f64,
}

/// On-disk layout: `{"m": 4, "a": [...], "b": [...], "golden_result": 70.0}`.
#[derive(Serialize, Deserialize)]
struct DatasetFile {
    m: usize,
    a: Vec<f64>,
    b: Vec<f64>,
    golden_result: f64,
}

impl TryFrom<DatasetFile> for Dataset {
    type Error = FdotpError;

    fn try_from(file: DatasetFile) -> Result<Self> {
        if file.a.len() != file.m {
            return Err(FdotpError::Config(format!(
                "dataset declares m = {} but a has {} elements",
                file.m,
                file.a.len()
            )));
        }
        Dataset::new(file.a, file.b, file.golden_result)
    }
}

impl From<Dataset> for DatasetFile {
    fn from(d: Dataset) -> Self {
        Self {
            m: d.a.len(),
            a: d.a,
            b: d.b,
            golden_result: d.golden,
        }
    }
}

impl Dataset {
    /// Build a dataset; `a` and `b` must have the same length.
    pub fn new(a: Vec<f64>, b: Vec<f64>, golden: f64) -> Result<Self> {
        if a.len() != b.len() {
            return Err(FdotpError::LengthMismatch {
                a: a.len(),
                b: b.len(),
            });
        }
        Ok(Self { a, b, golden })
    }

    /// Reproducible random vectors in [-1, 1) with the sequential dot product
    /// as golden value.
    pub fn random(m: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let a: Vec<f64> = (0..m).map(|_| rng.random_range(-1.0..1.0)).collect();
        let b: Vec<f64> = (0..m).map(|_| rng.random_range(-1.0..1.0)).collect();
        let golden = fdotp_original(&a, &b);
        Self { a, b, golden }
    }

    /// Parse the JSON layout.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load the JSON layout from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to the JSON layout.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace the golden value.
    pub fn with_golden(mut self, golden: f64) -> Self {
        self.golden = golden;
        self
    }

    /// Vector length `M`.
    pub fn m(&self) -> usize {
        self.a.len()
    }

    pub fn a(&self) -> &[f64] {
        &self.a
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    pub fn golden(&self) -> f64 {
        self.golden
    }
}
