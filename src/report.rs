//! Result records, summaries and JSON export.

use crate::backend::SpatialBackend;
use crate::error::Result;
use crate::geometry::{Dimensions, Position};
use crate::kernel::Kernel;
use crate::stats::{self, TestOutcome};
use crate::tester::TestKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Significance level used when counting rejections
pub const ALPHA: f64 = 0.05;

fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Both tests on one seed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrialReport {
    pub backend: String,
    pub dimensions: usize,
    pub side_length: f64,
    pub nodes: usize,
    pub kernel: Kernel,
    pub seed: u64,
    pub connections: usize,
    pub ks: TestOutcome,
    pub z: TestOutcome,
}

impl TrialReport {
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(self, path)
    }

    pub fn summary(&self) -> String {
        format!(
            "{:8} | {}D | N:{:6} | {:11} | seed:{:6} | conn:{:6} | KS D:{:.4} p:{:.4} | Z:{:+.3} p:{:.4}",
            self.backend,
            self.dimensions,
            self.nodes,
            self.kernel.kind().name(),
            self.seed,
            self.connections,
            self.ks.statistic,
            self.ks.p_value,
            self.z.statistic,
            self.z.p_value
        )
    }
}

/// Expected and observed connections in one distance bin
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinCount {
    pub lower: f64,
    pub upper: f64,
    /// Targets whose distance falls in the bin
    pub candidates: usize,
    pub observed: usize,
    pub expected: f64,
    pub variance: f64,
    pub z: f64,
}

impl BinCount {
    pub fn empty(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            candidates: 0,
            observed: 0,
            expected: 0.0,
            variance: 0.0,
            z: 0.0,
        }
    }

    /// Compute the bin's z score once the counts are final
    pub fn finish(&mut self) {
        self.z = if self.variance > 0.0 {
            (self.observed as f64 - self.expected) / self.variance.sqrt()
        } else {
            0.0
        };
    }

    pub fn summary(&self) -> String {
        format!(
            "[{:.4}, {:.4}) | cand:{:6} | obs:{:6} | exp:{:9.1} | z:{:+.3}",
            self.lower, self.upper, self.candidates, self.observed, self.expected, self.z
        )
    }
}

/// p-values of a multi-seed series and their uniformity check
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeriesReport {
    pub backend: String,
    pub test: TestKind,
    pub control: bool,
    pub base_seed: u64,
    pub p_values: Vec<f64>,
    pub mean_p: f64,
    /// Trials with p below [`ALPHA`]
    pub rejections: usize,
    pub uniformity: TestOutcome,
}

impl SeriesReport {
    pub fn new(
        backend: &str,
        test: TestKind,
        control: bool,
        base_seed: u64,
        p_values: Vec<f64>,
        uniformity: TestOutcome,
    ) -> Self {
        let mean_p = stats::mean(&p_values);
        let rejections = p_values.iter().filter(|&&p| p < ALPHA).count();
        Self {
            backend: backend.to_string(),
            test,
            control,
            base_seed,
            p_values,
            mean_p,
            rejections,
            uniformity,
        }
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(self, path)
    }

    pub fn summary(&self) -> String {
        format!(
            "{:8} | {:2} | control:{:5} | trials:{:4} | mean p:{:.3} | p<{}: {:4} | uniformity D:{:.4} p:{:.4}",
            self.backend,
            self.test,
            self.control,
            self.p_values.len(),
            self.mean_p,
            ALPHA,
            self.rejections,
            self.uniformity.statistic,
            self.uniformity.p_value
        )
    }
}

/// Snapshot of one connected population for external plotting
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkExport {
    pub backend: String,
    pub dimensions: Dimensions,
    pub side_length: f64,
    pub max_dist: f64,
    pub kernel: Kernel,
    pub positions: Vec<Position>,
    pub distances: Vec<f64>,
    pub target_positions: Vec<Position>,
    pub target_distances: Vec<f64>,
}

impl NetworkExport {
    /// Capture the backend's current population; it must be connected
    pub fn capture<B: SpatialBackend>(backend: &B) -> Result<Self> {
        let domain = backend.domain();
        Ok(Self {
            backend: backend.name().to_string(),
            dimensions: domain.dims,
            side_length: domain.side_length,
            max_dist: domain.max_dist(),
            kernel: *backend.kernel(),
            positions: backend.positions()?,
            distances: backend.distances()?,
            target_positions: backend.target_positions()?,
            target_distances: backend.target_distances()?,
        })
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(self, path)
    }
}
