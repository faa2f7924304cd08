//! Statistical acceptance tests for a connectivity backend.
//!
//! Each trial reseeds the backend, rebuilds the population and reconnects
//! it. The connection distances are then compared with the distribution
//! implied by the kernel: a KS test on their shape and a Z-test on their
//! count. In control mode the backend's connections are replaced by draws
//! from an ideal generator, so the null hypothesis holds by construction
//! and p-values should be uniform.

use crate::backend::{stream_rng, SpatialBackend};
use crate::error::{Result, SpatialError};
use crate::expected::ExpectedDistribution;
use crate::report::{BinCount, SeriesReport, TrialReport};
use crate::stats::{self, TestOutcome};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which hypothesis test to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    Ks,
    Z,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ks => f.pad("ks"),
            Self::Z => f.pad("z"),
        }
    }
}

impl FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "ks" => Ok(Self::Ks),
            "z" => Ok(Self::Z),
            other => Err(format!("unknown test '{}' (expected ks or z)", other)),
        }
    }
}

pub struct SpatialTester<B: SpatialBackend> {
    backend: B,
    expected: ExpectedDistribution,
}

impl<B: SpatialBackend> SpatialTester<B> {
    pub fn new(backend: B) -> Result<Self> {
        let expected = ExpectedDistribution::new(*backend.kernel(), *backend.domain())?;
        Ok(Self { backend, expected })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn expected(&self) -> &ExpectedDistribution {
        &self.expected
    }

    pub fn max_dist(&self) -> f64 {
        self.expected.max_dist()
    }

    /// Reseed, build and connect. Returns the applied seed.
    pub fn run_trial(&mut self, seed: Option<u64>) -> Result<u64> {
        let seed = self.backend.reset(seed);
        self.backend.build()?;
        self.backend.connect()?;
        Ok(seed)
    }

    fn sampler(&self) -> ChaCha8Rng {
        stream_rng(self.backend.sampler_seed(), self.backend.stream_id())
    }

    /// Connection distances of the current trial, or an equally sized ideal
    /// sample in control mode
    fn observed_distances(&self, control: bool) -> Result<Vec<f64>> {
        let observed = self.backend.target_distances()?;
        if control {
            self.expected.sample(observed.len(), &mut self.sampler())
        } else {
            Ok(observed)
        }
    }

    /// KS test of connection distances against the expected CDF
    pub fn ks_test(&mut self, control: bool, seed: Option<u64>) -> Result<TestOutcome> {
        let seed = self.run_trial(seed)?;
        let samples = self.observed_distances(control)?;
        if samples.is_empty() {
            return Err(SpatialError::EmptySample);
        }
        let outcome = stats::ks_test(&samples, |d| self.expected.cdf(d));
        log::info!(
            "[{}] KS seed={} control={} n={} D={:.5} p={:.4}",
            self.backend.name(),
            seed,
            control,
            samples.len(),
            outcome.statistic,
            outcome.p_value
        );
        Ok(outcome)
    }

    /// KS test on connection distances pooled over `trials` consecutive seeds
    pub fn pooled_ks_test(
        &mut self,
        trials: usize,
        control: bool,
        base_seed: u64,
    ) -> Result<TestOutcome> {
        let mut pooled = Vec::new();
        for i in 0..trials as u64 {
            self.run_trial(Some(base_seed.wrapping_add(i)))?;
            pooled.extend(self.observed_distances(control)?);
        }
        if pooled.is_empty() {
            return Err(SpatialError::EmptySample);
        }
        let outcome = stats::ks_test(&pooled, |d| self.expected.cdf(d));
        log::info!(
            "[{}] pooled KS trials={} n={} p={:.4}",
            self.backend.name(),
            trials,
            pooled.len(),
            outcome.p_value
        );
        Ok(outcome)
    }

    /// Z-test of the total connection count against its expectation given
    /// the candidates' distances
    pub fn z_test(&mut self, control: bool, seed: Option<u64>) -> Result<TestOutcome> {
        let seed = self.run_trial(seed)?;
        let kernel = *self.backend.kernel();
        let probs: Vec<f64> = self
            .backend
            .distances()?
            .iter()
            .map(|&d| kernel.probability(d))
            .collect();

        let mu: f64 = probs.iter().sum();
        let var: f64 = probs.iter().map(|p| p * (1.0 - p)).sum();
        if var <= 0.0 {
            return Err(SpatialError::DegenerateVariance);
        }

        let observed = if control {
            let mut rng = self.sampler();
            probs.iter().filter(|&&p| rng.gen::<f64>() < p).count()
        } else {
            self.backend.target_distances()?.len()
        };

        let z = (observed as f64 - mu) / var.sqrt();
        let outcome = TestOutcome::new(z, stats::two_sided_p(z));
        log::info!(
            "[{}] Z seed={} control={} observed={} expected={:.1} z={:.3} p={:.4}",
            self.backend.name(),
            seed,
            control,
            observed,
            mu,
            z,
            outcome.p_value
        );
        Ok(outcome)
    }

    /// Observed and expected connection counts in `bins` equal-width
    /// distance bins over `[0, max_dist]`
    pub fn binned_counts(&mut self, bins: usize, seed: Option<u64>) -> Result<Vec<BinCount>> {
        if bins == 0 {
            return Err(SpatialError::InvalidConfig("bins must be > 0".to_string()));
        }
        self.run_trial(seed)?;
        let max_dist = self.max_dist();
        let width = max_dist / bins as f64;
        let bin_of = |d: f64| ((d / width) as usize).min(bins - 1);

        let mut counts: Vec<BinCount> = (0..bins)
            .map(|i| BinCount::empty(i as f64 * width, (i + 1) as f64 * width))
            .collect();

        let kernel = *self.backend.kernel();
        for d in self.backend.distances()? {
            let p = kernel.probability(d);
            let bin = &mut counts[bin_of(d)];
            bin.candidates += 1;
            bin.expected += p;
            bin.variance += p * (1.0 - p);
        }
        for d in self.backend.target_distances()? {
            counts[bin_of(d)].observed += 1;
        }
        for bin in &mut counts {
            bin.finish();
        }
        Ok(counts)
    }

    /// One trial with both tests on the same seed
    pub fn report(&mut self, seed: Option<u64>) -> Result<TrialReport> {
        let seed = self.backend.reset(seed);
        let ks = self.ks_test(false, Some(seed))?;
        let z = self.z_test(false, Some(seed))?;
        let connections = self.backend.target_distances()?.len();
        Ok(TrialReport {
            backend: self.backend.name().to_string(),
            dimensions: self.backend.domain().dims.count(),
            side_length: self.backend.domain().side_length,
            nodes: self.backend.node_count(),
            kernel: *self.backend.kernel(),
            seed,
            connections,
            ks,
            z,
        })
    }

    /// Run `trials` consecutive seeds and test the p-values for uniformity
    pub fn trial_series(
        &mut self,
        test: TestKind,
        trials: usize,
        control: bool,
        base_seed: u64,
    ) -> Result<SeriesReport> {
        if trials == 0 {
            return Err(SpatialError::InvalidConfig("trials must be > 0".to_string()));
        }
        let mut p_values = Vec::with_capacity(trials);
        for i in 0..trials as u64 {
            let seed = Some(base_seed.wrapping_add(i));
            let outcome = match test {
                TestKind::Ks => self.ks_test(control, seed)?,
                TestKind::Z => self.z_test(control, seed)?,
            };
            p_values.push(outcome.p_value);
        }
        let uniformity = stats::uniformity_test(&p_values);
        log::info!(
            "[{}] {} series: trials={} control={} uniformity p={:.4}",
            self.backend.name(),
            test,
            trials,
            control,
            uniformity.p_value
        );
        Ok(SeriesReport::new(
            self.backend.name(),
            test,
            control,
            base_seed,
            p_values,
            uniformity,
        ))
    }
}
