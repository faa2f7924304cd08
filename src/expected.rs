//! Expected distribution of connection distances.
//!
//! With targets placed uniformly, the density of candidates at distance D
//! from the source is the shell measure of the domain at D. Weighting it by
//! the kernel's acceptance probability gives the (unnormalized) density of
//! connection distances.

use crate::error::{Result, SpatialError};
use crate::geometry::Domain;
use crate::kernel::Kernel;
use crate::stats::integrate;
use rand::Rng;

/// Number of segments in the tabulated CDF
const TABLE_SEGMENTS: usize = 2048;

/// Absolute tolerance of the segment integrals
const TOLERANCE: f64 = 1e-13;

/// Rejection sampling gives up after this many candidates per requested sample
const MAX_DRAWS_PER_SAMPLE: usize = 1_000_000;

#[derive(Clone, Debug)]
pub struct ExpectedDistribution {
    kernel: Kernel,
    domain: Domain,
    step: f64,
    /// Normalized CDF at `i * step`
    table: Vec<f64>,
    norm: f64,
}

impl ExpectedDistribution {
    pub fn new(kernel: Kernel, domain: Domain) -> Result<Self> {
        let max_dist = domain.max_dist();
        let step = max_dist / TABLE_SEGMENTS as f64;
        let pdf = |d: f64| kernel.probability(d) * domain.shell_measure(d);

        let mut table = Vec::with_capacity(TABLE_SEGMENTS + 1);
        let mut acc = 0.0;
        table.push(0.0);
        for i in 0..TABLE_SEGMENTS {
            let a = i as f64 * step;
            acc += integrate(pdf, a, a + step, TOLERANCE);
            table.push(acc);
        }

        let norm = acc;
        if !(norm.is_finite() && norm > 0.0) {
            return Err(SpatialError::InvalidConfig(
                "kernel gives zero connection probability over the whole domain".to_string(),
            ));
        }
        for v in &mut table {
            *v /= norm;
        }

        Ok(Self {
            kernel,
            domain,
            step,
            table,
            norm,
        })
    }

    pub fn max_dist(&self) -> f64 {
        self.domain.max_dist()
    }

    /// Unnormalized density of connection distances
    pub fn pdf(&self, d: f64) -> f64 {
        self.kernel.probability(d) * self.domain.shell_measure(d)
    }

    /// Probability density of connection distances
    pub fn density(&self, d: f64) -> f64 {
        self.pdf(d) / self.norm
    }

    /// Cumulative distribution of connection distances.
    ///
    /// The table gives the value at the segment start; the remainder of the
    /// segment is integrated directly, so the result does not depend on how
    /// smooth the shell measure is inside a segment.
    pub fn cdf(&self, d: f64) -> f64 {
        if d <= 0.0 {
            return 0.0;
        }
        let i = (d / self.step).floor() as usize;
        if i >= TABLE_SEGMENTS {
            return 1.0;
        }
        let start = i as f64 * self.step;
        let partial = integrate(|x| self.pdf(x), start, d, TOLERANCE) / self.norm;
        (self.table[i] + partial).min(self.table[i + 1])
    }

    /// Draw `n` connection distances from an ideal generator.
    ///
    /// Candidates are placed uniformly in the domain and accepted with the
    /// kernel probability at their distance from the centre.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<f64>> {
        let center = self.domain.center();
        let mut out = Vec::with_capacity(n);
        let mut draws = 0usize;
        let budget = n.saturating_mul(MAX_DRAWS_PER_SAMPLE);
        while out.len() < n {
            if draws >= budget {
                return Err(SpatialError::InvalidConfig(
                    "acceptance probability too small to sample the expected distribution"
                        .to_string(),
                ));
            }
            draws += 1;
            let candidate = self.domain.sample(rng);
            let d = self.domain.distance(&center, &candidate);
            if rng.gen::<f64>() < self.kernel.probability(d) {
                out.push(d);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dimensions;
    use crate::kernel::KernelKind;
    use crate::stats::ks_test;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn distribution(kind: KernelKind, dims: Dimensions) -> ExpectedDistribution {
        let domain = Domain::centered(1.0, dims, true).unwrap();
        let kernel = Kernel::from_params(kind, 1.0, None).unwrap();
        ExpectedDistribution::new(kernel, domain).unwrap()
    }

    #[test]
    fn test_constant_kernel_2d_cdf_is_disc_area() {
        let dist = distribution(KernelKind::Constant, Dimensions::Two);
        // inside the inscribed circle the CDF is the disc area fraction
        for d in [0.1, 0.25, 0.4, 0.5] {
            assert_relative_eq!(dist.cdf(d), std::f64::consts::PI * d * d, epsilon = 1e-6);
        }
        // just past the inscribed circle the shell measure has a kink
        for d in [0.5001, 0.52] {
            let h: f64 = 0.5;
            let corners = 4.0 * (d * d * (h / d).acos() - h * (d * d - h * h).sqrt());
            assert_relative_eq!(
                dist.cdf(d),
                std::f64::consts::PI * d * d - corners,
                epsilon = 1e-6
            );
        }
        assert_eq!(dist.cdf(-1.0), 0.0);
        assert_eq!(dist.cdf(dist.max_dist() + 0.1), 1.0);
    }

    #[test]
    fn test_constant_kernel_3d_cdf_is_ball_volume() {
        let dist = distribution(KernelKind::Constant, Dimensions::Three);
        let d: f64 = 0.4;
        assert_relative_eq!(
            dist.cdf(d),
            4.0 / 3.0 * std::f64::consts::PI * d.powi(3),
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_cdf_monotone_and_density_normalized() {
        for kind in KernelKind::ALL {
            let dist = distribution(kind, Dimensions::Two);
            let mut prev = 0.0;
            for i in 0..=100 {
                let c = dist.cdf(i as f64 * dist.max_dist() / 100.0);
                assert!(c >= prev - 1e-12);
                prev = c;
            }
            assert_relative_eq!(prev, 1.0, epsilon = 1e-9);
            let total = integrate(|d| dist.density(d), 0.0, dist.max_dist(), 1e-10);
            assert_relative_eq!(total, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_samples_follow_cdf() {
        let dist = distribution(KernelKind::Gaussian, Dimensions::Two);
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let samples = dist.sample(3000, &mut rng).unwrap();
        assert_eq!(samples.len(), 3000);
        let outcome = ks_test(&samples, |d| dist.cdf(d));
        assert!(outcome.p_value > 0.001, "p = {}", outcome.p_value);
    }

    #[test]
    fn test_zero_kernel_rejected() {
        let domain = Domain::centered(1.0, Dimensions::Two, true).unwrap();
        let err = ExpectedDistribution::new(Kernel::Constant { p: 0.0 }, domain).unwrap_err();
        assert!(matches!(err, SpatialError::InvalidConfig(_)));
    }
}
