//! Numeric building blocks for the goodness-of-fit tests.

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

/// Statistic and p-value of a single hypothesis test
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestOutcome {
    pub fn new(statistic: f64, p_value: f64) -> Self {
        Self { statistic, p_value }
    }

    /// Whether the null hypothesis is rejected at level `alpha`
    pub fn rejects(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

const MAX_DEPTH: u32 = 48;

/// Adaptive Simpson quadrature of `f` over `[a, b]` to absolute tolerance `tol`
pub fn integrate<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, tol: f64) -> f64 {
    if b <= a {
        return 0.0;
    }
    let fa = f(a);
    let fb = f(b);
    let m = 0.5 * (a + b);
    let fm = f(m);
    let whole = (b - a) / 6.0 * (fa + 4.0 * fm + fb);
    simpson_step(&f, a, b, fa, fm, fb, whole, tol, MAX_DEPTH)
}

#[allow(clippy::too_many_arguments)]
fn simpson_step<F: Fn(f64) -> f64>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tol: f64,
    depth: u32,
) -> f64 {
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm);
    let frm = f(rm);
    let left = (m - a) / 6.0 * (fa + 4.0 * flm + fm);
    let right = (b - m) / 6.0 * (fm + 4.0 * frm + fb);
    let delta = left + right - whole;
    if depth == 0 || delta.abs() <= 15.0 * tol {
        return left + right + delta / 15.0;
    }
    simpson_step(f, a, m, fa, flm, fm, left, tol / 2.0, depth - 1)
        + simpson_step(f, m, b, fm, frm, fb, right, tol / 2.0, depth - 1)
}

/// Two-sided one-sample KS statistic `sup |F_n(x) - F(x)|`
pub fn ks_statistic<F: Fn(f64) -> f64>(samples: &[f64], cdf: F) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let f = cdf(x);
            let above = (i as f64 + 1.0) / n - f;
            let below = f - i as f64 / n;
            above.max(below)
        })
        .fold(0.0, f64::max)
}

/// Survival function of the Kolmogorov distribution, `P(K > lambda)`
pub fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    if lambda < 1.18 {
        // small-lambda form converges faster here
        let y = (-PI_SQ / (8.0 * lambda * lambda)).exp();
        let mut sum = 0.0;
        for j in 0..20 {
            let k = (2 * j + 1) as i32;
            sum += y.powi(k * k);
        }
        let cdf = (2.0 * std::f64::consts::PI).sqrt() / lambda * sum;
        (1.0 - cdf).clamp(0.0, 1.0)
    } else {
        let mut sum = 0.0;
        for j in 1..=100 {
            let term = (-2.0 * (j * j) as f64 * lambda * lambda).exp();
            sum += if j % 2 == 1 { term } else { -term };
            if term < 1e-16 {
                break;
            }
        }
        (2.0 * sum).clamp(0.0, 1.0)
    }
}

const PI_SQ: f64 = std::f64::consts::PI * std::f64::consts::PI;

/// Approximate p-value of KS statistic `d` for `n` samples (Stephens' correction)
pub fn ks_p_value(d: f64, n: usize) -> f64 {
    if n == 0 {
        return 1.0;
    }
    let sqrt_n = (n as f64).sqrt();
    kolmogorov_sf((sqrt_n + 0.12 + 0.11 / sqrt_n) * d)
}

/// One-sample two-sided KS test against `cdf`
pub fn ks_test<F: Fn(f64) -> f64>(samples: &[f64], cdf: F) -> TestOutcome {
    let d = ks_statistic(samples, cdf);
    TestOutcome::new(d, ks_p_value(d, samples.len()))
}

/// Upper tail of the standard normal distribution
pub fn normal_sf(z: f64) -> f64 {
    0.5 * erfc(z / std::f64::consts::SQRT_2)
}

/// Two-sided p-value of a standard normal statistic
pub fn two_sided_p(z: f64) -> f64 {
    (2.0 * normal_sf(z.abs())).min(1.0)
}

/// KS test of `p_values` against the uniform distribution on [0, 1]
pub fn uniformity_test(p_values: &[f64]) -> TestOutcome {
    ks_test(p_values, |x| x.clamp(0.0, 1.0))
}

/// Arithmetic mean, zero for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_integrate_polynomial() {
        let v = integrate(|x| 3.0 * x * x, 0.0, 2.0, 1e-12);
        assert_relative_eq!(v, 8.0, epsilon = 1e-10);
    }

    #[test]
    fn test_integrate_kinked() {
        let v = integrate(|x: f64| x.abs(), -1.0, 1.0, 1e-10);
        assert_relative_eq!(v, 1.0, epsilon = 1e-8);
        assert_eq!(integrate(|x| x, 1.0, 1.0, 1e-10), 0.0);
    }

    #[test]
    fn test_ks_statistic_known_sample() {
        let samples = [0.1, 0.4, 0.7];
        // ECDF steps at 1/3, 2/3, 1 against F(x) = x
        let d = ks_statistic(&samples, |x| x);
        assert_relative_eq!(d, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_kolmogorov_sf_reference_values() {
        // Reference values of the Kolmogorov distribution
        assert_relative_eq!(kolmogorov_sf(1.0), 0.26999967, epsilon = 1e-6);
        assert_relative_eq!(kolmogorov_sf(1.36), 0.0494859, epsilon = 1e-6);
        assert_relative_eq!(kolmogorov_sf(0.5), 0.9639452, epsilon = 1e-6);
        assert_eq!(kolmogorov_sf(0.0), 1.0);
        assert!(kolmogorov_sf(5.0) < 1e-10);
    }

    #[test]
    fn test_kolmogorov_branches_agree() {
        let below = kolmogorov_sf(1.18 - 1e-9);
        let above = kolmogorov_sf(1.18 + 1e-9);
        assert_relative_eq!(below, above, epsilon = 1e-7);
    }

    #[test]
    fn test_normal_tails() {
        assert_relative_eq!(normal_sf(0.0), 0.5, epsilon = 1e-15);
        assert_relative_eq!(two_sided_p(1.959963984540054), 0.05, epsilon = 1e-9);
        assert_relative_eq!(two_sided_p(-1.959963984540054), 0.05, epsilon = 1e-9);
        assert_eq!(two_sided_p(0.0), 1.0);
    }

    #[test]
    fn test_uniformity_of_grid() {
        let grid: Vec<f64> = (0..200).map(|i| (i as f64 + 0.5) / 200.0).collect();
        let outcome = uniformity_test(&grid);
        assert!(outcome.statistic < 0.01);
        assert!(outcome.p_value > 0.99);

        let skewed: Vec<f64> = grid.iter().map(|p| p * p).collect();
        assert!(uniformity_test(&skewed).rejects(0.01));
    }
}
