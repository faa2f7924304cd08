//! Distance kernels: connection probability as a function of distance.
//!
//! Each profile carries its own parameter struct. Parameters are assembled
//! from defaults derived from the domain side length, then overridden by a
//! user map whose keys are checked against the profile.

use crate::error::{Result, SpatialError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Named scalar kernel parameters, as read from configuration
pub type KernelParams = BTreeMap<String, f64>;

/// Kernel profile selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    Constant,
    Linear,
    Exponential,
    Gaussian,
}

impl KernelKind {
    pub const ALL: [KernelKind; 4] = [
        KernelKind::Constant,
        KernelKind::Linear,
        KernelKind::Exponential,
        KernelKind::Gaussian,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Linear => "linear",
            Self::Exponential => "exponential",
            Self::Gaussian => "gaussian",
        }
    }

    /// Parameter keys understood by this profile
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Self::Constant => &["p"],
            Self::Linear => &["c", "a"],
            Self::Exponential => &["c", "a", "tau"],
            Self::Gaussian => &["p_center", "sigma", "mean", "c"],
        }
    }

    /// Default parameters for a domain of side `side_length`.
    ///
    /// The linear profile reaches zero at L/√2 and the exponential profile
    /// decays to 0.1 at the same distance.
    pub fn defaults(&self, side_length: f64) -> KernelParams {
        let l = side_length;
        let pairs: Vec<(&str, f64)> = match self {
            Self::Constant => vec![("p", 1.0)],
            Self::Linear => vec![("a", -std::f64::consts::SQRT_2 / l), ("c", 1.0)],
            Self::Exponential => vec![
                ("a", 1.0),
                ("c", 0.0),
                ("tau", -l / (std::f64::consts::SQRT_2 * 0.1f64.ln())),
            ],
            Self::Gaussian => vec![
                ("p_center", 1.0),
                ("sigma", l / 4.0),
                ("mean", 0.0),
                ("c", 0.0),
            ],
        };
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelKind {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| SpatialError::UnknownKernel(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub c: f64,
    pub a: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialParams {
    pub c: f64,
    pub a: f64,
    pub tau: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianParams {
    pub p_center: f64,
    pub sigma: f64,
    pub mean: f64,
    pub c: f64,
    /// Distance beyond which the kernel is zero
    pub cutoff: Option<f64>,
}

/// Distance-to-probability profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Kernel {
    Constant { p: f64 },
    Linear(LinearParams),
    Exponential(ExponentialParams),
    Gaussian(GaussianParams),
}

impl Kernel {
    /// Build a kernel from defaults for `side_length` merged with `overrides`.
    pub fn from_params(
        kind: KernelKind,
        side_length: f64,
        overrides: Option<&KernelParams>,
    ) -> Result<Self> {
        let mut params = kind.defaults(side_length);
        if let Some(overrides) = overrides {
            for (key, value) in overrides {
                if !kind.keys().contains(&key.as_str()) {
                    return Err(SpatialError::InvalidParameter {
                        kernel: kind.name().to_string(),
                        key: key.clone(),
                        reason: format!("valid keys are {:?}", kind.keys()),
                    });
                }
                params.insert(key.clone(), *value);
            }
        }
        Self::from_map(kind, &params)
    }

    /// Build a kernel from a complete parameter map.
    pub fn from_map(kind: KernelKind, params: &KernelParams) -> Result<Self> {
        let get = |key: &str| -> Result<f64> {
            let value = *params.get(key).ok_or_else(|| SpatialError::MissingParameter {
                kernel: kind.name().to_string(),
                key: key.to_string(),
            })?;
            if !value.is_finite() {
                return Err(SpatialError::InvalidParameter {
                    kernel: kind.name().to_string(),
                    key: key.to_string(),
                    reason: format!("{} is not finite", value),
                });
            }
            Ok(value)
        };

        for key in params.keys() {
            if !kind.keys().contains(&key.as_str()) {
                return Err(SpatialError::InvalidParameter {
                    kernel: kind.name().to_string(),
                    key: key.clone(),
                    reason: "unknown key".to_string(),
                });
            }
        }

        let kernel = match kind {
            KernelKind::Constant => Kernel::Constant { p: get("p")? },
            KernelKind::Linear => Kernel::Linear(LinearParams {
                c: get("c")?,
                a: get("a")?,
            }),
            KernelKind::Exponential => {
                let tau = get("tau")?;
                if tau == 0.0 {
                    return Err(SpatialError::InvalidParameter {
                        kernel: kind.name().to_string(),
                        key: "tau".to_string(),
                        reason: "must be non-zero".to_string(),
                    });
                }
                Kernel::Exponential(ExponentialParams {
                    c: get("c")?,
                    a: get("a")?,
                    tau,
                })
            }
            KernelKind::Gaussian => {
                let sigma = get("sigma")?;
                if sigma <= 0.0 {
                    return Err(SpatialError::InvalidParameter {
                        kernel: kind.name().to_string(),
                        key: "sigma".to_string(),
                        reason: "must be positive".to_string(),
                    });
                }
                Kernel::Gaussian(GaussianParams {
                    p_center: get("p_center")?,
                    sigma,
                    mean: get("mean")?,
                    c: get("c")?,
                    cutoff: None,
                })
            }
        };
        Ok(kernel)
    }

    /// Truncate a Gaussian kernel at `cutoff`. Other profiles are returned unchanged.
    pub fn with_cutoff(self, cutoff: f64) -> Self {
        match self {
            Kernel::Gaussian(p) => Kernel::Gaussian(GaussianParams {
                cutoff: Some(cutoff),
                ..p
            }),
            other => other,
        }
    }

    pub fn kind(&self) -> KernelKind {
        match self {
            Kernel::Constant { .. } => KernelKind::Constant,
            Kernel::Linear(_) => KernelKind::Linear,
            Kernel::Exponential(_) => KernelKind::Exponential,
            Kernel::Gaussian(_) => KernelKind::Gaussian,
        }
    }

    /// Raw kernel value at distance `d` (may leave [0, 1])
    pub fn value(&self, d: f64) -> f64 {
        match *self {
            Kernel::Constant { p } => p,
            Kernel::Linear(LinearParams { c, a }) => c + a * d,
            Kernel::Exponential(ExponentialParams { c, a, tau }) => c + a * (-d / tau).exp(),
            Kernel::Gaussian(GaussianParams {
                p_center,
                sigma,
                mean,
                c,
                cutoff,
            }) => {
                if cutoff.is_some_and(|cut| d > cut) {
                    return 0.0;
                }
                c + p_center * (-(d - mean).powi(2) / (2.0 * sigma * sigma)).exp()
            }
        }
    }

    /// Acceptance probability at distance `d`, clamped to [0, 1]
    #[inline]
    pub fn probability(&self, d: f64) -> f64 {
        self.value(d).clamp(0.0, 1.0)
    }

    /// Parameters as a flat map (cutoff excluded)
    pub fn params(&self) -> KernelParams {
        let pairs: Vec<(&str, f64)> = match *self {
            Kernel::Constant { p } => vec![("p", p)],
            Kernel::Linear(LinearParams { c, a }) => vec![("c", c), ("a", a)],
            Kernel::Exponential(ExponentialParams { c, a, tau }) => {
                vec![("c", c), ("a", a), ("tau", tau)]
            }
            Kernel::Gaussian(g) => vec![
                ("p_center", g.p_center),
                ("sigma", g.sigma),
                ("mean", g.mean),
                ("c", g.c),
            ],
        };
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_kernel_names() {
        for kind in KernelKind::ALL {
            assert_eq!(kind.name().parse::<KernelKind>().unwrap(), kind);
        }
        assert!(matches!(
            "lorentzian".parse::<KernelKind>(),
            Err(SpatialError::UnknownKernel(_))
        ));
    }

    #[test]
    fn test_linear_default_reaches_zero_at_diagonal() {
        let l = 2.0;
        let kernel = Kernel::from_params(KernelKind::Linear, l, None).unwrap();
        assert_relative_eq!(kernel.value(0.0), 1.0);
        assert_relative_eq!(kernel.value(l / 2f64.sqrt()), 0.0, epsilon = 1e-12);
        assert_eq!(kernel.probability(l), 0.0);
    }

    #[test]
    fn test_exponential_default_decays_to_tenth() {
        let kernel = Kernel::from_params(KernelKind::Exponential, 1.0, None).unwrap();
        assert_relative_eq!(kernel.value(1.0 / 2f64.sqrt()), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_gaussian_defaults_and_override() {
        let kernel = Kernel::from_params(KernelKind::Gaussian, 1.0, None).unwrap();
        assert_relative_eq!(kernel.value(0.0), 1.0);
        assert_relative_eq!(kernel.value(0.25), (-0.5f64).exp(), epsilon = 1e-12);

        let mut overrides = KernelParams::new();
        overrides.insert("sigma".to_string(), 0.1);
        let kernel = Kernel::from_params(KernelKind::Gaussian, 1.0, Some(&overrides)).unwrap();
        assert_eq!(kernel.params()["sigma"], 0.1);
        assert_eq!(kernel.params()["p_center"], 1.0);
    }

    #[test]
    fn test_gaussian_cutoff_truncates() {
        let max_dist = 1.0 / 2f64.sqrt();
        let kernel = Kernel::from_params(KernelKind::Gaussian, 1.0, None)
            .unwrap()
            .with_cutoff(max_dist);
        assert!(kernel.probability(max_dist) > 0.0);
        assert_eq!(kernel.probability(max_dist + 1e-9), 0.0);
        assert_eq!(kernel.probability(3.0), 0.0);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut overrides = KernelParams::new();
        overrides.insert("tau".to_string(), 1.0);
        let err = Kernel::from_params(KernelKind::Gaussian, 1.0, Some(&overrides)).unwrap_err();
        assert!(matches!(err, SpatialError::InvalidParameter { ref key, .. } if key == "tau"));
    }

    #[test]
    fn test_missing_key_rejected() {
        let mut params = KernelParams::new();
        params.insert("c".to_string(), 0.5);
        let err = Kernel::from_map(KernelKind::Linear, &params).unwrap_err();
        assert!(matches!(err, SpatialError::MissingParameter { ref key, .. } if key == "a"));
    }

    #[test]
    fn test_bad_values_rejected() {
        let mut overrides = KernelParams::new();
        overrides.insert("sigma".to_string(), 0.0);
        assert!(Kernel::from_params(KernelKind::Gaussian, 1.0, Some(&overrides)).is_err());

        let mut overrides = KernelParams::new();
        overrides.insert("c".to_string(), f64::NAN);
        assert!(Kernel::from_params(KernelKind::Linear, 1.0, Some(&overrides)).is_err());
    }

    #[test]
    fn test_probability_is_clamped() {
        let mut overrides = KernelParams::new();
        overrides.insert("p".to_string(), 1.7);
        let kernel = Kernel::from_params(KernelKind::Constant, 1.0, Some(&overrides)).unwrap();
        assert_eq!(kernel.value(0.3), 1.7);
        assert_eq!(kernel.probability(0.3), 1.0);
    }
}
