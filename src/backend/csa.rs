//! Backend modelled on the connection-set algebra toolkit.
//!
//! Targets are scattered on an open (non-wrapping) square with the source at
//! its centre. Only the Gaussian profile is available, truncated at the
//! domain's maximum distance, and only `sigma` may be overridden.

use super::{entropy_seed, stream_rng, Population, SpatialBackend};
use crate::error::{Result, SpatialError};
use crate::geometry::{Dimensions, Domain, Position};
use crate::kernel::{Kernel, KernelKind, KernelParams};
use rand_chacha::ChaCha8Rng;

const NAME: &str = "csa";
const STREAM_ID: u64 = 1;

pub struct CsaBackend {
    domain: Domain,
    node_count: usize,
    kernel: Kernel,
    rng: ChaCha8Rng,
    stream_seed: u64,
    population: Option<Population>,
}

impl CsaBackend {
    pub fn new(
        side_length: f64,
        node_count: usize,
        dims: Dimensions,
        kernel_name: &str,
        kernel_params: Option<&KernelParams>,
    ) -> Result<Self> {
        if dims == Dimensions::Three {
            return Err(SpatialError::NotImplemented(
                "the csa backend does not construct 3D spatial networks".to_string(),
            ));
        }
        if node_count == 0 {
            return Err(SpatialError::InvalidConfig("node count must be > 0".to_string()));
        }
        let kind: KernelKind = kernel_name.parse()?;
        if kind != KernelKind::Gaussian {
            return Err(SpatialError::UnsupportedKernel {
                backend: NAME,
                kernel: kind.name().to_string(),
            });
        }
        if let Some(params) = kernel_params {
            if let Some(key) = params.keys().find(|k| k.as_str() != "sigma") {
                return Err(SpatialError::InvalidParameter {
                    kernel: kind.name().to_string(),
                    key: key.clone(),
                    reason: "only \"sigma\" can be set for the csa backend".to_string(),
                });
            }
        }

        let domain = Domain::new(side_length, dims, 0.0, false)?;
        let kernel =
            Kernel::from_params(kind, side_length, kernel_params)?.with_cutoff(domain.max_dist());

        Ok(Self {
            domain,
            node_count,
            kernel,
            rng: stream_rng(0, STREAM_ID),
            stream_seed: 0,
            population: None,
        })
    }

    fn population(&self) -> Result<&Population> {
        self.population.as_ref().ok_or(SpatialError::NotBuilt)
    }
}

impl SpatialBackend for CsaBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn reset(&mut self, seed: Option<u64>) -> u64 {
        let seed = seed.unwrap_or_else(entropy_seed);
        // even stream seeds for this backend, odd ones for the sampler
        self.stream_seed = seed.wrapping_mul(2);
        self.rng = stream_rng(self.stream_seed, STREAM_ID);
        self.population = None;
        log::debug!("[{}] reset: seed={} stream={}", NAME, seed, self.stream_seed);
        seed
    }

    fn sampler_seed(&self) -> u64 {
        self.stream_seed.wrapping_add(1)
    }

    fn stream_id(&self) -> u64 {
        STREAM_ID
    }

    fn build(&mut self) -> Result<()> {
        let source = self.domain.center();
        let population = Population::scatter(&self.domain, source, self.node_count, &mut self.rng);
        log::debug!("[{}] built {} targets", NAME, population.len());
        self.population = Some(population);
        Ok(())
    }

    fn connect(&mut self) -> Result<()> {
        let population = self.population.as_mut().ok_or(SpatialError::NotBuilt)?;
        let count = population.connect(&self.kernel, &mut self.rng);
        log::debug!("[{}] connected {} of {} targets", NAME, count, population.len());
        Ok(())
    }

    fn distances(&self) -> Result<Vec<f64>> {
        Ok(self.population()?.distances().to_vec())
    }

    fn target_distances(&self) -> Result<Vec<f64>> {
        self.population()?.target_distances()
    }

    fn positions(&self) -> Result<Vec<Position>> {
        Ok(self.population()?.positions().to_vec())
    }

    fn target_positions(&self) -> Result<Vec<Position>> {
        self.population()?.target_positions()
    }

    fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    fn domain(&self) -> &Domain {
        &self.domain
    }

    fn node_count(&self) -> usize {
        self.node_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(n: usize) -> CsaBackend {
        CsaBackend::new(1.0, n, Dimensions::Two, "gaussian", None).unwrap()
    }

    #[test]
    fn test_rejects_3d() {
        let err = CsaBackend::new(1.0, 10, Dimensions::Three, "gaussian", None)
            .err()
            .unwrap();
        assert!(matches!(err, SpatialError::NotImplemented(_)));
    }

    #[test]
    fn test_rejects_other_kernels() {
        let err = CsaBackend::new(1.0, 10, Dimensions::Two, "linear", None)
            .err()
            .unwrap();
        assert!(matches!(err, SpatialError::UnsupportedKernel { .. }));

        let err = CsaBackend::new(1.0, 10, Dimensions::Two, "cauchy", None)
            .err()
            .unwrap();
        assert!(matches!(err, SpatialError::UnknownKernel(_)));
    }

    #[test]
    fn test_only_sigma_overridable() {
        let mut params = KernelParams::new();
        params.insert("sigma".to_string(), 0.1);
        assert!(CsaBackend::new(1.0, 10, Dimensions::Two, "gaussian", Some(&params)).is_ok());

        params.insert("mean".to_string(), 0.1);
        let err = CsaBackend::new(1.0, 10, Dimensions::Two, "gaussian", Some(&params))
            .err()
            .unwrap();
        assert!(matches!(err, SpatialError::InvalidParameter { ref key, .. } if key == "mean"));
    }

    #[test]
    fn test_kernel_truncated_at_max_dist() {
        let b = backend(10);
        let max_dist = b.domain().max_dist();
        assert_eq!(b.kernel().probability(max_dist * 1.01), 0.0);
        assert!(b.kernel().probability(max_dist * 0.99) > 0.0);
    }

    #[test]
    fn test_source_at_centre_and_nodes_inside() {
        let mut b = backend(2000);
        b.reset(Some(4));
        b.build().unwrap();
        for p in b.positions().unwrap() {
            assert!((0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y));
        }
        assert!(b
            .distances()
            .unwrap()
            .iter()
            .all(|&d| d <= b.domain().max_dist()));
    }

    #[test]
    fn test_state_errors() {
        let mut b = backend(10);
        b.reset(Some(0));
        assert!(matches!(b.connect(), Err(SpatialError::NotBuilt)));
        assert!(matches!(b.distances(), Err(SpatialError::NotBuilt)));
        b.build().unwrap();
        assert!(matches!(b.target_distances(), Err(SpatialError::NotConnected)));
        b.connect().unwrap();
        assert!(b.target_distances().is_ok());
    }

    #[test]
    fn test_seed_streams() {
        let mut b = backend(10);
        assert_eq!(b.reset(Some(21)), 21);
        assert_eq!(b.sampler_seed(), 43);
        let drawn = b.reset(None);
        assert!(drawn < 10_000_000_000);
    }
}
