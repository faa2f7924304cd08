//! Backend modelled on a simulator topology module.
//!
//! Layers are centred on the origin with periodic boundaries, in 2D or 3D.
//! The connection mask covers the whole layer, so every target is a
//! candidate. All kernel profiles are available.

use super::{entropy_seed, stream_rng, Population, SpatialBackend};
use crate::error::{Result, SpatialError};
use crate::geometry::{Dimensions, Domain, Position};
use crate::kernel::{Kernel, KernelKind, KernelParams};
use rand_chacha::ChaCha8Rng;

const NAME: &str = "topology";
const STREAM_ID: u64 = 2;

pub struct TopologyBackend {
    domain: Domain,
    node_count: usize,
    kernel: Kernel,
    rng: ChaCha8Rng,
    stream_seed: u64,
    population: Option<Population>,
}

impl TopologyBackend {
    pub fn new(
        side_length: f64,
        node_count: usize,
        dims: Dimensions,
        kernel_name: &str,
        kernel_params: Option<&KernelParams>,
    ) -> Result<Self> {
        if node_count == 0 {
            return Err(SpatialError::InvalidConfig("node count must be > 0".to_string()));
        }
        let kind: KernelKind = kernel_name.parse()?;
        let domain = Domain::centered(side_length, dims, true)?;
        let kernel = Kernel::from_params(kind, side_length, kernel_params)?;

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

impl SpatialBackend for TopologyBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn reset(&mut self, seed: Option<u64>) -> u64 {
        let seed = seed.unwrap_or_else(entropy_seed);
        // user-level offset; STREAM_ID separates it from the csa generator
        self.stream_seed = seed.wrapping_mul(3);
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
        log::debug!(
            "[{}] built {} targets in {}D",
            NAME,
            population.len(),
            self.domain.dims.count()
        );
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
