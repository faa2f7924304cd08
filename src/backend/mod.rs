//! Connectivity backends.
//!
//! A backend places one source node and N target nodes, connects the source
//! to targets with a distance kernel, and answers distance and position
//! queries about the result. Both adapters share [`Population`] for the
//! placement and Bernoulli connection steps; they differ in domain layout,
//! boundary topology, supported kernels and seed derivation.

pub mod csa;
pub mod population;
pub mod topology;

pub use csa::CsaBackend;
pub use population::Population;
pub use topology::TopologyBackend;

use crate::error::Result;
use crate::geometry::{Domain, Position};
use crate::kernel::Kernel;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operations shared by every connectivity backend
pub trait SpatialBackend {
    /// Short backend identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Reseed all random streams and discard the current population.
    ///
    /// `None` draws a fresh seed from system entropy. Returns the user-level
    /// seed that was applied.
    fn reset(&mut self, seed: Option<u64>) -> u64;

    /// Seed for the tester's own sampling stream, derived from the last reset
    fn sampler_seed(&self) -> u64;

    /// ChaCha stream selector owned by this backend. Distinct per backend,
    /// so equal derived seeds never yield equal streams.
    fn stream_id(&self) -> u64;

    /// Place the source and target nodes
    fn build(&mut self) -> Result<()>;

    /// Connect the source to targets according to the kernel
    fn connect(&mut self) -> Result<()>;

    /// Distance from the source to every target, in enumeration order
    fn distances(&self) -> Result<Vec<f64>>;

    /// Distance from the source to every connected target, in connection order
    fn target_distances(&self) -> Result<Vec<f64>>;

    /// Positions of all targets, aligned with [`SpatialBackend::distances`]
    fn positions(&self) -> Result<Vec<Position>>;

    /// Positions of connected targets, aligned with [`SpatialBackend::target_distances`]
    fn target_positions(&self) -> Result<Vec<Position>>;

    fn kernel(&self) -> &Kernel;

    fn domain(&self) -> &Domain;

    /// Number of target nodes
    fn node_count(&self) -> usize;
}

/// Backend selector for configuration files and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Csa,
    Topology,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csa => f.write_str("csa"),
            Self::Topology => f.write_str("topology"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "csa" => Ok(Self::Csa),
            "topology" => Ok(Self::Topology),
            other => Err(format!("unknown backend '{}' (expected csa or topology)", other)),
        }
    }
}

/// Generator for `seed` on the backend's own ChaCha stream
pub fn stream_rng(seed: u64, stream_id: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream_id);
    rng
}

/// Seed drawn from system entropy when the caller does not supply one
pub(crate) fn entropy_seed() -> u64 {
    rand::thread_rng().gen_range(0..10_000_000_000)
}

impl<B: SpatialBackend + ?Sized> SpatialBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn reset(&mut self, seed: Option<u64>) -> u64 {
        (**self).reset(seed)
    }

    fn sampler_seed(&self) -> u64 {
        (**self).sampler_seed()
    }

    fn stream_id(&self) -> u64 {
        (**self).stream_id()
    }

    fn build(&mut self) -> Result<()> {
        (**self).build()
    }

    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn distances(&self) -> Result<Vec<f64>> {
        (**self).distances()
    }

    fn target_distances(&self) -> Result<Vec<f64>> {
        (**self).target_distances()
    }

    fn positions(&self) -> Result<Vec<Position>> {
        (**self).positions()
    }

    fn target_positions(&self) -> Result<Vec<Position>> {
        (**self).target_positions()
    }

    fn kernel(&self) -> &Kernel {
        (**self).kernel()
    }

    fn domain(&self) -> &Domain {
        (**self).domain()
    }

    fn node_count(&self) -> usize {
        (**self).node_count()
    }
}
