//! # SPATIAL TESTER
//!
//! Statistical acceptance tests for spatially structured connectivity.
//!
//! A single source node is connected to N uniformly scattered targets with a
//! distance-dependent kernel. The resulting connection distances are checked
//! against the distribution the kernel implies.
//!
//! ## Features
//!
//! - **Kernels**: constant, linear, exponential and Gaussian profiles
//! - **Backends**: an open-square backend (Gaussian only, 2D) and a
//!   periodic-boundary backend (all kernels, 2D and 3D)
//! - **Tests**: KS test on distances, Z-test on counts, binned counts
//! - **Control mode**: ideal samples under the null hypothesis
//! - **Reproducible**: seeded random number generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spatial_tester::{Dimensions, SpatialTester, TopologyBackend};
//!
//! let backend = TopologyBackend::new(1.0, 10_000, Dimensions::Two, "gaussian", None).unwrap();
//! let mut tester = SpatialTester::new(backend).unwrap();
//!
//! let ks = tester.ks_test(false, Some(0)).unwrap();
//! let z = tester.z_test(false, Some(0)).unwrap();
//! println!("p-value of KS-test: {}", ks.p_value);
//! println!("p-value of Z-test: {}", z.p_value);
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use spatial_tester::{Config, KernelKind};
//!
//! let mut config = Config::default();
//! config.population.nodes = 2000;
//! config.kernel.name = KernelKind::Linear;
//! assert!(config.validate().is_ok());
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod expected;
pub mod geometry;
pub mod kernel;
pub mod report;
pub mod stats;
pub mod tester;

// Re-export main types
pub use backend::{BackendKind, CsaBackend, SpatialBackend, TopologyBackend};
pub use config::Config;
pub use error::{Result, SpatialError};
pub use geometry::{Dimensions, Domain, Position};
pub use kernel::{Kernel, KernelKind, KernelParams};
pub use report::{NetworkExport, SeriesReport, TrialReport};
pub use stats::TestOutcome;
pub use tester::{SpatialTester, TestKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the reference demonstration: both tests on 10000 nodes with a
/// Gaussian kernel on the unit square.
pub fn demo(backend: BackendKind, seed: u64) -> Result<TrialReport> {
    let mut config = Config::default();
    config.population.backend = backend;
    let mut tester = SpatialTester::new(config.build_backend()?)?;
    tester.report(Some(seed))
}
