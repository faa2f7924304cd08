//! Configuration for spatial connectivity tests.
//!
//! Supports YAML configuration files. The defaults reproduce the reference
//! demonstration: 10000 nodes on a unit square, Gaussian kernel, seed 0.

use crate::backend::{BackendKind, CsaBackend, SpatialBackend, TopologyBackend};
use crate::error::{Result, SpatialError};
use crate::geometry::Dimensions;
use crate::kernel::{KernelKind, KernelParams};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub population: PopulationConfig,
    pub kernel: KernelConfig,
    pub testing: TestingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Placement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Which backend builds and connects the population
    pub backend: BackendKind,
    /// 2 or 3
    pub dimensions: Dimensions,
    /// Side length of the square / cube
    pub side_length: f64,
    /// Number of target nodes
    pub nodes: usize,
}

/// Kernel selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    pub name: KernelKind,
    /// Overrides for the side-length derived defaults
    #[serde(default)]
    pub params: KernelParams,
}

/// Test procedure configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingConfig {
    /// Seed of the first trial; drawn from entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Trials in a p-value series
    pub trials: usize,
    /// Distance bins for binned counts
    pub bins: usize,
    /// Replace backend connections with ideal samples
    #[serde(default)]
    pub control: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Topology,
            dimensions: Dimensions::Two,
            side_length: 1.0,
            nodes: 10_000,
        }
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: KernelKind::Gaussian,
            params: KernelParams::new(),
        }
    }
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            seed: Some(0),
            trials: 100,
            bins: 20,
            control: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let side = self.population.side_length;
        if !(side.is_finite() && side > 0.0) {
            return Err(SpatialError::InvalidConfig(
                "side_length must be a positive number".to_string(),
            ));
        }
        if self.population.nodes == 0 {
            return Err(SpatialError::InvalidConfig("nodes must be > 0".to_string()));
        }
        if self.testing.trials == 0 {
            return Err(SpatialError::InvalidConfig("trials must be > 0".to_string()));
        }
        if self.testing.bins == 0 {
            return Err(SpatialError::InvalidConfig("bins must be > 0".to_string()));
        }
        Ok(())
    }

    /// Kernel overrides, if any were given
    pub fn kernel_overrides(&self) -> Option<&KernelParams> {
        if self.kernel.params.is_empty() {
            None
        } else {
            Some(&self.kernel.params)
        }
    }

    /// Control mode is on when requested on the command line or in the file
    pub fn control_mode(&self, requested: bool) -> bool {
        requested || self.testing.control
    }

    /// Construct the configured backend
    pub fn build_backend(&self) -> Result<Box<dyn SpatialBackend>> {
        self.validate()?;
        let pop = &self.population;
        let name = self.kernel.name.name();
        let backend: Box<dyn SpatialBackend> = match pop.backend {
            BackendKind::Csa => Box::new(CsaBackend::new(
                pop.side_length,
                pop.nodes,
                pop.dimensions,
                name,
                self.kernel_overrides(),
            )?),
            BackendKind::Topology => Box::new(TopologyBackend::new(
                pop.side_length,
                pop.nodes,
                pop.dimensions,
                name,
                self.kernel_overrides(),
            )?),
        };
        Ok(backend)
    }
}
