//! Error type shared by kernels, backends and the tester.

/// Errors that can occur while configuring or running a spatial test
#[derive(Debug)]
pub enum SpatialError {
    /// Kernel name is not one of the known profiles
    UnknownKernel(String),
    /// Known kernel that the selected backend cannot express
    UnsupportedKernel { backend: &'static str, kernel: String },
    /// Parameter key not valid for the kernel, or an unusable value
    InvalidParameter { kernel: String, key: String, reason: String },
    /// Parameter required by the kernel is absent after merging defaults
    MissingParameter { kernel: String, key: String },
    /// Feature deliberately not offered by a backend (e.g. 3D)
    NotImplemented(String),
    /// Structural configuration problem (side length, node count, ...)
    InvalidConfig(String),
    /// Query or connect issued before `build`
    NotBuilt,
    /// Connection query issued before `connect`
    NotConnected,
    /// No samples to run a goodness-of-fit test on
    EmptySample,
    /// Expected count has zero variance, Z statistic undefined
    DegenerateVariance,
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for SpatialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKernel(name) => write!(f, "Unknown kernel: {}", name),
            Self::UnsupportedKernel { backend, kernel } => {
                write!(f, "Kernel '{}' is not supported by the {} backend", kernel, backend)
            }
            Self::InvalidParameter { kernel, key, reason } => {
                write!(f, "Invalid parameter '{}' for {} kernel: {}", key, kernel, reason)
            }
            Self::MissingParameter { kernel, key } => {
                write!(f, "Missing parameter '{}' for {} kernel", key, kernel)
            }
            Self::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::NotBuilt => write!(f, "Population has not been built"),
            Self::NotConnected => write!(f, "Population has not been connected"),
            Self::EmptySample => write!(f, "No connections to test"),
            Self::DegenerateVariance => write!(f, "Expected connection count has zero variance"),
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Yaml(e) => write!(f, "YAML error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for SpatialError {}

impl From<std::io::Error> for SpatialError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_yaml::Error> for SpatialError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml(e)
    }
}

impl From<serde_json::Error> for SpatialError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SpatialError>;
