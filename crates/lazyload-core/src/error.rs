use thiserror::Error;

/// Failure reported by an asset fetcher for a single script or stylesheet.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("asset not found: {url}")]
    NotFound { url: String },

    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("invalid asset url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("I/O error reading {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("package load error: {package} ({url})")]
    PackageLoad {
        package: String,
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("package style load error: {package} ({url})")]
    StyleLoad {
        package: String,
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("class '{class}' is outside package namespace '{package}'")]
    UnresolvableClass { package: String, class: String },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl LoadError {
    /// Name of the package a load failure belongs to, if any.
    pub fn package(&self) -> Option<&str> {
        match self {
            LoadError::PackageLoad { package, .. }
            | LoadError::StyleLoad { package, .. }
            | LoadError::UnresolvableClass { package, .. } => Some(package),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
