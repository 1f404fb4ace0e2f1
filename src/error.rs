//! Error types
//!
//! The simulation itself never fails: degenerate geometry falls back to default
//! normals and misconfigured bodies are the caller's responsibility. Only loading
//! an [`EngineConfig`](crate::EngineConfig) can go wrong.

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
