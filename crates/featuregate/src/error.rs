//! Error types for engine setup.

use featuregate_policy::{CatalogueError, PolicyError};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Setup and lookup failures. Gating outcomes are never errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid feature catalogue: {0}")]
    Catalogue(#[from] CatalogueError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("telemetry error: {0}")]
    Telemetry(String),
}
