//! Error types for policy lookup and catalogue construction.

use featuregate_types::FeatureId;
use thiserror::Error;

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Lookup errors. These are programming errors: gates for unknown features
/// fail at construction instead of rendering unguarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("unknown feature: {0}")]
    UnknownFeature(String),
}

/// Catalogue validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogueError {
    #[error("feature {0} is registered more than once")]
    DuplicateFeature(FeatureId),

    #[error("feature id must not be empty")]
    EmptyFeatureId,
}
