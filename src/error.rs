//! Crate-level error type

use crate::storage::StorageError;
use crate::workflow::DriverError;
use thiserror::Error;

/// Hard failures surfaced to callers.
///
/// Data-quality problems inside a pedigree (unresolvable connectors,
/// odd labels, too many parents) are never errors; they end up in the
/// diagnostic log of the [`Pedigree`](crate::Pedigree) instead.
#[derive(Debug, Error)]
pub enum PedigraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Page driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Kit not found in session: {0}")]
    UnknownKit(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for pedigraph operations
pub type PedigraphResult<T> = Result<T, PedigraphError>;
