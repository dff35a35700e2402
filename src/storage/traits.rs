//! Storage trait definitions

use crate::session::{Capture, CaptureSummary, Session};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Store connection lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence for the capture session and per-kit captures
///
/// The session is a single document; saving replaces it. Captures are keyed
/// by kit, and saving a kit again overwrites the earlier capture.
pub trait CaptureStore: Send + Sync {
    // === Session ===

    /// Replace the stored session
    fn save_session(&self, session: &Session) -> StorageResult<()>;

    /// Load the stored session, if any
    fn load_session(&self) -> StorageResult<Option<Session>>;

    /// Remove the stored session. Returns true if one existed.
    fn clear_session(&self) -> StorageResult<bool>;

    // === Captures ===

    /// Insert or replace the capture for `capture.kit`
    fn save_capture(&self, capture: &Capture) -> StorageResult<()>;

    fn load_capture(&self, kit: &str) -> StorageResult<Option<Capture>>;

    /// Delete a kit's capture. Returns true if one existed.
    fn delete_capture(&self, kit: &str) -> StorageResult<bool>;

    /// All captures, ordered by kit
    fn list_captures(&self) -> StorageResult<Vec<CaptureSummary>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: CaptureStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
