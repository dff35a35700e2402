//! Storage backends for capture sessions
//!
//! Sessions and captures persist through the `CaptureStore` trait.
//! The implementation is `SqliteStore`.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{CaptureStore, OpenStore, StorageError, StorageResult};
