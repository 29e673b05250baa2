//! Storage backends for the interactome
//!
//! Storage goes through the `InteractionStore` trait. The primary
//! implementation is `SqliteStore` for persistent storage.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    BaitSummary, Diagnostics, InteractionStore, OpenStore, ProteinStats, StorageError,
    StorageResult, StoreStats,
};
