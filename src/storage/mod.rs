pub mod memory;
pub mod sql;

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryLineStorage;
pub use sql::SqlxLineStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Capability set of the line store. Pollers are the only writers; every
/// subscription session reads through the same trait object, oblivious to
/// whether the backing is the in-memory map or SQL.
#[async_trait]
pub trait LineStorage: Send + Sync {
    /// Unconditional upsert of the latest line for a sport.
    async fn upload(&self, sport: &str, line: f64) -> Result<(), StorageError>;

    /// Snapshot read of the latest line.
    async fn get(&self, sport: &str) -> Result<Option<f64>, StorageError>;

    /// Snapshot of all known sports; the returned set is an owned copy, safe
    /// to retain across later uploads.
    async fn keys(&self) -> Result<HashSet<String>, StorageError>;

    /// Number of sports currently stored.
    async fn count(&self) -> Result<usize, StorageError>;
}
