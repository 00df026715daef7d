use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{LineStorage, StorageError};

/// In-memory line store guarded by a reader/writer lock. Writers serialize on
/// the write lock; readers proceed in parallel.
#[derive(Default)]
pub struct MemoryLineStorage {
    lines: RwLock<HashMap<String, f64>>,
}

impl MemoryLineStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LineStorage for MemoryLineStorage {
    async fn upload(&self, sport: &str, line: f64) -> Result<(), StorageError> {
        self.lines.write().insert(sport.to_string(), line);
        Ok(())
    }

    async fn get(&self, sport: &str) -> Result<Option<f64>, StorageError> {
        Ok(self.lines.read().get(sport).copied())
    }

    async fn keys(&self) -> Result<HashSet<String>, StorageError> {
        Ok(self.lines.read().keys().cloned().collect())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.lines.read().len())
    }
}
