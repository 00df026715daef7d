use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{AnyPool, Row};

use super::{LineStorage, StorageError};

/// SQL-backed line store, indexed by sport as primary key. Responsible only
/// for persistence; row-level upsert keeps `upload` unconditional.
pub struct SqlxLineStorage {
    pool: AnyPool,
}

impl SqlxLineStorage {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LineStorage for SqlxLineStorage {
    async fn upload(&self, sport: &str, line: f64) -> Result<(), StorageError> {
        sqlx::query(
            r#"
INSERT INTO sportlines (sport, value) VALUES (?, ?)
ON CONFLICT (sport) DO UPDATE SET value = excluded.value;
"#,
        )
        .bind(sport)
        .bind(line)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, sport: &str) -> Result<Option<f64>, StorageError> {
        let row = sqlx::query("SELECT value FROM sportlines WHERE sport = ?;")
            .bind(sport)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<f64, _>("value")))
    }

    async fn keys(&self) -> Result<HashSet<String>, StorageError> {
        let rows = sqlx::query("SELECT sport FROM sportlines;")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get::<String, _>("sport")).collect())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM sportlines;")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("n") as usize)
    }
}
