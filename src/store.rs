//! Durable seen-url store backing the novelty filter.
//!
//! One append-mostly sqlite table of `(url_hash, first_seen)` pairs.
//! Identity is the SHA-256 of the raw URL string; no canonicalization, so
//! two syntactically different URLs for the same resource are distinct.

use crate::types::Result;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS seen_urls (
    url_hash   TEXT PRIMARY KEY,
    first_seen TEXT NOT NULL
)
"#;

pub struct SeenStore {
    pool: SqlitePool,
}

impl SeenStore {
    /// Open (creating if missing) the store at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::init(pool).await
    }

    /// In-memory store; the single pooled connection owns the database.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::init(pool).await
    }

    async fn init(pool: SqlitePool) -> Result<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn url_hash(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub async fn is_seen(&self, url: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM seen_urls WHERE url_hash = ?")
            .bind(Self::url_hash(url))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Order-preserving subsequence of `urls` with no existing entry.
    pub async fn filter_new(&self, urls: &[String]) -> Result<Vec<String>> {
        let mut new_urls = Vec::new();
        for url in urls {
            if !self.is_seen(url).await? {
                new_urls.push(url.clone());
            }
        }
        debug!("filter_new: {} of {} urls are new", new_urls.len(), urls.len());
        Ok(new_urls)
    }

    /// Idempotent bulk insert; re-inserting a present key is a no-op.
    pub async fn mark_seen(&self, urls: &[String]) -> Result<()> {
        self.mark_seen_at(urls, Utc::now()).await
    }

    /// Insert entries with an explicit first-seen timestamp.
    pub async fn mark_seen_at(&self, urls: &[String], first_seen: DateTime<Utc>) -> Result<()> {
        if urls.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for url in urls {
            sqlx::query(
                "INSERT INTO seen_urls (url_hash, first_seen) VALUES (?, ?) \
                 ON CONFLICT(url_hash) DO NOTHING",
            )
            .bind(Self::url_hash(url))
            .bind(first_seen)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!("marked {} urls as seen", urls.len());
        Ok(())
    }

    /// Delete entries first seen before `now - retention`; returns the
    /// number deleted.
    pub async fn cleanup(&self, retention: Duration) -> Result<u64> {
        let cutoff = Utc::now() - retention;
        let result = sqlx::query("DELETE FROM seen_urls WHERE first_seen < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        let deleted = result.rows_affected();
        if deleted > 0 {
            info!("cleanup: removed {} entries older than {} days", deleted, retention.num_days());
        }
        Ok(deleted)
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seen_urls")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
