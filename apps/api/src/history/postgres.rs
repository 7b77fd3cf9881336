//! Durable history backend on PostgreSQL.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE history_entries (
//!     id              UUID PRIMARY KEY,
//!     user_id         TEXT NOT NULL,
//!     timestamp       TIMESTAMPTZ NOT NULL,
//!     company         TEXT NOT NULL,
//!     company_url     TEXT NOT NULL,
//!     jobs_count      INT NOT NULL,
//!     top_match_score INT
//! );
//! CREATE INDEX idx_history_user_time ON history_entries (user_id, timestamp DESC);
//! ```

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::history::HistoryBackend;
use crate::models::history::HistoryEntry;

pub struct PgHistoryBackend {
    pool: PgPool,
}

impl PgHistoryBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryBackend for PgHistoryBackend {
    async fn append(&self, entry: &HistoryEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO history_entries
                (id, user_id, timestamp, company, company_url, jobs_count, top_match_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.user_id)
        .bind(entry.timestamp)
        .bind(&entry.company)
        .bind(&entry.company_url)
        .bind(entry.jobs_count)
        .bind(entry.top_match_score)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let entries = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, user_id, timestamp, company, company_url, jobs_count, top_match_score
            FROM history_entries
            WHERE user_id = $1
            ORDER BY timestamp DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
