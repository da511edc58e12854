//! Full index rebuild from the authoritative relational rows.
//!
//! The scan pages by `id` — internal insertion order, never a mutable field —
//! so a single pass is complete even under concurrent writes. Documents are
//! upserted without per-row commits; one commit at the end makes the rebuilt
//! index visible atomically.

use std::sync::Arc;
use std::time::Instant;

use sqlx::{PgPool, Row};
use tracing::info;

use lexis_core::{Error, IndexDocument, Result, SearchIndex};

use crate::terms::row_to_term;

/// Rows fetched per page during a full reindex.
pub const REINDEX_PAGE_SIZE: i64 = 100;

/// Progress snapshot handed to the reindex callback after each page.
#[derive(Debug, Clone, Copy)]
pub struct ReindexProgress {
    /// Rows mapped and pushed so far.
    pub indexed: u64,
    /// Row count observed when the scan started.
    pub total: u64,
}

/// Rebuilds the search index from the relational store.
pub struct Reindexer {
    pool: PgPool,
    index: Arc<dyn SearchIndex>,
}

impl Reindexer {
    /// Create a new reindexer over the given pool and index adapter.
    pub fn new(pool: PgPool, index: Arc<dyn SearchIndex>) -> Self {
        Self { pool, index }
    }

    /// Rebuild the whole index; with `clear`, every existing document is
    /// dropped in the same visibility step as the rebuild.
    pub async fn reindex_all(&self, clear: bool) -> Result<u64> {
        self.reindex_all_with_progress(clear, |_| {}).await
    }

    /// [`reindex_all`](Reindexer::reindex_all) with a per-page progress
    /// callback, for batch entry points that report to an operator.
    pub async fn reindex_all_with_progress<F>(&self, clear: bool, mut progress: F) -> Result<u64>
    where
        F: FnMut(ReindexProgress),
    {
        let start = Instant::now();

        if clear {
            self.index.clear().await?;
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM terms")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut last_id: i64 = 0;
        let mut indexed: u64 = 0;

        loop {
            let rows = sqlx::query(
                "SELECT id, uri, vocabulary_string_key, value, term_type, additional_fields
                 FROM terms
                 WHERE id > $1
                 ORDER BY id
                 LIMIT $2",
            )
            .bind(last_id)
            .bind(REINDEX_PAGE_SIZE)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

            if rows.is_empty() {
                break;
            }

            for row in &rows {
                last_id = row.get("id");
                let term = row_to_term(row)?;
                self.index.upsert(&IndexDocument::from_term(&term)?).await?;
                indexed += 1;
            }

            progress(ReindexProgress {
                indexed,
                total: total as u64,
            });
        }

        self.index.commit().await?;

        info!(
            subsystem = "db",
            component = "reindex",
            op = "reindex_all",
            cleared = clear,
            result_count = indexed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Rebuilt search index from relational rows"
        );
        Ok(indexed)
    }
}
