//! Vocabulary registry implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use lexis_core::{validation, Error, Result, Vocabulary, VocabularyRepository};

/// PostgreSQL implementation of [`VocabularyRepository`].
pub struct PgVocabularyRepository {
    pool: PgPool,
}

impl PgVocabularyRepository {
    /// Create a new repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VocabularyRepository for PgVocabularyRepository {
    async fn create(&self, string_key: &str, display_label: &str) -> Result<Vocabulary> {
        validation::validate_vocabulary_key(string_key)?;

        let result = sqlx::query(
            "INSERT INTO vocabularies (string_key, display_label) VALUES ($1, $2)",
        )
        .bind(string_key)
        .bind(display_label)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(
                    subsystem = "db",
                    component = "vocabularies",
                    op = "create",
                    string_key,
                    "Created vocabulary"
                );
                Ok(Vocabulary {
                    string_key: string_key.to_string(),
                    display_label: display_label.to_string(),
                })
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(Error::VocabularyExists(string_key.to_string()))
            }
            Err(e) => Err(Error::Database(e)),
        }
    }

    async fn find(&self, string_key: &str) -> Result<Option<Vocabulary>> {
        let row = sqlx::query(
            "SELECT string_key, display_label FROM vocabularies WHERE string_key = $1",
        )
        .bind(string_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Vocabulary {
            string_key: r.get("string_key"),
            display_label: r.get("display_label"),
        }))
    }

    async fn update(&self, string_key: &str, display_label: &str) -> Result<Vocabulary> {
        let result = sqlx::query(
            "UPDATE vocabularies SET display_label = $1 WHERE string_key = $2",
        )
        .bind(display_label)
        .bind(string_key)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::VocabularyNotFound(string_key.to_string()));
        }

        Ok(Vocabulary {
            string_key: string_key.to_string(),
            display_label: display_label.to_string(),
        })
    }

    async fn delete(&self, string_key: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM vocabularies WHERE string_key = $1")
            .bind(string_key)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "vocabularies",
            op = "delete",
            string_key,
            rows = result.rows_affected(),
            "Deleted vocabulary"
        );
        Ok(result.rows_affected())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Vocabulary>> {
        let rows = sqlx::query(
            "SELECT string_key, display_label FROM vocabularies
             ORDER BY string_key
             LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| Vocabulary {
                string_key: r.get("string_key"),
                display_label: r.get("display_label"),
            })
            .collect())
    }
}
