//! Idempotent schema bootstrap for the two relational tables.
//!
//! `uri` is unbounded text, so uniqueness is enforced through the fixed-width
//! `uri_hash` column instead of an unbounded-length unique index.

use sqlx::PgPool;
use tracing::info;

use lexis_core::{Error, Result};

/// Table names the service requires.
pub const REQUIRED_TABLES: &[&str] = &["vocabularies", "terms"];

const CREATE_VOCABULARIES: &str = r#"
CREATE TABLE IF NOT EXISTS vocabularies (
    id BIGSERIAL PRIMARY KEY,
    string_key VARCHAR(255) NOT NULL UNIQUE,
    display_label VARCHAR(255) NOT NULL
)
"#;

const CREATE_TERMS: &str = r#"
CREATE TABLE IF NOT EXISTS terms (
    id BIGSERIAL PRIMARY KEY,
    vocabulary_string_key VARCHAR(255) NOT NULL,
    uri TEXT NOT NULL,
    uri_hash CHAR(64) NOT NULL UNIQUE,
    value TEXT NOT NULL,
    value_hash CHAR(64) NOT NULL,
    term_type VARCHAR(16) NOT NULL,
    additional_fields JSONB NOT NULL DEFAULT '{}'::jsonb
)
"#;

const CREATE_TERMS_VOCABULARY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_terms_vocabulary_string_key ON terms (vocabulary_string_key)";

const CREATE_TERMS_VALUE_HASH_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_terms_value_hash ON terms (value_hash)";

/// Create the required tables and indexes if they do not already exist.
pub async fn create_required_tables(pool: &PgPool) -> Result<()> {
    for statement in [
        CREATE_VOCABULARIES,
        CREATE_TERMS,
        CREATE_TERMS_VOCABULARY_INDEX,
        CREATE_TERMS_VALUE_HASH_INDEX,
    ] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }

    info!(
        subsystem = "db",
        component = "schema",
        op = "bootstrap",
        "Required tables are present"
    );
    Ok(())
}

/// Whether every required table exists in the current search path.
pub async fn required_tables_exist(pool: &PgPool) -> Result<bool> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(table)
            .fetch_one(pool)
            .await
            .map_err(Error::Database)?;
        if !exists {
            return Ok(false);
        }
    }
    Ok(true)
}
