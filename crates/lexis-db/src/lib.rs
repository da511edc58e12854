//! # lexis-db
//!
//! PostgreSQL layer for the lexis term service.
//!
//! This crate provides:
//! - Connection pool management
//! - Idempotent schema bootstrap
//! - The vocabulary registry
//! - The term repository (consistency coordinator between the relational
//!   store and the search index)
//! - The reindexer, the authoritative repair path for index drift
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lexis_core::{CreateTermRequest, SearchIndex, TermRepository};
//! use lexis_db::{create_pool, PgTermRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool("postgres://localhost/lexis").await?;
//!     let index: Arc<dyn SearchIndex> = my_index_adapter();
//!     let terms = PgTermRepository::new(
//!         pool,
//!         index,
//!         "http://id.example.org/term/",
//!         "temporary:",
//!     );
//!
//!     let created = terms
//!         .create_term(CreateTermRequest::temporary("names", "Smith, Jane"))
//!         .await?;
//!     println!("uri: {}", created.term().uri);
//!     Ok(())
//! }
//! ```

pub mod pool;
pub mod reindex;
pub mod schema;
pub mod terms;
pub mod vocabularies;

// Always compiled so integration tests (in tests/) can use the fixtures.
pub mod test_fixtures;

// Re-export core types
pub use lexis_core::*;

pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use reindex::{Reindexer, ReindexProgress, REINDEX_PAGE_SIZE};
pub use schema::{create_required_tables, required_tables_exist, REQUIRED_TABLES};
pub use terms::{PgTermRepository, LOCAL_URI_ATTEMPTS};
pub use vocabularies::PgVocabularyRepository;
