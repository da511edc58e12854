//! # lexis
//!
//! Controlled-vocabulary term service: vocabularies and URI-identified terms
//! persisted in an authoritative PostgreSQL store and mirrored into a
//! tantivy search index that serves all term reads.
//!
//! The [`TermService`] is an explicitly constructed service object — there
//! is no process-global client. Construct it from a [`ServiceConfig`], use
//! the repositories and query engine it exposes, and [`disconnect`]
//! (idempotently) when done.
//!
//! ```rust,ignore
//! use lexis::{CreateTermRequest, ServiceConfig, TermRepository, TermSearch, TermService};
//!
//! #[tokio::main]
//! async fn main() -> lexis::Result<()> {
//!     let service = TermService::connect(ServiceConfig::new(
//!         "postgres://localhost/lexis",
//!         "/var/lib/lexis/index",
//!         "http://id.example.org/term/",
//!     ))
//!     .await?;
//!     service.create_required_tables().await?;
//!
//!     service.vocabularies.create("names", "Names").await?;
//!     let created = service
//!         .terms
//!         .create_term(CreateTermRequest::temporary("names", "Smith, Jane"))
//!         .await?;
//!
//!     let hits = service.search.search_by_text("names", "smi", 10, 0).await?;
//!     println!("{} hit(s) for {}", hits.len(), created.term().uri);
//!
//!     service.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! [`disconnect`]: TermService::disconnect

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

pub use lexis_core::*;
pub use lexis_db::{
    create_pool, create_pool_with_config, create_required_tables, required_tables_exist,
    PgTermRepository, PgVocabularyRepository, PoolConfig, Reindexer, ReindexProgress,
};
pub use lexis_index::{TantivyTermIndex, TermQueryEngine, QUERYABLE_FIELDS};

/// The connected service: both backends plus every component wired over
/// them.
///
/// Backend handles are process-wide shared state with explicit
/// acquire/release scoping per operation; nothing here is a reassignable
/// global.
pub struct TermService {
    pool: PgPool,
    /// Vocabulary registry (relational store).
    pub vocabularies: PgVocabularyRepository,
    /// Term repository: the write path and consistency coordinator.
    pub terms: PgTermRepository,
    /// Search query engine: the read path, served entirely by the index.
    pub search: TermQueryEngine,
    /// Full index rebuild from the authoritative rows.
    pub reindexer: Reindexer,
    index: Arc<TantivyTermIndex>,
}

impl TermService {
    /// Connect both backends with the default pool configuration.
    pub async fn connect(config: ServiceConfig) -> Result<Self> {
        Self::connect_with_pool_config(config, PoolConfig::default()).await
    }

    /// Connect both backends with an explicit pool configuration.
    pub async fn connect_with_pool_config(
        config: ServiceConfig,
        pool_config: PoolConfig,
    ) -> Result<Self> {
        config.validate()?;

        let pool = create_pool_with_config(&config.database_url, pool_config).await?;
        let index = Arc::new(TantivyTermIndex::open_in_dir(&config.index_dir)?);

        let service = Self {
            vocabularies: PgVocabularyRepository::new(pool.clone()),
            terms: PgTermRepository::new(
                pool.clone(),
                index.clone() as Arc<dyn SearchIndex>,
                config.local_uri_base.clone(),
                config.temporary_uri_base.clone(),
            ),
            search: TermQueryEngine::new(index.clone()),
            reindexer: Reindexer::new(pool.clone(), index.clone() as Arc<dyn SearchIndex>),
            pool,
            index,
        };

        info!(
            subsystem = "service",
            op = "connect",
            index_dir = %config.index_dir.display(),
            "Term service connected"
        );
        Ok(service)
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The underlying index adapter.
    pub fn index(&self) -> Arc<TantivyTermIndex> {
        self.index.clone()
    }

    /// Create the required relational tables if absent.
    pub async fn create_required_tables(&self) -> Result<()> {
        create_required_tables(&self.pool).await
    }

    /// Whether the required relational tables exist.
    pub async fn required_tables_exist(&self) -> Result<bool> {
        required_tables_exist(&self.pool).await
    }

    /// Exercise both backends; errors if either is unreachable.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        // A commit on an unchanged writer round-trips the index backend.
        let index: &dyn SearchIndex = self.index.as_ref();
        index.commit().await?;
        Ok(())
    }

    /// Whether [`disconnect`](TermService::disconnect) has not yet been
    /// called.
    pub fn is_connected(&self) -> bool {
        !self.pool.is_closed()
    }

    /// Release pooled connections. Safe to call more than once.
    pub async fn disconnect(&self) {
        self.pool.close().await;
        info!(subsystem = "service", op = "disconnect", "Term service disconnected");
    }
}
