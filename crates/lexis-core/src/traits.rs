//! Component seams: the traits the relational layer, index adapter, and
//! query engine implement.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::document::IndexDocument;
use crate::error::Result;
use crate::models::{CreateTermRequest, Term, TermCreation, UpdateTermRequest, Vocabulary};

/// Write-side adapter for the search index collaborator.
///
/// Mutations stage into the index writer; nothing is visible to readers until
/// [`commit`](SearchIndex::commit). `clear` likewise stages a delete-all that
/// takes effect at the next commit, so a reindex can clear and repopulate in
/// one visibility step.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Add or replace the document identified by `doc.uri`.
    async fn upsert(&self, doc: &IndexDocument) -> Result<()>;

    /// Stage deletion of the document with the given URI.
    async fn delete_by_uri(&self, uri: &str) -> Result<()>;

    /// Flush staged mutations and make them visible to readers.
    async fn commit(&self) -> Result<()>;

    /// Stage deletion of every document.
    async fn clear(&self) -> Result<()>;
}

/// CRUD over named vocabularies in the relational store.
#[async_trait]
pub trait VocabularyRepository: Send + Sync {
    /// Create a vocabulary; the key must pass syntax rules and be unused.
    async fn create(&self, string_key: &str, display_label: &str) -> Result<Vocabulary>;

    /// Look up a vocabulary by string key.
    async fn find(&self, string_key: &str) -> Result<Option<Vocabulary>>;

    /// Replace the display label; errors if the vocabulary is absent.
    async fn update(&self, string_key: &str, display_label: &str) -> Result<Vocabulary>;

    /// Unconditional delete; returns the number of rows removed.
    async fn delete(&self, string_key: &str) -> Result<u64>;

    /// Alphabetical by string key, stable pagination.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Vocabulary>>;
}

/// The consistency coordinator: validates inputs, settles identity, writes
/// the relational row, and propagates the derived document to the index.
#[async_trait]
pub trait TermRepository: Send + Sync {
    /// Create a term per its type's URI rules; temporary duplicates come back
    /// as [`TermCreation::Existing`].
    async fn create_term(&self, req: CreateTermRequest) -> Result<TermCreation>;

    /// Update value and/or additional fields; temporary terms always refuse.
    async fn update_term(&self, uri: &str, req: UpdateTermRequest) -> Result<Term>;

    /// Remove the term from both stores; `commit` controls whether the index
    /// commit is flushed immediately or deferred for batch callers.
    async fn delete_term(&self, uri: &str, commit: bool) -> Result<()>;

    /// Unconditional relational delete of a vocabulary; indexed terms are
    /// untouched (repairable drift).
    async fn delete_vocabulary(&self, string_key: &str) -> Result<u64>;
}

/// Read path: every term lookup goes through the index, never the relational
/// store.
#[async_trait]
pub trait TermSearch: Send + Sync {
    /// Exact-match lookup by URI.
    async fn find_by_uri(&self, uri: &str) -> Result<Option<Term>>;

    /// Exact-match lookup over the allow-listed core fields
    /// (`uri`, `vocabulary_string_key`, `value`, `type`); ordered by value
    /// then URI.
    async fn find_by_fields(
        &self,
        criteria: &BTreeMap<String, String>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Term>>;

    /// Alphabetical browse of a vocabulary, value then URI.
    async fn list_terms(
        &self,
        vocabulary_string_key: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Term>>;

    /// Relevance-ranked partial matching; blank queries delegate to
    /// [`list_terms`](TermSearch::list_terms), queries under 3 characters
    /// match whole values only.
    async fn search_by_text(
        &self,
        vocabulary_string_key: &str,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Term>>;
}
