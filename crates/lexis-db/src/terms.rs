//! Term repository: the consistency coordinator.
//!
//! Writes enter here. The repository settles the term's identity per its
//! type, persists the row inside a relational transaction, and pushes the
//! derived document to the search index before the transaction commits — an
//! index failure aborts the relational write. The inverse partial write
//! (document pushed, relational commit lost) is repairable drift; the
//! reindexer rebuilds the index from the authoritative rows.
//!
//! Uniqueness is enforced solely by the `uri_hash` unique constraint. A
//! conflict on a temporary term's derived URI means the identical
//! (vocabulary, value) pair already exists, and the existing term is
//! returned unchanged — the idempotent get-or-create contract, visible in
//! [`TermCreation`].

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};

use lexis_core::{
    identity, validation, AdditionalFields, CreateTermRequest, Error, IndexDocument, Result,
    RetryPolicy, SearchIndex, Term, TermCreation, TermRepository, TermType, UpdateTermRequest,
};

/// Attempts at generating a unique local-term URI before giving up.
pub const LOCAL_URI_ATTEMPTS: u32 = 5;

const SELECT_TERM_COLUMNS: &str =
    "SELECT uri, vocabulary_string_key, value, term_type, additional_fields FROM terms";

/// How a term obtains its URI, settled by the per-type supply rules.
enum UriPlan {
    /// Caller-supplied, subject to strict grammar validation.
    Supplied(String),
    /// Minted from the local URI base, retried on collision.
    Generate,
    /// Derived deterministically; validated by construction.
    Derived(String),
}

/// Map a `terms` row to its domain snapshot.
pub(crate) fn row_to_term(row: &PgRow) -> Result<Term> {
    let term_type = TermType::parse(&row.get::<String, _>("term_type"))?;
    let fields: serde_json::Value = row.get("additional_fields");
    let additional_fields: AdditionalFields =
        serde_json::from_value(fields).map_err(|e| Error::Serialization(e.to_string()))?;

    Ok(Term {
        uri: row.get("uri"),
        vocabulary_string_key: row.get("vocabulary_string_key"),
        value: row.get("value"),
        term_type,
        additional_fields,
    })
}

/// PostgreSQL implementation of [`TermRepository`].
pub struct PgTermRepository {
    pool: PgPool,
    index: Arc<dyn SearchIndex>,
    local_uri_base: String,
    temporary_uri_base: String,
    retry: RetryPolicy,
}

impl PgTermRepository {
    /// Create a new coordinator over the given pool and index adapter.
    pub fn new(
        pool: PgPool,
        index: Arc<dyn SearchIndex>,
        local_uri_base: impl Into<String>,
        temporary_uri_base: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            index,
            local_uri_base: local_uri_base.into(),
            temporary_uri_base: temporary_uri_base.into(),
            retry: RetryPolicy::transient_disconnects(),
        }
    }

    /// Override the transient-disconnect retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch the authoritative row for a URI, if present.
    async fn fetch_term(&self, uri: &str) -> Result<Option<Term>> {
        let query = format!("{} WHERE uri_hash = $1", SELECT_TERM_COLUMNS);
        let row = sqlx::query(&query)
            .bind(identity::sha256_hex(uri))
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(|r| row_to_term(&r)).transpose()
    }

    async fn vocabulary_exists(&self, string_key: &str) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM vocabularies WHERE string_key = $1")
                .bind(string_key)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(found.is_some())
    }

    /// Insert the row and push its document in one logical write.
    ///
    /// The document upsert and index commit happen while the relational
    /// transaction is still open; any index failure drops the transaction
    /// and rolls the insert back. A uri_hash uniqueness conflict surfaces as
    /// [`Error::UriExists`] for the caller to interpret per term type.
    async fn insert_and_index(&self, term: &Term) -> Result<()> {
        let doc = IndexDocument::from_term(term)?;
        let fields_json = serde_json::to_value(&term.additional_fields)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let inserted = sqlx::query(
            "INSERT INTO terms
                 (vocabulary_string_key, uri, uri_hash, value, value_hash, term_type, additional_fields)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&term.vocabulary_string_key)
        .bind(&term.uri)
        .bind(identity::sha256_hex(&term.uri))
        .bind(&term.value)
        .bind(identity::sha256_hex(&term.value))
        .bind(term.term_type.as_str())
        .bind(&fields_json)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(Error::UriExists(term.uri.clone()));
            }
            Err(e) => return Err(Error::Database(e)),
        }

        self.index.upsert(&doc).await?;
        self.index.commit().await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn create_term_inner(&self, req: &CreateTermRequest) -> Result<TermCreation> {
        // Per-type URI supply rules come before anything else, so a caller
        // mixing up the contract hears about that first.
        let plan = match req.term_type {
            TermType::External => match req.uri.as_deref() {
                Some(uri) => UriPlan::Supplied(uri.to_string()),
                None => {
                    return Err(Error::InvalidOpts(
                        "An external term requires a caller-supplied uri".into(),
                    ))
                }
            },
            TermType::Local => {
                if req.uri.is_some() {
                    return Err(Error::InvalidOpts(
                        "A local term's uri is generated and cannot be supplied".into(),
                    ));
                }
                UriPlan::Generate
            }
            TermType::Temporary => {
                let derived = identity::temporary_uri(
                    &self.temporary_uri_base,
                    &req.vocabulary_string_key,
                    &req.value,
                );
                if let Some(supplied) = req.uri.as_deref() {
                    if supplied != derived {
                        return Err(Error::InvalidTemporaryTermUri {
                            supplied: supplied.to_string(),
                            expected: derived,
                        });
                    }
                }
                if !req.additional_fields.is_empty() {
                    return Err(Error::InvalidOpts(
                        "A temporary term cannot carry additional fields".into(),
                    ));
                }
                UriPlan::Derived(derived)
            }
        };

        if !self.vocabulary_exists(&req.vocabulary_string_key).await? {
            return Err(Error::VocabularyNotFound(req.vocabulary_string_key.clone()));
        }
        validation::validate_field_keys(req.additional_fields.keys())?;

        let make_term = |uri: String| Term {
            uri,
            vocabulary_string_key: req.vocabulary_string_key.clone(),
            value: req.value.clone(),
            term_type: req.term_type,
            additional_fields: req.additional_fields.clone(),
        };

        match plan {
            UriPlan::Supplied(uri) => {
                identity::validate_uri(&uri)?;
                let term = make_term(uri);
                self.insert_and_index(&term).await?;
                self.log_created(&term);
                Ok(TermCreation::Created(term))
            }
            UriPlan::Generate => {
                for attempt in 1..=LOCAL_URI_ATTEMPTS {
                    let uri = identity::local_uri(&self.local_uri_base);
                    identity::validate_uri(&uri)?;
                    let term = make_term(uri);
                    match self.insert_and_index(&term).await {
                        Ok(()) => {
                            self.log_created(&term);
                            return Ok(TermCreation::Created(term));
                        }
                        Err(Error::UriExists(uri)) => {
                            // A random UUID collided; this is extremely rare.
                            warn!(
                                subsystem = "db",
                                component = "terms",
                                op = "create",
                                attempt,
                                uri = %uri,
                                "Generated local URI collided; generating another"
                            );
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(Error::UriGenerationExhausted {
                    attempts: LOCAL_URI_ATTEMPTS,
                })
            }
            UriPlan::Derived(uri) => {
                let term = make_term(uri);
                match self.insert_and_index(&term).await {
                    Ok(()) => {
                        self.log_created(&term);
                        Ok(TermCreation::Created(term))
                    }
                    Err(Error::UriExists(uri)) => {
                        // The identical (vocabulary, value) pair exists; the
                        // idempotent-create contract returns it unchanged.
                        debug!(
                            subsystem = "db",
                            component = "terms",
                            op = "create",
                            term_type = "temporary",
                            uri = %uri,
                            "Temporary term already exists; returning existing"
                        );
                        let existing = self
                            .fetch_term(&uri)
                            .await?
                            .ok_or_else(|| Error::TermNotFound(uri))?;
                        Ok(TermCreation::Existing(existing))
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    fn log_created(&self, term: &Term) {
        info!(
            subsystem = "db",
            component = "terms",
            op = "create",
            term_type = term.term_type.as_str(),
            vocabulary = %term.vocabulary_string_key,
            uri = %term.uri,
            "Created term"
        );
    }

    async fn update_term_inner(&self, uri: &str, req: &UpdateTermRequest) -> Result<Term> {
        let existing = self
            .fetch_term(uri)
            .await?
            .ok_or_else(|| Error::TermNotFound(uri.to_string()))?;

        if existing.term_type == TermType::Temporary {
            return Err(Error::TemporaryTermImmutable(uri.to_string()));
        }

        if let Some(fields) = &req.additional_fields {
            validation::validate_field_keys(fields.keys())?;
        }

        let additional_fields = match &req.additional_fields {
            None => existing.additional_fields.clone(),
            Some(supplied) if req.merge_additional_fields => {
                let mut merged = existing.additional_fields.clone();
                for (key, entry) in supplied {
                    match entry {
                        Some(value) => {
                            merged.insert(key.clone(), value.clone());
                        }
                        // A null merged value is an explicit tombstone.
                        None => {
                            merged.remove(key);
                        }
                    }
                }
                merged
            }
            Some(supplied) => supplied
                .iter()
                .filter_map(|(k, v)| v.clone().map(|v| (k.clone(), v)))
                .collect::<BTreeMap<_, _>>(),
        };

        let updated = Term {
            uri: existing.uri.clone(),
            vocabulary_string_key: existing.vocabulary_string_key.clone(),
            value: req.value.clone().unwrap_or_else(|| existing.value.clone()),
            term_type: existing.term_type,
            additional_fields,
        };

        let doc = IndexDocument::from_term(&updated)?;
        let fields_json = serde_json::to_value(&updated.additional_fields)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "UPDATE terms
             SET value = $1, value_hash = $2, additional_fields = $3
             WHERE uri_hash = $4",
        )
        .bind(&updated.value)
        .bind(identity::sha256_hex(&updated.value))
        .bind(&fields_json)
        .bind(identity::sha256_hex(uri))
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        self.index.upsert(&doc).await?;
        self.index.commit().await?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "terms",
            op = "update",
            uri = %uri,
            "Updated term"
        );
        Ok(updated)
    }

    async fn delete_term_inner(&self, uri: &str, commit: bool) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM terms WHERE uri_hash = $1")
            .bind(identity::sha256_hex(uri))
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        self.index.delete_by_uri(uri).await?;
        if commit {
            self.index.commit().await?;
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "terms",
            op = "delete",
            uri = %uri,
            index_commit = commit,
            "Deleted term"
        );
        Ok(())
    }

    async fn delete_vocabulary_inner(&self, string_key: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM vocabularies WHERE string_key = $1")
            .bind(string_key)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TermRepository for PgTermRepository {
    async fn create_term(&self, req: CreateTermRequest) -> Result<TermCreation> {
        self.retry
            .run("create_term", || self.create_term_inner(&req))
            .await
    }

    async fn update_term(&self, uri: &str, req: UpdateTermRequest) -> Result<Term> {
        self.retry
            .run("update_term", || self.update_term_inner(uri, &req))
            .await
    }

    async fn delete_term(&self, uri: &str, commit: bool) -> Result<()> {
        self.retry
            .run("delete_term", || self.delete_term_inner(uri, commit))
            .await
    }

    async fn delete_vocabulary(&self, string_key: &str) -> Result<u64> {
        self.retry
            .run("delete_vocabulary", || {
                self.delete_vocabulary_inner(string_key)
            })
            .await
    }
}
