//! The tantivy-backed search index adapter.
//!
//! One shared writer behind a mutex; mutations stage in opstamp order and
//! become visible at commit, when the reader snapshot is reloaded. An upsert
//! is a staged delete-by-uri followed by an add, so replaying a document is
//! always safe.

use std::path::Path;

use parking_lot::Mutex;
use tantivy::directory::MmapDirectory;
use tantivy::schema::Value;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tracing::{debug, info};

use async_trait::async_trait;
use lexis_core::{Error, IndexDocument, Result, SearchIndex, TermType};

use crate::schema::{build_schema, register_tokenizers, TermFields};

/// Writer memory budget; well above tantivy's floor, modest for term-sized
/// documents.
const WRITER_MEMORY_BUDGET: usize = 50_000_000;

/// Tantivy implementation of [`SearchIndex`].
pub struct TantivyTermIndex {
    writer: Mutex<IndexWriter<TantivyDocument>>,
    reader: IndexReader,
    fields: TermFields,
}

impl TantivyTermIndex {
    /// Open (or create) the on-disk index at `dir`.
    pub fn open_in_dir(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let directory = MmapDirectory::open(dir).map_err(|e| Error::Index(e.to_string()))?;
        let (schema, fields) = build_schema();
        let index =
            Index::open_or_create(directory, schema).map_err(|e| Error::Index(e.to_string()))?;
        let built = Self::from_index(index, fields)?;
        info!(
            subsystem = "index",
            component = "tantivy",
            op = "open",
            dir = %dir.display(),
            "Opened term index"
        );
        Ok(built)
    }

    /// Build an in-RAM index, for tests and ephemeral use.
    pub fn create_in_ram() -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        Self::from_index(index, fields)
    }

    fn from_index(index: Index, fields: TermFields) -> Result<Self> {
        register_tokenizers(&index)?;
        let writer = index
            .writer(WRITER_MEMORY_BUDGET)
            .map_err(|e| Error::Index(e.to_string()))?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e: tantivy::TantivyError| Error::Index(e.to_string()))?;
        Ok(Self {
            writer: Mutex::new(writer),
            reader,
            fields,
        })
    }

    /// Schema fields, for the query engine.
    pub(crate) fn fields(&self) -> &TermFields {
        &self.fields
    }

    /// A searcher over the last committed snapshot.
    pub(crate) fn searcher(&self) -> tantivy::Searcher {
        self.reader.searcher()
    }

    /// Map a retrieved document back to its [`IndexDocument`] projection,
    /// discarding any index-internal bookkeeping.
    pub(crate) fn read_document(&self, doc: &TantivyDocument) -> Result<IndexDocument> {
        let get_str = |field, name: &str| -> Result<String> {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| Error::Index(format!("indexed document missing field: {}", name)))
        };

        let term_type = TermType::parse(&get_str(self.fields.term_type, "type")?)?;
        Ok(IndexDocument {
            uri: get_str(self.fields.uri, "uri")?,
            value: get_str(self.fields.value, "value")?,
            term_type,
            vocabulary_string_key: get_str(
                self.fields.vocabulary_string_key,
                "vocabulary_string_key",
            )?,
            additional_fields: get_str(self.fields.additional_fields, "additional_fields")?,
        })
    }
}

#[async_trait]
impl SearchIndex for TantivyTermIndex {
    async fn upsert(&self, doc: &IndexDocument) -> Result<()> {
        let writer = self.writer.lock();
        writer.delete_term(tantivy::Term::from_field_text(self.fields.uri, &doc.uri));
        writer
            .add_document(doc!(
                self.fields.uri => doc.uri.clone(),
                self.fields.vocabulary_string_key => doc.vocabulary_string_key.clone(),
                self.fields.value => doc.value.clone(),
                self.fields.term_type => doc.term_type.as_str(),
                self.fields.additional_fields => doc.additional_fields.clone(),
                self.fields.value_exact => doc.value.clone(),
                self.fields.value_ngrams => doc.value.clone(),
            ))
            .map_err(|e| Error::Index(e.to_string()))?;
        Ok(())
    }

    async fn delete_by_uri(&self, uri: &str) -> Result<()> {
        self.writer
            .lock()
            .delete_term(tantivy::Term::from_field_text(self.fields.uri, uri));
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        self.writer
            .lock()
            .commit()
            .map_err(|e| Error::Index(e.to_string()))?;
        self.reader
            .reload()
            .map_err(|e| Error::Index(e.to_string()))?;
        debug!(
            subsystem = "index",
            component = "tantivy",
            op = "commit",
            num_docs = self.searcher().num_docs(),
            "Committed index"
        );
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.writer
            .lock()
            .delete_all_documents()
            .map_err(|e| Error::Index(e.to_string()))?;
        Ok(())
    }
}
