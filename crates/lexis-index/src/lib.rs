//! # lexis-index
//!
//! Tantivy-backed search index adapter and query engine for the lexis term
//! service.
//!
//! The index serves all term reads; the relational store remains the source
//! of truth, and the reindexer in `lexis-db` can rebuild everything here
//! from it at any time.

pub mod index;
pub mod query;
pub mod schema;

pub use index::TantivyTermIndex;
pub use query::{TermQueryEngine, QUERYABLE_FIELDS};
pub use schema::MIN_PARTIAL_QUERY_CHARS;
