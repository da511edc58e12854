//! # lexis-core
//!
//! Core types, traits, and identity rules for the lexis controlled-vocabulary
//! term service.
//!
//! This crate provides the foundational pieces the other lexis crates depend
//! on: the domain models, the error taxonomy, URI identity
//! generation/validation, key syntax rules, the term ↔ index-document
//! mapping, the component-seam traits, and the transient-disconnect retry
//! policy.

pub mod config;
pub mod document;
pub mod error;
pub mod identity;
pub mod models;
pub mod retry;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use config::{ServiceConfig, DEFAULT_TEMPORARY_URI_BASE};
pub use document::IndexDocument;
pub use error::{Error, Result};
pub use models::{
    AdditionalFields, CreateTermRequest, FieldValue, Term, TermCreation, TermType,
    UpdateTermRequest, Vocabulary,
};
pub use retry::{is_transient_disconnect, RetryPolicy, DEFAULT_RETRY_ATTEMPTS};
pub use traits::{SearchIndex, TermRepository, TermSearch, VocabularyRepository};
