//! Error types for the lexis term service.

use thiserror::Error;

/// Result type alias using lexis's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lexis operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Search index operation failed
    #[error("Search index error: {0}")]
    Index(String),

    /// Configuration error (missing or malformed required settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid combination of creation/update options
    #[error("Invalid opts: {0}")]
    InvalidOpts(String),

    /// URI failed strict http(s) grammar validation
    #[error("Invalid URI supplied: {0}")]
    InvalidUri(String),

    /// Vocabulary string key failed syntax rules or used a reserved word
    #[error("Invalid vocabulary string key: {0}")]
    InvalidVocabularyKey(String),

    /// Additional-field key failed syntax rules or collided with a reserved name
    #[error("Invalid additional field key: {0}")]
    InvalidFieldKey(String),

    /// Unknown term type string
    #[error("Invalid term type: {0}")]
    InvalidTermType(String),

    /// Caller-supplied URI for a temporary term did not match the derived URI
    #[error("Invalid URI for temporary term: supplied {supplied}, expected {expected}")]
    InvalidTemporaryTermUri { supplied: String, expected: String },

    /// Field name outside the queryable allow-list
    #[error("Unsupported search field: {0}")]
    UnsupportedSearchField(String),

    /// A vocabulary already exists with the given string key
    #[error("A vocabulary already exists with string key: {0}")]
    VocabularyExists(String),

    /// A term already exists with the given URI (conflict found via uri_hash)
    #[error("A term already exists with URI: {0}")]
    UriExists(String),

    /// No vocabulary found with the given string key
    #[error("No vocabulary found with string key: {0}")]
    VocabularyNotFound(String),

    /// No term found with the given URI
    #[error("No term found with URI: {0}")]
    TermNotFound(String),

    /// Temporary terms are immutable after creation
    #[error("Cannot change temporary term: {0}")]
    TemporaryTermImmutable(String),

    /// Exhausted the bounded retries for generated-URI uniqueness conflicts
    #[error("Could not generate a unique URI after {attempts} attempts")]
    UriGenerationExhausted { attempts: u32 },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
