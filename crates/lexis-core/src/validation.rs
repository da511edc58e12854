//! Key syntax rules shared by vocabularies and additional fields.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// Lowercase letters, digits, underscores; must start with a letter.
static ALPHANUMERIC_UNDERSCORE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z][a-z0-9_]*$").expect("static key regex"));

/// Core field names that additional fields may never shadow.
pub const RESERVED_FIELD_KEYS: &[&str] = &["uri", "vocabulary_string_key", "value", "type"];

/// Reserved vocabulary key, kept free for cross-vocabulary search surfaces.
pub const RESERVED_VOCABULARY_KEY: &str = "all";

/// Validate a vocabulary string key.
pub fn validate_vocabulary_key(string_key: &str) -> Result<()> {
    if string_key == RESERVED_VOCABULARY_KEY {
        return Err(Error::InvalidVocabularyKey(format!(
            "\"{}\" is a reserved word",
            RESERVED_VOCABULARY_KEY
        )));
    }
    if !ALPHANUMERIC_UNDERSCORE_KEY.is_match(string_key) {
        return Err(Error::InvalidVocabularyKey(string_key.to_string()));
    }
    Ok(())
}

/// Validate one additional-field key against the syntax rules and the
/// reserved-name set.
pub fn validate_field_key(key: &str) -> Result<()> {
    if RESERVED_FIELD_KEYS.contains(&key) {
        return Err(Error::InvalidFieldKey(format!(
            "\"{}\" is a reserved key",
            key
        )));
    }
    if !ALPHANUMERIC_UNDERSCORE_KEY.is_match(key) {
        return Err(Error::InvalidFieldKey(key.to_string()));
    }
    Ok(())
}

/// Validate every key of an additional-fields mapping.
pub fn validate_field_keys<'a>(keys: impl IntoIterator<Item = &'a String>) -> Result<()> {
    for key in keys {
        validate_field_key(key)?;
    }
    Ok(())
}
