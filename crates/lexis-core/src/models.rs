//! Core data models for the lexis term service.
//!
//! These types are shared across all lexis crates and represent the
//! controlled-vocabulary domain entities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// VOCABULARY
// =============================================================================

/// A named collection of terms, identified by a unique string key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Unique key: lowercase letters, digits, underscores; starts with a letter.
    pub string_key: String,
    /// Human-readable label.
    pub display_label: String,
}

// =============================================================================
// TERM
// =============================================================================

/// The kind of a term, which determines how its URI is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermType {
    /// URI supplied by the caller, typically referencing an external authority.
    External,
    /// URI minted by this system from a random UUID.
    Local,
    /// URI derived deterministically from (vocabulary, value); immutable and
    /// idempotent to create.
    Temporary,
}

impl TermType {
    /// Canonical lowercase string form, as stored and indexed.
    pub fn as_str(&self) -> &'static str {
        match self {
            TermType::External => "external",
            TermType::Local => "local",
            TermType::Temporary => "temporary",
        }
    }

    /// Parse the canonical string form.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "external" => Ok(TermType::External),
            "local" => Ok(TermType::Local),
            "temporary" => Ok(TermType::Temporary),
            other => Err(Error::InvalidTermType(other.to_string())),
        }
    }
}

impl std::fmt::Display for TermType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JSON-compatible additional-field value.
///
/// Closed sum of the shapes the index document blob round-trips exactly:
/// numbers are kept as [`serde_json::Number`] so integers never degrade to
/// floats on the way through the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Number(serde_json::Number),
    Boolean(bool),
    StringArray(Vec<String>),
    NumberArray(Vec<serde_json::Number>),
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n.into())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

/// Open mapping of validated keys to additional-field values.
pub type AdditionalFields = BTreeMap<String, FieldValue>;

/// A URI-identified entry with a label value, belonging to exactly one
/// vocabulary.
///
/// The relational row is the source of truth for terms; this snapshot is what
/// both the row and the index document map back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Globally unique identifier; immutable after creation.
    pub uri: String,
    /// String key of the owning vocabulary.
    pub vocabulary_string_key: String,
    /// Label text.
    pub value: String,
    /// Term kind; immutable after creation.
    #[serde(rename = "type")]
    pub term_type: TermType,
    /// Open typed metadata; empty for temporary terms.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_fields: AdditionalFields,
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Request to create a term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTermRequest {
    #[serde(rename = "type")]
    pub term_type: TermType,
    pub vocabulary_string_key: String,
    pub value: String,
    /// Required for external terms, forbidden for local terms, and for
    /// temporary terms only accepted when it matches the derived URI.
    pub uri: Option<String>,
    #[serde(default)]
    pub additional_fields: AdditionalFields,
}

impl CreateTermRequest {
    /// Request for an external term with a caller-supplied URI.
    pub fn external(vocabulary: &str, value: &str, uri: &str) -> Self {
        Self {
            term_type: TermType::External,
            vocabulary_string_key: vocabulary.to_string(),
            value: value.to_string(),
            uri: Some(uri.to_string()),
            additional_fields: BTreeMap::new(),
        }
    }

    /// Request for a local term; the URI is generated.
    pub fn local(vocabulary: &str, value: &str) -> Self {
        Self {
            term_type: TermType::Local,
            vocabulary_string_key: vocabulary.to_string(),
            value: value.to_string(),
            uri: None,
            additional_fields: BTreeMap::new(),
        }
    }

    /// Request for a temporary term; the URI is derived from
    /// (vocabulary, value).
    pub fn temporary(vocabulary: &str, value: &str) -> Self {
        Self {
            term_type: TermType::Temporary,
            vocabulary_string_key: vocabulary.to_string(),
            value: value.to_string(),
            uri: None,
            additional_fields: BTreeMap::new(),
        }
    }

    /// Attach an additional field.
    pub fn with_field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.additional_fields.insert(key.to_string(), value.into());
        self
    }
}

/// Request to update an external or local term.
///
/// `additional_fields` entries with a `None` value are explicit tombstones:
/// under merge semantics the key is removed from the stored mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTermRequest {
    pub value: Option<String>,
    pub additional_fields: Option<BTreeMap<String, Option<FieldValue>>>,
    /// When true (default), merge the supplied fields into the existing
    /// mapping; when false, replace the whole mapping.
    pub merge_additional_fields: bool,
}

impl Default for UpdateTermRequest {
    fn default() -> Self {
        Self {
            value: None,
            additional_fields: None,
            merge_additional_fields: true,
        }
    }
}

impl UpdateTermRequest {
    /// Update only the label value.
    pub fn value(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
            ..Self::default()
        }
    }

    /// Set (or, with `None`, tombstone) one additional field.
    pub fn with_field(mut self, key: &str, value: Option<FieldValue>) -> Self {
        self.additional_fields
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value);
        self
    }

    /// Switch to replace semantics for the additional-fields mapping.
    pub fn replace_fields(mut self) -> Self {
        self.merge_additional_fields = false;
        self
    }
}

// =============================================================================
// CREATION OUTCOME
// =============================================================================

/// Outcome of a create, making the idempotent-create contract visible in the
/// type: a temporary term whose (vocabulary, value) pair already exists is
/// returned as `Existing`, never as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum TermCreation {
    /// A new row was inserted and indexed.
    Created(Term),
    /// The identical temporary term already existed; returned unchanged.
    Existing(Term),
}

impl TermCreation {
    /// The term snapshot, regardless of discriminant.
    pub fn term(&self) -> &Term {
        match self {
            TermCreation::Created(t) | TermCreation::Existing(t) => t,
        }
    }

    /// Consume into the term snapshot.
    pub fn into_term(self) -> Term {
        match self {
            TermCreation::Created(t) | TermCreation::Existing(t) => t,
        }
    }

    /// Whether a new row was actually inserted.
    pub fn was_created(&self) -> bool {
        matches!(self, TermCreation::Created(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_type_round_trip() {
        for t in [TermType::External, TermType::Local, TermType::Temporary] {
            assert_eq!(TermType::parse(t.as_str()).unwrap(), t);
        }
    }

    #[test]
    fn test_term_type_parse_rejects_unknown() {
        let err = TermType::parse("permanent").unwrap_err();
        assert!(matches!(err, Error::InvalidTermType(_)));
    }

    #[test]
    fn test_field_value_untagged_serde() {
        let values: AdditionalFields = [
            ("s".to_string(), FieldValue::String("x".into())),
            ("n".to_string(), FieldValue::Number(7.into())),
            ("b".to_string(), FieldValue::Boolean(true)),
            (
                "sa".to_string(),
                FieldValue::StringArray(vec!["a".into(), "b".into()]),
            ),
            (
                "na".to_string(),
                FieldValue::NumberArray(vec![1.into(), 2.into()]),
            ),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&values).unwrap();
        let back: AdditionalFields = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_field_value_integer_stays_integer() {
        let json = serde_json::to_string(&FieldValue::Number(5.into())).unwrap();
        assert_eq!(json, "5");
    }

    #[test]
    fn test_update_request_defaults_to_merge() {
        assert!(UpdateTermRequest::default().merge_additional_fields);
        assert!(!UpdateTermRequest::default().replace_fields().merge_additional_fields);
    }

    #[test]
    fn test_creation_discriminant() {
        let term = Term {
            uri: "http://example.org/1".into(),
            vocabulary_string_key: "names".into(),
            value: "x".into(),
            term_type: TermType::External,
            additional_fields: BTreeMap::new(),
        };
        assert!(TermCreation::Created(term.clone()).was_created());
        assert!(!TermCreation::Existing(term.clone()).was_created());
        assert_eq!(TermCreation::Existing(term.clone()).into_term(), term);
    }
}
