//! Mapping between terms and their indexed documents.
//!
//! The index stores a flat projection of each term: the four core fields plus
//! the additional-fields mapping serialized as one opaque JSON blob, so
//! heterogeneous value types round-trip without per-type field bookkeeping.
//! Index-only bookkeeping (scores, ingestion timestamps, internal versions)
//! never appears here — `into_term` restores the exact [`Term`] snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{AdditionalFields, Term, TermType};

/// The derived, eventually-consistent projection of a term stored in the
/// search index and used for all reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub uri: String,
    pub value: String,
    #[serde(rename = "type")]
    pub term_type: TermType,
    pub vocabulary_string_key: String,
    /// Additional fields as an opaque JSON object.
    pub additional_fields: String,
}

impl IndexDocument {
    /// Project a term into its index document.
    pub fn from_term(term: &Term) -> Result<Self> {
        Ok(Self {
            uri: term.uri.clone(),
            value: term.value.clone(),
            term_type: term.term_type,
            vocabulary_string_key: term.vocabulary_string_key.clone(),
            additional_fields: serde_json::to_string(&term.additional_fields)?,
        })
    }

    /// Restore the term snapshot this document was projected from.
    pub fn into_term(self) -> Result<Term> {
        let additional_fields: AdditionalFields = if self.additional_fields.is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&self.additional_fields)?
        };

        Ok(Term {
            uri: self.uri,
            vocabulary_string_key: self.vocabulary_string_key,
            value: self.value,
            term_type: self.term_type,
            additional_fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    fn term_with_fields(fields: AdditionalFields) -> Term {
        Term {
            uri: "http://example.org/term/1".into(),
            vocabulary_string_key: "names".into(),
            value: "Smith, Jane".into(),
            term_type: TermType::External,
            additional_fields: fields,
        }
    }

    #[test]
    fn test_round_trip_empty_fields() {
        let term = term_with_fields(BTreeMap::new());
        let doc = IndexDocument::from_term(&term).unwrap();
        assert_eq!(doc.into_term().unwrap(), term);
    }

    #[test]
    fn test_round_trip_all_field_shapes() {
        let fields: AdditionalFields = [
            ("code".to_string(), FieldValue::String("n123".into())),
            ("rank".to_string(), FieldValue::Number(3.into())),
            (
                "weight".to_string(),
                FieldValue::Number(serde_json::Number::from_f64(0.5).unwrap()),
            ),
            ("preferred".to_string(), FieldValue::Boolean(true)),
            (
                "alternate_names".to_string(),
                FieldValue::StringArray(vec!["J. Smith".into(), "Jane S.".into()]),
            ),
            (
                "years".to_string(),
                FieldValue::NumberArray(vec![1901.into(), 1985.into()]),
            ),
        ]
        .into_iter()
        .collect();

        let term = term_with_fields(fields);
        let doc = IndexDocument::from_term(&term).unwrap();
        assert_eq!(doc.into_term().unwrap(), term);
    }

    #[test]
    fn test_blob_is_plain_json_object() {
        let term = term_with_fields(
            [("code".to_string(), FieldValue::String("x".into()))]
                .into_iter()
                .collect(),
        );
        let doc = IndexDocument::from_term(&term).unwrap();
        assert_eq!(doc.additional_fields, r#"{"code":"x"}"#);
    }

    #[test]
    fn test_empty_blob_tolerated() {
        let doc = IndexDocument {
            uri: "http://example.org/term/1".into(),
            value: "x".into(),
            term_type: TermType::Local,
            vocabulary_string_key: "names".into(),
            additional_fields: String::new(),
        };
        assert!(doc.into_term().unwrap().additional_fields.is_empty());
    }
}
