//! Tantivy schema and tokenizers for term documents.
//!
//! Core fields are raw-indexed and stored; the additional-fields blob is
//! stored only. Two derived fields serve the text-search contract:
//! `value_exact` (whole value, lowercased, one token) for whole-value
//! matching, and `value_ngrams` (lowercased trigrams over the raw string,
//! spaces included) for mid-word substring recall.

use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING,
};
use tantivy::tokenizer::{LowerCaser, NgramTokenizer, RawTokenizer, TextAnalyzer};
use tantivy::Index;

use lexis_core::{Error, Result};

/// Tokenizer producing one lowercased token for the whole value.
pub const TOKENIZER_RAW_LOWERCASE: &str = "raw_lc";

/// Tokenizer producing lowercased character trigrams.
pub const TOKENIZER_TRIGRAM: &str = "trigram";

/// Minimum query length (in characters) for partial matching; shorter
/// queries are restricted to whole-value matches.
pub const MIN_PARTIAL_QUERY_CHARS: usize = 3;

/// Resolved schema fields for term documents.
#[derive(Debug, Clone, Copy)]
pub struct TermFields {
    pub uri: Field,
    pub vocabulary_string_key: Field,
    pub value: Field,
    pub term_type: Field,
    pub additional_fields: Field,
    pub value_exact: Field,
    pub value_ngrams: Field,
}

/// Build the term-document schema.
pub fn build_schema() -> (Schema, TermFields) {
    let mut builder = Schema::builder();

    let uri = builder.add_text_field("uri", STRING | STORED);
    let vocabulary_string_key = builder.add_text_field("vocabulary_string_key", STRING | STORED);
    let value = builder.add_text_field("value", STRING | STORED);
    let term_type = builder.add_text_field("type", STRING | STORED);
    let additional_fields = builder.add_text_field("additional_fields", STORED);

    let value_exact = builder.add_text_field(
        "value_exact",
        TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(TOKENIZER_RAW_LOWERCASE)
                .set_index_option(IndexRecordOption::Basic),
        ),
    );
    let value_ngrams = builder.add_text_field(
        "value_ngrams",
        TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(TOKENIZER_TRIGRAM)
                .set_index_option(IndexRecordOption::Basic),
        ),
    );

    let schema = builder.build();
    let fields = TermFields {
        uri,
        vocabulary_string_key,
        value,
        term_type,
        additional_fields,
        value_exact,
        value_ngrams,
    };
    (schema, fields)
}

/// Register the custom tokenizers on a freshly opened index.
pub fn register_tokenizers(index: &Index) -> Result<()> {
    index.tokenizers().register(
        TOKENIZER_RAW_LOWERCASE,
        TextAnalyzer::builder(RawTokenizer::default())
            .filter(LowerCaser)
            .build(),
    );

    let trigram = NgramTokenizer::new(
        MIN_PARTIAL_QUERY_CHARS,
        MIN_PARTIAL_QUERY_CHARS,
        false,
    )
    .map_err(|e| Error::Index(e.to_string()))?;
    index.tokenizers().register(
        TOKENIZER_TRIGRAM,
        TextAnalyzer::builder(trigram).filter(LowerCaser).build(),
    );

    Ok(())
}

/// Character trigrams of a (pre-lowercased) query, mirroring the index-side
/// tokenizer so a conjunction of these retrieves every substring candidate.
pub fn query_trigrams(query: &str) -> Vec<String> {
    let chars: Vec<char> = query.chars().collect();
    if chars.len() < MIN_PARTIAL_QUERY_CHARS {
        return Vec::new();
    }
    chars
        .windows(MIN_PARTIAL_QUERY_CHARS)
        .map(|w| w.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_builds() {
        let (schema, fields) = build_schema();
        assert_eq!(schema.get_field_name(fields.uri), "uri");
        assert_eq!(schema.get_field_name(fields.term_type), "type");
        assert_eq!(schema.get_field_name(fields.value_ngrams), "value_ngrams");
    }

    #[test]
    fn test_query_trigrams() {
        assert!(query_trigrams("wh").is_empty());
        assert_eq!(query_trigrams("wha"), vec!["wha"]);
        assert_eq!(
            query_trigrams("great v"),
            vec!["gre", "rea", "eat", "at ", "t v"]
        );
    }

    #[test]
    fn test_query_trigrams_are_char_based() {
        // Multi-byte characters count as one, like the index-side tokenizer.
        assert_eq!(query_trigrams("héllo").len(), 3);
    }
}
