//! The search query engine: every term read goes through here, against the
//! index, never the relational store.
//!
//! Candidate retrieval happens in tantivy (exact term queries plus a trigram
//! conjunction for substrings); match tiers and ordering are then settled
//! against the stored values, so the ranking contract is exact rather than
//! score-approximate:
//!
//! 1. exact full-value match (or exact URI match)
//! 2. whole-word match
//! 3. mid-word substring match
//!
//! with alphabetical value-then-URI tiebreaks, case-insensitive on values.
//! Queries under three characters match whole values only.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tantivy::collector::DocSetCollector;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::TantivyDocument;
use tracing::debug;

use lexis_core::{Error, Result, Term, TermSearch};

use crate::index::TantivyTermIndex;
use crate::schema::{query_trigrams, MIN_PARTIAL_QUERY_CHARS};

/// Core fields exact-match lookups may filter on.
pub const QUERYABLE_FIELDS: &[&str] = &["uri", "vocabulary_string_key", "value", "type"];

/// Relevance tier of a matched term; lower ranks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchTier {
    Exact,
    Word,
    Substring,
}

/// Whether `needle` occurs in `haystack` bounded by non-alphanumerics on
/// both sides (a match on complete words).
fn word_boundary_match(haystack: &str, needle: &str) -> bool {
    for (start, matched) in haystack.match_indices(needle) {
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[start + matched.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
    }
    false
}

fn sort_terms(terms: &mut [Term]) {
    terms.sort_by_cached_key(|t| (t.value.to_lowercase(), t.value.clone(), t.uri.clone()));
}

fn paginate(terms: Vec<Term>, limit: usize, offset: usize) -> Vec<Term> {
    terms.into_iter().skip(offset).take(limit).collect()
}

/// Read-path query engine over the tantivy term index.
pub struct TermQueryEngine {
    index: Arc<TantivyTermIndex>,
}

impl TermQueryEngine {
    /// Create a query engine over the given index adapter.
    pub fn new(index: Arc<TantivyTermIndex>) -> Self {
        Self { index }
    }

    fn exact(&self, field: Field, text: &str) -> Box<dyn Query> {
        Box::new(TermQuery::new(
            tantivy::Term::from_field_text(field, text),
            IndexRecordOption::Basic,
        ))
    }

    /// Run a query and map every hit back to its term snapshot.
    fn collect_terms(&self, query: &dyn Query) -> Result<Vec<Term>> {
        let searcher = self.index.searcher();
        let addresses = searcher
            .search(query, &DocSetCollector)
            .map_err(|e| Error::Index(e.to_string()))?;

        let mut terms = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| Error::Index(e.to_string()))?;
            terms.push(self.index.read_document(&doc)?.into_term()?);
        }
        Ok(terms)
    }

    fn vocabulary_clause(&self, vocabulary_string_key: &str) -> (Occur, Box<dyn Query>) {
        (
            Occur::Must,
            self.exact(
                self.index.fields().vocabulary_string_key,
                vocabulary_string_key,
            ),
        )
    }
}

#[async_trait]
impl TermSearch for TermQueryEngine {
    async fn find_by_uri(&self, uri: &str) -> Result<Option<Term>> {
        let query = self.exact(self.index.fields().uri, uri);
        let mut terms = self.collect_terms(query.as_ref())?;
        Ok(terms.pop())
    }

    async fn find_by_fields(
        &self,
        criteria: &BTreeMap<String, String>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Term>> {
        let fields = self.index.fields();
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(criteria.len());

        for (name, expected) in criteria {
            let field = match name.as_str() {
                "uri" => fields.uri,
                "vocabulary_string_key" => fields.vocabulary_string_key,
                "value" => fields.value,
                "type" => fields.term_type,
                _ => return Err(Error::UnsupportedSearchField(name.clone())),
            };
            clauses.push((Occur::Must, self.exact(field, expected)));
        }

        if clauses.is_empty() {
            return Ok(Vec::new());
        }

        let mut terms = self.collect_terms(&BooleanQuery::new(clauses))?;
        sort_terms(&mut terms);
        Ok(paginate(terms, limit, offset))
    }

    async fn list_terms(
        &self,
        vocabulary_string_key: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Term>> {
        let query = self.exact(
            self.index.fields().vocabulary_string_key,
            vocabulary_string_key,
        );
        let mut terms = self.collect_terms(query.as_ref())?;
        sort_terms(&mut terms);
        Ok(paginate(terms, limit, offset))
    }

    async fn search_by_text(
        &self,
        vocabulary_string_key: &str,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Term>> {
        // A blank query is an alphabetical browse, not a relevance search.
        if query.trim().is_empty() {
            return self.list_terms(vocabulary_string_key, limit, offset).await;
        }

        let start = Instant::now();
        let fields = self.index.fields();
        let needle = query.to_lowercase();
        let whole_value_only = needle.chars().count() < MIN_PARTIAL_QUERY_CHARS;

        // Candidate retrieval: whole-value and exact-URI matches always
        // qualify; long enough queries also pull substring candidates via a
        // conjunction of their trigrams.
        let mut candidates: Vec<Box<dyn Query>> = vec![
            self.exact(fields.value_exact, &needle),
            self.exact(fields.uri, query),
        ];
        if !whole_value_only {
            let trigram_clauses: Vec<(Occur, Box<dyn Query>)> = query_trigrams(&needle)
                .iter()
                .map(|gram| (Occur::Must, self.exact(fields.value_ngrams, gram)))
                .collect();
            candidates.push(Box::new(BooleanQuery::new(trigram_clauses)));
        }

        let tree = BooleanQuery::new(vec![
            self.vocabulary_clause(vocabulary_string_key),
            (Occur::Must, Box::new(BooleanQuery::union(candidates))),
        ]);

        // Settle tiers against the stored values; the trigram conjunction
        // can admit non-contiguous matches, which drop out here.
        let mut ranked: Vec<(MatchTier, Term)> = Vec::new();
        for term in self.collect_terms(&tree)? {
            let value_lc = term.value.to_lowercase();
            let tier = if value_lc == needle || term.uri == query {
                Some(MatchTier::Exact)
            } else if whole_value_only {
                None
            } else if value_lc.contains(&needle) {
                if word_boundary_match(&value_lc, &needle) {
                    Some(MatchTier::Word)
                } else {
                    Some(MatchTier::Substring)
                }
            } else {
                None
            };

            if let Some(tier) = tier {
                ranked.push((tier, term));
            }
        }

        ranked.sort_by_cached_key(|(tier, t)| {
            (*tier, t.value.to_lowercase(), t.value.clone(), t.uri.clone())
        });

        debug!(
            subsystem = "index",
            component = "query",
            op = "search_by_text",
            vocabulary = vocabulary_string_key,
            query = %query,
            result_count = ranked.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Ranked text search"
        );

        let terms = ranked.into_iter().map(|(_, t)| t).collect();
        Ok(paginate(terms, limit, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_boundary_match() {
        assert!(word_boundary_match("what a great value", "great"));
        assert!(word_boundary_match("what a great value", "great value"));
        assert!(word_boundary_match("what a great value", "what"));
        assert!(word_boundary_match("what a great value", "value"));
        // Mid-word occurrences are not word matches.
        assert!(!word_boundary_match("what a great value", "reat"));
        assert!(!word_boundary_match("what a great value", "hat"));
        // First occurrence mid-word, later occurrence on a boundary.
        assert!(word_boundary_match("haystack hay", "hay"));
    }

    #[test]
    fn test_match_tier_ordering() {
        assert!(MatchTier::Exact < MatchTier::Word);
        assert!(MatchTier::Word < MatchTier::Substring);
    }
}
