//! Query engine tests against an in-RAM index: the lookup allow-list, the
//! browse/pagination contract, and the text-search ranking tiers.

use std::collections::BTreeMap;
use std::sync::Arc;

use lexis_core::{FieldValue, IndexDocument, SearchIndex, Term, TermSearch, TermType};
use lexis_index::{TantivyTermIndex, TermQueryEngine};

fn term(vocabulary: &str, value: &str, uri: &str, term_type: TermType) -> Term {
    Term {
        uri: uri.to_string(),
        vocabulary_string_key: vocabulary.to_string(),
        value: value.to_string(),
        term_type,
        additional_fields: BTreeMap::new(),
    }
}

async fn engine_with(terms: &[Term]) -> (Arc<TantivyTermIndex>, TermQueryEngine) {
    let index = Arc::new(TantivyTermIndex::create_in_ram().unwrap());
    for t in terms {
        index.upsert(&IndexDocument::from_term(t).unwrap()).await.unwrap();
    }
    index.commit().await.unwrap();
    let engine = TermQueryEngine::new(index.clone());
    (index, engine)
}

fn values(terms: &[Term]) -> Vec<&str> {
    terms.iter().map(|t| t.value.as_str()).collect()
}

#[tokio::test]
async fn test_find_by_uri() {
    let (_index, engine) = engine_with(&[
        term("names", "One", "http://example.org/1", TermType::External),
        term("names", "Two", "http://example.org/2", TermType::External),
    ])
    .await;

    let found = engine.find_by_uri("http://example.org/2").await.unwrap().unwrap();
    assert_eq!(found.value, "Two");

    assert!(engine.find_by_uri("http://example.org/3").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_by_fields_allow_list() {
    let (_index, engine) = engine_with(&[term(
        "names",
        "One",
        "http://example.org/1",
        TermType::External,
    )])
    .await;

    let criteria: BTreeMap<String, String> =
        [("score".to_string(), "high".to_string())].into_iter().collect();
    let err = engine.find_by_fields(&criteria, 10, 0).await.unwrap_err();
    assert!(matches!(err, lexis_core::Error::UnsupportedSearchField(f) if f == "score"));
}

#[tokio::test]
async fn test_find_by_fields_exact_match() {
    let (_index, engine) = engine_with(&[
        term("names", "Same", "http://example.org/1", TermType::External),
        term("names", "Same", "http://example.org/2", TermType::Local),
        term("subjects", "Same", "http://example.org/3", TermType::External),
    ])
    .await;

    let criteria: BTreeMap<String, String> = [
        ("vocabulary_string_key".to_string(), "names".to_string()),
        ("value".to_string(), "Same".to_string()),
    ]
    .into_iter()
    .collect();
    let found = engine.find_by_fields(&criteria, 10, 0).await.unwrap();
    assert_eq!(found.len(), 2);
    // URI breaks the tie deterministically.
    assert_eq!(found[0].uri, "http://example.org/1");
    assert_eq!(found[1].uri, "http://example.org/2");

    let criteria: BTreeMap<String, String> = [
        ("vocabulary_string_key".to_string(), "names".to_string()),
        ("type".to_string(), "local".to_string()),
    ]
    .into_iter()
    .collect();
    let found = engine.find_by_fields(&criteria, 10, 0).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].uri, "http://example.org/2");

    // Exact means exact: value matching here is case-sensitive.
    let criteria: BTreeMap<String, String> =
        [("value".to_string(), "same".to_string())].into_iter().collect();
    assert!(engine.find_by_fields(&criteria, 10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_terms_pagination_window() {
    let mut terms = Vec::new();
    for i in 0..10 {
        terms.push(term(
            "names",
            &format!("Name {}", i),
            &format!("http://example.org/{}", i),
            TermType::External,
        ));
    }
    let (_index, engine) = engine_with(&terms).await;

    let page = engine.list_terms("names", 4, 4).await.unwrap();
    assert_eq!(values(&page), vec!["Name 4", "Name 5", "Name 6", "Name 7"]);

    let all = engine.list_terms("names", 100, 0).await.unwrap();
    assert_eq!(all.len(), 10);
    assert_eq!(all[0].value, "Name 0");
    assert_eq!(all[9].value, "Name 9");

    assert!(engine.list_terms("names", 4, 10).await.unwrap().is_empty());
    assert!(engine.list_terms("other_vocab", 4, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_query_equals_list_terms() {
    let mut terms = Vec::new();
    for i in 0..10 {
        terms.push(term(
            "names",
            &format!("Name {}", i),
            &format!("http://example.org/{}", i),
            TermType::External,
        ));
    }
    let (_index, engine) = engine_with(&terms).await;

    let listed = engine.list_terms("names", 4, 4).await.unwrap();
    let searched = engine.search_by_text("names", "", 4, 4).await.unwrap();
    assert_eq!(listed, searched);

    let searched = engine.search_by_text("names", "   ", 4, 4).await.unwrap();
    assert_eq!(listed, searched);
}

#[tokio::test]
async fn test_short_query_whole_value_threshold() {
    let (_index, engine) = engine_with(&[term(
        "names",
        "What a great value",
        "http://example.org/1",
        TermType::External,
    )])
    .await;

    // Below the 3-character threshold and not a whole-value match: empty.
    assert!(engine.search_by_text("names", "Wh", 10, 0).await.unwrap().is_empty());

    // At the threshold, substring matching kicks in.
    let found = engine.search_by_text("names", "Wha", 10, 0).await.unwrap();
    assert_eq!(values(&found), vec!["What a great value"]);

    // The full URI string is an exact match...
    let found = engine
        .search_by_text("names", "http://example.org/1", 10, 0)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    // ...but a truncated URI is not.
    assert!(engine
        .search_by_text("names", "http://example.org/", 10, 0)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_short_query_matches_whole_short_value() {
    let (_index, engine) = engine_with(&[
        term("names", "Ng", "http://example.org/1", TermType::External),
        term("names", "Ngata", "http://example.org/2", TermType::External),
    ])
    .await;

    // A 2-character query matches the whole 2-character value, nothing else.
    let found = engine.search_by_text("names", "ng", 10, 0).await.unwrap();
    assert_eq!(values(&found), vec!["Ng"]);
}

#[tokio::test]
async fn test_ranking_tiers() {
    let (_index, engine) = engine_with(&[
        term("names", "integration", "http://example.org/3", TermType::External),
        term("names", "grat returns", "http://example.org/4", TermType::External),
        term("names", "grat", "http://example.org/1", TermType::External),
        term("names", "a grat idea", "http://example.org/2", TermType::External),
    ])
    .await;

    let found = engine.search_by_text("names", "grat", 10, 0).await.unwrap();
    // Exact full value, then whole-word matches alphabetically, then the
    // mid-word substring ("integration" contains "grat").
    assert_eq!(
        values(&found),
        vec!["grat", "a grat idea", "grat returns", "integration"]
    );
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let (_index, engine) = engine_with(&[term(
        "names",
        "Smith, Jane",
        "http://example.org/1",
        TermType::External,
    )])
    .await;

    for query in ["smith", "SMITH", "Smith, Jane", "SMITH, JANE", "ith"] {
        let found = engine.search_by_text("names", query, 10, 0).await.unwrap();
        assert_eq!(found.len(), 1, "query {:?} should match", query);
    }
}

#[tokio::test]
async fn test_search_restricted_to_vocabulary() {
    let (_index, engine) = engine_with(&[
        term("names", "Shared value", "http://example.org/1", TermType::External),
        term("subjects", "Shared value", "http://example.org/2", TermType::External),
    ])
    .await;

    let found = engine.search_by_text("names", "shared", 10, 0).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].vocabulary_string_key, "names");
}

#[tokio::test]
async fn test_search_pagination_is_stable() {
    let mut terms = Vec::new();
    for i in 0..6 {
        terms.push(term(
            "names",
            &format!("Common {}", i),
            &format!("http://example.org/{}", i),
            TermType::External,
        ));
    }
    let (_index, engine) = engine_with(&terms).await;

    let first = engine.search_by_text("names", "common", 3, 0).await.unwrap();
    let second = engine.search_by_text("names", "common", 3, 3).await.unwrap();
    assert_eq!(values(&first), vec!["Common 0", "Common 1", "Common 2"]);
    assert_eq!(values(&second), vec!["Common 3", "Common 4", "Common 5"]);
}

#[tokio::test]
async fn test_additional_fields_round_trip_through_index() {
    let mut t = term("names", "Fielded", "http://example.org/1", TermType::External);
    t.additional_fields.insert("code".into(), FieldValue::from("n1"));
    t.additional_fields.insert("rank".into(), FieldValue::from(3));
    t.additional_fields.insert("preferred".into(), FieldValue::from(true));
    t.additional_fields.insert(
        "alternate_names".into(),
        FieldValue::StringArray(vec!["F.".into(), "Fld".into()]),
    );
    t.additional_fields.insert(
        "years".into(),
        FieldValue::NumberArray(vec![1901.into(), 1985.into()]),
    );

    let (_index, engine) = engine_with(std::slice::from_ref(&t)).await;

    let found = engine.find_by_uri("http://example.org/1").await.unwrap().unwrap();
    assert_eq!(found, t);
}

#[tokio::test]
async fn test_stale_documents_serve_until_cleared() {
    let (index, engine) = engine_with(&[term(
        "names",
        "Stale",
        "http://example.org/1",
        TermType::External,
    )])
    .await;

    // Still visible: nothing has told the index otherwise.
    assert_eq!(engine.list_terms("names", 10, 0).await.unwrap().len(), 1);

    index.clear().await.unwrap();
    index.commit().await.unwrap();
    assert!(engine.list_terms("names", 10, 0).await.unwrap().is_empty());
}
