use linedex::{fields, Config, DocId, FieldFlags, Query, Schema, SearchEngine, SearchHit};
use tempfile::{tempdir, TempDir};

fn schema() -> Schema {
    Schema::new("test")
        .add_field("title", FieldFlags::REQUIRED | FieldFlags::STORED | FieldFlags::INDEXED)
        .unwrap()
        .add_field("text", FieldFlags::INDEXED | FieldFlags::STORED | FieldFlags::FULLTEXT)
        .unwrap()
        .add_field("description", FieldFlags::STORED)
        .unwrap()
}

fn engine_with(schema: Schema, config: Config) -> (TempDir, SearchEngine) {
    let tmp = tempdir().unwrap();
    let config = config.with_storage_path(tmp.path());
    let engine = SearchEngine::open(schema, config).unwrap();
    (tmp, engine)
}

/// Cat / Dog / Snake corpus under ids 1..3
fn corpus() -> (TempDir, SearchEngine) {
    let (tmp, mut engine) = engine_with(schema(), Config::default());

    engine.add_document_with_id("1", fields([
        ("title", "Cat animal"),
        ("text", "Meow world! This is a tiny search engine."),
        ("description", "this is a description"),
    ])).unwrap();
    engine.add_document_with_id("2", fields([
        ("title", "Dog"),
        ("text", "Bark Bark! Woofle makes search development fun to the world."),
        ("description", "Describe the problems"),
    ])).unwrap();
    engine.add_document_with_id("3", fields([
        ("title", "Snake"),
        ("text", "szee szee! This is the minimal tiny search engine for the animal world."),
        ("description", "this is a description"),
    ])).unwrap();

    let written = engine.flush().unwrap();
    assert_eq!(written, vec![DocId::from("1"), DocId::from("2"), DocId::from("3")]);
    (tmp, engine)
}

fn ids(hits: &[SearchHit]) -> Vec<&str> {
    hits.iter().map(|hit| hit.id.as_str()).collect()
}

#[test]
fn search_and_requires_every_term() {
    let (_tmp, mut engine) = corpus();

    let results = engine.search("search engine").unwrap();
    assert_eq!(ids(&results), vec!["1", "3"]);
    for hit in &results {
        assert_eq!(hit.matched_terms.len(), 2);
        assert_eq!(hit.matched_fields.len(), 1);
        assert!(hit.fulltext);
        assert_eq!(hit.weight, 16.0);
    }
}

#[test]
fn search_or_ranks_by_matched_terms() {
    let (_tmp, mut engine) = corpus();

    let results = engine.search("search OR engine").unwrap();
    assert_eq!(ids(&results), vec!["1", "3", "2"]);
    assert_eq!(results[1].matched_terms.len(), 2);
    assert_eq!(results[2].matched_terms.len(), 1);
    assert_eq!(results[1].matched_fields.len(), 1);
    assert!(results.iter().all(|hit| !hit.fulltext));
    assert!(results[0].weight > results[2].weight);
}

#[test]
fn parenthesized_group_inside_or() {
    let (_tmp, mut engine) = corpus();

    let results = engine.search("(search engine) OR fun").unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[1].matched_terms.len(), 2);
    assert_eq!(results[2].matched_terms.len(), 1);
    assert_eq!(results[2].id.as_str(), "2");
    assert_eq!(results[0].matched_fields.len(), 1);
    assert!(!results[0].fulltext);
    assert!(!results[1].fulltext);
}

#[test]
fn not_excludes_matches() {
    let (_tmp, mut engine) = corpus();

    let results = engine.search("world NOT(engine)").unwrap();
    assert_eq!(ids(&results), vec!["2"]);
    assert_eq!(results[0].matched_terms.len(), 1);
    assert_eq!(results[0].matched_fields.len(), 1);
    assert!(!results[0].fulltext);
    assert_eq!(results[0].document.get("title").unwrap().as_text(), "Dog");
}

#[test]
fn not_first_is_applied_last() {
    let (_tmp, mut engine) = corpus();

    let results = engine.search("NOT(engine) bark").unwrap();
    assert_eq!(ids(&results), vec!["2"]);
    assert_eq!(results[0].matched_terms.len(), 1);
}

#[test]
fn find_docs_by_term_per_field() {
    let (_tmp, mut engine) = corpus();

    let matches = engine.find_docs_by_term("tiny", None).unwrap();
    assert_eq!(matches["text"].len(), 2);
    assert_eq!(matches["title"].len(), 0);

    let matches = engine.find_docs_by_term("search", None).unwrap();
    assert_eq!(matches["text"].len(), 3);
    assert_eq!(matches["title"].len(), 0);

    let matches = engine.find_docs_by_term("engine", None).unwrap();
    assert_eq!(matches["text"].len(), 2);

    let matches = engine.find_docs_by_term("cat", None).unwrap();
    assert_eq!(matches["text"].len(), 0);
    assert_eq!(matches["title"].len(), 1);

    // Stored but not indexed
    let matches = engine.find_docs_by_term("description", None).unwrap();
    assert!(!matches.contains_key("description"));
    assert!(matches.values().all(|postings| postings.is_empty()));

    let matches = engine.find_docs_by_term("Cat", Some("title")).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches["title"].doc_ids, vec![DocId::from("1")]);

    // Stop words normalize to nothing
    let matches = engine.find_docs_by_term("the", None).unwrap();
    assert!(matches.values().all(|postings| postings.is_empty()));
}

#[test]
fn missing_required_field_rejects_batch() {
    let (_tmp, mut engine) = corpus();

    engine.add_document(fields([("title", "Fine"), ("text", "hello there")])).unwrap();
    engine.add_document(fields([("text", "hello world!")])).unwrap();

    let err = engine.flush().unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.context, r#"No `title` key provided for doc {"text":"hello world!"}"#);

    assert_eq!(engine.pending_count(), 0);
    assert_eq!(engine.count().unwrap(), 3);
    let matches = engine.find_docs_by_term("hello", None).unwrap();
    assert!(matches.values().all(|postings| postings.is_empty()));
}

#[test]
fn results_sorted_by_weight() {
    let (_tmp, mut engine) = corpus();

    let results = engine.search("animal world").unwrap();
    assert_eq!(ids(&results), vec!["3", "1"]);

    assert_eq!(results[0].matched_terms.len(), 2);
    assert_eq!(results[0].matched_fields.len(), 1);
    assert!(results[0].fulltext);
    assert_eq!(results[0].weight, 16.0);

    assert_eq!(results[1].matched_terms.len(), 2);
    assert_eq!(results[1].matched_fields.len(), 2);
    assert!(!results[1].fulltext);
    assert_eq!(results[1].weight, 8.0);
}

#[test]
fn single_term_returns_stored_document() {
    let (_tmp, mut engine) = engine_with(schema(), Config::default());
    engine.add_document(fields([("title", "Hi"), ("text", "Hello world!")])).unwrap();
    engine.flush().unwrap();

    let results = engine.search("Hello").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id.as_str(), "1");
    assert_eq!(results[0].document.get("title").unwrap().as_text(), "Hi");
}

#[test]
fn same_id_replaces_previous_document() {
    let (_tmp, mut engine) = corpus();

    engine.add_document_with_id("1", fields([
        ("title", "Cow"),
        ("text", "Mooh world! This is a tiny search engine."),
        ("description", "this is a description"),
    ])).unwrap();
    engine.flush().unwrap();

    assert!(engine.search("meow").unwrap().is_empty());
    assert_eq!(ids(&engine.search("mooh").unwrap()), vec!["1"]);
    assert!(engine.search("cat").unwrap().is_empty());
    assert_eq!(engine.count().unwrap(), 3);
}

fn tagged_schema() -> Schema {
    Schema::new("tagged")
        .add_field("title", FieldFlags::REQUIRED | FieldFlags::STORED | FieldFlags::INDEXED)
        .unwrap()
        .add_field("tags", FieldFlags::INDEXED)
        .unwrap()
}

#[test]
fn replace_in_same_batch_clears_unstored_terms() {
    let (_tmp, mut engine) = engine_with(tagged_schema(), Config::default());

    engine.add_document_with_id("7", fields([("title", "Cat"), ("tags", "meow")])).unwrap();
    engine.add_document_with_id("7", fields([("title", "Dog"), ("tags", "bark")])).unwrap();
    assert_eq!(engine.flush().unwrap(), vec![DocId::from("7"), DocId::from("7")]);

    assert_eq!(engine.count().unwrap(), 1);
    assert!(engine.search("meow").unwrap().is_empty());
    assert!(engine.search("cat").unwrap().is_empty());
    assert_eq!(ids(&engine.search("bark").unwrap()), vec!["7"]);
}

#[test]
fn replace_across_flushes_only_clears_stored_terms() {
    let (_tmp, mut engine) = engine_with(tagged_schema(), Config::default());

    engine.add_document_with_id("7", fields([("title", "Cat"), ("tags", "meow")])).unwrap();
    engine.flush().unwrap();
    engine.add_document_with_id("7", fields([("title", "Dog"), ("tags", "bark")])).unwrap();
    engine.flush().unwrap();

    assert!(engine.search("cat").unwrap().is_empty());
    assert_eq!(ids(&engine.search("bark").unwrap()), vec!["7"]);

    // The old tags were never stored, so their postings outlive the replace
    let stale = engine.search("meow").unwrap();
    assert_eq!(ids(&stale), vec!["7"]);
    assert_eq!(stale[0].document.get("title").unwrap().as_text(), "Dog");
}

#[test]
fn unique_field_reuses_id() {
    let schema = Schema::new("pages")
        .add_field("slug", FieldFlags::UNIQUE | FieldFlags::INDEXED | FieldFlags::STORED)
        .unwrap()
        .add_field("title", FieldFlags::REQUIRED | FieldFlags::STORED | FieldFlags::INDEXED)
        .unwrap();
    let (_tmp, mut engine) = engine_with(schema, Config::default());

    engine.add_document(fields([("slug", "cat-page"), ("title", "Meow kitten")])).unwrap();
    engine.add_document(fields([("slug", "dog-page"), ("title", "Bark puppy")])).unwrap();
    engine.flush().unwrap();

    let provisional = engine.add_document(fields([("slug", "cat-page"), ("title", "Mooh kitten")])).unwrap();
    assert_eq!(provisional.as_str(), "3");
    assert_eq!(engine.flush().unwrap(), vec![DocId::from("1")]);

    assert_eq!(engine.count().unwrap(), 2);
    assert!(engine.search("meow").unwrap().is_empty());
    assert_eq!(ids(&engine.search("mooh").unwrap()), vec!["1"]);
    assert_eq!(ids(&engine.search("kitten").unwrap()), vec!["1"]);

    // Unique fields keep raw tokens and stay out of wildcard lookups
    let matches = engine.find_docs_by_term("cat", None).unwrap();
    assert!(!matches.contains_key("slug"));
    let matches = engine.find_docs_by_term("cat", Some("slug")).unwrap();
    assert_eq!(matches["slug"].doc_ids, vec![DocId::from("1")]);
}

#[test]
fn synthesized_id_skips_taken_ids() {
    let (_tmp, mut engine) = engine_with(schema(), Config::default());

    engine.add_document_with_id("2", fields([("title", "Taken")])).unwrap();
    let id = engine.add_document(fields([("title", "Fresh")])).unwrap();
    assert_eq!(id.as_str(), "2");
    assert_eq!(engine.flush().unwrap(), vec![DocId::from("2"), DocId::from("3")]);

    assert_eq!(engine.count().unwrap(), 2);
    let taken = engine.load_document(&DocId::from("2")).unwrap().unwrap();
    assert_eq!(taken.get("title").unwrap().as_text(), "Taken");
    let fresh = engine.load_document(&DocId::from("3")).unwrap().unwrap();
    assert_eq!(fresh.get("title").unwrap().as_text(), "Fresh");
}

#[test]
fn prefix_query_matches_longer_terms() {
    let (_tmp, mut engine) = corpus();
    engine.add_document_with_id("4", fields([
        ("title", "Shader"),
        ("text", "We render scenes"),
    ])).unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.search("rend*").unwrap().len(), 1);
    assert_eq!(ids(&engine.search("rend*").unwrap()), vec!["4"]);

    let matches = engine.find_docs_by_prefix("eng", None).unwrap();
    assert_eq!(matches["text"].len(), 2);
    assert!(engine.search("text:zzz*").unwrap().is_empty());
}

#[test]
fn typo_tolerant_fallback() {
    let (_tmp, mut engine) = corpus();

    let results = engine.search("develep").unwrap();
    assert_eq!(ids(&results), vec!["2"]);

    let matches = engine.find_docs_by_term_typo_tolerant("develep", None).unwrap();
    assert_eq!(matches["text"].doc_ids, vec![DocId::from("2")]);

    // Too short for any edit budget
    assert!(engine.search("dgo").unwrap().is_empty());
}

#[test]
fn typo_tolerance_can_be_disabled() {
    let (_tmp, mut engine) = engine_with(schema(), Config::default().without_typo_tolerance());
    engine.add_document(fields([("title", "Dog"), ("text", "search development fun")])).unwrap();
    engine.flush().unwrap();

    assert!(engine.search("develep").unwrap().is_empty());
    assert_eq!(engine.search("development").unwrap().len(), 1);
}

#[test]
fn full_text_phrase_query() {
    let (_tmp, mut engine) = corpus();

    let results = engine.search(r#""search engine for""#).unwrap();
    assert_eq!(ids(&results), vec!["3"]);
    assert!(results[0].fulltext);
    assert!(results[0].matched_terms.contains("search engine for"));

    let results = engine.search(r#""tiny search engine" meow"#).unwrap();
    assert_eq!(ids(&results), vec!["1"]);

    // Only stop words: nothing searchable
    assert!(engine.search(r#""the is""#).unwrap().is_empty());
}

#[test]
fn nested_and_counts_only_direct_text_children() {
    let (_tmp, mut engine) = corpus();

    // Matched terms of the nested group push every candidate past the
    // outer threshold of one
    assert!(engine.search("fun (search engine)").unwrap().is_empty());
}

#[test]
fn fulltext_field_must_be_stored() {
    let schema = Schema::new("broken")
        .add_field("title", FieldFlags::REQUIRED | FieldFlags::STORED | FieldFlags::INDEXED)
        .unwrap()
        .add_field("text", FieldFlags::INDEXED | FieldFlags::FULLTEXT)
        .unwrap();
    let (_tmp, mut engine) = engine_with(schema, Config::default());
    engine.add_document(fields([("title", "Cat"), ("text", "search engine")])).unwrap();
    engine.add_document(fields([("title", "Dog"), ("text", "search engine")])).unwrap();
    engine.flush().unwrap();

    let err = engine.search("search engine").unwrap_err();
    assert!(err.is_logic());

    // No hits, nothing to flag
    assert!(engine.search("missing words").unwrap().is_empty());
}

#[test]
fn boosts_raise_field_matches() {
    let (_tmp, mut engine) = corpus();

    let query = Query::or(vec![
        Query::term("title", "dog").with_boost(5.0),
        Query::term("*", "world"),
    ]);
    let results = engine.search_query(&query, "").unwrap();
    assert_eq!(results[0].id.as_str(), "2");
    // title boost 5 + text wildcard 1 + two terms
    assert_eq!(results[0].weight, 10.0);
}

#[test]
fn empty_query_returns_nothing() {
    let (_tmp, mut engine) = corpus();
    assert!(engine.search("").unwrap().is_empty());
    assert!(engine.search("()").unwrap().is_empty());
}

#[test]
fn truncate_drops_everything() {
    let (_tmp, mut engine) = corpus();
    engine.truncate().unwrap();

    assert_eq!(engine.count().unwrap(), 0);
    assert!(engine.search("search").unwrap().is_empty());

    engine.add_document(fields([("title", "Again")])).unwrap();
    engine.flush().unwrap();
    assert_eq!(ids(&engine.search("again").unwrap()), vec!["1"]);
}

#[test]
fn reopen_sees_persisted_documents() {
    let tmp = tempdir().unwrap();
    let config = Config::default().with_storage_path(tmp.path());

    {
        let mut engine = SearchEngine::open(schema(), config.clone()).unwrap();
        engine.add_document(fields([("title", "Persisted"), ("text", "development notes")])).unwrap();
        engine.flush().unwrap();
    }

    let mut engine = SearchEngine::open(schema(), config).unwrap();
    assert_eq!(engine.count().unwrap(), 1);
    assert_eq!(ids(&engine.search("develep").unwrap()), vec!["1"]);
}
