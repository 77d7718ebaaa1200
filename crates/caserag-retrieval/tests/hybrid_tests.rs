use std::sync::atomic::{AtomicUsize, Ordering};

use caserag_core::error::{Error, Result};
use caserag_core::traits::VectorIndex;
use caserag_core::types::{Chunk, ChunkMeta, Record};
use caserag_retrieval::hybrid::{extract_codes, HybridSearch};

fn record(id: &str, codes: &[&str]) -> Record {
    Record {
        id: id.to_string(),
        category: "respiratory".to_string(),
        description: format!("description of {id}"),
        codes: codes.iter().map(|c| (*c).to_string()).collect(),
        procedure: None,
        rationale: "because".to_string(),
        caveats: None,
        keywords: vec![],
    }
}

fn records() -> Vec<Record> {
    vec![record("R1", &["A09", "E86"]), record("R2", &["J18.9"]), record("R3", &["J20.9", "E86"]), record("R4", &["I10"])]
}

/// Answers every query with a fixed list and counts the calls.
struct CountingIndex { calls: AtomicUsize, last_k: AtomicUsize, fail: bool }

impl CountingIndex {
    fn new() -> Self { Self { calls: AtomicUsize::new(0), last_k: AtomicUsize::new(0), fail: false } }
    fn failing() -> Self { Self { fail: true, ..Self::new() } }
    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl VectorIndex for CountingIndex {
    fn nearest(&self, _query: &str, k: usize) -> Result<Vec<Chunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_k.store(k, Ordering::SeqCst);
        if self.fail { return Err(Error::Retrieval("index offline".to_string())); }
        let meta = ChunkMeta { id: "V1".to_string(), category: "x".to_string(), codes: vec![], keywords: vec![] };
        Ok(vec![Chunk { id: "V1".to_string(), text: "vector hit".to_string(), meta }])
    }
    fn len(&self) -> usize { 1 }
}

#[test]
fn exact_code_returns_owning_record_first_for_any_k() -> anyhow::Result<()> {
    let records = records();
    let index = CountingIndex::new();
    let search = HybridSearch::new(&records, &index);
    for k in 1..=4 {
        let hits = search.search("how do I code J18.9 pneumonia?", k)?;
        assert_eq!(hits[0].id, "R2");
        assert_eq!(hits.len(), 1);
    }
    assert_eq!(index.calls(), 0, "exact path must bypass the index");
    Ok(())
}

#[test]
fn exact_path_uses_compact_rendering_and_full_metadata() -> anyhow::Result<()> {
    let records = records();
    let index = CountingIndex::new();
    let hits = HybridSearch::new(&records, &index).search("i10", 3)?;
    assert_eq!(hits.len(), 1);
    assert!(hits[0].text.starts_with("ID: R4\nDESCRIPTION: description of R4\nCODES: I10\n"));
    assert_eq!(hits[0].meta.codes, vec!["I10"]);
    assert_eq!(hits[0].meta.category, "respiratory");
    Ok(())
}

#[test]
fn exact_path_keeps_corpus_order_and_honours_k() -> anyhow::Result<()> {
    let records = records();
    let index = CountingIndex::new();
    let search = HybridSearch::new(&records, &index);
    let ids = |hits: Vec<Chunk>| hits.into_iter().map(|c| c.id).collect::<Vec<_>>();
    assert_eq!(ids(search.search("E86 or J20.9", 5)?), vec!["R1", "R3"]);
    assert_eq!(ids(search.search("E86 or J20.9", 1)?), vec!["R1"]);
    assert_eq!(index.calls(), 0);
    Ok(())
}

#[test]
fn query_without_codes_goes_to_the_index_once() -> anyhow::Result<()> {
    let records = records();
    let index = CountingIndex::new();
    let hits = HybridSearch::new(&records, &index).search("fever and productive cough", 6)?;
    assert_eq!(hits[0].id, "V1");
    assert_eq!(index.calls(), 1);
    assert_eq!(index.last_k.load(Ordering::SeqCst), 6);
    Ok(())
}

#[test]
fn unknown_code_falls_back_to_the_index() -> anyhow::Result<()> {
    let records = records();
    let index = CountingIndex::new();
    let hits = HybridSearch::new(&records, &index).search("what about Z99.9?", 4)?;
    assert_eq!(hits[0].id, "V1");
    assert_eq!(index.calls(), 1);
    Ok(())
}

#[test]
fn index_failure_propagates_as_retrieval_error() {
    let records = records();
    let index = CountingIndex::failing();
    let result = HybridSearch::new(&records, &index).search("open question", 3);
    assert!(matches!(result, Err(Error::Retrieval(_))));
}

#[test]
fn k_zero_returns_nothing() -> anyhow::Result<()> {
    let records = records();
    let index = CountingIndex::new();
    assert!(HybridSearch::new(&records, &index).search("J18.9", 0)?.is_empty());
    assert!(HybridSearch::new(&records, &index).search("cough", 0)?.is_empty());
    assert_eq!(index.calls(), 0);
    Ok(())
}

#[test]
fn code_extraction() {
    assert_eq!(extract_codes("Code a09 with E86, then A09 again"), vec!["A09", "E86"]);
    assert_eq!(extract_codes("pneumonia J18.9."), vec!["J18.9"]);
    assert!(extract_codes("covid19 and version 2.0 and A1").is_empty());
    assert!(extract_codes("").is_empty());
}
