use std::sync::LazyLock;

use regex::Regex;

use caserag_core::chunker::Chunker;
use caserag_core::error::Result;
use caserag_core::traits::VectorIndex;
use caserag_core::types::{Chunk, Record};

/// Letter, two digits, optional decimal part. Matched against the uppercased query.
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z]\d{2}(?:\.\d+)?\b").expect("code pattern"));

/// Structured codes mentioned in `query`, uppercased, first occurrence order.
pub fn extract_codes(query: &str) -> Vec<String> {
    let upper = query.to_uppercase();
    let mut codes: Vec<String> = Vec::new();
    for m in CODE_RE.find_iter(&upper) {
        if !codes.iter().any(|c| c == m.as_str()) { codes.push(m.as_str().to_string()); }
    }
    codes
}

/// Exact code filter over the record set, with vector search as fallback.
pub struct HybridSearch<'a> {
    records: &'a [Record],
    index: &'a dyn VectorIndex,
    chunker: Chunker,
}

impl<'a> HybridSearch<'a> {
    pub fn new(records: &'a [Record], index: &'a dyn VectorIndex) -> Self {
        Self { records, index, chunker: Chunker::new() }
    }

    /// At most `k` chunks for `query`.
    ///
    /// Records carrying any code named in the query are returned in corpus
    /// order without consulting the index. Queries without codes, or whose
    /// codes match nothing, go to `VectorIndex::nearest`; its errors
    /// propagate unchanged.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        if k == 0 { return Ok(Vec::new()); }
        let codes = extract_codes(query);
        if !codes.is_empty() {
            let hits = self.exact_matches(&codes, k);
            if !hits.is_empty() {
                tracing::debug!(?codes, hits = hits.len(), "exact code match");
                return Ok(hits);
            }
            tracing::debug!(?codes, "no record carries the queried codes, falling back to vector search");
        }
        self.index.nearest(query, k)
    }

    fn exact_matches(&self, codes: &[String], k: usize) -> Vec<Chunk> {
        self.records.iter()
            .filter(|r| codes.iter().any(|code| r.has_code(code)))
            .take(k)
            .map(|r| self.chunker.compact_chunk(r))
            .collect()
    }
}
