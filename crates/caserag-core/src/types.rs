//! Domain types shared by the chunker, the indexes and the retrieval stages.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// One source case of the corpus.
///
/// - `id`: stable, corpus-unique identifier
/// - `category`: grouping key (e.g. `infectious_disease`)
/// - `description`: primary description (the diagnosis)
/// - `codes`: structured classification codes such as `A09` or `J18.9`
/// - `procedure`/`caveats`: optional free text, `None` when absent or blank
/// - `rationale`: free-text coding notes
/// - `keywords`: search hints supplied by the corpus author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub category: String,
    pub description: String,
    pub codes: Vec<String>,
    pub procedure: Option<String>,
    pub rationale: String,
    pub caveats: Option<String>,
    pub keywords: Vec<String>,
}

impl Record {
    /// True when any of the record's codes equals `code`, ignoring case.
    pub fn has_code(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c.eq_ignore_ascii_case(code))
    }
}

/// Identifying fields carried alongside a chunk's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub id: ChunkId,
    pub category: String,
    pub codes: Vec<String>,
    pub keywords: Vec<String>,
}

impl From<&Record> for ChunkMeta {
    fn from(r: &Record) -> Self {
        Self { id: r.id.clone(), category: r.category.clone(), codes: r.codes.clone(), keywords: r.keywords.clone() }
    }
}

/// A retrieval unit. Exactly one chunk exists per record and `id` equals the
/// record id, so a hit always carries the complete case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub meta: ChunkMeta,
}

/// Counts reported after loading a corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub total_records: usize,
    /// Distinct categories in first-seen order.
    pub categories: Vec<String>,
}

impl CorpusSummary {
    pub fn from_records(records: &[Record]) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for r in records {
            if !categories.iter().any(|c| c == &r.category) {
                categories.push(r.category.clone());
            }
        }
        Self { total_records: records.len(), categories }
    }
}

/// The full, immutable record set plus its summary.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub records: Vec<Record>,
    pub summary: CorpusSummary,
}

impl Corpus {
    pub fn new(records: Vec<Record>) -> Self {
        let summary = CorpusSummary::from_records(&records);
        Self { records, summary }
    }
}
