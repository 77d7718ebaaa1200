//! JSON corpus loader.
//!
//! Reads `{ "metadata": {..}, "cases": [..] }`, converts every entry into a
//! typed [`Record`] and validates required fields before anything is handed
//! to the chunker. Legacy field names are accepted as aliases.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::chunker::validate_records;
use crate::error::{Error, Result};
use crate::traits::CorpusLoader;
use crate::types::{Corpus, Record};

#[derive(Debug, Deserialize)]
struct RawCorpus {
    #[serde(default)]
    metadata: Option<RawMeta>,
    #[serde(default, alias = "records")]
    cases: Option<Vec<RawRecord>>,
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    #[serde(default, alias = "total_records")]
    total_cases: Option<usize>,
    #[serde(default)]
    categories: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, alias = "kategori")]
    category: Option<String>,
    #[serde(default, alias = "diagnosa")]
    description: Option<String>,
    #[serde(default, alias = "kode_diagnosa")]
    codes: Option<Vec<String>>,
    #[serde(default, alias = "prosedur")]
    procedure: Option<String>,
    #[serde(default, alias = "aspek_koding")]
    rationale: Option<String>,
    #[serde(default, alias = "perhatian_khusus")]
    caveats: Option<String>,
    #[serde(default)]
    keywords: Option<Vec<String>>,
}

impl RawRecord {
    fn into_record(self, pos: usize) -> Result<Record> {
        let id = match self.id {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => return Err(Error::Data(format!("record #{pos}: id must be a string or number, got {other}"))),
            None => String::new(),
        };
        let required = |field: &str, v: Option<String>| -> Result<String> {
            match v {
                Some(s) if !s.trim().is_empty() => Ok(s),
                _ => Err(Error::Data(format!("record #{pos} (id '{id}'): missing required field '{field}'"))),
            }
        };
        if id.trim().is_empty() {
            return Err(Error::Data(format!("record #{pos}: missing required field 'id'")));
        }
        let category = required("category", self.category)?;
        let description = required("description", self.description)?;
        let rationale = required("rationale", self.rationale)?;
        Ok(Record {
            id,
            category,
            description,
            codes: self.codes.unwrap_or_default().into_iter().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).collect(),
            procedure: non_blank(self.procedure),
            rationale,
            caveats: non_blank(self.caveats),
            keywords: self.keywords.unwrap_or_default(),
        })
    }
}

fn non_blank(v: Option<String>) -> Option<String> { v.filter(|s| !s.trim().is_empty()) }

/// Parses and validates a corpus document.
pub fn parse_corpus(json: &str) -> Result<Corpus> {
    let raw: RawCorpus = serde_json::from_str(json).map_err(|e| Error::Data(format!("invalid corpus JSON: {e}")))?;
    let entries = raw.cases.ok_or_else(|| Error::Data("corpus has no 'cases' array".to_string()))?;
    let records = entries.into_iter().enumerate().map(|(pos, r)| r.into_record(pos)).collect::<Result<Vec<_>>>()?;
    validate_records(&records)?;
    let corpus = Corpus::new(records);
    if let Some(meta) = raw.metadata {
        check_declared(&meta, &corpus);
    }
    Ok(corpus)
}

fn check_declared(meta: &RawMeta, corpus: &Corpus) {
    if let Some(total) = meta.total_cases {
        if total != corpus.summary.total_records {
            tracing::warn!(declared = total, actual = corpus.summary.total_records, "corpus metadata record count disagrees with contents");
        }
    }
    if let Some(categories) = &meta.categories {
        if categories.len() != corpus.summary.categories.len() {
            tracing::warn!(declared = categories.len(), actual = corpus.summary.categories.len(), "corpus metadata category count disagrees with contents");
        }
    }
}

/// Loads a corpus from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonCorpusLoader {
    path: PathBuf,
}

impl JsonCorpusLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }
}

impl CorpusLoader for JsonCorpusLoader {
    fn load(&self) -> Result<Corpus> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::NotFound(format!("corpus file {}: {e}", self.path.display())))?;
        let corpus = parse_corpus(&content)?;
        tracing::info!(
            path = %self.path.display(),
            records = corpus.summary.total_records,
            categories = corpus.summary.categories.len(),
            "loaded corpus"
        );
        Ok(corpus)
    }
}
