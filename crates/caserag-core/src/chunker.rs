use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkMeta, Record};

pub const NONE: &str = "none";
pub const NOT_APPLICABLE: &str = "not applicable";

/// Turns records into retrieval units, one chunk per record.
#[derive(Debug, Default, Clone, Copy)]
pub struct Chunker;

impl Chunker {
    pub fn new() -> Self { Self }

    /// Validates every record first, then renders. A single bad record fails
    /// the whole batch and no chunk is returned.
    pub fn chunk(&self, records: &[Record]) -> Result<Vec<Chunk>> {
        validate_records(records)?;
        let chunks: Vec<Chunk> = records.iter().map(|r| self.chunk_record(r)).collect();
        tracing::debug!(records = records.len(), chunks = chunks.len(), "chunked corpus");
        Ok(chunks)
    }

    pub fn chunk_record(&self, record: &Record) -> Chunk {
        Chunk { id: record.id.clone(), text: render_full(record), meta: ChunkMeta::from(record) }
    }

    /// Chunk with the narrower rendering used by exact code lookups.
    pub fn compact_chunk(&self, record: &Record) -> Chunk {
        Chunk { id: record.id.clone(), text: render_compact(record), meta: ChunkMeta::from(record) }
    }
}

/// Checks required fields and id uniqueness.
pub fn validate_records(records: &[Record]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
    for (pos, r) in records.iter().enumerate() {
        validate_record(pos, r)?;
        if !seen.insert(r.id.as_str()) {
            return Err(Error::Data(format!("record #{pos}: duplicate id '{}'", r.id)));
        }
    }
    Ok(())
}

/// Every chunk must carry a non-empty id that no other chunk shares; the id
/// is the identity used by rank fusion.
pub fn validate_chunk_ids(chunks: &[Chunk]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(chunks.len());
    for (pos, c) in chunks.iter().enumerate() {
        if c.id.trim().is_empty() {
            return Err(Error::Data(format!("chunk #{pos} has no id")));
        }
        if !seen.insert(c.id.as_str()) {
            return Err(Error::Data(format!("chunk #{pos}: duplicate id '{}'", c.id)));
        }
    }
    Ok(())
}

fn validate_record(pos: usize, r: &Record) -> Result<()> {
    let required = [("id", &r.id), ("category", &r.category), ("description", &r.description), ("rationale", &r.rationale)];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(Error::Data(format!("record #{pos} (id '{}'): missing required field '{field}'", r.id)));
        }
    }
    Ok(())
}

/// Full fixed-layout rendering. Every field is always present so the text
/// shape is identical across records.
pub fn render_full(r: &Record) -> String {
    format!(
        "ID: {id}\nCATEGORY: {category}\n\nDESCRIPTION: {description}\nCODES: {codes}\n\nPROCEDURE: {procedure}\n\nRATIONALE:\n{rationale}\n\nCAVEATS: {caveats}\n\nKEYWORDS: {keywords}",
        id = r.id,
        category = display_category(&r.category),
        description = r.description,
        codes = join_or(&r.codes, NONE),
        procedure = r.procedure.as_deref().unwrap_or(NOT_APPLICABLE),
        rationale = r.rationale,
        caveats = r.caveats.as_deref().unwrap_or(NONE),
        keywords = join_or(&r.keywords, NONE),
    )
}

pub fn render_compact(r: &Record) -> String {
    format!(
        "ID: {}\nDESCRIPTION: {}\nCODES: {}\nPROCEDURE: {}\nRATIONALE: {}\nCAVEATS: {}",
        r.id,
        r.description,
        join_or(&r.codes, NONE),
        r.procedure.as_deref().unwrap_or(NOT_APPLICABLE),
        r.rationale,
        r.caveats.as_deref().unwrap_or(NONE),
    )
}

fn display_category(category: &str) -> String { category.to_uppercase().replace('_', " ") }

fn join_or(items: &[String], placeholder: &str) -> String {
    if items.is_empty() { placeholder.to_string() } else { items.join(", ") }
}
