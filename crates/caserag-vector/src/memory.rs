//! Exact in-memory index: every chunk vector is kept and compared against
//! the query by cosine similarity.

use std::sync::Arc;

use caserag_core::chunker::validate_chunk_ids;
use caserag_core::error::{Error, Result};
use caserag_core::traits::{Embedder, IndexBuilder, VectorIndex};
use caserag_core::types::Chunk;

use crate::embed_chunks;

pub struct MemoryIndexBuilder {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl MemoryIndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self { Self { embedder, batch_size: batch_size.max(1) } }
}

impl IndexBuilder for MemoryIndexBuilder {
    type Index = MemoryIndex;

    fn build(&self, chunks: &[Chunk]) -> Result<MemoryIndex> {
        validate_chunk_ids(chunks)?;
        let mut entries = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let vectors = embed_chunks(self.embedder.as_ref(), batch)?;
            entries.extend(batch.iter().cloned().zip(vectors));
        }
        tracing::info!(chunks = entries.len(), embedder = self.embedder.id(), "built in-memory index");
        Ok(MemoryIndex { embedder: Arc::clone(&self.embedder), entries })
    }
}

pub struct MemoryIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<(Chunk, Vec<f32>)>,
}

impl VectorIndex for MemoryIndex {
    fn nearest(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        if k == 0 || self.entries.is_empty() { return Ok(Vec::new()); }
        let q = embed_query(self.embedder.as_ref(), query)?;
        let mut scored: Vec<(usize, f32)> = self.entries.iter().enumerate().map(|(i, (_, v))| (i, cosine(&q, v))).collect();
        // stable: equal similarity keeps build order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(scored.into_iter().take(k).map(|(i, _)| self.entries[i].0.clone()).collect())
    }

    fn len(&self) -> usize { self.entries.len() }
}

pub(crate) fn embed_query(embedder: &dyn Embedder, query: &str) -> Result<Vec<f32>> {
    let mut out = embedder.embed_batch(&[query.to_string()]).map_err(|e| Error::Retrieval(format!("query embedding failed: {e:#}")))?;
    let v = out.pop().ok_or_else(|| Error::Retrieval("embedder returned no vector for the query".to_string()))?;
    if v.len() != embedder.dim() {
        return Err(Error::Retrieval(format!("query vector has {} dims, index expects {}", v.len(), embedder.dim())));
    }
    Ok(v)
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}
