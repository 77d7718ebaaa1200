//! caserag-vector
//!
//! Index implementations behind `caserag_core::traits::VectorIndex`: an exact
//! in-memory index and a persistent LanceDB index.

use std::future::Future;
use std::time::Duration;

use caserag_core::error::{Error, Result};
use caserag_core::traits::Embedder;
use caserag_core::types::Chunk;
use tokio::runtime::Runtime;

pub mod memory;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use memory::{MemoryIndex, MemoryIndexBuilder};
pub use search::LanceIndex;
pub use writer::{fingerprint, LanceIndexBuilder};

/// Embeds chunk texts, checking count and dimensionality.
pub(crate) fn embed_chunks(embedder: &dyn Embedder, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed_batch(&texts).map_err(|e| Error::Retrieval(format!("embedding failed: {e:#}")))?;
    if vectors.len() != chunks.len() {
        return Err(Error::Retrieval(format!("embedder returned {} vectors for {} chunks", vectors.len(), chunks.len())));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != embedder.dim()) {
        return Err(Error::Retrieval(format!("embedder returned a {}-dim vector, expected {}", bad.len(), embedder.dim())));
    }
    Ok(vectors)
}

/// Blocks on `fut`, mapping both failure and timeout to `Error::Retrieval`.
pub(crate) fn run_with_timeout<T, F>(rt: &Runtime, timeout: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match rt.block_on(async { tokio::time::timeout(timeout, fut).await }) {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(Error::Retrieval(format!("{what}: {e:#}"))),
        Err(_) => Err(Error::Retrieval(format!("{what}: timed out after {} ms", timeout.as_millis()))),
    }
}
