use crate::error::Result;
use crate::types::{Chunk, Corpus};

/// Text embedding collaborator. Vectors are L2-normalized and `dim()` long.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model and its dimensionality.
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// A built nearest-neighbor index, read-only while questions are served.
pub trait VectorIndex: Send + Sync {
    /// Up to `k` chunks ordered by descending similarity to `query`.
    fn nearest(&self, query: &str, k: usize) -> Result<Vec<Chunk>>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Builds an index from chunks. Building twice from the same chunks yields
/// an equivalent index.
pub trait IndexBuilder {
    type Index: VectorIndex;
    fn build(&self, chunks: &[Chunk]) -> Result<Self::Index>;
}

/// Text generation collaborator used for paraphrases and final answers.
pub trait Answerer: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Supplies the validated record set.
pub trait CorpusLoader {
    fn load(&self) -> Result<Corpus>;
}

impl<T: VectorIndex + ?Sized> VectorIndex for Box<T> {
    fn nearest(&self, query: &str, k: usize) -> Result<Vec<Chunk>> { (**self).nearest(query, k) }
    fn len(&self) -> usize { (**self).len() }
}

impl<T: Embedder + ?Sized> Embedder for Box<T> {
    fn id(&self) -> &str { (**self).id() }
    fn dim(&self) -> usize { (**self).dim() }
    fn max_len(&self) -> usize { (**self).max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { (**self).embed_batch(texts) }
}

impl<T: Answerer + ?Sized> Answerer for Box<T> {
    fn complete(&self, prompt: &str) -> Result<String> { (**self).complete(prompt) }
}
