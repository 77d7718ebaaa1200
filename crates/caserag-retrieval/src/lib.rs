//! caserag-retrieval
//!
//! Per-question retrieval: multi-query expansion, hybrid (exact code filter
//! or vector) search per query, reciprocal rank fusion and context assembly.

pub mod context;
pub mod expand;
pub mod fusion;
pub mod hybrid;
pub mod pipeline;
pub mod prompt;

pub use context::ContextAssembler;
pub use expand::QueryExpander;
pub use fusion::{Fused, RankFuser};
pub use hybrid::HybridSearch;
pub use pipeline::{Retrieval, RetrievalPipeline};
