use caserag_core::config::RetrievalSettings;
use caserag_core::error::{Error, Result};
use caserag_core::traits::{Answerer, VectorIndex};
use caserag_core::types::{Chunk, Record};

use crate::context::ContextAssembler;
use crate::expand::QueryExpander;
use crate::fusion::{Fused, RankFuser};
use crate::hybrid::HybridSearch;
use crate::prompt::answer_prompt;

/// Everything gathered for one question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieval {
    /// Original question first, then paraphrases.
    pub queries: Vec<String>,
    /// One candidate list per query, same order as `queries`.
    pub candidates: Vec<Vec<Chunk>>,
    pub fused: Vec<Fused>,
    pub context: String,
}

impl Retrieval {
    pub fn is_empty(&self) -> bool { self.fused.is_empty() }
}

/// Question → query set → per-query hybrid search → fusion → context.
///
/// Holds no state between questions; the index and records are borrowed
/// read-only.
pub struct RetrievalPipeline<'a> {
    search: HybridSearch<'a>,
    expander: QueryExpander<'a>,
    fuser: RankFuser,
    assembler: ContextAssembler,
    per_query_k: usize,
}

impl<'a> RetrievalPipeline<'a> {
    pub fn new(records: &'a [Record], index: &'a dyn VectorIndex, answerer: &'a dyn Answerer, settings: &RetrievalSettings) -> Self {
        Self {
            search: HybridSearch::new(records, index),
            expander: QueryExpander::new(answerer, settings.paraphrases),
            fuser: RankFuser::new(settings.rrf_k),
            assembler: ContextAssembler::new(settings.top_n, &settings.separator),
            per_query_k: settings.per_query_k,
        }
    }

    /// Runs retrieval for `question`. Search errors abort with
    /// `Error::Retrieval`; expansion failures only shrink the query set.
    pub fn retrieve(&self, question: &str) -> Result<Retrieval> {
        if question.trim().is_empty() { return Ok(Retrieval::default()); }
        let queries = self.expander.expand(question);
        let mut candidates = Vec::with_capacity(queries.len());
        for q in &queries {
            let hits = self.search.search(q, self.per_query_k)?;
            tracing::debug!(query = %q, hits = hits.len(), "candidate list");
            candidates.push(hits);
        }
        let fused = self.fuser.fuse(&candidates);
        let context = self.assembler.assemble(&fused);
        tracing::info!(queries = queries.len(), fused = fused.len(), kept = fused.len().min(self.assembler.top_n()), "retrieval done");
        Ok(Retrieval { queries, candidates, fused, context })
    }

    /// Generates the final answer from a finished retrieval. The retrieval
    /// is only borrowed and stays usable if the answerer fails.
    pub fn answer(retrieval: &Retrieval, question: &str, answerer: &dyn Answerer) -> Result<String> {
        let prompt = answer_prompt(question, &retrieval.context);
        answerer.complete(&prompt).map_err(|e| match e {
            Error::Generation(_) => e,
            other => Error::generation(other),
        })
    }
}
