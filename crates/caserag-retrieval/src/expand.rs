use caserag_core::traits::Answerer;

use crate::prompt::paraphrase_prompt;

/// Widens a question into a query set through the answerer.
pub struct QueryExpander<'a> {
    answerer: &'a dyn Answerer,
    paraphrases: usize,
}

impl<'a> QueryExpander<'a> {
    pub fn new(answerer: &'a dyn Answerer, paraphrases: usize) -> Self { Self { answerer, paraphrases } }

    /// The original question first, then up to `paraphrases` generated
    /// variants. A failing answerer leaves only the original.
    pub fn expand(&self, original: &str) -> Vec<String> {
        let mut queries = vec![original.to_string()];
        if self.paraphrases == 0 { return queries; }
        match self.answerer.complete(&paraphrase_prompt(original, self.paraphrases)) {
            Ok(text) => queries.extend(parse_paraphrases(&text, self.paraphrases)),
            Err(e) => tracing::warn!(error = %e, "query expansion failed, searching with the original question only"),
        }
        tracing::debug!(queries = queries.len(), "expanded query set");
        queries
    }
}

/// Non-empty trimmed lines, at most `max` of them.
pub fn parse_paraphrases(text: &str, max: usize) -> Vec<String> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).take(max).map(str::to_string).collect()
}
