use crate::fusion::Fused;

pub const DEFAULT_SEPARATOR: &str = "\n\n---\n\n";

/// Joins the texts of the best `top_n` fused chunks.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    top_n: usize,
    separator: String,
}

impl Default for ContextAssembler {
    fn default() -> Self { Self::new(5, DEFAULT_SEPARATOR) }
}

impl ContextAssembler {
    pub fn new(top_n: usize, separator: &str) -> Self { Self { top_n, separator: separator.to_string() } }

    pub fn top_n(&self) -> usize { self.top_n }

    pub fn assemble(&self, fused: &[Fused]) -> String {
        fused.iter().take(self.top_n).map(|f| f.chunk.text.as_str()).collect::<Vec<_>>().join(&self.separator)
    }
}
