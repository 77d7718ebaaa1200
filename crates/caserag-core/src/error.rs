use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or incomplete record; aborts an index build.
    #[error("Data error: {0}")]
    Data(String),

    /// Index or search collaborator failure, including timeouts.
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Answerer failure. Swallowed during query expansion.
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn retrieval(e: impl std::fmt::Display) -> Self {
        Self::Retrieval(e.to_string())
    }

    pub fn generation(e: impl std::fmt::Display) -> Self {
        Self::Generation(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
