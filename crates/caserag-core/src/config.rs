//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`,
//! `config.<env>.toml` and `APP_*` env vars (`__` separates nested keys).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    base: PathBuf,
}

impl Config {
    /// Loads `config.toml` and `config.<RUST_ENV>.toml` from the working
    /// directory, then `APP_*` environment variables.
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    pub fn load_from(base: &Path, env_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(base.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            other => tracing::debug!(env = other, "no environment-specific config file for this RUST_ENV"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        tracing::debug!(base = %base.display(), env = env_name, "configuration sources merged");
        Ok(Self { figment, base: base.to_path_buf() })
    }

    /// Directory the config files were read from.
    pub fn base(&self) -> &Path { &self.base }

    /// Expands `path` and anchors it at [`Config::base`] unless absolute.
    pub fn resolve<S: AsRef<str>>(&self, path: S) -> PathBuf { resolve_with_base(&self.base, path) }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// Extracts and validates the typed settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub answerer: AnswererSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub corpus_path: String,
    pub lancedb_dir: String,
    pub table_name: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { corpus_path: "data/cases.json".to_string(), lancedb_dir: "data/indexes/lancedb".to_string(), table_name: "chunks".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model: String,
    pub max_len: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model: "paraphrase-multilingual-mpnet-base-v2".to_string(), max_len: 256, batch_size: 32 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Upper bound for any single vector store call.
    pub timeout_ms: u64,
}

impl Default for IndexSettings {
    fn default() -> Self { Self { timeout_ms: 30_000 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Candidates requested per query variant.
    pub per_query_k: usize,
    /// Chunks kept in the assembled context.
    pub top_n: usize,
    /// Reciprocal rank fusion constant.
    pub rrf_k: f64,
    /// Paraphrases requested from the answerer.
    pub paraphrases: usize,
    pub separator: String,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { per_query_k: 6, top_n: 5, rrf_k: 60.0, paraphrases: 2, separator: "\n\n---\n\n".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswererSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
    pub temperature: f32,
}

impl Default for AnswererSettings {
    fn default() -> Self {
        Self { base_url: "http://127.0.0.1:11434".to_string(), model: "qwen2.5:7b-instruct".to_string(), timeout_ms: 60_000, temperature: 0.1 }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.per_query_k == 0 { return Err(Error::InvalidConfig("retrieval.per_query_k must be at least 1".into())); }
        if r.top_n == 0 { return Err(Error::InvalidConfig("retrieval.top_n must be at least 1".into())); }
        if !(r.rrf_k > 0.0 && r.rrf_k.is_finite()) { return Err(Error::InvalidConfig("retrieval.rrf_k must be a positive number".into())); }
        if self.embedding.batch_size == 0 { return Err(Error::InvalidConfig("embedding.batch_size must be at least 1".into())); }
        if self.embedding.max_len == 0 { return Err(Error::InvalidConfig("embedding.max_len must be at least 1".into())); }
        if self.index.timeout_ms == 0 { return Err(Error::InvalidConfig("index.timeout_ms must be at least 1".into())); }
        if self.answerer.timeout_ms == 0 { return Err(Error::InvalidConfig("answerer.timeout_ms must be at least 1".into())); }
        if self.data.table_name.trim().is_empty() { return Err(Error::InvalidConfig("data.table_name must not be empty".into())); }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
