use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use caserag_core::config::{Config, Settings};
use caserag_core::corpus::JsonCorpusLoader;
use caserag_core::traits::{CorpusLoader, Embedder, IndexBuilder};
use caserag_core::types::Corpus;
use caserag_core::Chunker;
use caserag_embed::get_default_embedder;
use caserag_retrieval::{HybridSearch, Retrieval, RetrievalPipeline};
use caserag_vector::{LanceIndex, LanceIndexBuilder};

mod ollama;

use ollama::OllamaAnswerer;

#[derive(Parser)]
#[command(name = "caserag", version, about = "Retrieval and question answering over a coding case base")]
struct Cli {
    /// Corpus JSON file (overrides data.corpus_path)
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the vector index, or reuse it when the corpus is unchanged
    Ingest,
    /// Hybrid search for one query, without expansion or fusion
    Search {
        query: String,
        /// Number of results (defaults to retrieval.per_query_k)
        #[arg(long, short)]
        k: Option<usize>,
    },
    /// Retrieve context for a question and answer it
    Ask {
        question: String,
        /// Print the assembled context instead of generating an answer
        #[arg(long)]
        context_only: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;
    let settings = config.settings().context("loading configuration")?;
    let loader = JsonCorpusLoader::new(cli.corpus.clone().unwrap_or_else(|| config.resolve(&settings.data.corpus_path)));
    let corpus = loader.load().with_context(|| format!("loading corpus {}", loader.path().display()))?;
    let index_dir = config.resolve(&settings.data.lancedb_dir);
    let index = open_index(&settings, &corpus, index_dir.clone())?;

    match cli.command {
        Command::Ingest => {
            println!("✅ Indexed {} records in {} categories", corpus.summary.total_records, corpus.summary.categories.len());
            println!("   categories: {}", corpus.summary.categories.join(", "));
            println!("   index: {}", index_dir.display());
        }
        Command::Search { query, k } => {
            let k = k.unwrap_or(settings.retrieval.per_query_k);
            let hits = HybridSearch::new(&corpus.records, &index).search(&query, k)?;
            println!("🔍 {} results for: \"{}\"", hits.len(), query);
            for (i, hit) in hits.iter().enumerate() {
                println!("\n{}. id={}  category={}  codes={}", i + 1, hit.id, hit.meta.category, hit.meta.codes.join(", "));
                println!("{}", hit.text);
            }
        }
        Command::Ask { question, context_only } => {
            let answerer = OllamaAnswerer::new(&settings.answerer)?;
            let pipeline = RetrievalPipeline::new(&corpus.records, &index, &answerer, &settings.retrieval);
            let retrieval = pipeline.retrieve(&question)?;
            if let Some(message) = empty_retrieval_message(&retrieval) {
                println!("{message}");
                return Ok(());
            }
            tracing::info!(queries = ?retrieval.queries, "query set");
            if context_only {
                println!("{}", retrieval.context);
                return Ok(());
            }
            let answer = RetrievalPipeline::answer(&retrieval, &question, &answerer)?;
            println!("{answer}");
            let sources: Vec<&str> = retrieval.fused.iter().take(settings.retrieval.top_n).map(|f| f.chunk.id.as_str()).collect();
            println!("\n📚 Sources: {}", sources.join(", "));
        }
    }
    Ok(())
}

fn open_index(settings: &Settings, corpus: &Corpus, index_dir: PathBuf) -> anyhow::Result<LanceIndex> {
    let chunks = Chunker::new().chunk(&corpus.records)?;
    let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&settings.embedding)?);
    let index = LanceIndexBuilder::new(index_dir, &settings.data.table_name, embedder)
        .with_batch_size(settings.embedding.batch_size)
        .with_timeout(Duration::from_millis(settings.index.timeout_ms))
        .build(&chunks)?;
    Ok(index)
}

/// Shown instead of an answer when retrieval produced no evidence.
fn empty_retrieval_message(retrieval: &Retrieval) -> Option<&'static str> {
    if retrieval.queries.is_empty() {
        Some("Nothing to search for.")
    } else if retrieval.is_empty() {
        Some("No matching cases found.")
    } else {
        None
    }
}
