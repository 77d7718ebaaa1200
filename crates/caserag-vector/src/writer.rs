use anyhow::anyhow;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::{Connection, Table};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use caserag_core::chunker::validate_chunk_ids;
use caserag_core::error::{Error, Result};
use caserag_core::traits::{Embedder, IndexBuilder};
use caserag_core::types::Chunk;

use crate::schema::build_chunk_schema;
use crate::search::LanceIndex;
use crate::table::{open_db, read_meta, table_exists, write_meta};
use crate::{embed_chunks, run_with_timeout};

const FINGERPRINT_KEY: &str = "fingerprint";

/// Builds (or reuses) a LanceDB chunk table under `db_path`.
///
/// The database is stamped with a fingerprint of the embedder and the chunk
/// set. A later build over identical chunks reopens the table instead of
/// embedding again; any difference rebuilds the directory from scratch.
pub struct LanceIndexBuilder {
	db_path: PathBuf,
	table_name: String,
	embedder: Arc<dyn Embedder>,
	batch_size: usize,
	timeout: Duration,
}

impl LanceIndexBuilder {
	pub fn new(db_path: impl Into<PathBuf>, table_name: &str, embedder: Arc<dyn Embedder>) -> Self {
		Self { db_path: db_path.into(), table_name: table_name.to_string(), embedder, batch_size: 32, timeout: Duration::from_secs(30) }
	}

	#[must_use]
	pub fn with_batch_size(mut self, batch_size: usize) -> Self { self.batch_size = batch_size.max(1); self }

	#[must_use]
	pub fn with_timeout(mut self, timeout: Duration) -> Self { self.timeout = timeout; self }

	fn reuse_existing(&self, rt: &Runtime, uri: &str, fingerprint: &str) -> Result<Option<Table>> {
		if !self.db_path.exists() { return Ok(None); }
		let (meta, has_table) = run_with_timeout(rt, self.timeout, "reading index metadata", async {
			let conn = open_db(uri).await?;
			Ok((read_meta(&conn).await?, table_exists(&conn, &self.table_name).await?))
		})?;
		if meta.is_empty() && !looks_like_lance_dir(&self.db_path) {
			return Err(Error::Retrieval(format!("refusing to overwrite {}: not a caserag index directory", self.db_path.display())));
		}
		if meta.get(FINGERPRINT_KEY).map(String::as_str) != Some(fingerprint) || !has_table {
			tracing::info!(path = %self.db_path.display(), table = %self.table_name, has_table, "index is stale, rebuilding");
			return Ok(None);
		}
		let table = run_with_timeout(rt, self.timeout, "opening chunk table", async {
			let conn = open_db(uri).await?;
			Ok(conn.open_table(&self.table_name).execute().await?)
		})?;
		tracing::info!(path = %self.db_path.display(), "reusing existing index");
		Ok(Some(table))
	}
}

impl IndexBuilder for LanceIndexBuilder {
	type Index = LanceIndex;

	fn build(&self, chunks: &[Chunk]) -> Result<LanceIndex> {
		validate_chunk_ids(chunks)?;
		let rt = Runtime::new().map_err(Error::retrieval)?;
		let uri = self.db_path.to_string_lossy().to_string();
		let fp = fingerprint(self.embedder.id(), chunks);
		if let Some(table) = self.reuse_existing(&rt, &uri, &fp)? {
			return Ok(LanceIndex::new(rt, table, Arc::clone(&self.embedder), self.timeout, chunks.len()));
		}
		if self.db_path.exists() { std::fs::remove_dir_all(&self.db_path).map_err(Error::retrieval)?; }
		std::fs::create_dir_all(&self.db_path).map_err(Error::retrieval)?;

		tracing::info!(chunks = chunks.len(), table = %self.table_name, path = %uri, embedder = self.embedder.id(), max_len = self.embedder.max_len(), "indexing chunks into LanceDB");
		let conn = run_with_timeout(&rt, self.timeout, "opening database", open_db(&uri))?;
		let dim = i32::try_from(self.embedder.dim()).map_err(Error::retrieval)?;
		let pb = ProgressBar::new(chunks.len() as u64);
		pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}").unwrap_or_else(|_| ProgressStyle::default_bar()).progress_chars("#>-"));
		let mut created = false;
		for batch in chunks.chunks(self.batch_size) {
			let vectors = embed_chunks(self.embedder.as_ref(), batch)?;
			let rb = chunks_to_record_batch(batch, &vectors, dim).map_err(Error::retrieval)?;
			run_with_timeout(&rt, self.timeout, "writing chunk batch", insert_batch(&conn, &self.table_name, rb, !created))?;
			created = true;
			pb.inc(batch.len() as u64);
		}
		if !created {
			let schema = build_chunk_schema(dim);
			run_with_timeout(&rt, self.timeout, "creating empty chunk table", async {
				let reader = Box::new(RecordBatchIterator::new(vec![].into_iter(), schema.clone()));
				conn.create_table(&self.table_name, reader).execute().await?;
				Ok(())
			})?;
		}
		let meta = [
			(FINGERPRINT_KEY, fp),
			("embedder_id", self.embedder.id().to_string()),
			("dim", dim.to_string()),
			("rows", chunks.len().to_string()),
			("built_at", chrono::Utc::now().to_rfc3339()),
		];
		run_with_timeout(&rt, self.timeout, "writing index metadata", write_meta(&conn, &meta))?;
		let table = run_with_timeout(&rt, self.timeout, "opening chunk table", async { Ok(conn.open_table(&self.table_name).execute().await?) })?;
		pb.finish_with_message("done");
		tracing::info!(rows = chunks.len(), "LanceDB indexing completed");
		Ok(LanceIndex::new(rt, table, Arc::clone(&self.embedder), self.timeout, chunks.len()))
	}
}

/// blake3 over the embedder id and every chunk's id and text, in order.
pub fn fingerprint(embedder_id: &str, chunks: &[Chunk]) -> String {
	let mut hasher = blake3::Hasher::new();
	hasher.update(embedder_id.as_bytes());
	for c in chunks {
		hasher.update(&[0]);
		hasher.update(c.id.as_bytes());
		hasher.update(&[0]);
		hasher.update(c.text.as_bytes());
	}
	hasher.finalize().to_hex().to_string()
}

fn looks_like_lance_dir(path: &Path) -> bool {
	match std::fs::read_dir(path) {
		Ok(entries) => entries.filter_map(std::result::Result::ok).all(|e| e.file_name().to_string_lossy().ends_with(".lance")),
		Err(_) => false,
	}
}

async fn insert_batch(conn: &Connection, table_name: &str, rb: RecordBatch, create: bool) -> anyhow::Result<()> {
	let schema = rb.schema();
	let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), schema));
	if create {
		conn.create_table(table_name, reader).execute().await?;
	} else {
		conn.open_table(table_name).execute().await?.add(reader).execute().await?;
	}
	Ok(())
}

fn chunks_to_record_batch(chunks: &[Chunk], vectors: &[Vec<f32>], dim: i32) -> anyhow::Result<RecordBatch> {
	let mut ids = Vec::with_capacity(chunks.len()); let mut categories = Vec::with_capacity(chunks.len()); let mut texts = Vec::with_capacity(chunks.len()); let mut metas = Vec::with_capacity(chunks.len());
	for c in chunks { ids.push(c.id.clone()); categories.push(c.meta.category.clone()); texts.push(c.text.clone()); metas.push(serde_json::to_string(&c.meta)?); }
	let vectors: Vec<Option<Vec<Option<f32>>>> = vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect())).collect();
	if vectors.len() != chunks.len() { return Err(anyhow!("{} vectors for {} chunks", vectors.len(), chunks.len())); }
	let record_batch = RecordBatch::try_new(build_chunk_schema(dim), vec![
		Arc::new(StringArray::from(ids)),
		Arc::new(StringArray::from(categories)),
		Arc::new(StringArray::from(texts)),
		Arc::new(StringArray::from(metas)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim)),
	])?;
	Ok(record_batch)
}
