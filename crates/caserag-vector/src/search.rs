use arrow_array::{Float32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use caserag_core::error::{Error, Result};
use caserag_core::traits::{Embedder, VectorIndex};
use caserag_core::types::{Chunk, ChunkMeta};

use crate::memory::embed_query;
use crate::run_with_timeout;

/// Read-only handle over a built LanceDB chunk table.
///
/// LanceDB is async; the handle owns a runtime and blocks on it so it can
/// serve the synchronous `VectorIndex` contract. Do not call it from inside
/// another tokio runtime. Query embedding and the table search each run
/// under the configured timeout.
pub struct LanceIndex {
	rt: Runtime,
	table: Table,
	embedder: Arc<dyn Embedder>,
	timeout: Duration,
	rows: usize,
}

impl LanceIndex {
	pub(crate) fn new(rt: Runtime, table: Table, embedder: Arc<dyn Embedder>, timeout: Duration, rows: usize) -> Self {
		Self { rt, table, embedder, timeout, rows }
	}
}

impl VectorIndex for LanceIndex {
	fn nearest(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
		if k == 0 || self.rows == 0 { return Ok(Vec::new()); }
		let embedder = Arc::clone(&self.embedder);
		let text = query.to_string();
		let q_vec = run_with_timeout(&self.rt, self.timeout, "query embedding", async move {
			Ok::<_, anyhow::Error>(tokio::task::spawn_blocking(move || embed_query(embedder.as_ref(), &text)).await??)
		})?;
		let batches = run_with_timeout(&self.rt, self.timeout, "vector search", search_batches(&self.table, q_vec, k))?;
		let mut hits = Vec::new();
		for batch in &batches { hits.extend(batch_to_hits(batch)?); }
		// vectors are L2-normalized, so ascending L2 distance is descending cosine
		hits.sort_by(|a, b| a.0.total_cmp(&b.0));
		hits.truncate(k);
		tracing::debug!(k, hits = hits.len(), "lance nearest");
		Ok(hits.into_iter().map(|(_, c)| c).collect())
	}

	fn len(&self) -> usize { self.rows }
}

async fn search_batches(table: &Table, q_vec: Vec<f32>, k: usize) -> anyhow::Result<Vec<RecordBatch>> {
	let mut stream = table.vector_search(q_vec)?.limit(k).execute().await?;
	let mut out = Vec::new();
	while let Some(batch) = stream.try_next().await? { out.push(batch); }
	Ok(out)
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| Error::Retrieval(format!("search result has no '{name}' column")))
}

fn batch_to_hits(batch: &RecordBatch) -> Result<Vec<(f32, Chunk)>> {
	let ids = string_col(batch, "id")?;
	let texts = string_col(batch, "text")?;
	let metas = string_col(batch, "metadata")?;
	let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());
	let mut out = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		let meta: ChunkMeta = serde_json::from_str(metas.value(i)).map_err(|e| Error::Retrieval(format!("corrupt metadata for chunk '{}': {e}", ids.value(i))))?;
		let distance = distances.map_or(0.0, |d| d.value(i));
		out.push((distance, Chunk { id: ids.value(i).to_string(), text: texts.value(i).to_string(), meta }));
	}
	Ok(out)
}
