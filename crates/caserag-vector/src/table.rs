//! LanceDB connection helpers and the key/value `meta` table that records
//! what the chunk table was built from.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use arrow_array::{RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::ExecutableQuery;
use lancedb::{connect, Connection};

use crate::schema::{build_meta_schema, META_TABLE};

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.table_names().execute().await?.iter().any(|n| n == name))
}

/// Creates the meta table. Only called on a freshly wiped directory.
pub async fn write_meta(conn: &Connection, entries: &[(&str, String)]) -> Result<()> {
    let keys: Vec<&str> = entries.iter().map(|(k, _)| *k).collect();
    let values: Vec<&str> = entries.iter().map(|(_, v)| v.as_str()).collect();
    let batch = RecordBatch::try_new(build_meta_schema(), vec![Arc::new(StringArray::from(keys)), Arc::new(StringArray::from(values))])?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), build_meta_schema()));
    conn.create_table(META_TABLE, reader).execute().await?;
    Ok(())
}

/// Meta entries, or an empty map when the database has no meta table.
pub async fn read_meta(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut meta = HashMap::new();
    if !table_exists(conn, META_TABLE).await? { return Ok(meta); }
    let mut stream = conn.open_table(META_TABLE).execute().await?.query().execute().await?;
    while let Some(batch) = stream.try_next().await? {
        let keys = utf8_column(&batch, "key")?;
        let values = utf8_column(&batch, "value")?;
        meta.extend((0..batch.num_rows()).map(|i| (keys.value(i).to_string(), values.value(i).to_string())));
    }
    Ok(meta)
}

fn utf8_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("meta table has no '{name}' column"))
}
