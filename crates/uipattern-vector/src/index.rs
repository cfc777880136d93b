use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType};
use tracing::debug;

use uipattern_core::traits::VectorIndex;
use uipattern_core::types::{Filters, RetrievalMethod, SearchHit};
use uipattern_core::{Error, Result};

use crate::table::{open_db, table_exists};

/// Cosine nearest-neighbour search over the LanceDB pattern table.
pub struct LanceVectorIndex {
    db: Connection,
    table_name: String,
}

impl LanceVectorIndex {
    pub async fn connect(uri: &str, table_name: &str) -> Result<Self> {
        let db = open_db(uri).await?;
        Ok(Self { db, table_name: table_name.to_string() })
    }
}

#[async_trait]
impl VectorIndex for LanceVectorIndex {
    async fn query(&self, vector: &[f32], top_k: usize, filters: &Filters) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        if !table_exists(&self.db, &self.table_name).await? {
            return Err(Error::IndexUnavailable(format!("table '{}' does not exist", self.table_name)));
        }
        let table = self.db.open_table(&self.table_name).execute().await.map_err(unavailable)?;
        let mut query = table
            .vector_search(vector.to_vec())
            .map_err(unavailable)?
            .distance_type(DistanceType::Cosine)
            .limit(top_k);
        if let Some(predicate) = filter_predicate(filters)? {
            query = query.only_if(predicate);
        }

        let mut stream = query.execute().await.map_err(unavailable)?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(unavailable)? {
            hits.extend(batch_hits(&batch)?);
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        debug!(table = %self.table_name, hits = hits.len(), "vector search");
        Ok(hits)
    }
}

fn batch_hits(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
    let ids = batch
        .column_by_name("id")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::Operation("vector search result has no id column".into()))?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| Error::Operation("vector search result has no _distance column".into()))?;
    Ok((0..batch.num_rows())
        .filter(|&i| ids.is_valid(i) && distances.is_valid(i))
        .map(|i| SearchHit::new(ids.value(i), 1.0 - distances.value(i), RetrievalMethod::Semantic))
        .collect())
}

/// Render equality filters as a LanceDB SQL predicate, e.g. `` `type` = 'button' ``.
pub fn filter_predicate(filters: &Filters) -> Result<Option<String>> {
    if filters.is_empty() {
        return Ok(None);
    }
    let mut clauses = Vec::with_capacity(filters.len());
    for (key, value) in filters {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::Validation(format!("invalid filter key '{key}'")));
        }
        clauses.push(format!("`{key}` = '{}'", value.replace('\'', "''")));
    }
    Ok(Some(clauses.join(" AND ")))
}

fn unavailable<E: std::fmt::Display>(e: E) -> Error {
    Error::IndexUnavailable(e.to_string())
}
