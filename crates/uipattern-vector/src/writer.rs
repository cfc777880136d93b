use std::sync::Arc;

use arrow_array::{ArrayRef, FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use tracing::info;

use uipattern_core::traits::EmbeddingProvider;
use uipattern_core::types::Pattern;
use uipattern_core::{Error, Result};

use crate::schema::build_arrow_schema;
use crate::table::{open_db, table_exists};

/// Embeds the corpus and replaces the contents of the pattern vector table.
pub struct PatternVectorWriter {
    db: Connection,
    table_name: String,
}

impl PatternVectorWriter {
    pub async fn new(uri: &str, table_name: &str) -> Result<Self> {
        let db = open_db(uri).await?;
        Ok(Self { db, table_name: table_name.to_string() })
    }

    pub async fn index_patterns(&self, patterns: &[Pattern], provider: &dyn EmbeddingProvider) -> Result<usize> {
        if patterns.is_empty() {
            info!("no patterns to index");
            return Ok(0);
        }
        let dim = provider.dim();
        let pb = ProgressBar::new(patterns.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} patterns ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut vectors = Vec::with_capacity(patterns.len());
        for p in patterns {
            pb.set_message(p.id.clone());
            let v = provider.embed(&embedding_text(p)).await?;
            if v.len() != dim {
                return Err(Error::EmbeddingProvider(format!(
                    "{} returned {} dims for '{}', expected {dim}",
                    provider.provider_id(),
                    v.len(),
                    p.id
                )));
            }
            vectors.push(v);
            pb.inc(1);
        }
        pb.finish_with_message("embedded");

        let batch = to_record_batch(patterns, vectors, dim)?;
        self.replace_table(batch).await?;
        info!(table = %self.table_name, patterns = patterns.len(), provider = provider.provider_id(), "vector table written");
        Ok(patterns.len())
    }

    async fn replace_table(&self, batch: RecordBatch) -> Result<()> {
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        if table_exists(&self.db, &self.table_name).await? {
            let table = self.db.open_table(&self.table_name).execute().await.map_err(write_err)?;
            table.delete("true").await.map_err(write_err)?;
            table.add(reader).execute().await.map_err(write_err)?;
        } else {
            self.db.create_table(&self.table_name, reader).execute().await.map_err(write_err)?;
        }
        Ok(())
    }
}

/// Text embedded for a pattern: its name, category, description and the
/// names of its props, variants and accessibility features.
pub fn embedding_text(p: &Pattern) -> String {
    let mut text = format!("{} {}", p.name, p.category);
    if !p.description.is_empty() {
        text.push_str(". ");
        text.push_str(&p.description);
    }
    let props: Vec<&str> = p.metadata.prop_names().collect();
    for (label, items) in [
        ("Props", props),
        ("Variants", p.metadata.variants.iter().map(String::as_str).collect()),
        ("Accessibility", p.metadata.a11y.iter().map(String::as_str).collect()),
    ] {
        if !items.is_empty() {
            text.push_str(&format!(". {label}: {}", items.join(", ")));
        }
    }
    text
}

fn to_record_batch(patterns: &[Pattern], vectors: Vec<Vec<f32>>, dim: usize) -> Result<RecordBatch> {
    let dim = i32::try_from(dim).map_err(|_| Error::InvalidConfig(format!("embedding dim {dim} too large")))?;
    let column = |f: fn(&Pattern) -> String| -> ArrayRef { Arc::new(StringArray::from(patterns.iter().map(f).collect::<Vec<_>>())) };
    let vectors = vectors.into_iter().map(|v| Some(v.into_iter().map(Some).collect::<Vec<_>>()));
    RecordBatch::try_new(
        build_arrow_schema(dim),
        vec![
            column(|p| p.id.clone()),
            column(|p| p.name.clone()),
            column(|p| p.category.clone()),
            column(|p| p.name.to_lowercase()),
            column(|p| p.framework.clone()),
            column(|p| p.library.clone()),
            Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, dim)),
        ],
    )
    .map_err(|e| Error::Operation(format!("building record batch: {e}")))
}

fn write_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Operation(format!("writing vector table: {e}"))
}
