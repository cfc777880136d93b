use std::collections::HashMap;

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info};

use uipattern_core::types::{Pattern, RetrievalMethod, SearchHit};
use uipattern_core::{Error, Result};

use crate::tantivy_utils::{build_schema, register_tokenizer, ID_FIELD, TEXT_FIELD};
use crate::tokenizer::tokenize;

/// Term-frequency saturation used by tantivy's BM25 scorer.
pub const BM25_K1: f32 = 1.2;
/// Document-length normalisation used by tantivy's BM25 scorer.
pub const BM25_B: f32 = 0.75;

const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// BM25 retriever over an in-memory index built once from the corpus.
///
/// The index is never written after [`LexicalRetriever::build`] returns, so a
/// single instance can be shared across concurrent requests.
pub struct LexicalRetriever {
    reader: IndexReader,
    id_field: Field,
    text_field: Field,
    ids: Vec<String>,
}

impl LexicalRetriever {
    pub fn build(patterns: &[Pattern]) -> Result<Self> {
        let schema = build_schema();
        let index = Index::create_in_ram(schema.clone());
        register_tokenizer(&index);
        let id_field = schema.get_field(ID_FIELD).map_err(tantivy_err)?;
        let text_field = schema.get_field(TEXT_FIELD).map_err(tantivy_err)?;

        // One indexing thread keeps segment layout, and therefore doc order, stable.
        let mut writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_MEMORY_BYTES)
            .map_err(tantivy_err)?;
        for p in patterns {
            writer
                .add_document(doc!(
                    id_field => p.id.clone(),
                    text_field => weighted_document(p),
                ))
                .map_err(tantivy_err)?;
        }
        writer.commit().map_err(tantivy_err)?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(tantivy_err)?;
        info!(documents = patterns.len(), "lexical index built");
        Ok(Self { reader, id_field, text_field, ids: patterns.iter().map(|p| p.id.clone()).collect() })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Score every document against `query` and return the best `top_k`.
    ///
    /// Documents sharing no term with the query score 0.0. Ties are broken by
    /// ascending pattern id.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if top_k == 0 || self.ids.is_empty() {
            return Ok(Vec::new());
        }
        let terms = tokenize(query);
        let scores = if terms.is_empty() { HashMap::new() } else { self.score_terms(&terms)? };

        let mut hits: Vec<SearchHit> = self
            .ids
            .iter()
            .map(|id| SearchHit::new(id.clone(), scores.get(id).copied().unwrap_or(0.0), RetrievalMethod::Lexical))
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(top_k);
        debug!(terms = terms.len(), matched = scores.len(), returned = hits.len(), "lexical search");
        Ok(hits)
    }

    /// One SHOULD clause per query token; repeated tokens add up.
    fn score_terms(&self, terms: &[String]) -> Result<HashMap<String, f32>> {
        let clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .iter()
            .map(|t| {
                let term = Term::from_field_text(self.text_field, t);
                (Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>)
            })
            .collect();
        let query = BooleanQuery::new(clauses);

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(self.ids.len()))
            .map_err(tantivy_err)?;
        let mut scores = HashMap::with_capacity(top_docs.len());
        for (score, addr) in top_docs {
            let doc: TantivyDocument = searcher.doc(addr).map_err(tantivy_err)?;
            if let Some(id) = doc.get_first(self.id_field).and_then(|v| v.as_str()) {
                scores.insert(id.to_string(), score);
            }
        }
        Ok(scores)
    }
}

/// Field weighting by repetition: name ×3, category ×2, prop and variant
/// names ×1.5 (full list plus its first half), description ×1.
pub fn weighted_document(p: &Pattern) -> String {
    let props: Vec<&str> = p.metadata.prop_names().collect();
    let variants: Vec<&str> = p.metadata.variants.iter().map(String::as_str).collect();

    let mut parts: Vec<&str> = Vec::new();
    parts.extend(std::iter::repeat(p.name.as_str()).take(3));
    parts.extend(std::iter::repeat(p.category.as_str()).take(2));
    parts.extend(&props);
    parts.extend(&props[..props.len() / 2]);
    parts.extend(&variants);
    parts.extend(&variants[..variants.len() / 2]);
    parts.push(p.description.as_str());
    parts.retain(|s| !s.is_empty());
    parts.join(" ")
}

fn tantivy_err(e: tantivy::TantivyError) -> Error {
    Error::Operation(format!("lexical index: {e}"))
}
