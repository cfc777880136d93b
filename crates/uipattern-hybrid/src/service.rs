use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use uipattern_core::config::{expand_path, SearchSettings, Settings};
use uipattern_core::types::{
    ExplainedResult, LibraryStats, Pattern, RankingDetails, Requirements, RetrievalMetadata, RetrievalMethod,
    SearchHit, SearchResponse,
};
use uipattern_core::{Error, PatternLibrary, Result};
use uipattern_embed::provider_from_settings;
use uipattern_text::LexicalRetriever;
use uipattern_vector::{LanceVectorIndex, RetryPolicy, SemanticRetriever};

use crate::explain::Explainer;
use crate::fusion::ScoreFusion;
use crate::query::QueryBuilder;

/// Request/response entry point over an immutable corpus.
///
/// Everything is built once; `search` takes `&self` and may be called from
/// many tasks at once.
pub struct RetrievalService {
    library: Arc<PatternLibrary>,
    lexical: Arc<LexicalRetriever>,
    semantic: Option<SemanticRetriever>,
    fusion: ScoreFusion,
    explainer: Explainer,
    query_builder: QueryBuilder,
    search: SearchSettings,
}

impl RetrievalService {
    /// Index `library` lexically and wire in the optional semantic branch.
    ///
    /// Fails with [`Error::FusionConfiguration`] when the fusion weights are invalid.
    pub fn new(library: PatternLibrary, semantic: Option<SemanticRetriever>, settings: &Settings) -> Result<Self> {
        let fusion = ScoreFusion::from_settings(&settings.fusion)?;
        let lexical = LexicalRetriever::build(library.patterns())?;
        info!(
            patterns = library.len(),
            semantic = semantic.is_some(),
            lexical_weight = fusion.weights().lexical,
            semantic_weight = fusion.weights().semantic,
            "retrieval service ready"
        );
        Ok(Self {
            library: Arc::new(library),
            lexical: Arc::new(lexical),
            semantic,
            fusion,
            explainer: Explainer::new(settings.confidence),
            query_builder: QueryBuilder,
            search: settings.search.clone(),
        })
    }

    /// Load the corpus and connect the semantic branch described by `settings`.
    ///
    /// A semantic branch that cannot be set up is logged and left out; the
    /// service then answers lexically.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let library = PatternLibrary::load(&expand_path(&settings.corpus.patterns_path))?;
        let semantic = if settings.semantic.enabled {
            match semantic_from_settings(settings).await {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!(error = %e, "semantic retrieval unavailable, running lexical-only");
                    None
                }
            }
        } else {
            None
        };
        Self::new(library, semantic, settings)
    }

    pub fn default_top_k(&self) -> usize {
        self.search.default_top_k
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn get_pattern(&self, id: &str) -> Option<&Pattern> {
        self.library.get(id)
    }

    pub fn get_library_stats(&self) -> LibraryStats {
        self.library.stats()
    }

    /// Rank the corpus against `requirements` and explain the best `top_k`.
    ///
    /// Only a missing `component_type` fails the request; semantic failures
    /// degrade to lexical-only ranking.
    #[instrument(skip(self, requirements), fields(component_type = ?requirements.component_type))]
    pub async fn search(&self, requirements: &Requirements, top_k: usize) -> Result<SearchResponse> {
        let start = Instant::now();
        if requirements.component_type().is_none() {
            return Err(Error::Validation("requirements.component_type is required".into()));
        }
        let query = self.query_builder.build(requirements);
        let pool = self.search.candidate_pool.max(top_k);

        let lexical = Arc::clone(&self.lexical);
        let lexical_query = query.lexical_query.clone();
        let lexical_task = tokio::task::spawn_blocking(move || lexical.search(&lexical_query, pool));
        let semantic_task = async {
            match &self.semantic {
                Some(retriever) => Some(retriever.search(&query.semantic_query, pool, &query.filters).await),
                None => None,
            }
        };
        let (lexical_res, semantic_res) = tokio::join!(lexical_task, semantic_task);

        let lexical_hits =
            lexical_res.map_err(|e| Error::Operation(format!("lexical search task failed: {e}")))??;
        let mut methods_used = vec![RetrievalMethod::Lexical];
        let semantic_hits = match semantic_res {
            Some(Ok(hits)) => {
                methods_used.push(RetrievalMethod::Semantic);
                self.known_only(hits)
            }
            Some(Err(e)) => {
                warn!(error = %e, index_unavailable = e.is_semantic_degradation(), "semantic search failed, continuing lexical-only");
                Vec::new()
            }
            None => Vec::new(),
        };

        let fused = self.fusion.fuse(&lexical_hits, &semantic_hits, top_k);
        let patterns: Vec<ExplainedResult> = fused
            .iter()
            .filter_map(|f| {
                let pattern = self.library.get(&f.id)?;
                let highlights = self.explainer.match_highlights(pattern, requirements);
                Some(ExplainedResult {
                    confidence: self.explainer.confidence(f.final_score, f.bm25_rank, f.semantic_rank, pattern, &highlights),
                    explanation: self.explainer.explain(pattern, requirements, &highlights, f.bm25_score, f.semantic_score),
                    match_highlights: highlights,
                    ranking_details: RankingDetails::from(f),
                    pattern: pattern.clone(),
                })
            })
            .collect();

        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            lexical = lexical_hits.len(),
            semantic = semantic_hits.len(),
            returned = patterns.len(),
            latency_ms,
            "search complete"
        );
        Ok(SearchResponse {
            patterns,
            retrieval_metadata: RetrievalMetadata {
                latency_ms,
                methods_used,
                weights: self.fusion.weights(),
                total_patterns: self.library.len(),
                query: if self.semantic.is_some() { query.semantic_query } else { query.lexical_query },
            },
        })
    }

    /// Drop vector hits whose id is not in the loaded corpus (stale table rows).
    fn known_only(&self, mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
        let before = hits.len();
        hits.retain(|h| self.library.get(&h.id).is_some());
        if hits.len() < before {
            warn!(dropped = before - hits.len(), "vector index returned ids missing from the corpus");
        }
        hits
    }
}

async fn semantic_from_settings(settings: &Settings) -> Result<SemanticRetriever> {
    let semantic = &settings.semantic;
    let provider = provider_from_settings(semantic)?;
    let uri = expand_path(&semantic.lancedb_uri);
    let index = LanceVectorIndex::connect(&uri.to_string_lossy(), &semantic.table).await?;
    info!(provider = provider.provider_id(), uri = %uri.display(), table = %semantic.table, "semantic retrieval configured");
    Ok(SemanticRetriever::new(provider, Arc::new(index), RetryPolicy::from_settings(semantic)))
}
