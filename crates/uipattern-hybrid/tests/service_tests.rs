use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uipattern_core::config::Settings;
use uipattern_core::traits::{EmbeddingProvider, VectorIndex};
use uipattern_core::types::{Filters, Pattern, Requirements, RetrievalMethod, SearchHit};
use uipattern_core::{Error, PatternLibrary, Result};
use uipattern_embed::HashedEmbedder;
use uipattern_hybrid::RetrievalService;
use uipattern_vector::writer::embedding_text;
use uipattern_vector::{RetryPolicy, SemanticRetriever};

fn corpus() -> Vec<Pattern> {
    serde_json::from_value(serde_json::json!([
        {"id": "shadcn-button", "name": "Button", "category": "form", "framework": "react", "library": "shadcn/ui",
         "description": "Displays a button or a component that looks like a button.",
         "metadata": {"props": [{"name": "variant", "type": "string"}, {"name": "size", "type": "string"}],
                      "variants": ["default", "primary", "secondary"], "a11y": ["aria-label"]}},
        {"id": "shadcn-card", "name": "Card", "category": "layout", "framework": "react", "library": "shadcn/ui",
         "description": "Displays a card with header, content, and footer.",
         "metadata": {"props": [{"name": "className", "type": "string"}]}}
    ]))
    .unwrap()
}

/// Brute-force cosine index over hashed embeddings, honouring the `type` filter.
struct MemoryIndex {
    rows: Vec<(String, String, Vec<f32>)>,
}

impl MemoryIndex {
    fn new(embedder: &HashedEmbedder, patterns: &[Pattern]) -> Self {
        let rows = patterns
            .iter()
            .map(|p| (p.id.clone(), p.name.to_lowercase(), embedder.embed_sync(&embedding_text(p))))
            .collect();
        Self { rows }
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn query(&self, vector: &[f32], top_k: usize, filters: &Filters) -> Result<Vec<SearchHit>> {
        let mut hits: Vec<SearchHit> = self
            .rows
            .iter()
            .filter(|(_, ty, _)| filters.get("type").map_or(true, |want| want == ty))
            .map(|(id, _, v)| {
                let sim: f32 = v.iter().zip(vector).map(|(a, b)| a * b).sum();
                SearchHit::new(id.clone(), sim, RetrievalMethod::Semantic)
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}

struct UnreachableIndex;

#[async_trait]
impl VectorIndex for UnreachableIndex {
    async fn query(&self, _vector: &[f32], _top_k: usize, _filters: &Filters) -> Result<Vec<SearchHit>> {
        Err(Error::IndexUnavailable("collection not found".into()))
    }
}

/// Embedding provider that times out on every call.
#[derive(Default)]
struct DownProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for DownProvider {
    fn provider_id(&self) -> &str {
        "down"
    }
    fn dim(&self) -> usize {
        256
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::EmbeddingProvider("timeout".into()))
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy { max_attempts: 3, base_delay: Duration::from_millis(1) }
}

fn hybrid_service() -> RetrievalService {
    let embedder = Arc::new(HashedEmbedder::new(256));
    let index = Arc::new(MemoryIndex::new(&embedder, &corpus()));
    let semantic = SemanticRetriever::new(embedder, index, fast_retry());
    RetrievalService::new(PatternLibrary::new(corpus()).unwrap(), Some(semantic), &Settings::default()).unwrap()
}

fn button_requirements() -> Requirements {
    Requirements {
        props: vec!["variant".into(), "size".into()],
        variants: vec!["primary".into(), "secondary".into()],
        ..Requirements::new("Button")
    }
}

#[tokio::test]
async fn button_requirements_rank_button_first() -> anyhow::Result<()> {
    let service = hybrid_service();
    let response = service.search(&button_requirements(), 3).await?;

    let top = &response.patterns[0];
    assert_eq!(top.pattern.id, "shadcn-button");
    assert_eq!(top.ranking_details.final_rank, 1);
    assert!(top.match_highlights.matched_props.contains(&"variant".to_string()));
    assert!(top.match_highlights.matched_props.contains(&"size".to_string()));
    assert!(top.explanation.starts_with("Exact match for Button component"));
    assert!((0.0..=1.0).contains(&top.confidence));

    let meta = &response.retrieval_metadata;
    assert_eq!(meta.methods_used, vec![RetrievalMethod::Lexical, RetrievalMethod::Semantic]);
    assert_eq!(meta.total_patterns, 2);
    assert_eq!(meta.weights.semantic, 0.7);
    assert_eq!(meta.query, "A Button component, with variant and size props, supporting primary and secondary variants.");
    Ok(())
}

#[tokio::test]
async fn repeated_search_is_identical() -> anyhow::Result<()> {
    let service = hybrid_service();
    let a = service.search(&button_requirements(), 3).await?;
    let b = service.search(&button_requirements(), 3).await?;
    assert_eq!(a.patterns, b.patterns);
    Ok(())
}

#[tokio::test]
async fn failing_semantic_branch_degrades_to_lexical() -> anyhow::Result<()> {
    let semantic = SemanticRetriever::new(Arc::new(HashedEmbedder::new(32)), Arc::new(UnreachableIndex), fast_retry());
    let service = RetrievalService::new(PatternLibrary::new(corpus())?, Some(semantic), &Settings::default())?;

    let response = service.search(&button_requirements(), 3).await?;
    assert_eq!(response.retrieval_metadata.methods_used, vec![RetrievalMethod::Lexical]);
    assert_eq!(response.patterns[0].pattern.id, "shadcn-button");
    assert_eq!(response.patterns[0].ranking_details.semantic_rank, None);
    Ok(())
}

#[tokio::test]
async fn exhausted_embedding_retries_degrade_to_lexical() -> anyhow::Result<()> {
    let provider = Arc::new(DownProvider::default());
    let embedder = HashedEmbedder::new(256);
    let index = Arc::new(MemoryIndex::new(&embedder, &corpus()));
    let semantic = SemanticRetriever::new(provider.clone(), index, fast_retry());
    let service = RetrievalService::new(PatternLibrary::new(corpus())?, Some(semantic), &Settings::default())?;

    let response = service.search(&button_requirements(), 3).await?;
    assert_eq!(response.retrieval_metadata.methods_used, vec![RetrievalMethod::Lexical]);
    assert_eq!(response.patterns.len(), 2);
    assert_eq!(response.patterns[0].pattern.id, "shadcn-button");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn lexical_only_service_reports_lexical_query() -> anyhow::Result<()> {
    let service = RetrievalService::new(PatternLibrary::new(corpus())?, None, &Settings::default())?;
    let response = service.search(&button_requirements(), 1).await?;
    assert_eq!(response.patterns.len(), 1);
    assert_eq!(response.retrieval_metadata.query, "button button button variant size primary secondary");
    assert_eq!(response.retrieval_metadata.methods_used, vec![RetrievalMethod::Lexical]);
    Ok(())
}

#[tokio::test]
async fn missing_component_type_is_a_validation_error() {
    let service = hybrid_service();
    let err = service.search(&Requirements::default(), 3).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    let blank = Requirements::new("   ");
    assert!(matches!(service.search(&blank, 3).await, Err(Error::Validation(_))));
}

#[test]
fn bad_fusion_weights_fail_construction() {
    let mut settings = Settings::default();
    settings.fusion.lexical_weight = 0.5;
    let err = RetrievalService::new(PatternLibrary::new(corpus()).unwrap(), None, &settings).err();
    assert!(matches!(err, Some(Error::FusionConfiguration(_))));
}

#[tokio::test]
async fn empty_corpus_returns_no_patterns() -> anyhow::Result<()> {
    let service = RetrievalService::new(PatternLibrary::new(Vec::new())?, None, &Settings::default())?;
    let response = service.search(&button_requirements(), 3).await?;
    assert!(response.patterns.is_empty());
    assert_eq!(response.retrieval_metadata.total_patterns, 0);
    Ok(())
}

#[test]
fn stats_and_lookup_read_the_corpus() {
    let service = RetrievalService::new(PatternLibrary::new(corpus()).unwrap(), None, &Settings::default()).unwrap();
    let stats = service.get_library_stats();
    assert_eq!(stats.total_patterns, 2);
    assert_eq!(stats.component_types, vec!["Button", "Card"]);
    assert_eq!(stats.libraries, vec!["shadcn/ui"]);
    assert_eq!(stats.total_variants, 3);
    assert_eq!(stats.total_props, 3);
    assert_eq!(service.get_pattern("shadcn-card").map(|p| p.name.as_str()), Some("Card"));
    assert!(service.get_pattern("nope").is_none());
}

#[test]
fn response_serialises_with_flattened_pattern_fields() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let response = rt.block_on(hybrid_service().search(&button_requirements(), 1)).unwrap();
    let json = serde_json::to_value(&response).unwrap();
    let first = &json["patterns"][0];
    for key in ["id", "name", "category", "description", "framework", "library", "code", "metadata", "confidence", "explanation"] {
        assert!(first.get(key).is_some(), "missing {key}");
    }
    assert!(first["match_highlights"]["matched_props"].is_array());
    assert!(first["ranking_details"]["final_rank"].is_number());
    assert_eq!(json["retrieval_metadata"]["methods_used"], serde_json::json!(["lexical", "semantic"]));
}
