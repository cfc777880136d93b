//! Domain types used by the lexical and semantic engines and the service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PatternId = String;

/// Equality constraints applied by the vector index (`key = value`).
pub type Filters = BTreeMap<String, String>;

/// A single prop declared by a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub prop_type: String,
}

/// Structured metadata attached to a pattern.
///
/// Keys other than `props`, `variants` and `a11y` are kept in `extra` so they
/// survive into search responses untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternMetadata {
    #[serde(default)]
    pub props: Vec<PropSpec>,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub a11y: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PatternMetadata {
    pub fn prop_names(&self) -> impl Iterator<Item = &str> {
        self.props.iter().map(|p| p.name.as_str())
    }
}

/// A catalog entry. Loaded once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: PatternId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub framework: String,
    #[serde(default)]
    pub library: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub metadata: PatternMetadata,
}

/// What the caller needs from a component.
///
/// `component_type` is optional at the type level so a missing value is
/// reported as a validation error by the service rather than a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub component_type: Option<String>,
    #[serde(default)]
    pub props: Vec<String>,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub a11y: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Requirements {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self { component_type: Some(component_type.into()), ..Self::default() }
    }

    /// The component type if present and not blank.
    pub fn component_type(&self) -> Option<&str> {
        self.component_type.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Per-request queries derived from [`Requirements`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub lexical_query: String,
    pub semantic_query: String,
    pub filters: Filters,
}

/// Which engine produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMethod {
    Lexical,
    Semantic,
}

/// The minimal surface returned by both retrievers.
///
/// `score` is engine-specific (BM25 or cosine similarity) and only comparable
/// within one list. Lists are ordered by descending score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: PatternId,
    pub score: f32,
    pub source: RetrievalMethod,
}

impl SearchHit {
    pub fn new(id: impl Into<PatternId>, score: f32, source: RetrievalMethod) -> Self {
        Self { id: id.into(), score, source }
    }
}

/// One pattern after score fusion, with the per-signal breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub id: PatternId,
    pub bm25_score: f32,
    pub bm25_rank: Option<usize>,
    pub semantic_score: f32,
    pub semantic_rank: Option<usize>,
    pub final_score: f32,
    pub final_rank: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchHighlights {
    pub matched_props: Vec<String>,
    pub matched_variants: Vec<String>,
    pub matched_a11y: Vec<String>,
}

impl MatchHighlights {
    pub fn total(&self) -> usize {
        self.matched_props.len() + self.matched_variants.len() + self.matched_a11y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingDetails {
    pub bm25_score: f32,
    pub bm25_rank: Option<usize>,
    pub semantic_score: f32,
    pub semantic_rank: Option<usize>,
    pub final_score: f32,
    pub final_rank: usize,
}

impl From<&FusedResult> for RankingDetails {
    fn from(f: &FusedResult) -> Self {
        Self {
            bm25_score: f.bm25_score,
            bm25_rank: f.bm25_rank,
            semantic_score: f.semantic_score,
            semantic_rank: f.semantic_rank,
            final_score: f.final_score,
            final_rank: f.final_rank,
        }
    }
}

/// A ranked pattern as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainedResult {
    #[serde(flatten)]
    pub pattern: Pattern,
    pub confidence: f32,
    pub explanation: String,
    pub match_highlights: MatchHighlights,
    pub ranking_details: RankingDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub lexical: f32,
    pub semantic: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalMetadata {
    pub latency_ms: u64,
    pub methods_used: Vec<RetrievalMethod>,
    pub weights: FusionWeights,
    pub total_patterns: usize,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub patterns: Vec<ExplainedResult>,
    pub retrieval_metadata: RetrievalMetadata,
}

/// Corpus-wide aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_patterns: usize,
    pub component_types: Vec<String>,
    pub categories: Vec<String>,
    pub frameworks: Vec<String>,
    pub libraries: Vec<String>,
    pub total_variants: usize,
    pub total_props: usize,
}
