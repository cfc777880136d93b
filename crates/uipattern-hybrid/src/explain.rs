use std::collections::HashSet;

use uipattern_core::config::ConfidenceWeights;
use uipattern_core::types::{MatchHighlights, Pattern, Requirements};

use crate::query::join_list;

/// Normalised score above which a signal is called out as strong.
const STRONG_SIMILARITY: f32 = 0.8;

/// Confidence scores and human-readable rationales for fused results.
#[derive(Debug, Clone, Default)]
pub struct Explainer {
    weights: ConfidenceWeights,
}

impl Explainer {
    pub fn new(weights: ConfidenceWeights) -> Self {
        Self { weights }
    }

    /// Props and variants match case-insensitively; a11y tags match when
    /// either one contains the other. Pattern spelling and order are kept.
    pub fn match_highlights(&self, pattern: &Pattern, requirements: &Requirements) -> MatchHighlights {
        let wanted_props = lowercase_set(&requirements.props);
        let wanted_variants = lowercase_set(&requirements.variants);
        let wanted_a11y: Vec<String> = requirements
            .a11y
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        MatchHighlights {
            matched_props: pattern
                .metadata
                .prop_names()
                .filter(|p| wanted_props.contains(&p.to_lowercase()))
                .map(str::to_string)
                .collect(),
            matched_variants: pattern
                .metadata
                .variants
                .iter()
                .filter(|v| wanted_variants.contains(&v.to_lowercase()))
                .cloned()
                .collect(),
            matched_a11y: pattern
                .metadata
                .a11y
                .iter()
                .filter(|tag| {
                    let tag = tag.trim().to_lowercase();
                    !tag.is_empty() && wanted_a11y.iter().any(|w| tag.contains(w.as_str()) || w.contains(tag.as_str()))
                })
                .cloned()
                .collect(),
        }
    }

    /// Weighted sum of final score, rank agreement, metadata completeness and
    /// match coverage, clamped to `[0, 1]`.
    pub fn confidence(
        &self,
        final_score: f32,
        bm25_rank: Option<usize>,
        semantic_rank: Option<usize>,
        pattern: &Pattern,
        highlights: &MatchHighlights,
    ) -> f32 {
        let w = &self.weights;
        let score_part = unit(final_score) * w.final_score;

        let agreement = match (bm25_rank, semantic_rank) {
            (Some(a), Some(b)) => {
                let diff = a.abs_diff(b) as f32;
                let window = w.rank_decay_window.max(f32::EPSILON);
                w.rank_agreement * (1.0 - diff / window).max(0.0)
            }
            (Some(_), None) | (None, Some(_)) => w.single_rank.min(w.rank_agreement),
            (None, None) => 0.0,
        };

        let meta = &pattern.metadata;
        let present = [!meta.props.is_empty(), !meta.variants.is_empty(), !meta.a11y.is_empty(), !pattern.description.trim().is_empty()]
            .iter()
            .filter(|&&b| b)
            .count();
        let completeness = present as f32 / 4.0 * w.metadata_completeness;

        let expected = w.expected_matches.max(1) as f32;
        let coverage = (highlights.total() as f32 / expected).min(1.0) * w.match_coverage;

        unit(score_part + agreement + completeness + coverage)
    }

    /// One sentence explaining why `pattern` was returned.
    pub fn explain(
        &self,
        pattern: &Pattern,
        requirements: &Requirements,
        highlights: &MatchHighlights,
        bm25_score: f32,
        semantic_score: f32,
    ) -> String {
        let mut clauses = Vec::new();
        match requirements.component_type() {
            Some(ty) if pattern.name.trim().to_lowercase() == ty.to_lowercase() => {
                clauses.push(format!("Exact match for {ty} component"));
            }
            _ => clauses.push(format!("Matched '{}' pattern", pattern.name)),
        }
        if !highlights.matched_props.is_empty() {
            clauses.push(counted("matches", &highlights.matched_props, "prop", "props"));
        }
        if !highlights.matched_variants.is_empty() {
            clauses.push(counted("supports", &highlights.matched_variants, "variant", "variants"));
        }
        if !highlights.matched_a11y.is_empty() {
            clauses.push(counted(
                "includes",
                &highlights.matched_a11y,
                "accessibility feature",
                "accessibility features",
            ));
        }
        match (bm25_score > STRONG_SIMILARITY, semantic_score > STRONG_SIMILARITY) {
            (true, true) => clauses.push("strong lexical and semantic similarity".to_string()),
            (true, false) => clauses.push("strong lexical similarity".to_string()),
            (false, true) => clauses.push("strong semantic similarity".to_string()),
            (false, false) => {}
        }
        format!("{}.", clauses.join("; "))
    }
}

/// Clamp into `[0, 1]`; NaN and infinities that survive arithmetic count as 0.
fn unit(x: f32) -> f32 {
    if x.is_finite() { x.clamp(0.0, 1.0) } else { 0.0 }
}

fn lowercase_set(items: &[String]) -> HashSet<String> {
    items.iter().map(|s| s.trim().to_lowercase()).collect()
}

fn counted(verb: &str, items: &[String], singular: &str, plural: &str) -> String {
    let noun = if items.len() == 1 { singular } else { plural };
    format!("{verb} {} {noun} ({})", items.len(), join_list(items))
}
