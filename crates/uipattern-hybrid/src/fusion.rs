use std::collections::{BTreeSet, HashMap};

use uipattern_core::config::FusionSettings;
use uipattern_core::types::{FusedResult, FusionWeights, SearchHit};
use uipattern_core::{Error, Result};

const WEIGHT_TOLERANCE: f32 = 1e-6;

/// A min-max normalised score and the 1-indexed position in its source list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    pub score: f32,
    pub rank: usize,
}

/// Weighted linear combination of the two normalised signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFusion {
    weights: FusionWeights,
}

impl Default for ScoreFusion {
    fn default() -> Self {
        let FusionSettings { lexical_weight, semantic_weight } = FusionSettings::default();
        Self { weights: FusionWeights { lexical: lexical_weight, semantic: semantic_weight } }
    }
}

impl ScoreFusion {
    /// Weights must be finite, non-negative and sum to 1.0.
    pub fn new(lexical: f32, semantic: f32) -> Result<Self> {
        if !lexical.is_finite() || !semantic.is_finite() || lexical < 0.0 || semantic < 0.0 {
            return Err(Error::FusionConfiguration(format!(
                "weights must be finite and non-negative (lexical={lexical}, semantic={semantic})"
            )));
        }
        let sum = lexical + semantic;
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(Error::FusionConfiguration(format!("weights must sum to 1.0, got {sum}")));
        }
        Ok(Self { weights: FusionWeights { lexical, semantic } })
    }

    pub fn from_settings(settings: &FusionSettings) -> Result<Self> {
        Self::new(settings.lexical_weight, settings.semantic_weight)
    }

    pub fn weights(&self) -> FusionWeights {
        self.weights
    }

    /// Min-max normalise one retriever's list, which must already be sorted
    /// best first. A single hit maps to 1.0; a flat list maps to 0.0.
    ///
    /// Hits with a non-finite score are dropped and do not take a rank.
    pub fn normalize(hits: &[SearchHit]) -> HashMap<String, Normalized> {
        let finite: Vec<&SearchHit> = hits.iter().filter(|h| h.score.is_finite()).collect();
        let mut out = HashMap::with_capacity(finite.len());
        if let [only] = finite.as_slice() {
            out.insert(only.id.clone(), Normalized { score: 1.0, rank: 1 });
            return out;
        }
        // f64 so the range of two extreme f32 scores cannot overflow.
        let (min, max) = finite.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), h| {
            (lo.min(f64::from(h.score)), hi.max(f64::from(h.score)))
        });
        let range = if max > min { max - min } else { 1.0 };
        for (i, h) in finite.iter().enumerate() {
            let score = ((f64::from(h.score) - min) / range).clamp(0.0, 1.0) as f32;
            out.entry(h.id.clone()).or_insert(Normalized { score, rank: i + 1 });
        }
        out
    }

    /// Merge both lists into at most `top_k` results ordered by final score,
    /// ties broken by ascending id.
    pub fn fuse(&self, lexical: &[SearchHit], semantic: &[SearchHit], top_k: usize) -> Vec<FusedResult> {
        let lex = Self::normalize(lexical);
        let sem = Self::normalize(semantic);
        let ids: BTreeSet<&String> = lex.keys().chain(sem.keys()).collect();

        let mut fused: Vec<FusedResult> = ids
            .into_iter()
            .map(|id| {
                let l = lex.get(id);
                let s = sem.get(id);
                let bm25_score = l.map_or(0.0, |n| n.score);
                let semantic_score = s.map_or(0.0, |n| n.score);
                FusedResult {
                    id: id.clone(),
                    bm25_score,
                    bm25_rank: l.map(|n| n.rank),
                    semantic_score,
                    semantic_rank: s.map(|n| n.rank),
                    final_score: self.weights.lexical * bm25_score + self.weights.semantic * semantic_score,
                    final_rank: 0,
                }
            })
            .collect();
        fused.sort_by(|a, b| b.final_score.total_cmp(&a.final_score).then_with(|| a.id.cmp(&b.id)));
        fused.truncate(top_k);
        for (i, r) in fused.iter_mut().enumerate() {
            r.final_rank = i + 1;
        }
        fused
    }
}
