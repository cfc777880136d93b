use proptest::prelude::*;

use uipattern_core::types::{RetrievalMethod, SearchHit};
use uipattern_core::Error;
use uipattern_hybrid::ScoreFusion;

fn hits(source: RetrievalMethod, items: &[(&str, f32)]) -> Vec<SearchHit> {
    items.iter().map(|(id, s)| SearchHit::new(*id, *s, source)).collect()
}

#[test]
fn worked_example_ranks_shared_pattern_first() {
    let fusion = ScoreFusion::new(0.3, 0.7).unwrap();
    let lexical = hits(RetrievalMethod::Lexical, &[("A", 10.0), ("B", 4.0)]);
    let semantic = hits(RetrievalMethod::Semantic, &[("A", 0.9), ("C", 0.5)]);

    let fused = fusion.fuse(&lexical, &semantic, 10);
    let ids: Vec<&str> = fused.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);

    let a = &fused[0];
    assert!((a.final_score - 1.0).abs() < 1e-6);
    assert_eq!((a.bm25_rank, a.semantic_rank, a.final_rank), (Some(1), Some(1), 1));
    assert_eq!(fused[1].final_score, 0.0);
    assert_eq!(fused[1].semantic_rank, None);
    assert_eq!(fused[2].final_score, 0.0);
    assert_eq!(fused[2].bm25_rank, None);
    assert_eq!(fused[2].semantic_rank, Some(2));
}

#[test]
fn normalize_edge_cases() {
    assert!(ScoreFusion::normalize(&[]).is_empty());

    let single = ScoreFusion::normalize(&hits(RetrievalMethod::Lexical, &[("x", 0.2)]));
    assert_eq!(single["x"].score, 1.0);
    assert_eq!(single["x"].rank, 1);

    let flat = ScoreFusion::normalize(&hits(RetrievalMethod::Lexical, &[("x", 3.0), ("y", 3.0)]));
    assert_eq!(flat["x"].score, 0.0);
    assert_eq!(flat["y"].rank, 2);
}

#[test]
fn invalid_weights_fail_at_construction() {
    assert!(matches!(ScoreFusion::new(0.5, 0.6), Err(Error::FusionConfiguration(_))));
    assert!(matches!(ScoreFusion::new(-0.5, 1.5), Err(Error::FusionConfiguration(_))));
    assert!(matches!(ScoreFusion::new(f32::NAN, 1.0), Err(Error::FusionConfiguration(_))));
    let ok = ScoreFusion::new(1.0, 0.0).unwrap();
    assert_eq!(ok.weights().lexical, 1.0);
    assert_eq!(ScoreFusion::default().weights().semantic, 0.7);
}

#[test]
fn missing_signal_only_uses_the_other() {
    let fusion = ScoreFusion::default();
    let lexical = hits(RetrievalMethod::Lexical, &[("a", 5.0), ("b", 1.0)]);
    let fused = fusion.fuse(&lexical, &[], 1);
    assert_eq!(fused.len(), 1);
    assert!((fused[0].final_score - 0.3).abs() < 1e-6);
}

#[test]
fn non_finite_scores_are_dropped_before_ranking() {
    let semantic = hits(RetrievalMethod::Semantic, &[("a", 0.9), ("b", f32::NAN), ("c", 0.1), ("d", f32::INFINITY)]);
    let norm = ScoreFusion::normalize(&semantic);
    assert_eq!(norm.len(), 2);
    assert_eq!(norm["c"].rank, 2);

    let fused = ScoreFusion::default().fuse(&[], &semantic, 4);
    let ids: Vec<&str> = fused.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
    assert!((fused[0].final_score - 0.7).abs() < 1e-6);
    assert!(fused.iter().all(|f| f.final_score.is_finite()));

    let only_nan = hits(RetrievalMethod::Lexical, &[("x", f32::NAN)]);
    assert!(ScoreFusion::normalize(&only_nan).is_empty());
}

#[test]
fn extreme_finite_scores_stay_in_range() {
    let lexical = hits(RetrievalMethod::Lexical, &[("hi", f32::MAX), ("lo", -f32::MAX)]);
    let norm = ScoreFusion::normalize(&lexical);
    assert_eq!(norm["hi"].score, 1.0);
    assert_eq!(norm["lo"].score, 0.0);
}

fn scored_list() -> impl Strategy<Value = Vec<(String, f32)>> {
    let score = prop_oneof![
        8 => -100.0f32..100.0,
        1 => Just(f32::NAN),
        1 => Just(f32::INFINITY),
        1 => Just(f32::NEG_INFINITY),
    ];
    prop::collection::vec(("[a-h]{1,2}", score), 0..20)
}

fn sorted_hits(items: Vec<(String, f32)>, source: RetrievalMethod) -> Vec<SearchHit> {
    let mut v: Vec<SearchHit> = items.into_iter().map(|(id, s)| SearchHit::new(id, s, source)).collect();
    v.sort_by(|a, b| b.score.total_cmp(&a.score));
    v
}

proptest! {
    #[test]
    fn normalized_scores_stay_in_unit_range(items in scored_list()) {
        let list = sorted_hits(items, RetrievalMethod::Lexical);
        let norm = ScoreFusion::normalize(&list);
        for n in norm.values() {
            prop_assert!((0.0..=1.0).contains(&n.score));
            prop_assert!(n.rank >= 1 && n.rank <= list.len());
            prop_assert!(n.score.is_finite());
        }
    }

    #[test]
    fn final_rank_follows_score_then_id(lex in scored_list(), sem in scored_list(), top_k in 0usize..25) {
        let fusion = ScoreFusion::default();
        let fused = fusion.fuse(
            &sorted_hits(lex, RetrievalMethod::Lexical),
            &sorted_hits(sem, RetrievalMethod::Semantic),
            top_k,
        );
        prop_assert!(fused.len() <= top_k);
        for (i, f) in fused.iter().enumerate() {
            prop_assert_eq!(f.final_rank, i + 1);
        }
        prop_assert!(fused.iter().all(|f| f.final_score.is_finite()));
        for pair in fused.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.final_score > b.final_score || (a.final_score == b.final_score && a.id < b.id));
        }
    }
}
