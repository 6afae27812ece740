use ragdb_core::types::SourceKind;
use ragdb_pipeline::fusion::{fuse, rrf_contribution, DEFAULT_RRF_K};
use ragdb_pipeline::types::RetrievalCandidate;

fn cand(id: &str, source: SourceKind, rank: usize) -> RetrievalCandidate {
    RetrievalCandidate {
        child_id: id.to_string(),
        source,
        rank,
        raw_score: 1.0 / rank as f32,
    }
}

#[test]
fn contribution_formula() {
    assert!((rrf_contribution(1, 60.0) - 1.0 / 61.0).abs() < 1e-9);
    assert!((rrf_contribution(5, 60.0) - 1.0 / 65.0).abs() < 1e-9);
    assert!(rrf_contribution(1, 60.0) > rrf_contribution(2, 60.0));
}

#[test]
fn dual_family_rank_one_beats_single_family_rank_one() {
    let lexical = vec![vec![cand("both", SourceKind::Lexical, 1)], vec![cand("lex-only", SourceKind::Lexical, 1)]];
    let dense = vec![vec![cand("both", SourceKind::Dense, 1)]];
    let fused = fuse(&lexical, &dense, DEFAULT_RRF_K);
    assert_eq!(fused[0].child_id, "both");
    assert_eq!(fused[1].child_id, "lex-only");
    assert!(
        fused[0].fused_score > fused[1].fused_score,
        "appearing at rank 1 in both families must score strictly higher"
    );
    // single-family candidates still get a nonzero score
    assert!(fused[1].fused_score > 0.0);
}

#[test]
fn candidates_are_deduplicated_by_child_id() {
    let lexical = vec![vec![cand("a", SourceKind::Lexical, 1), cand("b", SourceKind::Lexical, 2)]];
    let dense = vec![vec![cand("b", SourceKind::Dense, 1), cand("a", SourceKind::Dense, 2)]];
    let fused = fuse(&lexical, &dense, DEFAULT_RRF_K);
    assert_eq!(fused.len(), 2);
    for f in &fused {
        assert_eq!(f.contributing_ranks.len(), 2, "{} contributed twice", f.child_id);
    }
}

#[test]
fn multiple_appearances_within_one_family_all_contribute() {
    // same child surfaced by two routed lexical queries
    let lexical = vec![
        vec![cand("a", SourceKind::Lexical, 1)],
        vec![cand("a", SourceKind::Lexical, 2)],
    ];
    let fused = fuse(&lexical, &[], DEFAULT_RRF_K);
    let expected = rrf_contribution(1, DEFAULT_RRF_K) + rrf_contribution(2, DEFAULT_RRF_K);
    assert!((fused[0].fused_score - expected).abs() < 1e-9);
}

#[test]
fn ordering_is_deterministic_for_identical_inputs() {
    let lexical = vec![vec![
        cand("m", SourceKind::Lexical, 1),
        cand("n", SourceKind::Lexical, 2),
        cand("o", SourceKind::Lexical, 3),
    ]];
    let dense = vec![vec![
        cand("o", SourceKind::Dense, 1),
        cand("p", SourceKind::Dense, 2),
    ]];
    let first: Vec<String> = fuse(&lexical, &dense, DEFAULT_RRF_K)
        .into_iter()
        .map(|f| f.child_id)
        .collect();
    for _ in 0..10 {
        let again: Vec<String> = fuse(&lexical, &dense, DEFAULT_RRF_K)
            .into_iter()
            .map(|f| f.child_id)
            .collect();
        assert_eq!(first, again);
    }
}

#[test]
fn equal_scores_tie_break_by_best_rank_then_id() {
    // y and x tie on score and best rank -> lexicographic id order
    let lexical = vec![vec![cand("y", SourceKind::Lexical, 1)]];
    let dense = vec![vec![cand("x", SourceKind::Dense, 1)]];
    let fused = fuse(&lexical, &dense, DEFAULT_RRF_K);
    assert_eq!(fused[0].child_id, "x");
    assert_eq!(fused[1].child_id, "y");
}

#[test]
fn empty_lists_fuse_to_empty() {
    assert!(fuse(&[], &[], DEFAULT_RRF_K).is_empty());
    assert!(fuse(&[Vec::new()], &[Vec::new()], DEFAULT_RRF_K).is_empty());
}
