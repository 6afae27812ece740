use ragdb_core::traits::{CrossEncoder, Embedder};
use ragdb_embed::{FakeEmbedder, OverlapCrossEncoder};

#[test]
fn fake_embedder_is_deterministic_and_normalized() {
    let embedder = FakeEmbedder::new(64);
    let texts = vec!["rainwater barrels".to_string(), "solar battery bank".to_string()];
    let a = embedder.embed_batch(&texts).expect("embed");
    let b = embedder.embed_batch(&texts).expect("embed again");
    assert_eq!(a, b, "same input must embed identically");
    for v in &a {
        assert_eq!(v.len(), 64);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3, "vector should be unit length, got {norm}");
    }
}

#[test]
fn fake_embedder_similar_text_scores_closer() {
    let embedder = FakeEmbedder::new(256);
    let texts = vec![
        "the solar array charges the battery bank".to_string(),
        "solar array charges battery bank daily".to_string(),
        "goats need fresh hay in winter".to_string(),
    ];
    let vs = embedder.embed_batch(&texts).expect("embed");
    let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    assert!(
        dot(&vs[0], &vs[1]) > dot(&vs[0], &vs[2]),
        "shared-token texts should be more similar than unrelated text"
    );
}

#[test]
fn overlap_cross_encoder_orders_by_term_overlap() {
    let scorer = OverlapCrossEncoder;
    let candidates = vec![
        "the woodstove heats the cabin through winter".to_string(),
        "woodstove maintenance schedule".to_string(),
        "planting calendar for spring".to_string(),
    ];
    let scores = scorer.score("woodstove heats cabin", &candidates).expect("score");
    assert_eq!(scores.len(), 3);
    assert!(scores[0] > scores[1]);
    assert!(scores[1] > scores[2]);
    assert_eq!(scores[2], 0.0);
}

#[test]
fn overlap_cross_encoder_empty_query_scores_zero() {
    let scorer = OverlapCrossEncoder;
    let scores = scorer.score("", &["anything".to_string()]).expect("score");
    assert_eq!(scores, vec![0.0]);
}
