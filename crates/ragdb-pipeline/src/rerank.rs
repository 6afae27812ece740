//! Cross-encoder reranking with fused-order fallback.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use ragdb_core::traits::CrossEncoder;
use ragdb_core::types::ChildChunk;

use crate::types::{FusedCandidate, RerankedResult};

/// Score `(raw_query, candidate_text)` for every candidate and order by
/// descending cross-encoder score. Candidates are never dropped: the
/// output length always equals the input length, and a failed, timed-out,
/// or miscounted scoring call keeps the fused ordering instead.
pub async fn rerank(
    cross_encoder: Arc<dyn CrossEncoder>,
    raw_query: &str,
    candidates: Vec<(FusedCandidate, ChildChunk)>,
    deadline: Instant,
) -> Vec<RerankedResult> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let texts: Vec<String> = candidates.iter().map(|(_, chunk)| chunk.text.clone()).collect();
    let query = raw_query.to_string();
    let scoring = tokio::task::spawn_blocking(move || cross_encoder.score(&query, &texts));
    let remaining = deadline.saturating_duration_since(Instant::now());
    let scores = match tokio::time::timeout(remaining, scoring).await {
        Ok(Ok(Ok(scores))) if scores.len() == candidates.len() => Some(scores),
        Ok(Ok(Ok(scores))) => {
            warn!(
                expected = candidates.len(),
                got = scores.len(),
                "cross-encoder score count mismatch, keeping fused order"
            );
            None
        }
        Ok(Ok(Err(e))) => {
            warn!(error = %e, "cross-encoder failed, keeping fused order");
            None
        }
        Ok(Err(e)) => {
            warn!(error = %e, "cross-encoder task failed, keeping fused order");
            None
        }
        Err(_) => {
            warn!("cross-encoder missed the request deadline, keeping fused order");
            None
        }
    };
    let mut scored: Vec<(f32, FusedCandidate, ChildChunk)> = match scores {
        Some(scores) => scores
            .into_iter()
            .zip(candidates)
            .map(|(score, (fused, chunk))| (score, fused, chunk))
            .collect(),
        // Fallback keeps the fused score so downstream ordering is unchanged.
        None => candidates
            .into_iter()
            .map(|(fused, chunk)| (fused.fused_score, fused, chunk))
            .collect(),
    };
    // Stable sort: candidates with equal scores keep their fused order.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored
        .into_iter()
        .enumerate()
        .map(|(i, (score, fused, chunk))| RerankedResult {
            child_id: fused.child_id,
            parent_id: chunk.parent_id,
            score,
            final_rank: i + 1,
            text: chunk.text,
            parent_context: None,
        })
        .collect()
}
