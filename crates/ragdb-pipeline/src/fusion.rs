//! Reciprocal Rank Fusion.
//!
//! Every contributing list hands each of its candidates `1 / (k + rank)`
//! with rank 1-based; a candidate's fused score is the sum of its
//! contributions across all lists in both families. Appearing high in both
//! families therefore always beats appearing high in one.

use std::collections::HashMap;

use ragdb_core::types::ChunkId;

use crate::types::{FusedCandidate, RetrievalCandidate};

pub const DEFAULT_RRF_K: f32 = 60.0;

pub fn rrf_contribution(rank: usize, k_const: f32) -> f32 {
    1.0 / (k_const + rank as f32)
}

/// Merge ranked per-query candidate lists from both families into one
/// deduplicated, globally ranked list.
///
/// Ordering is a pure function of the inputs: descending fused score, then
/// best contributing rank, then child id. Identical inputs produce an
/// identical ordering on every run.
pub fn fuse(
    lexical_lists: &[Vec<RetrievalCandidate>],
    dense_lists: &[Vec<RetrievalCandidate>],
    k_const: f32,
) -> Vec<FusedCandidate> {
    let mut by_id: HashMap<ChunkId, FusedCandidate> = HashMap::new();
    for list in lexical_lists.iter().chain(dense_lists.iter()) {
        for candidate in list {
            let contribution = rrf_contribution(candidate.rank, k_const);
            by_id
                .entry(candidate.child_id.clone())
                .and_modify(|fused| {
                    fused.fused_score += contribution;
                    fused.best_rank = fused.best_rank.min(candidate.rank);
                    fused.contributing_ranks.push((candidate.source, candidate.rank));
                })
                .or_insert_with(|| FusedCandidate {
                    child_id: candidate.child_id.clone(),
                    fused_score: contribution,
                    best_rank: candidate.rank,
                    contributing_ranks: vec![(candidate.source, candidate.rank)],
                });
        }
    }
    let mut fused: Vec<FusedCandidate> = by_id.into_values().collect();
    fused.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.best_rank.cmp(&b.best_rank))
            .then_with(|| a.child_id.cmp(&b.child_id))
    });
    fused
}
