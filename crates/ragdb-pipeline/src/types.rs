//! Per-request ranking structures and the search response surface.
//!
//! Everything here is ephemeral: produced for one query execution, scoped
//! to it, and dropped with it. Durable chunk types live in ragdb-core.

use serde::{Deserialize, Serialize};

use ragdb_core::types::{ChunkId, SourceKind};

/// One hit from one routed query's result list, with its 1-based rank
/// within that list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalCandidate {
    pub child_id: ChunkId,
    pub source: SourceKind,
    pub rank: usize,
    pub raw_score: f32,
}

/// A deduplicated candidate with its summed reciprocal-rank score and the
/// per-list ranks that contributed to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedCandidate {
    pub child_id: ChunkId,
    pub fused_score: f32,
    /// Lowest (best) rank this candidate held in any contributing list.
    pub best_rank: usize,
    pub contributing_ranks: Vec<(SourceKind, usize)>,
}

/// Terminal per-result output of the pipeline. `parent_context` is set only
/// when the child's parent resolves in the chunk store; otherwise callers
/// display `text` (the child's own, shorter passage).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankedResult {
    pub child_id: ChunkId,
    pub parent_id: ChunkId,
    pub score: f32,
    pub final_rank: usize,
    pub text: String,
    pub parent_context: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StageStat {
    pub elapsed_ms: u64,
    pub count: usize,
}

/// Per-stage wall-clock timings and output counts for one `search` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStats {
    pub route: StageStat,
    pub retrieve: StageStat,
    pub fuse: StageStat,
    pub rerank: StageStat,
    pub expand: StageStat,
    /// Raw per-family candidate counts before fusion deduplicates them.
    pub lexical_candidates: usize,
    pub dense_candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<RerankedResult>,
    pub stats: SearchStats,
}

/// The two query families produced by routing.
#[derive(Debug, Clone, Default)]
pub struct RoutedQueries {
    pub lexical_queries: Vec<String>,
    pub dense_queries: Vec<String>,
}
