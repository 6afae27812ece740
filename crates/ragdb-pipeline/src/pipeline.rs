//! The five-stage search pipeline: Route → Retrieve → Fuse → Rerank →
//! Expand. Stage boundaries are hard synchronization points (each stage's
//! complete output is the next stage's input) and every stage is timed
//! into the response stats. Empty results at any stage flow through as
//! empty collections; only an unreachable chunk store aborts a request.

use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use ragdb_core::traits::{
    ChunkStorage, CrossEncoder, Embedder, LexicalIndexer, QueryExpander, VectorIndexer,
};
use ragdb_core::types::ChildChunk;

use crate::fusion;
use crate::rerank::rerank;
use crate::retrieve::DualRetriever;
use crate::router::QueryRouter;
use crate::types::{FusedCandidate, RerankedResult, SearchResponse, SearchStats, StageStat};

#[derive(Debug, Clone)]
pub struct PipelineParams {
    /// Results requested from each index per routed query.
    pub k_per_query: usize,
    /// Reciprocal-rank constant.
    pub rrf_k: f32,
    /// How many fused candidates are handed to the cross-encoder.
    pub rerank_top_n: usize,
    /// Overall request deadline.
    pub deadline_ms: u64,
    /// Time allowed for the query-expansion call inside the Route stage.
    pub expand_timeout_ms: u64,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            k_per_query: 20,
            rrf_k: fusion::DEFAULT_RRF_K,
            rerank_top_n: 30,
            deadline_ms: 10_000,
            expand_timeout_ms: 2_000,
        }
    }
}

pub struct SearchPipeline {
    router: QueryRouter,
    retriever: DualRetriever,
    cross_encoder: Arc<dyn CrossEncoder>,
    store: Arc<dyn ChunkStorage>,
    params: PipelineParams,
}

impl SearchPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lexical: Arc<dyn LexicalIndexer>,
        vector: Arc<dyn VectorIndexer>,
        embedder: Arc<dyn Embedder>,
        cross_encoder: Arc<dyn CrossEncoder>,
        expander: Arc<dyn QueryExpander>,
        store: Arc<dyn ChunkStorage>,
        params: PipelineParams,
    ) -> Self {
        let router = QueryRouter::new(expander, Duration::from_millis(params.expand_timeout_ms));
        let retriever = DualRetriever::new(lexical, vector, embedder, params.k_per_query);
        Self { router, retriever, cross_encoder, store, params }
    }

    /// Answer one query. Always returns a well-formed response; zero
    /// results is a response, not an error.
    pub async fn search(&self, raw_query: &str) -> Result<SearchResponse> {
        let deadline = Instant::now() + Duration::from_millis(self.params.deadline_ms);
        let mut stats = SearchStats::default();

        let stage = Instant::now();
        let routed = self.router.route(raw_query).await;
        stats.route =
            stage_stat(stage, routed.lexical_queries.len() + routed.dense_queries.len());
        debug!(
            lexical = routed.lexical_queries.len(),
            dense = routed.dense_queries.len(),
            "routed query"
        );

        let stage = Instant::now();
        let (lexical_lists, dense_lists) = self.retriever.retrieve(&routed, deadline).await;
        stats.lexical_candidates = lexical_lists.iter().map(Vec::len).sum();
        stats.dense_candidates = dense_lists.iter().map(Vec::len).sum();
        stats.retrieve = stage_stat(stage, stats.lexical_candidates + stats.dense_candidates);

        let stage = Instant::now();
        let fused = fusion::fuse(&lexical_lists, &dense_lists, self.params.rrf_k);
        stats.fuse = stage_stat(stage, fused.len());

        let stage = Instant::now();
        let candidates = self.hydrate(fused)?;
        let results =
            rerank(Arc::clone(&self.cross_encoder), raw_query, candidates, deadline).await;
        stats.rerank = stage_stat(stage, results.len());

        let stage = Instant::now();
        let results = self.attach_parent_context(results)?;
        stats.expand = stage_stat(stage, results.len());

        Ok(SearchResponse { results, stats })
    }

    /// Bound rerank cost to the fused head and pull candidate texts from
    /// the store. A missing child row is an integrity problem, not a
    /// request failure: the candidate survives with empty text.
    fn hydrate(&self, fused: Vec<FusedCandidate>) -> Result<Vec<(FusedCandidate, ChildChunk)>> {
        let top_n = self.params.rerank_top_n.min(fused.len());
        let mut out = Vec::with_capacity(top_n);
        for candidate in fused.into_iter().take(top_n) {
            let chunk = match self.store.get_child(&candidate.child_id)? {
                Some(chunk) => chunk,
                None => {
                    warn!(child_id = %candidate.child_id, "child chunk missing from store");
                    ChildChunk {
                        child_id: candidate.child_id.clone(),
                        parent_id: String::new(),
                        text: String::new(),
                    }
                }
            };
            out.push((candidate, chunk));
        }
        Ok(out)
    }

    /// Expand each winner back to its parent passage. A missing parent
    /// leaves `parent_context` unset and the caller shows the child text.
    fn attach_parent_context(
        &self,
        mut results: Vec<RerankedResult>,
    ) -> Result<Vec<RerankedResult>> {
        for result in &mut results {
            if result.parent_id.is_empty() {
                continue;
            }
            match self.store.get_parent(&result.parent_id)? {
                Some(parent) => result.parent_context = Some(parent.text),
                None => {
                    debug!(parent_id = %result.parent_id, "parent not found, child text stands in")
                }
            }
        }
        Ok(results)
    }
}

fn stage_stat(since: Instant, count: usize) -> StageStat {
    StageStat { elapsed_ms: since.elapsed().as_millis() as u64, count }
}
