//! Concurrent dual-family retrieval.
//!
//! The lexical and dense families have no data dependency on each other and
//! run as two joined tasks; within a family the routed queries execute
//! sequentially so list order (and therefore fusion) stays deterministic.
//! Retrieval only completes when both families have returned or timed out,
//! so fusion always sees final family output.

use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use ragdb_core::traits::{Embedder, LexicalIndexer, VectorIndexer};
use ragdb_core::types::SearchHit;

use crate::types::{RetrievalCandidate, RoutedQueries};

pub struct DualRetriever {
    lexical: Arc<dyn LexicalIndexer>,
    vector: Arc<dyn VectorIndexer>,
    embedder: Arc<dyn Embedder>,
    k_per_query: usize,
}

impl DualRetriever {
    pub fn new(
        lexical: Arc<dyn LexicalIndexer>,
        vector: Arc<dyn VectorIndexer>,
        embedder: Arc<dyn Embedder>,
        k_per_query: usize,
    ) -> Self {
        Self { lexical, vector, embedder, k_per_query }
    }

    /// Fan out to both families, join both, and convert each query's hits
    /// into 1-based-ranked candidates. A family that misses `deadline`
    /// contributes nothing; whatever the other family returned in time is
    /// still used.
    pub async fn retrieve(
        &self,
        routed: &RoutedQueries,
        deadline: Instant,
    ) -> (Vec<Vec<RetrievalCandidate>>, Vec<Vec<RetrievalCandidate>>) {
        let k = self.k_per_query;
        let lexical = Arc::clone(&self.lexical);
        let lexical_queries = routed.lexical_queries.clone();
        let lexical_task =
            tokio::task::spawn_blocking(move || lexical_family(&*lexical, &lexical_queries, k));
        let dense_task = self.dense_family(routed.dense_queries.clone(), k);

        let remaining = deadline.saturating_duration_since(Instant::now());
        let (lexical_lists, dense_lists) = tokio::join!(
            tokio::time::timeout(remaining, lexical_task),
            tokio::time::timeout(remaining, dense_task),
        );
        let lexical_lists = match lexical_lists {
            Ok(Ok(lists)) => lists,
            Ok(Err(e)) => {
                warn!(error = %e, "lexical retrieval task failed");
                Vec::new()
            }
            Err(_) => {
                warn!("lexical family missed the request deadline");
                Vec::new()
            }
        };
        let dense_lists = match dense_lists {
            Ok(lists) => lists,
            Err(_) => {
                warn!("dense family missed the request deadline");
                Vec::new()
            }
        };
        (to_ranked(&lexical_lists), to_ranked(&dense_lists))
    }

    /// One embedding call plus one vector search per routed dense query.
    /// Either failing contributes an empty list without touching siblings.
    async fn dense_family(&self, queries: Vec<String>, k: usize) -> Vec<Vec<SearchHit>> {
        let mut lists = Vec::with_capacity(queries.len());
        for query in queries {
            let embedder = Arc::clone(&self.embedder);
            let text = query.clone();
            let embedded = tokio::task::spawn_blocking(move || embedder.embed_batch(&[text])).await;
            let query_vec = match embedded {
                Ok(Ok(mut vecs)) if !vecs.is_empty() => vecs.remove(0),
                Ok(Ok(_)) => {
                    warn!(query = %query, "embedder returned no vector");
                    lists.push(Vec::new());
                    continue;
                }
                Ok(Err(e)) => {
                    warn!(query = %query, error = %e, "query embedding failed");
                    lists.push(Vec::new());
                    continue;
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "embedding task failed");
                    lists.push(Vec::new());
                    continue;
                }
            };
            match self.vector.search_vec(&query_vec, k).await {
                Ok(hits) => lists.push(hits),
                Err(e) => {
                    warn!(query = %query, error = %e, "dense search failed");
                    lists.push(Vec::new());
                }
            }
        }
        lists
    }
}

fn lexical_family(lexical: &dyn LexicalIndexer, queries: &[String], k: usize) -> Vec<Vec<SearchHit>> {
    queries
        .iter()
        .map(|query| match lexical.search(query, k) {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query = %query, error = %e, "lexical search failed");
                Vec::new()
            }
        })
        .collect()
}

fn to_ranked(lists: &[Vec<SearchHit>]) -> Vec<Vec<RetrievalCandidate>> {
    lists
        .iter()
        .map(|hits| {
            hits.iter()
                .enumerate()
                .map(|(i, hit)| RetrievalCandidate {
                    child_id: hit.id.clone(),
                    source: hit.source,
                    rank: i + 1,
                    raw_score: hit.score,
                })
                .collect()
        })
        .collect()
}
