use crate::types::{ChildChunk, ParentChunk, QueryExpansion, SearchHit};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Joint (query, candidate) relevance scorer. Returns one score per
/// candidate, in candidate order.
pub trait CrossEncoder: Send + Sync {
    fn score(&self, query: &str, candidates: &[String]) -> anyhow::Result<Vec<f32>>;
}

#[async_trait::async_trait]
pub trait QueryExpander: Send + Sync {
    async fn expand(&self, query: &str) -> anyhow::Result<QueryExpansion>;
}

pub trait LexicalIndexer: Send + Sync {
    fn add(&self, chunks: &[ChildChunk]) -> anyhow::Result<()>;
    fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

#[async_trait::async_trait]
pub trait VectorIndexer: Send + Sync {
    async fn add(&self, chunks: &[ChildChunk], embeddings: &[Vec<f32>]) -> anyhow::Result<()>;
    async fn search_vec(&self, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

/// Durable parent/child passage store. Absence is not an error: a missing
/// parent means callers fall back to the child's own text.
pub trait ChunkStorage: Send + Sync {
    fn put_parents(&self, parents: &[ParentChunk]) -> anyhow::Result<()>;
    fn put_children(&self, children: &[ChildChunk]) -> anyhow::Result<()>;
    fn get_parent(&self, parent_id: &str) -> anyhow::Result<Option<ParentChunk>>;
    fn get_child(&self, child_id: &str) -> anyhow::Result<Option<ChildChunk>>;
}
