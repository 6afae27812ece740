//! ragdb-pipeline
//!
//! The hybrid retrieval pipeline: a raw query is routed into lexical and
//! semantic query families, both index backends are searched concurrently,
//! the two rankings are merged with Reciprocal Rank Fusion, the fused head
//! is re-scored by a cross-encoder, and winning child chunks are expanded
//! back to their parent passages. Ingestion (chunk → store → index) lives
//! here too, so the two halves share the same backend seams.

pub mod expand;
pub mod fusion;
pub mod ingest;
pub mod pipeline;
pub mod rerank;
pub mod retrieve;
pub mod router;
pub mod types;

pub use expand::{NoopExpander, OllamaExpander};
pub use ingest::{IngestReport, Ingestor};
pub use pipeline::{PipelineParams, SearchPipeline};
pub use router::QueryRouter;
pub use types::{SearchResponse, SearchStats};
