//! Domain types shared by the chunker, indexes, store, and pipeline.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// A raw source document as loaded at ingestion time. Immutable once
/// created; after chunking only the derived chunks persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub raw_text: String,
    pub source_path: String,
}

/// A large contiguous passage of a document, kept around so a winning child
/// chunk can be expanded back into readable context.
///
/// `start`/`end` are byte offsets into the source document and `text` is
/// always `raw_text[start..end]`; parents partition the document exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentChunk {
    pub parent_id: ChunkId,
    pub doc_id: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// A small retrieval unit carved out of exactly one parent chunk.
///
/// `text` is a contiguous substring of the parent's text. Embedding vectors
/// are derived at indexing time and travel alongside chunk slices rather
/// than living on the chunk itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildChunk {
    pub child_id: ChunkId,
    pub parent_id: ChunkId,
    pub text: String,
}

/// Indicates which retrieval family produced a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Lexical,
    Dense,
}

/// The minimal surface returned by both index backends.
///
/// `id` matches `ChildChunk::child_id`. `score` is engine-specific but
/// higher is always better. `source` labels the origin family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub score: f32,
    pub source: SourceKind,
}

/// What the query-expansion model produced for one raw query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryExpansion {
    pub lexical_variants: Vec<String>,
    pub hypothetical_answer: Option<String>,
}
