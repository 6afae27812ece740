//! ragdb-text
//!
//! Tantivy-based lexical indexing and search over child chunks. The same
//! tokenizer pipeline is registered for indexing and querying so scores are
//! comparable across both paths.

pub mod index;
pub mod tantivy_utils;

pub use index::TantivyLexicalIndex;
