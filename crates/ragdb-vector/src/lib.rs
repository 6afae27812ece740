//! ragdb-vector
//!
//! LanceDB-backed nearest-neighbor index over child-chunk embeddings. This
//! crate only stores and retrieves vectors; computing embeddings (and
//! deciding what to do when an embedding batch fails) belongs to callers.

pub mod index;
pub mod schema;

pub use index::LanceVectorIndex;
