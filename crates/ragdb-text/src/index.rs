use anyhow::Result;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{doc, Index, TantivyDocument};
use tracing::warn;

use ragdb_core::traits::LexicalIndexer;
use ragdb_core::types::{ChildChunk, SearchHit, SourceKind};

use crate::tantivy_utils::{build_schema, register_tokenizer};

/// Lexical (BM25) index over child chunks.
///
/// Additions go through a fresh writer per batch and commit immediately, so
/// small incremental batches never require a rebuild; query-time readers
/// pick up the latest commit.
pub struct TantivyLexicalIndex {
	index: Index,
	id_field: tantivy::schema::Field,
	parent_id_field: tantivy::schema::Field,
	text_field: tantivy::schema::Field,
}

impl TantivyLexicalIndex {
	/// Open the index at `index_dir`, creating it (and the directory) on
	/// first use.
	pub fn open_or_create(index_dir: &Path) -> Result<Self> {
		let index = if index_dir.join("meta.json").exists() {
			Index::open_in_dir(index_dir)?
		} else {
			std::fs::create_dir_all(index_dir)?;
			Index::create_in_dir(index_dir, build_schema())?
		};
		register_tokenizer(&index);
		let schema = index.schema();
		let id_field = schema.get_field("id")?;
		let parent_id_field = schema.get_field("parent_id")?;
		let text_field = schema.get_field("text")?;
		Ok(Self { index, id_field, parent_id_field, text_field })
	}

	/// Wipe any existing index and start fresh. Bulk re-ingestion path.
	pub fn recreate(index_dir: &Path) -> Result<Self> {
		if index_dir.exists() {
			std::fs::remove_dir_all(index_dir)?;
		}
		Self::open_or_create(index_dir)
	}
}

impl LexicalIndexer for TantivyLexicalIndex {
	fn add(&self, chunks: &[ChildChunk]) -> Result<()> {
		if chunks.is_empty() {
			return Ok(());
		}
		let mut index_writer = self.index.writer(50_000_000)?;
		for c in chunks {
			let d = doc!(
				self.id_field => c.child_id.clone(),
				self.parent_id_field => c.parent_id.clone(),
				self.text_field => c.text.clone(),
			);
			index_writer.add_document(d)?;
		}
		index_writer.commit()?;
		Ok(())
	}

	fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 {
			return Ok(Vec::new());
		}
		let reader = self.index.reader()?;
		let searcher = reader.searcher();
		let qp = QueryParser::for_index(&self.index, vec![self.text_field]);
		// A malformed user query is not an error for the pipeline; it just
		// contributes nothing to this family.
		let q = match qp.parse_query(query) {
			Ok(q) => q,
			Err(e) => {
				warn!(query = %query, error = %e, "unparseable lexical query");
				return Ok(Vec::new());
			}
		};
		let top_docs = searcher.search(&q, &TopDocs::with_limit(k))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let d: TantivyDocument = searcher.doc(addr)?;
			let id = d
				.get_first(self.id_field)
				.and_then(|v| v.as_str())
				.unwrap_or("")
				.to_string();
			hits.push(SearchHit { id, score, source: SourceKind::Lexical });
		}
		Ok(hits)
	}
}
