use anyhow::{anyhow, Result};
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use std::path::Path;
use tracing::debug;

use ragdb_core::traits::VectorIndexer;
use ragdb_core::types::{ChildChunk, SearchHit, SourceKind};

use crate::schema::build_arrow_schema;

const WRITE_BATCH_SIZE: usize = 1000;

pub struct LanceVectorIndex {
	db: Connection,
	table_name: String,
	dim: usize,
}

impl LanceVectorIndex {
	pub async fn open(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
		let db = connect(db_path.to_string_lossy().as_ref())
			.execute()
			.await
			.map_err(|e| ragdb_core::error::Error::Storage(format!("{}: {}", db_path.display(), e)))?;
		Ok(Self { db, table_name: table_name.to_string(), dim })
	}

	async fn table_exists(&self) -> Result<bool> {
		Ok(self.db.table_names().execute().await?.contains(&self.table_name))
	}

	async fn insert_batch(&self, chunks: &[ChildChunk], embeddings: &[Vec<f32>]) -> Result<()> {
		if chunks.is_empty() {
			return Ok(());
		}
		let record_batch = self.to_record_batch(chunks, embeddings)?;
		let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		if self.table_exists().await? {
			self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
		} else {
			self.db.create_table(&self.table_name, reader).execute().await?;
		}
		Ok(())
	}

	fn to_record_batch(&self, chunks: &[ChildChunk], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
		let schema = build_arrow_schema(self.dim as i32);
		let mut ids = Vec::with_capacity(chunks.len());
		let mut parent_ids = Vec::with_capacity(chunks.len());
		let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(chunks.len());
		for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
			if embedding.len() != self.dim {
				return Err(anyhow!(
					"embedding for {} has dim {}, expected {}",
					chunk.child_id,
					embedding.len(),
					self.dim
				));
			}
			ids.push(chunk.child_id.clone());
			parent_ids.push(chunk.parent_id.clone());
			vectors.push(Some(embedding.iter().map(|&x| Some(x)).collect()));
		}
		let record_batch = RecordBatch::try_new(
			schema,
			vec![
				std::sync::Arc::new(StringArray::from(ids)),
				std::sync::Arc::new(StringArray::from(parent_ids)),
				std::sync::Arc::new(FixedSizeListArray::from_iter_primitive::<
					arrow_array::types::Float32Type,
					_,
					_,
				>(vectors.into_iter(), self.dim as i32)),
			],
		)?;
		Ok(record_batch)
	}
}

#[async_trait::async_trait]
impl VectorIndexer for LanceVectorIndex {
	async fn add(&self, chunks: &[ChildChunk], embeddings: &[Vec<f32>]) -> Result<()> {
		if chunks.is_empty() {
			return Ok(());
		}
		anyhow::ensure!(
			chunks.len() == embeddings.len(),
			"chunks and embeddings length must match"
		);
		for start in (0..chunks.len()).step_by(WRITE_BATCH_SIZE) {
			let end = (start + WRITE_BATCH_SIZE).min(chunks.len());
			self.insert_batch(&chunks[start..end], &embeddings[start..end]).await?;
		}
		debug!(count = chunks.len(), table = %self.table_name, "stored child vectors");
		Ok(())
	}

	async fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 || !self.table_exists().await? {
			// Nothing ingested yet: an empty result, not an error.
			return Ok(Vec::new());
		}
		let table = self.db.open_table(&self.table_name).execute().await?;
		let mut stream = table.vector_search(query_vec.to_vec())?.limit(k).execute().await?;
		let mut hits = Vec::new();
		while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
			let id_col = batch
				.column_by_name("id")
				.and_then(|c| c.as_any().downcast_ref::<StringArray>())
				.ok_or_else(|| anyhow!("missing id column"))?;
			let distance_col = batch
				.column_by_name("_distance")
				.and_then(|c| c.as_any().downcast_ref::<arrow_array::Float32Array>());
			for i in 0..batch.num_rows() {
				let id = id_col.value(i).to_string();
				// LanceDB reports L2/cosine distance; flip it so higher is
				// better like every other engine in the workspace.
				let score = match distance_col {
					Some(col) => 1.0 - col.value(i),
					None => 0.5,
				};
				hits.push(SearchHit { id, score, source: SourceKind::Dense });
			}
		}
		Ok(hits)
	}
}
