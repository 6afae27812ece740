//! Best-effort ingestion: chunk documents, persist parents and children,
//! index children lexically, embed in sub-batches and index densely.
//!
//! Ingestion is "best effort, not all-or-nothing": a failed embedding
//! sub-batch is logged and skipped while the rest of the run continues.
//! Storage failures are the fatal exception: without the chunk store there
//! is nothing to expand results against later.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::{info, warn};

use ragdb_core::chunking::Chunker;
use ragdb_core::traits::{ChunkStorage, Embedder, LexicalIndexer, VectorIndexer};
use ragdb_core::types::Document;

pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestReport {
    pub documents: usize,
    pub parents: usize,
    pub children: usize,
    pub embedded: usize,
    pub skipped_batches: usize,
}

pub struct Ingestor {
    chunker: Chunker,
    store: Arc<dyn ChunkStorage>,
    lexical: Arc<dyn LexicalIndexer>,
    vector: Arc<dyn VectorIndexer>,
    embedder: Arc<dyn Embedder>,
    embed_batch_size: usize,
}

impl Ingestor {
    pub fn new(
        chunker: Chunker,
        store: Arc<dyn ChunkStorage>,
        lexical: Arc<dyn LexicalIndexer>,
        vector: Arc<dyn VectorIndexer>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            chunker,
            store,
            lexical,
            vector,
            embedder,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }

    pub fn with_embed_batch_size(mut self, size: usize) -> Self {
        self.embed_batch_size = size.max(1);
        self
    }

    /// Chunk and index a batch of documents, serialized relative to other
    /// ingestion runs (query-time readers are unaffected).
    pub async fn ingest(&self, docs: &[Document]) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut all_children = Vec::new();
        for doc in docs {
            let (parents, children) = self.chunker.chunk(doc);
            if parents.is_empty() {
                warn!(doc_id = %doc.id, "document produced no chunks, skipping");
                continue;
            }
            report.documents += 1;
            report.parents += parents.len();
            report.children += children.len();
            self.store.put_parents(&parents)?;
            self.store.put_children(&children)?;
            all_children.extend(children);
        }
        if all_children.is_empty() {
            info!("no chunks to index");
            return Ok(report);
        }

        self.lexical.add(&all_children)?;

        let pb = ProgressBar::new(all_children.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        for batch in all_children.chunks(self.embed_batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            match self.embedder.embed_batch(&texts) {
                Ok(embeddings) => {
                    self.vector.add(batch, &embeddings).await?;
                    report.embedded += batch.len();
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        batch_len = batch.len(),
                        "embedding sub-batch failed, skipping it"
                    );
                    report.skipped_batches += 1;
                }
            }
            pb.inc(batch.len() as u64);
        }
        pb.finish_with_message("ingest complete");
        info!(
            documents = report.documents,
            parents = report.parents,
            children = report.children,
            embedded = report.embedded,
            skipped_batches = report.skipped_batches,
            "ingestion finished"
        );
        Ok(report)
    }
}
