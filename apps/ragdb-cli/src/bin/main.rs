use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ragdb_core::chunking::{load_documents, Chunker, ChunkingConfig};
use ragdb_core::config::Config;
use ragdb_core::traits::{
    ChunkStorage, CrossEncoder, Embedder, LexicalIndexer, QueryExpander, VectorIndexer,
};
use ragdb_embed::{get_default_cross_encoder, get_default_embedder};
use ragdb_pipeline::expand::DEFAULT_OLLAMA_MODEL;
use ragdb_pipeline::{Ingestor, NoopExpander, OllamaExpander, PipelineParams, SearchPipeline};
use ragdb_store::SqliteChunkStore;
use ragdb_text::TantivyLexicalIndex;
use ragdb_vector::LanceVectorIndex;

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ingest|query> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

struct Paths {
    tantivy_dir: PathBuf,
    lancedb_dir: PathBuf,
    store_path: PathBuf,
}

fn paths(config: &Config) -> Paths {
    Paths {
        tantivy_dir: PathBuf::from(
            config.get_or("data.tantivy_index_dir", "data/indexes/tantivy".to_string()),
        ),
        lancedb_dir: PathBuf::from(
            config.get_or("data.lancedb_index_dir", "data/indexes/lancedb".to_string()),
        ),
        store_path: PathBuf::from(
            config.get_or("data.chunk_store_path", "data/chunks.sqlite".to_string()),
        ),
    }
}

fn pipeline_params(config: &Config) -> PipelineParams {
    let defaults = PipelineParams::default();
    PipelineParams {
        k_per_query: config.get_or("pipeline.k_per_query", defaults.k_per_query),
        rrf_k: config.get_or("pipeline.rrf_k", defaults.rrf_k),
        rerank_top_n: config.get_or("pipeline.rerank_top_n", defaults.rerank_top_n),
        deadline_ms: config.get_or("pipeline.deadline_ms", defaults.deadline_ms),
        expand_timeout_ms: config.get_or("pipeline.expand_timeout_ms", defaults.expand_timeout_ms),
    }
}

fn expander(config: &Config, params: &PipelineParams) -> Arc<dyn QueryExpander> {
    match config.get::<String>("pipeline.ollama_url").ok() {
        Some(url) => {
            let model = config.get_or("pipeline.ollama_model", DEFAULT_OLLAMA_MODEL.to_string());
            Arc::new(OllamaExpander::new(
                url,
                model,
                Duration::from_millis(params.expand_timeout_ms),
            ))
        }
        None => Arc::new(NoopExpander),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let (cmd, args) = parse_args();
    let p = paths(&config);
    match cmd.as_str() {
        "ingest" => {
            let data_dir = args.first().map(PathBuf::from).unwrap_or_else(|| {
                PathBuf::from(config.get_or("data.raw_dir", "data/raw".to_string()))
            });
            println!("Ingesting from {}", data_dir.display());
            let docs = load_documents(&data_dir)?;
            if docs.is_empty() {
                println!("No .txt or .md documents found under {}", data_dir.display());
                return Ok(());
            }
            let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder()?);
            let lexical: Arc<dyn LexicalIndexer> =
                Arc::new(TantivyLexicalIndex::open_or_create(&p.tantivy_dir)?);
            let store: Arc<dyn ChunkStorage> = Arc::new(SqliteChunkStore::open(&p.store_path)?);
            let rt = tokio::runtime::Runtime::new()?;
            let vector: Arc<dyn VectorIndexer> = Arc::new(rt.block_on(async {
                LanceVectorIndex::open(&p.lancedb_dir, "children", embedder.dim()).await
            })?);
            let chunker = Chunker::new(ChunkingConfig {
                parent_chars: config.get_or("chunking.parent_chars", 2000),
                child_chars: config.get_or("chunking.child_chars", 300),
                child_overlap_chars: config.get_or("chunking.child_overlap_chars", 40),
            });
            let ingestor = Ingestor::new(chunker, store, lexical, vector, embedder)
                .with_embed_batch_size(config.get_or("pipeline.embed_batch_size", 32));
            let report = rt.block_on(ingestor.ingest(&docs))?;
            println!(
                "✅ Ingest complete: {} documents → {} parents / {} children ({} embedded, {} sub-batches skipped)",
                report.documents, report.parents, report.children, report.embedded, report.skipped_batches
            );
        }
        "query" => {
            let query_text = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: ragdb query \"<query>\"");
                std::process::exit(1)
            });
            let params = pipeline_params(&config);
            let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder()?);
            let cross_encoder: Arc<dyn CrossEncoder> = Arc::from(get_default_cross_encoder()?);
            let lexical: Arc<dyn LexicalIndexer> =
                Arc::new(TantivyLexicalIndex::open_or_create(&p.tantivy_dir)?);
            let store: Arc<dyn ChunkStorage> = Arc::new(SqliteChunkStore::open(&p.store_path)?);
            let rt = tokio::runtime::Runtime::new()?;
            let vector: Arc<dyn VectorIndexer> = Arc::new(rt.block_on(async {
                LanceVectorIndex::open(&p.lancedb_dir, "children", embedder.dim()).await
            })?);
            let expander = expander(&config, &params);
            let pipeline = SearchPipeline::new(
                lexical,
                vector,
                embedder,
                cross_encoder,
                expander,
                store,
                params,
            );
            let response = rt.block_on(pipeline.search(&query_text))?;
            println!("\n🔍 {} results for \"{}\"", response.results.len(), query_text);
            for r in &response.results {
                println!("\n  {}. score={:.4}  child={}", r.final_rank, r.score, r.child_id);
                let context = r.parent_context.as_deref().unwrap_or(r.text.as_str());
                let preview: String = context.chars().take(240).collect();
                println!("     📝 {}", preview);
            }
            let s = &response.stats;
            println!("\n📊 Stage stats:");
            for (name, stat) in [
                ("route", s.route),
                ("retrieve", s.retrieve),
                ("fuse", s.fuse),
                ("rerank", s.rerank),
                ("expand", s.expand),
            ] {
                println!("  {:<9} {:>5} ms  count={}", name, stat.elapsed_ms, stat.count);
            }
            println!(
                "  candidates: {} lexical / {} dense",
                s.lexical_candidates, s.dense_candidates
            );
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}
