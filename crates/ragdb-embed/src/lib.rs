//! ragdb-embed
//!
//! Candle-backed embedding and cross-encoder models (XLM-Roberta family:
//! BGE-M3 for embeddings, BGE-reranker for joint scoring), plus
//! deterministic fakes for tests and model-free installs. Which backend a
//! factory returns is switched by `APP_USE_FAKE_EMBEDDINGS` /
//! `APP_USE_FAKE_RERANKER`.

pub mod device;
pub mod pool;
pub mod rerank;
pub mod tokenize;

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::{debug, info};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use ragdb_core::traits::{CrossEncoder, Embedder};

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_on_device;

pub use crate::rerank::{CrossEncoderModel, OverlapCrossEncoder};

pub const EMBEDDING_DIM: usize = 1024;
const EMBED_MAX_LEN: usize = 256;

pub struct EmbeddingModel {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl EmbeddingModel {
    pub fn new() -> Result<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir("APP_EMBED_MODEL_DIR", "bge-m3")?;
        info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let vb = load_weights(&model_dir, &device)?;
        let model = XLMRobertaModel::new(&config, vb)?;
        info!("embedding model ready");
        Ok(Self { model, tokenizer, device })
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let (input_ids, attention_mask) =
            tokenize_on_device(&self.tokenizer, text, EMBED_MAX_LEN, &self.device)?;
        let token_type_ids = Tensor::zeros((1, EMBED_MAX_LEN), DType::I64, &self.device)?;
        let hidden_states =
            self.model
                .forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden_states, &attention_mask)?;
        let emb: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        debug!(len = emb.len(), "embedded text");
        Ok(emb)
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }

    fn max_len(&self) -> usize {
        EMBED_MAX_LEN
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

/// Deterministic hashing embedder: each token lands in a hash bucket, the
/// vector is L2-normalized. Not semantically meaningful, but stable across
/// runs, which is what tests and model-free installs need.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.to_lowercase().split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        8192
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

pub fn get_default_embedder() -> Result<Box<dyn Embedder>> {
    if env_flag("APP_USE_FAKE_EMBEDDINGS") {
        info!("using fake hashing embedder");
        return Ok(Box::new(FakeEmbedder::new(EMBEDDING_DIM)));
    }
    Ok(Box::new(EmbeddingModel::new()?))
}

pub fn get_default_cross_encoder() -> Result<Box<dyn CrossEncoder>> {
    if env_flag("APP_USE_FAKE_RERANKER") {
        info!("using term-overlap cross-encoder");
        return Ok(Box::new(OverlapCrossEncoder));
    }
    Ok(Box::new(CrossEncoderModel::new()?))
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub(crate) fn load_weights(model_dir: &std::path::Path, device: &Device) -> Result<VarBuilder<'static>> {
    let weights_path = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&weights_path)?;
    let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

pub(crate) fn resolve_model_dir(env_key: &str, default_name: &str) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(env_key) {
        let p = PathBuf::from(&dir);
        if p.exists() {
            return Ok(p);
        }
    }
    if let Ok(dir) = std::env::var("MODEL_DIR") {
        let p = PathBuf::from(&dir).join(default_name);
        if p.exists() {
            return Ok(p);
        }
    }
    for base in ["../models", "models"] {
        let p = PathBuf::from(base).join(default_name);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(anyhow!("Could not locate model directory for {}", default_name))
}
