//! Cross-encoder backends: a candle XLM-Roberta sequence-classification
//! model (BGE-reranker family) and a deterministic term-overlap fallback.

use anyhow::{anyhow, Result};
use tracing::info;

use candle_core::Device;
use candle_transformers::models::xlm_roberta::{
    Config as XLMRobertaConfig, XLMRobertaForSequenceClassification,
};
use tokenizers::Tokenizer;

use ragdb_core::traits::CrossEncoder;

use crate::device::select_device;
use crate::tokenize::tokenize_pair_on_device;
use crate::{load_weights, resolve_model_dir};

const RERANK_MAX_LEN: usize = 512;

pub struct CrossEncoderModel {
    model: XLMRobertaForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
}

impl CrossEncoderModel {
    pub fn new() -> Result<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir("APP_RERANK_MODEL_DIR", "bge-reranker-base")?;
        info!(dir = %model_dir.display(), "loading cross-encoder model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let vb = load_weights(&model_dir, &device)?;
        let model = XLMRobertaForSequenceClassification::new(1, &config, vb)?;
        info!("cross-encoder model ready");
        Ok(Self { model, tokenizer, device })
    }
}

impl CrossEncoder for CrossEncoderModel {
    fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let (input_ids, attention_mask) = tokenize_pair_on_device(
                &self.tokenizer,
                query,
                candidate,
                RERANK_MAX_LEN,
                &self.device,
            )?;
            let token_type_ids = input_ids.zeros_like()?;
            let logits = self.model.forward(&input_ids, &attention_mask, &token_type_ids)?;
            let score = logits
                .to_device(&Device::Cpu)?
                .flatten_all()?
                .to_vec1::<f32>()?
                .first()
                .copied()
                .ok_or_else(|| anyhow!("cross-encoder produced no logit"))?;
            scores.push(score);
        }
        Ok(scores)
    }
}

/// Query/candidate term-overlap scorer: the fraction of query words that
/// appear in the candidate. Deterministic, model-free, good enough to keep
/// the pipeline shape intact in tests and minimal installs.
pub struct OverlapCrossEncoder;

impl CrossEncoder for OverlapCrossEncoder {
    fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        let query_lower = query.to_lowercase();
        let query_words: Vec<&str> = query_lower.split_whitespace().collect();
        Ok(candidates
            .iter()
            .map(|candidate| {
                if query_words.is_empty() {
                    return 0.0;
                }
                let candidate_lower = candidate.to_lowercase();
                let mut overlap = 0.0f32;
                for word in &query_words {
                    if candidate_lower.contains(word) {
                        overlap += 1.0;
                    }
                }
                overlap / query_words.len() as f32
            })
            .collect())
    }
}
