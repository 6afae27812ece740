//! Query-expansion backends.
//!
//! The real backend talks to a local Ollama server through its
//! OpenAI-compatible chat endpoint and asks for strict JSON. Expansion is
//! strictly best-effort: any failure here is caught by the router, which
//! falls back to the raw query.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use ragdb_core::traits::QueryExpander;
use ragdb_core::types::QueryExpansion;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5:1.5b";

const EXPANSION_PROMPT: &str = "You expand search queries for a document retrieval system. \
Reply with ONLY a JSON object shaped like \
{\"lexical_variants\": [\"...\"], \"hypothetical_answer\": \"...\"}. \
lexical_variants: up to two keyword rephrasings of the query. \
hypothetical_answer: one short passage (2-3 sentences) that plausibly answers \
the query, written as if quoted from a source document.";

pub struct OllamaExpander {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaExpander {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client, base_url: base_url.into(), model: model.into() }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait::async_trait]
impl QueryExpander for OllamaExpander {
    async fn expand(&self, query: &str) -> Result<QueryExpansion> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": EXPANSION_PROMPT},
                {"role": "user", "content": query},
            ],
            "temperature": 0.3,
            "stream": false,
        });
        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| anyhow!("expansion response had no choices"))?;
        let expansion = parse_expansion(content)?;
        debug!(
            variants = expansion.lexical_variants.len(),
            has_answer = expansion.hypothetical_answer.is_some(),
            "query expanded"
        );
        Ok(expansion)
    }
}

/// Small models wrap JSON in prose or code fences often enough that we cut
/// out the outermost object before parsing.
fn parse_expansion(content: &str) -> Result<QueryExpansion> {
    let start = content.find('{').ok_or_else(|| anyhow!("no JSON object in expansion reply"))?;
    let end = content.rfind('}').ok_or_else(|| anyhow!("no JSON object in expansion reply"))?;
    if end < start {
        return Err(anyhow!("malformed JSON object in expansion reply"));
    }
    Ok(serde_json::from_str(&content[start..=end])?)
}

/// Model-free expander: an empty expansion, so routing proceeds with the
/// raw query alone.
pub struct NoopExpander;

#[async_trait::async_trait]
impl QueryExpander for NoopExpander {
    async fn expand(&self, _query: &str) -> Result<QueryExpansion> {
        Ok(QueryExpansion::default())
    }
}
