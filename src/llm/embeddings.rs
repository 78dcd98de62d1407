use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::config::LlmConfig;
use crate::error::RecommendError;

/// Maximum characters to send per text to the embedding API.
/// Candidate documents (name + description + topics) are short, but user
/// bios and crawled descriptions are uncontrolled input; cap them well
/// under the 8 192-token context of nomic-embed-text.
const MAX_EMBED_CHARS: usize = 3_000;

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Maps text to fixed-length vectors. The engine and the candidate store
/// only ever see this trait, so tests can substitute a deterministic
/// embedder and ingestion never guesses or caches across distinct texts.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single document. Provider failure is not retried here;
    /// the caller decides whether to skip the item or abort the query.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, RecommendError>> + Send;

    /// Embed a batch of documents, preserving order.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, RecommendError>> + Send;
}

/// HTTP-backed embedder dispatching on the configured provider.
#[derive(Clone)]
pub struct LlmEmbedder {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmEmbedder {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }

    async fn embed_texts(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_for_embedding(t).to_string())
            .collect();

        let embeddings = match self.config.provider.as_str() {
            "ollama" => self.embed_ollama(&truncated).await?,
            "openai" => self.embed_openai(&truncated).await?,
            other => anyhow::bail!("Unknown LLM provider: {other}"),
        };

        check_dimensions(&embeddings, self.config.embedding_dim)?;
        Ok(embeddings)
    }

    async fn embed_ollama(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.config.base_url);

        // Ollama supports batch embedding with the /api/embed endpoint
        let batch_size = 32;
        let mut all_embeddings = Vec::new();

        for chunk in texts.chunks(batch_size) {
            let req = OllamaEmbedRequest {
                model: self.config.embedding_model.clone(),
                input: chunk.to_vec(),
                truncate: true,
            };

            let resp = self
                .client
                .post(&url)
                .json(&req)
                .send()
                .await
                .context("Failed to call Ollama embed API")?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("Ollama embed API returned {status}: {body}");
            }

            let body: OllamaEmbedResponse = resp
                .json()
                .await
                .context("Failed to parse Ollama embed response")?;

            all_embeddings.extend(body.embeddings);
        }

        Ok(all_embeddings)
    }

    async fn embed_openai(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.config.base_url);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let batch_size = 64;
        let mut all_embeddings = Vec::new();

        for chunk in texts.chunks(batch_size) {
            let req = OpenAiEmbedRequest {
                model: self.config.embedding_model.clone(),
                input: chunk.to_vec(),
            };

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {api_key}"))
                .json(&req)
                .send()
                .await
                .context("Failed to call OpenAI embed API")?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("OpenAI embed API returned {status}: {body}");
            }

            let body: OpenAiEmbedResponse = resp
                .json()
                .await
                .context("Failed to parse OpenAI embed response")?;

            let mut embeddings: Vec<Vec<f32>> =
                body.data.into_iter().map(|d| d.embedding).collect();
            all_embeddings.append(&mut embeddings);
        }

        Ok(all_embeddings)
    }
}

/// A vector of the wrong width would silently corrupt every cosine
/// comparison in the index, so a model/config mismatch fails loudly here.
fn check_dimensions(embeddings: &[Vec<f32>], expected: usize) -> anyhow::Result<()> {
    if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
        anyhow::bail!(
            "Embedding dimension mismatch: model returned {}, configured for {expected}",
            bad.len()
        );
    }
    Ok(())
}

impl EmbeddingProvider for LlmEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RecommendError> {
        let results = self
            .embed_texts(&[text.to_string()])
            .await
            .map_err(RecommendError::Embedding)?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RecommendError::Embedding(anyhow::anyhow!("No embedding returned")))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RecommendError> {
        self.embed_texts(texts)
            .await
            .map_err(RecommendError::Embedding)
    }
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    /// Ask Ollama to silently truncate inputs that exceed the model's context
    /// length instead of returning a 400 error.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}
