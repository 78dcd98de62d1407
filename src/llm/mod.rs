//! Embedding provider: turns text into fixed-length vectors via an
//! Ollama or OpenAI-compatible API.

pub mod embeddings;

pub use embeddings::{EmbeddingProvider, LlmEmbedder};
