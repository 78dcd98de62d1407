//! # oss-recommender
//!
//! A Rust web service that recommends open-source GitHub repositories by
//! comparing a user's own projects, languages, and topics against a corpus
//! of crawled repositories using nearest-neighbor search over text
//! embeddings.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────┐        ┌───────────────────┐
//!   │  GitHub crawler   │        │   GitHub profile  │
//!   │ (corpus ingestion)│        │      builder      │
//!   └─────────┬────────┘        └─────────┬─────────┘
//!             │ upsert (embed per record)  │ projects + top
//!             ▼                            │ languages/topics
//!   ┌──────────────────┐                   ▼
//!   │  Candidate Store  │        ┌───────────────────┐
//!   │  (cosine k-NN)    │◄───────│ Recommendation    │
//!   └──────────────────┘  query  │ Engine            │
//!                                │  preferences path  │
//!                                │  projects path     │
//!                                │  topics fallback   │
//!                                └─────────┬─────────┘
//!                                          │ dedup by repo_url
//!                                          ▼
//!                                ┌───────────────────┐
//!                                │ Ranking           │
//!                                │  +2 language match │
//!                                │  +1 per topic      │
//!                                └─────────┬─────────┘
//!                                          │
//!                                          ▼
//!                                ┌───────────────────┐
//!                                │ History sink + API │
//!                                └───────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, data dir, and embedding settings
//! - [`models`] - Shared data types: `RepositoryRecord`, `UserProfile`, `RecommendationResult`, request/response types
//! - [`error`] - The `RecommendError` taxonomy
//! - [`llm`] - Embedding generation via Ollama or OpenAI-compatible APIs
//! - [`store`] - Candidate store: persisted vector index with cosine-distance search and facet filtering
//! - [`recommend`] - The recommendation engine and match-score ranking
//! - [`github`] - GitHub REST client, profile builder, and corpus crawler
//! - [`history`] - Recommendation history sink
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state

pub mod api;
pub mod config;
pub mod error;
pub mod github;
pub mod history;
pub mod llm;
pub mod models;
pub mod recommend;
pub mod state;
pub mod store;
