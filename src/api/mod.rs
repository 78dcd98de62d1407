//! Axum HTTP handlers for recommendations, corpus ingestion, and history.

pub mod history;
pub mod ingest;
pub mod recommend;
