//! The recommendation pipeline: engine (signal resolution, neighbor
//! retrieval, dedup) and post-processing (match-score ranking).

pub mod engine;
pub mod ranking;

pub use engine::{RecommendSignal, Recommender};
