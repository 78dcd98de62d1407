use thiserror::Error;

/// Failure modes of the recommendation pipeline.
///
/// `NoSignal` is the one user-facing validation error: the caller supplied
/// neither languages nor topics to recommend from. Everything else is an
/// infrastructure failure that aborts a single branch of the computation;
/// the engine logs it and keeps accumulating from other sources.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("no languages or topics available")]
    NoSignal,

    #[error("embedding provider call failed")]
    Embedding(#[source] anyhow::Error),

    #[error("candidate store operation failed")]
    Store(#[source] anyhow::Error),

    #[error("history persistence failed")]
    Persistence(#[source] anyhow::Error),
}
