use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::Config;
use crate::github::crawl::CrawlSummary;
use crate::history::FileHistorySink;
use crate::llm::LlmEmbedder;
use crate::store::CandidateStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<CandidateStore>,
    pub history: Arc<FileHistorySink>,
    pub embedder: LlmEmbedder,
    pub http_client: reqwest::Client,
    /// Single-permit gate: one corpus ingestion at a time.
    pub ingest_gate: Arc<tokio::sync::Semaphore>,
    pub last_ingest: Arc<RwLock<Option<CrawlSummary>>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let store = CandidateStore::open_or_create(&config.data_dir, config.store_path())?;
        let history = FileHistorySink::open_or_create(&config.data_dir, config.history_path())?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let embedder = LlmEmbedder::new(http_client.clone(), config.llm.clone());

        Ok(Self {
            config,
            store: Arc::new(store),
            history: Arc::new(history),
            embedder,
            http_client,
            ingest_gate: Arc::new(tokio::sync::Semaphore::new(1)),
            last_ingest: Arc::new(RwLock::new(None)),
        })
    }
}
