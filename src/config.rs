use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the candidate index and history log are stored
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Embedding provider configuration
    pub llm: LlmConfig,
    /// Server-side GitHub token used by corpus ingestion
    pub github_token: Option<String>,
    /// Upper bound on recommendations returned per request
    pub max_recommendations: usize,
    /// Below this many primary results, the topic fallback kicks in
    pub min_primary_results: usize,
    /// How many of the user's repositories feed the profile
    pub profile_repo_limit: usize,
    /// Top-N languages kept from the profile
    pub top_languages: usize,
    /// Top-N topics kept from the profile
    pub top_topics: usize,
    /// Bound on concurrent embed+query calls within one request
    pub max_concurrent_embeds: usize,
    /// Crawl qualifiers for corpus ingestion
    pub crawl: CrawlConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the embedding API
    pub base_url: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub embedding_dim: usize,
}

/// GitHub search qualifiers for the corpus crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub min_stars: u64,
    pub min_forks: u64,
    /// Results per search page
    pub per_page: u32,
    /// Pagination cap per facet query
    pub max_pages: u32,
    /// Only repos pushed within this many days qualify
    pub pushed_within_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9000".to_string(),
            llm: LlmConfig::default(),
            github_token: None,
            max_recommendations: 15,
            min_primary_results: 5,
            profile_repo_limit: 15,
            top_languages: 5,
            top_topics: 7,
            max_concurrent_embeds: 4,
            crawl: CrawlConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
            embedding_dim: 768,
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            min_stars: 2000,
            min_forks: 500,
            per_page: 100,
            max_pages: 10,
            pushed_within_days: 365,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("RECOMMENDER_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("RECOMMENDER_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("LLM_EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.llm.embedding_dim = d;
            }
        }
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            config.github_token = Some(token);
        }
        if let Ok(val) = std::env::var("RECOMMENDER_MAX_RECOMMENDATIONS") {
            if let Ok(v) = val.parse() {
                config.max_recommendations = v;
            }
        }
        if let Ok(val) = std::env::var("RECOMMENDER_MIN_PRIMARY_RESULTS") {
            if let Ok(v) = val.parse() {
                config.min_primary_results = v;
            }
        }
        if let Ok(val) = std::env::var("RECOMMENDER_MAX_CONCURRENT_EMBEDS") {
            if let Ok(v) = val.parse() {
                config.max_concurrent_embeds = v;
            }
        }
        if let Ok(val) = std::env::var("RECOMMENDER_CRAWL_MIN_STARS") {
            if let Ok(v) = val.parse() {
                config.crawl.min_stars = v;
            }
        }
        if let Ok(val) = std::env::var("RECOMMENDER_CRAWL_MIN_FORKS") {
            if let Ok(v) = val.parse() {
                config.crawl.min_forks = v;
            }
        }
        if let Ok(val) = std::env::var("RECOMMENDER_CRAWL_PER_PAGE") {
            if let Ok(v) = val.parse() {
                config.crawl.per_page = v;
            }
        }
        if let Ok(val) = std::env::var("RECOMMENDER_CRAWL_MAX_PAGES") {
            if let Ok(v) = val.parse() {
                config.crawl.max_pages = v;
            }
        }

        config
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("candidates.json")
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }
}
