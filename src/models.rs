use serde::{Deserialize, Serialize};

/// One known open-source repository in the candidate corpus.
///
/// `id` is the source platform's stable repo id; re-ingesting the same `id`
/// overwrites all fields. Numeric counters default to 0 and text fields to
/// the empty string so that partially populated search payloads still map
/// cleanly onto a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub description: String,
    /// The search facet (language or topic) that discovered this record.
    /// Comma-joined when several facets matched the same repo.
    #[serde(default)]
    pub related_language_or_topic: String,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub language: String,
    /// Comma-joined topic tags.
    #[serde(default)]
    pub topics: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub updated_at: String,
}

impl RepositoryRecord {
    /// The text embedded for this record: name, description and topics.
    pub fn embedding_document(&self) -> String {
        format!("{}\n{}\n{}", self.full_name, self.description, self.topics)
    }

    /// Topic tags as a list (the store keeps them comma-joined).
    pub fn topic_list(&self) -> Vec<String> {
        self.topics
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// One of the user's own repositories, as supplied by the profile builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub related_language_or_topic: Vec<String>,
}

/// The user's aggregated language/topic preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageTopics {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl LanguageTopics {
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty() && self.topics.is_empty()
    }
}

/// A user's derived recommendation signal. Built fresh per request and
/// never persisted; only the resulting recommendations are written to the
/// history log.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub username: String,
    pub access_token: String,
    pub projects: Vec<Project>,
    /// Top languages across `projects`, merged with declared extras.
    pub languages: Vec<String>,
    /// Top topics across `projects`, merged with declared extras.
    pub topics: Vec<String>,
    /// Topics the user declared explicitly, kept separate for the fallback.
    pub extra_topics: Vec<String>,
}

/// A single recommended repository as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub repo_url: String,
    pub full_name: String,
    pub description: String,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: u64,
    pub avatar_url: String,
    pub language: String,
    pub updated_at: String,
    pub topics: Vec<String>,
}

/// Recommendation request: the caller identifies a GitHub user whose
/// repositories drive the recommendation, optionally widening the signal
/// with extra languages/topics.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub username: String,
    pub access_token: String,
    #[serde(default)]
    pub extra_languages: Vec<String>,
    #[serde(default)]
    pub extra_topics: Vec<String>,
}

/// Topic-only recommendation request, for users without project history.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicRecommendationRequest {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    /// When set, the produced batch is appended to this user's history.
    pub username: Option<String>,
}

/// Uniform response shape for both recommendation endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<RecommendationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Corpus ingestion request: the language and topic facets to crawl.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}
