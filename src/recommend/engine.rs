use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::RecommendError;
use crate::llm::EmbeddingProvider;
use crate::models::{LanguageTopics, Project, RecommendationResult, RepositoryRecord};
use crate::store::CandidateStore;

/// Neighbors fetched per project document.
const PROJECT_NEIGHBORS: usize = 5;
/// Of those, how many survive into the result per project.
const PROJECT_KEEP: usize = 4;
/// Extra neighbors fetched on the preferences path to absorb dedup losses.
const PREFERENCE_HEADROOM: usize = 5;
/// Subtracted from the cap to size the topic-only neighbor query.
const TOPIC_NEIGHBOR_OFFSET: usize = 7;

/// The one signal source a recommendation call runs on.
///
/// Resolved once at the API boundary instead of branch-by-presence inside
/// the engine: preferences (aggregated languages and topics) outrank raw
/// projects, which outrank a bare topic list, because the aggregate is
/// higher-signal than any single document.
#[derive(Debug, Clone)]
pub enum RecommendSignal {
    Preferences(LanguageTopics),
    Projects(Vec<Project>),
    Topics(Vec<String>),
}

impl RecommendSignal {
    /// Pick the strongest available signal; `None` means insufficient
    /// input, which the engine answers with an empty list rather than an
    /// error.
    pub fn resolve(
        projects: Option<Vec<Project>>,
        language_topics: Option<LanguageTopics>,
        topics: Option<Vec<String>>,
    ) -> Option<Self> {
        if let Some(lt) = language_topics {
            if !lt.is_empty() {
                return Some(RecommendSignal::Preferences(lt));
            }
        }
        if let Some(projects) = projects {
            if !projects.is_empty() {
                return Some(RecommendSignal::Projects(projects));
            }
        }
        if let Some(topics) = topics {
            if !topics.is_empty() {
                return Some(RecommendSignal::Topics(topics));
            }
        }
        None
    }
}

/// Produces ranked, deduplicated repository recommendations by querying
/// the candidate store with embedded signal documents.
pub struct Recommender<E> {
    store: Arc<CandidateStore>,
    embedder: E,
    max_concurrent_embeds: usize,
}

impl<E: EmbeddingProvider> Recommender<E> {
    pub fn new(store: Arc<CandidateStore>, embedder: E, max_concurrent_embeds: usize) -> Self {
        Self {
            store,
            embedder,
            max_concurrent_embeds: max_concurrent_embeds.max(1),
        }
    }

    /// Produce up to `max_recommendations` recommendations for the given
    /// signal. A missing signal yields an empty list; a failed embedding
    /// on a single-document path aborts that query, while per-project
    /// failures only skip the affected project.
    pub async fn recommend(
        &self,
        signal: Option<RecommendSignal>,
        max_recommendations: usize,
    ) -> Result<Vec<RecommendationResult>, RecommendError> {
        match signal {
            None => Ok(Vec::new()),
            Some(RecommendSignal::Preferences(lt)) => {
                self.recommend_by_preferences(&lt, max_recommendations).await
            }
            Some(RecommendSignal::Projects(projects)) => {
                self.recommend_by_projects(&projects, max_recommendations)
                    .await
            }
            Some(RecommendSignal::Topics(topics)) => {
                self.recommend_by_topics(&topics, max_recommendations).await
            }
        }
    }

    /// Fallback for users without usable project history: recommend from
    /// declared languages plus extra topics. Errors only when both are
    /// empty, which is the engine's one user-facing validation error.
    pub async fn topic_fallback(
        &self,
        languages: &[String],
        extra_topics: &[String],
        max_recommendations: usize,
    ) -> Result<Vec<RecommendationResult>, RecommendError> {
        let all_topics: Vec<String> = languages
            .iter()
            .chain(extra_topics.iter())
            .cloned()
            .collect();
        if all_topics.is_empty() {
            return Err(RecommendError::NoSignal);
        }
        self.recommend(Some(RecommendSignal::Topics(all_topics)), max_recommendations)
            .await
    }

    /// Preferences path: one synthetic document over the aggregated
    /// languages and topics, queried broadly without a facet filter
    /// (filtering happens at the ranking stage).
    async fn recommend_by_preferences(
        &self,
        language_topics: &LanguageTopics,
        max_recommendations: usize,
    ) -> Result<Vec<RecommendationResult>, RecommendError> {
        let document = format!(
            "I write code in programming languages: {}, and I am interested in topics: {}, suggest me the best open-source projects.",
            language_topics.languages.join(", "),
            language_topics.topics.join(", "),
        );

        let embedding = self.embedder.embed(&document).await?;
        let neighbors = self
            .store
            .query(&embedding, max_recommendations + PREFERENCE_HEADROOM, None);

        let mut seen = HashSet::new();
        let mut recommendations = Vec::new();
        for (record, _distance) in neighbors {
            push_result(&record, &mut seen, &mut recommendations);
            if recommendations.len() >= max_recommendations {
                break;
            }
        }
        Ok(recommendations)
    }

    /// Project path: one embed+query per repository of the user, fanned
    /// out with bounded concurrency and joined in input order.
    async fn recommend_by_projects(
        &self,
        projects: &[Project],
        max_recommendations: usize,
    ) -> Result<Vec<RecommendationResult>, RecommendError> {
        let documents: Vec<(String, String)> = projects
            .iter()
            .map(|project| {
                (
                    format!("{} : {}", project.project_name, project.description),
                    project.project_name.clone(),
                )
            })
            .collect();
        let per_project: Vec<Vec<(RepositoryRecord, f32)>> = stream::iter(documents)
            .map(|(document, project_name)| {
                async move {
                    match self.embedder.embed(&document).await {
                        Ok(embedding) => self.store.query(&embedding, PROJECT_NEIGHBORS, None),
                        Err(e) => {
                            tracing::warn!(
                                "Skipping project {}: embedding failed: {e:#}",
                                project_name
                            );
                            Vec::new()
                        }
                    }
                }
            })
            .buffered(self.max_concurrent_embeds)
            .collect()
            .await;

        let mut seen = HashSet::new();
        let mut recommendations = Vec::new();
        'outer: for neighbors in per_project {
            for (record, _distance) in neighbors.into_iter().take(PROJECT_KEEP) {
                push_result(&record, &mut seen, &mut recommendations);
                if recommendations.len() >= max_recommendations {
                    break 'outer;
                }
            }
        }
        Ok(recommendations)
    }

    /// Topic-only path: one document over the raw topic list, queried with
    /// the facet filter so only candidates discovered under (or written
    /// in) one of those topics qualify.
    async fn recommend_by_topics(
        &self,
        topics: &[String],
        max_recommendations: usize,
    ) -> Result<Vec<RecommendationResult>, RecommendError> {
        let document = format!(
            "I write code in {}, suggest me the best open-source projects",
            topics.join(", "),
        );

        let k = max_recommendations
            .saturating_sub(TOPIC_NEIGHBOR_OFFSET)
            .max(1);
        let embedding = self.embedder.embed(&document).await?;
        let neighbors = self.store.query(&embedding, k, Some(topics));

        let mut seen = HashSet::new();
        let mut recommendations = Vec::new();
        for (record, _distance) in neighbors {
            push_result(&record, &mut seen, &mut recommendations);
            if recommendations.len() >= max_recommendations {
                break;
            }
        }
        Ok(recommendations)
    }
}

/// Append `record` as a recommendation unless its name is malformed or its
/// URL was already emitted this call. Records whose `full_name` lacks a
/// `/` are placeholder data and are dropped silently.
fn push_result(
    record: &RepositoryRecord,
    seen: &mut HashSet<String>,
    out: &mut Vec<RecommendationResult>,
) {
    if !record.full_name.contains('/') {
        return;
    }
    let repo_url = format!("https://github.com/{}", record.full_name);
    if !seen.insert(repo_url.clone()) {
        return;
    }
    out.push(RecommendationResult {
        repo_url,
        full_name: record.full_name.clone(),
        description: record.description.clone(),
        stargazers_count: record.stargazers_count,
        forks_count: record.forks_count,
        open_issues_count: record.open_issues_count,
        avatar_url: record.avatar_url.clone(),
        language: record.language.clone(),
        updated_at: record.updated_at.clone(),
        topics: record.topic_list(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CandidateStore;

    /// Deterministic embedder: counts keyword occurrences per dimension.
    struct KeywordEmbedder;

    const KEYWORDS: [&str; 5] = ["rust", "python", "javascript", "web", "machine-learning"];

    fn keyword_vec(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut v: Vec<f32> = KEYWORDS
            .iter()
            .map(|k| lower.matches(k).count() as f32)
            .collect();
        v.push(0.01);
        v
    }

    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, RecommendError> {
            Ok(keyword_vec(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RecommendError> {
            Ok(texts.iter().map(|t| keyword_vec(t)).collect())
        }
    }

    fn record(id: &str, full_name: &str, description: &str, facet: &str) -> RepositoryRecord {
        RepositoryRecord {
            id: id.to_string(),
            full_name: full_name.to_string(),
            description: description.to_string(),
            related_language_or_topic: facet.to_string(),
            stargazers_count: 100,
            forks_count: 10,
            open_issues_count: 1,
            language: String::new(),
            topics: String::new(),
            avatar_url: String::new(),
            updated_at: String::new(),
        }
    }

    async fn seeded_recommender(
        dir: &std::path::Path,
        records: Vec<RepositoryRecord>,
    ) -> Recommender<KeywordEmbedder> {
        let store = Arc::new(
            CandidateStore::open_or_create(dir, dir.join("candidates.json")).unwrap(),
        );
        store.upsert(&KeywordEmbedder, records).await.unwrap();
        Recommender::new(store, KeywordEmbedder, 4)
    }

    fn preferences(languages: &[&str], topics: &[&str]) -> LanguageTopics {
        LanguageTopics {
            languages: languages.iter().map(|s| s.to_string()).collect(),
            topics: topics.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_resolve_prefers_preferences_over_projects() {
        let signal = RecommendSignal::resolve(
            Some(vec![Project {
                project_name: "mine".to_string(),
                description: "a tool".to_string(),
                related_language_or_topic: vec![],
            }]),
            Some(preferences(&["Rust"], &["cli"])),
            Some(vec!["web".to_string()]),
        );
        assert!(matches!(signal, Some(RecommendSignal::Preferences(_))));
    }

    #[test]
    fn test_resolve_empty_preferences_falls_through_to_projects() {
        let signal = RecommendSignal::resolve(
            Some(vec![Project {
                project_name: "mine".to_string(),
                description: String::new(),
                related_language_or_topic: vec![],
            }]),
            Some(LanguageTopics::default()),
            None,
        );
        assert!(matches!(signal, Some(RecommendSignal::Projects(_))));
    }

    #[test]
    fn test_resolve_no_signal_is_none() {
        let signal = RecommendSignal::resolve(Some(vec![]), None, None);
        assert!(signal.is_none());
    }

    #[tokio::test]
    async fn test_no_signal_returns_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let recommender = seeded_recommender(dir.path(), vec![]).await;
        let results = recommender.recommend(None, 15).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_preferences_path_caps_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<_> = (0..30)
            .map(|i| record(&i.to_string(), &format!("owner/rust-{i}"), "rust tool", "rust"))
            .collect();
        let recommender = seeded_recommender(dir.path(), records).await;

        let results = recommender
            .recommend(
                Some(RecommendSignal::Preferences(preferences(&["Rust"], &["cli"]))),
                15,
            )
            .await
            .unwrap();

        assert!(results.len() <= 15);
        let mut names: Vec<&str> = results.iter().map(|r| r.full_name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), results.len());
    }

    #[tokio::test]
    async fn test_malformed_full_name_never_appears() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("1", "no-slash-placeholder", "rust rust rust", "rust"),
            record("2", "owner/real", "rust rust", "rust"),
        ];
        let recommender = seeded_recommender(dir.path(), records).await;

        let results = recommender
            .recommend(
                Some(RecommendSignal::Preferences(preferences(&["Rust"], &[]))),
                15,
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].full_name, "owner/real");
        assert_eq!(results[0].repo_url, "https://github.com/owner/real");
    }

    #[tokio::test]
    async fn test_project_path_keeps_top_four_per_project() {
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<_> = (0..10)
            .map(|i| record(&i.to_string(), &format!("owner/py-{i}"), "python web", "python"))
            .collect();
        let recommender = seeded_recommender(dir.path(), records).await;

        let projects = vec![Project {
            project_name: "my-flask-app".to_string(),
            description: "a python web app".to_string(),
            related_language_or_topic: vec!["Python".to_string()],
        }];
        let results = recommender
            .recommend(Some(RecommendSignal::Projects(projects)), 15)
            .await
            .unwrap();

        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_topics_path_respects_facet_filter() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("1", "owner/ml", "machine-learning python", "machine-learning"),
            record("2", "owner/other", "machine-learning python", "embedded"),
        ];
        let recommender = seeded_recommender(dir.path(), records).await;

        let results = recommender
            .recommend(
                Some(RecommendSignal::Topics(vec!["machine-learning".to_string()])),
                15,
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].full_name, "owner/ml");
    }

    #[tokio::test]
    async fn test_fewer_candidates_than_requested_returns_fewer() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("1", "owner/only", "rust", "rust")];
        let recommender = seeded_recommender(dir.path(), records).await;

        let results = recommender
            .recommend(
                Some(RecommendSignal::Preferences(preferences(&["Rust"], &[]))),
                15,
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_topic_fallback_requires_some_signal() {
        let dir = tempfile::tempdir().unwrap();
        let recommender = seeded_recommender(dir.path(), vec![]).await;

        let err = recommender.topic_fallback(&[], &[], 15).await.unwrap_err();
        assert!(matches!(err, RecommendError::NoSignal));
        assert_eq!(err.to_string(), "no languages or topics available");
    }

    #[tokio::test]
    async fn test_topic_fallback_combines_languages_and_extras() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("1", "owner/rusty", "rust rust", "rust"),
            record("2", "owner/webby", "web web", "web"),
        ];
        let recommender = seeded_recommender(dir.path(), records).await;

        let results = recommender
            .topic_fallback(&["rust".to_string()], &["web".to_string()], 15)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }
}
