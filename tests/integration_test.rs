//! Integration tests for the recommendation pipeline.
//!
//! These tests exercise the full ingest → query → rank flow with a
//! deterministic embedder, so no embedding model needs to be running.

use std::sync::Arc;

use oss_recommender::error::RecommendError;
use oss_recommender::history::{FileHistorySink, HistorySink};
use oss_recommender::llm::EmbeddingProvider;
use oss_recommender::models::{LanguageTopics, Project, RepositoryRecord};
use oss_recommender::recommend::ranking;
use oss_recommender::recommend::{RecommendSignal, Recommender};
use oss_recommender::store::CandidateStore;

/// Deterministic embedder: one dimension per keyword, counting occurrences.
/// Documents about the same stack end up close in cosine space.
struct KeywordEmbedder;

const KEYWORDS: [&str; 6] = [
    "rust",
    "python",
    "javascript",
    "web",
    "machine-learning",
    "cli",
];

fn keyword_vec(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut v: Vec<f32> = KEYWORDS
        .iter()
        .map(|k| lower.matches(k).count() as f32)
        .collect();
    v.push(0.01); // keep vectors non-zero
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

fn record(
    id: &str,
    full_name: &str,
    description: &str,
    facet: &str,
    language: &str,
    topics: &str,
) -> RepositoryRecord {
    RepositoryRecord {
        id: id.to_string(),
        full_name: full_name.to_string(),
        description: description.to_string(),
        related_language_or_topic: facet.to_string(),
        stargazers_count: 2500,
        forks_count: 600,
        open_issues_count: 40,
        language: language.to_string(),
        topics: topics.to_string(),
        avatar_url: "https://avatars.githubusercontent.com/u/1".to_string(),
        updated_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

/// A small corpus mixing Python/ML, Rust/CLI, and web projects.
fn sample_corpus() -> Vec<RepositoryRecord> {
    vec![
        record(
            "1",
            "scikit-learn/scikit-learn",
            "machine-learning in python",
            "python, machine-learning",
            "Python",
            "machine-learning, data-science",
        ),
        record(
            "2",
            "pandas-dev/pandas",
            "python data analysis",
            "python",
            "Python",
            "data-science",
        ),
        record(
            "3",
            "rust-lang/rust",
            "the rust compiler",
            "rust",
            "Rust",
            "compiler",
        ),
        record(
            "4",
            "BurntSushi/ripgrep",
            "rust cli search tool",
            "rust, cli",
            "Rust",
            "cli, search",
        ),
        record(
            "5",
            "facebook/react",
            "javascript web ui library",
            "javascript, web",
            "JavaScript",
            "web, frontend",
        ),
        // Placeholder row with a malformed name, must never surface
        record("6", "placeholder", "rust rust rust rust", "rust", "Rust", ""),
    ]
}

async fn seeded_store(dir: &std::path::Path) -> Arc<CandidateStore> {
    let store = Arc::new(
        CandidateStore::open_or_create(dir, dir.join("candidates.json")).unwrap(),
    );
    store
        .upsert(&KeywordEmbedder, sample_corpus())
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn test_end_to_end_preferences_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path()).await;
    let recommender = Recommender::new(store, KeywordEmbedder, 4);

    let languages = vec!["Python".to_string()];
    let topics = vec!["machine-learning".to_string(), "data-science".to_string()];
    let signal = RecommendSignal::resolve(
        None,
        Some(LanguageTopics {
            languages: languages.clone(),
            topics: topics.clone(),
        }),
        None,
    );

    let results = recommender.recommend(signal, 15).await.unwrap();
    assert!(!results.is_empty());
    assert!(results.len() <= 15);

    // Malformed full_name never surfaces
    assert!(results.iter().all(|r| r.full_name.contains('/')));
    // No duplicate repos
    let mut names: Vec<&str> = results.iter().map(|r| r.full_name.as_str()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), results.len());

    // Ranking puts the language+topic match on top
    let ranked = ranking::rank(results, &languages, &topics);
    assert_eq!(ranked[0].full_name, "scikit-learn/scikit-learn");
}

#[tokio::test]
async fn test_end_to_end_project_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path()).await;
    let recommender = Recommender::new(store, KeywordEmbedder, 2);

    let projects = vec![
        Project {
            project_name: "my-grep".to_string(),
            description: "a rust cli tool".to_string(),
            related_language_or_topic: vec!["Rust".to_string()],
        },
        Project {
            project_name: "my-notebook".to_string(),
            description: "python machine-learning experiments".to_string(),
            related_language_or_topic: vec!["Python".to_string()],
        },
    ];

    let signal = RecommendSignal::resolve(Some(projects), None, None);
    assert!(matches!(signal, Some(RecommendSignal::Projects(_))));

    let results = recommender.recommend(signal, 15).await.unwrap();
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.full_name.contains('/')));

    // Both stacks should be represented since projects are joined in order
    let names: Vec<&str> = results.iter().map(|r| r.full_name.as_str()).collect();
    assert!(names.contains(&"BurntSushi/ripgrep"));
    assert!(names.contains(&"scikit-learn/scikit-learn"));
}

#[tokio::test]
async fn test_topic_fallback_and_history_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path()).await;
    let recommender = Recommender::new(store, KeywordEmbedder, 4);

    let results = recommender
        .topic_fallback(&["rust".to_string()], &["cli".to_string()], 15)
        .await
        .unwrap();
    assert!(!results.is_empty());

    let sink = FileHistorySink::open_or_create(dir.path(), dir.path().join("history.json")).unwrap();
    let id = sink.append("alice", &results, "topics").unwrap();

    let batches = sink.for_user("alice");
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].recommendation_id, id);
    assert_eq!(batches[0].recommendations.len(), results.len());
}

#[tokio::test]
async fn test_queries_keep_working_during_upsert() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path()).await;

    // Interleave an overwrite upsert with queries; the store must never
    // corrupt or lose the record identity invariant.
    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..10 {
                let updated = record(
                    "3",
                    "rust-lang/rust",
                    &format!("the rust compiler, rev {i}"),
                    "rust",
                    "Rust",
                    "compiler",
                );
                store.upsert(&KeywordEmbedder, vec![updated]).await.unwrap();
            }
        })
    };

    let reader = {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..10 {
                let results = store.query(&keyword_vec("rust cli"), 10, None);
                assert!(!results.is_empty());
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();

    // Still exactly one entry for the overwritten id
    let results = store.query(&keyword_vec("rust compiler"), 20, None);
    let rust_entries = results
        .iter()
        .filter(|(r, _)| r.id == "3")
        .count();
    assert_eq!(rust_entries, 1);
}

#[tokio::test]
async fn test_empty_store_yields_empty_recommendations() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        CandidateStore::open_or_create(dir.path(), dir.path().join("candidates.json")).unwrap(),
    );
    let recommender = Recommender::new(store, KeywordEmbedder, 4);

    let signal = RecommendSignal::resolve(
        None,
        Some(LanguageTopics {
            languages: vec!["Rust".to_string()],
            topics: vec![],
        }),
        None,
    );
    let results = recommender.recommend(signal, 15).await.unwrap();
    assert!(results.is_empty());
}
