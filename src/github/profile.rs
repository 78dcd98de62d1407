use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::Config;
use crate::github::client::{GithubClient, API_BASE};
use crate::models::{Project, UserProfile};

#[derive(Debug, Deserialize)]
struct GithubRepo {
    name: String,
    fork: bool,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    languages_url: String,
}

impl GithubRepo {
    /// A repo contributes to the profile only when it carries some signal.
    fn has_signal(&self) -> bool {
        self.description.is_some() || self.language.is_some() || !self.topics.is_empty()
    }
}

/// Build a user's recommendation profile from their GitHub repositories.
///
/// Keeps up to `profile_repo_limit` non-fork repos that have a description,
/// language, or topics, in listing order; aggregates language and topic
/// frequencies across them; and merges the declared extras in front of the
/// derived top-N lists.
pub async fn build_profile(
    gh: &GithubClient,
    config: &Config,
    username: &str,
    extra_languages: &[String],
    extra_topics: &[String],
) -> Result<UserProfile> {
    let repos: Vec<GithubRepo> = gh.get(&format!("/users/{username}/repos"), &[]).await?;

    let mut projects = Vec::new();
    let mut languages_map: HashMap<String, usize> = HashMap::new();
    let mut topics_map: HashMap<String, usize> = HashMap::new();

    for repo in repos {
        if projects.len() >= config.profile_repo_limit {
            break;
        }
        if repo.fork || !repo.has_signal() {
            continue;
        }

        // Per-repo language breakdown; a failed lookup costs this repo its
        // language signal, not the whole profile.
        let path = repo
            .languages_url
            .strip_prefix(API_BASE)
            .unwrap_or(&repo.languages_url)
            .to_string();
        let repo_languages: HashMap<String, u64> = match gh.get(&path, &[]).await {
            Ok(languages) => languages,
            Err(e) => {
                tracing::warn!("Failed to fetch languages for {}: {e:#}", repo.name);
                HashMap::new()
            }
        };

        for language in repo_languages.keys() {
            *languages_map.entry(language.clone()).or_insert(0) += 1;
        }
        for topic in &repo.topics {
            *topics_map.entry(topic.clone()).or_insert(0) += 1;
        }

        projects.push(Project {
            project_name: repo.name,
            description: repo.description.unwrap_or_default(),
            related_language_or_topic: repo_languages.into_keys().collect(),
        });
    }

    let languages = merge_preferences(extra_languages, &languages_map, config.top_languages);
    let topics = merge_preferences(extra_topics, &topics_map, config.top_topics);

    Ok(UserProfile {
        username: username.to_string(),
        access_token: gh.token().to_string(),
        projects,
        languages,
        topics,
        extra_topics: extra_topics.to_vec(),
    })
}

/// Declared preferences first, then the top-`n` most frequent derived ones,
/// deduplicated case-insensitively while preserving order.
fn merge_preferences(declared: &[String], counts: &HashMap<String, usize>, n: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, &usize)> = counts.iter().collect();
    // Alphabetical tie-break keeps the ordering deterministic
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut merged = Vec::new();
    let mut seen = Vec::new();
    for item in declared.iter().chain(ranked.iter().take(n).map(|(name, _)| *name)) {
        let key = item.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            merged.push(item.clone());
        }
    }
    merged
}
