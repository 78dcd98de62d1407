use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::config::CrawlConfig;
use crate::github::GithubClient;
use crate::llm::EmbeddingProvider;
use crate::models::{IngestRequest, RepositoryRecord};
use crate::store::CandidateStore;

/// Issue-count qualifiers crawled per facet, so the corpus skews toward
/// repos that actually welcome contributors.
const ISSUE_QUALIFIERS: [&str; 2] = ["help-wanted-issues:>=1", "good-first-issues:>=1"];

/// Outcome of one corpus ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub facets: usize,
    pub discovered: usize,
    pub upserted: usize,
    pub finished_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: u64,
    full_name: String,
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    language: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    owner: Option<SearchItemOwner>,
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItemOwner {
    avatar_url: Option<String>,
}

/// Crawl every requested facet and upsert the discovered repositories
/// into the candidate store. A failed facet query is logged and skipped;
/// the crawl continues best-effort over the remaining facets.
pub async fn crawl_corpus<E: EmbeddingProvider>(
    gh: &GithubClient,
    store: &CandidateStore,
    embedder: &E,
    request: &IngestRequest,
    config: &CrawlConfig,
) -> Result<CrawlSummary> {
    let mut unique: HashMap<String, RepositoryRecord> = HashMap::new();

    for language in &request.languages {
        crawl_facet(gh, config, "language", language, &mut unique).await;
    }
    for topic in &request.topics {
        crawl_facet(gh, config, "topic", topic, &mut unique).await;
    }

    let discovered = unique.len();
    tracing::info!("Crawl discovered {discovered} unique repositories");

    let upserted = store
        .upsert(embedder, unique.into_values().collect())
        .await
        .context("Failed to upsert crawled repositories")?;

    Ok(CrawlSummary {
        facets: request.languages.len() + request.topics.len(),
        discovered,
        upserted,
        finished_at: Utc::now(),
    })
}

async fn crawl_facet(
    gh: &GithubClient,
    config: &CrawlConfig,
    qualifier: &str,
    facet: &str,
    unique: &mut HashMap<String, RepositoryRecord>,
) {
    for issue_qualifier in ISSUE_QUALIFIERS {
        let query = search_query(config, qualifier, facet, issue_qualifier);
        if let Err(e) = search_repositories(gh, config, &query, facet, unique).await {
            tracing::warn!("Search failed for {qualifier}:{facet} ({issue_qualifier}): {e:#}");
        }
    }
}

fn search_query(
    config: &CrawlConfig,
    qualifier: &str,
    facet: &str,
    issue_qualifier: &str,
) -> String {
    let pushed_since = (Utc::now() - Duration::days(config.pushed_within_days))
        .format("%Y-%m-%d")
        .to_string();
    format!(
        "stars:>={} forks:>={} {qualifier}:{facet} pushed:>={pushed_since} {issue_qualifier}",
        config.min_stars, config.min_forks,
    )
}

/// Page through one search query, merging results into `unique` keyed by
/// repo id so re-discovered repos accumulate facets instead of duplicating.
async fn search_repositories(
    gh: &GithubClient,
    config: &CrawlConfig,
    query: &str,
    facet: &str,
    unique: &mut HashMap<String, RepositoryRecord>,
) -> Result<()> {
    for page in 1..=config.max_pages {
        let params = [
            ("q", query.to_string()),
            ("sort", "stars".to_string()),
            ("order", "desc".to_string()),
            ("per_page", config.per_page.to_string()),
            ("page", page.to_string()),
        ];
        let response: SearchResponse = gh.get("/search/repositories", &params).await?;
        if response.items.is_empty() {
            break;
        }

        for item in response.items {
            match unique.entry(item.id.to_string()) {
                Entry::Occupied(mut existing) => merge_facet(existing.get_mut(), facet),
                Entry::Vacant(slot) => {
                    slot.insert(record_from_item(item, facet));
                }
            }
        }
    }
    Ok(())
}

/// Coerce a raw search item into a candidate record: optional fields
/// default to empty strings, counters to 0, topics are comma-joined.
fn record_from_item(item: SearchItem, facet: &str) -> RepositoryRecord {
    RepositoryRecord {
        id: item.id.to_string(),
        full_name: item.full_name,
        description: item.description.unwrap_or_default(),
        related_language_or_topic: facet.to_string(),
        stargazers_count: item.stargazers_count,
        forks_count: item.forks_count,
        open_issues_count: item.open_issues_count,
        language: item.language.unwrap_or_default(),
        topics: item.topics.join(", "),
        avatar_url: item
            .owner
            .and_then(|o| o.avatar_url)
            .unwrap_or_default(),
        updated_at: item.updated_at.unwrap_or_default(),
    }
}

/// Record the additional discovery facet on an already-seen repo.
fn merge_facet(record: &mut RepositoryRecord, facet: &str) {
    let already_listed = record
        .related_language_or_topic
        .split(',')
        .any(|f| f.trim().eq_ignore_ascii_case(facet));
    if !already_listed {
        if record.related_language_or_topic.is_empty() {
            record.related_language_or_topic = facet.to_string();
        } else {
            record.related_language_or_topic = format!(
                "{}, {}",
                record.related_language_or_topic, facet
            );
        }
    }
}
