use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::RecommendError;
use crate::llm::EmbeddingProvider;
use crate::models::RepositoryRecord;

/// A candidate record together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    record: RepositoryRecord,
    embedding: Vec<f32>,
}

/// In-memory vector index of candidate repositories with disk persistence.
///
/// One entry per repository, keyed by the source platform's stable `id`:
/// upserting an already-known `id` overwrites the prior record. Queries
/// rank by cosine distance, which is the required metric because the
/// provider does not normalise its embeddings. Readers never block each
/// other, and ingestion writers only take the lock per batch, so
/// recommendation queries keep running during a crawl.
pub struct CandidateStore {
    entries: RwLock<Vec<StoredRecord>>,
    persist_path: PathBuf,
}

impl CandidateStore {
    pub fn open_or_create(data_dir: &Path, persist_path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let entries = if persist_path.exists() {
            let data = std::fs::read_to_string(&persist_path)
                .context("Failed to read candidate store")?;
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            persist_path,
        })
    }

    /// Embed and insert-or-overwrite a batch of records.
    ///
    /// Documents (`full_name` + description + topics) are embedded in one
    /// batch call; when that fails, each record is retried individually so
    /// a single bad document only skips itself and ingestion continues
    /// with the rest (partial success). Returns the number of records
    /// actually written.
    pub async fn upsert<E: EmbeddingProvider>(
        &self,
        embedder: &E,
        records: Vec<RepositoryRecord>,
    ) -> Result<usize, RecommendError> {
        let documents: Vec<String> = records.iter().map(|r| r.embedding_document()).collect();

        let mut embedded = Vec::with_capacity(records.len());
        match embedder.embed_batch(&documents).await {
            Ok(embeddings) if embeddings.len() == records.len() => {
                for (record, embedding) in records.into_iter().zip(embeddings) {
                    embedded.push(StoredRecord { record, embedding });
                }
            }
            Ok(embeddings) => {
                tracing::warn!(
                    "Batch embedding returned {} vectors for {} documents, retrying per record",
                    embeddings.len(),
                    documents.len()
                );
                embed_each(embedder, records, &mut embedded).await;
            }
            Err(e) => {
                tracing::warn!("Batch embedding failed, retrying per record: {e:#}");
                embed_each(embedder, records, &mut embedded).await;
            }
        }

        if embedded.is_empty() {
            return Ok(0);
        }

        let written = embedded.len();
        {
            let mut entries = self.entries.write();
            for stored in embedded {
                match entries.iter().position(|e| e.record.id == stored.record.id) {
                    Some(idx) => entries[idx] = stored,
                    None => entries.push(stored),
                }
            }
        }

        self.persist().map_err(RecommendError::Store)?;
        Ok(written)
    }

    /// Nearest neighbors by cosine distance against a query embedding.
    ///
    /// `facets` restricts results to records whose discovery facet or
    /// primary language intersects the given set. An empty store yields an
    /// empty result, not an error.
    pub fn query(
        &self,
        query_embedding: &[f32],
        k: usize,
        facets: Option<&[String]>,
    ) -> Vec<(RepositoryRecord, f32)> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &StoredRecord)> = entries
            .iter()
            .filter(|e| match facets {
                Some(facets) => matches_facets(&e.record, facets),
                None => true,
            })
            .map(|e| (cosine_distance(query_embedding, &e.embedding), e))
            .collect();

        // Sort ascending: smaller distance = nearer neighbor
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(distance, e)| (e.record.clone(), distance))
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Persist entries to disk (atomic write via temp file + rename). The
    /// temp name is unique per call so concurrent upserts cannot rename
    /// each other's half-written file out from under them.
    fn persist(&self) -> Result<()> {
        let entries = self.entries.read();
        let data = serde_json::to_string(&*entries)?;
        let tmp_path = self
            .persist_path
            .with_extension(format!("{}.tmp", Uuid::new_v4()));
        std::fs::write(&tmp_path, &data).context("Failed to write candidate store")?;
        std::fs::rename(&tmp_path, &self.persist_path)
            .context("Failed to replace candidate store")?;
        Ok(())
    }
}

/// Per-record retry path: embedding failures skip the affected record.
async fn embed_each<E: EmbeddingProvider>(
    embedder: &E,
    records: Vec<RepositoryRecord>,
    out: &mut Vec<StoredRecord>,
) {
    for record in records {
        let document = record.embedding_document();
        match embedder.embed(&document).await {
            Ok(embedding) => out.push(StoredRecord { record, embedding }),
            Err(e) => {
                tracing::warn!("Skipping {}: embedding failed: {e:#}", record.full_name);
            }
        }
    }
}

/// A record matches when its discovery facet list or its primary language
/// intersects the filter set, compared case-insensitively.
fn matches_facets(record: &RepositoryRecord, facets: &[String]) -> bool {
    let wanted: Vec<String> = facets.iter().map(|f| f.trim().to_lowercase()).collect();

    if !record.language.is_empty() && wanted.contains(&record.language.to_lowercase()) {
        return true;
    }

    record
        .related_language_or_topic
        .split(',')
        .map(|f| f.trim().to_lowercase())
        .any(|f| !f.is_empty() && wanted.contains(&f))
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
