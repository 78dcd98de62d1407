use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::RecommendError;
use crate::models::RecommendationResult;

/// One persisted batch of recommendations for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationBatch {
    pub recommendation_id: String,
    pub username: String,
    /// Which path produced the batch ("profile" or "topics").
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub recommendations: Vec<RecommendationResult>,
}

/// Sink for produced recommendation batches. Writes happen after ranking
/// and must never lose the computed results: a failed append is reported
/// to the caller, who returns the recommendations without an id.
pub trait HistorySink: Send + Sync {
    fn append(
        &self,
        username: &str,
        recommendations: &[RecommendationResult],
        label: &str,
    ) -> Result<String, RecommendError>;

    fn for_user(&self, username: &str) -> Vec<RecommendationBatch>;
}

/// JSON-file-backed history log under the data dir.
pub struct FileHistorySink {
    batches: RwLock<Vec<RecommendationBatch>>,
    persist_path: PathBuf,
}

impl FileHistorySink {
    pub fn open_or_create(data_dir: &Path, persist_path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let batches = if persist_path.exists() {
            let data =
                std::fs::read_to_string(&persist_path).context("Failed to read history log")?;
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(Self {
            batches: RwLock::new(batches),
            persist_path,
        })
    }

    /// Persist batches to disk (atomic write via temp file + rename). The
    /// temp name is unique per call so concurrent appends cannot rename
    /// each other's half-written file out from under them.
    fn persist(&self) -> Result<()> {
        let batches = self.batches.read();
        let data = serde_json::to_string(&*batches)?;
        let tmp_path = self
            .persist_path
            .with_extension(format!("{}.tmp", Uuid::new_v4()));
        std::fs::write(&tmp_path, &data).context("Failed to write history log")?;
        std::fs::rename(&tmp_path, &self.persist_path).context("Failed to replace history log")?;
        Ok(())
    }
}

impl HistorySink for FileHistorySink {
    fn append(
        &self,
        username: &str,
        recommendations: &[RecommendationResult],
        label: &str,
    ) -> Result<String, RecommendError> {
        let recommendation_id = Uuid::new_v4().to_string();

        {
            let mut batches = self.batches.write();
            batches.push(RecommendationBatch {
                recommendation_id: recommendation_id.clone(),
                username: username.to_string(),
                label: label.to_string(),
                created_at: Utc::now(),
                recommendations: recommendations.to_vec(),
            });
        }

        self.persist().map_err(RecommendError::Persistence)?;
        Ok(recommendation_id)
    }

    fn for_user(&self, username: &str) -> Vec<RecommendationBatch> {
        self.batches
            .read()
            .iter()
            .filter(|b| b.username == username)
            .cloned()
            .collect()
    }
}
