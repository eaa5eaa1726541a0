//! Filesystem-backed result store.
//!
//! One pretty-printed JSON document per run, named by run id. `recent` is
//! driven by file modification time; unparsable files are skipped with a
//! warning rather than failing the listing.

use std::path::PathBuf;
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::warn;

use crate::error::StoreError;
use crate::pipeline::PipelineRun;

use super::ResultStore;

/// Stores each pipeline run as a JSON file under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory.
    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl ResultStore for FileStore {
    async fn save(&self, run: &PipelineRun) -> Result<String, StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(format!("{}.json", run.id));
        let json = serde_json::to_vec_pretty(run)?;
        tokio::fs::write(&path, json).await?;
        Ok(run.id.to_string())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PipelineRun>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<(SystemTime, PathBuf)> = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let modified = entry
                .metadata()
                .await?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((modified, path));
        }

        entries.sort_by(|a, b| b.0.cmp(&a.0));

        let mut runs = Vec::new();
        for (_, path) in entries.into_iter().take(limit) {
            let contents = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<PipelineRun>(&contents) {
                Ok(run) => runs.push(run),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unparsable run record");
                }
            }
        }
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{RunStatus, StageResult};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_run(query: &str) -> PipelineRun {
        let live = StageResult {
            text: "text".to_string(),
            degraded: false,
        };
        PipelineRun {
            id: Uuid::new_v4(),
            query: query.to_string(),
            started_at: Utc::now(),
            execution_time: 1.5,
            retrieved_docs: vec!["doc".to_string()],
            research: live.clone(),
            analysis: live.clone(),
            plan: live.clone(),
            draft: live.clone(),
            validation: live.clone(),
            strategic_report: live.clone(),
            swot_analysis: live.clone(),
            timeline: live,
            key_points: vec!["point".to_string()],
            status: RunStatus::Completed,
        }
    }

    #[tokio::test]
    async fn test_save_and_recent_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        let run = sample_run("grid storage");
        let id = store.save(&run).await.expect("save succeeds");
        assert_eq!(id, run.id.to_string());

        let recent = store.recent(10).await.expect("recent succeeds");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, run.id);
        assert_eq!(recent[0].query, "grid storage");
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        for i in 0..5 {
            store
                .save(&sample_run(&format!("query {i}")))
                .await
                .expect("save succeeds");
        }

        let recent = store.recent(3).await.expect("recent succeeds");
        assert_eq!(recent.len(), 3);
    }

    #[tokio::test]
    async fn test_recent_on_missing_dir_is_empty() {
        let store = FileStore::new("/nonexistent/reportforge-test");
        let recent = store.recent(5).await.expect("recent succeeds");
        assert!(recent.is_empty());
    }

    #[tokio::test]
    async fn test_recent_skips_unparsable_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        store.save(&sample_run("good")).await.expect("save succeeds");
        tokio::fs::write(dir.path().join("junk.json"), b"not json")
            .await
            .expect("write junk");

        let recent = store.recent(10).await.expect("recent succeeds");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].query, "good");
    }
}
