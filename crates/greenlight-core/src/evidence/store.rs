//! File-addressed evidence persistence

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::records::{RulesSnapshot, StatusRecord, TaskDescriptor};
use crate::error::{EvidenceError, Result};

/// File name of the rules snapshot within a work unit's directory
pub const RULES_SNAPSHOT_FILE: &str = "rules_snapshot.json";
/// File name of the task descriptor within a work unit's directory
pub const TASK_DESCRIPTOR_FILE: &str = "task.json";
/// File name of the status record within a work unit's directory
pub const STATUS_RECORD_FILE: &str = "status.json";

/// Append-only evidence store, one directory per unit of work
///
/// Records are addressed as `<root>/<work_id>/<record>.json` and are
/// write-once: overwriting an existing record is refused. Reads distinguish
/// an absent record (`Ok(None)`) from one that exists but cannot be parsed
/// ([`EvidenceError::Corrupt`]).
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    root: PathBuf,
}

impl EvidenceStore {
    /// Open a store rooted at the given directory, creating it if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// The store's root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Written once per work unit by the rule loader
    pub async fn record_rules_snapshot(&self, snapshot: &RulesSnapshot) -> Result<()> {
        self.write_record(&snapshot.work_id, RULES_SNAPSHOT_FILE, "rules snapshot", snapshot)
            .await
    }

    /// Written once per work unit by the planner
    pub async fn record_task_descriptor(&self, task: &TaskDescriptor) -> Result<()> {
        self.write_record(&task.work_id, TASK_DESCRIPTOR_FILE, "task descriptor", task)
            .await
    }

    /// Written once per work unit by the final reconciliation step
    pub async fn record_status(&self, status: &StatusRecord) -> Result<()> {
        self.write_record(&status.work_id, STATUS_RECORD_FILE, "status record", status)
            .await
    }

    pub async fn load_rules_snapshot(&self, work_id: &str) -> Result<Option<RulesSnapshot>> {
        self.read_record(work_id, RULES_SNAPSHOT_FILE, "rules snapshot")
            .await
    }

    pub async fn load_task_descriptor(&self, work_id: &str) -> Result<Option<TaskDescriptor>> {
        self.read_record(work_id, TASK_DESCRIPTOR_FILE, "task descriptor")
            .await
    }

    pub async fn load_status(&self, work_id: &str) -> Result<Option<StatusRecord>> {
        self.read_record(work_id, STATUS_RECORD_FILE, "status record")
            .await
    }

    fn record_path(&self, work_id: &str, file: &str) -> PathBuf {
        self.root.join(work_id).join(file)
    }

    async fn write_record<T: Serialize>(
        &self,
        work_id: &str,
        file: &str,
        record: &str,
        value: &T,
    ) -> Result<()> {
        let dir = self.root.join(work_id);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(file);
        // create_new refuses to clobber: the write-once check and the create
        // are one atomic operation
        let mut out = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(out) => out,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(EvidenceError::AlreadyRecorded {
                    work_id: work_id.to_string(),
                    record: record.to_string(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        let body = serde_json::to_string_pretty(value)?;
        out.write_all(body.as_bytes()).await?;
        debug!(work_id, record, path = %path.display(), "evidence recorded");
        Ok(())
    }

    async fn read_record<T: DeserializeOwned>(
        &self,
        work_id: &str,
        file: &str,
        record: &str,
    ) -> Result<Option<T>> {
        let path = self.record_path(work_id, file);
        // An absent record is Ok(None); the read itself tells the two apart
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => Err(EvidenceError::Corrupt {
                work_id: work_id.to_string(),
                record: record.to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, GovernanceError};

    async fn store() -> (tempfile::TempDir, EvidenceStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::open(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_round_trip_all_three_records() {
        let (_dir, store) = store().await;

        let snapshot = RulesSnapshot::capture("work_1", "v7", "rules body");
        let task = TaskDescriptor::declare("work_1", "posts/a", "food_safety", "caption");
        let status = StatusRecord::new("work_1")
            .with_validation_passed(true)
            .with_system_of_record_updated(true)
            .with_notification_sent(true)
            .mark_completed();

        store.record_rules_snapshot(&snapshot).await.unwrap();
        store.record_task_descriptor(&task).await.unwrap();
        store.record_status(&status).await.unwrap();

        let loaded = store.load_rules_snapshot("work_1").await.unwrap().unwrap();
        assert_eq!(loaded.rules_hash, snapshot.rules_hash);
        let loaded = store.load_task_descriptor("work_1").await.unwrap().unwrap();
        assert_eq!(loaded.target, "posts/a");
        let loaded = store.load_status("work_1").await.unwrap().unwrap();
        assert!(loaded.failed_flags().is_empty());
    }

    #[tokio::test]
    async fn test_records_are_write_once() {
        let (_dir, store) = store().await;
        let snapshot = RulesSnapshot::capture("work_1", "v7", "rules body");

        store.record_rules_snapshot(&snapshot).await.unwrap();
        let err = store.record_rules_snapshot(&snapshot).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Evidence);
        assert!(matches!(
            err,
            GovernanceError::Evidence(EvidenceError::AlreadyRecorded { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_record_is_none_not_error() {
        let (_dir, store) = store().await;
        assert!(store.load_status("work_unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unparseable_record_is_corrupt() {
        let (_dir, store) = store().await;
        let dir = store.root().join("work_1");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join(STATUS_RECORD_FILE), b"{ not json")
            .await
            .unwrap();

        let err = store.load_status("work_1").await.unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::Evidence(EvidenceError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_work_units_are_isolated() {
        let (_dir, store) = store().await;
        let snapshot = RulesSnapshot::capture("work_1", "v7", "rules body");
        store.record_rules_snapshot(&snapshot).await.unwrap();

        assert!(store.load_rules_snapshot("work_2").await.unwrap().is_none());
        let other = RulesSnapshot::capture("work_2", "v7", "rules body");
        store.record_rules_snapshot(&other).await.unwrap();
    }
}
