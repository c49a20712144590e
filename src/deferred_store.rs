use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use spdlog::{debug, info, warn};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::post::Post;

const RECORD_EXTENSION: &str = "json";

/// Identifies a deferred post on disk. It is derived from the creation time,
/// so sorting ids sorts records by the time they were scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub String);

impl RecordId {
    fn generate(created_at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        RecordId(format!("{:013}-{}", created_at.timestamp_millis(), &suffix[..8]))
    }

    fn file_name(&self) -> String {
        format!("{}.{}", self.0, RECORD_EXTENSION)
    }

    fn from_path(path: &Path) -> Option<Self> {
        if path.extension()? != RECORD_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        // Hidden files are records still being written
        if stem.is_empty() || stem.starts_with('.') {
            return None;
        }
        Some(RecordId(stem.to_string()))
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeferredPostRecord {
    pub id: RecordId,
    pub due: DateTime<Utc>,
    pub post: Post,
}

/// Posts waiting for their due time, one JSON file per post.
pub struct DeferredPostStore {
    dir: PathBuf,
    // Serializes every access to the directory
    lock: Mutex<()>,
}

impl DeferredPostStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn append(&self, post: &Post, at: DateTime<Utc>) -> Result<RecordId> {
        let _guard = self.lock.lock().await;

        tokio::fs::create_dir_all(&self.dir).await
            .map_err(|e| Error::store(&self.dir, format!("Error creating directory: {}", e)))?;

        let id = RecordId::generate(Utc::now());
        let path = self.dir.join(id.file_name());
        let tmp_path = self.dir.join(format!(".{}.tmp", id.file_name()));

        let json = serde_json::to_string_pretty(&post.scheduled_at(at))
            .map_err(|e| Error::store(&path, e))?;

        // Written aside and renamed, so a sweep never reads half a record
        tokio::fs::write(&tmp_path, json).await
            .map_err(|e| Error::store(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &path).await
            .map_err(|e| Error::store(&path, e))?;

        info!("Post '{}' scheduled for {} as {}", &post.metadata.title, at, id);
        Ok(id)
    }

    /// Records due at or before `now`, oldest due time first.
    pub async fn enumerate_due(&self, now: DateTime<Utc>) -> Result<Vec<DeferredPostRecord>> {
        let records = self.list().await?;
        Ok(records.into_iter().filter(|r| r.due <= now).collect())
    }

    /// Every pending record, oldest due time first. Records that can't be read
    /// are left on disk and skipped.
    pub async fn list(&self) -> Result<Vec<DeferredPostRecord>> {
        let _guard = self.lock.lock().await;

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(Error::store(&self.dir, e)),
        };

        let mut records = vec![];
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => return Err(Error::store(&self.dir, e)),
            };

            let path = entry.path();
            let Some(id) = RecordId::from_path(&path) else {
                continue;
            };

            match Self::read_record(&path, id).await {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping deferred post {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn read_record(path: &Path, id: RecordId) -> std::result::Result<DeferredPostRecord, String> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| e.to_string())?;
        let post: Post = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        let due = post.scheduled_time.ok_or_else(|| "missing scheduledTime".to_string())?;

        Ok(DeferredPostRecord { id, due, post })
    }

    /// Removing a record that is already gone is not an error.
    pub async fn remove(&self, id: &RecordId) -> Result<()> {
        let _guard = self.lock.lock().await;

        let path = self.dir.join(id.file_name());
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed deferred post {}", id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Deferred post {} was already removed", id);
                Ok(())
            }
            Err(e) => Err(Error::store(&path, e)),
        }
    }
}
