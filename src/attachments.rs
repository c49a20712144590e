use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use spdlog::{error, info};
use tokio::fs::File;

use crate::channel::{Channel, MediaSource, TransportError};
use crate::media::{media_kind, MediaKind};

#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentOutcome {
    Sent,
    /// Nothing exists at the resolved path
    Missing,
    Unreadable(String),
    Failed(TransportError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentResult {
    pub reference: String,
    pub path: PathBuf,
    pub kind: MediaKind,
    pub outcome: AttachmentOutcome,
}

/// Per-attachment results of one dispatch, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentReport {
    pub results: Vec<AttachmentResult>,
}

impl AttachmentReport {
    pub fn sent(&self) -> usize {
        self.results.iter()
            .filter(|r| r.outcome == AttachmentOutcome::Sent)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &AttachmentResult> {
        self.results.iter().filter(|r| r.outcome != AttachmentOutcome::Sent)
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Sends the media files referenced by a post, one after the other.
pub struct AttachmentDispatcher {
    channel: Arc<dyn Channel>,
    media_root: PathBuf,
}

impl AttachmentDispatcher {
    pub fn new(channel: Arc<dyn Channel>, media_root: &Path) -> Self {
        Self {
            channel,
            media_root: std::path::absolute(media_root).unwrap_or_else(|_| media_root.to_path_buf()),
        }
    }

    /// Location of a reference under the media root. Leading `/` and `..`
    /// components can't climb above the root.
    pub fn resolve(&self, reference: &str) -> PathBuf {
        let mut relative = PathBuf::new();
        for component in Path::new(reference).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::ParentDir => {
                    relative.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        self.media_root.join(relative)
    }

    /// Never fails: every problem ends up in the report and the next
    /// attachment is still attempted.
    pub async fn dispatch(&self, chat: &str, references: &[String]) -> AttachmentReport {
        let mut report = AttachmentReport::default();

        for reference in references {
            let path = self.resolve(reference);
            let kind = media_kind(&path);
            let outcome = self.send_one(chat, &path, kind).await;

            match &outcome {
                AttachmentOutcome::Sent => info!("Sent {} attachment {}", kind, reference),
                AttachmentOutcome::Missing => error!("Attachment not found: {}", path.display()),
                AttachmentOutcome::Unreadable(e) => error!("Error reading attachment {}: {}", path.display(), e),
                AttachmentOutcome::Failed(e) => error!("Error sending attachment {}: {}", reference, e),
            }

            report.results.push(AttachmentResult {
                reference: reference.clone(),
                path,
                kind,
                outcome,
            });
        }

        report
    }

    async fn send_one(&self, chat: &str, path: &Path, kind: MediaKind) -> AttachmentOutcome {
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return AttachmentOutcome::Missing,
            Err(e) => return AttachmentOutcome::Unreadable(e.to_string()),
        };

        let length = match file.metadata().await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return AttachmentOutcome::Unreadable("not a regular file".to_string()),
            Err(e) => return AttachmentOutcome::Unreadable(e.to_string()),
        };

        let file_name = path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "attachment".to_string());

        match self.channel.send_media(chat, kind, MediaSource { file_name, length, file }).await {
            Ok(()) => AttachmentOutcome::Sent,
            Err(e) => AttachmentOutcome::Failed(e),
        }
    }
}
