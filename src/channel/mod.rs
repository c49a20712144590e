use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs::File;

use crate::media::MediaKind;

pub mod telegram;

/// Markup dialect the text of a message is written in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MarkupMode {
    Plain,
    Markdown,
}

impl Display for MarkupMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkupMode::Plain => write!(f, "plain"),
            MarkupMode::Markdown => write!(f, "Markdown"),
        }
    }
}

/// An open file ready to be uploaded. The content is streamed, never
/// loaded in memory as a whole.
#[derive(Debug)]
pub struct MediaSource {
    pub file_name: String,
    pub length: u64,
    pub file: File,
}

/// Any failure while talking to the channel. The cause is kept as text since
/// the callers only need to know that the delivery did not happen.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl ToString) -> Self {
        TransportError(message.to_string())
    }
}

/// Delivery operations consumed from a messaging channel.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn send_text(&self, chat: &str, text: &str, mode: MarkupMode) -> Result<(), TransportError>;

    async fn send_photo(&self, chat: &str, media: MediaSource) -> Result<(), TransportError>;

    async fn send_video(&self, chat: &str, media: MediaSource) -> Result<(), TransportError>;

    async fn send_audio(&self, chat: &str, media: MediaSource) -> Result<(), TransportError>;

    async fn send_document(&self, chat: &str, media: MediaSource) -> Result<(), TransportError>;

    /// Routes a file to the delivery operation of its kind.
    async fn send_media(&self, chat: &str, kind: MediaKind, media: MediaSource) -> Result<(), TransportError> {
        match kind {
            MediaKind::Image => self.send_photo(chat, media).await,
            MediaKind::Video => self.send_video(chat, media).await,
            MediaKind::Audio => self.send_audio(chat, media).await,
            MediaKind::Document => self.send_document(chat, media).await,
        }
    }
}
