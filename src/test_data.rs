use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use crate::channel::{Channel, MarkupMode, MediaSource, TransportError};
use crate::media::MediaKind;

pub const POST_DATA: &str = "---
title: Test Post
tags: [test, markdown]
channel: @customChannel
attachments: [image.jpg, doc.pdf]
---
Test content";

pub const POST_WITHOUT_HEADER: &str = "Test content

Someone asked me this question today and I didn't have an answer.
";

#[derive(Debug, Clone, PartialEq)]
pub enum SentMessage {
    Text { chat: String, text: String, mode: MarkupMode },
    Media { chat: String, kind: MediaKind, file_name: String, size: usize },
}

/// Channel that keeps everything it is asked to send.
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<SentMessage>>,
    fail_text: Mutex<bool>,
    failing_media: Mutex<HashSet<String>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter()
            .filter_map(|m| match m {
                SentMessage::Text { text, .. } => Some(text),
                SentMessage::Media { .. } => None,
            })
            .collect()
    }

    pub fn set_fail_text(&self, fail: bool) {
        *self.fail_text.lock().unwrap() = fail;
    }

    pub fn fail_media(&self, file_name: &str) {
        self.failing_media.lock().unwrap().insert(file_name.to_string());
    }

    async fn record_media(&self, chat: &str, kind: MediaKind, mut media: MediaSource) -> Result<(), TransportError> {
        if self.failing_media.lock().unwrap().contains(&media.file_name) {
            return Err(TransportError::new(format!("upload of {} refused", media.file_name)));
        }
        let mut data = vec![];
        media.file.read_to_end(&mut data).await.map_err(TransportError::new)?;
        assert_eq!(data.len() as u64, media.length);

        self.sent.lock().unwrap().push(SentMessage::Media {
            chat: chat.to_string(),
            kind,
            file_name: media.file_name,
            size: data.len(),
        });
        Ok(())
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    async fn send_text(&self, chat: &str, text: &str, mode: MarkupMode) -> Result<(), TransportError> {
        if *self.fail_text.lock().unwrap() {
            return Err(TransportError::new("Bad Request: chat not found"));
        }
        self.sent.lock().unwrap().push(SentMessage::Text {
            chat: chat.to_string(),
            text: text.to_string(),
            mode,
        });
        Ok(())
    }

    async fn send_photo(&self, chat: &str, media: MediaSource) -> Result<(), TransportError> {
        self.record_media(chat, MediaKind::Image, media).await
    }

    async fn send_video(&self, chat: &str, media: MediaSource) -> Result<(), TransportError> {
        self.record_media(chat, MediaKind::Video, media).await
    }

    async fn send_audio(&self, chat: &str, media: MediaSource) -> Result<(), TransportError> {
        self.record_media(chat, MediaKind::Audio, media).await
    }

    async fn send_document(&self, chat: &str, media: MediaSource) -> Result<(), TransportError> {
        self.record_media(chat, MediaKind::Document, media).await
    }
}
