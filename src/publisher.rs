use std::path::Path;
use std::sync::Arc;

use spdlog::{error, info, warn};

use crate::attachments::{AttachmentDispatcher, AttachmentReport};
use crate::channel::{Channel, MarkupMode};
use crate::error::{Error, Result};
use crate::markup::to_channel_markup;
use crate::post::Post;
use crate::validator;

/// What happened when a post was published.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub chat: String,
    pub attachments: AttachmentReport,
}

/// Sends a post to the channel: validation, conversion, text, then attachments.
pub struct PostPublisher {
    channel: Arc<dyn Channel>,
    attachments: AttachmentDispatcher,
    max_length: usize,
    default_channel: String,
}

impl PostPublisher {
    pub fn new(channel: Arc<dyn Channel>, media_root: &Path, max_length: usize, default_channel: &str) -> Self {
        let attachments = AttachmentDispatcher::new(channel.clone(), media_root);
        Self {
            channel,
            attachments,
            max_length,
            default_channel: default_channel.to_string(),
        }
    }

    pub fn validate(&self, post: &Post) -> Result<()> {
        validator::validate(post, self.max_length)
    }

    /// Message body as delivered: the title, a blank line and the converted content.
    pub fn render(&self, post: &Post) -> String {
        format!("{}\n\n{}", post.metadata.title, to_channel_markup(&post.content))
    }

    /// Fails when the post is too long or when the text could not be sent.
    /// Attachment problems are only reported.
    pub async fn publish(&self, post: &Post) -> Result<PublishReport> {
        info!("Publishing post: {}", &post.metadata.title);
        self.validate(post)?;

        let chat = post.channel_or(&self.default_channel);
        let text = self.render(post);

        if let Err(source) = self.channel.send_text(chat, &text, MarkupMode::Markdown).await {
            error!("Failed to publish post '{}' to {}: {}", &post.metadata.title, chat, source);
            return Err(Error::Transport {
                title: post.metadata.title.clone(),
                source,
            });
        }

        let attachments = if post.metadata.attachments.is_empty() {
            AttachmentReport::default()
        } else {
            self.attachments.dispatch(chat, &post.metadata.attachments).await
        };

        if attachments.is_complete() {
            info!("Successfully published post: {}", &post.metadata.title);
        } else {
            let failed = attachments.results.len() - attachments.sent();
            warn!("Published post '{}' with {} of {} attachments missing",
                  &post.metadata.title, failed, attachments.results.len());
        }

        Ok(PublishReport {
            chat: chat.to_string(),
            attachments,
        })
    }
}
