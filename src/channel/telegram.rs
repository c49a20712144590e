use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::{Deserialize, Serialize};
use spdlog::debug;
use tokio_util::io::ReaderStream;

use crate::channel::{Channel, MarkupMode, MediaSource, TransportError};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Telegram Bot API client covering the calls needed to publish a post.
pub struct TelegramChannel {
    client: Client,
    api_url: String,
    bot_token: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramChannel {
    pub fn new(bot_token: &str, api_url: Option<&str>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::new(format!("Error creating HTTP client: {}", e)))?;

        let api_url = api_url.unwrap_or(DEFAULT_API_URL).trim_end_matches('/').to_string();

        Ok(Self {
            client,
            api_url,
            bot_token: bot_token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    async fn upload(&self, method: &str, field: &str, chat: &str, media: MediaSource) -> Result<(), TransportError> {
        debug!("Uploading {} ({} bytes) with {}", &media.file_name, media.length, method);
        let body = Body::wrap_stream(ReaderStream::new(media.file));
        let part = Part::stream_with_length(body, media.length).file_name(media.file_name);
        let form = Form::new()
            .text("chat_id", chat.to_string())
            .part(field.to_string(), part);

        let response = self.client
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::transport_error(method, e))?;

        Self::check_response(method, response).await
    }

    async fn check_response(method: &str, response: reqwest::Response) -> Result<(), TransportError> {
        let status = response.status();
        let body = match response.json::<ApiResponse>().await {
            Ok(body) => body,
            Err(e) => {
                return Err(TransportError::new(format!("{} failed with status {}: {}", method, status, e)));
            }
        };

        if body.ok {
            Ok(())
        } else {
            let description = body.description.unwrap_or_else(|| "no description".to_string());
            Err(TransportError::new(format!("{} failed with status {}: {}", method, status, description)))
        }
    }

    // reqwest errors carry the request url, which contains the bot token
    fn transport_error(method: &str, e: reqwest::Error) -> TransportError {
        let message = e.without_url().to_string();
        TransportError::new(format!("{} request failed: {}", method, message))
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    async fn send_text(&self, chat: &str, text: &str, mode: MarkupMode) -> Result<(), TransportError> {
        let parse_mode = match mode {
            MarkupMode::Plain => None,
            MarkupMode::Markdown => Some("Markdown"),
        };
        let message = SendMessage {
            chat_id: chat,
            text,
            parse_mode,
        };

        let response = self.client
            .post(self.method_url("sendMessage"))
            .json(&message)
            .send()
            .await
            .map_err(|e| Self::transport_error("sendMessage", e))?;

        Self::check_response("sendMessage", response).await
    }

    async fn send_photo(&self, chat: &str, media: MediaSource) -> Result<(), TransportError> {
        self.upload("sendPhoto", "photo", chat, media).await
    }

    async fn send_video(&self, chat: &str, media: MediaSource) -> Result<(), TransportError> {
        self.upload("sendVideo", "video", chat, media).await
    }

    async fn send_audio(&self, chat: &str, media: MediaSource) -> Result<(), TransportError> {
        self.upload("sendAudio", "audio", chat, media).await
    }

    async fn send_document(&self, chat: &str, media: MediaSource) -> Result<(), TransportError> {
        self.upload("sendDocument", "document", chat, media).await
    }
}
