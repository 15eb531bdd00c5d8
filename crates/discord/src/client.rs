//! Discord REST client implementing [`AttachmentStore`].
//!
//! Async HTTP client using `reqwest` with bot token authentication.

use chunkvault_orchestrator::{AttachmentStore, StoreError, StoreFuture};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{Channel, CreateChannel, GUILD_TEXT, Message};

const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

/// Discord rejects longer channel names.
const MAX_CHANNEL_NAME: usize = 100;

/// Errors from the Discord client.
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid bot token")]
    InvalidToken,

    #[error("message {0} has no attachment")]
    NoAttachment(String),
}

impl From<DiscordError> for StoreError {
    fn from(err: DiscordError) -> Self {
        match err {
            DiscordError::Api { status: 404, .. } | DiscordError::NoAttachment(_) => {
                StoreError::NotFound(err.to_string())
            }
            other => StoreError::TransferFailed(other.to_string()),
        }
    }
}

/// Normalizes a channel name the way Discord stores it.
///
/// Lowercase, whitespace to `-`, only letters, digits, `-` and `_` kept
/// (Unicode letters included), at most 100 characters. Applying it before
/// both lookup and creation keeps lookups matching channels this client
/// created.
///
/// Punctuation is dropped, so `a.b` and `ab` share a channel. Entries keep
/// their own message ids, so files in a shared channel never mix.
pub fn channel_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_CHANNEL_NAME)
        .collect()
}

/// Attachment store backed by channels of one Discord guild.
pub struct DiscordStore {
    http: reqwest::Client,
    base_url: String,
    auth: HeaderValue,
    guild_id: String,
}

impl DiscordStore {
    /// Creates a store for `guild_id` authenticated with a bot `token`.
    pub fn new(token: &str, guild_id: &str) -> Result<Self, DiscordError> {
        let mut auth =
            HeaderValue::from_str(&format!("Bot {token}")).map_err(|_| DiscordError::InvalidToken)?;
        auth.set_sensitive(true);

        let http = reqwest::Client::builder()
            .user_agent(concat!("chunkvault/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            auth,
            guild_id: guild_id.to_string(),
        })
    }

    /// Sets a custom API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    fn api(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, self.auth.clone())
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Sends a request and returns the body of a successful response.
    async fn send(request: RequestBuilder) -> Result<Vec<u8>, DiscordError> {
        let resp = request.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiscordError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, DiscordError> {
        let body = Self::send(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Lists all channels of the guild.
    pub async fn guild_channels(&self) -> Result<Vec<Channel>, DiscordError> {
        let url = self.url(&format!("/guilds/{}/channels", self.guild_id));
        Self::send_json(self.api(self.http.get(url))).await
    }

    /// Creates a text channel in the guild.
    pub async fn create_channel(&self, name: &str) -> Result<Channel, DiscordError> {
        let url = self.url(&format!("/guilds/{}/channels", self.guild_id));
        let body = CreateChannel {
            name,
            kind: GUILD_TEXT,
        };
        Self::send_json(self.api(self.http.post(url).json(&body))).await
    }

    /// Fetches a channel by id.
    pub async fn channel(&self, channel_id: &str) -> Result<Channel, DiscordError> {
        let url = self.url(&format!("/channels/{channel_id}"));
        Self::send_json(self.api(self.http.get(url))).await
    }

    /// Posts a message carrying `data` as a single attachment named `label`.
    pub async fn post_attachment(
        &self,
        channel_id: &str,
        label: &str,
        data: Vec<u8>,
    ) -> Result<Message, DiscordError> {
        let url = self.url(&format!("/channels/{channel_id}/messages"));
        let payload = serde_json::json!({
            "content": format!("Uploading chunk: {label}"),
            "attachments": [{ "id": 0, "filename": label }],
        });
        let file = Part::bytes(data)
            .file_name(label.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .text("payload_json", payload.to_string())
            .part("files[0]", file);

        Self::send_json(self.api(self.http.post(url).multipart(form))).await
    }

    /// Fetches a single message.
    pub async fn message(&self, channel_id: &str, message_id: &str) -> Result<Message, DiscordError> {
        let url = self.url(&format!("/channels/{channel_id}/messages/{message_id}"));
        Self::send_json(self.api(self.http.get(url))).await
    }

    /// Downloads attachment bytes from the CDN. No credentials are sent.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, DiscordError> {
        Self::send(self.http.get(url)).await
    }

    async fn find_or_create(&self, name: &str) -> Result<String, DiscordError> {
        let name = channel_name(name);
        let channels = self.guild_channels().await?;
        if let Some(existing) = channels.iter().find(|c| c.is_text() && c.name == name) {
            debug!(channel = %existing.id, name = %name, "reusing channel");
            return Ok(existing.id.clone());
        }

        let created = self.create_channel(&name).await?;
        debug!(channel = %created.id, name = %name, "created channel");
        Ok(created.id)
    }

    async fn exists(&self, channel_id: &str) -> Result<bool, DiscordError> {
        match self.channel(channel_id).await {
            Ok(_) => Ok(true),
            Err(DiscordError::Api { status: 404, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn fetch_attachment(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Vec<u8>, DiscordError> {
        let message = self.message(channel_id, message_id).await?;
        let attachment = message
            .attachments
            .first()
            .ok_or_else(|| DiscordError::NoAttachment(message_id.to_string()))?;

        match self.download(&attachment.url).await {
            // Expired CDN links answer 403/404; the attachment is gone either way.
            Err(DiscordError::Api { status, body })
                if status == StatusCode::FORBIDDEN.as_u16() =>
            {
                Err(DiscordError::Api { status: 404, body })
            }
            other => other,
        }
    }
}

impl AttachmentStore for DiscordStore {
    fn ensure_container<'a>(&'a self, name: &'a str) -> StoreFuture<'a, String> {
        Box::pin(async move { Ok(self.find_or_create(name).await?) })
    }

    fn container_exists<'a>(&'a self, container: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move { Ok(self.exists(container).await?) })
    }

    fn send_blob<'a>(
        &'a self,
        container: &'a str,
        label: &'a str,
        data: Vec<u8>,
    ) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let message = self.post_attachment(container, label, data).await?;
            Ok(message.id)
        })
    }

    fn fetch_blob<'a>(&'a self, container: &'a str, blob: &'a str) -> StoreFuture<'a, Vec<u8>> {
        Box::pin(async move { Ok(self.fetch_attachment(container, blob).await?) })
    }
}
