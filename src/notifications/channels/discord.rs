//! Discord channel
//!
//! Posts the announcement to a channel through the Discord REST API using a
//! bot token, then adds the configured reactions to the new message.

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::notifications::ShopAnnouncement;

/// Discord channel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// REST API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Target channel id
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retry attempts on failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// First retry delay in milliseconds, doubled on every further attempt
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
    /// Reactions added to each announcement
    #[serde(default = "default_reactions")]
    pub reactions: Vec<String>,
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    1000
}

fn default_reactions() -> Vec<String> {
    vec!["🥳".to_string(), "😒".to_string()]
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            channel_id: None,
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            retry_base_delay_ms: default_retry_base_delay(),
            reactions: default_reactions(),
        }
    }
}

impl DiscordConfig {
    /// Create a configuration for `channel_id`
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: Some(channel_id.into()),
            ..Self::default()
        }
    }

    /// Point at a different API base (tests, proxies)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set max retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the first retry delay
    pub fn with_retry_base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_base_delay_ms = delay_ms;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err("Discord API base must start with http:// or https://".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        if let Some(id) = &self.channel_id {
            if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("Channel id '{id}' must be a numeric snowflake"));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

/// Discord delivery channel
pub struct DiscordChannel {
    config: DiscordConfig,
    channel_id: String,
    token: String,
    client: Client,
}

impl DiscordChannel {
    /// Create a channel; a channel id and a non-empty bot token are required
    pub fn new(config: DiscordConfig, token: impl Into<String>) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let channel_id = config
            .channel_id
            .clone()
            .ok_or_else(|| ChannelError::InvalidConfig("Discord channel id is not set".into()))?;

        let token = token.into();
        if token.trim().is_empty() {
            return Err(ChannelError::InvalidConfig("Discord bot token is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChannelError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            channel_id,
            token,
            client,
        })
    }

    /// Target channel id
    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    fn endpoint(&self, segments: &[&str]) -> ChannelResult<Url> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| ChannelError::InvalidConfig(format!("Invalid API base: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ChannelError::InvalidConfig("API base cannot hold a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Post the message, retrying with exponential backoff on recoverable errors
    async fn post_with_retry(&self, content: &str) -> ChannelResult<CreatedMessage> {
        let url = self.endpoint(&["channels", &self.channel_id, "messages"])?;
        let payload = serde_json::json!({ "content": content });
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.config.retry_base_delay_ms * 2_u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                tracing::debug!(
                    "Retrying Discord post (attempt {}/{})",
                    attempt + 1,
                    self.config.max_retries + 1
                );
            }

            let result = self
                .client
                .post(url.clone())
                .header(reqwest::header::AUTHORIZATION, self.auth_header())
                .json(&payload)
                .send()
                .await;

            let error = match result {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.json::<CreatedMessage>().await?);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unable to read response body".to_string());
                    ChannelError::Rejected { status, body }
                }
                Err(e) => ChannelError::HttpError(e),
            };

            if !error.is_recoverable() {
                return Err(error);
            }
            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| ChannelError::Other("Unknown error".to_string())))
    }

    /// Add one reaction to a posted message
    async fn react(&self, message_id: &str, emoji: &str) -> ChannelResult<()> {
        let url = self.endpoint(&[
            "channels",
            &self.channel_id,
            "messages",
            message_id,
            "reactions",
            emoji,
            "@me",
        ])?;

        let response = self
            .client
            .put(url)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .header(CONTENT_LENGTH, "0")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected { status, body });
        }
        Ok(())
    }
}

impl fmt::Debug for DiscordChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordChannel")
            .field("config", &self.config)
            .field("channel_id", &self.channel_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send(&self, announcement: &ShopAnnouncement) -> ChannelResult<DeliveryStatus> {
        let message = match self.post_with_retry(&announcement.content).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(channel_id = %self.channel_id, error = %e, "Failed to post shop announcement");
                return Ok(DeliveryStatus::failure("discord", e.to_string()));
            }
        };

        tracing::info!(
            channel_id = %self.channel_id,
            message_id = %message.id,
            eggs = announcement.eggs.len(),
            "Shop announcement posted"
        );

        for emoji in &self.config.reactions {
            if let Err(e) = self.react(&message.id, emoji).await {
                tracing::warn!(message_id = %message.id, emoji = %emoji, error = %e, "Failed to add reaction");
            }
        }

        Ok(DeliveryStatus::success_with_message(
            "discord",
            format!("Posted message {} to channel {}", message.id, self.channel_id),
        ))
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
            "api_base": self.config.api_base,
            "channel_id": self.channel_id,
            "timeout_secs": self.config.timeout_secs,
            "max_retries": self.config.max_retries,
            "reactions": self.config.reactions,
        })
    }
}
