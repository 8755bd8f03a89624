//! Delivery channels for shop announcements

pub mod discord;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::notifications::ShopAnnouncement;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The remote API answered with an error status
    #[error("Request rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Generic error
    #[error("Channel error: {0}")]
    Other(String),
}

impl ChannelError {
    /// Transport failures and server-side errors may succeed on retry
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::HttpError(_) => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidConfig(_) | Self::Other(_) => false,
        }
    }
}

/// Response from sending an announcement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Whether the announcement was delivered
    pub success: bool,
    /// Channel that delivered (or failed to deliver) it
    pub channel: String,
    /// Optional detail about the delivery
    pub message: Option<String>,
    /// Time of the delivery attempt
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    /// Create a successful delivery status with a message
    pub fn success_with_message(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a failed delivery status
    pub fn failure(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{status}] {}", self.channel)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

/// A destination that can publish a shop announcement
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name
    fn name(&self) -> &str;

    /// Publish the announcement
    async fn send(&self, announcement: &ShopAnnouncement) -> ChannelResult<DeliveryStatus>;

    /// Channel configuration as JSON, without secrets
    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_status_display() {
        let success = DeliveryStatus::success_with_message("discord", "message 42");
        assert!(success.to_string().contains("SUCCESS"));
        assert!(success.to_string().contains("discord"));

        let failure = DeliveryStatus::failure("discord", "HTTP 403");
        assert!(!failure.success);
        assert!(failure.to_string().contains("FAILED"));
        assert!(failure.to_string().contains("HTTP 403"));
    }

    #[test]
    fn test_rejected_recoverability() {
        let server = ChannelError::Rejected {
            status: 502,
            body: String::new(),
        };
        let throttled = ChannelError::Rejected {
            status: 429,
            body: String::new(),
        };
        let forbidden = ChannelError::Rejected {
            status: 403,
            body: String::new(),
        };
        assert!(server.is_recoverable());
        assert!(throttled.is_recoverable());
        assert!(!forbidden.is_recoverable());
        assert!(!ChannelError::InvalidConfig("x".into()).is_recoverable());
    }
}
