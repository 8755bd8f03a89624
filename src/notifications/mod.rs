//! Shop announcements
//!
//! Reads the persisted shop state (only `current_shop` and `generated_at`),
//! renders a chat message with each egg's emoji and role pings, and hands it
//! to a [`channels::Channel`] for delivery.
//!
//! # Message Format
//!
//! ```text
//! 🥚 **Egg Shop Refresh!**
//!
//! <:Slime:111> Slime Egg
//! <:Unknown:999> Rock Egg
//! <:Slime:111> Slime Egg
//!
//! <@&900> <@&901>
//! ```
//!
//! Egg lines follow draw order, duplicates included. Role mentions are
//! listed once per distinct egg, in first-seen order.

pub mod channels;

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::catalog::EggCatalog;
use crate::shop::error::{ShopError, ShopResult};

pub use channels::discord::{DiscordChannel, DiscordConfig};
pub use channels::{Channel, ChannelError, ChannelResult, DeliveryStatus};

/// Heading line of every announcement
pub const ANNOUNCEMENT_HEADER: &str = "🥚 **Egg Shop Refresh!**";

/// The part of the state file an announcement needs
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShopSnapshot {
    /// Slot timestamp as written by the rotation engine
    #[serde(default)]
    pub generated_at: Option<String>,

    /// Eggs currently on sale, in draw order
    #[serde(default)]
    pub current_shop: Vec<String>,
}

impl ShopSnapshot {
    /// Read the snapshot from a state file
    pub fn from_path(path: impl AsRef<Path>) -> ShopResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ShopError::io_error(format!("read {}", path.display()), e))?;
        Self::from_json(&content)
            .map_err(|e| ShopError::corrupt_state(path.display().to_string(), e.to_string()))
    }

    /// Parse a snapshot from state file JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A rendered announcement ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopAnnouncement {
    /// Full message text
    pub content: String,

    /// Eggs announced, in draw order
    pub eggs: Vec<String>,

    /// Slot the shop belongs to, if known
    pub generated_at: Option<String>,
}

impl ShopAnnouncement {
    /// Render the announcement for a snapshot
    pub fn render(snapshot: &ShopSnapshot, catalog: &EggCatalog) -> Self {
        let lines: Vec<String> = snapshot
            .current_shop
            .iter()
            .map(|egg| match catalog.emoji_for(egg) {
                Some(emoji) => format!("{emoji} {egg} Egg"),
                None => format!("{egg} Egg"),
            })
            .collect();

        let mut seen = std::collections::HashSet::new();
        let mentions: Vec<String> = snapshot
            .current_shop
            .iter()
            .filter(|egg| seen.insert(egg.as_str()))
            .filter_map(|egg| catalog.mention_for(egg))
            .collect();

        let content = format!(
            "{ANNOUNCEMENT_HEADER}\n\n{}\n\n{}",
            lines.join("\n"),
            mentions.join(" ")
        )
        .trim_end()
        .to_string();

        Self {
            content,
            eggs: snapshot.current_shop.clone(),
            generated_at: snapshot.generated_at.clone(),
        }
    }

    /// Whether there is anything to announce
    pub fn is_empty(&self) -> bool {
        self.eggs.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
