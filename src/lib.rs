//! eggshop - Deterministic rotating egg shop
//!
//! Given a secret key, a weighted egg table and the current time, every party
//! computes the same shop for the same time slot. A small JSON state file keeps
//! the current shop and the already-drawn next one, and an optional announcer
//! posts the current shop to a Discord channel.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`shop`] - Seeds, weighted sampling, time slots and the rotation engine
//! - [`storage`] - Atomic persistence of the two-slot shop state
//! - [`catalog`] - Egg table and chat metadata loaded from CSV
//! - [`notifications`] - Announcement rendering and the Discord channel
//! - [`config`] - Configuration management and settings
//! - [`error`] - Unified error type
//!
//! # Example
//!
//! ```no_run
//! use eggshop::catalog::EggCatalog;
//! use eggshop::shop::{RotationEngine, SecretKey, ShopGenerator, TimeSlotClock};
//! use eggshop::storage::ShopStateStore;
//! use eggshop::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let interval = config.interval()?;
//!     let catalog = EggCatalog::from_path(&config.catalog.eggs_csv)?;
//!     let generator = ShopGenerator::new(
//!         SecretKey::new("abc"),
//!         catalog.table().clone(),
//!         config.shop.shop_size,
//!     )?;
//!     let store = ShopStateStore::new(&config.storage.output_path, interval, config.shop.shop_size);
//!     let engine = RotationEngine::new(generator, store, TimeSlotClock::system(interval));
//!     let outcome = engine.run().await?;
//!     println!("{}", outcome.state.current_shop);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod notifications;
pub mod shop;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{EggCatalog, EggInfo};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::notifications::{ShopAnnouncement, ShopSnapshot};
    pub use crate::shop::{
        derive_seed, sample, RotationEngine, RotationOutcome, SecretKey, ShopDraw,
        ShopGenerator, ShopState, SlotInterval, TimeSlot, TimeSlotClock, WeightTable,
    };
    pub use crate::storage::ShopStateStore;
}
