//! Durable storage for shop state
//!
//! The shop keeps a single JSON record on disk. [`ShopStateStore`] owns it
//! exclusively: nothing else in the crate reads or writes that file directly,
//! except read-only consumers such as the announcer.

pub mod state;

pub use state::{ShopStateStore, DEFAULT_STATE_FILE};
