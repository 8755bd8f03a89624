//! Deterministic rotating shop
//!
//! Every party holding the same secret key and the same weight table computes
//! the same shop for the same time slot, without talking to each other.
//!
//! # Overview
//!
//! ```text
//!  secret key ─┐
//!              ├─► derive_seed ─► ChaCha8 ─► weighted draws ─► ShopDraw
//!  time slot ──┘                                 ▲
//!                                                │
//!                                          WeightTable
//! ```
//!
//! The [`RotationEngine`] keeps a two-slot state on disk: the shop for the
//! current slot and the already-drawn shop for the next one. On each run it
//! reuses, promotes or regenerates that state depending on how old it is.
//!
//! # Modules
//!
//! - [`slot`] - Time slots, slot intervals and the boundary-waiting clock
//! - [`seed`] - SHA-256 seed derivation from key and slot
//! - [`sampler`] - Weighted sampling with replacement
//! - [`model`] - Weight tables, draws and rotation state
//! - [`rotation`] - State classification and the rotation engine
//! - [`error`] - Shop error types
//!
//! # Quick Start
//!
//! ```
//! use eggshop::shop::{derive_seed, sample, SlotInterval, TimeSlot, WeightTable};
//!
//! let table = WeightTable::from_pairs([("Slime", 0.7), ("Rock", 0.3)]).unwrap();
//! let slot: TimeSlot = "2024-01-01T00:00:00Z".parse().unwrap();
//! let shop = sample(derive_seed("abc", slot), table.items(), 3).unwrap();
//! assert_eq!(shop.len(), 3);
//! assert_eq!(slot.next(SlotInterval::default()).to_string(), "2024-01-01T00:05:00Z");
//! ```
//!
//! # Concurrency
//!
//! One run performs at most one read, two draws, one bounded wait and one
//! write. Several writers on the same state file need an external lock.

pub mod error;
pub mod model;
pub mod rotation;
pub mod sampler;
pub mod seed;
pub mod slot;

pub use error::{ShopError, ShopResult};
pub use model::{
    validate_shop_size, ShopDraw, ShopState, WeightTable, WeightedItem, DEFAULT_SHOP_SIZE,
    MAX_SHOP_SIZE,
};
pub use rotation::{PriorState, RotationEngine, RotationOutcome, ShopGenerator, Transition};
pub use sampler::{sample, WeightedSampler};
pub use seed::{derive_seed, SecretKey, Seed};
pub use slot::{Clock, ManualClock, SlotInterval, SystemClock, TimeSlot, TimeSlotClock};
