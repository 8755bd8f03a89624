//! Seed derivation
//!
//! `seed = SHA-256("{secret_key}:{YYYY-MM-DDTHH:MM}") mod 2^32`
//!
//! The digest is read as a big-endian integer, so the reduction is simply the
//! last four digest bytes. Anyone holding the same key computes the same seed
//! for the same slot.

use sha2::{Digest, Sha256};
use std::fmt;

use super::slot::TimeSlot;

/// Deterministic sampler seed for one time slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Seed(u32);

impl Seed {
    /// Wrap a raw seed value
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw seed value
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Shared secret mixed into every seed
///
/// Never logged: `Debug` and `Display` print a placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wrap a secret key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key text, for hashing only
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Derive the seed for `slot` under `secret_key`
pub fn derive_seed(secret_key: &str, slot: TimeSlot) -> Seed {
    let mut hasher = Sha256::new();
    hasher.update(secret_key.as_bytes());
    hasher.update(b":");
    hasher.update(slot.seed_label().as_bytes());
    let digest = hasher.finalize();

    let mut tail = [0u8; 4];
    tail.copy_from_slice(&digest[28..32]);
    Seed(u32::from_be_bytes(tail))
}
