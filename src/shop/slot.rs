//! Time slots and the slot clock
//!
//! A shop is keyed to a [`TimeSlot`]: a UTC instant floored to a fixed
//! [`SlotInterval`]. The [`TimeSlotClock`] finds the slot for "now" and can
//! block until the next boundary, re-checking the wall clock after every
//! sleep so scheduler jitter never makes it overshoot or hang.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use super::error::{ShopError, ShopResult};

/// Timestamp format used as seed input (minute resolution, no zone suffix)
pub const SEED_LABEL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Timestamp format used in the persisted state file
pub const STATE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Default slot length in minutes
pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;

/// Longest single sleep before the remaining time is re-checked
pub const MAX_SLEEP_STEP: std::time::Duration = std::time::Duration::from_secs(30);

// ============================================================================
// Slot Interval
// ============================================================================

/// Length of one shop slot, in whole minutes
///
/// Only divisors of 60 are accepted: flooring by `minute % interval` then
/// lands on the same grid every hour, so `slot + interval` is always a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotInterval {
    minutes: u32,
}

impl SlotInterval {
    /// Create an interval, rejecting lengths that do not divide an hour
    pub fn new(minutes: u32) -> ShopResult<Self> {
        if minutes == 0 || 60 % minutes != 0 {
            return Err(ShopError::invalid_input(format!(
                "interval of {minutes} minutes does not evenly divide an hour"
            )));
        }
        Ok(Self { minutes })
    }

    /// Interval length in minutes
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Interval length as a chrono duration
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes))
    }
}

impl Default for SlotInterval {
    fn default() -> Self {
        Self {
            minutes: DEFAULT_INTERVAL_MINUTES,
        }
    }
}

impl fmt::Display for SlotInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes)
    }
}

// ============================================================================
// Time Slot
// ============================================================================

/// A UTC instant with no sub-interval remainder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(DateTime<Utc>);

impl TimeSlot {
    /// Floor an instant to the start of the slot containing it
    pub fn containing(instant: DateTime<Utc>, interval: SlotInterval) -> Self {
        let whole_seconds = instant.trunc_subsecs(0);
        let minutes_into_slot = i64::from(whole_seconds.minute() % interval.minutes());
        let offset =
            Duration::minutes(minutes_into_slot) + Duration::seconds(i64::from(whole_seconds.second()));
        Self(whole_seconds - offset)
    }

    /// Slot starting `interval` after this one
    pub fn next(&self, interval: SlotInterval) -> Self {
        Self(self.0 + interval.duration())
    }

    /// Slot starting `interval` before this one
    pub fn previous(&self, interval: SlotInterval) -> Self {
        Self(self.0 - interval.duration())
    }

    /// Slot `n` intervals after this one
    ///
    /// Fails when the result is past the last representable instant.
    pub fn advance(&self, interval: SlotInterval, n: u32) -> ShopResult<Self> {
        let minutes = i64::from(interval.minutes()) * i64::from(n);
        self.0
            .checked_add_signed(Duration::minutes(minutes))
            .map(Self)
            .ok_or_else(|| {
                ShopError::invalid_input(format!("{n} slots of {interval} after {self} is out of range"))
            })
    }

    /// Whether this slot sits exactly on an `interval` boundary
    pub fn is_aligned(&self, interval: SlotInterval) -> bool {
        self.0.nanosecond() == 0
            && self.0.second() == 0
            && self.0.minute() % interval.minutes() == 0
    }

    /// Minute-resolution label fed into seed derivation
    pub fn seed_label(&self) -> String {
        self.0.format(SEED_LABEL_FORMAT).to_string()
    }

    /// Start of the slot as a UTC instant
    pub fn start(&self) -> DateTime<Utc> {
        self.0
    }

    /// Parse an RFC 3339 timestamp and floor it to `interval`
    pub fn parse_floor(input: &str, interval: SlotInterval) -> ShopResult<Self> {
        let parsed = DateTime::parse_from_rfc3339(input.trim()).map_err(|e| {
            ShopError::invalid_input(format!("invalid timestamp '{input}': {e}"))
        })?;
        Ok(Self::containing(parsed.with_timezone(&Utc), interval))
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(STATE_TIMESTAMP_FORMAT))
    }
}

/// Parses a persisted timestamp; fractional seconds or a non-zero second are rejected
impl FromStr for TimeSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = DateTime::parse_from_rfc3339(s)
            .map_err(|e| format!("invalid timestamp '{s}': {e}"))?
            .with_timezone(&Utc);

        if parsed.second() != 0 || parsed.nanosecond() != 0 {
            return Err(format!("timestamp '{s}' is not minute-aligned"));
        }

        Ok(Self(parsed))
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Source of wall-clock time
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the caller for `duration`
    async fn sleep(&self, duration: std::time::Duration);
}

/// Real wall clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: std::time::Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that only moves when told to; sleeping advances it instantly
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<std::time::Duration>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move the clock to `instant`
    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = instant;
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<std::time::Duration> {
        self.sleeps.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|p| *p.into_inner())
    }

    async fn sleep(&self, duration: std::time::Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        if let Ok(step) = Duration::from_std(duration) {
            self.advance(step);
        }
    }
}

// ============================================================================
// Time Slot Clock
// ============================================================================

/// Computes slot boundaries against a [`Clock`]
#[derive(Clone)]
pub struct TimeSlotClock {
    clock: Arc<dyn Clock>,
    interval: SlotInterval,
    max_step: std::time::Duration,
}

impl TimeSlotClock {
    /// Create a slot clock over `clock`
    pub fn new(clock: Arc<dyn Clock>, interval: SlotInterval) -> Self {
        Self {
            clock,
            interval,
            max_step: MAX_SLEEP_STEP,
        }
    }

    /// Slot clock over the real wall clock
    pub fn system(interval: SlotInterval) -> Self {
        Self::new(Arc::new(SystemClock), interval)
    }

    /// Cap each individual sleep at `step`
    pub fn with_max_step(mut self, step: std::time::Duration) -> Self {
        self.max_step = step.max(std::time::Duration::from_millis(1));
        self
    }

    /// Configured slot length
    pub fn interval(&self) -> SlotInterval {
        self.interval
    }

    /// Current wall-clock time
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Slot containing the current instant
    pub fn current_slot(&self) -> TimeSlot {
        TimeSlot::containing(self.clock.now(), self.interval)
    }

    /// Time left until `slot + interval`, or `None` if that boundary has passed
    pub fn duration_until_boundary(&self, slot: TimeSlot) -> Option<std::time::Duration> {
        let target = slot.next(self.interval).start();
        let remaining = target.signed_duration_since(self.clock.now());
        if remaining <= Duration::zero() {
            return None;
        }
        remaining.to_std().ok()
    }

    /// Block until the wall clock reaches `slot + interval`
    ///
    /// Returns immediately if the boundary is already behind us. Each pass
    /// sleeps at most `max_step` and recomputes what is left.
    pub async fn wait_until_boundary(&self, slot: TimeSlot) {
        let target = slot.next(self.interval);

        while let Some(remaining) = self.duration_until_boundary(slot) {
            let step = remaining.min(self.max_step);
            tracing::debug!(
                target_slot = %target,
                remaining_ms = remaining.as_millis() as u64,
                "Waiting for slot boundary"
            );
            self.clock.sleep(step).await;
        }
    }
}

impl fmt::Debug for TimeSlotClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeSlotClock")
            .field("interval", &self.interval)
            .field("max_step", &self.max_step)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
