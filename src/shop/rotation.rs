//! Current/next shop rotation
//!
//! Each run classifies the persisted state against the current slot and
//! takes exactly one of three transitions:
//!
//! | Prior state | Transition       | current_shop          | next_shop              |
//! |-------------|------------------|-----------------------|------------------------|
//! | absent      | `RegenerateBoth` | sample(slot)          | sample(slot + 1)       |
//! | stale       | `RegenerateBoth` | sample(slot)          | sample(slot + 1)       |
//! | adjacent    | `Promote`        | prior `next_shop`     | sample(slot + 1)       |
//! | fresh       | `Reuse`          | unchanged             | unchanged              |
//!
//! Promotion reuses the pre-committed shop verbatim, so what consumers saw
//! as "upcoming" is exactly what becomes "current".

use serde::Serialize;
use std::fmt;

use super::error::ShopResult;
use super::model::{validate_shop_size, ShopDraw, ShopState, WeightTable};
use super::sampler::sample;
use super::seed::{derive_seed, SecretKey};
use super::slot::{SlotInterval, TimeSlot, TimeSlotClock};
use crate::storage::ShopStateStore;

// ============================================================================
// State Classification
// ============================================================================

/// How the persisted state relates to the current slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorState {
    /// No usable state on disk
    Absent,
    /// Generated for the current slot
    Fresh,
    /// Generated exactly one slot ago
    Adjacent,
    /// Older than one slot, or from the future
    Stale,
}

impl PriorState {
    /// Classify `prior` against `current`
    pub fn classify(prior: Option<&ShopState>, current: TimeSlot, interval: SlotInterval) -> Self {
        match prior {
            None => Self::Absent,
            Some(state) if state.generated_at == current => Self::Fresh,
            Some(state) if state.generated_at == current.previous(interval) => Self::Adjacent,
            Some(_) => Self::Stale,
        }
    }

    /// Transition taken from this state
    pub fn transition(&self) -> Transition {
        match self {
            Self::Absent | Self::Stale => Transition::RegenerateBoth,
            Self::Adjacent => Transition::Promote,
            Self::Fresh => Transition::Reuse,
        }
    }
}

impl fmt::Display for PriorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Absent => "absent",
            Self::Fresh => "fresh",
            Self::Adjacent => "adjacent",
            Self::Stale => "stale",
        };
        f.write_str(label)
    }
}

/// Work done by one rotation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Draw both shops from scratch
    RegenerateBoth,
    /// Promote the prior next shop and draw a new next shop
    Promote,
    /// Keep the prior state as is
    Reuse,
}

impl Transition {
    /// Number of fresh draws this transition performs
    pub fn draws(&self) -> usize {
        match self {
            Self::RegenerateBoth => 2,
            Self::Promote => 1,
            Self::Reuse => 0,
        }
    }

    /// Whether the result must be persisted
    pub fn writes(&self) -> bool {
        !matches!(self, Self::Reuse)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RegenerateBoth => "regenerate",
            Self::Promote => "promote",
            Self::Reuse => "reuse",
        };
        f.write_str(label)
    }
}

// ============================================================================
// Shop Generator
// ============================================================================

/// Draws the shop for any slot from a key and a weight table
#[derive(Debug, Clone)]
pub struct ShopGenerator {
    secret_key: SecretKey,
    table: WeightTable,
    shop_size: usize,
}

impl ShopGenerator {
    /// Create a generator; the shop size must be within the supported range
    pub fn new(secret_key: SecretKey, table: WeightTable, shop_size: usize) -> ShopResult<Self> {
        validate_shop_size(shop_size)?;
        Ok(Self {
            secret_key,
            table,
            shop_size,
        })
    }

    /// Eggs per shop
    pub fn shop_size(&self) -> usize {
        self.shop_size
    }

    /// Weight table in use
    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    /// Shop for `slot`
    pub fn shop_for(&self, slot: TimeSlot) -> ShopResult<ShopDraw> {
        let seed = derive_seed(self.secret_key.expose(), slot);
        let draw = sample(seed, self.table.items(), self.shop_size)?;
        tracing::debug!(slot = %slot, seed = %seed, shop = %draw, "Shop drawn");
        Ok(draw)
    }

    /// Shops for `count` consecutive slots starting at `first`
    pub fn shops_from(
        &self,
        first: TimeSlot,
        interval: SlotInterval,
        count: u32,
    ) -> ShopResult<Vec<(TimeSlot, ShopDraw)>> {
        (0..count)
            .map(|i| {
                let slot = first.advance(interval, i)?;
                self.shop_for(slot).map(|draw| (slot, draw))
            })
            .collect()
    }

    /// Compute the state for `current` given the prior state
    ///
    /// Pure apart from sampling; nothing is read or written.
    pub fn advance(
        &self,
        prior: Option<ShopState>,
        current: TimeSlot,
        interval: SlotInterval,
    ) -> ShopResult<(PriorState, ShopState)> {
        let classified = PriorState::classify(prior.as_ref(), current, interval);
        let next_slot = current.next(interval);

        let state = match (classified.transition(), prior) {
            (Transition::Reuse, Some(prior)) => prior,
            (Transition::Promote, Some(prior)) => {
                ShopState::new(current, prior.next_shop, self.shop_for(next_slot)?)
            }
            _ => ShopState::new(current, self.shop_for(current)?, self.shop_for(next_slot)?),
        };

        Ok((classified, state))
    }
}

// ============================================================================
// Rotation Engine
// ============================================================================

/// Result of one rotation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationOutcome {
    /// Slot the run executed in
    pub slot: TimeSlot,
    /// Classification of the persisted state
    pub prior: PriorState,
    /// Transition taken
    pub transition: Transition,
    /// Resulting state
    pub state: ShopState,
    /// Whether the state file was written
    pub written: bool,
}

/// Reads, advances and persists the shop state once per invocation
#[derive(Debug, Clone)]
pub struct RotationEngine {
    generator: ShopGenerator,
    store: ShopStateStore,
    clock: TimeSlotClock,
    wait_for_boundary: bool,
}

impl RotationEngine {
    /// Create an engine over the given collaborators
    pub fn new(generator: ShopGenerator, store: ShopStateStore, clock: TimeSlotClock) -> Self {
        Self {
            generator,
            store,
            clock,
            wait_for_boundary: false,
        }
    }

    /// Hold the write back until the current slot's boundary has passed
    pub fn with_wait_for_boundary(mut self, wait: bool) -> Self {
        self.wait_for_boundary = wait;
        self
    }

    /// Shop generator
    pub fn generator(&self) -> &ShopGenerator {
        &self.generator
    }

    /// State store
    pub fn store(&self) -> &ShopStateStore {
        &self.store
    }

    /// Slot clock
    pub fn clock(&self) -> &TimeSlotClock {
        &self.clock
    }

    /// Load the prior state, treating a corrupt file as absent
    fn load_prior(&self) -> ShopResult<Option<ShopState>> {
        match self.store.load() {
            Ok(state) => Ok(state),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(
                    path = %self.store.path().display(),
                    error = %e,
                    "Ignoring unreadable shop state, regenerating"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Run one rotation
    ///
    /// Sampling happens before any write, so an invalid table leaves the
    /// previous state file untouched.
    pub async fn run(&self) -> ShopResult<RotationOutcome> {
        let interval = self.clock.interval();
        let slot = self.clock.current_slot();
        let prior = self.load_prior()?;

        let (classified, state) = self.generator.advance(prior, slot, interval)?;
        let transition = classified.transition();

        tracing::info!(
            slot = %slot,
            prior = %classified,
            transition = %transition,
            draws = transition.draws(),
            "Shop rotation planned"
        );

        if !transition.writes() {
            return Ok(RotationOutcome {
                slot,
                prior: classified,
                transition,
                state,
                written: false,
            });
        }

        if self.wait_for_boundary {
            self.clock.wait_until_boundary(slot).await;
        }

        self.store.save(&state)?;
        tracing::info!(
            path = %self.store.path().display(),
            generated_at = %state.generated_at,
            current_shop = %state.current_shop,
            next_shop = %state.next_shop,
            "Shop state written"
        );

        Ok(RotationOutcome {
            slot,
            prior: classified,
            transition,
            state,
            written: true,
        })
    }

    /// Run once per slot until `max_runs` runs have completed
    ///
    /// `None` loops until the future is dropped. Each outcome is handed to
    /// `on_run` as soon as its run finishes; nothing is kept between runs.
    /// After each run the engine sleeps until the slot that run executed in
    /// has ended. Returns the number of completed runs.
    pub async fn watch<F>(&self, max_runs: Option<usize>, mut on_run: F) -> ShopResult<usize>
    where
        F: FnMut(&RotationOutcome),
    {
        let mut runs = 0;

        loop {
            let outcome = self.run().await?;
            runs += 1;
            on_run(&outcome);

            if max_runs.is_some_and(|max| runs >= max) {
                return Ok(runs);
            }

            self.clock.wait_until_boundary(outcome.slot).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
