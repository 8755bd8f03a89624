//! Shop data structures
//!
//! Weight tables, draws and the two-slot rotation state. All of these are
//! plain immutable values; a run builds a new [`ShopState`] instead of
//! editing the previous one.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::error::{ShopError, ShopResult};
use super::slot::{SlotInterval, TimeSlot};

/// Default number of eggs per shop
pub const DEFAULT_SHOP_SIZE: usize = 3;

/// Largest shop a slot may hold
pub const MAX_SHOP_SIZE: usize = 10;

// ============================================================================
// Weight Table
// ============================================================================

/// One named entry with its relative pull weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedItem {
    /// Item name, unique within its table
    pub name: String,

    /// Relative weight, strictly positive
    pub weight: f64,
}

impl WeightedItem {
    /// Create a new weighted item
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

/// Check weights are usable for sampling and return their sum
pub fn validate_weights(items: &[WeightedItem]) -> ShopResult<f64> {
    if items.is_empty() {
        return Err(ShopError::invalid_input("weight table is empty"));
    }

    for item in items {
        if !item.weight.is_finite() || item.weight <= 0.0 {
            return Err(ShopError::invalid_input(format!(
                "weight for '{}' must be a positive number, got {}",
                item.name, item.weight
            )));
        }
    }

    let total: f64 = items.iter().map(|item| item.weight).sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(ShopError::invalid_input(format!(
            "weight sum must be positive and finite, got {total}"
        )));
    }

    Ok(total)
}

/// Validated, ordered list of weighted items
///
/// Order is significant: the sampler walks items in table order when
/// matching a uniform draw against cumulative weights.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    items: Vec<WeightedItem>,
}

impl WeightTable {
    /// Build a table, rejecting empty, duplicate or non-positive entries
    pub fn new(items: Vec<WeightedItem>) -> ShopResult<Self> {
        {
            let mut seen = HashSet::with_capacity(items.len());
            for item in &items {
                if item.name.trim().is_empty() {
                    return Err(ShopError::invalid_input("item name cannot be empty"));
                }
                if !seen.insert(item.name.as_str()) {
                    return Err(ShopError::invalid_input(format!(
                        "duplicate item name '{}'",
                        item.name
                    )));
                }
            }
        }

        validate_weights(&items)?;
        Ok(Self { items })
    }

    /// Build a table from `(name, weight)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> ShopResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, weight)| WeightedItem::new(name, weight))
                .collect(),
        )
    }

    /// Items in table order
    pub fn items(&self) -> &[WeightedItem] {
        &self.items
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a constructed table
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `name` is in the table
    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name == name)
    }

    /// Probability of each item being picked by a single draw
    pub fn probabilities(&self) -> Vec<(&str, f64)> {
        let total: f64 = self.items.iter().map(|item| item.weight).sum();
        self.items
            .iter()
            .map(|item| (item.name.as_str(), item.weight / total))
            .collect()
    }
}

/// Check a requested shop size against the supported range
pub fn validate_shop_size(size: usize) -> ShopResult<usize> {
    if size == 0 || size > MAX_SHOP_SIZE {
        return Err(ShopError::invalid_input(format!(
            "shop size must be between 1 and {MAX_SHOP_SIZE}, got {size}"
        )));
    }
    Ok(size)
}

// ============================================================================
// Draws and State
// ============================================================================

/// Names drawn for one slot, in draw order, duplicates allowed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopDraw(Vec<String>);

impl ShopDraw {
    /// Wrap already-drawn names
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    /// Drawn names in order
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Number of drawn names
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was drawn
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Distinct names in first-seen order
    pub fn distinct(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .map(String::as_str)
            .collect()
    }
}

impl fmt::Display for ShopDraw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl From<Vec<&str>> for ShopDraw {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

/// Persisted two-slot rotation state
///
/// `current_shop` belongs to `generated_at`; `next_shop` to
/// `generated_at + interval`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopState {
    /// Slot the state was generated for
    pub generated_at: TimeSlot,

    /// Shop active during `generated_at`
    pub current_shop: ShopDraw,

    /// Shop pre-committed for the following slot
    pub next_shop: ShopDraw,
}

impl ShopState {
    /// Create a new state value
    pub fn new(generated_at: TimeSlot, current_shop: ShopDraw, next_shop: ShopDraw) -> Self {
        Self {
            generated_at,
            current_shop,
            next_shop,
        }
    }

    /// Slot the `next_shop` belongs to
    pub fn next_slot(&self, interval: SlotInterval) -> TimeSlot {
        self.generated_at.next(interval)
    }

    /// Structural check against the active configuration
    pub fn check_shape(&self, interval: SlotInterval, shop_size: usize) -> Result<(), String> {
        if !self.generated_at.is_aligned(interval) {
            return Err(format!(
                "generated_at {} is not on a {} boundary",
                self.generated_at, interval
            ));
        }
        for (field, draw) in [("current_shop", &self.current_shop), ("next_shop", &self.next_shop)] {
            if draw.len() != shop_size {
                return Err(format!(
                    "{field} holds {} items, expected {shop_size}",
                    draw.len()
                ));
            }
            if draw.names().iter().any(|name| name.trim().is_empty()) {
                return Err(format!("{field} contains an empty name"));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
