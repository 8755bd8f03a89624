//! Weighted sampling with replacement
//!
//! The generator is fixed so committed slots stay reproducible:
//!
//! 1. `ChaCha8Rng::seed_from_u64(seed)` (rand_core 0.6 seed expansion).
//! 2. Each uniform draw is `(next_u64() >> 11) * 2^-53`, giving `r` in `[0, 1)`.
//! 3. Weights are normalized to `p_i = w_i / sum(w)` and accumulated in table
//!    order; the first item whose running sum exceeds `r` is picked. If
//!    rounding leaves `r` unmatched, the last item is picked.
//!
//! Changing any of these steps changes every shop ever generated.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::error::ShopResult;
use super::model::{validate_shop_size, validate_weights, ShopDraw, WeightedItem};
use super::seed::Seed;

/// Scale turning the top 53 bits of a `u64` into a float in `[0, 1)`
const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Generator used for every shop draw
pub fn seeded_rng(seed: Seed) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(u64::from(seed.value()))
}

/// Next uniform value in `[0, 1)`
pub fn next_uniform<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    (rng.next_u64() >> 11) as f64 * UNIT_SCALE
}

/// Sampler over a fixed, ordered list of weighted items
#[derive(Debug, Clone)]
pub struct WeightedSampler<'a> {
    items: &'a [WeightedItem],
    cumulative: Vec<f64>,
}

impl<'a> WeightedSampler<'a> {
    /// Prepare cumulative probabilities for `items`
    pub fn new(items: &'a [WeightedItem]) -> ShopResult<Self> {
        let total = validate_weights(items)?;

        let mut running = 0.0;
        let cumulative = items
            .iter()
            .map(|item| {
                running += item.weight / total;
                running
            })
            .collect();

        Ok(Self { items, cumulative })
    }

    /// Item selected by the uniform value `r`
    pub fn select(&self, r: f64) -> &'a WeightedItem {
        let index = self
            .cumulative
            .iter()
            .position(|&edge| r < edge)
            .unwrap_or(self.items.len() - 1);
        &self.items[index]
    }

    /// Draw `count` names with replacement from a generator seeded by `seed`
    pub fn draw(&self, seed: Seed, count: usize) -> ShopResult<ShopDraw> {
        validate_shop_size(count)?;

        let mut rng = seeded_rng(seed);
        let names = (0..count)
            .map(|_| self.select(next_uniform(&mut rng)).name.clone())
            .collect();

        Ok(ShopDraw::new(names))
    }
}

/// Draw a shop of `count` names for `seed`
pub fn sample(seed: Seed, items: &[WeightedItem], count: usize) -> ShopResult<ShopDraw> {
    WeightedSampler::new(items)?.draw(seed, count)
}

// ============================================================================
// Tests
// ============================================================================
