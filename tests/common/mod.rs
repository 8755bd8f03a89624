//! Common test utilities

use chrono::{DateTime, TimeZone, Utc};
use eggshop::catalog::EggCatalog;
use eggshop::shop::{
    ManualClock, RotationEngine, SecretKey, ShopGenerator, SlotInterval, TimeSlot, TimeSlotClock,
};
use eggshop::storage::ShopStateStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Secret key used by every fixture
pub const TEST_KEY: &str = "abc";

/// Path of the fixture egg catalog
pub fn fixture_csv() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/eggs.csv")
}

/// Load the fixture egg catalog
pub fn catalog() -> EggCatalog {
    EggCatalog::from_path(fixture_csv()).unwrap()
}

/// 2024-01-01 at the given UTC time
pub fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, h, m, s).unwrap()
}

/// The default five-minute interval
pub fn interval() -> SlotInterval {
    SlotInterval::default()
}

/// Slot containing 2024-01-01 `h:m`
#[allow(dead_code)]
pub fn slot(h: u32, m: u32) -> TimeSlot {
    TimeSlot::containing(utc(h, m, 0), interval())
}

/// Generator over the fixture catalog
pub fn generator(key: &str, shop_size: usize) -> ShopGenerator {
    ShopGenerator::new(SecretKey::new(key), catalog().table().clone(), shop_size).unwrap()
}

/// Engine writing to `path`, driven by a manual clock
pub fn engine(path: &Path, clock: Arc<ManualClock>) -> RotationEngine {
    let store = ShopStateStore::new(path, interval(), 3);
    RotationEngine::new(
        generator(TEST_KEY, 3),
        store,
        TimeSlotClock::new(clock, interval()),
    )
}

/// Store over `path` with the fixture shape
#[allow(dead_code)]
pub fn store(path: &Path) -> ShopStateStore {
    ShopStateStore::new(path, interval(), 3)
}
