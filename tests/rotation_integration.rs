//! Integration tests for the rotation engine
//!
//! These tests drive the full read, advance and write cycle against a real
//! state file:
//! - First run, promotion and same-slot reuse
//! - Stale and future state handling
//! - Recovery from unreadable state files
//! - Waiting for the slot boundary
//! - Determinism properties of the draw itself

mod common;

use chrono::Duration;
use common::{engine, generator, interval, slot, store, utc, TEST_KEY};
use eggshop::shop::{
    derive_seed, Clock, ManualClock, PriorState, ShopDraw, ShopError, ShopState, TimeSlot,
    Transition,
};
use proptest::prelude::*;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Rotation Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_first_run_generates_both_shops() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    let clock = Arc::new(ManualClock::new(utc(0, 2, 17)));

    let outcome = engine(&path, clock).run().await.unwrap();

    assert_eq!(outcome.prior, PriorState::Absent);
    assert_eq!(outcome.transition, Transition::RegenerateBoth);
    assert!(outcome.written);

    let gen = generator(TEST_KEY, 3);
    assert_eq!(outcome.state.generated_at, slot(0, 0));
    assert_eq!(outcome.state.current_shop, gen.shop_for(slot(0, 0)).unwrap());
    assert_eq!(outcome.state.next_shop, gen.shop_for(slot(0, 5)).unwrap());

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"generated_at\": \"2024-01-01T00:00:00Z\""));
    assert_eq!(store(&path).load().unwrap(), Some(outcome.state));
}

#[tokio::test]
async fn test_next_shop_is_promoted_on_the_following_slot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    let clock = Arc::new(ManualClock::new(utc(0, 0, 0)));
    let engine = engine(&path, clock.clone());

    let first = engine.run().await.unwrap();
    clock.advance(Duration::minutes(5));
    let second = engine.run().await.unwrap();

    assert_eq!(second.prior, PriorState::Adjacent);
    assert_eq!(second.transition, Transition::Promote);
    assert_eq!(second.state.generated_at, slot(0, 5));
    assert_eq!(second.state.current_shop, first.state.next_shop);
    assert_eq!(
        second.state.next_shop,
        generator(TEST_KEY, 3).shop_for(slot(0, 10)).unwrap()
    );
}

#[tokio::test]
async fn test_promotion_keeps_stored_next_shop_verbatim() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");

    // A next shop no generator would produce for this key
    let sentinel = ShopDraw::from(vec!["Golden", "Golden", "Golden"]);
    let prior = ShopState::new(
        slot(0, 0),
        ShopDraw::from(vec!["Rock", "Rock", "Rock"]),
        sentinel.clone(),
    );
    store(&path).save(&prior).unwrap();

    let clock = Arc::new(ManualClock::new(utc(0, 7, 0)));
    let outcome = engine(&path, clock).run().await.unwrap();

    assert_eq!(outcome.transition, Transition::Promote);
    assert_eq!(outcome.state.current_shop, sentinel);
}

#[tokio::test]
async fn test_same_slot_run_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    let clock = Arc::new(ManualClock::new(utc(0, 1, 0)));
    let engine = engine(&path, clock.clone());

    let first = engine.run().await.unwrap();
    let bytes = fs::read(&path).unwrap();

    clock.advance(Duration::minutes(3));
    let second = engine.run().await.unwrap();

    assert_eq!(second.prior, PriorState::Fresh);
    assert_eq!(second.transition, Transition::Reuse);
    assert!(!second.written);
    assert_eq!(second.state, first.state);
    assert_eq!(fs::read(&path).unwrap(), bytes);
}

#[tokio::test]
async fn test_stale_state_is_regenerated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    let clock = Arc::new(ManualClock::new(utc(0, 0, 0)));
    let engine = engine(&path, clock.clone());

    engine.run().await.unwrap();
    clock.advance(Duration::minutes(15));
    let outcome = engine.run().await.unwrap();

    let gen = generator(TEST_KEY, 3);
    assert_eq!(outcome.prior, PriorState::Stale);
    assert_eq!(outcome.transition, Transition::RegenerateBoth);
    assert_eq!(outcome.state.current_shop, gen.shop_for(slot(0, 15)).unwrap());
    assert_eq!(outcome.state.next_shop, gen.shop_for(slot(0, 20)).unwrap());
}

#[tokio::test]
async fn test_future_state_is_treated_as_stale() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    let future = ShopState::new(
        slot(1, 0),
        ShopDraw::from(vec!["Rock", "Rock", "Rock"]),
        ShopDraw::from(vec!["Rock", "Rock", "Rock"]),
    );
    store(&path).save(&future).unwrap();

    let clock = Arc::new(ManualClock::new(utc(0, 30, 0)));
    let outcome = engine(&path, clock).run().await.unwrap();

    assert_eq!(outcome.prior, PriorState::Stale);
    assert_eq!(outcome.state.generated_at, slot(0, 30));
}

#[tokio::test]
async fn test_corrupt_state_file_is_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    fs::write(&path, "{ not json").unwrap();

    let clock = Arc::new(ManualClock::new(utc(0, 0, 0)));
    let outcome = engine(&path, clock).run().await.unwrap();

    assert_eq!(outcome.prior, PriorState::Absent);
    assert!(outcome.written);
    assert!(store(&path).load().unwrap().is_some());
}

#[tokio::test]
async fn test_legacy_single_shop_file_is_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    fs::write(
        &path,
        r#"{"generated_at": "2024-01-01T00:00:12.345+00:00", "shop": ["Slime"]}"#,
    )
    .unwrap();

    let clock = Arc::new(ManualClock::new(utc(0, 0, 0)));
    let outcome = engine(&path, clock).run().await.unwrap();

    assert_eq!(outcome.transition, Transition::RegenerateBoth);
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("current_shop"));
    assert!(!raw.contains("\"shop\""));
}

#[tokio::test]
async fn test_no_temp_file_left_behind() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    let clock = Arc::new(ManualClock::new(utc(0, 0, 0)));

    engine(&path, clock).run().await.unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["shop.json".to_string()]);
}

// ============================================================================
// Boundary Waiting Tests
// ============================================================================

#[tokio::test]
async fn test_wait_for_boundary_before_writing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    let clock = Arc::new(ManualClock::new(utc(0, 3, 20)));
    let engine = engine(&path, clock.clone()).with_wait_for_boundary(true);

    let outcome = engine.run().await.unwrap();

    let total: std::time::Duration = clock.sleeps().iter().sum();
    assert_eq!(total, std::time::Duration::from_secs(100));
    assert!(clock
        .sleeps()
        .iter()
        .all(|s| *s <= std::time::Duration::from_secs(30)));

    // The state still belongs to the slot the run started in
    assert_eq!(outcome.state.generated_at, slot(0, 0));
    assert_eq!(clock.now(), utc(0, 5, 0));
}

#[tokio::test]
async fn test_reuse_never_waits() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    let clock = Arc::new(ManualClock::new(utc(0, 0, 0)));

    engine(&path, clock.clone()).run().await.unwrap();

    let waiting = engine(&path, clock.clone()).with_wait_for_boundary(true);
    let outcome = waiting.run().await.unwrap();

    assert_eq!(outcome.transition, Transition::Reuse);
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_watch_rotates_each_slot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    let clock = Arc::new(ManualClock::new(utc(0, 4, 0)));

    let mut outcomes = Vec::new();
    let runs = engine(&path, clock)
        .watch(Some(3), |outcome| outcomes.push(outcome.clone()))
        .await
        .unwrap();
    assert_eq!(runs, 3);

    let slots: Vec<TimeSlot> = outcomes.iter().map(|o| o.slot).collect();
    assert_eq!(slots, vec![slot(0, 0), slot(0, 5), slot(0, 10)]);

    let transitions: Vec<Transition> = outcomes.iter().map(|o| o.transition).collect();
    assert_eq!(
        transitions,
        vec![
            Transition::RegenerateBoth,
            Transition::Promote,
            Transition::Promote
        ]
    );
    assert_eq!(outcomes[1].state.current_shop, outcomes[0].state.next_shop);
}

#[tokio::test]
async fn test_unbounded_watch_reports_runs_as_they_finish() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    let clock = Arc::new(ManualClock::new(utc(0, 4, 0)));
    let engine = engine(&path, clock.clone());

    // After the second report the state file is swapped for a directory,
    // so the third run fails and ends the loop.
    let mut reported = Vec::new();
    let err = engine
        .watch(None, |outcome| {
            reported.push((outcome.slot, clock.now()));
            if reported.len() == 2 {
                fs::remove_file(&path).unwrap();
                fs::create_dir(&path).unwrap();
            }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ShopError::Io { .. }));
    assert_eq!(reported.len(), 2);
    assert_eq!(reported[0], (slot(0, 0), utc(0, 4, 0)));
    assert_eq!(reported[1].0, slot(0, 5));
    assert!(reported[1].1 < slot(0, 10).start());
}

#[tokio::test]
async fn test_unreadable_state_path_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    fs::create_dir(&path).unwrap();
    let clock = Arc::new(ManualClock::new(utc(0, 0, 0)));

    let err = engine(&path, clock).run().await.unwrap_err();

    assert!(matches!(err, ShopError::Io { .. }));
    assert!(!err.is_recoverable());
    assert!(path.is_dir());
    assert_eq!(fs::read_dir(&path).unwrap().count(), 0);
    let entries: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("shop.json")]);
}

// ============================================================================
// Determinism Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_same_key_and_slot_give_same_shop(
        key in "[a-zA-Z0-9]{1,24}",
        minutes in 0i64..(60 * 24 * 365),
        size in 1usize..=10,
    ) {
        let at = utc(0, 0, 0) + Duration::minutes(minutes);
        let slot = TimeSlot::containing(at, interval());

        let first = generator(&key, size).shop_for(slot).unwrap();
        let second = generator(&key, size).shop_for(slot).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), size);
        let table = common::catalog();
        for name in first.names() {
            prop_assert!(table.table().contains(name));
        }
    }

    #[test]
    fn prop_any_instant_in_a_slot_gives_the_same_seed(
        key in "[a-z]{1,16}",
        slot_index in 0i64..10_000,
        offset_secs in 0i64..300,
    ) {
        let start = utc(0, 0, 0) + Duration::minutes(slot_index * 5);
        let a = TimeSlot::containing(start, interval());
        let b = TimeSlot::containing(start + Duration::seconds(offset_secs), interval());

        prop_assert_eq!(a, b);
        prop_assert_eq!(derive_seed(&key, a), derive_seed(&key, b));
    }

    #[test]
    fn prop_seed_changes_with_key(key in "[a-z]{1,16}", suffix in "[a-z]{1,4}") {
        let slot = TimeSlot::containing(utc(12, 0, 0), interval());
        let other = format!("{key}{suffix}");
        prop_assert_ne!(derive_seed(&key, slot), derive_seed(&other, slot));
    }
}
