//! Integration tests for the egg catalog and shop announcements
//!
//! Covers the path from a rotated state file to the rendered message:
//! - Loading the CSV catalog from disk
//! - Reading the snapshot the rotation engine wrote
//! - Rendering emoji, fallbacks and role mentions

mod common;

use common::{catalog, engine, fixture_csv, utc};
use eggshop::catalog::{CatalogError, EggCatalog, UNKNOWN_EGG};
use eggshop::notifications::{ShopAnnouncement, ShopSnapshot, ANNOUNCEMENT_HEADER};
use eggshop::shop::{ManualClock, ShopError};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Catalog Tests
// ============================================================================

#[test]
fn test_fixture_catalog_table() {
    let catalog = catalog();

    assert_eq!(catalog.len(), 4);
    let names: Vec<&str> = catalog
        .table()
        .items()
        .iter()
        .map(|item| item.name.as_str())
        .collect();
    assert_eq!(names, vec!["Slime", "Rock", "Golden"]);
    assert!(!catalog.table().contains(UNKNOWN_EGG));

    let total: f64 = catalog.table().probabilities().iter().map(|(_, p)| p).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_repository_sample_catalog_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("eggs.csv");
    let catalog = EggCatalog::from_path(path).unwrap();
    assert!(catalog.table().len() >= 2);
    assert!(catalog.get(UNKNOWN_EGG).is_some());
}

#[test]
fn test_catalog_errors_name_the_row() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("eggs.csv");
    fs::write(&path, "EggName,PullChance\nSlime,1\nRock,NaN\n").unwrap();

    let err = EggCatalog::from_path(&path).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidRow { row: 2, .. }));
    assert!(err.to_string().contains("row 2"));
}

// ============================================================================
// Announcement Tests
// ============================================================================

#[tokio::test]
async fn test_announce_rotated_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    let clock = Arc::new(ManualClock::new(utc(0, 0, 0)));
    let outcome = engine(&path, clock).run().await.unwrap();

    let snapshot = ShopSnapshot::from_path(&path).unwrap();
    assert_eq!(snapshot.current_shop, outcome.state.current_shop.names());
    assert_eq!(snapshot.generated_at.as_deref(), Some("2024-01-01T00:00:00Z"));

    let catalog = EggCatalog::from_path(fixture_csv()).unwrap();
    let announcement = ShopAnnouncement::render(&snapshot, &catalog);

    assert!(announcement.content.starts_with(ANNOUNCEMENT_HEADER));
    let egg_lines = announcement
        .content
        .lines()
        .filter(|line| line.ends_with(" Egg"))
        .count();
    assert_eq!(egg_lines, 3);
    assert_eq!(announcement.content, announcement.content.trim_end());
}

#[test]
fn test_mentions_are_unique_and_ordered() {
    let snapshot = ShopSnapshot {
        generated_at: None,
        current_shop: vec!["Rock".into(), "Slime".into(), "Rock".into(), "Golden".into()],
    };

    let announcement = ShopAnnouncement::render(&snapshot, &catalog());
    let last_line = announcement.content.lines().last().unwrap();

    assert_eq!(last_line, "<@&901> <@&900>");
    assert!(announcement.content.contains("<:Unknown:999> Rock Egg"));
    assert!(announcement.content.contains("<:Golden:333> Golden Egg"));
}

#[test]
fn test_missing_state_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = ShopSnapshot::from_path(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ShopError::Io { .. }));
}

#[test]
fn test_unparseable_state_file_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shop.json");
    fs::write(&path, "{ truncated").unwrap();

    let err = ShopSnapshot::from_path(&path).unwrap_err();
    assert!(matches!(err, ShopError::CorruptState { .. }));
}
