//! Egg catalog loaded from CSV
//!
//! The catalog file has a header row with these columns:
//!
//! | Column       | Required | Meaning                                   |
//! |--------------|----------|-------------------------------------------|
//! | `EggName`    | yes      | Unique egg name                           |
//! | `PullChance` | yes      | Relative weight, `>= 0`                   |
//! | `EmojiID`    | no       | Custom emoji id used in announcements     |
//! | `RoleID`     | no       | Role pinged when the egg is in the shop   |
//!
//! Rows keep their file order, which the sampler relies on. Rows with a
//! `PullChance` of zero (such as the `Unknown` fallback row) stay in the
//! catalog for lookups but never enter the weight table.

use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::shop::{ShopError, WeightTable, WeightedItem};

/// Name of the row whose emoji stands in for eggs without one
pub const UNKNOWN_EGG: &str = "Unknown";

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while loading a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be opened
    #[error("Failed to open egg catalog '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV structure or field types are wrong
    #[error("Malformed egg catalog at row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    /// A row parsed but its values are unusable
    #[error("Invalid egg catalog row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    /// The rows do not form a usable weight table
    #[error("Invalid weight table: {0}")]
    Table(#[from] ShopError),
}

#[derive(Debug, Deserialize)]
struct EggRow {
    #[serde(rename = "EggName")]
    name: String,

    #[serde(rename = "PullChance")]
    chance: f64,

    #[serde(rename = "EmojiID", default)]
    emoji_id: Option<String>,

    #[serde(rename = "RoleID", default)]
    role_id: Option<String>,
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct EggInfo {
    /// Egg name
    pub name: String,

    /// Relative pull weight
    pub chance: f64,

    /// Custom emoji id, if any
    pub emoji_id: Option<String>,

    /// Role id to mention, if any
    pub role_id: Option<String>,
}

impl EggInfo {
    /// Chat markup for this egg's emoji
    pub fn emoji(&self) -> Option<String> {
        self.emoji_id
            .as_ref()
            .map(|id| format!("<:{}:{}>", self.name, id))
    }

    /// Chat markup mentioning this egg's role
    pub fn mention(&self) -> Option<String> {
        self.role_id.as_ref().map(|id| format!("<@&{id}>"))
    }
}

/// Catalog of eggs with their weights and chat metadata
#[derive(Debug, Clone)]
pub struct EggCatalog {
    eggs: Vec<EggInfo>,
    table: WeightTable,
}

impl EggCatalog {
    /// Load a catalog from a CSV file
    pub fn from_path(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let catalog = Self::from_reader(file)?;
        tracing::debug!(
            path = %path.display(),
            eggs = catalog.len(),
            weighted = catalog.table().len(),
            "Egg catalog loaded"
        );
        Ok(catalog)
    }

    /// Load a catalog from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> CatalogResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut eggs: Vec<EggInfo> = Vec::new();
        for (index, result) in csv_reader.deserialize::<EggRow>().enumerate() {
            let row = index + 1;
            let parsed = result.map_err(|source| CatalogError::Csv { row, source })?;
            eggs.push(validate_row(row, parsed, &eggs)?);
        }

        let weighted = eggs
            .iter()
            .filter(|egg| egg.chance > 0.0)
            .map(|egg| WeightedItem::new(egg.name.clone(), egg.chance))
            .collect();
        let table = WeightTable::new(weighted)?;

        Ok(Self { eggs, table })
    }

    /// Weight table of every egg with a positive chance, in file order
    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    /// Every catalog entry, in file order
    pub fn eggs(&self) -> &[EggInfo] {
        &self.eggs
    }

    /// Number of catalog entries
    pub fn len(&self) -> usize {
        self.eggs.len()
    }

    /// Whether the catalog has no entries
    pub fn is_empty(&self) -> bool {
        self.eggs.is_empty()
    }

    /// Look up an egg by name
    pub fn get(&self, name: &str) -> Option<&EggInfo> {
        self.eggs.iter().find(|egg| egg.name == name)
    }

    /// Emoji markup for `name`, falling back to the `Unknown` row's emoji
    pub fn emoji_for(&self, name: &str) -> Option<String> {
        self.get(name)
            .and_then(EggInfo::emoji)
            .or_else(|| self.get(UNKNOWN_EGG).and_then(EggInfo::emoji))
    }

    /// Role mention markup for `name`
    pub fn mention_for(&self, name: &str) -> Option<String> {
        self.get(name).and_then(EggInfo::mention)
    }
}

fn validate_row(row: usize, parsed: EggRow, seen: &[EggInfo]) -> CatalogResult<EggInfo> {
    if parsed.name.is_empty() {
        return Err(CatalogError::InvalidRow {
            row,
            reason: "EggName is empty".to_string(),
        });
    }

    if !parsed.chance.is_finite() || parsed.chance < 0.0 {
        return Err(CatalogError::InvalidRow {
            row,
            reason: format!("PullChance for '{}' must be >= 0, got {}", parsed.name, parsed.chance),
        });
    }

    if seen.iter().any(|egg| egg.name == parsed.name) {
        return Err(CatalogError::InvalidRow {
            row,
            reason: format!("duplicate EggName '{}'", parsed.name),
        });
    }

    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    Ok(EggInfo {
        name: parsed.name,
        chance: parsed.chance,
        emoji_id: non_blank(parsed.emoji_id),
        role_id: non_blank(parsed.role_id),
    })
}

// ============================================================================
// Tests
// ============================================================================
