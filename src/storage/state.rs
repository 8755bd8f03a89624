//! Persisted shop state
//!
//! The state file is a small JSON record:
//!
//! ```json
//! {
//!   "generated_at": "2024-01-01T00:05:00Z",
//!   "current_shop": ["Slime", "Rock", "Slime"],
//!   "next_shop": ["Rock", "Slime", "Slime"]
//! }
//! ```
//!
//! Writes go to a sibling temp file which is fsynced and renamed over the
//! target, so readers only ever see the old or the new record.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::shop::error::{ShopError, ShopResult};
use crate::shop::model::ShopState;
use crate::shop::slot::SlotInterval;

/// Default state file name
pub const DEFAULT_STATE_FILE: &str = "shop.json";

/// Owns the on-disk representation of [`ShopState`]
#[derive(Debug, Clone)]
pub struct ShopStateStore {
    path: PathBuf,
    interval: SlotInterval,
    shop_size: usize,
}

impl ShopStateStore {
    /// Create a store for `path`, validating records against the given shape
    pub fn new(path: impl Into<PathBuf>, interval: SlotInterval, shop_size: usize) -> Self {
        Self {
            path: path.into(),
            interval,
            shop_size,
        }
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a state file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted state
    ///
    /// A missing file is `Ok(None)`. Content that cannot be parsed, or that
    /// does not fit the configured interval and shop size, is
    /// [`ShopError::CorruptState`]; any other read failure is [`ShopError::Io`].
    pub fn load(&self) -> ShopResult<Option<ShopState>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(self.corrupt(format!("not valid UTF-8: {e}")));
            }
            Err(e) => {
                return Err(ShopError::io_error(
                    format!("read {}", self.path.display()),
                    e,
                ))
            }
        };

        let state: ShopState =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;

        state
            .check_shape(self.interval, self.shop_size)
            .map_err(|reason| self.corrupt(reason))?;

        tracing::debug!(path = %self.path.display(), generated_at = %state.generated_at, "Shop state loaded");
        Ok(Some(state))
    }

    /// Atomically replace the persisted state
    pub fn save(&self, state: &ShopState) -> ShopResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .map_err(|e| ShopError::io_error(format!("create {}", dir.display()), e))?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
        let temp_path = dir.join(format!(".{file_name}.tmp"));

        if let Err(e) = write_synced(&temp_path, state) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            ShopError::io_error(format!("rename onto {}", self.path.display()), e)
        })?;

        tracing::debug!(path = %self.path.display(), generated_at = %state.generated_at, "Shop state saved");
        Ok(())
    }

    fn corrupt(&self, reason: impl Into<String>) -> ShopError {
        ShopError::corrupt_state(self.path.display().to_string(), reason)
    }
}

fn write_synced(path: &Path, state: &ShopState) -> ShopResult<()> {
    let file = File::create(path)
        .map_err(|e| ShopError::io_error(format!("create {}", path.display()), e))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, state)?;
    writer
        .write_all(b"\n")
        .map_err(|e| ShopError::io_error(format!("write {}", path.display()), e))?;

    let file = writer
        .into_inner()
        .map_err(|e| ShopError::io_error(format!("flush {}", path.display()), e.into_error()))?;
    file.sync_all()
        .map_err(|e| ShopError::io_error(format!("sync {}", path.display()), e))?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
