pub mod announce;
pub mod preview;
pub mod rotate;
pub mod show;

use std::path::PathBuf;

use eggshop::catalog::EggCatalog;
use eggshop::error::{Error, Result};
use eggshop::shop::{SecretKey, ShopGenerator, SlotInterval};

// Re-export command functions for convenience
pub use announce::{announce, AnnounceParams};
pub use preview::{preview, PreviewParams};
pub use rotate::{rotate, watch, RotateParams};
pub use show::show;

/// Settings every shop-computing command needs
#[derive(Debug, Clone)]
pub struct ShopParams {
    pub secret_key: SecretKey,
    pub eggs_csv: PathBuf,
    pub interval: SlotInterval,
    pub shop_size: usize,
}

impl ShopParams {
    /// Load the catalog and build a generator over its weight table
    pub fn generator(&self) -> Result<ShopGenerator> {
        if self.secret_key.is_empty() {
            return Err(Error::config(
                "secret key is empty; set --secret-key or EGGSHOP_SECRET_KEY",
            ));
        }

        let catalog = EggCatalog::from_path(&self.eggs_csv)?;

        Ok(ShopGenerator::new(
            self.secret_key.clone(),
            catalog.table().clone(),
            self.shop_size,
        )?)
    }
}
