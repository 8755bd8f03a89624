use chrono::Utc;

use eggshop::error::Result;
use eggshop::shop::{derive_seed, TimeSlot};

use super::ShopParams;

/// Parameters for `preview`
#[derive(Debug, Clone)]
pub struct PreviewParams {
    pub shop: ShopParams,
    /// RFC 3339 timestamp; the current time when absent
    pub at: Option<String>,
    pub count: u32,
}

/// Print the shops for one or more slots without touching the state file
pub async fn preview(params: PreviewParams) -> Result<()> {
    let interval = params.shop.interval;
    let generator = params.shop.generator()?;

    let first = match &params.at {
        Some(at) => TimeSlot::parse_floor(at, interval)?,
        None => TimeSlot::containing(Utc::now(), interval),
    };

    let count = params.count.max(1);
    let shops = generator.shops_from(first, interval, count)?;

    println!("Shop preview ({interval} slots)");
    println!("================================");
    for (slot, shop) in &shops {
        let seed = derive_seed(params.shop.secret_key.expose(), *slot);
        println!("{slot}  seed {seed}  {shop}");
    }

    Ok(())
}
