use std::path::PathBuf;

use eggshop::error::Result;
use eggshop::shop::{PriorState, SlotInterval, TimeSlot};
use eggshop::storage::ShopStateStore;

/// Print the persisted shop state and how it relates to the current slot
pub async fn show(output: PathBuf, interval: SlotInterval, shop_size: usize) -> Result<()> {
    let store = ShopStateStore::new(&output, interval, shop_size);

    let Some(state) = store.load()? else {
        println!("No shop state at {}", output.display());
        println!("Run 'eggshop rotate' first to create it.");
        return Ok(());
    };

    let now = TimeSlot::containing(chrono::Utc::now(), interval);
    let prior = PriorState::classify(Some(&state), now, interval);

    println!("Shop state: {}", output.display());
    println!("================================");
    println!("Generated at: {}", state.generated_at);
    println!("Current shop: {}", state.current_shop);
    println!("Next shop:    {} (from {})", state.next_shop, state.next_slot(interval));
    println!("Status:       {prior} relative to {now}");

    Ok(())
}
