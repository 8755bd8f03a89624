use std::path::PathBuf;

use eggshop::error::{Error, Result};
use eggshop::shop::{RotationEngine, RotationOutcome, TimeSlotClock};
use eggshop::storage::ShopStateStore;

use super::ShopParams;

/// Parameters for `rotate` and `watch`
#[derive(Debug, Clone)]
pub struct RotateParams {
    pub shop: ShopParams,
    pub output: PathBuf,
    pub wait_for_boundary: bool,
}

fn build_engine(params: &RotateParams) -> Result<RotationEngine> {
    let generator = params.shop.generator()?;
    let store = ShopStateStore::new(
        &params.output,
        params.shop.interval,
        params.shop.shop_size,
    );
    let clock = TimeSlotClock::system(params.shop.interval);

    Ok(RotationEngine::new(generator, store, clock).with_wait_for_boundary(params.wait_for_boundary))
}

fn print_outcome(outcome: &RotationOutcome) {
    println!("Slot:         {}", outcome.slot);
    println!("Prior state:  {}", outcome.prior);
    println!("Transition:   {}", outcome.transition);
    println!("Current shop: {}", outcome.state.current_shop);
    println!("Next shop:    {}", outcome.state.next_shop);
    if !outcome.written {
        println!("State file unchanged");
    }
}

/// Run the rotation once
pub async fn rotate(params: RotateParams) -> Result<()> {
    let engine = build_engine(&params)?;

    let outcome = tokio::select! {
        result = engine.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            return Err(Error::other("Interrupted before the shop state was written"));
        }
    };

    println!("Egg shop rotation");
    println!("=================");
    print_outcome(&outcome);
    Ok(())
}

/// Run the rotation at every slot boundary until interrupted
pub async fn watch(params: RotateParams, max_runs: Option<usize>) -> Result<()> {
    let engine = build_engine(&params)?;

    tracing::info!(
        interval = %params.shop.interval,
        output = %params.output.display(),
        max_runs = ?max_runs,
        "Watching slot boundaries"
    );

    let report = |outcome: &RotationOutcome| {
        print_outcome(outcome);
        println!();
    };

    tokio::select! {
        result = engine.watch(max_runs, report) => {
            let runs = result?;
            println!("Completed {runs} rotation(s)");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, stopping watch");
        }
    }

    Ok(())
}
