//! Engine Snapshot Dumper
//!
//! Runs the Executor against the bundled `SimulatedAdapter` for a fixed
//! number of ticks and prints one JSON-line `EngineSnapshot` per tick.
//! Useful for debugging quote behavior and CI smoke checks without a
//! terminal UI.
//!
//! ## Usage
//!
//! ```bash
//! mm-status --ticks 20
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use rust_decimal_macros::dec;

use mm_core::adapter::{ExchangeAdapter, OrderBookSnapshot, SimulatedAdapter};
use mm_core::config::ConfigHandle;
use mm_core::core::types::Symbol;
use mm_core::engine::Engine;
use mm_core::state::position::AccountSymbol;
use mm_strategies::PriceCalculator;

#[derive(Parser)]
#[command(name = "mm-status")]
#[command(about = "Dump EngineSnapshot JSON lines from a simulated run", long_about = None)]
struct Args {
    /// Number of ticks to run before exiting.
    #[arg(short, long, default_value = "20")]
    ticks: u32,
}

fn initial_book() -> OrderBookSnapshot {
    OrderBookSnapshot {
        best_bid: dec!(100000.0),
        best_ask: dec!(100002.0),
        levels_bid: vec![(dec!(100000.0), dec!(1)), (dec!(99999.9), dec!(1)), (dec!(99999.8), dec!(1))],
        levels_ask: vec![(dec!(100002.0), dec!(1)), (dec!(100002.1), dec!(1)), (dec!(100002.2), dec!(1))],
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let args = Args::parse();

    let simulated = Arc::new(SimulatedAdapter::new(initial_book()));
    let adapter: Arc<dyn ExchangeAdapter> = simulated.clone();
    let strategy = Arc::new(PriceCalculator::new());
    let symbol = Symbol {
        tick_size: dec!(0.1),
        qty_step: dec!(0.001),
        min_qty: dec!(0.001),
    };
    let account = AccountSymbol { venue: "status", symbol: "BTC-USD" };
    let config_handle = ConfigHandle::new(Default::default());

    let mut engine = Engine::new(adapter, strategy, config_handle, symbol, account);
    engine.wait_for_initial_book(10).await?;

    for tick in 0..args.ticks {
        engine.tick().await;
        let snapshot = engine.snapshot();
        println!("{}", serde_json::to_string(&snapshot)?);
        if tick + 1 < args.ticks {
            simulated.push_depth(initial_book(), (tick as u64 + 1) * 250);
        }
    }

    Ok(())
}
