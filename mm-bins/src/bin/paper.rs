//! Paper-trading entry point: runs the Executor against the bundled
//! `SimulatedAdapter`, feeding it a synthetic depth stream. Useful for
//! integration testing and local development without touching a real
//! venue (§1a, §2a).

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use mm_bins::common::{self, CommonArgs};
use mm_core::adapter::{ExchangeAdapter, OrderBookSnapshot, SimulatedAdapter};
use mm_core::core::types::Symbol;
use mm_core::engine::Engine;
use mm_core::resilience::KillSwitchState;
use mm_core::state::position::AccountSymbol;
use mm_strategies::PriceCalculator;

fn initial_book() -> OrderBookSnapshot {
    OrderBookSnapshot {
        best_bid: dec!(100000.0),
        best_ask: dec!(100002.0),
        levels_bid: vec![(dec!(100000.0), dec!(1)), (dec!(99999.9), dec!(1)), (dec!(99999.8), dec!(1))],
        levels_ask: vec![(dec!(100002.0), dec!(1)), (dec!(100002.1), dec!(1)), (dec!(100002.2), dec!(1))],
    }
}

fn next_book(prev: &OrderBookSnapshot, drift: Decimal) -> OrderBookSnapshot {
    OrderBookSnapshot {
        best_bid: prev.best_bid + drift,
        best_ask: prev.best_ask + drift,
        levels_bid: prev.levels_bid.iter().map(|(p, q)| (*p + drift, *q)).collect(),
        levels_ask: prev.levels_ask.iter().map(|(p, q)| (*p + drift, *q)).collect(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CommonArgs::parse();
    common::init_logging(&args.log_level)?;
    let scaffolding = common::bring_up(&args)?;

    let simulated = Arc::new(SimulatedAdapter::new(initial_book()));
    let adapter: Arc<dyn ExchangeAdapter> = simulated.clone();
    let strategy = Arc::new(PriceCalculator::new());
    let symbol = Symbol {
        tick_size: dec!(0.1),
        qty_step: dec!(0.001),
        min_qty: dec!(0.001),
    };
    let account = AccountSymbol { venue: "paper", symbol: "BTC-USD" };

    let mut engine = Engine::new(adapter, strategy, scaffolding.config_handle.clone(), symbol, account)
        .with_journal(scaffolding.journal.clone())
        .with_metrics(scaffolding.metrics.clone());

    engine.wait_for_initial_book(10).await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let kill_switch = scaffolding.kill_switch;
    tokio::task::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            if kill_switch.state() == KillSwitchState::ShutdownRequested {
                let _ = shutdown_tx.send(true);
                break;
            }
        }
    });

    tokio::task::spawn(async move {
        let mut book = initial_book();
        let mut ts = 0u64;
        loop {
            tokio::time::sleep(std::time::Duration::from_millis(250)).await;
            ts += 250;
            book = next_book(&book, dec!(0.0));
            simulated.push_depth(book.clone(), ts);
        }
    });

    engine.run(shutdown_rx).await;
    Ok(())
}
