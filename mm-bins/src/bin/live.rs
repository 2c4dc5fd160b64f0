//! Live-trading entry point. Venue connectivity — HTTP signing, WebSocket
//! framing, reconnection — is an external collaborator out of this
//! engine's scope (§1); this binary wires the Executor to whatever
//! `ExchangeAdapter` the deployment supplies. `UnconfiguredAdapter` below
//! is the integration seam: swap it for a real venue implementation
//! before running this binary against a live account.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use mm_bins::common::{self, CommonArgs};
use mm_core::adapter::{Ack, ExchangeAdapter, OrderBookSnapshot, RemoteOrder, StreamEvent};
use mm_core::core::errors::AdapterError;
use mm_core::core::types::{OrderId, Side, Symbol};
use mm_core::engine::Engine;
use mm_core::state::position::AccountSymbol;
use mm_strategies::PriceCalculator;

/// Placeholder `ExchangeAdapter` that fails every call with `Transient`.
/// Exists so `live` compiles and demonstrates the wiring without
/// fabricating a fake venue integration; real deployments replace this
/// with a concrete adapter for their venue.
struct UnconfiguredAdapter;

#[async_trait]
impl ExchangeAdapter for UnconfiguredAdapter {
    async fn place_order(&self, _: Side, _: Decimal, _: Decimal, _: bool, _: OrderId) -> Result<OrderId, AdapterError> {
        Err(AdapterError::Transient("no venue adapter configured".into()))
    }
    async fn cancel_order(&self, _: OrderId) -> Result<Ack, AdapterError> {
        Err(AdapterError::Transient("no venue adapter configured".into()))
    }
    async fn list_open_orders(&self) -> Result<Vec<RemoteOrder>, AdapterError> {
        Err(AdapterError::Transient("no venue adapter configured".into()))
    }
    async fn get_position(&self) -> Result<Decimal, AdapterError> {
        Err(AdapterError::Transient("no venue adapter configured".into()))
    }
    async fn get_orderbook(&self, _: u32) -> Result<OrderBookSnapshot, AdapterError> {
        Err(AdapterError::Transient("no venue adapter configured".into()))
    }
    async fn market_close_all(&self) -> Result<Ack, AdapterError> {
        Err(AdapterError::Transient("no venue adapter configured".into()))
    }
    async fn poll_events(&self) -> Vec<StreamEvent> {
        Vec::new()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CommonArgs::parse();
    common::init_logging(&args.log_level)?;
    let scaffolding = common::bring_up(&args)?;

    let adapter: Arc<dyn ExchangeAdapter> = Arc::new(UnconfiguredAdapter);
    let strategy = Arc::new(PriceCalculator::new());
    let symbol = Symbol {
        tick_size: dec!(0.1),
        qty_step: dec!(0.001),
        min_qty: dec!(0.001),
    };
    let account = AccountSymbol { venue: "live", symbol: "BTC-USD" };

    let mut engine = Engine::new(adapter, strategy, scaffolding.config_handle.clone(), symbol, account)
        .with_journal(scaffolding.journal.clone())
        .with_metrics(scaffolding.metrics.clone());

    tracing::warn!("running with UnconfiguredAdapter: substitute a real venue ExchangeAdapter before trading live");

    engine.wait_for_initial_book(10).await?;
    let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    engine.run(shutdown_rx).await;
    Ok(())
}
