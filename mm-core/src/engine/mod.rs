//! The tick loop and its supporting subsystems. `Engine` owns State, the
//! Adapter handle(s), and config explicitly (§9 "replace global singletons
//! with an `Engine` struct... pass by explicit reference").

pub mod executor;
pub mod hedge;
pub mod liquidation_guard;
pub mod reconciliation;

pub use executor::Engine;
pub use hedge::HedgeEngine;
pub use liquidation_guard::LiquidationGuard;
pub use reconciliation::ReconciliationGate;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::MMConfig;
use crate::core::types::Symbol;

/// Inputs the quote strategy needs to produce target prices (§4.5).
#[derive(Debug, Clone, Copy)]
pub struct QuoteInputs {
    pub mid: Decimal,
    pub best_bid: Decimal,
    pub best_ask: Decimal,
    pub position: Decimal,
    pub entry_price: Option<Decimal>,
    pub volatility_bps: Decimal,
    pub symbol: Symbol,
}

/// Target quotes and per-side eligibility produced by the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteOutput {
    pub bid_price: Decimal,
    pub ask_price: Decimal,
    pub bid_qty: Decimal,
    pub ask_qty: Decimal,
    pub allow_bid: bool,
    pub allow_ask: bool,
}

/// Converts `(mid, best_bid, best_ask, position, volatility, config)` into
/// target quotes (§4.5). Implemented by `mm-strategies::PriceCalculator`;
/// kept as a trait here so the engine never depends on a concrete pricing
/// crate, mirroring the reference codebase's `Strategy` seam.
pub trait QuoteStrategy: Send + Sync {
    fn compute(&self, inputs: QuoteInputs, cfg: &MMConfig) -> QuoteOutput;
}

/// Read-only status snapshot (§3a `EngineSnapshot`, §6 status query).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub status: crate::core::types::Status,
    pub position: Decimal,
    pub open_orders: Vec<OpenOrderSnapshot>,
    pub volatility_bps: Decimal,
    pub counters: EngineCounters,
    pub last_tick_ts_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOrderSnapshot {
    pub side: crate::core::types::Side,
    pub price: Decimal,
    pub qty: Decimal,
    pub status: crate::core::types::OrderStatus,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineCounters {
    pub ticks: u64,
    pub placements: u64,
    pub cancels: u64,
    pub fills: u64,
    pub hedge_dispatches: u64,
    pub pauses: u64,
    pub resumes: u64,
    pub consecutive_rest_failures: u32,
}
