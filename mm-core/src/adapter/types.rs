//! Wire-level DTOs exchanged with an `ExchangeAdapter`: order book
//! snapshots, remote order listings, and the tagged-union `StreamEvent`
//! that replaces "dynamic dicts for events" (§9) in the drain loop.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::core::types::{OrderId, Side};

/// A top-of-book-anchored depth snapshot. Levels are sorted best-first on
/// each side; `levels_bid`/`levels_ask` are used by the queue-position
/// approximation of §4.6a.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub best_bid: Decimal,
    pub best_ask: Decimal,
    pub levels_bid: Vec<(Decimal, Decimal)>,
    pub levels_ask: Vec<(Decimal, Decimal)>,
}

impl OrderBookSnapshot {
    pub fn mid(&self) -> Decimal {
        (self.best_bid + self.best_ask) / dec!(2)
    }

    /// True iff `price` sits within the first `limit` levels of the side
    /// opposite to `side` — the market has moved through a resting order
    /// quoted at `price` on `side` (§4.6a).
    pub fn within_opposing_top_levels(&self, side: Side, price: Decimal, limit: u32) -> bool {
        let levels = match side {
            Side::Buy => &self.levels_ask,
            Side::Sell => &self.levels_bid,
        };
        levels
            .iter()
            .take(limit as usize)
            .any(|(level_price, _)| match side {
                Side::Buy => price >= *level_price,
                Side::Sell => price <= *level_price,
            })
    }
}

/// One order as reported by `list_open_orders` — the authoritative remote
/// view the Reconciliation Gate diffs against local state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteOrder {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Decimal,
    pub remaining_qty: Decimal,
}

/// A private fill notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Decimal,
    pub qty: Decimal,
    pub cum_filled: Decimal,
    pub fee: Decimal,
    pub ts_ms: u64,
}

/// A private order-status transition, independent of a fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdateEvent {
    pub order_id: OrderId,
    pub side: Side,
    pub status: crate::core::types::OrderStatus,
    pub ts_ms: u64,
}

/// A private position snapshot/delta. Carries the margin-ratio and
/// liquidation-distance signal the Liquidation Guard (§4.9) consumes;
/// venues with no margin concept (or the simulated adapter) report
/// values that never breach (`margin_ratio = 1`, `liq_distance_pct` huge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEvent {
    pub position: Decimal,
    pub margin_ratio: Decimal,
    pub liq_distance_pct: Decimal,
    pub ts_ms: u64,
}

/// Tagged union covering every stream the Adapter can push. The drain loop
/// (§4.7 step 1) matches on this exhaustively instead of inspecting a
/// dynamically-typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    Depth(OrderBookSnapshot),
    OrderUpdate(OrderUpdateEvent),
    Fill(FillEvent),
    Position(PositionEvent),
}

/// Result of a cancel or close-all call: success or a benign not-found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack;
