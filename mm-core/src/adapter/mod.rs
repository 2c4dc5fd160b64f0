//! `ExchangeAdapter`: the uniform capability surface a venue integration
//! must expose. One instance is held per account (primary, hedge) as
//! `Arc<dyn ExchangeAdapter>`; the object-safe `async_trait` form lets the
//! Executor hold both behind a single trait object without generics
//! leaking through the engine.

pub mod simulated;
pub mod types;

pub use simulated::SimulatedAdapter;
pub use types::{Ack, FillEvent, OrderBookSnapshot, OrderUpdateEvent, PositionEvent, RemoteOrder, StreamEvent};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core::errors::AdapterError;
use crate::core::types::{OrderId, Side};

/// Per-call deadline. Every Adapter method is expected to honour this and
/// return `AdapterError::Unknown` rather than hang past it (§5).
pub const DEFAULT_DEADLINE_MS: u64 = 2000;

#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Submits a limit order. On success the venue has accepted it; on
    /// `PostOnlyRejected` no order exists. A timeout surfaces as
    /// `AdapterError::Unknown` and must be reconciled by the caller.
    async fn place_order(
        &self,
        side: Side,
        price: Decimal,
        qty: Decimal,
        post_only: bool,
        client_order_id: OrderId,
    ) -> Result<OrderId, AdapterError>;

    /// Idempotent: cancelling an order the venue has already forgotten
    /// returns `Ok` via `AdapterError::OrderNotFound` being treated as
    /// benign by the caller (see `AdapterError::is_benign_on_cancel`).
    async fn cancel_order(&self, order_id: OrderId) -> Result<Ack, AdapterError>;

    /// Authoritative open-orders snapshot, consulted by the Reconciliation
    /// Gate every tick.
    async fn list_open_orders(&self) -> Result<Vec<RemoteOrder>, AdapterError>;

    /// Signed position for this account, positive = long.
    async fn get_position(&self) -> Result<Decimal, AdapterError>;

    /// Best-effort REST fallback for the order book, used when the
    /// streamed snapshot is stale beyond a threshold (§4.7 step 7).
    async fn get_orderbook(&self, depth: u32) -> Result<OrderBookSnapshot, AdapterError>;

    /// Used by hard-stop and the Liquidation Guard to flatten immediately.
    async fn market_close_all(&self) -> Result<Ack, AdapterError>;

    /// Drains whatever stream events have arrived since the last call.
    /// The Executor's drain step (§4.7 step 1) calls this once per tick;
    /// implementations buffer internally and never block here.
    async fn poll_events(&self) -> Vec<StreamEvent>;
}
