//! In-process `ExchangeAdapter` used for paper trading and tests.
//! Deterministically fills orders against a fed order-book stream: a
//! resting order fills when the book crosses through its price, charging
//! the configured maker fee (it never "taker"-fills itself; orders are
//! always post-only in this adapter, mirroring the quoting core's own
//! post-only placements).

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::errors::AdapterError;
use crate::core::types::{OrderId, OrderStatus, Side};

use super::types::{Ack, FillEvent, OrderBookSnapshot, OrderUpdateEvent, PositionEvent, RemoteOrder, StreamEvent};

/// Maker fee charged by the simulated venue, in basis points.
pub const MAKER_FEE_BPS: Decimal = dec!(-1.0); // rebate
/// Fee charged on a forced `market_close_all`, in basis points.
pub const TAKER_FEE_BPS: Decimal = dec!(4.0);

#[derive(Debug, Clone)]
struct RestingOrder {
    order_id: OrderId,
    side: Side,
    price: Decimal,
    remaining: Decimal,
}

struct Inner {
    book: OrderBookSnapshot,
    resting: Vec<RestingOrder>,
    position: Decimal,
    margin_ratio: Decimal,
    liq_distance_pct: Decimal,
    events: Vec<StreamEvent>,
}

/// Simulated single-account adapter. `push_depth` feeds a new book
/// snapshot, matching any resting orders it crosses and emitting the
/// corresponding `Fill`/`OrderUpdate`/`Position` events for `poll_events`.
pub struct SimulatedAdapter {
    inner: Mutex<Inner>,
    next_order_id: AtomicU64,
}

impl SimulatedAdapter {
    pub fn new(initial_book: OrderBookSnapshot) -> Self {
        Self {
            inner: Mutex::new(Inner {
                book: initial_book,
                resting: Vec::new(),
                position: Decimal::ZERO,
                margin_ratio: Decimal::ONE,
                liq_distance_pct: dec!(100),
                events: Vec::new(),
            }),
            next_order_id: AtomicU64::new(1),
        }
    }

    /// Feeds a new book snapshot, matching resting orders against it.
    pub fn push_depth(&self, book: OrderBookSnapshot, ts_ms: u64) {
        let mut inner = self.inner.lock();
        inner.book = book.clone();

        let mut still_resting = Vec::new();
        let mut fills = Vec::new();
        for order in inner.resting.drain(..) {
            let crossed = match order.side {
                Side::Buy => book.best_ask <= order.price,
                Side::Sell => book.best_bid >= order.price,
            };
            if crossed {
                let fee = order.remaining * order.price * MAKER_FEE_BPS / dec!(10000);
                fills.push(FillEvent {
                    order_id: order.order_id,
                    side: order.side,
                    price: order.price,
                    qty: order.remaining,
                    cum_filled: order.remaining,
                    fee,
                    ts_ms,
                });
                inner.position += order.side.sign() * order.remaining;
            } else {
                still_resting.push(order);
            }
        }
        inner.resting = still_resting;

        inner.events.push(StreamEvent::Depth(book));
        for fill in fills {
            inner.events.push(StreamEvent::OrderUpdate(OrderUpdateEvent {
                order_id: fill.order_id,
                side: fill.side,
                status: OrderStatus::Filled,
                ts_ms,
            }));
            inner.events.push(StreamEvent::Fill(fill));
        }
        let position = inner.position;
        let margin_ratio = inner.margin_ratio;
        let liq_distance_pct = inner.liq_distance_pct;
        inner.events.push(StreamEvent::Position(PositionEvent {
            position,
            margin_ratio,
            liq_distance_pct,
            ts_ms,
        }));
    }

    /// Sets the margin-ratio / liquidation-distance signal reported on the
    /// next `Position` event — used by tests to drive the Liquidation
    /// Guard; a real venue adapter derives these from account state
    /// instead of a manual setter.
    pub fn set_margin_state(&self, margin_ratio: Decimal, liq_distance_pct: Decimal) {
        let mut inner = self.inner.lock();
        inner.margin_ratio = margin_ratio;
        inner.liq_distance_pct = liq_distance_pct;
    }
}

#[async_trait]
impl super::ExchangeAdapter for SimulatedAdapter {
    async fn place_order(
        &self,
        side: Side,
        price: Decimal,
        qty: Decimal,
        post_only: bool,
        client_order_id: OrderId,
    ) -> Result<OrderId, AdapterError> {
        let mut inner = self.inner.lock();
        if post_only {
            let would_cross = match side {
                Side::Buy => price >= inner.book.best_ask,
                Side::Sell => price <= inner.book.best_bid,
            };
            if would_cross {
                return Err(AdapterError::PostOnlyRejected);
            }
        }
        let order_id = OrderId(self.next_order_id.fetch_add(1, Ordering::Relaxed));
        inner.resting.push(RestingOrder {
            order_id,
            side,
            price,
            remaining: qty,
        });
        let _ = client_order_id;
        Ok(order_id)
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<Ack, AdapterError> {
        let mut inner = self.inner.lock();
        let before = inner.resting.len();
        inner.resting.retain(|o| o.order_id != order_id);
        if inner.resting.len() == before {
            return Err(AdapterError::OrderNotFound);
        }
        Ok(Ack)
    }

    async fn list_open_orders(&self) -> Result<Vec<RemoteOrder>, AdapterError> {
        let inner = self.inner.lock();
        Ok(inner
            .resting
            .iter()
            .map(|o| RemoteOrder {
                order_id: o.order_id,
                side: o.side,
                price: o.price,
                remaining_qty: o.remaining,
            })
            .collect())
    }

    async fn get_position(&self) -> Result<Decimal, AdapterError> {
        Ok(self.inner.lock().position)
    }

    async fn get_orderbook(&self, _depth: u32) -> Result<OrderBookSnapshot, AdapterError> {
        Ok(self.inner.lock().book.clone())
    }

    async fn market_close_all(&self) -> Result<Ack, AdapterError> {
        let mut inner = self.inner.lock();
        inner.resting.clear();
        inner.position = Decimal::ZERO;
        Ok(Ack)
    }

    async fn poll_events(&self) -> Vec<StreamEvent> {
        std::mem::take(&mut self.inner.lock().events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ExchangeAdapter;

    fn book(bid: Decimal, ask: Decimal) -> OrderBookSnapshot {
        OrderBookSnapshot {
            best_bid: bid,
            best_ask: ask,
            levels_bid: vec![(bid, dec!(1))],
            levels_ask: vec![(ask, dec!(1))],
        }
    }

    #[tokio::test]
    async fn post_only_order_crossing_book_is_rejected() {
        let adapter = SimulatedAdapter::new(book(dec!(100), dec!(101)));
        let err = adapter
            .place_order(Side::Buy, dec!(101), dec!(0.01), true, OrderId::fresh())
            .await
            .unwrap_err();
        assert_eq!(err, AdapterError::PostOnlyRejected);
    }

    #[tokio::test]
    async fn resting_order_fills_when_book_crosses_through_it() {
        let adapter = SimulatedAdapter::new(book(dec!(100), dec!(101)));
        adapter
            .place_order(Side::Buy, dec!(100), dec!(0.01), true, OrderId::fresh())
            .await
            .unwrap();
        adapter.push_depth(book(dec!(99), dec!(99.5)), 1);

        let events = adapter.poll_events().await;
        let filled = events
            .iter()
            .any(|e| matches!(e, StreamEvent::Fill(f) if f.qty == dec!(0.01)));
        assert!(filled);
        assert_eq!(adapter.get_position().await.unwrap(), dec!(0.01));
    }

    #[tokio::test]
    async fn cancel_of_unknown_order_returns_not_found() {
        let adapter = SimulatedAdapter::new(book(dec!(100), dec!(101)));
        let err = adapter.cancel_order(OrderId(999)).await.unwrap_err();
        assert_eq!(err, AdapterError::OrderNotFound);
        assert!(err.is_benign_on_cancel());
    }
}
