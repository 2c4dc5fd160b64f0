//! `OrderInfo`: the locally-tracked lifecycle of one resting order. Only
//! the Executor mutates it; the Reconciliation Gate reads and transitions
//! it against the remote view.

use std::time::Instant;

use rust_decimal::Decimal;

use crate::core::types::{OrderId, OrderStatus, Side};

#[derive(Debug, Clone)]
pub struct OrderInfo {
    pub client_order_id: OrderId,
    pub order_id: Option<OrderId>,
    pub side: Side,
    pub price: Decimal,
    pub qty: Decimal,
    pub cum_filled: Decimal,
    pub status: OrderStatus,
    pub placed_at: Instant,
    pub last_seen_remote_at: Option<Instant>,
    pub disappeared_since: Option<Instant>,
}

impl OrderInfo {
    pub fn new_pending(side: Side, price: Decimal, qty: Decimal) -> Self {
        Self {
            client_order_id: OrderId::fresh(),
            order_id: None,
            side,
            price,
            qty,
            cum_filled: Decimal::ZERO,
            status: OrderStatus::Pending,
            placed_at: Instant::now(),
            last_seen_remote_at: None,
            disappeared_since: None,
        }
    }

    pub fn remaining(&self) -> Decimal {
        (self.qty - self.cum_filled).max(Decimal::ZERO)
    }

    pub fn mark_open(&mut self, order_id: OrderId) {
        self.order_id = Some(order_id);
        self.status = OrderStatus::Open;
        self.last_seen_remote_at = Some(Instant::now());
        self.disappeared_since = None;
    }

    pub fn apply_fill(&mut self, cum_filled: Decimal) {
        self.cum_filled = cum_filled;
        self.status = if self.remaining() == Decimal::ZERO {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }

    /// Marks the order as missing from the latest `list_open_orders` reply.
    /// Returns `true` once it has been missing longer than `grace_sec`
    /// without an explanatory fill, i.e. it should be declared gone.
    pub fn note_disappeared(&mut self, grace_sec: u64) -> bool {
        let since = *self.disappeared_since.get_or_insert_with(Instant::now);
        since.elapsed().as_secs() >= grace_sec
    }

    pub fn note_seen_remote(&mut self) {
        self.last_seen_remote_at = Some(Instant::now());
        self.disappeared_since = None;
        if self.status == OrderStatus::Pending {
            self.status = OrderStatus::Open;
        }
    }

    pub fn is_resting(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Pending | OrderStatus::Open | OrderStatus::PartiallyFilled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fill_transitions_to_filled_when_remaining_hits_zero() {
        let mut info = OrderInfo::new_pending(Side::Buy, dec!(100), dec!(0.01));
        info.apply_fill(dec!(0.01));
        assert_eq!(info.status, OrderStatus::Filled);
        assert_eq!(info.remaining(), Decimal::ZERO);
    }

    #[test]
    fn partial_fill_keeps_order_resting() {
        let mut info = OrderInfo::new_pending(Side::Buy, dec!(100), dec!(0.01));
        info.apply_fill(dec!(0.004));
        assert_eq!(info.status, OrderStatus::PartiallyFilled);
        assert!(info.is_resting());
    }

    #[test]
    fn seeing_remote_clears_disappearance_and_promotes_pending() {
        let mut info = OrderInfo::new_pending(Side::Buy, dec!(100), dec!(0.01));
        info.note_disappeared(5);
        assert!(info.disappeared_since.is_some());
        info.note_seen_remote();
        assert!(info.disappeared_since.is_none());
        assert_eq!(info.status, OrderStatus::Open);
    }
}
