//! Domain types shared by every layer of the engine: sides, order
//! identifiers, symbol metadata, and the top-level run `Status`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monotonically increasing local order identifier, distinct from the
/// venue-assigned `order_id` returned by `ExchangeAdapter::place_order`.
///
/// Generated per-process; never persisted, never compared across restarts.
static NEXT_CLIENT_ORDER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl OrderId {
    /// Allocates a fresh client order id. Cheap, lock-free, process-unique.
    pub fn fresh() -> Self {
        Self(NEXT_CLIENT_ORDER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Sign applied to a signed position delta for a fill on this side.
    pub fn sign(self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => -Decimal::ONE,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Open,
    PartiallyFilled,
    Filled,
    CanceledOrUnknown,
}

/// Immutable symbol metadata, fetched once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub tick_size: Decimal,
    pub qty_step: Decimal,
    pub min_qty: Decimal,
}

impl Symbol {
    /// Round a price down to the nearest `tick_size`.
    pub fn round_down(&self, price: Decimal) -> Decimal {
        (price / self.tick_size).floor() * self.tick_size
    }

    /// Round a price up to the nearest `tick_size`.
    pub fn round_up(&self, price: Decimal) -> Decimal {
        (price / self.tick_size).ceil() * self.tick_size
    }

    /// Round a quantity to the nearest `qty_step`, never below `min_qty`.
    pub fn round_qty(&self, qty: Decimal) -> Decimal {
        let stepped = (qty / self.qty_step).round() * self.qty_step;
        stepped.max(self.min_qty)
    }
}

/// Why the engine is currently `Paused`. Ordered by precedence:
/// `LiquidationGuard > HardStop > VolatilityHigh`; a lower-precedence
/// reason never overwrites a higher one that is still latched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseReason {
    VolatilityHigh,
    HardStop,
    LiquidationGuard,
    OperatorStop,
    AdapterUnhealthy,
}

impl PauseReason {
    fn precedence(self) -> u8 {
        match self {
            PauseReason::VolatilityHigh => 0,
            PauseReason::AdapterUnhealthy => 1,
            PauseReason::OperatorStop => 2,
            PauseReason::HardStop => 3,
            PauseReason::LiquidationGuard => 4,
        }
    }

    /// True if `self` is allowed to replace `current` as the latched reason.
    pub fn supersedes(self, current: PauseReason) -> bool {
        self.precedence() >= current.precedence()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Running,
    Paused(PauseReason),
    Stopped,
}

impl Status {
    pub fn is_running(&self) -> bool {
        matches!(self, Status::Running)
    }

    pub fn pause_reason(&self) -> Option<PauseReason> {
        match self {
            Status::Paused(r) => Some(*r),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Running => write!(f, "running"),
            Status::Paused(r) => write!(f, "paused({r:?})"),
            Status::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_order_ids_are_unique_and_increasing() {
        let a = OrderId::fresh();
        let b = OrderId::fresh();
        assert!(b.0 > a.0);
    }

    #[test]
    fn pause_precedence_blocks_downgrade() {
        assert!(PauseReason::HardStop.supersedes(PauseReason::VolatilityHigh));
        assert!(!PauseReason::VolatilityHigh.supersedes(PauseReason::HardStop));
        assert!(PauseReason::LiquidationGuard.supersedes(PauseReason::HardStop));
    }

    #[test]
    fn symbol_rounding_respects_tick_and_step() {
        let sym = Symbol {
            tick_size: Decimal::new(1, 1),
            qty_step: Decimal::new(1, 2),
            min_qty: Decimal::new(1, 2),
        };
        assert_eq!(sym.round_down(Decimal::new(12345, 3)), Decimal::new(123, 1));
        assert_eq!(sym.round_up(Decimal::new(12301, 3)), Decimal::new(124, 1));
        assert_eq!(sym.round_qty(Decimal::new(3, 3)), sym.min_qty);
    }
}
