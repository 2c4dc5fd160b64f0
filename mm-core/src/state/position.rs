//! Signed position per (venue, symbol), with fill-weighted average entry
//! price tracking — the same entry price §4.5a's break-even reversion
//! formula nudges the closing side toward.

use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::core::types::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountSymbol {
    pub venue: &'static str,
    pub symbol: &'static str,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PositionEntry {
    pub qty: Decimal,
    pub entry_price: Decimal,
}

/// `positions : (venue, symbol) → signed decimal` of §3, generalized to
/// carry a fill-weighted entry price alongside the signed quantity.
#[derive(Debug, Default)]
pub struct PositionBook {
    entries: DashMap<AccountSymbol, PositionEntry>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, key: AccountSymbol) -> Decimal {
        self.entries.get(&key).map(|e| e.qty).unwrap_or(Decimal::ZERO)
    }

    pub fn entry_price(&self, key: AccountSymbol) -> Option<Decimal> {
        self.entries.get(&key).and_then(|e| {
            if e.qty == Decimal::ZERO {
                None
            } else {
                Some(e.entry_price)
            }
        })
    }

    /// Applies a fill, updating signed quantity and the weighted-average
    /// entry price. Reducing or flipping a position resets the weighted
    /// average for the remaining (or newly opened) side.
    pub fn apply_fill(&self, key: AccountSymbol, side: Side, price: Decimal, qty: Decimal) {
        let mut entry = self.entries.entry(key).or_default();
        let delta = side.sign() * qty;
        let new_qty = entry.qty + delta;

        let same_direction = entry.qty == Decimal::ZERO
            || (entry.qty > Decimal::ZERO && delta > Decimal::ZERO)
            || (entry.qty < Decimal::ZERO && delta < Decimal::ZERO);
        let crossed_flat = (entry.qty > Decimal::ZERO && new_qty < Decimal::ZERO)
            || (entry.qty < Decimal::ZERO && new_qty > Decimal::ZERO);

        if same_direction {
            let old_notional = entry.entry_price * entry.qty.abs();
            let add_notional = price * qty;
            let total_qty = entry.qty.abs() + qty;
            entry.entry_price = if total_qty == Decimal::ZERO {
                Decimal::ZERO
            } else {
                (old_notional + add_notional) / total_qty
            };
        } else if crossed_flat {
            // Flipped through flat: the surviving quantity is a fresh
            // position opened at this fill's price.
            entry.entry_price = price;
        } else if new_qty == Decimal::ZERO {
            entry.entry_price = Decimal::ZERO;
        }
        entry.qty = new_qty;
    }

    pub fn set_position(&self, key: AccountSymbol, qty: Decimal) {
        let mut entry = self.entries.entry(key).or_default();
        entry.qty = qty;
        if qty == Decimal::ZERO {
            entry.entry_price = Decimal::ZERO;
        }
    }
}
