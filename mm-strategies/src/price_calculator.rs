//! Price Calculator: converts `(mid, best_bid, best_ask, position,
//! volatility, config)` into target quotes. Base distance → inventory
//! skew → break-even reversion → volatility widening → tick alignment →
//! quantity → soft-stop gates, in that order.

use mm_core::config::MMConfig;
use mm_core::core::types::Side;
use mm_core::engine::{QuoteInputs, QuoteOutput, QuoteStrategy};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Default, Clone, Copy)]
pub struct PriceCalculator;

impl PriceCalculator {
    pub fn new() -> Self {
        Self
    }

    fn base_distance(&self, inputs: &QuoteInputs, cfg: &MMConfig) -> (Decimal, Decimal) {
        use mm_core::config::StrategyMode;
        match cfg.quote.strategy_mode {
            StrategyMode::Uptime => {
                let d = cfg.quote.order_distance_bps;
                let bid = inputs.mid * (Decimal::ONE - d / dec!(10000));
                let ask = inputs.mid * (Decimal::ONE + d / dec!(10000));
                (bid, ask)
            }
            StrategyMode::Rebate => (inputs.best_bid, inputs.best_ask),
        }
    }

    fn apply_inventory_skew(&self, bid: Decimal, ask: Decimal, inputs: &QuoteInputs, cfg: &MMConfig) -> (Decimal, Decimal) {
        if !cfg.inventory_skew.enabled || cfg.position.max_position == Decimal::ZERO {
            return (bid, ask);
        }
        let r = (inputs.position / cfg.position.max_position).clamp(-Decimal::ONE, Decimal::ONE);
        let push = cfg.inventory_skew.push_bps;
        let pull = cfg.inventory_skew.pull_bps;

        let bid_adj = (r * push - r.min(Decimal::ZERO) * pull) / dec!(10000);
        let ask_adj = (r * push + r.min(Decimal::ZERO) * pull) / dec!(10000);

        (bid * (Decimal::ONE - bid_adj), ask * (Decimal::ONE + ask_adj))
    }

    /// §4.5a: nudge the closing side toward the weighted-average entry
    /// price so round-trips do not lock in a loss. Flat positions skip.
    fn apply_break_even_reversion(&self, bid: Decimal, ask: Decimal, inputs: &QuoteInputs, cfg: &MMConfig) -> (Decimal, Decimal) {
        let Some(entry_price) = inputs.entry_price else {
            return (bid, ask);
        };
        if inputs.position == Decimal::ZERO {
            return (bid, ask);
        }
        let cap = cfg.quote.order_distance_bps * inputs.mid / dec!(10000);

        if inputs.position > Decimal::ZERO && ask < entry_price {
            let nudge = (entry_price - ask).min(cap);
            return (bid, ask + nudge);
        }
        if inputs.position < Decimal::ZERO && bid > entry_price {
            let nudge = (bid - entry_price).min(cap);
            return (bid - nudge, ask);
        }
        (bid, ask)
    }

    /// §4.5 step 4: linearly widen both sides up to 2x once volatility
    /// exceeds 0.7x the pause threshold.
    fn apply_volatility_widening(&self, bid: Decimal, ask: Decimal, mid: Decimal, inputs: &QuoteInputs, cfg: &MMConfig) -> (Decimal, Decimal) {
        let trigger = cfg.volatility.pause_threshold_bps * dec!(0.7);
        if inputs.volatility_bps <= trigger || cfg.volatility.pause_threshold_bps == Decimal::ZERO {
            return (bid, ask);
        }
        let excess = (inputs.volatility_bps - trigger) / (cfg.volatility.pause_threshold_bps - trigger).max(dec!(0.0001));
        let factor = (Decimal::ONE + excess.min(Decimal::ONE)).min(dec!(2));
        let bid_dist = (mid - bid) * factor;
        let ask_dist = (ask - mid) * factor;
        (mid - bid_dist, mid + ask_dist)
    }
}

impl QuoteStrategy for PriceCalculator {
    fn compute(&self, inputs: QuoteInputs, cfg: &MMConfig) -> QuoteOutput {
        let (bid, ask) = self.base_distance(&inputs, cfg);
        let (bid, ask) = self.apply_inventory_skew(bid, ask, &inputs, cfg);
        let (bid, ask) = self.apply_break_even_reversion(bid, ask, &inputs, cfg);
        let (bid, ask) = self.apply_volatility_widening(bid, ask, inputs.mid, &inputs, cfg);

        // Tick alignment: bid rounds down, ask rounds up; suppress a side
        // that would not leave room inside the book.
        let bid_price = inputs.symbol.round_down(bid);
        let ask_price = inputs.symbol.round_up(ask);
        let bid_valid = bid_price < inputs.best_ask;
        let ask_valid = ask_price > inputs.best_bid;

        let qty = inputs.symbol.round_qty(cfg.position.order_size);

        let mut allow_bid = bid_valid;
        let mut allow_ask = ask_valid;

        // Soft-stop gates (§4.5 step 7): keep the wrong-way side open for
        // de-risking when the position has reached its cap on one side.
        if inputs.position >= cfg.position.max_position {
            allow_bid = false;
        }
        if inputs.position <= -cfg.position.max_position {
            allow_ask = false;
        }

        QuoteOutput {
            bid_price,
            ask_price,
            bid_qty: qty,
            ask_qty: qty,
            allow_bid,
            allow_ask,
        }
    }
}

#[allow(dead_code)]
fn side_label(side: Side) -> &'static str {
    match side {
        Side::Buy => "bid",
        Side::Sell => "ask",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::core::types::Symbol;
    use proptest::prelude::*;

    fn symbol() -> Symbol {
        Symbol {
            tick_size: dec!(0.1),
            qty_step: dec!(0.001),
            min_qty: dec!(0.001),
        }
    }

    fn base_inputs() -> QuoteInputs {
        QuoteInputs {
            mid: dec!(100001.0),
            best_bid: dec!(100000.0),
            best_ask: dec!(100002.0),
            position: Decimal::ZERO,
            entry_price: None,
            volatility_bps: Decimal::ZERO,
            symbol: symbol(),
        }
    }

    /// Scenario 1 of §8: cold start on an empty book. `mid * (1 - 8bps) =
    /// 99920.9992`, floored to the 0.1 tick; `mid * (1 + 8bps) =
    /// 100081.0008`, ceiled to the tick.
    #[test]
    fn cold_start_quotes_match_documented_scenario() {
        let mut cfg = MMConfig::default();
        cfg.inventory_skew.enabled = false;
        let calc = PriceCalculator::new();
        let out = calc.compute(base_inputs(), &cfg);

        assert_eq!(out.bid_price, dec!(99920.9));
        assert_eq!(out.ask_price, dec!(100081.1));
        assert!(out.allow_bid);
        assert!(out.allow_ask);
    }

    /// Scenario 2 of §8: a bid fill skews the next quote further away.
    #[test]
    fn positive_inventory_skews_bid_further_away() {
        let cfg = MMConfig::default();
        let calc = PriceCalculator::new();
        let mut inputs = base_inputs();
        inputs.position = dec!(0.01);
        let out = calc.compute(inputs, &cfg);

        let flat_out = calc.compute(base_inputs(), &cfg);
        assert!(out.bid_price < flat_out.bid_price);
    }

    #[test]
    fn soft_stop_disables_bid_at_max_position() {
        let cfg = MMConfig::default();
        let calc = PriceCalculator::new();
        let mut inputs = base_inputs();
        inputs.position = cfg.position.max_position;
        let out = calc.compute(inputs, &cfg);
        assert!(!out.allow_bid);
        assert!(out.allow_ask);
    }

    #[test]
    fn break_even_reversion_pulls_ask_toward_entry_when_long_and_underwater() {
        let mut cfg = MMConfig::default();
        cfg.inventory_skew.enabled = false;
        let calc = PriceCalculator::new();
        let mut inputs = base_inputs();
        inputs.position = dec!(0.01);
        inputs.entry_price = Some(dec!(100200));
        let out = calc.compute(inputs, &cfg);

        let mut no_reversion_inputs = base_inputs();
        no_reversion_inputs.position = dec!(0.01);
        let baseline = calc.compute(no_reversion_inputs, &cfg);

        assert!(out.ask_price > baseline.ask_price);
    }

    #[test]
    fn flat_position_skips_break_even_reversion() {
        let cfg = MMConfig::default();
        let calc = PriceCalculator::new();
        let mut inputs = base_inputs();
        inputs.entry_price = Some(dec!(90000));
        let out = calc.compute(inputs, &cfg);
        let baseline = calc.compute(base_inputs(), &cfg);
        assert_eq!(out.ask_price, baseline.ask_price);
    }

    #[test]
    fn high_volatility_widens_both_sides() {
        let mut cfg = MMConfig::default();
        cfg.inventory_skew.enabled = false;
        let calc = PriceCalculator::new();
        let mut inputs = base_inputs();
        inputs.volatility_bps = dec!(6);
        let out = calc.compute(inputs, &cfg);
        let baseline = calc.compute(base_inputs(), &cfg);
        assert!(out.bid_price < baseline.bid_price);
        assert!(out.ask_price > baseline.ask_price);
    }

    proptest! {
        /// Regardless of position magnitude, the soft-stop gate never
        /// leaves both sides disabled, and never allows the side that
        /// would grow a position already at or beyond its cap.
        #[test]
        fn soft_stop_gate_never_grows_a_capped_side(position_hundredths in -10i64..=10i64) {
            let cfg = MMConfig::default();
            let calc = PriceCalculator::new();
            let mut inputs = base_inputs();
            inputs.position = cfg.position.max_position * Decimal::new(position_hundredths, 1);
            let out = calc.compute(inputs, &cfg);

            if inputs.position >= cfg.position.max_position {
                prop_assert!(!out.allow_bid);
            }
            if inputs.position <= -cfg.position.max_position {
                prop_assert!(!out.allow_ask);
            }
        }
    }
}
