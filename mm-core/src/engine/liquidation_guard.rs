//! Liquidation Guard (§4.9): a one-shot latch. Once margin ratio or
//! distance-to-liquidation breaches the configured thresholds, the engine
//! stays `Paused(LiquidationGuard)` until an operator explicitly clears
//! it — grounded on the reference codebase's manual-reset-only circuit
//! breaker pattern, narrowed from retry/half-open semantics to a pure
//! latch since liquidation is not a condition to probe-and-retry past.

use rust_decimal::Decimal;

use crate::config::LiquidationGuardConfig;

pub struct LiquidationGuard {
    fired: bool,
}

impl LiquidationGuard {
    pub fn new() -> Self {
        Self { fired: false }
    }

    pub fn is_fired(&self) -> bool {
        self.fired
    }

    /// Evaluates the latest margin ratio / liquidation distance signal.
    /// Returns `true` the instant it transitions from unfired to fired;
    /// once fired it stays fired regardless of subsequent inputs.
    pub fn check(&mut self, margin_ratio: Decimal, liq_distance_pct: Decimal, cfg: &LiquidationGuardConfig) -> bool {
        if self.fired {
            return false;
        }
        let breached =
            margin_ratio <= cfg.margin_ratio_threshold || liq_distance_pct <= cfg.liq_distance_threshold_pct;
        if breached {
            self.fired = true;
        }
        breached
    }

    /// Operator-initiated clear. The only way to leave the fired state.
    pub fn clear(&mut self) {
        self.fired = false;
    }
}

impl Default for LiquidationGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cfg() -> LiquidationGuardConfig {
        LiquidationGuardConfig {
            margin_ratio_threshold: dec!(0.1),
            liq_distance_threshold_pct: dec!(1.0),
        }
    }

    #[test]
    fn stays_unfired_above_both_thresholds() {
        let mut guard = LiquidationGuard::new();
        assert!(!guard.check(dec!(0.5), dec!(5.0), &cfg()));
        assert!(!guard.is_fired());
    }

    #[test]
    fn fires_once_and_latches() {
        let mut guard = LiquidationGuard::new();
        assert!(guard.check(dec!(0.05), dec!(5.0), &cfg()));
        assert!(guard.is_fired());
        // A subsequent healthy reading does not un-fire it.
        assert!(!guard.check(dec!(0.5), dec!(5.0), &cfg()));
        assert!(guard.is_fired());
    }

    #[test]
    fn operator_clear_resets_the_latch() {
        let mut guard = LiquidationGuard::new();
        guard.check(dec!(0.05), dec!(5.0), &cfg());
        guard.clear();
        assert!(!guard.is_fired());
    }
}
