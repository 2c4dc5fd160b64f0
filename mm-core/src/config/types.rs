//! Declarative runtime configuration. `MMConfig` is loaded once at startup
//! and then snapshotted at tick boundaries (see `config::mod`); nothing in
//! `mm-core` ever reads a config field mid-tick.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyMode {
    /// Quote at a fixed distance from mid.
    Uptime,
    /// Join the top of book to capture rebates.
    Rebate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteConfig {
    pub order_distance_bps: Decimal,
    pub cancel_distance_bps: Decimal,
    pub rebalance_distance_bps: Decimal,
    pub queue_position_limit: u32,
    pub strategy_mode: StrategyMode,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            order_distance_bps: dec!(8),
            cancel_distance_bps: dec!(3),
            rebalance_distance_bps: dec!(4),
            queue_position_limit: 3,
            strategy_mode: StrategyMode::Uptime,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionConfig {
    pub order_size: Decimal,
    pub max_position: Decimal,
    pub hard_stop_position: Decimal,
    pub resume_position: Decimal,
    pub hard_stop_cooldown_sec: u64,
    pub resume_confirm_count: u32,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            order_size: dec!(0.01),
            max_position: dec!(0.05),
            hard_stop_position: dec!(0.035),
            resume_position: dec!(0.02),
            hard_stop_cooldown_sec: 30,
            resume_confirm_count: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityConfig {
    pub window_sec: u64,
    pub pause_threshold_bps: Decimal,
    pub resume_threshold_bps: Decimal,
    pub stable_seconds: u64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            window_sec: 2,
            pause_threshold_bps: dec!(5),
            resume_threshold_bps: dec!(3),
            stable_seconds: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub tick_interval_ms: u64,
    pub order_throttle_sec: u64,
    pub disappear_grace_sec: u64,
    pub event_dedup_ttl_sec: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            order_throttle_sec: 1,
            disappear_grace_sec: 5,
            event_dedup_ttl_sec: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeConfig {
    pub enabled: bool,
    pub max_unhedged: Decimal,
    pub sweep_interval_sec: u64,
    pub timeout_ms: u64,
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_unhedged: dec!(0.005),
            sweep_interval_sec: 10,
            timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationGuardConfig {
    pub margin_ratio_threshold: Decimal,
    pub liq_distance_threshold_pct: Decimal,
}

impl Default for LiquidationGuardConfig {
    fn default() -> Self {
        Self {
            margin_ratio_threshold: dec!(0.1),
            liq_distance_threshold_pct: dec!(1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySkewConfig {
    pub enabled: bool,
    pub push_bps: Decimal,
    pub pull_bps: Decimal,
}

impl Default for InventorySkewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            push_bps: dec!(6),
            pull_bps: dec!(4),
        }
    }
}

/// The full declarative configuration for one symbol's quoting engine.
///
/// Swapped atomically at tick boundaries by `config::ConfigHandle` — a
/// partial `update_config` call (§6) never takes effect mid-tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MMConfig {
    pub quote: QuoteConfig,
    pub position: PositionConfig,
    pub volatility: VolatilityConfig,
    pub execution: ExecutionConfig,
    pub hedge: HedgeConfig,
    pub liquidation_guard: LiquidationGuardConfig,
    pub inventory_skew: InventorySkewConfig,
}

impl MMConfig {
    /// Sanity checks that must hold before a config is handed to the engine.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.quote.order_distance_bps > Decimal::ZERO,
            "quote.order_distance_bps must be positive"
        );
        anyhow::ensure!(
            self.position.order_size > Decimal::ZERO,
            "position.order_size must be positive"
        );
        anyhow::ensure!(
            self.position.order_size <= self.position.max_position,
            "position.order_size must not exceed position.max_position"
        );
        anyhow::ensure!(
            self.position.resume_position < self.position.hard_stop_position,
            "position.resume_position must be below position.hard_stop_position"
        );
        anyhow::ensure!(
            self.position.hard_stop_position <= self.position.max_position,
            "position.hard_stop_position must not exceed position.max_position"
        );
        anyhow::ensure!(
            self.volatility.resume_threshold_bps < self.volatility.pause_threshold_bps,
            "volatility.resume_threshold_bps must be below pause_threshold_bps"
        );
        anyhow::ensure!(
            self.execution.tick_interval_ms > 0,
            "execution.tick_interval_ms must be positive"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        MMConfig::default().validate().unwrap();
    }

    #[test]
    fn default_config_matches_documented_scenario_literals() {
        let cfg = MMConfig::default();
        assert_eq!(cfg.quote.order_distance_bps, dec!(8));
        assert_eq!(cfg.position.order_size, dec!(0.01));
        assert_eq!(cfg.position.max_position, dec!(0.05));
        assert_eq!(cfg.position.hard_stop_position, dec!(0.035));
        assert_eq!(cfg.position.resume_position, dec!(0.02));
    }

    #[test]
    fn rejects_order_size_above_max_position() {
        let mut cfg = MMConfig::default();
        cfg.position.order_size = dec!(1);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_resume_above_hard_stop() {
        let mut cfg = MMConfig::default();
        cfg.position.resume_position = cfg.position.hard_stop_position;
        assert!(cfg.validate().is_err());
    }
}
