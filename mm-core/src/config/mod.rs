//! `MMConfig` loading and the atomic snapshot handle the Executor reads
//! from. Config is loaded once from a JSON file (or defaults), optionally
//! overlaid with CLI flags, validated, then wrapped in a `ConfigHandle` that
//! swaps the whole struct atomically — the Executor never observes a
//! partially-updated config mid-tick (§3, §9 "runtime toggles").

pub mod types;

pub use types::{
    ExecutionConfig, HedgeConfig, InventorySkewConfig, LiquidationGuardConfig, MMConfig,
    PositionConfig, QuoteConfig, StrategyMode, VolatilityConfig,
};

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use parking_lot::RwLock;
use rust_decimal::Decimal;

/// CLI flags that overlay a loaded `MMConfig`. Every field is optional;
/// only flags the operator actually passed override the file/defaults.
#[derive(Debug, Args, Default)]
pub struct ConfigOverlay {
    #[arg(long)]
    pub order_distance_bps: Option<Decimal>,
    #[arg(long)]
    pub order_size: Option<Decimal>,
    #[arg(long)]
    pub max_position: Option<Decimal>,
    #[arg(long)]
    pub hard_stop_position: Option<Decimal>,
    #[arg(long)]
    pub resume_position: Option<Decimal>,
    #[arg(long)]
    pub hedge_enabled: Option<bool>,
}

impl ConfigOverlay {
    pub fn apply(&self, cfg: &mut MMConfig) {
        if let Some(v) = self.order_distance_bps {
            cfg.quote.order_distance_bps = v;
        }
        if let Some(v) = self.order_size {
            cfg.position.order_size = v;
        }
        if let Some(v) = self.max_position {
            cfg.position.max_position = v;
        }
        if let Some(v) = self.hard_stop_position {
            cfg.position.hard_stop_position = v;
        }
        if let Some(v) = self.resume_position {
            cfg.position.resume_position = v;
        }
        if let Some(v) = self.hedge_enabled {
            cfg.hedge.enabled = v;
        }
    }
}

/// Loads `MMConfig` from a JSON file, falling back to `MMConfig::default()`
/// when the path does not exist (useful for the `paper` binary's quick
/// start), then validates.
pub fn load<P: AsRef<Path>>(path: P) -> Result<MMConfig> {
    let path = path.as_ref();
    let cfg = if path.exists() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?
    } else {
        MMConfig::default()
    };
    cfg.validate().context("validating loaded config")?;
    Ok(cfg)
}

/// Thread-safe config snapshot. `current()` is cheap (an `Arc` clone) and
/// is called exactly once per tick, at tick start; `swap` is called by the
/// control surface's `update_config` and takes effect on the next tick.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Arc<MMConfig>>>,
}

impl ConfigHandle {
    pub fn new(cfg: MMConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(cfg))),
        }
    }

    /// Snapshot to use for the duration of one tick.
    pub fn current(&self) -> Arc<MMConfig> {
        self.inner.read().clone()
    }

    /// Replace the whole config. Effective starting with the next
    /// `current()` call, never mid-tick.
    pub fn swap(&self, cfg: MMConfig) {
        *self.inner.write() = Arc::new(cfg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let cfg = load("/nonexistent/path/does-not-exist.json").unwrap();
        assert_eq!(cfg, MMConfig::default());
    }

    #[test]
    fn overlay_only_touches_passed_fields() {
        let mut cfg = MMConfig::default();
        let overlay = ConfigOverlay {
            order_size: Some(dec!(0.02)),
            ..Default::default()
        };
        overlay.apply(&mut cfg);
        assert_eq!(cfg.position.order_size, dec!(0.02));
        assert_eq!(cfg.quote.order_distance_bps, MMConfig::default().quote.order_distance_bps);
    }

    #[test]
    fn handle_swap_is_visible_to_next_current_call() {
        let handle = ConfigHandle::new(MMConfig::default());
        let mut next = (*handle.current()).clone();
        next.position.order_size = dec!(0.03);
        handle.swap(next);
        assert_eq!(handle.current().position.order_size, dec!(0.03));
    }
}
