//! Hedge Engine (§4.8): runs on its own cooperative task, decoupled from
//! the Executor by a bounded fill-event channel — no back-reference, per
//! the "cyclic reference between Executor and Hedge Engine" design note
//! (§9). Two triggers: fill-driven opposing placement, and a periodic
//! net-exposure sweep.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::adapter::{ExchangeAdapter, FillEvent};
use crate::config::HedgeConfig;
use crate::core::types::Side;

const MAX_RETRIES: u32 = 3;

pub struct HedgeEngine {
    primary: Arc<dyn ExchangeAdapter>,
    hedge: Arc<dyn ExchangeAdapter>,
    fills_rx: mpsc::Receiver<FillEvent>,
    cfg: HedgeConfig,
}

impl HedgeEngine {
    pub fn new(
        primary: Arc<dyn ExchangeAdapter>,
        hedge: Arc<dyn ExchangeAdapter>,
        fills_rx: mpsc::Receiver<FillEvent>,
        cfg: HedgeConfig,
    ) -> Self {
        Self { primary, hedge, fills_rx, cfg }
    }

    /// Runs until the fill channel closes (Executor shutdown). Intended
    /// to be `tokio::task::spawn`ed independently of the Executor tick.
    pub async fn run(mut self) {
        if !self.cfg.enabled {
            info!("hedge engine disabled by config, exiting");
            return;
        }
        let mut sweep = tokio::time::interval(Duration::from_secs(self.cfg.sweep_interval_sec));
        loop {
            tokio::select! {
                fill = self.fills_rx.recv() => {
                    match fill {
                        Some(fill) => self.on_primary_fill(fill).await,
                        None => {
                            info!("fill channel closed, hedge engine stopping");
                            break;
                        }
                    }
                }
                _ = sweep.tick() => {
                    self.sweep().await;
                }
            }
        }
    }

    async fn on_primary_fill(&self, fill: FillEvent) {
        let opposing = fill.side.opposite();
        let deadline = Duration::from_millis(self.cfg.timeout_ms);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = tokio::time::timeout(
                deadline,
                self.hedge.place_order(
                    opposing,
                    fill.price,
                    fill.qty,
                    false,
                    crate::core::types::OrderId::fresh(),
                ),
            )
            .await;
            match result {
                Ok(Ok(_)) => {
                    info!(side = %opposing, qty = %fill.qty, "hedge order placed");
                    return;
                }
                Ok(Err(err)) => {
                    warn!(attempt, error = %err, "hedge placement failed");
                }
                Err(_) => {
                    warn!(attempt, "hedge placement timed out");
                }
            }
            if attempt >= MAX_RETRIES {
                error!(qty = %fill.qty, side = %opposing, "hedge placement exhausted retries");
                return;
            }
            tokio::time::sleep(Duration::from_millis(self.cfg.timeout_ms * attempt as u64)).await;
        }
    }

    async fn sweep(&self) {
        let (primary_pos, hedge_pos) = tokio::join!(self.primary.get_position(), self.hedge.get_position());
        let (primary_pos, hedge_pos) = match (primary_pos, hedge_pos) {
            (Ok(p), Ok(h)) => (p, h),
            _ => {
                warn!("hedge sweep skipped: position query failed");
                return;
            }
        };
        let net = primary_pos + hedge_pos;
        if net.abs() <= self.cfg.max_unhedged {
            return;
        }
        let side = if net > Decimal::ZERO { Side::Sell } else { Side::Buy };
        let qty = net.abs();
        info!(%side, %qty, "hedge sweep reducing net exposure");
        if let Err(err) = self
            .hedge
            .place_order(side, Decimal::ZERO, qty, false, crate::core::types::OrderId::fresh())
            .await
        {
            warn!(error = %err, "hedge sweep placement failed");
        }
    }
}
