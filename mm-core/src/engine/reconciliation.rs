//! REST Reconciliation Gate (§4.6): runs once per tick, before any
//! placement, diffing the local `OrderInfo` slots against the venue's
//! authoritative `list_open_orders` reply.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::adapter::{ExchangeAdapter, RemoteOrder};
use crate::core::types::{OrderStatus, Side};
use crate::state::MmState;

/// Consecutive `list_open_orders` failures at or above this threshold
/// enter Safe Mode for the tick (§4.6 step 1).
pub const SAFE_MODE_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOutcome {
    pub safe_mode: bool,
    pub no_remote: HashMap<Side, bool>,
}

impl GateOutcome {
    pub fn no_remote(&self, side: Side) -> bool {
        self.no_remote.get(&side).copied().unwrap_or(true)
    }
}

pub struct ReconciliationGate {
    consecutive_rest_failures: u32,
    disappear_grace_sec: u64,
}

impl ReconciliationGate {
    pub fn new(disappear_grace_sec: u64) -> Self {
        Self {
            consecutive_rest_failures: 0,
            disappear_grace_sec,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_rest_failures
    }

    pub fn set_disappear_grace(&mut self, grace_sec: u64) {
        self.disappear_grace_sec = grace_sec;
    }

    /// Runs the gate for one tick. Cancels orphan/duplicate remote orders
    /// directly; never places new ones (placement eligibility is decided
    /// by the Executor from the returned `GateOutcome`).
    pub async fn run(&mut self, adapter: &dyn ExchangeAdapter, state: &mut MmState) -> GateOutcome {
        let remote = match adapter.list_open_orders().await {
            Ok(orders) => {
                self.consecutive_rest_failures = 0;
                orders
            }
            Err(err) => {
                self.consecutive_rest_failures += 1;
                warn!(error = %err, consecutive = self.consecutive_rest_failures, "list_open_orders failed");
                if self.consecutive_rest_failures >= SAFE_MODE_THRESHOLD {
                    return GateOutcome {
                        safe_mode: true,
                        no_remote: HashMap::new(),
                    };
                }
                // Below threshold: treat as "no information this tick",
                // leave existing local orders untouched, forbid new
                // placement by reporting no side as remote-empty.
                let mut no_remote = HashMap::new();
                no_remote.insert(Side::Buy, false);
                no_remote.insert(Side::Sell, false);
                return GateOutcome { safe_mode: false, no_remote };
            }
        };

        let mut by_side: HashMap<Side, Vec<RemoteOrder>> = HashMap::new();
        for order in remote {
            by_side.entry(order.side).or_default().push(order);
        }

        let mut no_remote = HashMap::new();
        for side in [Side::Buy, Side::Sell] {
            let remotes = by_side.remove(&side).unwrap_or_default();
            no_remote.insert(side, remotes.is_empty());
            self.reconcile_side(adapter, state, side, remotes).await;
        }

        GateOutcome { safe_mode: false, no_remote }
    }

    async fn reconcile_side(
        &mut self,
        adapter: &dyn ExchangeAdapter,
        state: &mut MmState,
        side: Side,
        mut remotes: Vec<RemoteOrder>,
    ) {
        let local_order_id = state.order(side).and_then(|o| o.order_id);

        match (remotes.len(), local_order_id) {
            (0, Some(_)) => {
                // Remote empty, local Open/Pending: local order is gone.
                if let Some(info) = state.orders.get_mut(&side) {
                    if info.is_resting() && info.note_disappeared(self.disappear_grace_sec) {
                        info!(?side, "order disappeared from remote beyond grace window");
                        info.status = OrderStatus::CanceledOrUnknown;
                        state.clear_order(side);
                    }
                }
            }
            (0, None) => {}
            (_, None) => {
                // Orphan order(s): no local knowledge of any order on this
                // side. Cancel all of them; never adopt.
                for remote in remotes {
                    warn!(?side, order_id = %remote.order_id, "cancelling orphan remote order");
                    let _ = adapter.cancel_order(remote.order_id).await;
                }
            }
            (_, Some(local_id)) => {
                // Keep the one matching local_id (if present); cancel the
                // rest, including duplicates.
                let keep_idx = remotes.iter().position(|r| r.order_id == local_id);
                let kept = keep_idx.is_some();
                for (idx, remote) in remotes.drain(..).enumerate() {
                    if Some(idx) == keep_idx {
                        continue;
                    }
                    warn!(?side, order_id = %remote.order_id, "cancelling extra/duplicate remote order");
                    let _ = adapter.cancel_order(remote.order_id).await;
                }
                if kept {
                    if let Some(info) = state.orders.get_mut(&side) {
                        info.note_seen_remote();
                    }
                } else if let Some(info) = state.orders.get_mut(&side) {
                    if info.note_disappeared(self.disappear_grace_sec) {
                        info.status = OrderStatus::CanceledOrUnknown;
                        state.clear_order(side);
                    }
                }
            }
        }
    }
}
