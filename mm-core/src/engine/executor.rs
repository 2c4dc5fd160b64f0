//! Executor (§4.7): the main loop. Drives ticks at a fixed cadence,
//! sequences Stream drain → hard-stop/liquidation/volatility gates →
//! Price Calculator → Reconciliation Gate → placement. Single-threaded
//! cooperative: a tick runs to completion before the next begins (§5).

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::adapter::{ExchangeAdapter, OrderBookSnapshot, StreamEvent};
use crate::config::{ConfigHandle, MMConfig};
use crate::core::types::{OrderId, PauseReason, Side, Status, Symbol};
use crate::journal::{Journal, OperationLogEntry};
use crate::metrics::Metrics;
use crate::state::position::AccountSymbol;
use crate::state::MmState;

use super::liquidation_guard::LiquidationGuard;
use super::reconciliation::ReconciliationGate;
use super::{EngineCounters, EngineSnapshot, OpenOrderSnapshot, QuoteInputs, QuoteStrategy};

pub struct Engine {
    adapter: Arc<dyn ExchangeAdapter>,
    strategy: Arc<dyn QuoteStrategy>,
    config: ConfigHandle,
    state: MmState,
    gate: ReconciliationGate,
    symbol: Symbol,
    account: AccountSymbol,

    status: Status,
    hard_stop_entered_at: Option<Instant>,
    resume_confirm_counter: u32,
    guard: LiquidationGuard,
    latest_margin_ratio: Decimal,
    latest_liq_distance_pct: Decimal,

    cached_book: Option<OrderBookSnapshot>,
    fills_tx: Option<mpsc::Sender<crate::adapter::FillEvent>>,
    journal: Option<Arc<Journal>>,
    metrics: Option<Arc<Metrics>>,
    counters: EngineCounters,
}

impl Engine {
    pub fn new(
        adapter: Arc<dyn ExchangeAdapter>,
        strategy: Arc<dyn QuoteStrategy>,
        config: ConfigHandle,
        symbol: Symbol,
        account: AccountSymbol,
    ) -> Self {
        let cfg = config.current();
        Self {
            adapter,
            strategy,
            gate: ReconciliationGate::new(cfg.execution.disappear_grace_sec),
            state: MmState::new(cfg.execution.event_dedup_ttl_sec, cfg.volatility.window_sec),
            config,
            symbol,
            account,
            status: Status::Running,
            hard_stop_entered_at: None,
            resume_confirm_counter: 0,
            guard: LiquidationGuard::new(),
            latest_margin_ratio: Decimal::ONE,
            latest_liq_distance_pct: dec!(100),
            cached_book: None,
            fills_tx: None,
            journal: None,
            metrics: None,
            counters: EngineCounters::default(),
        }
    }

    pub fn with_hedge_channel(mut self, tx: mpsc::Sender<crate::adapter::FillEvent>) -> Self {
        self.fills_tx = Some(tx);
        self
    }

    pub fn with_journal(mut self, journal: Arc<Journal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Waits for an initial valid order-book snapshot before the first
    /// tick (§4.7a), rather than ticking against an empty/invalid book.
    pub async fn wait_for_initial_book(&mut self, max_attempts: u32) -> anyhow::Result<()> {
        let mut delay = Duration::from_millis(100);
        for attempt in 1..=max_attempts {
            match self.adapter.get_orderbook(10).await {
                Ok(book) if book.best_ask > book.best_bid && book.best_bid > Decimal::ZERO => {
                    self.cached_book = Some(book);
                    return Ok(());
                }
                _ => {
                    warn!(attempt, "no valid order book yet, retrying");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(5));
                }
            }
        }
        anyhow::bail!("no valid order book after {max_attempts} attempts")
    }

    /// Runs ticks forever at `execution.tick_interval_ms` cadence until
    /// `shutdown` resolves.
    pub async fn run(&mut self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            let interval_ms = self.config.current().execution.tick_interval_ms;
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(interval_ms)) => {
                    self.tick().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("shutdown signalled, draining orders");
                        self.cancel_all_and_wait().await;
                        self.status = Status::Stopped;
                        break;
                    }
                }
            }
        }
    }

    #[instrument(skip(self), fields(symbol = self.account.symbol, tick = self.counters.ticks))]
    pub async fn tick(&mut self) {
        self.counters.ticks += 1;
        let cfg = self.config.current();

        // 1. Stream drain.
        self.drain_events(&cfg).await;

        // 2/3. Hard-stop resume / entry checks.
        self.check_hard_stop(&cfg).await;

        // 4. Liquidation Guard.
        self.check_liquidation_guard(&cfg).await;

        // 5. Volatility pause/resume.
        self.check_volatility(&cfg).await;

        if let Some(metrics) = &self.metrics {
            metrics.observe_tick(self.status, self.position());
        }

        // 6. If not Running, end tick.
        if !self.status.is_running() {
            return;
        }

        // 7. Fetch order book (cached from drain; fall back to REST).
        let book = match &self.cached_book {
            Some(book) => book.clone(),
            None => match self.adapter.get_orderbook(10).await {
                Ok(book) => {
                    self.cached_book = Some(book.clone());
                    book
                }
                Err(err) => {
                    warn!(error = %err, "order book fetch failed, skipping tick");
                    return;
                }
            },
        };

        // 8. Price Calculator.
        let inputs = QuoteInputs {
            mid: book.mid(),
            best_bid: book.best_bid,
            best_ask: book.best_ask,
            position: self.position(),
            entry_price: self.state.positions.entry_price(self.account),
            volatility_bps: self.state.volatility.current_bps(),
            symbol: self.symbol,
        };
        let quote = self.strategy.compute(inputs, &cfg);

        // 9. Decide which resting orders need cancelling.
        self.reprice_or_cancel(&book, &quote, &cfg).await;

        // 10. REST Reconciliation Gate.
        let outcome = self.gate.run(self.adapter.as_ref(), &mut self.state).await;
        self.counters.consecutive_rest_failures = self.gate.consecutive_failures();
        if outcome.safe_mode {
            warn!("safe mode: skipping placement this tick");
            return;
        }

        // 11. Place allowed side(s).
        self.place_if_eligible(Side::Buy, quote.allow_bid, quote.bid_price, quote.bid_qty, &outcome, &cfg)
            .await;
        self.place_if_eligible(Side::Sell, quote.allow_ask, quote.ask_price, quote.ask_qty, &outcome, &cfg)
            .await;
    }

    fn position(&self) -> Decimal {
        self.state.positions.position(self.account)
    }

    async fn drain_events(&mut self, cfg: &MMConfig) {
        for event in self.adapter.poll_events().await {
            match event {
                StreamEvent::Depth(book) => {
                    self.state.volatility.record(book.mid());
                    self.cached_book = Some(book);
                }
                StreamEvent::OrderUpdate(update) => {
                    if let Some(info) = self.state.orders.get_mut(&update.side) {
                        if info.client_order_id == update.order_id || info.order_id == Some(update.order_id) {
                            info.status = update.status;
                        }
                    }
                }
                StreamEvent::Fill(fill) => {
                    if self.state.dedup.check_and_insert(fill.order_id, fill.cum_filled) {
                        continue;
                    }
                    if let Some(info) = self.state.orders.get_mut(&fill.side) {
                        info.apply_fill(fill.cum_filled);
                        if info.remaining() == Decimal::ZERO {
                            self.state.clear_order(fill.side);
                        }
                    }
                    self.state.positions.apply_fill(self.account, fill.side, fill.price, fill.qty);
                    self.counters.fills += 1;
                    self.journal_append("fill", Some(fill.side), Some(fill.price), "fill applied");
                    if let Some(tx) = &self.fills_tx {
                        let _ = tx.try_send(fill);
                    }
                }
                StreamEvent::Position(pos_event) => {
                    self.state.positions.set_position(self.account, pos_event.position);
                    self.latest_margin_ratio = pos_event.margin_ratio;
                    self.latest_liq_distance_pct = pos_event.liq_distance_pct;
                }
            }
        }
        let _ = cfg;
    }

    async fn check_hard_stop(&mut self, cfg: &MMConfig) {
        let position = self.position().abs();

        if self.status == Status::Paused(PauseReason::HardStop) {
            let entered_at = self.hard_stop_entered_at.unwrap_or_else(Instant::now);
            if entered_at.elapsed().as_secs() < cfg.position.hard_stop_cooldown_sec {
                return;
            }
            if position < cfg.position.resume_position {
                self.resume_confirm_counter += 1;
                if self.resume_confirm_counter >= cfg.position.resume_confirm_count {
                    info!("hard-stop resume confirmed, returning to Running");
                    self.status = Status::Running;
                    self.resume_confirm_counter = 0;
                    self.counters.resumes += 1;
                    self.journal_append("resume", None, None, "hard-stop resumed");
                }
            } else {
                self.resume_confirm_counter = 0;
            }
            return;
        }

        if self.status.is_running() && position >= cfg.position.hard_stop_position {
            warn!(%position, "hard-stop threshold breached");
            self.enter_pause(PauseReason::HardStop).await;
            self.hard_stop_entered_at = Some(Instant::now());
        }
    }

    /// §4.7 step 4 / §4.9: evaluates the latest margin-ratio /
    /// liquidation-distance signal folded in during drain. On breach,
    /// pauses (cancelling all resting orders) and flattens the account.
    async fn check_liquidation_guard(&mut self, cfg: &MMConfig) {
        if !self
            .guard
            .check(self.latest_margin_ratio, self.latest_liq_distance_pct, &cfg.liquidation_guard)
        {
            return;
        }
        warn!(
            margin_ratio = %self.latest_margin_ratio,
            liq_distance_pct = %self.latest_liq_distance_pct,
            "liquidation guard breached"
        );
        self.enter_pause(PauseReason::LiquidationGuard).await;
        match self.adapter.market_close_all().await {
            Ok(_) => self.journal_append("market_close_all", None, None, "liquidation guard"),
            Err(err) => warn!(error = %err, "market_close_all failed"),
        }
    }

    async fn check_volatility(&mut self, cfg: &MMConfig) {
        if self.status.is_running() && self.state.volatility.should_pause(cfg.volatility.pause_threshold_bps) {
            warn!(bps = %self.state.volatility.current_bps(), "volatility pause threshold breached");
            self.enter_pause(PauseReason::VolatilityHigh).await;
            self.state.volatility.reset_resume_hysteresis();
            return;
        }
        if self.status == Status::Paused(PauseReason::VolatilityHigh)
            && self
                .state
                .volatility
                .should_resume(cfg.volatility.resume_threshold_bps, cfg.volatility.stable_seconds)
        {
            info!("volatility stable, resuming");
            self.status = Status::Running;
            self.counters.resumes += 1;
            self.journal_append("resume", None, None, "volatility resumed");
        }
    }

    /// Sets `Paused(reason)`, respecting pause-reason precedence
    /// (`LiquidationGuard > HardStop > VolatilityHigh`, §4.7), and cancels
    /// all resting orders at the transition itself — the Reconciliation
    /// Gate never runs while paused (tick step 6 returns first), so it
    /// cannot be relied on to clean up a pause entry. Returns whether a
    /// transition actually happened (a lower-precedence reason is a no-op).
    async fn enter_pause(&mut self, reason: PauseReason) -> bool {
        if let Status::Paused(current) = self.status {
            if !reason.supersedes(current) {
                return false;
            }
        }
        self.status = Status::Paused(reason);
        self.counters.pauses += 1;
        self.journal_append("pause", None, None, &format!("{reason:?}"));
        self.cancel_all_resting().await;
        true
    }

    /// Cancels every locally-tracked Open/Pending order and clears the
    /// corresponding slots. Used both on pause entry and on shutdown.
    async fn cancel_all_resting(&mut self) {
        let sides: Vec<Side> = self.state.orders.keys().copied().collect();
        for side in sides {
            if let Some(order_id) = self.state.order(side).and_then(|o| o.order_id) {
                match self.adapter.cancel_order(order_id).await {
                    Ok(_) => {
                        self.counters.cancels += 1;
                        self.journal_append("cancel", Some(side), None, "pause transition");
                    }
                    Err(err) if err.is_benign_on_cancel() => {}
                    Err(err) => warn!(%side, error = %err, "cancel failed on pause transition"),
                }
            }
        }
        self.state.orders.clear();
    }

    async fn reprice_or_cancel(&mut self, book: &OrderBookSnapshot, quote: &super::QuoteOutput, cfg: &MMConfig) {
        for side in [Side::Buy, Side::Sell] {
            let Some(info) = self.state.orders.get(&side).cloned() else {
                continue;
            };
            if !info.is_resting() {
                continue;
            }
            let mid = book.mid();
            let target = if side == Side::Buy { quote.bid_price } else { quote.ask_price };

            let at_risk = book.within_opposing_top_levels(side, info.price, cfg.quote.queue_position_limit);
            let adverse_distance_bps = match side {
                Side::Buy => (book.best_ask - info.price) / mid * Decimal::from(10000),
                Side::Sell => (info.price - book.best_bid) / mid * Decimal::from(10000),
            };
            let should_cancel_adverse = at_risk || adverse_distance_bps <= cfg.quote.cancel_distance_bps;

            let drift_bps = ((target - info.price) / mid * Decimal::from(10000)).abs();
            let should_rebalance = drift_bps >= cfg.quote.rebalance_distance_bps;

            if should_cancel_adverse || should_rebalance {
                if let Some(order_id) = info.order_id {
                    match self.adapter.cancel_order(order_id).await {
                        Ok(_) => {
                            self.counters.cancels += 1;
                            self.journal_append("cancel", Some(side), Some(info.price), "repriced/at-risk");
                        }
                        Err(err) if err.is_benign_on_cancel() => {}
                        Err(err) => warn!(%side, error = %err, "cancel failed"),
                    }
                }
                self.state.clear_order(side);
            }
        }
    }

    async fn place_if_eligible(
        &mut self,
        side: Side,
        allowed: bool,
        price: Decimal,
        qty: Decimal,
        gate: &super::reconciliation::GateOutcome,
        cfg: &MMConfig,
    ) {
        if !allowed || !gate.no_remote(side) || self.state.orders.contains_key(&side) {
            return;
        }
        if !self.state.throttle.can_place(side) {
            return;
        }
        // Critical: record before issuing the call (§4.3).
        self.state.throttle.record(side);
        let client_order_id = OrderId::fresh();

        match self
            .adapter
            .place_order(side, price, qty, true, client_order_id)
            .await
        {
            Ok(order_id) => {
                let mut info = crate::state::OrderInfo::new_pending(side, price, qty);
                info.client_order_id = client_order_id;
                info.mark_open(order_id);
                self.state.orders.insert(side, info);
                self.counters.placements += 1;
                self.journal_append("place", Some(side), Some(price), "placed");
            }
            Err(err) if matches!(err, crate::core::errors::AdapterError::Unknown) => {
                let mut info = crate::state::OrderInfo::new_pending(side, price, qty);
                info.client_order_id = client_order_id;
                self.state.orders.insert(side, info);
            }
            Err(err) if err.is_fatal_for_trading() => {
                warn!(%side, error = %err, "fatal adapter error, pausing");
                self.enter_pause(PauseReason::AdapterUnhealthy).await;
            }
            Err(crate::core::errors::AdapterError::PostOnlyRejected) => {
                // Non-error: next tick may retry (§7).
            }
            Err(err) => {
                warn!(%side, error = %err, "place_order failed");
            }
        }
        let _ = cfg;
    }

    async fn cancel_all_and_wait(&mut self) {
        let cfg = self.config.current();
        self.cancel_all_resting().await;
        tokio::time::sleep(Duration::from_secs(cfg.execution.disappear_grace_sec.min(2))).await;
    }

    fn journal_append(&self, action: &str, side: Option<Side>, price: Option<Decimal>, reason: &str) {
        if let Some(journal) = &self.journal {
            journal.append(OperationLogEntry {
                ts_ms: now_ms(),
                action: action.to_string(),
                side,
                price,
                reason: reason.to_string(),
            });
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            status: self.status,
            position: self.position(),
            open_orders: self
                .state
                .orders
                .values()
                .map(|o| OpenOrderSnapshot {
                    side: o.side,
                    price: o.price,
                    qty: o.qty,
                    status: o.status,
                })
                .collect(),
            volatility_bps: self.state.volatility.current_bps(),
            counters: self.counters,
            last_tick_ts_ms: now_ms(),
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
