//! Volatility Tracker (§4.4): a time-windowed ring of mid-price samples.
//! Reports the bps range over the window and owns the pause/resume
//! hysteresis that eliminates flapping between `Running` and
//! `Paused(VolatilityHigh)`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub struct VolatilityTracker {
    window: Duration,
    samples: VecDeque<(Instant, Decimal)>,
    /// When the current bps first dropped below the resume threshold;
    /// cleared whenever it rises back above. `should_resume` requires
    /// this to have held continuously for `stable_seconds`.
    below_resume_since: Option<Instant>,
}

impl VolatilityTracker {
    pub fn new(window_sec: u64) -> Self {
        Self {
            window: Duration::from_secs(window_sec),
            samples: VecDeque::new(),
            below_resume_since: None,
        }
    }

    pub fn set_window(&mut self, window_sec: u64) {
        self.window = Duration::from_secs(window_sec);
    }

    /// Records a new mid-price observation and evicts samples older than
    /// the window.
    pub fn record(&mut self, mid: Decimal) {
        let now = Instant::now();
        self.samples.push_back((now, mid));
        while let Some((ts, _)) = self.samples.front() {
            if now.duration_since(*ts) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// `(max - min) / latest * 10000` over the current window.
    pub fn current_bps(&self) -> Decimal {
        let Some((_, latest)) = self.samples.back() else {
            return Decimal::ZERO;
        };
        if *latest == Decimal::ZERO {
            return Decimal::ZERO;
        }
        let mut max = *latest;
        let mut min = *latest;
        for (_, mid) in &self.samples {
            if *mid > max {
                max = *mid;
            }
            if *mid < min {
                min = *mid;
            }
        }
        (max - min) / latest * dec!(10000)
    }

    pub fn should_pause(&self, pause_threshold_bps: Decimal) -> bool {
        self.current_bps() > pause_threshold_bps
    }

    /// True once `current_bps` has stayed below `resume_threshold_bps`
    /// continuously for at least `stable_seconds` (§4.4 hysteresis).
    /// Call `note_tick` every tick to advance the hysteresis clock.
    pub fn should_resume(&mut self, resume_threshold_bps: Decimal, stable_seconds: u64) -> bool {
        let bps = self.current_bps();
        if bps < resume_threshold_bps {
            let since = *self.below_resume_since.get_or_insert_with(Instant::now);
            since.elapsed().as_secs() >= stable_seconds
        } else {
            self.below_resume_since = None;
            false
        }
    }

    /// Called on entering `Paused(VolatilityHigh)` so a stale hysteresis
    /// clock from a prior episode doesn't let resume fire immediately.
    pub fn reset_resume_hysteresis(&mut self) {
        self.below_resume_since = None;
    }
}
