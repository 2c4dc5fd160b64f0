//! Order Throttle (§4.3): per-side cool-down. `record(side)` must be
//! called **before** issuing the async place request — calling it after
//! the reply would let two nearly-simultaneous ticks both observe
//! `can_place` as true.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::core::types::Side;

pub struct OrderThrottle {
    last_attempt: HashMap<Side, Instant>,
    cooldown: Duration,
}

impl OrderThrottle {
    pub fn new() -> Self {
        Self {
            last_attempt: HashMap::new(),
            cooldown: Duration::from_secs(1),
        }
    }

    pub fn with_cooldown(cooldown_sec: u64) -> Self {
        Self {
            last_attempt: HashMap::new(),
            cooldown: Duration::from_secs(cooldown_sec),
        }
    }

    pub fn set_cooldown(&mut self, cooldown_sec: u64) {
        self.cooldown = Duration::from_secs(cooldown_sec);
    }

    pub fn can_place(&self, side: Side) -> bool {
        match self.last_attempt.get(&side) {
            Some(last) => last.elapsed() >= self.cooldown,
            None => true,
        }
    }

    /// Must be called before the place request is issued, not after the
    /// reply (see module docs).
    pub fn record(&mut self, side: Side) {
        self.last_attempt.insert(side, Instant::now());
    }
}

impl Default for OrderThrottle {
    fn default() -> Self {
        Self::new()
    }
}
