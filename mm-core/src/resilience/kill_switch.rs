//! Kill switch / graceful shutdown. SIGTERM drives the same cancellation
//! policy as an operator-issued `stop()` (§4.7a); SIGUSR1/SIGUSR2 toggle a
//! pause/resume request the main loop observes at the next tick boundary.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use signal_hook::consts::{SIGTERM, SIGUSR1, SIGUSR2};
use signal_hook::iterator::Signals;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KillSwitchState {
    Armed = 0,
    ShutdownRequested = 1,
    PauseRequested = 2,
    ResumeRequested = 3,
}

impl From<u8> for KillSwitchState {
    fn from(v: u8) -> Self {
        match v {
            1 => KillSwitchState::ShutdownRequested,
            2 => KillSwitchState::PauseRequested,
            3 => KillSwitchState::ResumeRequested,
            _ => KillSwitchState::Armed,
        }
    }
}

/// Shared, lock-free-on-the-read-path signal state. The main loop polls
/// `state()` once per tick; the signal thread only ever writes.
pub struct KillSwitch {
    state: Arc<AtomicU8>,
    reason: Arc<Mutex<Option<String>>>,
}

impl KillSwitch {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(KillSwitchState::Armed as u8)),
            reason: Arc::new(Mutex::new(None)),
        }
    }

    pub fn state(&self) -> KillSwitchState {
        KillSwitchState::from(self.state.load(Ordering::Acquire))
    }

    pub fn reason(&self) -> Option<String> {
        self.reason.lock().clone()
    }

    /// Spawns a background OS thread handling SIGTERM/SIGUSR1/SIGUSR2.
    /// Must be called once at process startup, before the tokio runtime
    /// blocks on the main loop.
    pub fn install(&self) -> anyhow::Result<()> {
        let mut signals = Signals::new([SIGTERM, SIGUSR1, SIGUSR2])?;
        let state = self.state.clone();
        let reason = self.reason.clone();
        std::thread::spawn(move || {
            for signal in signals.forever() {
                match signal {
                    SIGTERM => {
                        *reason.lock() = Some("SIGTERM received".to_string());
                        state.store(KillSwitchState::ShutdownRequested as u8, Ordering::Release);
                    }
                    SIGUSR1 => {
                        state.store(KillSwitchState::PauseRequested as u8, Ordering::Release);
                    }
                    SIGUSR2 => {
                        state.store(KillSwitchState::ResumeRequested as u8, Ordering::Release);
                    }
                    _ => {}
                }
            }
        });
        Ok(())
    }

    /// Test/manual trigger, bypassing the signal handler.
    pub fn trigger_shutdown(&self, reason: impl Into<String>) {
        *self.reason.lock() = Some(reason.into());
        self.state.store(KillSwitchState::ShutdownRequested as u8, Ordering::Release);
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_armed() {
        let switch = KillSwitch::new();
        assert_eq!(switch.state(), KillSwitchState::Armed);
    }

    #[test]
    fn manual_trigger_sets_shutdown_requested_with_reason() {
        let switch = KillSwitch::new();
        switch.trigger_shutdown("operator stop");
        assert_eq!(switch.state(), KillSwitchState::ShutdownRequested);
        assert_eq!(switch.reason().as_deref(), Some("operator stop"));
    }
}
