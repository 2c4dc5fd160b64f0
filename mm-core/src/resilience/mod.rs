//! Resilience patterns for production deployment.

pub mod kill_switch;

pub use kill_switch::{KillSwitch, KillSwitchState};
