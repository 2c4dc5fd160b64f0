//! Error taxonomy. `AdapterError` crosses the channel/task boundaries of the
//! runtime model so it is `thiserror`-derived, `Send + 'static`, and never
//! panics. `EngineError` covers the small set of invariant violations the
//! engine itself can detect (checked arithmetic on position/size bounds);
//! binary-level glue (config load, metrics bind, journal open) uses
//! `anyhow::Result` instead, per the composition/domain split.

use thiserror::Error;

/// Errors an `ExchangeAdapter` call can return. The Executor classifies and
/// reacts to every variant; none of them are allowed to unwind a tick.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("transient adapter failure: {0}")]
    Transient(String),

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("post-only order would have crossed the book")]
    PostOnlyRejected,

    #[error("order not found")]
    OrderNotFound,

    #[error("insufficient funds for requested order")]
    InsufficientFunds,

    #[error("position limit reached at venue")]
    PositionLimit,

    #[error("no reply before deadline, outcome unknown")]
    Unknown,
}

impl AdapterError {
    /// Cancelling an order the venue has already forgotten is a success by
    /// the Adapter contract's idempotence guarantee (§4.1).
    pub fn is_benign_on_cancel(&self) -> bool {
        matches!(self, AdapterError::OrderNotFound)
    }

    /// Errors that should immediately move the engine to
    /// `Paused(AdapterUnhealthy)` pending operator intervention.
    pub fn is_fatal_for_trading(&self) -> bool {
        matches!(
            self,
            AdapterError::InsufficientFunds | AdapterError::PositionLimit
        )
    }
}

/// Overflow/underflow in checked decimal arithmetic over a declared
/// invariant (e.g. position bound, fixed-point conversion).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("arithmetic overflow: {0}")]
pub struct OverflowError(pub String);

/// Errors the engine itself raises when an internal invariant would be
/// violated (distinct from venue/adapter failures).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Overflow(#[from] OverflowError),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("config rejected: {0}")]
    InvalidConfig(String),
}
