//! mm-strategies - quoting strategy implementations
//!
//! Implements `mm_core::engine::QuoteStrategy` against the declarative
//! `MMConfig` of `mm-core`. Kept as a separate crate so a venue binary can
//! depend on `mm-core` without pulling in pricing logic, and so the
//! pricing logic can be swapped or extended independently.

pub mod price_calculator;

pub use price_calculator::PriceCalculator;
