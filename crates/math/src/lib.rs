/// Mathematical utilities for the Aegis pool hook engine
///
/// This crate provides checked arithmetic, 256-bit intermediates, reserve
/// derived prices, price-impact estimates and tick conversions used by the
/// ledger, guard and oracle.

pub mod price;
pub mod safe;
pub mod tick_math;

// Re-export commonly used functions
pub use price::*;
pub use safe::*;
pub use tick_math::*;

pub use ethnum::U256;
