/// Shared types for the Aegis pool hook engine
///
/// This crate provides the identities, pool keys, parameter shapes, constants,
/// error taxonomy and domain events used by the engine, governance, oracle
/// and simulation crates.

pub mod address;
pub mod constants;
pub mod errors;
pub mod events;
pub mod pool;

// Re-export all public types
pub use address::*;
pub use constants::*;
pub use errors::*;
pub use events::*;
pub use pool::*;
