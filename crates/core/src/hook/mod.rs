/// Hook callback state machine
///
/// `call` defines the callback protocol; `engine` runs it against the
/// reserve ledger and MEV guard.

pub mod call;
pub mod engine;

pub use call::{HookCall, HookKind, HookPermissions, HookResponse};
pub use engine::HookEngine;
