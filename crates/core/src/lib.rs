/// Aegis pool hook engine
///
/// This crate implements the hook a host pool-manager engine calls around
/// every pool lifecycle event, plus the two components that sit beside it:
/// - `hook`: callback state machine over the reserve ledger and MEV guard
/// - `governance`: time-delayed fee proposals applied through `FeeController`
/// - `oracle`: bucketed TWAP observations read through `ReserveSource`

pub mod clock;
pub mod config;
pub mod events;
pub mod governance;
pub mod guard;
pub mod hook;
pub mod ledger;
pub mod oracle;
pub mod reentrancy;
pub mod registry;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{
    ConfigError, GovernanceConfig, HookConfig, OracleConfig, PostSwapSlippage, ProtocolConfig,
};
pub use events::EventLog;
pub use governance::{FeeController, FeeGovernor, Proposal, ProposalState};
pub use guard::MevGuard;
pub use hook::{HookCall, HookEngine, HookKind, HookPermissions, HookResponse};
pub use ledger::{PoolState, ReserveLedger};
pub use oracle::{Observation, ReserveSource, TwapOracle};
pub use reentrancy::{InFlightTracker, OperationStatus};
pub use registry::{InMemoryRegistry, PoolRegistry};
