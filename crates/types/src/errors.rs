use std::fmt;
use thiserror::Error;

use crate::address::Address;
use crate::pool::PoolId;

// ============================================================================
// Main Error Enum
// ============================================================================

/// Every failure the hook engine, governance timelock or oracle can surface.
/// Each variant carries the offending values so callers can branch on cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    // ========================================================================
    // Access Errors
    // ========================================================================

    /// Caller lacks the capability required for the operation
    #[error("Unauthorized caller {caller} for '{operation}'")]
    UnauthorizedCaller { caller: Address, operation: &'static str },

    /// Account is on the guard blacklist
    #[error("Account {account} is blacklisted")]
    Blacklisted { account: Address },

    /// Hook is paused by its owner
    #[error("Hook is paused")]
    HookPaused,

    // ========================================================================
    // Temporal Errors
    // ========================================================================

    /// Account operated again before its cooldown expired
    #[error("Cooldown active for {account}: ready at {ready_at}, now {now}")]
    CooldownActive { account: Address, ready_at: i64, now: i64 },

    /// Proposal timelock has not expired
    #[error("Proposal {proposal_id} executable at {executable_at}, now {now}")]
    DelayNotElapsed { proposal_id: u64, executable_at: i64, now: i64 },

    /// Latest observation is older than the requested window
    #[error("Stale price: latest observation {age_seconds}s old (max {max_age}s)")]
    StalePrice { age_seconds: i64, max_age: i64 },

    /// Lookback window outside (0, PERIOD]
    #[error("Invalid period: {seconds_ago}s not in (0, {max_period}]")]
    InvalidPeriod { seconds_ago: i64, max_period: i64 },

    // ========================================================================
    // Validation Errors
    // ========================================================================

    /// Tick range malformed, out of bounds or not aligned to spacing
    #[error("Invalid tick range [{tick_lower}, {tick_upper}] for spacing {tick_spacing}")]
    InvalidTickRange { tick_lower: i32, tick_upper: i32, tick_spacing: i32 },

    /// Tick outside the supported range
    #[error("Invalid tick {tick}")]
    InvalidTick { tick: i32 },

    /// Fee above the protocol maximum
    #[error("Invalid fee {fee} (max {max_fee})")]
    InvalidFee { fee: u32, max_fee: u32 },

    /// Timelock delay outside the allowed window
    #[error("Invalid delay {delay}s: not in [{min_delay}, {max_delay}]")]
    InvalidDelay { delay: i64, min_delay: i64, max_delay: i64 },

    /// Starting price outside the global bound
    #[error("Invalid sqrt price {sqrt_price_x64}: not in [{min}, {max}]")]
    InvalidPrice { sqrt_price_x64: u128, min: u128, max: u128 },

    /// Pool key or pool configuration rejected
    #[error("Invalid pool parameters: {reason}")]
    InvalidPoolParameters { reason: String },

    /// Zero, wrongly signed or otherwise unusable amount
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// String is not a base58 32-byte address
    #[error("Invalid address '{value}'")]
    InvalidAddress { value: String },

    /// Pool already initialized
    #[error("Pool {pool_id} already initialized")]
    PoolAlreadyInitialized { pool_id: PoolId },

    // ========================================================================
    // Invariant Errors
    // ========================================================================

    /// Reserves would fall below the minimum-liquidity floor
    #[error("Insufficient liquidity: reserves ({reserve0}, {reserve1}) below floor {minimum}")]
    InsufficientLiquidity { reserve0: u128, reserve1: u128, minimum: u128 },

    /// A delta would drive a reserve negative
    #[error("Insufficient reserve: need {requested}, have {available}")]
    InsufficientReserve { requested: u128, available: u128 },

    /// Price impact above the allowed bound
    #[error("Slippage exceeded: {impact_bps} bps (max {max_bps} bps)")]
    SlippageExceeded { impact_bps: u64, max_bps: u64 },

    /// Reserve product fell outside a sanctioned removal
    #[error("Invariant decreased from {before} to {after}")]
    InvariantDecreased { before: String, after: String },

    /// Hook entered while another operation on the pool is in flight
    #[error("Re-entrant call on pool {pool_id}")]
    ReentrancyDetected { pool_id: PoolId },

    /// After-hook does not match the in-flight before-hook
    #[error("Operation mismatch: expected {expected}, got {actual}")]
    OperationMismatch { expected: String, actual: String },

    // ========================================================================
    // Lookup Errors
    // ========================================================================

    /// Pool id unknown to the ledger
    #[error("Pool {pool_id} does not exist")]
    PoolNotFound { pool_id: PoolId },

    /// Oracle holds no usable observation
    #[error("No observations for pool {pool_id}")]
    NoObservations { pool_id: PoolId },

    /// Proposal id unknown
    #[error("Proposal {proposal_id} does not exist")]
    ProposalNotFound { proposal_id: u64 },

    /// Proposal already executed or cancelled
    #[error("Proposal {proposal_id} is not active (state {state})")]
    ProposalNotActive { proposal_id: u64, state: String },

    // ========================================================================
    // Arithmetic Errors
    // ========================================================================

    /// Arithmetic overflow
    #[error("Math overflow in '{operation}'")]
    MathOverflow { operation: &'static str },

    /// Division by zero
    #[error("Division by zero in '{operation}'")]
    DivisionByZero { operation: &'static str },
}

/// Result type alias using the shared error type
pub type HookResult<T> = std::result::Result<T, HookError>;

// ============================================================================
// Error Taxonomy
// ============================================================================

/// Coarse error classes callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Access,
    Temporal,
    Validation,
    Invariant,
    Lookup,
    Arithmetic,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Access => "access",
            ErrorCategory::Temporal => "temporal",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Invariant => "invariant",
            ErrorCategory::Lookup => "lookup",
            ErrorCategory::Arithmetic => "arithmetic",
        };
        f.write_str(name)
    }
}

impl HookError {
    pub fn category(&self) -> ErrorCategory {
        use HookError::*;
        match self {
            UnauthorizedCaller { .. } | Blacklisted { .. } | HookPaused => ErrorCategory::Access,
            CooldownActive { .. }
            | DelayNotElapsed { .. }
            | StalePrice { .. }
            | InvalidPeriod { .. } => ErrorCategory::Temporal,
            InvalidTickRange { .. }
            | InvalidTick { .. }
            | InvalidFee { .. }
            | InvalidDelay { .. }
            | InvalidPrice { .. }
            | InvalidPoolParameters { .. }
            | InvalidAmount { .. }
            | InvalidAddress { .. }
            | PoolAlreadyInitialized { .. } => ErrorCategory::Validation,
            InsufficientLiquidity { .. }
            | InsufficientReserve { .. }
            | SlippageExceeded { .. }
            | InvariantDecreased { .. }
            | ReentrancyDetected { .. }
            | OperationMismatch { .. } => ErrorCategory::Invariant,
            PoolNotFound { .. }
            | NoObservations { .. }
            | ProposalNotFound { .. }
            | ProposalNotActive { .. } => ErrorCategory::Lookup,
            MathOverflow { .. } | DivisionByZero { .. } => ErrorCategory::Arithmetic,
        }
    }

    pub fn unauthorized(caller: Address, operation: &'static str) -> Self {
        Self::UnauthorizedCaller { caller, operation }
    }

    pub fn invalid_pool(reason: &str) -> Self {
        Self::InvalidPoolParameters { reason: reason.to_string() }
    }

    pub fn invalid_amount(reason: &str) -> Self {
        Self::InvalidAmount { reason: reason.to_string() }
    }

    pub fn overflow(operation: &'static str) -> Self {
        Self::MathOverflow { operation }
    }
}
