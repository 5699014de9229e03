/// Protocol constants shared by the hook engine, governance and oracle

// ============================================================================
// Mathematical Constants
// ============================================================================

/// Q64 fixed-point scale factor: 2^64
pub const Q64: u128 = 1u128 << 64;

/// 18-decimal fixed-point scale used for reported prices
pub const PRICE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Fee denominator in pips (1,000,000 = 100%)
pub const FEE_DENOMINATOR: u32 = 1_000_000;

// ============================================================================
// Tick and Price Constants
// ============================================================================

/// Minimum tick value
pub const MIN_TICK: i32 = -443_636;

/// Maximum tick value
pub const MAX_TICK: i32 = 443_636;

/// Minimum tick spacing
pub const MIN_TICK_SPACING: i32 = 1;

/// Maximum tick spacing
pub const MAX_TICK_SPACING: i32 = 32_767;

/// Minimum sqrt price in Q64.64 (sqrt price at MIN_TICK)
pub const MIN_SQRT_PRICE_X64: u128 = 4_295_048_016;

/// Maximum sqrt price in Q64.64 (sqrt price at MAX_TICK)
pub const MAX_SQRT_PRICE_X64: u128 = 79_226_673_515_401_279_992_447_579_055;

// ============================================================================
// Liquidity and Guard Constants
// ============================================================================

/// Reserve floor both sides must respect once a pool holds liquidity
pub const MIN_LIQUIDITY: u128 = 1_000;

/// Minimum seconds between guarded operations by one account
pub const COOLDOWN_PERIOD: i64 = 60;

/// Maximum allowed price impact in basis points (2%)
pub const MAX_SLIPPAGE_BPS: u64 = 200;

// ============================================================================
// Fee Constants
// ============================================================================

/// Maximum LP fee in pips (10%)
pub const MAX_FEE: u32 = 100_000;

/// Default protocol share of liquidity inflows in basis points
pub const DEFAULT_PROTOCOL_FEE_BPS: u16 = 0;

/// Maximum protocol share in basis points (25%)
pub const MAX_PROTOCOL_FEE_BPS: u16 = 2_500;

// ============================================================================
// Governance Constants
// ============================================================================

/// One day in seconds
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Shortest allowed timelock
pub const MIN_PROPOSAL_DELAY: i64 = SECONDS_PER_DAY;

/// Longest allowed timelock
pub const MAX_PROPOSAL_DELAY: i64 = 30 * SECONDS_PER_DAY;

// ============================================================================
// Oracle Constants
// ============================================================================

/// Observation bucket width in seconds
pub const ORACLE_PERIOD: i64 = 3_600;

/// Buckets searched backwards when the requested bucket is empty
pub const MAX_LOOKBACK_BUCKETS: u32 = 5;
