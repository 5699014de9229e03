/// Pool identity and the parameter shapes the host engine passes to hooks

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::address::Address;
use crate::constants::{FEE_DENOMINATOR, MAX_TICK_SPACING, MIN_TICK_SPACING};
use crate::errors::{HookError, HookResult};

// ============================================================================
// Pool Key and Identifier
// ============================================================================

/// Immutable description of a pool. `currency0 < currency1` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    /// LP fee tier in pips
    pub fee: u32,
    pub tick_spacing: i32,
    /// Hook contract attached to the pool
    pub hooks: Address,
}

impl PoolKey {
    /// Build a key from an unordered token pair
    pub fn new(
        token_a: Address,
        token_b: Address,
        fee: u32,
        tick_spacing: i32,
        hooks: Address,
    ) -> HookResult<Self> {
        if token_a == token_b {
            return Err(HookError::invalid_pool("identical tokens"));
        }
        let (currency0, currency1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        let key = Self {
            currency0,
            currency1,
            fee,
            tick_spacing,
            hooks,
        };
        key.validate()?;
        Ok(key)
    }

    /// Check ordering, fee tier and tick spacing
    pub fn validate(&self) -> HookResult<()> {
        if self.currency0 >= self.currency1 {
            return Err(HookError::invalid_pool("currencies not sorted"));
        }
        if self.fee > FEE_DENOMINATOR {
            return Err(HookError::invalid_pool("fee above 100%"));
        }
        if !(MIN_TICK_SPACING..=MAX_TICK_SPACING).contains(&self.tick_spacing) {
            return Err(HookError::invalid_pool("tick spacing out of range"));
        }
        Ok(())
    }

    /// Deterministic pool id: SHA-256 over the canonical key encoding
    pub fn id(&self) -> PoolId {
        let mut hasher = Sha256::new();
        hasher.update(self.currency0.0);
        hasher.update(self.currency1.0);
        hasher.update(self.fee.to_be_bytes());
        hasher.update(self.tick_spacing.to_be_bytes());
        hasher.update(self.hooks.0);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        PoolId(bytes)
    }
}

/// Hash of a `PoolKey`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolId(pub [u8; 32]);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolId({})", self)
    }
}

// ============================================================================
// Balance Delta
// ============================================================================

/// Signed change of a pool's two balances, from the pool's point of view:
/// positive amounts entered the pool, negative amounts left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceDelta {
    pub amount0: i128,
    pub amount1: i128,
}

impl BalanceDelta {
    pub const ZERO: BalanceDelta = BalanceDelta { amount0: 0, amount1: 0 };

    pub const fn new(amount0: i128, amount1: i128) -> Self {
        Self { amount0, amount1 }
    }

    pub fn is_zero(&self) -> bool {
        self.amount0 == 0 && self.amount1 == 0
    }

    /// Positive parts of the delta (tokens that entered the pool)
    pub fn inflows(&self) -> (u128, u128) {
        (self.amount0.max(0) as u128, self.amount1.max(0) as u128)
    }

    /// Magnitudes of the negative parts (tokens that left the pool)
    pub fn outflows(&self) -> (u128, u128) {
        (
            self.amount0.min(0).unsigned_abs(),
            self.amount1.min(0).unsigned_abs(),
        )
    }
}

// ============================================================================
// Operation Parameters
// ============================================================================

/// Liquidity change request. Positions are full-range in practice; the
/// range is validated, not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyLiquidityParams {
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Positive to add, negative to remove
    pub liquidity_delta: i128,
    pub salt: [u8; 32],
}

impl ModifyLiquidityParams {
    pub fn new(tick_lower: i32, tick_upper: i32, liquidity_delta: i128) -> Self {
        Self {
            tick_lower,
            tick_upper,
            liquidity_delta,
            salt: [0u8; 32],
        }
    }
}

/// Swap request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    /// Token0 in, token1 out when true
    pub zero_for_one: bool,
    /// Negative for exact input, positive for exact output
    pub amount_specified: i128,
    /// Price the swap may not cross, Q64.64; `None` when the caller set none
    pub sqrt_price_limit_x64: Option<u128>,
}
