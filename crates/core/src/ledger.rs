/// Per-pool reserve bookkeeping. Reserves move only through signed balance
/// deltas reported by the host engine; every derived value (invariant, price,
/// sqrt price, tick) is recomputed from the reserves after each change.

use std::collections::HashMap;

use aegis_math::{
    apply_signed_delta, invariant, liquidity_from_reserves, price_from_reserves, safe_add_u128,
    sqrt_price_from_reserves, tick_at_sqrt_price, U256,
};
use aegis_types::{
    BalanceDelta, HookError, HookResult, PoolId, PoolKey, ReserveChange, MAX_SQRT_PRICE_X64,
    MIN_SQRT_PRICE_X64,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Pool State
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub pool_id: PoolId,
    pub key: PoolKey,

    /// Current sqrt price, Q64.64
    pub sqrt_price_x64: u128,
    pub tick: i32,

    /// LP fee in pips, written only through the fee controller path
    pub lp_fee: u32,
    /// Protocol share of liquidity inflows (basis points)
    pub protocol_fee_bps: u16,

    pub reserve0: u128,
    pub reserve1: u128,

    /// reserve0 * reserve1 after the last update
    pub last_invariant: U256,
    /// token1 per token0, 18 decimals
    pub last_price: u128,
    pub last_update_timestamp: i64,
    pub created_at: i64,

    /// Protocol fees accrued and not yet withdrawn
    pub protocol_fees0: u128,
    pub protocol_fees1: u128,
}

impl PoolState {
    /// Fresh pool with empty reserves
    pub fn new(
        key: PoolKey,
        sqrt_price_x64: u128,
        tick: i32,
        protocol_fee_bps: u16,
        now: i64,
    ) -> Self {
        Self {
            pool_id: key.id(),
            key,
            sqrt_price_x64,
            tick,
            lp_fee: key.fee,
            protocol_fee_bps,
            reserve0: 0,
            reserve1: 0,
            last_invariant: U256::ZERO,
            last_price: 0,
            last_update_timestamp: now,
            created_at: now,
            protocol_fees0: 0,
            protocol_fees1: 0,
        }
    }

    /// Either reserve is non-zero
    pub fn has_liquidity(&self) -> bool {
        self.reserve0 > 0 || self.reserve1 > 0
    }

    /// Full-range liquidity sqrt(r0 * r1)
    pub fn liquidity(&self) -> HookResult<u128> {
        liquidity_from_reserves(self.reserve0, self.reserve1)
    }

    pub fn reserves(&self) -> (u128, u128) {
        (self.reserve0, self.reserve1)
    }

    /// Apply a signed delta and refresh the derived values. On error the
    /// state is unchanged.
    pub fn apply_delta(&mut self, delta: BalanceDelta, now: i64) -> HookResult<ReserveChange> {
        let reserve0 = apply_signed_delta(self.reserve0, delta.amount0)?;
        let reserve1 = apply_signed_delta(self.reserve1, delta.amount1)?;
        let (sqrt_price_x64, tick) = derive_sqrt_price(reserve0, reserve1)?
            .unwrap_or((self.sqrt_price_x64, self.tick));
        let last_price = price_from_reserves(reserve0, reserve1)?;

        let change = ReserveChange {
            reserve0_before: self.reserve0,
            reserve1_before: self.reserve1,
            reserve0_after: reserve0,
            reserve1_after: reserve1,
        };

        self.reserve0 = reserve0;
        self.reserve1 = reserve1;
        self.sqrt_price_x64 = sqrt_price_x64;
        self.tick = tick;
        self.last_price = last_price;
        self.last_invariant = invariant(reserve0, reserve1);
        self.last_update_timestamp = now;
        Ok(change)
    }

    /// Move part of the reserves into the protocol fee accrual
    pub fn accrue_protocol_fees(&mut self, amount0: u128, amount1: u128, now: i64) -> HookResult<()> {
        let delta = BalanceDelta::new(
            -i128::try_from(amount0).map_err(|_| HookError::overflow("protocol fee"))?,
            -i128::try_from(amount1).map_err(|_| HookError::overflow("protocol fee"))?,
        );
        let fees0 = safe_add_u128(self.protocol_fees0, amount0, "protocol fee accrual")?;
        let fees1 = safe_add_u128(self.protocol_fees1, amount1, "protocol fee accrual")?;
        self.apply_delta(delta, now)?;
        self.protocol_fees0 = fees0;
        self.protocol_fees1 = fees1;
        Ok(())
    }

    /// Once liquidity exists both reserves stay at or above `minimum`
    pub fn check_floor(&self, minimum: u128) -> HookResult<()> {
        if !self.has_liquidity() {
            return Ok(());
        }
        self.require_reserves(minimum)
    }

    /// Both reserves at or above `minimum`, empty pools included
    pub fn require_reserves(&self, minimum: u128) -> HookResult<()> {
        if self.reserve0 < minimum || self.reserve1 < minimum {
            return Err(HookError::InsufficientLiquidity {
                reserve0: self.reserve0,
                reserve1: self.reserve1,
                minimum,
            });
        }
        Ok(())
    }
}

/// Sqrt price and tick implied by the reserves, clamped to the global
/// bounds. `None` while either side is empty.
fn derive_sqrt_price(reserve0: u128, reserve1: u128) -> HookResult<Option<(u128, i32)>> {
    if reserve0 == 0 || reserve1 == 0 {
        return Ok(None);
    }
    let sqrt_price = sqrt_price_from_reserves(reserve0, reserve1)?
        .clamp(MIN_SQRT_PRICE_X64, MAX_SQRT_PRICE_X64);
    Ok(Some((sqrt_price, tick_at_sqrt_price(sqrt_price)?)))
}

// ============================================================================
// Reserve Ledger
// ============================================================================

/// All initialized pools keyed by id
#[derive(Debug, Default, Clone)]
pub struct ReserveLedger {
    pools: HashMap<PoolId, PoolState>,
}

impl ReserveLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, pool_id: &PoolId) -> bool {
        self.pools.contains_key(pool_id)
    }

    pub fn get(&self, pool_id: &PoolId) -> HookResult<&PoolState> {
        self.pools
            .get(pool_id)
            .ok_or(HookError::PoolNotFound { pool_id: *pool_id })
    }

    /// Copy of a pool's state to mutate before committing
    pub fn stage(&self, pool_id: &PoolId) -> HookResult<PoolState> {
        self.get(pool_id).cloned()
    }

    /// Replace (or create) a pool's state
    pub fn commit(&mut self, state: PoolState) {
        self.pools.insert(state.pool_id, state);
    }

    /// Apply a delta to a stored pool atomically
    pub fn apply_delta(
        &mut self,
        pool_id: &PoolId,
        delta: BalanceDelta,
        now: i64,
    ) -> HookResult<ReserveChange> {
        let mut state = self.stage(pool_id)?;
        let change = state.apply_delta(delta, now)?;
        self.commit(state);
        Ok(change)
    }

    pub fn pool_ids(&self) -> impl Iterator<Item = &PoolId> {
        self.pools.keys()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_types::{Address, PRICE_PRECISION, Q64};
    use proptest::prelude::*;

    fn state() -> PoolState {
        let key = PoolKey::new(
            Address::derive("token-a"),
            Address::derive("token-b"),
            3000,
            60,
            Address::derive("hook"),
        )
        .unwrap();
        PoolState::new(key, Q64, 0, 0, 100)
    }

    #[test]
    fn test_apply_delta_updates_derived_values() {
        let mut pool = state();
        pool.apply_delta(BalanceDelta::new(1000, 1000), 110).unwrap();
        let change = pool.apply_delta(BalanceDelta::new(500, 500), 120).unwrap();

        assert_eq!(change.reserve0_before, 1000);
        assert_eq!(change.reserve0_after, 1500);
        assert_eq!(pool.reserves(), (1500, 1500));
        assert_eq!(pool.last_invariant, U256::from(2_250_000u128));
        assert_eq!(pool.last_price, PRICE_PRECISION);
        assert_eq!(pool.sqrt_price_x64, Q64);
        assert_eq!(pool.tick, 0);
        assert_eq!(pool.last_update_timestamp, 120);
    }

    #[test]
    fn test_lopsided_reserves_saturate_price() {
        let mut pool = state();
        let deep = 1_000_000_000_000_000_000_000_000_000_000i128;
        pool.apply_delta(BalanceDelta::new(1, deep), 110).unwrap();
        assert_eq!(pool.last_price, u128::MAX);
        assert_eq!(pool.sqrt_price_x64, MAX_SQRT_PRICE_X64);

        pool.apply_delta(BalanceDelta::new(0, -1), 120).unwrap();
        assert_eq!(pool.reserve1, deep as u128 - 1);
    }

    #[test]
    fn test_apply_delta_rejects_negative_reserve() {
        let mut pool = state();
        pool.apply_delta(BalanceDelta::new(1000, 1000), 110).unwrap();
        let before = pool.clone();
        let err = pool.apply_delta(BalanceDelta::new(-1001, 0), 120).unwrap_err();
        assert_eq!(err, HookError::InsufficientReserve { requested: 1001, available: 1000 });
        assert_eq!(pool, before);
    }

    #[test]
    fn test_one_sided_reserves_keep_price() {
        let mut pool = state();
        pool.apply_delta(BalanceDelta::new(1000, 0), 110).unwrap();
        assert_eq!(pool.sqrt_price_x64, Q64);
        assert_eq!(pool.last_price, 0);
    }

    #[test]
    fn test_floor() {
        let mut pool = state();
        assert!(pool.check_floor(1000).is_ok());
        pool.apply_delta(BalanceDelta::new(999, 5000), 110).unwrap();
        assert!(matches!(
            pool.check_floor(1000),
            Err(HookError::InsufficientLiquidity { .. })
        ));
        assert!(state().require_reserves(1000).is_err());
    }

    #[test]
    fn test_protocol_fee_accrual() {
        let mut pool = state();
        pool.apply_delta(BalanceDelta::new(10_000, 10_000), 110).unwrap();
        pool.accrue_protocol_fees(10, 20, 110).unwrap();
        assert_eq!(pool.reserves(), (9_990, 9_980));
        assert_eq!((pool.protocol_fees0, pool.protocol_fees1), (10, 20));
    }

    #[test]
    fn test_ledger_apply_delta_unknown_pool() {
        let mut ledger = ReserveLedger::new();
        let pool_id = state().pool_id;
        assert!(matches!(
            ledger.apply_delta(&pool_id, BalanceDelta::new(1, 1), 0),
            Err(HookError::PoolNotFound { .. })
        ));
        ledger.commit(state());
        assert!(ledger.apply_delta(&pool_id, BalanceDelta::new(1, 1), 0).is_ok());
        assert_eq!(ledger.get(&pool_id).unwrap().reserves(), (1, 1));
    }

    proptest! {
        #[test]
        fn prop_invariant_tracks_reserves(
            r0 in 1u128..1_000_000_000_000,
            r1 in 1u128..1_000_000_000_000,
            d0 in -1_000_000i128..1_000_000,
            d1 in -1_000_000i128..1_000_000,
        ) {
            let mut pool = state();
            pool.apply_delta(BalanceDelta::new(r0 as i128, r1 as i128), 1).unwrap();
            match pool.apply_delta(BalanceDelta::new(d0, d1), 2) {
                Ok(_) => {
                    prop_assert_eq!(pool.last_invariant, invariant(pool.reserve0, pool.reserve1));
                    prop_assert_eq!(
                        pool.last_price,
                        price_from_reserves(pool.reserve0, pool.reserve1).unwrap()
                    );
                }
                Err(HookError::InsufficientReserve { .. }) => {
                    prop_assert_eq!(pool.reserves(), (r0, r1));
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
