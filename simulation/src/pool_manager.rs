/// Constant-product host engine. Computes the balance deltas of full-range
/// positions and exact-input swaps, and drives the hook's before/after
/// callbacks around them, aborting the in-flight operation whenever the
/// second half fails.

use aegis_core::{HookCall, HookEngine};
use aegis_math::{
    full_range_ticks, liquidity_from_reserves, mul_div_u128, safe_add_u128, safe_sub_u128,
    tick_at_sqrt_price,
};
use aegis_types::{
    Address, BalanceDelta, HookError, HookResult, ModifyLiquidityParams, PoolId, PoolKey,
    SwapParams, FEE_DENOMINATOR,
};
use log::{debug, warn};
use serde::Serialize;

/// Result of an exact-input swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapExecution {
    pub amount_in: u128,
    pub amount_out: u128,
    /// LP fee withheld from the input, left in the pool
    pub fee_amount: u128,
    pub delta: BalanceDelta,
}

pub struct PoolManager {
    address: Address,
    engine: HookEngine,
}

impl PoolManager {
    /// Host bound to the pool manager identity the hook expects
    pub fn new(engine: HookEngine) -> Self {
        Self { address: engine.pool_manager(), engine }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn engine(&self) -> &HookEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut HookEngine {
        &mut self.engine
    }

    // ========================================================================
    // Callback Plumbing
    // ========================================================================

    fn begin(&mut self, before: HookCall) -> HookResult<()> {
        self.engine.dispatch(&self.address, before)?;
        Ok(())
    }

    fn finish(&mut self, pool_id: &PoolId, after: HookCall) -> HookResult<()> {
        match self.engine.dispatch(&self.address, after) {
            Ok(_) => Ok(()),
            Err(err) => Err(self.fail(pool_id, err)),
        }
    }

    /// Release the in-flight operation and hand back the original error
    fn fail(&mut self, pool_id: &PoolId, err: HookError) -> HookError {
        match self.engine.abort(&self.address, pool_id) {
            Ok(Some(kind)) => debug!("aborted {} on pool {}: {}", kind, pool_id, err),
            Ok(None) => {}
            Err(abort_err) => warn!("abort on pool {} failed: {}", pool_id, abort_err),
        }
        err
    }

    fn full_range(key: &PoolKey, liquidity_delta: i128) -> ModifyLiquidityParams {
        let (lower, upper) = full_range_ticks(key.tick_spacing);
        ModifyLiquidityParams::new(lower, upper, liquidity_delta)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Create a pool at `sqrt_price_x64`, returning its starting tick
    pub fn initialize(
        &mut self,
        sender: Address,
        key: PoolKey,
        sqrt_price_x64: u128,
    ) -> HookResult<i32> {
        let pool_id = key.id();
        self.begin(HookCall::BeforeInitialize { sender, key, sqrt_price_x64 })?;
        let tick = match tick_at_sqrt_price(sqrt_price_x64) {
            Ok(tick) => tick,
            Err(err) => return Err(self.fail(&pool_id, err)),
        };
        self.finish(&pool_id, HookCall::AfterInitialize { sender, key, sqrt_price_x64, tick })?;
        Ok(tick)
    }

    /// Deposit both tokens into a full-range position
    pub fn add_liquidity(
        &mut self,
        sender: Address,
        key: PoolKey,
        amount0: u128,
        amount1: u128,
    ) -> HookResult<BalanceDelta> {
        let pool_id = key.id();
        let liquidity = liquidity_from_reserves(amount0, amount1)?.max(1);
        let params = Self::full_range(&key, to_signed(liquidity)?);
        let delta = BalanceDelta::new(to_signed(amount0)?, to_signed(amount1)?);

        self.begin(HookCall::BeforeAddLiquidity { sender, key, params })?;
        self.finish(&pool_id, HookCall::AfterAddLiquidity { sender, key, params, delta })?;
        Ok(delta)
    }

    /// Burn `liquidity` and pay out the proportional share of both reserves
    pub fn remove_liquidity(
        &mut self,
        sender: Address,
        key: PoolKey,
        liquidity: u128,
    ) -> HookResult<BalanceDelta> {
        let pool_id = key.id();
        let params = Self::full_range(&key, -to_signed(liquidity)?);

        self.begin(HookCall::BeforeRemoveLiquidity { sender, key, params })?;
        let delta = match self.settle_removal(&pool_id, liquidity) {
            Ok(delta) => delta,
            Err(err) => return Err(self.fail(&pool_id, err)),
        };
        self.finish(&pool_id, HookCall::AfterRemoveLiquidity { sender, key, params, delta })?;
        Ok(delta)
    }

    fn settle_removal(&self, pool_id: &PoolId, liquidity: u128) -> HookResult<BalanceDelta> {
        let (reserve0, reserve1) = self.engine.get_reserves(pool_id)?;
        let total = liquidity_from_reserves(reserve0, reserve1)?;
        let amount0 = mul_div_u128(reserve0, liquidity, total)?;
        let amount1 = mul_div_u128(reserve1, liquidity, total)?;
        Ok(BalanceDelta::new(-to_signed(amount0)?, -to_signed(amount1)?))
    }

    /// Exact-input swap against the pool's current reserves and LP fee
    pub fn swap_exact_input(
        &mut self,
        sender: Address,
        key: PoolKey,
        zero_for_one: bool,
        amount_in: u128,
        sqrt_price_limit_x64: Option<u128>,
    ) -> HookResult<SwapExecution> {
        let pool_id = key.id();
        let params = SwapParams {
            zero_for_one,
            amount_specified: -to_signed(amount_in)?,
            sqrt_price_limit_x64,
        };

        self.begin(HookCall::BeforeSwap { sender, key, params })?;
        let execution = match self.quote_exact_input(&pool_id, zero_for_one, amount_in) {
            Ok(execution) => execution,
            Err(err) => return Err(self.fail(&pool_id, err)),
        };
        self.finish(
            &pool_id,
            HookCall::AfterSwap { sender, key, params, delta: execution.delta },
        )?;
        Ok(execution)
    }

    /// Output of an exact-input swap at the current state, rounded down.
    /// The whole input enters the pool; the LP fee part buys nothing.
    pub fn quote_exact_input(
        &self,
        pool_id: &PoolId,
        zero_for_one: bool,
        amount_in: u128,
    ) -> HookResult<SwapExecution> {
        let pool = self.engine.pool(pool_id)?;
        let (reserve_in, reserve_out) = if zero_for_one {
            (pool.reserve0, pool.reserve1)
        } else {
            (pool.reserve1, pool.reserve0)
        };

        let fee_amount = mul_div_u128(amount_in, pool.lp_fee as u128, FEE_DENOMINATOR as u128)?;
        let net_in = safe_sub_u128(amount_in, fee_amount, "swap quote")?;
        let denominator = safe_add_u128(reserve_in, net_in, "swap quote")?;
        let amount_out = mul_div_u128(reserve_out, net_in, denominator)?;

        let (amount_in_signed, amount_out_signed) = (to_signed(amount_in)?, to_signed(amount_out)?);
        let delta = if zero_for_one {
            BalanceDelta::new(amount_in_signed, -amount_out_signed)
        } else {
            BalanceDelta::new(-amount_out_signed, amount_in_signed)
        };
        Ok(SwapExecution { amount_in, amount_out, fee_amount, delta })
    }

    pub fn donate(
        &mut self,
        sender: Address,
        key: PoolKey,
        amount0: u128,
        amount1: u128,
    ) -> HookResult<()> {
        let pool_id = key.id();
        self.begin(HookCall::BeforeDonate { sender, key, amount0, amount1 })?;
        self.finish(&pool_id, HookCall::AfterDonate { sender, key, amount0, amount1 })
    }
}

fn to_signed(amount: u128) -> HookResult<i128> {
    i128::try_from(amount).map_err(|_| HookError::overflow("signed amount"))
}
