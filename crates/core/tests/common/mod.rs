//! Shared harness: drives the hook the way a constant-product host engine
//! would, calling `abort` whenever an after-callback is rejected.

#![allow(dead_code)]

use std::sync::Arc;

use aegis_core::{HookCall, HookConfig, HookEngine, ManualClock};
use aegis_math::{full_range_ticks, liquidity_from_reserves};
use aegis_types::{
    Address, BalanceDelta, HookResult, ModifyLiquidityParams, PoolId, PoolKey, SwapParams, Q64,
};

pub const START_TIME: i64 = 1_700_000_000;

pub struct Harness {
    pub engine: HookEngine,
    pub clock: ManualClock,
    pub manager: Address,
    pub owner: Address,
    pub key: PoolKey,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(HookConfig::default())
    }

    pub fn with_config(config: HookConfig) -> Self {
        let clock = ManualClock::new(START_TIME);
        let hook = Address::derive("aegis-hook");
        let manager = Address::derive("pool-manager");
        let owner = Address::derive("owner");
        let engine = HookEngine::new(hook, manager, owner, config, Arc::new(clock.clone()));
        let key = PoolKey::new(
            Address::derive("token-usdc"),
            Address::derive("token-weth"),
            3000,
            60,
            hook,
        )
        .expect("valid key");
        Self { engine, clock, manager, owner, key }
    }

    pub fn pool_id(&self) -> PoolId {
        self.key.id()
    }

    pub fn reserves(&self) -> (u128, u128) {
        self.engine.get_reserves(&self.pool_id()).expect("pool exists")
    }

    /// Run a before/after pair, aborting the operation if the after-callback fails
    pub fn run_pair(&mut self, before: HookCall, after: HookCall) -> HookResult<()> {
        let manager = self.manager;
        self.engine.dispatch(&manager, before)?;
        if let Err(err) = self.engine.dispatch(&manager, after) {
            self.engine.abort(&manager, &self.pool_id())?;
            return Err(err);
        }
        Ok(())
    }

    pub fn initialize(&mut self) -> HookResult<()> {
        let sender = Address::derive("deployer");
        let key = self.key;
        self.run_pair(
            HookCall::BeforeInitialize { sender, key, sqrt_price_x64: Q64 },
            HookCall::AfterInitialize { sender, key, sqrt_price_x64: Q64, tick: 0 },
        )
    }

    fn full_range(&self, liquidity_delta: i128) -> ModifyLiquidityParams {
        let (lower, upper) = full_range_ticks(self.key.tick_spacing);
        ModifyLiquidityParams::new(lower, upper, liquidity_delta)
    }

    pub fn add_liquidity(&mut self, sender: Address, amount0: u128, amount1: u128) -> HookResult<()> {
        let liquidity = liquidity_from_reserves(amount0, amount1)?.max(1) as i128;
        let params = self.full_range(liquidity);
        let key = self.key;
        self.run_pair(
            HookCall::BeforeAddLiquidity { sender, key, params },
            HookCall::AfterAddLiquidity {
                sender,
                key,
                params,
                delta: BalanceDelta::new(amount0 as i128, amount1 as i128),
            },
        )
    }

    /// Remove `liquidity` and the proportional share of both reserves
    pub fn remove_liquidity(&mut self, sender: Address, liquidity: u128) -> HookResult<()> {
        let (r0, r1) = self.reserves();
        let total = liquidity_from_reserves(r0, r1)?;
        let amount0 = r0 * liquidity / total.max(1);
        let amount1 = r1 * liquidity / total.max(1);
        let params = self.full_range(-(liquidity as i128));
        let key = self.key;
        self.run_pair(
            HookCall::BeforeRemoveLiquidity { sender, key, params },
            HookCall::AfterRemoveLiquidity {
                sender,
                key,
                params,
                delta: BalanceDelta::new(-(amount0 as i128), -(amount1 as i128)),
            },
        )
    }

    /// Exact-input constant-product swap, output rounded down
    pub fn swap(
        &mut self,
        sender: Address,
        zero_for_one: bool,
        amount_in: u128,
        sqrt_price_limit_x64: Option<u128>,
    ) -> HookResult<BalanceDelta> {
        let (r0, r1) = self.reserves();
        let (reserve_in, reserve_out) = if zero_for_one { (r0, r1) } else { (r1, r0) };
        let amount_out = reserve_out * amount_in / (reserve_in + amount_in);
        let delta = if zero_for_one {
            BalanceDelta::new(amount_in as i128, -(amount_out as i128))
        } else {
            BalanceDelta::new(-(amount_out as i128), amount_in as i128)
        };
        self.swap_with_delta(sender, zero_for_one, amount_in, sqrt_price_limit_x64, delta)?;
        Ok(delta)
    }

    /// Swap reporting an arbitrary delta from the host engine
    pub fn swap_with_delta(
        &mut self,
        sender: Address,
        zero_for_one: bool,
        amount_in: u128,
        sqrt_price_limit_x64: Option<u128>,
        delta: BalanceDelta,
    ) -> HookResult<()> {
        let params = SwapParams {
            zero_for_one,
            amount_specified: -(amount_in as i128),
            sqrt_price_limit_x64,
        };
        let key = self.key;
        self.run_pair(
            HookCall::BeforeSwap { sender, key, params },
            HookCall::AfterSwap { sender, key, params, delta },
        )
    }

    pub fn donate(&mut self, sender: Address, amount0: u128, amount1: u128) -> HookResult<()> {
        let key = self.key;
        self.run_pair(
            HookCall::BeforeDonate { sender, key, amount0, amount1 },
            HookCall::AfterDonate { sender, key, amount0, amount1 },
        )
    }

    /// Initialized pool holding `(amount0, amount1)` from a dedicated LP
    pub fn seeded(amount0: u128, amount1: u128) -> Self {
        let mut harness = Self::new();
        harness.initialize().expect("initialize");
        harness
            .add_liquidity(Address::derive("seed-lp"), amount0, amount1)
            .expect("seed liquidity");
        harness.engine.drain_events();
        harness
    }
}
