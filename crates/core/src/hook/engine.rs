/// The hook engine: the single entry point the host engine drives for every
/// pool lifecycle callback.
///
/// Each callback validates against a staged copy of the pool and commits
/// ledger, guard, in-flight and event changes together only when every
/// check has passed. A rejected callback leaves the engine untouched.

use std::collections::HashSet;
use std::sync::Arc;

use aegis_math::{
    expected_output, is_sqrt_price_valid, is_tick_range_valid, is_tick_valid, mul_div_u128,
    price_impact_bps, price_impact_from_limit, safe_add_u128, safe_calculate_bps, safe_sub_u128,
};
use aegis_types::{
    Address, BalanceDelta, HookError, HookEvent, HookResult, ModifyLiquidityParams, PoolId,
    PoolKey, ReserveChange, SwapParams, MAX_FEE, MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64,
};
use log::{debug, warn};

use crate::clock::SharedClock;
use crate::config::{HookConfig, PostSwapSlippage};
use crate::events::EventLog;
use crate::governance::FeeController;
use crate::guard::MevGuard;
use crate::hook::call::{HookCall, HookKind, HookPermissions, HookResponse};
use crate::ledger::{PoolState, ReserveLedger};
use crate::oracle::ReserveSource;
use crate::reentrancy::{InFlightTracker, OperationStatus};
use crate::registry::PoolRegistry;

pub struct HookEngine {
    /// Identity pool keys must name in `hooks`
    address: Address,
    /// Only caller allowed to drive callbacks
    pool_manager: Address,
    owner: Address,
    config: HookConfig,
    clock: SharedClock,
    registry: Option<Arc<dyn PoolRegistry>>,

    ledger: ReserveLedger,
    guard: MevGuard,
    in_flight: InFlightTracker,
    fee_controllers: HashSet<Address>,
    paused: bool,
    events: EventLog,
}

impl HookEngine {
    pub fn new(
        address: Address,
        pool_manager: Address,
        owner: Address,
        config: HookConfig,
        clock: SharedClock,
    ) -> Self {
        let guard = MevGuard::new(owner, config.cooldown_seconds);
        Self {
            address,
            pool_manager,
            owner,
            config,
            clock,
            registry: None,
            ledger: ReserveLedger::new(),
            guard,
            in_flight: InFlightTracker::new(),
            fee_controllers: HashSet::new(),
            paused: false,
            events: EventLog::new(),
        }
    }

    /// Consult a pool registry before initializing pools
    pub fn with_registry(mut self, registry: Arc<dyn PoolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    // ========================================================================
    // Host Engine Interface
    // ========================================================================

    /// Run one callback. `caller` must be the pool manager.
    pub fn dispatch(&mut self, caller: &Address, call: HookCall) -> HookResult<HookResponse> {
        let kind = call.kind();
        if *caller != self.pool_manager {
            return Err(HookError::unauthorized(*caller, kind.name()));
        }
        let pool_id = call.pool_id();
        let now = self.clock.now();

        let result = match call {
            HookCall::BeforeInitialize { sender, key, sqrt_price_x64 } => {
                self.before_initialize(&sender, &key, sqrt_price_x64)
            }
            HookCall::AfterInitialize { sender, key, sqrt_price_x64, tick } => {
                self.after_initialize(sender, key, sqrt_price_x64, tick, now)
            }
            HookCall::BeforeAddLiquidity { sender, key, params } => {
                self.before_modify_liquidity(&sender, &key, &params, HookKind::BeforeAddLiquidity)
            }
            HookCall::AfterAddLiquidity { sender, key, delta, .. } => {
                self.after_add_liquidity(sender, &key, delta, now)
            }
            HookCall::BeforeRemoveLiquidity { sender, key, params } => {
                self.before_modify_liquidity(&sender, &key, &params, HookKind::BeforeRemoveLiquidity)
            }
            HookCall::AfterRemoveLiquidity { sender, key, delta, .. } => {
                self.after_remove_liquidity(sender, &key, delta, now)
            }
            HookCall::BeforeSwap { sender, key, params } => {
                self.before_swap(&sender, &key, &params, now)
            }
            HookCall::AfterSwap { sender, key, params, delta } => {
                self.after_swap(sender, &key, &params, delta, now)
            }
            HookCall::BeforeDonate { sender, key, amount0, amount1 } => {
                self.before_donate(&sender, &key, amount0, amount1)
            }
            HookCall::AfterDonate { sender, key, amount0, amount1 } => {
                self.after_donate(sender, &key, amount0, amount1, now)
            }
        };

        match &result {
            Ok(()) => debug!("{} accepted for pool {}", kind, pool_id),
            Err(err) => debug!("{} rejected for pool {}: {}", kind, pool_id, err),
        }
        result.map(|()| HookResponse::accept(kind))
    }

    /// Close the open operation on a pool after the host engine failed
    /// between the before- and after-callback.
    pub fn abort(&mut self, caller: &Address, pool_id: &PoolId) -> HookResult<Option<HookKind>> {
        if *caller != self.pool_manager {
            return Err(HookError::unauthorized(*caller, "abort"));
        }
        Ok(self.in_flight.abort(pool_id))
    }

    pub fn permissions(&self) -> HookPermissions {
        HookPermissions::all_callbacks()
    }

    // ========================================================================
    // Initialization
    // ========================================================================

    fn before_initialize(
        &mut self,
        sender: &Address,
        key: &PoolKey,
        sqrt_price_x64: u128,
    ) -> HookResult<()> {
        let pool_id = key.id();
        self.check_entry(sender, &pool_id)?;

        key.validate()?;
        if key.hooks != self.address {
            return Err(HookError::invalid_pool("pool key names a different hook"));
        }
        if let Some(registry) = &self.registry {
            registry.validate_pool(key)?;
            if registry.get_hook(&pool_id) != Some(self.address) {
                return Err(HookError::invalid_pool("registry reports a different hook"));
            }
        }
        if self.ledger.contains(&pool_id) {
            return Err(HookError::PoolAlreadyInitialized { pool_id });
        }
        self.check_start_price(sqrt_price_x64)?;

        self.in_flight.begin(pool_id, HookKind::BeforeInitialize)
    }

    fn after_initialize(
        &mut self,
        sender: Address,
        key: PoolKey,
        sqrt_price_x64: u128,
        tick: i32,
        now: i64,
    ) -> HookResult<()> {
        let pool_id = key.id();
        self.in_flight.ensure_matches(&pool_id, HookKind::AfterInitialize)?;
        if self.ledger.contains(&pool_id) {
            return Err(HookError::PoolAlreadyInitialized { pool_id });
        }
        self.check_start_price(sqrt_price_x64)?;
        if !is_tick_valid(tick) {
            return Err(HookError::InvalidTick { tick });
        }

        let state = PoolState::new(key, sqrt_price_x64, tick, self.config.protocol_fee_bps, now);

        self.in_flight.complete(&pool_id, HookKind::AfterInitialize)?;
        self.ledger.commit(state);
        self.events.emit(HookEvent::PoolInitialized {
            pool_id,
            key,
            sender,
            sqrt_price_x64,
            tick,
            timestamp: now,
        });
        Ok(())
    }

    // ========================================================================
    // Liquidity
    // ========================================================================

    fn before_modify_liquidity(
        &mut self,
        sender: &Address,
        key: &PoolKey,
        params: &ModifyLiquidityParams,
        kind: HookKind,
    ) -> HookResult<()> {
        let pool_id = key.id();
        self.check_entry(sender, &pool_id)?;
        let pool = self.ledger.get(&pool_id)?;

        if !is_tick_range_valid(params.tick_lower, params.tick_upper, key.tick_spacing) {
            return Err(HookError::InvalidTickRange {
                tick_lower: params.tick_lower,
                tick_upper: params.tick_upper,
                tick_spacing: key.tick_spacing,
            });
        }

        if kind == HookKind::BeforeAddLiquidity {
            if params.liquidity_delta <= 0 {
                return Err(HookError::invalid_amount("liquidity delta must be positive to add"));
            }
        } else {
            if params.liquidity_delta >= 0 {
                return Err(HookError::invalid_amount("liquidity delta must be negative to remove"));
            }
            self.check_removal_floor(pool, params.liquidity_delta.unsigned_abs())?;
        }

        self.in_flight.begin(pool_id, kind)
    }

    /// Estimate the full-range withdrawal for `liquidity` and require the
    /// remaining reserves to stay above the floor.
    fn check_removal_floor(&self, pool: &PoolState, liquidity: u128) -> HookResult<()> {
        let minimum = self.config.min_liquidity;
        let total = pool.liquidity()?;
        if total == 0 || liquidity > total {
            return Err(HookError::InsufficientLiquidity {
                reserve0: pool.reserve0,
                reserve1: pool.reserve1,
                minimum,
            });
        }
        let withdrawn0 = mul_div_u128(pool.reserve0, liquidity, total)?;
        let withdrawn1 = mul_div_u128(pool.reserve1, liquidity, total)?;
        let remaining0 = safe_sub_u128(pool.reserve0, withdrawn0, "removal estimate")?;
        let remaining1 = safe_sub_u128(pool.reserve1, withdrawn1, "removal estimate")?;
        if remaining0 < minimum || remaining1 < minimum {
            return Err(HookError::InsufficientLiquidity {
                reserve0: remaining0,
                reserve1: remaining1,
                minimum,
            });
        }
        Ok(())
    }

    fn after_add_liquidity(
        &mut self,
        sender: Address,
        key: &PoolKey,
        delta: BalanceDelta,
        now: i64,
    ) -> HookResult<()> {
        let pool_id = key.id();
        self.in_flight.ensure_matches(&pool_id, HookKind::AfterAddLiquidity)?;
        if delta.amount0 < 0 || delta.amount1 < 0 || delta.is_zero() {
            return Err(HookError::invalid_amount(
                "liquidity add delta must be non-negative and non-zero",
            ));
        }

        let mut staged = self.ledger.stage(&pool_id)?;
        let invariant_before = staged.last_invariant;
        let change = staged.apply_delta(delta, now)?;
        if staged.last_invariant < invariant_before {
            return Err(HookError::InvariantDecreased {
                before: invariant_before.to_string(),
                after: staged.last_invariant.to_string(),
            });
        }
        let fees = self.deduct_protocol_fee(&mut staged, delta, now)?;
        staged.check_floor(self.config.min_liquidity)?;

        let (amount0, amount1) = delta.inflows();
        let reserves = ReserveChange {
            reserve0_after: staged.reserve0,
            reserve1_after: staged.reserve1,
            ..change
        };
        self.in_flight.complete(&pool_id, HookKind::AfterAddLiquidity)?;
        self.ledger.commit(staged);
        self.guard.record(sender, now);
        self.emit_protocol_fees(pool_id, fees, now);
        self.events.emit(HookEvent::LiquidityAdded {
            pool_id,
            sender,
            amount0,
            amount1,
            reserves,
            timestamp: now,
        });
        Ok(())
    }

    fn after_remove_liquidity(
        &mut self,
        sender: Address,
        key: &PoolKey,
        delta: BalanceDelta,
        now: i64,
    ) -> HookResult<()> {
        let pool_id = key.id();
        self.in_flight.ensure_matches(&pool_id, HookKind::AfterRemoveLiquidity)?;
        if delta.amount0 > 0 || delta.amount1 > 0 || delta.is_zero() {
            return Err(HookError::invalid_amount(
                "liquidity remove delta must be non-positive and non-zero",
            ));
        }

        let mut staged = self.ledger.stage(&pool_id)?;
        let had_liquidity = staged.has_liquidity();
        let reserves = staged.apply_delta(delta, now)?;
        if had_liquidity {
            staged.require_reserves(self.config.min_liquidity)?;
        }

        let (amount0, amount1) = delta.outflows();
        self.in_flight.complete(&pool_id, HookKind::AfterRemoveLiquidity)?;
        self.ledger.commit(staged);
        self.guard.record(sender, now);
        self.events.emit(HookEvent::LiquidityRemoved {
            pool_id,
            sender,
            amount0,
            amount1,
            reserves,
            timestamp: now,
        });
        Ok(())
    }

    /// Move the protocol share of a deposit out of the reserves
    fn deduct_protocol_fee(
        &self,
        staged: &mut PoolState,
        delta: BalanceDelta,
        now: i64,
    ) -> HookResult<(u128, u128)> {
        let bps = staged.protocol_fee_bps as u64;
        if bps == 0 {
            return Ok((0, 0));
        }
        let (in0, in1) = delta.inflows();
        let fee0 = safe_calculate_bps(in0, bps)?;
        let fee1 = safe_calculate_bps(in1, bps)?;
        if fee0 > 0 || fee1 > 0 {
            staged.accrue_protocol_fees(fee0, fee1, now)?;
        }
        Ok((fee0, fee1))
    }

    fn emit_protocol_fees(&mut self, pool_id: PoolId, (amount0, amount1): (u128, u128), now: i64) {
        if amount0 > 0 || amount1 > 0 {
            self.events.emit(HookEvent::ProtocolFeesCollected {
                pool_id,
                amount0,
                amount1,
                timestamp: now,
            });
        }
    }

    // ========================================================================
    // Swaps
    // ========================================================================

    fn before_swap(
        &mut self,
        sender: &Address,
        key: &PoolKey,
        params: &SwapParams,
        now: i64,
    ) -> HookResult<()> {
        let pool_id = key.id();
        self.check_entry(sender, &pool_id)?;
        let pool = self.ledger.get(&pool_id)?;
        if pool.reserve0 == 0 || pool.reserve1 == 0 {
            return Err(HookError::InsufficientLiquidity {
                reserve0: pool.reserve0,
                reserve1: pool.reserve1,
                minimum: self.config.min_liquidity,
            });
        }
        self.guard.check_cooldown(sender, now)?;
        if params.amount_specified == 0 {
            return Err(HookError::invalid_amount("swap amount is zero"));
        }

        if let Some(limit) = params.sqrt_price_limit_x64 {
            let current = pool.sqrt_price_x64;
            let (min, max) = if params.zero_for_one {
                (MIN_SQRT_PRICE_X64, current.saturating_sub(1))
            } else {
                (current.saturating_add(1), MAX_SQRT_PRICE_X64)
            };
            if limit < min || limit > max {
                return Err(HookError::InvalidPrice { sqrt_price_x64: limit, min, max });
            }
            let impact = price_impact_from_limit(current, limit, params.zero_for_one)?;
            MevGuard::check_slippage(impact, self.config.max_slippage_bps)?;
        }

        self.in_flight.begin(pool_id, HookKind::BeforeSwap)
    }

    fn after_swap(
        &mut self,
        sender: Address,
        key: &PoolKey,
        params: &SwapParams,
        delta: BalanceDelta,
        now: i64,
    ) -> HookResult<()> {
        let pool_id = key.id();
        self.in_flight.ensure_matches(&pool_id, HookKind::AfterSwap)?;

        let (amount_in, amount_out) = if params.zero_for_one {
            (delta.amount0, delta.amount1)
        } else {
            (delta.amount1, delta.amount0)
        };
        if amount_in <= 0 || amount_out > 0 {
            return Err(HookError::invalid_amount("swap delta does not match direction"));
        }
        let amount_in = amount_in.unsigned_abs();
        let amount_out = amount_out.unsigned_abs();

        let mut staged = self.ledger.stage(&pool_id)?;
        let price_before = staged.last_price;
        let invariant_before = staged.last_invariant;
        let change = staged.apply_delta(delta, now)?;
        if staged.last_invariant < invariant_before {
            return Err(HookError::InvariantDecreased {
                before: invariant_before.to_string(),
                after: staged.last_invariant.to_string(),
            });
        }
        staged.require_reserves(self.config.min_liquidity)?;
        self.check_realized_slippage(price_before, amount_in, amount_out, params.zero_for_one)?;

        let price_after = staged.last_price;
        self.in_flight.complete(&pool_id, HookKind::AfterSwap)?;
        self.ledger.commit(staged);
        self.guard.record(sender, now);
        self.events.emit(HookEvent::SwapCompleted {
            pool_id,
            sender,
            zero_for_one: params.zero_for_one,
            amount_in,
            amount_out,
            reserves: change,
            price_after,
            timestamp: now,
        });
        Ok(())
    }

    fn check_realized_slippage(
        &self,
        price_before: u128,
        amount_in: u128,
        amount_out: u128,
        zero_for_one: bool,
    ) -> HookResult<()> {
        let mode = self.config.post_swap_slippage;
        if mode == PostSwapSlippage::Disabled {
            return Ok(());
        }
        let expected = expected_output(amount_in, price_before, zero_for_one)?;
        let impact = price_impact_bps(expected, amount_out)?;
        match MevGuard::check_slippage(impact, self.config.max_slippage_bps) {
            Err(err) if mode == PostSwapSlippage::Advisory => {
                warn!("realized slippage above bound, settling anyway: {}", err);
                Ok(())
            }
            other => other,
        }
    }

    // ========================================================================
    // Donations
    // ========================================================================

    fn before_donate(
        &mut self,
        sender: &Address,
        key: &PoolKey,
        amount0: u128,
        amount1: u128,
    ) -> HookResult<()> {
        let pool_id = key.id();
        self.check_entry(sender, &pool_id)?;
        let pool = self.ledger.get(&pool_id)?;
        if !pool.has_liquidity() {
            return Err(HookError::InsufficientLiquidity {
                reserve0: pool.reserve0,
                reserve1: pool.reserve1,
                minimum: self.config.min_liquidity,
            });
        }
        if amount0 == 0 && amount1 == 0 {
            return Err(HookError::invalid_amount("donation is zero"));
        }
        donation_delta(amount0, amount1)?;
        safe_add_u128(pool.reserve0, amount0, "donation")?;
        safe_add_u128(pool.reserve1, amount1, "donation")?;

        self.in_flight.begin(pool_id, HookKind::BeforeDonate)
    }

    fn after_donate(
        &mut self,
        sender: Address,
        key: &PoolKey,
        amount0: u128,
        amount1: u128,
        now: i64,
    ) -> HookResult<()> {
        let pool_id = key.id();
        self.in_flight.ensure_matches(&pool_id, HookKind::AfterDonate)?;

        let mut staged = self.ledger.stage(&pool_id)?;
        let reserves = staged.apply_delta(donation_delta(amount0, amount1)?, now)?;

        self.in_flight.complete(&pool_id, HookKind::AfterDonate)?;
        self.ledger.commit(staged);
        self.events.emit(HookEvent::DonationProcessed {
            pool_id,
            sender,
            amount0,
            amount1,
            reserves,
            timestamp: now,
        });
        Ok(())
    }

    // ========================================================================
    // Shared Checks
    // ========================================================================

    /// Gate for every before-callback
    fn check_entry(&self, sender: &Address, pool_id: &PoolId) -> HookResult<()> {
        if self.paused {
            return Err(HookError::HookPaused);
        }
        self.in_flight.ensure_unlocked(pool_id)?;
        self.guard.check_blacklist(sender)
    }

    fn check_start_price(&self, sqrt_price_x64: u128) -> HookResult<()> {
        let (min, max) = (self.config.min_sqrt_price_x64, self.config.max_sqrt_price_x64);
        if !is_sqrt_price_valid(sqrt_price_x64) || sqrt_price_x64 < min || sqrt_price_x64 > max {
            return Err(HookError::InvalidPrice { sqrt_price_x64, min, max });
        }
        Ok(())
    }

    // ========================================================================
    // Owner Operations
    // ========================================================================

    fn require_owner(&self, caller: &Address, operation: &'static str) -> HookResult<()> {
        if *caller != self.owner {
            return Err(HookError::unauthorized(*caller, operation));
        }
        Ok(())
    }

    /// While paused every before-callback fails
    pub fn set_paused(&mut self, caller: &Address, paused: bool) -> HookResult<()> {
        self.require_owner(caller, "set_paused")?;
        if self.paused != paused {
            warn!("hook {} {}", self.address, if paused { "paused" } else { "unpaused" });
        }
        self.paused = paused;
        Ok(())
    }

    pub fn set_blacklisted(
        &mut self,
        caller: &Address,
        account: Address,
        blacklisted: bool,
    ) -> HookResult<()> {
        let now = self.clock.now();
        let event = self.guard.set_blacklisted(caller, account, blacklisted, now)?;
        self.events.emit(event);
        Ok(())
    }

    /// Grant or revoke the right to call `update_fee`
    pub fn set_fee_controller(
        &mut self,
        caller: &Address,
        account: Address,
        enabled: bool,
    ) -> HookResult<()> {
        self.require_owner(caller, "set_fee_controller")?;
        if enabled {
            self.fee_controllers.insert(account);
        } else {
            self.fee_controllers.remove(&account);
        }
        Ok(())
    }

    /// Withdraw the accrued protocol fees of a pool
    pub fn collect_protocol_fees(
        &mut self,
        caller: &Address,
        pool_id: &PoolId,
        recipient: Address,
    ) -> HookResult<(u128, u128)> {
        self.require_owner(caller, "collect_protocol_fees")?;
        self.in_flight.ensure_unlocked(pool_id)?;
        let now = self.clock.now();
        let mut staged = self.ledger.stage(pool_id)?;
        let collected = (staged.protocol_fees0, staged.protocol_fees1);
        staged.protocol_fees0 = 0;
        staged.protocol_fees1 = 0;

        self.ledger.commit(staged);
        self.events.emit(HookEvent::ProtocolFeesWithdrawn {
            pool_id: *pool_id,
            recipient,
            amount0: collected.0,
            amount1: collected.1,
            timestamp: now,
        });
        Ok(collected)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn pool(&self, pool_id: &PoolId) -> HookResult<&PoolState> {
        self.ledger.get(pool_id)
    }

    pub fn get_reserves(&self, pool_id: &PoolId) -> HookResult<(u128, u128)> {
        Ok(self.ledger.get(pool_id)?.reserves())
    }

    /// Last price (18 decimals) and the time it was set
    pub fn get_price(&self, pool_id: &PoolId) -> HookResult<(u128, i64)> {
        let pool = self.ledger.get(pool_id)?;
        Ok((pool.last_price, pool.last_update_timestamp))
    }

    pub fn operation_status(&self, pool_id: &PoolId) -> OperationStatus {
        self.in_flight.status(pool_id)
    }

    pub fn guard(&self) -> &MevGuard {
        &self.guard
    }

    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn pool_manager(&self) -> Address {
        self.pool_manager
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_fee_controller(&self, account: &Address) -> bool {
        self.fee_controllers.contains(account)
    }

    pub fn events(&self) -> &[HookEvent] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<HookEvent> {
        self.events.drain()
    }
}

fn donation_delta(amount0: u128, amount1: u128) -> HookResult<BalanceDelta> {
    let amount0 = i128::try_from(amount0).map_err(|_| HookError::overflow("donation"))?;
    let amount1 = i128::try_from(amount1).map_err(|_| HookError::overflow("donation"))?;
    Ok(BalanceDelta::new(amount0, amount1))
}

// ============================================================================
// Interfaces for Governance and Oracle
// ============================================================================

impl FeeController for HookEngine {
    fn update_fee(&mut self, caller: &Address, pool_id: &PoolId, new_fee: u32) -> HookResult<bool> {
        if !self.fee_controllers.contains(caller) {
            return Err(HookError::unauthorized(*caller, "update_fee"));
        }
        if new_fee > MAX_FEE {
            return Err(HookError::InvalidFee { fee: new_fee, max_fee: MAX_FEE });
        }
        let mut staged = self.ledger.stage(pool_id)?;
        let old_fee = staged.lp_fee;
        if old_fee == new_fee {
            return Ok(false);
        }
        staged.lp_fee = new_fee;

        let now = self.clock.now();
        self.ledger.commit(staged);
        self.events.emit(HookEvent::FeeUpdated {
            pool_id: *pool_id,
            caller: *caller,
            old_fee,
            new_fee,
            timestamp: now,
        });
        Ok(true)
    }
}

impl ReserveSource for HookEngine {
    fn get_reserves(&self, pool_id: &PoolId) -> HookResult<(u128, u128)> {
        Ok(self.ledger.get(pool_id)?.reserves())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use aegis_types::Q64;

    fn setup() -> (HookEngine, PoolKey, Address) {
        let manager = Address::derive("pool-manager");
        let hook = Address::derive("hook");
        let engine = HookEngine::new(
            hook,
            manager,
            Address::derive("owner"),
            HookConfig::default(),
            Arc::new(ManualClock::new(1_000)),
        );
        let key = PoolKey::new(Address::derive("a"), Address::derive("b"), 3000, 60, hook).unwrap();
        (engine, key, manager)
    }

    #[test]
    fn test_dispatch_rejects_foreign_caller() {
        let (mut engine, key, _) = setup();
        let call = HookCall::BeforeInitialize {
            sender: Address::derive("alice"),
            key,
            sqrt_price_x64: Q64,
        };
        let err = engine.dispatch(&Address::derive("mallory"), call).unwrap_err();
        assert!(matches!(err, HookError::UnauthorizedCaller { operation: "before_initialize", .. }));
    }

    #[test]
    fn test_initialize_pair() {
        let (mut engine, key, manager) = setup();
        let sender = Address::derive("alice");
        let response = engine
            .dispatch(&manager, HookCall::BeforeInitialize { sender, key, sqrt_price_x64: Q64 })
            .unwrap();
        assert_eq!(response, HookResponse::accept(HookKind::BeforeInitialize));
        assert_eq!(
            engine.operation_status(&key.id()),
            OperationStatus::InFlight(HookKind::BeforeInitialize)
        );
        engine
            .dispatch(&manager, HookCall::AfterInitialize { sender, key, sqrt_price_x64: Q64, tick: 0 })
            .unwrap();

        let pool = engine.pool(&key.id()).unwrap();
        assert_eq!(pool.reserves(), (0, 0));
        assert_eq!(pool.lp_fee, 3000);
        assert_eq!(pool.created_at, 1_000);
        assert_eq!(engine.drain_events().len(), 1);
    }

    #[test]
    fn test_wrong_hook_address_rejected() {
        let (mut engine, key, manager) = setup();
        let foreign = PoolKey { hooks: Address::derive("other-hook"), ..key };
        let err = engine
            .dispatch(
                &manager,
                HookCall::BeforeInitialize { sender: Address::derive("alice"), key: foreign, sqrt_price_x64: Q64 },
            )
            .unwrap_err();
        assert!(matches!(err, HookError::InvalidPoolParameters { .. }));
    }

    #[test]
    fn test_owner_controls() {
        let (mut engine, _, _) = setup();
        let owner = Address::derive("owner");
        let stranger = Address::derive("stranger");
        assert!(engine.set_paused(&stranger, true).is_err());
        engine.set_paused(&owner, true).unwrap();
        assert!(engine.is_paused());
        assert!(engine.set_fee_controller(&stranger, stranger, true).is_err());
        engine.set_fee_controller(&owner, stranger, true).unwrap();
        assert!(engine.is_fee_controller(&stranger));
        assert_eq!(engine.abort(&stranger, &PoolId([0u8; 32])).unwrap_err().category().to_string(), "access");
    }
}
