/// Scenario runner. Loads a TOML scenario of named pools and ordered steps,
/// drives them through the host engine, the fee governor and the oracle on
/// a manual clock, and reports every step's outcome and emitted events.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use aegis_core::{
    Clock, FeeGovernor, HookEngine, InMemoryRegistry, ManualClock, ProtocolConfig, SharedClock,
    TwapOracle,
};
use aegis_math::sqrt_price_at_tick;
use aegis_types::{Address, HookEvent, PoolKey};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::pool_manager::PoolManager;
use crate::{SimulationError, SimulationResult};

const HOOK_LABEL: &str = "aegis-hook";
const MANAGER_LABEL: &str = "pool-manager";
const GOVERNOR_LABEL: &str = "fee-governor";

/// Account that owns the hook and administers the guard
pub const HOOK_OWNER: &str = "hook-owner";
/// Account that owns the fee governor
pub const GOVERNANCE_OWNER: &str = "governance-owner";

// ============================================================================
// Scenario File
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_start_time")]
    pub start_time: i64,
    #[serde(default)]
    pub pools: Vec<PoolSpec>,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

fn default_start_time() -> i64 {
    1_700_000_000
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> SimulationResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SimulationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> SimulationResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Pool declared up front and registered before any step runs. Tokens are
/// labels; the key orders them, so `amount0` belongs to whichever label
/// derives the lower address.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolSpec {
    pub name: String,
    pub token_a: String,
    pub token_b: String,
    #[serde(default = "default_fee")]
    pub fee: u32,
    #[serde(default = "default_tick_spacing")]
    pub tick_spacing: i32,
}

fn default_fee() -> u32 {
    3000
}

fn default_tick_spacing() -> i32 {
    60
}

impl PoolSpec {
    fn key(&self, hook: Address) -> SimulationResult<PoolKey> {
        Ok(PoolKey::new(
            Address::derive(&self.token_a),
            Address::derive(&self.token_b),
            self.fee,
            self.tick_spacing,
            hook,
        )?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepSpec {
    #[serde(flatten)]
    pub action: Action,
    /// The step is expected to be rejected
    #[serde(default)]
    pub expect_failure: bool,
}

fn default_deployer() -> String {
    "deployer".to_string()
}

fn default_hook_owner() -> String {
    HOOK_OWNER.to_string()
}

fn default_governance_owner() -> String {
    GOVERNANCE_OWNER.to_string()
}

fn default_keeper() -> String {
    "keeper".to_string()
}

fn enabled() -> bool {
    true
}

/// Accounts and tokens are named; names map to addresses with
/// `Address::derive`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Initialize {
        pool: String,
        #[serde(default = "default_deployer")]
        sender: String,
        #[serde(default)]
        tick: i32,
    },
    AddLiquidity {
        pool: String,
        sender: String,
        amount0: u64,
        amount1: u64,
    },
    RemoveLiquidity {
        pool: String,
        sender: String,
        liquidity: u64,
    },
    Swap {
        pool: String,
        sender: String,
        zero_for_one: bool,
        amount_in: u64,
        limit_tick: Option<i32>,
    },
    Donate {
        pool: String,
        sender: String,
        amount0: u64,
        amount1: u64,
    },
    Advance {
        seconds: i64,
    },
    Blacklist {
        account: String,
        #[serde(default = "enabled")]
        blacklisted: bool,
        #[serde(default = "default_hook_owner")]
        sender: String,
    },
    Pause {
        #[serde(default = "enabled")]
        paused: bool,
        #[serde(default = "default_hook_owner")]
        sender: String,
    },
    Propose {
        pool: String,
        fee: u32,
        delay: i64,
        #[serde(default = "default_governance_owner")]
        proposer: String,
    },
    Execute {
        proposal: u64,
        #[serde(default = "default_keeper")]
        sender: String,
    },
    Cancel {
        proposal: u64,
        #[serde(default = "default_governance_owner")]
        sender: String,
    },
    CollectProtocolFees {
        pool: String,
        recipient: String,
        #[serde(default = "default_hook_owner")]
        sender: String,
    },
    OracleUpdate {
        pool: String,
    },
    Consult {
        pool: String,
        seconds_ago: i64,
    },
    Twap {
        pool: String,
        window: i64,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Initialize { .. } => "initialize",
            Action::AddLiquidity { .. } => "add_liquidity",
            Action::RemoveLiquidity { .. } => "remove_liquidity",
            Action::Swap { .. } => "swap",
            Action::Donate { .. } => "donate",
            Action::Advance { .. } => "advance",
            Action::Blacklist { .. } => "blacklist",
            Action::Pause { .. } => "pause",
            Action::Propose { .. } => "propose",
            Action::Execute { .. } => "execute",
            Action::Cancel { .. } => "cancel",
            Action::CollectProtocolFees { .. } => "collect_protocol_fees",
            Action::OracleUpdate { .. } => "oracle_update",
            Action::Consult { .. } => "consult",
            Action::Twap { .. } => "twap",
        }
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub action: &'static str,
    pub timestamp: i64,
    pub succeeded: bool,
    pub expected_failure: bool,
    /// Result summary on success
    pub detail: Option<String>,
    pub error: Option<String>,
    pub events: Vec<HookEvent>,
}

impl StepOutcome {
    /// The step behaved as the scenario declared
    pub fn as_expected(&self) -> bool {
        self.succeeded != self.expected_failure
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolSummary {
    pub name: String,
    pub pool_id: String,
    pub initialized: bool,
    pub reserve0: u128,
    pub reserve1: u128,
    pub lp_fee: u32,
    pub price: u128,
    pub protocol_fees0: u128,
    pub protocol_fees1: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub steps: Vec<StepOutcome>,
    pub pools: Vec<PoolSummary>,
    /// Steps whose outcome differed from the declared expectation
    pub unexpected: usize,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.unexpected == 0
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Hook, governor and oracle wired to one manual clock
pub struct ScenarioRunner {
    clock: ManualClock,
    host: PoolManager,
    governor: FeeGovernor,
    oracle: TwapOracle,
    pools: BTreeMap<String, PoolKey>,
    hook_owner: Address,
}

impl ScenarioRunner {
    pub fn new(config: &ProtocolConfig, scenario: &Scenario) -> SimulationResult<Self> {
        config.validate()?;

        let clock = ManualClock::new(scenario.start_time);
        let shared: SharedClock = Arc::new(clock.clone());
        let hook = Address::derive(HOOK_LABEL);
        let hook_owner = Address::derive(HOOK_OWNER);

        let mut registry = InMemoryRegistry::new();
        let mut pools = BTreeMap::new();
        for spec in &scenario.pools {
            let key = spec.key(hook)?;
            if pools.insert(spec.name.clone(), key).is_some() {
                return Err(SimulationError::InvalidParameter(format!(
                    "duplicate pool name `{}`",
                    spec.name
                )));
            }
            registry.register(key)?;
        }

        let mut engine = HookEngine::new(
            hook,
            Address::derive(MANAGER_LABEL),
            hook_owner,
            config.hook.clone(),
            shared.clone(),
        )
        .with_registry(Arc::new(registry));
        let governor = FeeGovernor::new(
            Address::derive(GOVERNOR_LABEL),
            Address::derive(GOVERNANCE_OWNER),
            config.governance.clone(),
            shared.clone(),
        );
        engine.set_fee_controller(&hook_owner, governor.identity(), true)?;
        let oracle = TwapOracle::new(config.oracle.clone(), shared)?;

        info!(
            "scenario `{}`: {} pools, {} steps, starting at {}",
            scenario.name,
            pools.len(),
            scenario.steps.len(),
            scenario.start_time
        );

        Ok(Self {
            clock,
            host: PoolManager::new(engine),
            governor,
            oracle,
            pools,
            hook_owner,
        })
    }

    pub fn host(&self) -> &PoolManager {
        &self.host
    }

    pub fn governor(&self) -> &FeeGovernor {
        &self.governor
    }

    pub fn oracle(&self) -> &TwapOracle {
        &self.oracle
    }

    pub fn hook_owner(&self) -> Address {
        self.hook_owner
    }

    fn key(&self, name: &str) -> SimulationResult<PoolKey> {
        self.pools
            .get(name)
            .copied()
            .ok_or_else(|| SimulationError::UnknownPool(name.to_string()))
    }

    /// Run every step in order. Hook rejections are recorded as step
    /// outcomes; malformed steps stop the run.
    pub fn run(mut self, scenario: &Scenario) -> SimulationResult<ScenarioReport> {
        let mut steps = Vec::with_capacity(scenario.steps.len());

        for (index, step) in scenario.steps.iter().enumerate() {
            let timestamp = self.clock.now();
            let (detail, error) = match self.apply(&step.action) {
                Ok(detail) => (detail, None),
                Err(SimulationError::Hook(err)) => (None, Some(err.to_string())),
                Err(other) => return Err(other),
            };

            let outcome = StepOutcome {
                index,
                action: step.action.name(),
                timestamp,
                succeeded: error.is_none(),
                expected_failure: step.expect_failure,
                detail,
                error,
                events: self.drain_events(),
            };
            if outcome.as_expected() {
                info!("step {} {}: {}", index, outcome.action, outcome_label(&outcome));
            } else {
                warn!(
                    "step {} {}: unexpected {}",
                    index,
                    outcome.action,
                    outcome_label(&outcome)
                );
            }
            steps.push(outcome);
        }

        let unexpected = steps.iter().filter(|step| !step.as_expected()).count();
        Ok(ScenarioReport {
            name: scenario.name.clone(),
            pools: self.pool_summaries(),
            steps,
            unexpected,
        })
    }

    fn apply(&mut self, action: &Action) -> SimulationResult<Option<String>> {
        match action {
            Action::Initialize { pool, sender, tick } => {
                let key = self.key(pool)?;
                let sqrt_price = sqrt_price_at_tick(*tick)?;
                let tick = self.host.initialize(Address::derive(sender), key, sqrt_price)?;
                Ok(Some(format!("tick={}", tick)))
            }
            Action::AddLiquidity { pool, sender, amount0, amount1 } => {
                let key = self.key(pool)?;
                self.host.add_liquidity(
                    Address::derive(sender),
                    key,
                    *amount0 as u128,
                    *amount1 as u128,
                )?;
                self.reserves_detail(&key)
            }
            Action::RemoveLiquidity { pool, sender, liquidity } => {
                let key = self.key(pool)?;
                let delta =
                    self.host.remove_liquidity(Address::derive(sender), key, *liquidity as u128)?;
                Ok(Some(format!(
                    "amount0={} amount1={}",
                    delta.amount0.unsigned_abs(),
                    delta.amount1.unsigned_abs()
                )))
            }
            Action::Swap { pool, sender, zero_for_one, amount_in, limit_tick } => {
                let key = self.key(pool)?;
                let limit = limit_tick.map(sqrt_price_at_tick).transpose()?;
                let execution = self.host.swap_exact_input(
                    Address::derive(sender),
                    key,
                    *zero_for_one,
                    *amount_in as u128,
                    limit,
                )?;
                Ok(Some(format!(
                    "amount_out={} fee={}",
                    execution.amount_out, execution.fee_amount
                )))
            }
            Action::Donate { pool, sender, amount0, amount1 } => {
                let key = self.key(pool)?;
                self.host
                    .donate(Address::derive(sender), key, *amount0 as u128, *amount1 as u128)?;
                self.reserves_detail(&key)
            }
            Action::Advance { seconds } => {
                if *seconds < 0 {
                    return Err(SimulationError::InvalidParameter(
                        "clock cannot move backwards".to_string(),
                    ));
                }
                self.clock.advance(*seconds);
                Ok(Some(format!("now={}", self.clock.now())))
            }
            Action::Blacklist { account, blacklisted, sender } => {
                self.host.engine_mut().set_blacklisted(
                    &Address::derive(sender),
                    Address::derive(account),
                    *blacklisted,
                )?;
                Ok(None)
            }
            Action::Pause { paused, sender } => {
                self.host.engine_mut().set_paused(&Address::derive(sender), *paused)?;
                Ok(None)
            }
            Action::Propose { pool, fee, delay, proposer } => {
                let key = self.key(pool)?;
                let id = self.governor.create_proposal(
                    &Address::derive(proposer),
                    key.id(),
                    *fee,
                    *delay,
                )?;
                Ok(Some(format!("proposal={}", id)))
            }
            Action::Execute { proposal, sender } => {
                self.governor.execute_proposal(
                    self.host.engine_mut(),
                    &Address::derive(sender),
                    *proposal,
                )?;
                Ok(Some(format!("state={}", self.governor.status(*proposal)?)))
            }
            Action::Cancel { proposal, sender } => {
                self.governor.cancel_proposal(&Address::derive(sender), *proposal)?;
                Ok(Some(format!("state={}", self.governor.status(*proposal)?)))
            }
            Action::CollectProtocolFees { pool, recipient, sender } => {
                let key = self.key(pool)?;
                let (amount0, amount1) = self.host.engine_mut().collect_protocol_fees(
                    &Address::derive(sender),
                    &key.id(),
                    Address::derive(recipient),
                )?;
                Ok(Some(format!("amount0={} amount1={}", amount0, amount1)))
            }
            Action::OracleUpdate { pool } => {
                let key = self.key(pool)?;
                let observation = self.oracle.update_price(self.host.engine(), &key.id())?;
                Ok(Some(format!("price={}", observation.price)))
            }
            Action::Consult { pool, seconds_ago } => {
                let key = self.key(pool)?;
                let price = self.oracle.consult(&key.id(), *seconds_ago)?;
                Ok(Some(format!("price={}", price)))
            }
            Action::Twap { pool, window } => {
                let key = self.key(pool)?;
                let price = self.oracle.time_weighted_price(&key.id(), *window)?;
                Ok(Some(format!("price={}", price)))
            }
        }
    }

    fn reserves_detail(&self, key: &PoolKey) -> SimulationResult<Option<String>> {
        let (reserve0, reserve1) = self.host.engine().get_reserves(&key.id())?;
        Ok(Some(format!("reserve0={} reserve1={}", reserve0, reserve1)))
    }

    fn drain_events(&mut self) -> Vec<HookEvent> {
        let mut events = self.host.engine_mut().drain_events();
        events.extend(self.governor.drain_events());
        events.extend(self.oracle.drain_events());
        events
    }

    fn pool_summaries(&self) -> Vec<PoolSummary> {
        self.pools
            .iter()
            .map(|(name, key)| {
                let pool_id = key.id();
                match self.host.engine().pool(&pool_id) {
                    Ok(state) => PoolSummary {
                        name: name.clone(),
                        pool_id: pool_id.to_string(),
                        initialized: true,
                        reserve0: state.reserve0,
                        reserve1: state.reserve1,
                        lp_fee: state.lp_fee,
                        price: state.last_price,
                        protocol_fees0: state.protocol_fees0,
                        protocol_fees1: state.protocol_fees1,
                    },
                    Err(_) => PoolSummary {
                        name: name.clone(),
                        pool_id: pool_id.to_string(),
                        initialized: false,
                        reserve0: 0,
                        reserve1: 0,
                        lp_fee: key.fee,
                        price: 0,
                        protocol_fees0: 0,
                        protocol_fees1: 0,
                    },
                }
            })
            .collect()
    }
}

fn outcome_label(outcome: &StepOutcome) -> String {
    match (&outcome.detail, &outcome.error) {
        (_, Some(error)) => format!("rejected ({})", error),
        (Some(detail), None) => format!("ok ({})", detail),
        (None, None) => "ok".to_string(),
    }
}
