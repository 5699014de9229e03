/// Time-delayed fee governance. Authorized principals propose a new LP fee
/// for a pool; once the timelock expires anyone may execute the proposal,
/// which applies the fee through the hook's `FeeController` interface.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use aegis_types::{Address, HookError, HookEvent, HookResult, PoolId};
use log::info;
use serde::{Deserialize, Serialize};

use crate::clock::SharedClock;
use crate::config::GovernanceConfig;
use crate::events::EventLog;

/// The single path through which a pool's LP fee changes
pub trait FeeController {
    /// Set the fee; `Ok(false)` when it already had that value
    fn update_fee(&mut self, caller: &Address, pool_id: &PoolId, new_fee: u32) -> HookResult<bool>;
}

// ============================================================================
// Proposals
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    /// Active and still inside its timelock. Reported, never stored.
    Pending,
    Active,
    Executed,
    Cancelled,
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalState::Pending => "pending",
            ProposalState::Active => "active",
            ProposalState::Executed => "executed",
            ProposalState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub proposer: Address,
    pub pool_id: PoolId,
    /// Fee in pips
    pub new_fee: u32,
    /// Timelock in seconds
    pub delay: i64,
    pub created_at: i64,
    state: ProposalState,
    pub executed_at: Option<i64>,
    pub cancelled_at: Option<i64>,
}

impl Proposal {
    pub fn state(&self) -> ProposalState {
        self.state
    }

    pub fn executable_at(&self) -> i64 {
        self.created_at.saturating_add(self.delay)
    }

    /// State as observed at `now`
    pub fn status_at(&self, now: i64) -> ProposalState {
        if self.state == ProposalState::Active && now < self.executable_at() {
            ProposalState::Pending
        } else {
            self.state
        }
    }

    /// Active proposals move once, to executed or cancelled
    fn transition_to(&mut self, new_state: ProposalState, now: i64) -> HookResult<()> {
        match (self.state, new_state) {
            (ProposalState::Active, ProposalState::Executed) => self.executed_at = Some(now),
            (ProposalState::Active, ProposalState::Cancelled) => self.cancelled_at = Some(now),
            (state, _) => {
                return Err(HookError::ProposalNotActive {
                    proposal_id: self.id,
                    state: state.to_string(),
                })
            }
        }
        self.state = new_state;
        Ok(())
    }

    fn ensure_active(&self) -> HookResult<()> {
        if self.state != ProposalState::Active {
            return Err(HookError::ProposalNotActive {
                proposal_id: self.id,
                state: self.state.to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Governor
// ============================================================================

pub struct FeeGovernor {
    /// Identity presented to the fee controller
    identity: Address,
    owner: Address,
    config: GovernanceConfig,
    clock: SharedClock,
    proposers: HashSet<Address>,
    authorized: HashSet<Address>,
    proposals: BTreeMap<u64, Proposal>,
    next_id: u64,
    events: EventLog,
}

impl FeeGovernor {
    pub fn new(identity: Address, owner: Address, config: GovernanceConfig, clock: SharedClock) -> Self {
        Self {
            identity,
            owner,
            config,
            clock,
            proposers: HashSet::new(),
            authorized: HashSet::new(),
            proposals: BTreeMap::new(),
            next_id: 1,
            events: EventLog::new(),
        }
    }

    pub fn identity(&self) -> Address {
        self.identity
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    fn can_propose(&self, account: &Address) -> bool {
        *account == self.owner || self.proposers.contains(account) || self.authorized.contains(account)
    }

    fn require_owner(&self, caller: &Address, operation: &'static str) -> HookResult<()> {
        if *caller != self.owner {
            return Err(HookError::unauthorized(*caller, operation));
        }
        Ok(())
    }

    // ========================================================================
    // Workflow
    // ========================================================================

    pub fn create_proposal(
        &mut self,
        caller: &Address,
        pool_id: PoolId,
        new_fee: u32,
        delay: i64,
    ) -> HookResult<u64> {
        if !self.can_propose(caller) {
            return Err(HookError::unauthorized(*caller, "create_proposal"));
        }
        if new_fee > self.config.max_fee {
            return Err(HookError::InvalidFee { fee: new_fee, max_fee: self.config.max_fee });
        }
        if delay < self.config.min_delay || delay > self.config.max_delay {
            return Err(HookError::InvalidDelay {
                delay,
                min_delay: self.config.min_delay,
                max_delay: self.config.max_delay,
            });
        }

        let now = self.clock.now();
        let id = self.next_id;
        self.next_id += 1;
        self.proposals.insert(
            id,
            Proposal {
                id,
                proposer: *caller,
                pool_id,
                new_fee,
                delay,
                created_at: now,
                state: ProposalState::Active,
                executed_at: None,
                cancelled_at: None,
            },
        );
        self.events.emit(HookEvent::ProposalCreated {
            proposal_id: id,
            proposer: *caller,
            pool_id,
            new_fee,
            delay,
            created_at: now,
        });
        Ok(id)
    }

    /// Apply an expired proposal. Callable by anyone. If the controller
    /// rejects the fee the proposal stays active.
    pub fn execute_proposal<C: FeeController + ?Sized>(
        &mut self,
        controller: &mut C,
        caller: &Address,
        proposal_id: u64,
    ) -> HookResult<()> {
        let now = self.clock.now();
        let proposal = self
            .proposals
            .get(&proposal_id)
            .ok_or(HookError::ProposalNotFound { proposal_id })?;
        proposal.ensure_active()?;
        if now < proposal.executable_at() {
            return Err(HookError::DelayNotElapsed {
                proposal_id,
                executable_at: proposal.executable_at(),
                now,
            });
        }
        let (pool_id, new_fee) = (proposal.pool_id, proposal.new_fee);

        let changed = controller.update_fee(&self.identity, &pool_id, new_fee)?;
        if !changed {
            info!("proposal {} executed with fee already at {}", proposal_id, new_fee);
        }

        if let Some(proposal) = self.proposals.get_mut(&proposal_id) {
            proposal.transition_to(ProposalState::Executed, now)?;
        }
        self.events.emit(HookEvent::ProposalExecuted {
            proposal_id,
            executor: *caller,
            pool_id,
            new_fee,
            timestamp: now,
        });
        Ok(())
    }

    /// Cancel an active proposal. Proposer, owner or an authorized account.
    pub fn cancel_proposal(&mut self, caller: &Address, proposal_id: u64) -> HookResult<()> {
        let now = self.clock.now();
        let allowed = {
            let proposal = self
                .proposals
                .get(&proposal_id)
                .ok_or(HookError::ProposalNotFound { proposal_id })?;
            proposal.proposer == *caller || *caller == self.owner || self.authorized.contains(caller)
        };
        if !allowed {
            return Err(HookError::unauthorized(*caller, "cancel_proposal"));
        }

        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(HookError::ProposalNotFound { proposal_id })?;
        proposal.transition_to(ProposalState::Cancelled, now)?;
        let pool_id = proposal.pool_id;

        self.events.emit(HookEvent::ProposalCancelled {
            proposal_id,
            canceller: *caller,
            pool_id,
            timestamp: now,
        });
        Ok(())
    }

    // ========================================================================
    // Roles
    // ========================================================================

    pub fn set_proposer(&mut self, caller: &Address, account: Address, enabled: bool) -> HookResult<()> {
        self.require_owner(caller, "set_proposer")?;
        if enabled {
            self.proposers.insert(account);
        } else {
            self.proposers.remove(&account);
        }
        Ok(())
    }

    pub fn set_authorized(&mut self, caller: &Address, account: Address, enabled: bool) -> HookResult<()> {
        self.require_owner(caller, "set_authorized")?;
        if enabled {
            self.authorized.insert(account);
        } else {
            self.authorized.remove(&account);
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn proposal(&self, proposal_id: u64) -> Option<&Proposal> {
        self.proposals.get(&proposal_id)
    }

    /// Reported status of a proposal right now
    pub fn status(&self, proposal_id: u64) -> HookResult<ProposalState> {
        let proposal = self
            .proposals
            .get(&proposal_id)
            .ok_or(HookError::ProposalNotFound { proposal_id })?;
        Ok(proposal.status_at(self.clock.now()))
    }

    /// Proposals for a pool, oldest first
    pub fn proposals_for_pool(&self, pool_id: &PoolId) -> Vec<&Proposal> {
        self.proposals
            .values()
            .filter(|proposal| proposal.pool_id == *pool_id)
            .collect()
    }

    pub fn drain_events(&mut self) -> Vec<HookEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use aegis_types::SECONDS_PER_DAY;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Records fees; rejects callers other than `allowed`
    struct RecordingController {
        allowed: Address,
        fees: HashMap<PoolId, u32>,
    }

    impl FeeController for RecordingController {
        fn update_fee(&mut self, caller: &Address, pool_id: &PoolId, new_fee: u32) -> HookResult<bool> {
            if *caller != self.allowed {
                return Err(HookError::unauthorized(*caller, "update_fee"));
            }
            Ok(self.fees.insert(*pool_id, new_fee) != Some(new_fee))
        }
    }

    fn setup() -> (FeeGovernor, ManualClock, RecordingController) {
        let clock = ManualClock::new(0);
        let governor = FeeGovernor::new(
            Address::derive("governor"),
            Address::derive("owner"),
            GovernanceConfig::default(),
            Arc::new(clock.clone()),
        );
        let controller = RecordingController {
            allowed: Address::derive("governor"),
            fees: HashMap::new(),
        };
        (governor, clock, controller)
    }

    #[test]
    fn test_timelock_lifecycle() {
        let (mut governor, clock, mut controller) = setup();
        let owner = Address::derive("owner");
        let pool = PoolId([9u8; 32]);

        let id = governor.create_proposal(&owner, pool, 5000, SECONDS_PER_DAY).unwrap();
        assert_eq!(governor.status(id).unwrap(), ProposalState::Pending);
        assert_eq!(governor.proposal(id).unwrap().state(), ProposalState::Active);

        let err = governor.execute_proposal(&mut controller, &owner, id).unwrap_err();
        assert_eq!(
            err,
            HookError::DelayNotElapsed { proposal_id: id, executable_at: SECONDS_PER_DAY, now: 0 }
        );

        clock.set(SECONDS_PER_DAY);
        assert_eq!(governor.status(id).unwrap(), ProposalState::Active);
        governor
            .execute_proposal(&mut controller, &Address::derive("anyone"), id)
            .unwrap();
        assert_eq!(controller.fees[&pool], 5000);
        assert_eq!(governor.status(id).unwrap(), ProposalState::Executed);
        assert_eq!(governor.proposal(id).unwrap().executed_at, Some(SECONDS_PER_DAY));

        assert!(matches!(
            governor.execute_proposal(&mut controller, &owner, id),
            Err(HookError::ProposalNotActive { .. })
        ));
        assert!(matches!(
            governor.cancel_proposal(&owner, id),
            Err(HookError::ProposalNotActive { .. })
        ));
    }

    #[test]
    fn test_create_validation() {
        let (mut governor, _, _) = setup();
        let owner = Address::derive("owner");
        let pool = PoolId([1u8; 32]);

        assert!(matches!(
            governor.create_proposal(&Address::derive("stranger"), pool, 100, SECONDS_PER_DAY),
            Err(HookError::UnauthorizedCaller { .. })
        ));
        assert!(matches!(
            governor.create_proposal(&owner, pool, 100_001, SECONDS_PER_DAY),
            Err(HookError::InvalidFee { .. })
        ));
        assert!(matches!(
            governor.create_proposal(&owner, pool, 100, SECONDS_PER_DAY - 1),
            Err(HookError::InvalidDelay { .. })
        ));
        assert!(matches!(
            governor.create_proposal(&owner, pool, 100, 30 * SECONDS_PER_DAY + 1),
            Err(HookError::InvalidDelay { .. })
        ));
        assert!(governor.create_proposal(&owner, pool, 100_000, 30 * SECONDS_PER_DAY).is_ok());
    }

    #[test]
    fn test_roles_and_cancellation() {
        let (mut governor, _, _) = setup();
        let owner = Address::derive("owner");
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        let pool = PoolId([2u8; 32]);

        assert!(governor.set_proposer(&alice, alice, true).is_err());
        governor.set_proposer(&owner, alice, true).unwrap();
        let id = governor.create_proposal(&alice, pool, 500, SECONDS_PER_DAY).unwrap();

        assert!(matches!(
            governor.cancel_proposal(&bob, id),
            Err(HookError::UnauthorizedCaller { .. })
        ));
        governor.set_authorized(&owner, bob, true).unwrap();
        governor.cancel_proposal(&bob, id).unwrap();
        assert_eq!(governor.status(id).unwrap(), ProposalState::Cancelled);
        assert!(matches!(
            governor.cancel_proposal(&alice, 99),
            Err(HookError::ProposalNotFound { proposal_id: 99 })
        ));

        let events = governor.drain_events();
        let names: Vec<_> = events.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["proposal_created", "proposal_cancelled"]);
        assert_eq!(governor.proposals_for_pool(&pool).len(), 1);
    }

    #[test]
    fn test_failed_update_keeps_proposal_active() {
        let (mut governor, clock, _) = setup();
        let owner = Address::derive("owner");
        let id = governor
            .create_proposal(&owner, PoolId([3u8; 32]), 500, SECONDS_PER_DAY)
            .unwrap();
        clock.advance(SECONDS_PER_DAY);

        let mut stranger_controller = RecordingController {
            allowed: Address::derive("someone-else"),
            fees: HashMap::new(),
        };
        assert!(governor
            .execute_proposal(&mut stranger_controller, &owner, id)
            .is_err());
        assert_eq!(governor.proposal(id).unwrap().state(), ProposalState::Active);
    }
}
