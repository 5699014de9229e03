//! # Governance Timelock Tests
//!
//! Fee proposals executed against a live hook engine.

mod common;

use std::sync::Arc;

use aegis_core::{FeeGovernor, GovernanceConfig, ProposalState};
use aegis_types::{Address, HookError, HookEvent, SECONDS_PER_DAY};
use common::Harness;

fn governor_for(h: &mut Harness) -> FeeGovernor {
    let identity = Address::derive("fee-governor");
    let owner = h.owner;
    h.engine.set_fee_controller(&owner, identity, true).unwrap();
    let mut governor = FeeGovernor::new(
        identity,
        Address::derive("dao"),
        GovernanceConfig::default(),
        Arc::new(h.clock.clone()),
    );
    governor
        .set_authorized(&Address::derive("dao"), Address::derive("council"), true)
        .unwrap();
    governor
}

#[test]
fn test_fee_proposal_round_trip() {
    let mut h = Harness::seeded(10_000, 10_000);
    let mut governor = governor_for(&mut h);
    let council = Address::derive("council");
    let pool_id = h.pool_id();

    let id = governor.create_proposal(&council, pool_id, 5_000, SECONDS_PER_DAY).unwrap();
    let created_at = governor.proposal(id).unwrap().created_at;

    let err = governor
        .execute_proposal(&mut h.engine, &council, id)
        .unwrap_err();
    assert_eq!(
        err,
        HookError::DelayNotElapsed {
            proposal_id: id,
            executable_at: created_at + SECONDS_PER_DAY,
            now: created_at,
        }
    );
    assert_eq!(h.engine.pool(&pool_id).unwrap().lp_fee, 3_000);

    h.clock.advance(SECONDS_PER_DAY + 1);
    governor
        .execute_proposal(&mut h.engine, &Address::derive("keeper"), id)
        .unwrap();

    assert_eq!(h.engine.pool(&pool_id).unwrap().lp_fee, 5_000);
    assert_eq!(governor.status(id).unwrap(), ProposalState::Executed);

    let engine_events = h.engine.drain_events();
    assert!(matches!(
        &engine_events[..],
        [HookEvent::FeeUpdated { old_fee: 3_000, new_fee: 5_000, .. }]
    ));
    let names: Vec<_> = governor.drain_events().iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["proposal_created", "proposal_executed"]);
}

#[test]
fn test_cancelled_proposal_leaves_fee() {
    let mut h = Harness::seeded(10_000, 10_000);
    let mut governor = governor_for(&mut h);
    let council = Address::derive("council");
    let pool_id = h.pool_id();

    let id = governor.create_proposal(&council, pool_id, 7_500, 2 * SECONDS_PER_DAY).unwrap();
    governor.cancel_proposal(&council, id).unwrap();
    h.clock.advance(3 * SECONDS_PER_DAY);

    assert!(matches!(
        governor.execute_proposal(&mut h.engine, &council, id),
        Err(HookError::ProposalNotActive { .. })
    ));
    assert_eq!(h.engine.pool(&pool_id).unwrap().lp_fee, 3_000);
    assert_eq!(governor.status(id).unwrap(), ProposalState::Cancelled);
}

#[test]
fn test_unregistered_governor_cannot_set_fee() {
    let mut h = Harness::seeded(10_000, 10_000);
    let mut governor = FeeGovernor::new(
        Address::derive("rogue-governor"),
        Address::derive("dao"),
        GovernanceConfig::default(),
        Arc::new(h.clock.clone()),
    );
    let dao = Address::derive("dao");
    let id = governor
        .create_proposal(&dao, h.pool_id(), 1_000, SECONDS_PER_DAY)
        .unwrap();
    h.clock.advance(SECONDS_PER_DAY);

    assert!(matches!(
        governor.execute_proposal(&mut h.engine, &dao, id),
        Err(HookError::UnauthorizedCaller { .. })
    ));
    assert_eq!(governor.proposal(id).unwrap().state(), ProposalState::Active);
}

#[test]
fn test_proposal_for_unknown_pool_fails_on_execution() {
    let mut h = Harness::seeded(10_000, 10_000);
    let mut governor = governor_for(&mut h);
    let council = Address::derive("council");
    let missing = aegis_types::PoolId([7u8; 32]);

    let id = governor.create_proposal(&council, missing, 1_000, SECONDS_PER_DAY).unwrap();
    h.clock.advance(SECONDS_PER_DAY);
    assert_eq!(
        governor.execute_proposal(&mut h.engine, &council, id),
        Err(HookError::PoolNotFound { pool_id: missing })
    );
    assert_eq!(governor.proposals_for_pool(&missing).len(), 1);
}
