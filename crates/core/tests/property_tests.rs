//! # Property Tests
//!
//! Invariants that must hold for arbitrary operation sequences.

mod common;

use std::sync::Arc;

use aegis_core::{FeeGovernor, GovernanceConfig, ProposalState};
use aegis_math::invariant;
use aegis_types::{Address, HookError, SECONDS_PER_DAY};
use common::Harness;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Swap { zero_for_one: bool, amount_in: u128 },
    Add { amount0: u128, amount1: u128 },
    Donate { amount0: u128, amount1: u128 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<bool>(), 1u128..200_000).prop_map(|(zero_for_one, amount_in)| Op::Swap { zero_for_one, amount_in }),
        (1u128..500_000, 1u128..500_000).prop_map(|(amount0, amount1)| Op::Add { amount0, amount1 }),
        (0u128..10_000, 1u128..10_000).prop_map(|(amount0, amount1)| Op::Donate { amount0, amount1 }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invariant_never_decreases(ops in prop::collection::vec(op_strategy(), 1..20)) {
        let mut h = Harness::seeded(1_000_000, 1_000_000);
        let actor = Address::derive("actor");

        for op in ops {
            let (r0, r1) = h.reserves();
            let before = invariant(r0, r1);
            let result = match op {
                Op::Swap { zero_for_one, amount_in } => h.swap(actor, zero_for_one, amount_in, None).map(|_| ()),
                Op::Add { amount0, amount1 } => h.add_liquidity(actor, amount0, amount1),
                Op::Donate { amount0, amount1 } => h.donate(actor, amount0, amount1),
            };
            let (r0, r1) = h.reserves();
            let after = invariant(r0, r1);
            match result {
                Ok(()) => prop_assert!(after >= before),
                Err(_) => prop_assert_eq!(after, before),
            }
            prop_assert!(r0 >= 1_000 && r1 >= 1_000);
            h.clock.advance(60);
        }
    }

    #[test]
    fn prop_cooldown_enforced(gap in 0i64..120, amount in 1u128..10_000) {
        let mut h = Harness::seeded(1_000_000, 1_000_000);
        let trader = Address::derive("trader");

        h.swap(trader, true, amount, None).unwrap();
        h.clock.advance(gap);
        let second = h.swap(trader, false, amount, None);
        if gap < 60 {
            let is_cooldown = matches!(second, Err(HookError::CooldownActive { .. }));
            prop_assert!(is_cooldown);
        } else {
            prop_assert!(second.is_ok());
        }
    }

    #[test]
    fn prop_blacklisted_always_rejected(
        amount0 in 0u128..1_000_000,
        amount1 in 0u128..1_000_000,
        zero_for_one in any::<bool>(),
    ) {
        let mut h = Harness::seeded(1_000_000, 1_000_000);
        let mallory = Address::derive("mallory");
        let owner = h.owner;
        h.engine.set_blacklisted(&owner, mallory, true).unwrap();
        let expected = HookError::Blacklisted { account: mallory };

        prop_assert_eq!(h.add_liquidity(mallory, amount0.max(1), amount1.max(1)).unwrap_err(), expected.clone());
        prop_assert_eq!(h.swap(mallory, zero_for_one, amount0.max(1), None).unwrap_err(), expected.clone());
        prop_assert_eq!(h.donate(mallory, amount0, amount1).unwrap_err(), expected);
        prop_assert_eq!(h.reserves(), (1_000_000, 1_000_000));
    }

    #[test]
    fn prop_executed_proposal_sets_fee(
        fee in 0u32..=100_000,
        delay in SECONDS_PER_DAY..=30 * SECONDS_PER_DAY,
    ) {
        let mut h = Harness::seeded(10_000, 10_000);
        let identity = Address::derive("fee-governor");
        let owner = h.owner;
        h.engine.set_fee_controller(&owner, identity, true).unwrap();
        let dao = Address::derive("dao");
        let mut governor = FeeGovernor::new(identity, dao, GovernanceConfig::default(), Arc::new(h.clock.clone()));

        let id = governor.create_proposal(&dao, h.pool_id(), fee, delay).unwrap();
        h.clock.advance(delay);
        governor.execute_proposal(&mut h.engine, &dao, id).unwrap();

        prop_assert_eq!(h.engine.pool(&h.pool_id()).unwrap().lp_fee, fee);
        prop_assert_eq!(governor.status(id).unwrap(), ProposalState::Executed);
    }
}
