/// Domain events for off-chain observers. Each event carries enough to
/// reconstruct the state transition it reports.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::pool::{PoolId, PoolKey};

/// Reserves on both sides of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveChange {
    pub reserve0_before: u128,
    pub reserve1_before: u128,
    pub reserve0_after: u128,
    pub reserve1_after: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HookEvent {
    // ========================================================================
    // Pool Lifecycle
    // ========================================================================
    PoolInitialized {
        pool_id: PoolId,
        key: PoolKey,
        sender: Address,
        sqrt_price_x64: u128,
        tick: i32,
        timestamp: i64,
    },
    LiquidityAdded {
        pool_id: PoolId,
        sender: Address,
        amount0: u128,
        amount1: u128,
        reserves: ReserveChange,
        timestamp: i64,
    },
    LiquidityRemoved {
        pool_id: PoolId,
        sender: Address,
        amount0: u128,
        amount1: u128,
        reserves: ReserveChange,
        timestamp: i64,
    },
    SwapCompleted {
        pool_id: PoolId,
        sender: Address,
        zero_for_one: bool,
        amount_in: u128,
        amount_out: u128,
        reserves: ReserveChange,
        price_after: u128,
        timestamp: i64,
    },
    DonationProcessed {
        pool_id: PoolId,
        sender: Address,
        amount0: u128,
        amount1: u128,
        reserves: ReserveChange,
        timestamp: i64,
    },

    // ========================================================================
    // Fees
    // ========================================================================
    FeeUpdated {
        pool_id: PoolId,
        caller: Address,
        old_fee: u32,
        new_fee: u32,
        timestamp: i64,
    },
    ProtocolFeesCollected {
        pool_id: PoolId,
        amount0: u128,
        amount1: u128,
        timestamp: i64,
    },
    ProtocolFeesWithdrawn {
        pool_id: PoolId,
        recipient: Address,
        amount0: u128,
        amount1: u128,
        timestamp: i64,
    },

    // ========================================================================
    // Guard
    // ========================================================================
    BlacklistUpdated {
        account: Address,
        blacklisted: bool,
        timestamp: i64,
    },

    // ========================================================================
    // Governance
    // ========================================================================
    ProposalCreated {
        proposal_id: u64,
        proposer: Address,
        pool_id: PoolId,
        new_fee: u32,
        delay: i64,
        created_at: i64,
    },
    ProposalExecuted {
        proposal_id: u64,
        executor: Address,
        pool_id: PoolId,
        new_fee: u32,
        timestamp: i64,
    },
    ProposalCancelled {
        proposal_id: u64,
        canceller: Address,
        pool_id: PoolId,
        timestamp: i64,
    },

    // ========================================================================
    // Oracle
    // ========================================================================
    ObservationRecorded {
        pool_id: PoolId,
        bucket: i64,
        price: u128,
        reserve0: u128,
        reserve1: u128,
        timestamp: i64,
    },
}

impl HookEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HookEvent::PoolInitialized { .. } => "pool_initialized",
            HookEvent::LiquidityAdded { .. } => "liquidity_added",
            HookEvent::LiquidityRemoved { .. } => "liquidity_removed",
            HookEvent::SwapCompleted { .. } => "swap_completed",
            HookEvent::DonationProcessed { .. } => "donation_processed",
            HookEvent::FeeUpdated { .. } => "fee_updated",
            HookEvent::ProtocolFeesCollected { .. } => "protocol_fees_collected",
            HookEvent::ProtocolFeesWithdrawn { .. } => "protocol_fees_withdrawn",
            HookEvent::BlacklistUpdated { .. } => "blacklist_updated",
            HookEvent::ProposalCreated { .. } => "proposal_created",
            HookEvent::ProposalExecuted { .. } => "proposal_executed",
            HookEvent::ProposalCancelled { .. } => "proposal_cancelled",
            HookEvent::ObservationRecorded { .. } => "observation_recorded",
        }
    }

    /// Pool the event concerns, if any
    pub fn pool_id(&self) -> Option<PoolId> {
        match self {
            HookEvent::PoolInitialized { pool_id, .. }
            | HookEvent::LiquidityAdded { pool_id, .. }
            | HookEvent::LiquidityRemoved { pool_id, .. }
            | HookEvent::SwapCompleted { pool_id, .. }
            | HookEvent::DonationProcessed { pool_id, .. }
            | HookEvent::FeeUpdated { pool_id, .. }
            | HookEvent::ProtocolFeesCollected { pool_id, .. }
            | HookEvent::ProtocolFeesWithdrawn { pool_id, .. }
            | HookEvent::ProposalCreated { pool_id, .. }
            | HookEvent::ProposalExecuted { pool_id, .. }
            | HookEvent::ProposalCancelled { pool_id, .. }
            | HookEvent::ObservationRecorded { pool_id, .. } => Some(*pool_id),
            HookEvent::BlacklistUpdated { .. } => None,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            HookEvent::PoolInitialized { timestamp, .. }
            | HookEvent::LiquidityAdded { timestamp, .. }
            | HookEvent::LiquidityRemoved { timestamp, .. }
            | HookEvent::SwapCompleted { timestamp, .. }
            | HookEvent::DonationProcessed { timestamp, .. }
            | HookEvent::FeeUpdated { timestamp, .. }
            | HookEvent::ProtocolFeesCollected { timestamp, .. }
            | HookEvent::ProtocolFeesWithdrawn { timestamp, .. }
            | HookEvent::BlacklistUpdated { timestamp, .. }
            | HookEvent::ProposalExecuted { timestamp, .. }
            | HookEvent::ProposalCancelled { timestamp, .. }
            | HookEvent::ObservationRecorded { timestamp, .. } => *timestamp,
            HookEvent::ProposalCreated { created_at, .. } => *created_at,
        }
    }
}
