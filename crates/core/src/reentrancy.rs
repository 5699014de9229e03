/// In-flight operation tracking. A before-callback opens an operation on
/// its pool; only the matching after-callback (or an explicit abort from the
/// host engine) closes it. Any other callback on that pool in between is
/// rejected.

use std::collections::HashMap;

use aegis_types::{HookError, HookResult, PoolId};
use log::warn;

use crate::hook::HookKind;

// ============================================================================
// Operation Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationStatus {
    /// No operation open on the pool
    #[default]
    Idle,
    /// Before-callback accepted, waiting for its after-callback
    InFlight(HookKind),
}

// ============================================================================
// Tracker
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct InFlightTracker {
    open: HashMap<PoolId, HookKind>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, pool_id: &PoolId) -> OperationStatus {
        self.open
            .get(pool_id)
            .map_or(OperationStatus::Idle, |kind| OperationStatus::InFlight(*kind))
    }

    pub fn is_locked(&self, pool_id: &PoolId) -> bool {
        self.open.contains_key(pool_id)
    }

    /// Fails when an operation is already open on the pool
    pub fn ensure_unlocked(&self, pool_id: &PoolId) -> HookResult<()> {
        if self.is_locked(pool_id) {
            return Err(HookError::ReentrancyDetected { pool_id: *pool_id });
        }
        Ok(())
    }

    /// Validate that `after` closes the open operation, without closing it
    pub fn ensure_matches(&self, pool_id: &PoolId, after: HookKind) -> HookResult<()> {
        match self.open.get(pool_id) {
            Some(open) if open.counterpart() == after => Ok(()),
            Some(open) => Err(HookError::OperationMismatch {
                expected: open.counterpart().to_string(),
                actual: after.to_string(),
            }),
            None => Err(HookError::OperationMismatch {
                expected: "a before-callback".to_string(),
                actual: after.to_string(),
            }),
        }
    }

    /// Open an operation
    pub fn begin(&mut self, pool_id: PoolId, before: HookKind) -> HookResult<()> {
        self.ensure_unlocked(&pool_id)?;
        self.open.insert(pool_id, before);
        Ok(())
    }

    /// Close the open operation with its after-callback
    pub fn complete(&mut self, pool_id: &PoolId, after: HookKind) -> HookResult<()> {
        self.ensure_matches(pool_id, after)?;
        self.open.remove(pool_id);
        Ok(())
    }

    /// Drop the open operation, returning what was open
    pub fn abort(&mut self, pool_id: &PoolId) -> Option<HookKind> {
        let open = self.open.remove(pool_id);
        if open.is_none() {
            warn!("abort on pool {} with no operation in flight", pool_id);
        }
        open
    }
}
