/// MEV guard policy: account blacklist, per-account cooldown between guarded
/// operations, and the price-impact bound.
///
/// The hook splits the cooldown into `check` (before-hook) and `record`
/// (after-hook) so a swap that fails in the host engine does not start a
/// cooldown.

use std::collections::{HashMap, HashSet};

use aegis_types::{Address, HookError, HookEvent, HookResult};
use log::debug;

#[derive(Debug, Clone)]
pub struct MevGuard {
    admin: Address,
    cooldown_seconds: i64,
    last_operation: HashMap<Address, i64>,
    blacklist: HashSet<Address>,
}

impl MevGuard {
    pub fn new(admin: Address, cooldown_seconds: i64) -> Self {
        Self {
            admin,
            cooldown_seconds,
            last_operation: HashMap::new(),
            blacklist: HashSet::new(),
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn cooldown_seconds(&self) -> i64 {
        self.cooldown_seconds
    }

    pub fn is_blacklisted(&self, account: &Address) -> bool {
        self.blacklist.contains(account)
    }

    pub fn last_operation(&self, account: &Address) -> Option<i64> {
        self.last_operation.get(account).copied()
    }

    // ========================================================================
    // Checks
    // ========================================================================

    pub fn check_blacklist(&self, account: &Address) -> HookResult<()> {
        if self.is_blacklisted(account) {
            return Err(HookError::Blacklisted { account: *account });
        }
        Ok(())
    }

    pub fn check_cooldown(&self, account: &Address, now: i64) -> HookResult<()> {
        if let Some(last) = self.last_operation(account) {
            let ready_at = last.saturating_add(self.cooldown_seconds);
            if now < ready_at {
                return Err(HookError::CooldownActive {
                    account: *account,
                    ready_at,
                    now,
                });
            }
        }
        Ok(())
    }

    /// Blacklist then cooldown, without recording
    pub fn check(&self, account: &Address, now: i64) -> HookResult<()> {
        self.check_blacklist(account)?;
        self.check_cooldown(account, now)
    }

    /// Start the account's cooldown at `now`
    pub fn record(&mut self, account: Address, now: i64) {
        debug!("cooldown recorded for {} at {}", account, now);
        self.last_operation.insert(account, now);
    }

    pub fn check_and_record(&mut self, account: Address, now: i64) -> HookResult<()> {
        self.check(&account, now)?;
        self.record(account, now);
        Ok(())
    }

    /// Impact above the bound fails
    pub fn check_slippage(impact_bps: u64, max_bps: u64) -> HookResult<()> {
        if impact_bps > max_bps {
            return Err(HookError::SlippageExceeded { impact_bps, max_bps });
        }
        Ok(())
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Flag or clear an account. Returns the event for the owner's log.
    pub fn set_blacklisted(
        &mut self,
        caller: &Address,
        account: Address,
        blacklisted: bool,
        now: i64,
    ) -> HookResult<HookEvent> {
        if *caller != self.admin {
            return Err(HookError::unauthorized(*caller, "set_blacklisted"));
        }
        if blacklisted {
            self.blacklist.insert(account);
        } else {
            self.blacklist.remove(&account);
        }
        Ok(HookEvent::BlacklistUpdated {
            account,
            blacklisted,
            timestamp: now,
        })
    }
}
