/// Read interface onto the external pool registry. The hook only ever asks
/// whether a pool exists, which hook it names, and what its key is.

use std::collections::HashMap;

use aegis_types::{Address, HookError, HookResult, PoolId, PoolKey};

pub trait PoolRegistry: Send + Sync {
    fn pool_exists(&self, pool_id: &PoolId) -> bool;

    fn get_hook(&self, pool_id: &PoolId) -> Option<Address>;

    fn get_pool_key(&self, pool_id: &PoolId) -> Option<PoolKey>;

    /// Validate a key before its pool is initialized
    fn validate_pool(&self, key: &PoolKey) -> HookResult<()>;
}

/// Registry kept in memory, used by tests and the simulator
#[derive(Debug, Default, Clone)]
pub struct InMemoryRegistry {
    pools: HashMap<PoolId, PoolKey>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pool key, returning its id
    pub fn register(&mut self, key: PoolKey) -> HookResult<PoolId> {
        key.validate()?;
        let pool_id = key.id();
        if self.pools.contains_key(&pool_id) {
            return Err(HookError::invalid_pool("pool already registered"));
        }
        self.pools.insert(pool_id, key);
        Ok(pool_id)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl PoolRegistry for InMemoryRegistry {
    fn pool_exists(&self, pool_id: &PoolId) -> bool {
        self.pools.contains_key(pool_id)
    }

    fn get_hook(&self, pool_id: &PoolId) -> Option<Address> {
        self.pools.get(pool_id).map(|key| key.hooks)
    }

    fn get_pool_key(&self, pool_id: &PoolId) -> Option<PoolKey> {
        self.pools.get(pool_id).copied()
    }

    fn validate_pool(&self, key: &PoolKey) -> HookResult<()> {
        key.validate()?;
        match self.pools.get(&key.id()) {
            Some(registered) if registered == key => Ok(()),
            Some(_) => Err(HookError::invalid_pool("key does not match registered pool")),
            None => Err(HookError::PoolNotFound { pool_id: key.id() }),
        }
    }
}
