/// The callback protocol between the host engine and the hook: which
/// callbacks exist, what each carries, and what the hook answers.

use serde::{Deserialize, Serialize};
use std::fmt;

use aegis_types::{Address, BalanceDelta, ModifyLiquidityParams, PoolId, PoolKey, SwapParams};

// ============================================================================
// Callback Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    BeforeInitialize,
    AfterInitialize,
    BeforeAddLiquidity,
    AfterAddLiquidity,
    BeforeRemoveLiquidity,
    AfterRemoveLiquidity,
    BeforeSwap,
    AfterSwap,
    BeforeDonate,
    AfterDonate,
}

impl HookKind {
    pub const ALL: [HookKind; 10] = [
        HookKind::BeforeInitialize,
        HookKind::AfterInitialize,
        HookKind::BeforeAddLiquidity,
        HookKind::AfterAddLiquidity,
        HookKind::BeforeRemoveLiquidity,
        HookKind::AfterRemoveLiquidity,
        HookKind::BeforeSwap,
        HookKind::AfterSwap,
        HookKind::BeforeDonate,
        HookKind::AfterDonate,
    ];

    pub fn is_before(&self) -> bool {
        matches!(
            self,
            HookKind::BeforeInitialize
                | HookKind::BeforeAddLiquidity
                | HookKind::BeforeRemoveLiquidity
                | HookKind::BeforeSwap
                | HookKind::BeforeDonate
        )
    }

    /// The after-callback that closes a before-callback, and vice versa
    pub fn counterpart(&self) -> HookKind {
        match self {
            HookKind::BeforeInitialize => HookKind::AfterInitialize,
            HookKind::AfterInitialize => HookKind::BeforeInitialize,
            HookKind::BeforeAddLiquidity => HookKind::AfterAddLiquidity,
            HookKind::AfterAddLiquidity => HookKind::BeforeAddLiquidity,
            HookKind::BeforeRemoveLiquidity => HookKind::AfterRemoveLiquidity,
            HookKind::AfterRemoveLiquidity => HookKind::BeforeRemoveLiquidity,
            HookKind::BeforeSwap => HookKind::AfterSwap,
            HookKind::AfterSwap => HookKind::BeforeSwap,
            HookKind::BeforeDonate => HookKind::AfterDonate,
            HookKind::AfterDonate => HookKind::BeforeDonate,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HookKind::BeforeInitialize => "before_initialize",
            HookKind::AfterInitialize => "after_initialize",
            HookKind::BeforeAddLiquidity => "before_add_liquidity",
            HookKind::AfterAddLiquidity => "after_add_liquidity",
            HookKind::BeforeRemoveLiquidity => "before_remove_liquidity",
            HookKind::AfterRemoveLiquidity => "after_remove_liquidity",
            HookKind::BeforeSwap => "before_swap",
            HookKind::AfterSwap => "after_swap",
            HookKind::BeforeDonate => "before_donate",
            HookKind::AfterDonate => "after_donate",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Callback Payloads
// ============================================================================

/// One callback invocation from the host engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HookCall {
    BeforeInitialize {
        sender: Address,
        key: PoolKey,
        sqrt_price_x64: u128,
    },
    AfterInitialize {
        sender: Address,
        key: PoolKey,
        sqrt_price_x64: u128,
        tick: i32,
    },
    BeforeAddLiquidity {
        sender: Address,
        key: PoolKey,
        params: ModifyLiquidityParams,
    },
    AfterAddLiquidity {
        sender: Address,
        key: PoolKey,
        params: ModifyLiquidityParams,
        delta: BalanceDelta,
    },
    BeforeRemoveLiquidity {
        sender: Address,
        key: PoolKey,
        params: ModifyLiquidityParams,
    },
    AfterRemoveLiquidity {
        sender: Address,
        key: PoolKey,
        params: ModifyLiquidityParams,
        delta: BalanceDelta,
    },
    BeforeSwap {
        sender: Address,
        key: PoolKey,
        params: SwapParams,
    },
    AfterSwap {
        sender: Address,
        key: PoolKey,
        params: SwapParams,
        delta: BalanceDelta,
    },
    BeforeDonate {
        sender: Address,
        key: PoolKey,
        amount0: u128,
        amount1: u128,
    },
    AfterDonate {
        sender: Address,
        key: PoolKey,
        amount0: u128,
        amount1: u128,
    },
}

impl HookCall {
    pub fn kind(&self) -> HookKind {
        match self {
            HookCall::BeforeInitialize { .. } => HookKind::BeforeInitialize,
            HookCall::AfterInitialize { .. } => HookKind::AfterInitialize,
            HookCall::BeforeAddLiquidity { .. } => HookKind::BeforeAddLiquidity,
            HookCall::AfterAddLiquidity { .. } => HookKind::AfterAddLiquidity,
            HookCall::BeforeRemoveLiquidity { .. } => HookKind::BeforeRemoveLiquidity,
            HookCall::AfterRemoveLiquidity { .. } => HookKind::AfterRemoveLiquidity,
            HookCall::BeforeSwap { .. } => HookKind::BeforeSwap,
            HookCall::AfterSwap { .. } => HookKind::AfterSwap,
            HookCall::BeforeDonate { .. } => HookKind::BeforeDonate,
            HookCall::AfterDonate { .. } => HookKind::AfterDonate,
        }
    }

    pub fn sender(&self) -> Address {
        match self {
            HookCall::BeforeInitialize { sender, .. }
            | HookCall::AfterInitialize { sender, .. }
            | HookCall::BeforeAddLiquidity { sender, .. }
            | HookCall::AfterAddLiquidity { sender, .. }
            | HookCall::BeforeRemoveLiquidity { sender, .. }
            | HookCall::AfterRemoveLiquidity { sender, .. }
            | HookCall::BeforeSwap { sender, .. }
            | HookCall::AfterSwap { sender, .. }
            | HookCall::BeforeDonate { sender, .. }
            | HookCall::AfterDonate { sender, .. } => *sender,
        }
    }

    pub fn key(&self) -> &PoolKey {
        match self {
            HookCall::BeforeInitialize { key, .. }
            | HookCall::AfterInitialize { key, .. }
            | HookCall::BeforeAddLiquidity { key, .. }
            | HookCall::AfterAddLiquidity { key, .. }
            | HookCall::BeforeRemoveLiquidity { key, .. }
            | HookCall::AfterRemoveLiquidity { key, .. }
            | HookCall::BeforeSwap { key, .. }
            | HookCall::AfterSwap { key, .. }
            | HookCall::BeforeDonate { key, .. }
            | HookCall::AfterDonate { key, .. } => key,
        }
    }

    pub fn pool_id(&self) -> PoolId {
        self.key().id()
    }
}

// ============================================================================
// Responses and Permissions
// ============================================================================

/// Answer to a successful callback. The hook never adjusts balances, so
/// `delta` is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookResponse {
    pub kind: HookKind,
    pub delta: BalanceDelta,
}

impl HookResponse {
    pub fn accept(kind: HookKind) -> Self {
        Self {
            kind,
            delta: BalanceDelta::ZERO,
        }
    }
}

/// Callbacks the hook asks the host engine to invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookPermissions {
    pub before_initialize: bool,
    pub after_initialize: bool,
    pub before_add_liquidity: bool,
    pub after_add_liquidity: bool,
    pub before_remove_liquidity: bool,
    pub after_remove_liquidity: bool,
    pub before_swap: bool,
    pub after_swap: bool,
    pub before_donate: bool,
    pub after_donate: bool,
    pub before_swap_returns_delta: bool,
    pub after_swap_returns_delta: bool,
}

impl HookPermissions {
    /// Every callback, no delta-returning variants
    pub const fn all_callbacks() -> Self {
        Self {
            before_initialize: true,
            after_initialize: true,
            before_add_liquidity: true,
            after_add_liquidity: true,
            before_remove_liquidity: true,
            after_remove_liquidity: true,
            before_swap: true,
            after_swap: true,
            before_donate: true,
            after_donate: true,
            before_swap_returns_delta: false,
            after_swap_returns_delta: false,
        }
    }

    pub fn allows(&self, kind: HookKind) -> bool {
        match kind {
            HookKind::BeforeInitialize => self.before_initialize,
            HookKind::AfterInitialize => self.after_initialize,
            HookKind::BeforeAddLiquidity => self.before_add_liquidity,
            HookKind::AfterAddLiquidity => self.after_add_liquidity,
            HookKind::BeforeRemoveLiquidity => self.before_remove_liquidity,
            HookKind::AfterRemoveLiquidity => self.after_remove_liquidity,
            HookKind::BeforeSwap => self.before_swap,
            HookKind::AfterSwap => self.after_swap,
            HookKind::BeforeDonate => self.before_donate,
            HookKind::AfterDonate => self.after_donate,
        }
    }
}
