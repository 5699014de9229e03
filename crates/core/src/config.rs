use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use aegis_types::{
    COOLDOWN_PERIOD, DEFAULT_PROTOCOL_FEE_BPS, MAX_FEE, MAX_LOOKBACK_BUCKETS, MAX_PROPOSAL_DELAY,
    MAX_PROTOCOL_FEE_BPS, MAX_SLIPPAGE_BPS, MAX_SQRT_PRICE_X64, MIN_LIQUIDITY, MIN_PROPOSAL_DELAY,
    MIN_SQRT_PRICE_X64, ORACLE_PERIOD, BPS_DENOMINATOR,
};

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid parameter '{parameter}': got '{value}', expected {expected}")]
    Invalid {
        parameter: &'static str,
        value: String,
        expected: String,
    },
}

impl ConfigError {
    fn invalid(parameter: &'static str, value: impl ToString, expected: impl Into<String>) -> Self {
        Self::Invalid {
            parameter,
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

/// What the after-swap hook does when the realized slippage exceeds the bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSwapSlippage {
    /// Abort the swap
    Strict,
    /// Log a warning and let the swap settle
    #[default]
    Advisory,
    /// Skip the check
    Disabled,
}

/// Hook state machine and guard parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Reserve floor once a pool holds liquidity
    #[serde(with = "u128_string")]
    pub min_liquidity: u128,

    /// Seconds an account waits between guarded operations
    pub cooldown_seconds: i64,

    /// Largest accepted price impact (basis points)
    pub max_slippage_bps: u64,

    /// Lowest accepted starting sqrt price (Q64.64)
    #[serde(with = "u128_string")]
    pub min_sqrt_price_x64: u128,

    /// Highest accepted starting sqrt price (Q64.64)
    #[serde(with = "u128_string")]
    pub max_sqrt_price_x64: u128,

    /// Share of liquidity inflows kept as protocol fees (basis points)
    pub protocol_fee_bps: u16,

    /// Realized-slippage policy for completed swaps
    pub post_swap_slippage: PostSwapSlippage,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            min_liquidity: MIN_LIQUIDITY,
            cooldown_seconds: COOLDOWN_PERIOD,
            max_slippage_bps: MAX_SLIPPAGE_BPS,
            min_sqrt_price_x64: MIN_SQRT_PRICE_X64,
            max_sqrt_price_x64: MAX_SQRT_PRICE_X64,
            protocol_fee_bps: DEFAULT_PROTOCOL_FEE_BPS,
            post_swap_slippage: PostSwapSlippage::default(),
        }
    }
}

impl HookConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.cooldown_seconds < 0 {
            return Err(ConfigError::invalid("cooldown_seconds", self.cooldown_seconds, "at least 0"));
        }
        if self.max_slippage_bps > BPS_DENOMINATOR {
            return Err(ConfigError::invalid(
                "max_slippage_bps",
                self.max_slippage_bps,
                format!("at most {}", BPS_DENOMINATOR),
            ));
        }
        if self.min_sqrt_price_x64 < MIN_SQRT_PRICE_X64 {
            return Err(ConfigError::invalid(
                "min_sqrt_price_x64",
                self.min_sqrt_price_x64,
                format!("at least {}", MIN_SQRT_PRICE_X64),
            ));
        }
        if self.max_sqrt_price_x64 > MAX_SQRT_PRICE_X64 {
            return Err(ConfigError::invalid(
                "max_sqrt_price_x64",
                self.max_sqrt_price_x64,
                format!("at most {}", MAX_SQRT_PRICE_X64),
            ));
        }
        if self.min_sqrt_price_x64 >= self.max_sqrt_price_x64 {
            return Err(ConfigError::invalid(
                "min_sqrt_price_x64",
                self.min_sqrt_price_x64,
                format!("below max_sqrt_price_x64 ({})", self.max_sqrt_price_x64),
            ));
        }
        if self.protocol_fee_bps > MAX_PROTOCOL_FEE_BPS {
            return Err(ConfigError::invalid(
                "protocol_fee_bps",
                self.protocol_fee_bps,
                format!("at most {}", MAX_PROTOCOL_FEE_BPS),
            ));
        }
        Ok(())
    }
}

/// Fee governance timelock parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Highest fee a proposal may set (pips)
    pub max_fee: u32,
    /// Shortest timelock (seconds)
    pub min_delay: i64,
    /// Longest timelock (seconds)
    pub max_delay: i64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            max_fee: MAX_FEE,
            min_delay: MIN_PROPOSAL_DELAY,
            max_delay: MAX_PROPOSAL_DELAY,
        }
    }
}

impl GovernanceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_fee > MAX_FEE {
            return Err(ConfigError::invalid(
                "max_fee",
                self.max_fee,
                format!("at most {}", MAX_FEE),
            ));
        }
        if self.min_delay <= 0 {
            return Err(ConfigError::invalid("min_delay", self.min_delay, "greater than 0"));
        }
        if self.max_delay < self.min_delay {
            return Err(ConfigError::invalid(
                "max_delay",
                self.max_delay,
                format!("at least min_delay ({})", self.min_delay),
            ));
        }
        Ok(())
    }
}

/// TWAP oracle parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Bucket width and longest consult window (seconds)
    pub period: i64,
    /// Buckets searched backwards for a missing observation
    pub max_lookback_buckets: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            period: ORACLE_PERIOD,
            max_lookback_buckets: MAX_LOOKBACK_BUCKETS,
        }
    }
}

impl OracleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period <= 0 {
            return Err(ConfigError::invalid("period", self.period, "greater than 0"));
        }
        Ok(())
    }
}

/// Complete protocol configuration, loadable from TOML
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub hook: HookConfig,
    pub governance: GovernanceConfig,
    pub oracle: OracleConfig,
}

impl ProtocolConfig {
    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ProtocolConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hook.validate()?;
        self.governance.validate()?;
        self.oracle.validate()?;
        Ok(())
    }
}

/// u128 values travel as decimal strings; TOML integers stop at i64
mod u128_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.replace('_', "").parse().map_err(serde::de::Error::custom)
    }
}
