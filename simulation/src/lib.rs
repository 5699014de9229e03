/// Simulation framework for the Aegis pool hook
///
/// Provides utilities for:
/// - Driving the hook with a constant-product host engine
/// - Running TOML scenarios against the hook, governance and oracle
/// - Reporting the emitted events and final pool state

pub mod pool_manager;
pub mod scenario_runner;

pub use pool_manager::{PoolManager, SwapExecution};
pub use scenario_runner::{
    Action, PoolSpec, PoolSummary, Scenario, ScenarioReport, ScenarioRunner, StepOutcome, StepSpec,
};

use aegis_core::ConfigError;
use aegis_types::HookError;

#[derive(thiserror::Error, Debug)]
pub enum SimulationError {
    #[error("hook error: {0}")]
    Hook(#[from] HookError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown pool `{0}`")]
    UnknownPool(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type SimulationResult<T> = std::result::Result<T, SimulationError>;
