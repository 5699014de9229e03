//! Scenario runner tests
//!
//! Runs the bundled scenario file and small inline scenarios end to end
//! through the host engine, the fee governor and the oracle.

use aegis_core::ProtocolConfig;
use aegis_simulation::{Scenario, ScenarioRunner, SimulationError};

fn run(config: &ProtocolConfig, content: &str) -> aegis_simulation::ScenarioReport {
    let scenario = Scenario::from_toml_str(content).expect("scenario parses");
    ScenarioRunner::new(config, &scenario)
        .expect("runner builds")
        .run(&scenario)
        .expect("scenario runs")
}

#[test]
fn test_basic_scenario_file() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/basic.toml");
    let scenario = Scenario::load(path).unwrap();
    let report = ScenarioRunner::new(&ProtocolConfig::default(), &scenario)
        .unwrap()
        .run(&scenario)
        .unwrap();

    assert!(report.passed(), "unexpected steps: {:?}", report.steps);
    assert_eq!(report.steps.len(), 20);

    let initialize = &report.steps[0];
    assert_eq!(initialize.events.len(), 1);
    assert_eq!(initialize.events[0].name(), "pool_initialized");

    // Rejected steps leave no events behind
    for index in [3, 7, 13, 18] {
        assert!(!report.steps[index].succeeded);
        assert!(report.steps[index].events.is_empty());
    }

    let execute: Vec<_> = report.steps[15].events.iter().map(|e| e.name()).collect();
    assert_eq!(execute, vec!["fee_updated", "proposal_executed"]);

    let pool = &report.pools[0];
    assert!(pool.initialized);
    assert_eq!(pool.lp_fee, 5000);
    assert!(pool.reserve0 >= 1_000 && pool.reserve1 >= 1_000);
}

#[test]
fn test_report_serializes_to_json() {
    let report = run(
        &ProtocolConfig::default(),
        r#"
name = "json"

[[pools]]
name = "a-b"
token_a = "token-a"
token_b = "token-b"

[[steps]]
action = "initialize"
pool = "a-b"

[[steps]]
action = "add_liquidity"
pool = "a-b"
sender = "lp"
amount0 = 50_000
amount1 = 50_000
"#,
    );
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"event\":\"liquidity_added\""));
    assert!(json.contains("\"unexpected\":0"));
}

#[test]
fn test_protocol_fee_collection() {
    let mut config = ProtocolConfig::default();
    config.hook.protocol_fee_bps = 100;
    let report = run(
        &config,
        r#"
name = "protocol-fee"

[[pools]]
name = "a-b"
token_a = "token-a"
token_b = "token-b"

[[steps]]
action = "initialize"
pool = "a-b"

[[steps]]
action = "add_liquidity"
pool = "a-b"
sender = "lp"
amount0 = 1_000_000
amount1 = 1_000_000

[[steps]]
action = "collect_protocol_fees"
pool = "a-b"
recipient = "treasury"
sender = "lp"
expect_failure = true

[[steps]]
action = "collect_protocol_fees"
pool = "a-b"
recipient = "treasury"
"#,
    );

    assert!(report.passed(), "unexpected steps: {:?}", report.steps);
    let added: Vec<_> = report.steps[1].events.iter().map(|e| e.name()).collect();
    assert_eq!(added, vec!["protocol_fees_collected", "liquidity_added"]);
    assert_eq!(report.steps[3].detail.as_deref(), Some("amount0=10000 amount1=10000"));

    let pool = &report.pools[0];
    assert_eq!((pool.reserve0, pool.reserve1), (990_000, 990_000));
    assert_eq!((pool.protocol_fees0, pool.protocol_fees1), (0, 0));
}

#[test]
fn test_pause_blocks_callbacks() {
    let report = run(
        &ProtocolConfig::default(),
        r#"
name = "pause"

[[pools]]
name = "a-b"
token_a = "token-a"
token_b = "token-b"

[[steps]]
action = "initialize"
pool = "a-b"

[[steps]]
action = "pause"

[[steps]]
action = "add_liquidity"
pool = "a-b"
sender = "lp"
amount0 = 10_000
amount1 = 10_000
expect_failure = true

[[steps]]
action = "pause"
paused = false

[[steps]]
action = "add_liquidity"
pool = "a-b"
sender = "lp"
amount0 = 10_000
amount1 = 10_000
"#,
    );
    assert!(report.passed(), "unexpected steps: {:?}", report.steps);
    assert_eq!((report.pools[0].reserve0, report.pools[0].reserve1), (10_000, 10_000));
}

#[test]
fn test_unexpected_outcome_is_counted() {
    let report = run(
        &ProtocolConfig::default(),
        r#"
name = "mismatch"

[[pools]]
name = "a-b"
token_a = "token-a"
token_b = "token-b"

[[steps]]
action = "initialize"
pool = "a-b"
expect_failure = true

[[steps]]
action = "initialize"
pool = "a-b"
"#,
    );
    // The first initialize succeeds and the second is rejected
    assert_eq!(report.unexpected, 2);
    assert!(!report.passed());
    assert!(report.steps[1].error.is_some());
    assert!(!report.pools.is_empty() && report.pools[0].initialized);
}

#[test]
fn test_unknown_pool_stops_the_run() {
    let scenario = Scenario::from_toml_str(
        r#"
name = "unknown"

[[steps]]
action = "initialize"
pool = "missing"
"#,
    )
    .unwrap();
    let result = ScenarioRunner::new(&ProtocolConfig::default(), &scenario)
        .unwrap()
        .run(&scenario);
    assert!(matches!(result, Err(SimulationError::UnknownPool(name)) if name == "missing"));
}

#[test]
fn test_duplicate_pool_names_rejected() {
    let scenario = Scenario::from_toml_str(
        r#"
name = "duplicate"

[[pools]]
name = "a-b"
token_a = "token-a"
token_b = "token-b"

[[pools]]
name = "a-b"
token_a = "token-a"
token_b = "token-c"
"#,
    )
    .unwrap();
    assert!(matches!(
        ScenarioRunner::new(&ProtocolConfig::default(), &scenario),
        Err(SimulationError::InvalidParameter(_))
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = ProtocolConfig::default();
    config.oracle.period = 0;
    let scenario = Scenario::from_toml_str("name = \"empty\"").unwrap();
    assert!(matches!(
        ScenarioRunner::new(&config, &scenario),
        Err(SimulationError::Config(_))
    ));
}
