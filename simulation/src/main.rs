use std::fs;

use anyhow::{bail, Context};
use clap::Parser;

use aegis_core::ProtocolConfig;
use aegis_simulation::{Scenario, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "aegis-sim")]
#[command(about = "Run pool hook scenarios against a constant-product host engine")]
struct Args {
    /// Scenario file to run
    #[arg(short, long, default_value = "scenarios/basic.toml")]
    scenario: String,

    /// Protocol configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    let config = match &args.config {
        Some(path) => ProtocolConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => {
            log::info!("No configuration file given, using defaults");
            ProtocolConfig::default()
        }
    };

    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("failed to load scenario {}", args.scenario))?;
    log::info!("Running scenario `{}` from {}", scenario.name, args.scenario);
    if !scenario.description.is_empty() {
        log::info!("{}", scenario.description);
    }

    let report = ScenarioRunner::new(&config, &scenario)?.run(&scenario)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write report to {}", path))?;
            log::info!("Report written to {}", path);
        }
        None => println!("{}", json),
    }

    for pool in &report.pools {
        log::info!(
            "Pool {}: reserves ({}, {}), lp fee {}, price {}",
            pool.name,
            pool.reserve0,
            pool.reserve1,
            pool.lp_fee,
            pool.price
        );
    }

    if !report.passed() {
        bail!(
            "scenario `{}`: {} of {} steps did not behave as declared",
            report.name,
            report.unexpected,
            report.steps.len()
        );
    }
    log::info!("Scenario `{}` completed: {} steps", report.name, report.steps.len());
    Ok(())
}
