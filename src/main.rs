use mapf_pp::config::{Cli, Config};
use mapf_pp::experiment::run_experiments;
use mapf_pp::map::Map;
use mapf_pp::scenario::Scenario;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("failed to read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let map = Arc::new(Map::from_file(&config.map_path)?);
    info!("Loaded {}x{} map {}", map.height, map.width, config.map_path);

    let scenario = if let Some(agents_path) = config.agents_path.as_ref() {
        Scenario::load_agents_from_yaml(agents_path)?
    } else {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let scenario = Scenario::generate_agents(&map, config.pool_size(), &mut rng)?;
        if let Some(save_path) = config.save_agents_path.as_ref() {
            scenario.write_agents_to_yaml(save_path)?;
            info!("Agent pool written to {save_path}, replay it with --agents-path");
        }
        scenario
    };
    for agent in &scenario.agents {
        if let Some(reason) = agent.invalid_reason(&map) {
            info!("agent {} will be rejected: {reason}", agent.id);
        }
    }

    let report = run_experiments(map, &scenario, &config).await?;
    report.print();
    report
        .write_json(&config.output_path)
        .with_context(|| format!("failed to write report to {}", config.output_path))?;
    info!("Report written to {}", config.output_path);

    Ok(())
}
