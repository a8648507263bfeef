use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{info, warn};

use crate::common::Agent;
use crate::config::Config;
use crate::map::Map;
use crate::scenario::Scenario;
use crate::solver::{Solver, PP};

/// Outcome of one PP instance in a sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentRecord {
    pub num_agents: usize,
    pub success: bool,
    pub total_cost: Option<usize>,
    pub expanded_nodes: Option<usize>,
    pub running_time_ms: f64,
    pub failure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentReport {
    pub map: String,
    pub seed: u64,
    pub records: Vec<ExperimentRecord>,
    pub successes: usize,
    pub failures: usize,
}

pub fn run_instance(map: Arc<Map>, agents: Vec<Agent>, max_iterations: usize) -> ExperimentRecord {
    let num_agents = agents.len();
    let start_time = Instant::now();
    let mut solver = PP::new(agents.clone(), map.clone()).with_max_iterations(max_iterations);
    let result = solver.solve();
    let running_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(solution) if solution.verify(&map, &agents) => ExperimentRecord {
            num_agents,
            success: true,
            total_cost: Some(solution.total_cost),
            expanded_nodes: Some(solution.total_expanded_nodes),
            running_time_ms,
            failure: None,
        },
        Ok(_) => {
            warn!("solution for {num_agents} agents failed verification");
            ExperimentRecord {
                num_agents,
                success: false,
                total_cost: None,
                expanded_nodes: None,
                running_time_ms,
                failure: Some("solution failed verification".to_string()),
            }
        }
        Err(error) => {
            info!("PP found no valid solution for {num_agents} agents: {error}");
            ExperimentRecord {
                num_agents,
                success: false,
                total_cost: None,
                expanded_nodes: None,
                running_time_ms,
                failure: Some(error.to_string()),
            }
        }
    }
}

/// Runs PP once per configured agent count on a prefix of the pool.
///
/// Instances are independent, so with `parallel` they all run at once on the
/// blocking pool. Records always come back in agent-count order.
pub async fn run_experiments(
    map: Arc<Map>,
    scenario: &Scenario,
    config: &Config,
) -> Result<ExperimentReport> {
    let mut instances = Vec::with_capacity(config.agent_counts.len());
    for &count in &config.agent_counts {
        instances.push(scenario.take(count)?);
    }

    let mut records = Vec::with_capacity(instances.len());
    let mut handles = Vec::new();
    for agents in instances {
        let map = map.clone();
        let max_iterations = config.max_iterations;
        let handle = task::spawn_blocking(move || run_instance(map, agents, max_iterations));
        if config.parallel {
            handles.push(handle);
        } else {
            records.push(handle.await.context("instance task panicked")?);
        }
    }
    for handle in handles {
        records.push(handle.await.context("instance task panicked")?);
    }

    let successes = records.iter().filter(|record| record.success).count();
    let map_name = Path::new(&config.map_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ExperimentReport {
        map: map_name,
        seed: config.seed,
        failures: records.len() - successes,
        successes,
        records,
    })
}

impl ExperimentReport {
    pub fn print(&self) {
        info!("Prioritized Planning results on {}:", self.map);
        info!(
            "{:>10} | {:>12} | {:>13} | {:>12}",
            "Agents", "Total cost", "Expanded", "Time (ms)"
        );
        info!("{}", "-".repeat(56));
        for record in &self.records {
            match (record.total_cost, record.expanded_nodes) {
                (Some(cost), Some(expanded)) => info!(
                    "{:>10} | {:>12} | {:>13} | {:>12.3}",
                    record.num_agents, cost, expanded, record.running_time_ms
                ),
                _ => info!(
                    "{:>10} | {:>12} | {:>13} | {:>12.3}",
                    record.num_agents, "failed", "-", record.running_time_ms
                ),
            }
        }
        info!("Successes {} Failures {}", self.successes, self.failures);
    }

    pub fn write_json(&self, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}
