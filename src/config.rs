use anyhow::anyhow;
use clap::Parser;
use serde::Deserialize;

use crate::algorithm::DEFAULT_MAX_ITERATIONS;

#[derive(Parser, Debug, Default)]
#[command(
    name = "Rust PP",
    about = "Prioritized Planning for multi-agent pathfinding on grid maps.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the map file")]
    pub map_path: Option<String>,

    #[arg(
        long,
        help = "Agent counts to test, comma separated (e.g. 5,10,15)",
        value_delimiter = ','
    )]
    pub agent_counts: Vec<usize>,

    #[arg(long, help = "Largest agent count a sweep may ask for")]
    pub max_agents: Option<usize>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, help = "Expansion limit for a single agent search")]
    pub max_iterations: Option<usize>,

    #[arg(long, help = "Path to the JSON report")]
    pub output_path: Option<String>,

    #[arg(long, help = "Optional YAML file with a fixed agent pool")]
    pub agents_path: Option<String>,

    #[arg(long, help = "Write the generated agent pool to this YAML file")]
    pub save_agents: Option<String>,

    #[arg(
        long,
        help = "Run the instances of a sweep concurrently",
        default_value_t = false
    )]
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub map_path: String,
    pub agent_counts: Vec<usize>,
    pub max_agents: usize,
    pub seed: u64,
    pub max_iterations: usize,
    pub output_path: String,
    pub agents_path: Option<String>,
    pub save_agents_path: Option<String>,
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map_path: "map_file/test/test.map".to_string(),
            agent_counts: vec![1, 2, 3],
            max_agents: 120,
            seed: 0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            output_path: "result/result.json".to_string(),
            agents_path: None,
            save_agents_path: None,
            parallel: false,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Number of agents to generate: the largest count of the sweep.
    ///
    /// Generation pops cells off one seeded shuffle, so every prefix is the
    /// same whatever the pool size and the map only has to hold this many.
    pub fn pool_size(&self) -> usize {
        self.agent_counts.iter().copied().max().unwrap_or(0)
    }

    /// Flags given on the command line win over the config file.
    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(map_path) = &cli.map_path {
            self.map_path = map_path.clone();
        }
        if !cli.agent_counts.is_empty() {
            self.agent_counts = cli.agent_counts.clone();
        }
        if let Some(max_agents) = cli.max_agents {
            self.max_agents = max_agents;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(max_iterations) = cli.max_iterations {
            self.max_iterations = max_iterations;
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = output_path.clone();
        }
        if let Some(agents_path) = &cli.agents_path {
            self.agents_path = Some(agents_path.clone());
        }
        if let Some(save_agents) = &cli.save_agents {
            self.save_agents_path = Some(save_agents.clone());
        }
        if cli.parallel {
            self.parallel = true;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.map_path.is_empty() {
            return Err(anyhow!("Map path must not be empty"));
        }

        if self.agent_counts.is_empty() {
            return Err(anyhow!("At least one agent count is required"));
        }

        for &count in &self.agent_counts {
            if count == 0 {
                return Err(anyhow!("Agent counts must be positive, got {count}"));
            }
            if self.agents_path.is_none() && count > self.max_agents {
                return Err(anyhow!(
                    "Agent count {} exceeds max_agents {}",
                    count,
                    self.max_agents
                ));
            }
        }

        if self.max_iterations == 0 {
            return Err(anyhow!("Max iterations must be greater than 0"));
        }

        if self.agents_path.is_some() && self.save_agents_path.is_some() {
            return Err(anyhow!(
                "save_agents_path only applies to generated pools, drop agents_path"
            ));
        }

        Ok(())
    }
}
