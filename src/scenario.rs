use anyhow::{bail, Context, Result};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::common::Agent;
use crate::map::Map;

/// A pool of agents drawn for one map. Experiments take prefixes of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub agents: Vec<Agent>,
}

impl Scenario {
    /// Draws `num_agents` agents with pairwise distinct free start and goal
    /// cells. Agent `i` gets priority `i + 1`.
    pub fn generate_agents<R: Rng + ?Sized>(
        map: &Map,
        num_agents: usize,
        rng: &mut R,
    ) -> Result<Scenario> {
        let mut free_cells = map.free_cells();
        if free_cells.len() < num_agents * 2 {
            bail!(
                "map has {} free cells, {} agents need at least {}",
                free_cells.len(),
                num_agents,
                num_agents * 2
            );
        }

        free_cells.shuffle(rng);

        let mut agents = Vec::with_capacity(num_agents);
        for id in 0..num_agents {
            // Popping keeps every start and goal unique.
            let (Some(start), Some(goal)) = (free_cells.pop(), free_cells.pop()) else {
                bail!("ran out of free cells unexpectedly");
            };
            agents.push(Agent {
                id,
                start,
                goal,
                priority: id + 1,
            });
        }

        info!("Generated {num_agents} agents");
        debug!("Generate scen: {agents:?}");
        Ok(Scenario { agents })
    }

    /// The first `count` agents of the pool.
    pub fn take(&self, count: usize) -> Result<Vec<Agent>> {
        if count > self.agents.len() {
            bail!(
                "requested {count} agents but the pool only holds {}; raise max_agents",
                self.agents.len()
            );
        }
        Ok(self.agents[..count].to_vec())
    }

    pub fn load_agents_from_yaml(path: &str) -> Result<Scenario> {
        let file = File::open(path).with_context(|| format!("failed to open {path}"))?;
        let reader = BufReader::new(file);
        let agents: Vec<Agent> = serde_yaml::from_reader(reader)
            .with_context(|| format!("failed to parse agents from {path}"))?;
        Ok(Scenario { agents })
    }

    pub fn write_agents_to_yaml(&self, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
        let mut writer = io::BufWriter::new(file);
        let yaml_data = serde_yaml::to_string(&self.agents)?;
        writer.write_all(yaml_data.as_bytes())?;

        Ok(())
    }
}
