mod constraint;
mod lowlevel;

pub use constraint::{Constraint, ConstraintSet};
pub(crate) use lowlevel::LowLevelOpenNode;

use crate::map::Map;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: usize,
    pub start: (usize, usize),
    pub goal: (usize, usize),
    /// Lower values are planned first.
    pub priority: usize,
}

impl Agent {
    /// Describes why this agent cannot be planned on `map`, if it cannot.
    pub fn invalid_reason(&self, map: &Map) -> Option<String> {
        for (name, position) in [("start", self.start), ("goal", self.goal)] {
            if !map.in_bounds(position) {
                return Some(format!(
                    "{name} {position:?} is outside the {}x{} map",
                    map.height, map.width
                ));
            }
            if !map.is_passable(position.0, position.1) {
                return Some(format!("{name} {position:?} is an obstacle"));
            }
        }
        None
    }

    pub fn verify(&self, map: &Map) -> bool {
        self.invalid_reason(map).is_none()
    }
}

/// One time-expanded state of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathStep {
    pub position: (usize, usize),
    pub time_step: usize,
}

pub type Path = Vec<PathStep>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub total_expanded_nodes: usize,
    /// Index-aligned with the agents handed to the solver.
    pub paths: Vec<Path>,
    pub total_cost: usize,
}

impl Solution {
    /// Checks every path against the map and every pair of paths for vertex
    /// and swap conflicts while both agents are still travelling.
    pub fn verify(&self, map: &Map, agents: &[Agent]) -> bool {
        if self.paths.len() != agents.len() {
            debug!(
                "solution has {} paths for {} agents",
                self.paths.len(),
                agents.len()
            );
            return false;
        }

        let mut cost = 0;
        for (agent, path) in agents.iter().zip(&self.paths) {
            if !is_valid_path(map, agent, path) {
                debug!("agent {} has an invalid path: {path:?}", agent.id);
                return false;
            }
            cost += path.len() - 1;
        }
        if cost != self.total_cost {
            debug!("total cost {} does not match paths ({cost})", self.total_cost);
            return false;
        }

        let mut occupied: HashMap<((usize, usize), usize), usize> = HashMap::new();
        for (index, path) in self.paths.iter().enumerate() {
            for step in path {
                if let Some(other) = occupied.insert((step.position, step.time_step), index) {
                    debug!("vertex conflict between {other} and {index} at {step:?}");
                    return false;
                }
            }
        }

        for i in 0..self.paths.len() {
            for j in (i + 1)..self.paths.len() {
                let (path_1, path_2) = (&self.paths[i], &self.paths[j]);
                let common = path_1.len().min(path_2.len());
                for t in 1..common {
                    if path_1[t].position == path_2[t - 1].position
                        && path_1[t - 1].position == path_2[t].position
                        && path_1[t].position != path_1[t - 1].position
                    {
                        debug!("swap conflict between {i} and {j} at time step {t}");
                        return false;
                    }
                }
            }
        }

        true
    }
}

fn is_valid_path(map: &Map, agent: &Agent, path: &Path) -> bool {
    let (Some(first), Some(last)) = (path.first(), path.last()) else {
        return false;
    };
    if first.position != agent.start || first.time_step != 0 || last.position != agent.goal {
        return false;
    }

    for (t, step) in path.iter().enumerate() {
        if step.time_step != t || !map.in_bounds(step.position) {
            return false;
        }
        if !map.is_passable(step.position.0, step.position.1) {
            return false;
        }
    }

    path.windows(2)
        .all(|w| manhattan_distance(w[0].position, w[1].position) <= 1)
}

pub fn manhattan_distance(from: (usize, usize), to: (usize, usize)) -> usize {
    from.0.abs_diff(to.0) + from.1.abs_diff(to.1)
}
