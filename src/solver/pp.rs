use super::Solver;
use crate::algorithm::{a_star_search, DEFAULT_MAX_ITERATIONS};
use crate::common::{Agent, ConstraintSet, Path, Solution};
use crate::error::{PlanningError, PlanningResult};
use crate::map::Map;
use crate::stat::Stats;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Prioritized Planning: agents are planned one by one in priority order and
/// every planned path becomes a set of hard constraints for the agents after it.
pub struct PP {
    agents: Vec<Agent>,
    map: Arc<Map>,
    max_iterations: usize,
    stats: Stats,
}

impl PP {
    pub fn new(agents: Vec<Agent>, map: Arc<Map>) -> Self {
        PP {
            agents,
            map,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            stats: Stats::default(),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Input indices sorted by ascending priority; equal priorities keep input order.
    pub fn planning_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.agents.len()).collect();
        order.sort_by_key(|&index| self.agents[index].priority);
        order
    }

    fn validate(&self) -> PlanningResult<()> {
        let mut starts: HashMap<(usize, usize), usize> = HashMap::new();

        for agent in &self.agents {
            if let Some(reason) = agent.invalid_reason(&self.map) {
                return Err(PlanningError::InvalidAgent {
                    agent: agent.id,
                    reason,
                });
            }
            if let Some(other) = starts.insert(agent.start, agent.id) {
                return Err(PlanningError::InvalidAgent {
                    agent: agent.id,
                    reason: format!("start {:?} is shared with agent {other}", agent.start),
                });
            }
        }

        Ok(())
    }
}

impl Solver for PP {
    #[instrument(skip_all, name = "pp", fields(agents = self.agents.len()), level = "debug")]
    fn solve(&mut self) -> PlanningResult<Solution> {
        let total_solve_start_time = Instant::now();
        self.stats = Stats::default();

        if let Err(error) = self.validate() {
            warn!("{error}");
            return Err(error);
        }

        let mut constraints = ConstraintSet::new();
        let mut paths: Vec<Path> = vec![Vec::new(); self.agents.len()];
        let mut total_expanded_nodes = 0;
        let mut total_cost = 0;

        for index in self.planning_order() {
            let agent = &self.agents[index];
            debug!(
                "planning agent {} (priority {}) {:?} -> {:?}",
                agent.id, agent.priority, agent.start, agent.goal
            );

            // The search only sees a shared borrow; constraints grow here alone.
            let output = match a_star_search(
                &self.map,
                agent.start,
                agent.goal,
                &constraints,
                self.max_iterations,
            ) {
                Ok(output) => output,
                Err(error) => {
                    let error = PlanningError::from_search(agent.id, error);
                    info!(
                        "instance failed after planning {} of {} agents: {error}",
                        self.stats.planned_agents,
                        self.agents.len()
                    );
                    return Err(error);
                }
            };

            total_expanded_nodes += output.expanded_nodes;
            total_cost += output.cost;
            constraints.extend_from_path(&output.path);
            paths[index] = output.path;

            self.stats.planned_agents += 1;
            self.stats.low_level_expand_nodes = total_expanded_nodes;
        }

        self.stats.costs = total_cost;
        self.stats.constraints = constraints.len();
        self.stats.time_us = total_solve_start_time.elapsed().as_micros() as usize;
        self.stats.print();

        Ok(Solution {
            total_expanded_nodes,
            paths,
            total_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::manhattan_distance;
    use crate::error::SearchError;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    }

    fn agent(id: usize, start: (usize, usize), goal: (usize, usize), priority: usize) -> Agent {
        Agent {
            id,
            start,
            goal,
            priority,
        }
    }

    fn map_of(rows: &[&str]) -> Arc<Map> {
        Arc::new(Map::from_rows(rows).unwrap())
    }

    fn positions(path: &Path) -> Vec<(usize, usize)> {
        path.iter().map(|step| step.position).collect()
    }

    #[test]
    fn test_pp_two_agents_on_empty_grid() {
        init_tracing();
        let map = map_of(&["...", "...", "..."]);
        let agents = vec![agent(0, (0, 0), (2, 2), 1), agent(1, (2, 2), (0, 2), 2)];

        let mut solver = PP::new(agents.clone(), map.clone());
        let solution = solver.solve().unwrap();

        assert_eq!(solution.paths[0].len() - 1, 4);
        assert_eq!(solution.paths[1].len() - 1, 2);
        assert_eq!(solution.total_cost, 6);
        assert!(solution.total_expanded_nodes > 0);
        assert!(solution.verify(&map, &agents));

        assert_eq!(solver.stats().planned_agents, 2);
        assert_eq!(solver.stats().costs, 6);
        assert_eq!(
            solver.stats().low_level_expand_nodes,
            solution.total_expanded_nodes
        );
    }

    #[test]
    fn test_planning_order_is_stable() {
        let map = map_of(&["...."]);
        let agents = vec![
            agent(0, (0, 0), (0, 1), 3),
            agent(1, (0, 1), (0, 2), 1),
            agent(2, (0, 2), (0, 3), 2),
            agent(3, (0, 3), (0, 0), 1),
        ];
        let solver = PP::new(agents, map);
        assert_eq!(solver.planning_order(), vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_priority_decides_who_waits() {
        init_tracing();
        let map = map_of(&["...", "@.@"]);
        let crossing = (0, 0);
        let merging = (1, 1);

        let agents = vec![
            agent(0, crossing, (0, 2), 1),
            agent(1, merging, (0, 1), 2),
        ];
        let solution = PP::new(agents.clone(), map.clone()).solve().unwrap();
        assert_eq!(positions(&solution.paths[0]), vec![(0, 0), (0, 1), (0, 2)]);
        assert_eq!(positions(&solution.paths[1]), vec![(1, 1), (1, 1), (0, 1)]);
        assert!(solution.verify(&map, &agents));

        let agents = vec![
            agent(0, crossing, (0, 2), 2),
            agent(1, merging, (0, 1), 1),
        ];
        let solution = PP::new(agents.clone(), map.clone()).solve().unwrap();
        // Paths stay in input order even though agent 1 went first.
        assert_eq!(positions(&solution.paths[0]), vec![(0, 0), (0, 0), (0, 1), (0, 2)]);
        assert_eq!(positions(&solution.paths[1]), vec![(1, 1), (0, 1)]);
        assert_eq!(solution.total_cost, 4);
        assert!(solution.verify(&map, &agents));
    }

    #[test]
    fn test_pp_no_conflicts_between_agents() {
        init_tracing();
        let map = map_of(&["......", "......", "..@...", "...@..", "......", "......"]);
        let agents = vec![
            agent(0, (0, 0), (5, 5), 1),
            agent(1, (0, 5), (5, 1), 2),
            agent(2, (1, 3), (4, 4), 3),
            agent(3, (2, 4), (0, 1), 4),
        ];

        let solution = PP::new(agents.clone(), map.clone()).solve().unwrap();
        assert!(solution.verify(&map, &agents));
        assert_eq!(
            solution.paths[0].len() - 1,
            manhattan_distance(agents[0].start, agents[0].goal)
        );

        let paths = &solution.paths;
        for i in 0..paths.len() {
            for j in (i + 1)..paths.len() {
                let common = paths[i].len().min(paths[j].len());
                for t in 0..common {
                    assert_ne!(paths[i][t].position, paths[j][t].position);
                }
                for t in 1..common {
                    let swapped = paths[i][t].position == paths[j][t - 1].position
                        && paths[i][t - 1].position == paths[j][t].position;
                    assert!(!swapped, "agents {i} and {j} swap at {t}");
                }
            }
        }
    }

    #[test]
    fn test_pp_deterministic() {
        init_tracing();
        let map = map_of(&[".....", ".@.@.", ".....", "..@.."]);
        let agents = vec![
            agent(0, (0, 0), (3, 4), 2),
            agent(1, (3, 4), (0, 0), 1),
            agent(2, (2, 2), (0, 4), 3),
        ];

        let mut first = PP::new(agents.clone(), map.clone());
        let mut second = PP::new(agents, map);
        let first_result = first.solve();
        let second_result = second.solve();
        assert_eq!(first_result, second_result);
        assert_eq!(
            first.stats().low_level_expand_nodes,
            second.stats().low_level_expand_nodes
        );
    }

    #[test]
    fn test_pp_head_on_corridor_fails() {
        init_tracing();
        let map = map_of(&["...."]);
        let agents = vec![agent(0, (0, 0), (0, 3), 1), agent(1, (0, 3), (0, 0), 2)];

        let result = PP::new(agents, map).solve();
        assert!(matches!(
            result,
            Err(PlanningError::Infeasible {
                agent: 1,
                reason: SearchError::Exhausted { .. }
            })
        ));
    }

    #[test]
    fn test_pp_disconnected_fails() {
        init_tracing();
        let map = Arc::new(Map::from_file("map_file/test/split.map").unwrap());
        let agents = vec![agent(0, (0, 0), (3, 1), 1), agent(1, (1, 0), (2, 4), 2)];

        let mut solver = PP::new(agents, map);
        let result = solver.solve();
        assert_eq!(
            result,
            Err(PlanningError::Infeasible {
                agent: 1,
                reason: SearchError::Unreachable {
                    start: (1, 0),
                    goal: (2, 4)
                }
            })
        );
        assert_eq!(solver.stats().planned_agents, 1);
    }

    #[test]
    fn test_pp_rejects_invalid_agents() {
        init_tracing();
        let map = map_of(&["...", ".@."]);

        let result = PP::new(vec![agent(7, (0, 0), (1, 1), 1)], map.clone()).solve();
        assert!(matches!(
            result,
            Err(PlanningError::InvalidAgent { agent: 7, .. })
        ));

        let result = PP::new(vec![agent(0, (5, 0), (0, 1), 1)], map.clone()).solve();
        assert!(matches!(
            result,
            Err(PlanningError::InvalidAgent { agent: 0, .. })
        ));

        let agents = vec![agent(0, (0, 0), (0, 2), 1), agent(1, (0, 0), (1, 0), 2)];
        let result = PP::new(agents, map).solve();
        assert_eq!(
            result,
            Err(PlanningError::InvalidAgent {
                agent: 1,
                reason: "start (0, 0) is shared with agent 0".to_string()
            })
        );
    }

    #[test]
    fn test_pp_iteration_limit_is_timeout() {
        init_tracing();
        let map = map_of(&["...", "...", "..."]);
        let agents = vec![agent(0, (0, 0), (2, 2), 1)];

        let result = PP::new(agents, map).with_max_iterations(1).solve();
        assert_eq!(
            result,
            Err(PlanningError::SearchTimeout { agent: 0, limit: 1 })
        );
    }

    #[test]
    fn test_pp_no_agents() {
        let map = map_of(&["..."]);
        let solution = PP::new(Vec::new(), map).solve().unwrap();
        assert!(solution.paths.is_empty());
        assert_eq!(solution.total_cost, 0);
        assert_eq!(solution.total_expanded_nodes, 0);
    }
}
