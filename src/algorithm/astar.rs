use super::{construct_path, State, Trace};
use crate::common::{manhattan_distance, Constraint, ConstraintSet, LowLevelOpenNode, Path};
use crate::error::{SearchError, SearchResult};
use crate::map::Map;

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument, trace, warn};

pub const DEFAULT_MAX_ITERATIONS: usize = 100_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutput {
    pub path: Path,
    /// Path length in edges, waiting included.
    pub cost: usize,
    pub expanded_nodes: usize,
}

/// Time-expanded A* from `(start, 0)` to the first state on `goal`.
///
/// Successors are up, down, left, right and stay, each costing one time step.
/// Moves that land on a vertex constraint or traverse an edge constraint are
/// pruned. Open list ties on `f` are broken by insertion order.
#[instrument(skip_all, name = "low_level_a_star", fields(start = format!("{start:?}"), goal = format!("{goal:?}")), level = "debug")]
pub fn a_star_search(
    map: &Map,
    start: (usize, usize),
    goal: (usize, usize),
    constraints: &ConstraintSet,
    max_iterations: usize,
) -> SearchResult<SearchOutput> {
    debug!("constraints: {}", constraints.len());

    for position in [start, goal] {
        if !map.in_bounds(position) {
            return Err(SearchError::OutOfBounds {
                position,
                height: map.height,
                width: map.width,
            });
        }
    }

    // The agent already stands on its start at t = 0, so a constraint there
    // leaves nothing to expand.
    if constraints.contains(&Constraint::Vertex {
        position: start,
        time_step: 0,
    }) {
        debug!("start state is constrained");
        return Err(SearchError::Exhausted { expanded_nodes: 0 });
    }

    // Waiting keeps the open list alive forever, so a statically
    // disconnected goal has to be caught up front.
    if !map.is_reachable(start, goal) {
        debug!("goal unreachable in static map");
        return Err(SearchError::Unreachable { start, goal });
    }

    let mut open_list = BTreeSet::new();
    let mut open_index: HashMap<State, LowLevelOpenNode> = HashMap::new();
    let mut closed_list: HashSet<State> = HashSet::new();
    let mut g_cost_map: HashMap<State, usize> = HashMap::new();
    let mut trace = Trace::new();
    let mut order = 0;
    let mut expanded_nodes = 0;

    let start_node = LowLevelOpenNode {
        position: start,
        f_open_cost: manhattan_distance(start, goal),
        g_cost: 0,
        time_step: 0,
        order,
    };
    g_cost_map.insert(start_node.state(), 0);
    open_index.insert(start_node.state(), start_node.clone());
    open_list.insert(start_node);

    while let Some(current) = open_list.pop_first() {
        if expanded_nodes >= max_iterations {
            warn!("iteration limit {max_iterations} reached, giving up");
            return Err(SearchError::IterationLimit {
                limit: max_iterations,
            });
        }

        trace!("expand node: {current:?}");
        let current_state = current.state();
        open_index.remove(&current_state);
        closed_list.insert(current_state);
        expanded_nodes += 1;

        if current.position == goal {
            let path = construct_path(&trace, current_state);
            let cost = path.len() - 1;
            debug!("found path with cost {cost} after {expanded_nodes} expansions");
            return Ok(SearchOutput {
                path,
                cost,
                expanded_nodes,
            });
        }

        // Uniform cost, so g and time step advance together.
        let tentative_g_cost = current.g_cost + 1;
        let next_time_step = current.time_step + 1;

        for &neighbor in map.neighbors(current.position) {
            let neighbor_state = (neighbor, next_time_step);
            if closed_list.contains(&neighbor_state) {
                continue;
            }

            if constraints.is_violated(current.position, neighbor, next_time_step) {
                continue;
            }

            let old_g_cost = *g_cost_map.get(&neighbor_state).unwrap_or(&usize::MAX);
            if tentative_g_cost >= old_g_cost {
                continue;
            }

            g_cost_map.insert(neighbor_state, tentative_g_cost);
            trace.insert(neighbor_state, current_state);
            if let Some(stale) = open_index.remove(&neighbor_state) {
                open_list.remove(&stale);
            }

            order += 1;
            let node = LowLevelOpenNode {
                position: neighbor,
                f_open_cost: tentative_g_cost + manhattan_distance(neighbor, goal),
                g_cost: tentative_g_cost,
                time_step: next_time_step,
                order,
            };
            open_index.insert(neighbor_state, node.clone());
            open_list.insert(node);
        }
    }

    debug!("cannot find solution");
    Err(SearchError::Exhausted { expanded_nodes })
}
