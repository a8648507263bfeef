mod astar;

pub use astar::{a_star_search, SearchOutput, DEFAULT_MAX_ITERATIONS};

use std::collections::HashMap;

use crate::common::{Path, PathStep};

type State = ((usize, usize), usize);
type Trace = HashMap<State, State>;

fn construct_path(trace: &Trace, mut current: State) -> Path {
    let mut path = vec![PathStep {
        position: current.0,
        time_step: current.1,
    }];
    while let Some(&(position, time_step)) = trace.get(&current) {
        path.push(PathStep {
            position,
            time_step,
        });
        current = (position, time_step);
    }
    path.reverse();
    path
}
