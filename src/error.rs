use thiserror::Error;

/// Why a single-agent search produced no path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("position {position:?} is outside the {height}x{width} map")]
    OutOfBounds {
        position: (usize, usize),
        height: usize,
        width: usize,
    },

    #[error("goal {goal:?} is not reachable from {start:?} in the static map")]
    Unreachable {
        start: (usize, usize),
        goal: (usize, usize),
    },

    #[error("open list exhausted after expanding {expanded_nodes} nodes")]
    Exhausted { expanded_nodes: usize },

    #[error("iteration limit of {limit} expansions exceeded")]
    IterationLimit { limit: usize },
}

/// Failure of a whole prioritized planning instance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanningError {
    #[error("agent {agent} is invalid: {reason}")]
    InvalidAgent { agent: usize, reason: String },

    #[error("no conflict-free path for agent {agent}: {reason}")]
    Infeasible { agent: usize, reason: SearchError },

    #[error("search for agent {agent} gave up after {limit} expansions")]
    SearchTimeout { agent: usize, limit: usize },
}

impl PlanningError {
    pub(crate) fn from_search(agent: usize, error: SearchError) -> Self {
        match error {
            SearchError::IterationLimit { limit } => PlanningError::SearchTimeout { agent, limit },
            reason => PlanningError::Infeasible { agent, reason },
        }
    }
}

pub type SearchResult<T> = Result<T, SearchError>;
pub type PlanningResult<T> = Result<T, PlanningError>;
