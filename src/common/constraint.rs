use super::Path;

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constraint {
    /// Forbids being at `position` at `time_step`.
    Vertex {
        position: (usize, usize),
        time_step: usize,
    },
    /// Forbids moving `from_position -> to_position` so as to arrive at `to_time_step`.
    Edge {
        from_position: (usize, usize),
        to_position: (usize, usize),
        to_time_step: usize,
    },
}

/// Cumulative space-time constraints handed to the low level search.
///
/// The set only ever grows while an instance is being planned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    constraints: HashSet<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn insert(&mut self, constraint: Constraint) -> bool {
        self.constraints.insert(constraint)
    }

    pub fn contains(&self, constraint: &Constraint) -> bool {
        self.constraints.contains(constraint)
    }

    /// Whether the move `from -> to` arriving at `time_step` hits a vertex or edge constraint.
    pub fn is_violated(
        &self,
        from: (usize, usize),
        to: (usize, usize),
        time_step: usize,
    ) -> bool {
        self.constraints.contains(&Constraint::Vertex {
            position: to,
            time_step,
        }) || self.constraints.contains(&Constraint::Edge {
            from_position: from,
            to_position: to,
            to_time_step: time_step,
        })
    }

    /// Reserves a planned path for every agent planned after it.
    ///
    /// Each step becomes a vertex constraint. Each move `a -> b` arriving at `t`
    /// becomes the reversed edge constraint `b -> a` at `t`, which is exactly the
    /// head-on swap a later agent must not perform.
    pub fn extend_from_path(&mut self, path: &Path) -> usize {
        let before = self.constraints.len();

        for step in path {
            self.constraints.insert(Constraint::Vertex {
                position: step.position,
                time_step: step.time_step,
            });
        }

        for window in path.windows(2) {
            let (prev, curr) = (&window[0], &window[1]);
            self.constraints.insert(Constraint::Edge {
                from_position: curr.position,
                to_position: prev.position,
                to_time_step: curr.time_step,
            });
        }

        self.constraints.len() - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PathStep;

    fn path_of(positions: &[(usize, usize)]) -> Path {
        positions
            .iter()
            .enumerate()
            .map(|(time_step, &position)| PathStep {
                position,
                time_step,
            })
            .collect()
    }

    #[test]
    fn test_extend_from_path_adds_vertex_and_reversed_edges() {
        let mut constraints = ConstraintSet::new();
        let added = constraints.extend_from_path(&path_of(&[(0, 0), (0, 1), (1, 1)]));

        assert_eq!(added, 5);
        assert!(constraints.contains(&Constraint::Vertex {
            position: (0, 1),
            time_step: 1,
        }));
        assert!(constraints.contains(&Constraint::Edge {
            from_position: (0, 1),
            to_position: (0, 0),
            to_time_step: 1,
        }));
        assert!(constraints.contains(&Constraint::Edge {
            from_position: (1, 1),
            to_position: (0, 1),
            to_time_step: 2,
        }));
        // The forward direction stays allowed.
        assert!(!constraints.contains(&Constraint::Edge {
            from_position: (0, 0),
            to_position: (0, 1),
            to_time_step: 1,
        }));
        assert_eq!(constraints.len(), 5);
    }

    #[test]
    fn test_is_violated() {
        let mut constraints = ConstraintSet::new();
        constraints.extend_from_path(&path_of(&[(1, 1), (1, 2)]));

        // Vertex conflict.
        assert!(constraints.is_violated((0, 2), (1, 2), 1));
        // Swap conflict.
        assert!(constraints.is_violated((1, 2), (1, 1), 1));
        // Same cell, other time step.
        assert!(!constraints.is_violated((0, 2), (1, 2), 2));
        assert!(!constraints.is_violated((0, 1), (1, 1), 1));
    }

    #[test]
    fn test_empty_set() {
        let constraints = ConstraintSet::new();
        assert!(constraints.is_empty());
        assert_eq!(constraints.len(), 0);
        assert!(!constraints.is_violated((0, 0), (0, 1), 1));
    }
}
