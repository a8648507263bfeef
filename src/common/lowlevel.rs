use std::cmp::Ordering;

#[derive(Clone, Debug)]
pub(crate) struct LowLevelOpenNode {
    pub(crate) position: (usize, usize),
    pub(crate) f_open_cost: usize,
    pub(crate) g_cost: usize,
    pub(crate) time_step: usize,
    // Insertion counter, unique per search call.
    pub(crate) order: usize,
}

impl LowLevelOpenNode {
    pub(crate) fn state(&self) -> ((usize, usize), usize) {
        (self.position, self.time_step)
    }
}

// Equality follows the open list order, so two nodes are equal only when
// they would occupy the same slot in the `BTreeSet`.
impl PartialEq for LowLevelOpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LowLevelOpenNode {}

impl Ord for LowLevelOpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_open_cost
            .cmp(&other.f_open_cost)
            // Ties go to whichever node was pushed first.
            .then_with(|| self.order.cmp(&other.order))
    }
}

impl PartialOrd for LowLevelOpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
