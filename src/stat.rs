use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub costs: usize,
    pub time_us: usize,
    pub low_level_expand_nodes: usize,
    pub planned_agents: usize,
    pub constraints: usize,
}

impl Stats {
    pub(crate) fn print(&self) {
        info!(
            "Cost {:?} Time(microseconds) {:?} Planned agents {:?} Constraints {:?} Low level expand nodes number {:?}",
            self.costs, self.time_us, self.planned_agents, self.constraints, self.low_level_expand_nodes
        );
    }
}
