mod pp;

pub use pp::PP;

use crate::common::Solution;
use crate::error::PlanningResult;

pub trait Solver {
    fn solve(&mut self) -> PlanningResult<Solution>;
}
