//! Occupancy storage, traversal costs, and the planner-facing graph view.

mod cost_map;
mod graph;
mod occupancy;

pub use cost_map::{multipliers, CostMap};
pub use graph::SearchGraph;
pub use occupancy::{CellUpdate, OccupancyGrid};
