//! # marga-plan
//!
//! Incremental any-angle grid path planner (Field D*) for mobile robots.
//!
//! ## Overview
//!
//! The planner maintains a goal-rooted shortest-path tree over an occupancy
//! grid and repairs it in place as new sensor data changes the map, instead
//! of searching from scratch every cycle:
//!
//! - **Incremental**: only the neighborhood affected by changed cells is
//!   re-derived; an unchanged map replans in zero expansions
//! - **Any-angle**: path costs are interpolated across cell edges, so
//!   waypoints may land anywhere on an edge rather than only on the 8
//!   grid directions
//! - **Footprint-aware**: obstacle costs are inflated by the robot radius
//!   plus a safety margin before the search sees them
//!
//! ## Quick Start
//!
//! ```rust
//! use marga_plan::{CellUpdate, FieldDStarPlanner, GridCoord, OccupancyGrid,
//!                  PlannerConfig, PlanStatus, WorldPoint};
//!
//! let grid = OccupancyGrid::new(100, 100, 0.05, WorldPoint::ZERO);
//! let mut planner = FieldDStarPlanner::new(grid, PlannerConfig::default());
//!
//! planner.set_goal(WorldPoint::new(4.0, 4.0));
//!
//! // Each cycle: newest pose and map delta in, path out
//! planner.set_start(WorldPoint::new(0.5, 0.5));
//! planner.update_map(&[CellUpdate::new(GridCoord::new(40, 40), 255)]);
//! let result = planner.plan_cycle();
//!
//! if result.status == PlanStatus::Ok {
//!     println!("{} waypoints, {} expansions", result.path.len(), result.expansions);
//! }
//! ```
//!
//! ## Coordinate System
//!
//! World coordinates are meters; the grid origin is the world position of
//! lattice vertex (0, 0). Search runs on the corner lattice of the cell
//! grid, and path waypoints may be fractional grid positions.

#![warn(missing_docs)]

// Core geometry types
pub mod core;

// Occupancy storage, cost inflation, and the search graph
pub mod grid;

// Unified configuration
pub mod config;

// The incremental search
pub mod planning;

// Error taxonomy
pub mod error;

// Re-export commonly used types
pub use self::core::{GridCoord, GridPoint, WorldPoint};

pub use config::PlannerConfig;

pub use error::{PlannerError, Result};

pub use grid::{multipliers, CellUpdate, CostMap, OccupancyGrid, SearchGraph};

pub use planning::{FieldDStarPlanner, Key, OpenList, PlanResult, PlanStatus};
