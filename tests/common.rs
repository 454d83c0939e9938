//! Test utilities for planner scenarios.
//!
//! Grids here use a 1 meter/cell resolution so world coordinates and grid
//! units coincide and expected path lengths can be read off directly.

#![allow(dead_code)]

use marga_plan::{
    FieldDStarPlanner, GridCoord, OccupancyGrid, PlannerConfig, WorldPoint,
};

/// An empty `cells × cells` grid at unit resolution.
pub fn open_grid(cells: usize) -> OccupancyGrid {
    OccupancyGrid::new(cells, cells, 1.0, WorldPoint::ZERO)
}

/// Configuration for a point robot: no footprint inflation, so expected
/// costs depend only on the obstacles actually placed.
pub fn point_robot_config() -> PlannerConfig {
    PlannerConfig {
        robot_radius: 0.0,
        safety_margin: 0.0,
        near_penalty_dist: 0.0,
        ..Default::default()
    }
}

/// Planner over `grid` with the point-robot configuration.
pub fn point_robot_planner(grid: OccupancyGrid) -> FieldDStarPlanner {
    FieldDStarPlanner::new(grid, point_robot_config())
}

/// Occupy a horizontal run of cells.
pub fn horizontal_wall(grid: &mut OccupancyGrid, y: i32, x0: i32, x1: i32) {
    for x in x0..=x1 {
        grid.set_occupancy(GridCoord::new(x, y), 255);
    }
}

/// Occupy a vertical run of cells.
pub fn vertical_wall(grid: &mut OccupancyGrid, x: i32, y0: i32, y1: i32) {
    for y in y0..=y1 {
        grid.set_occupancy(GridCoord::new(x, y), 255);
    }
}

/// Occupy a square ring of cells: the border of `[x0, x1] × [y0, y1]`.
pub fn ring_wall(grid: &mut OccupancyGrid, x0: i32, y0: i32, x1: i32, y1: i32) {
    horizontal_wall(grid, y0, x0, x1);
    horizontal_wall(grid, y1, x0, x1);
    vertical_wall(grid, x0, y0, y1);
    vertical_wall(grid, x1, y0, y1);
}

/// Total length of a world-coordinate path.
pub fn path_length(path: &[WorldPoint]) -> f32 {
    path.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// True when some waypoint sits strictly between lattice vertices.
pub fn has_fractional_waypoint(path: &[WorldPoint]) -> bool {
    path.iter().any(|p| {
        (p.x - p.x.round()).abs() > 1e-3 || (p.y - p.y.round()).abs() > 1e-3
    })
}
