//! Traversal cost map with obstacle inflation.
//!
//! Converts raw occupancy into per-cell traversal multipliers the search
//! can consume directly: free space costs `1.0` per unit traveled, cells
//! near obstacles cost more, and cells inside the inflated robot footprint
//! are infinite (lethal). Lethality as `+inf` keeps the expansion loop free
//! of special cases.
//!
//! The distance-to-obstacle field is computed with a Brushfire (BFS) sweep.
//! After an occupancy delta only a bounded window around each changed cell
//! is recomputed, which is what keeps replanning cycles cheap.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::PlannerConfig;
use crate::core::GridCoord;
use crate::grid::occupancy::OccupancyGrid;

/// Traversal multiplier tiers applied on top of the distance field.
pub mod multipliers {
    /// Free space, unit cost per unit distance
    pub const FREE: f32 = 1.0;
    /// Boundary of the obstacle-proximity penalty band
    pub const NEAR_OBSTACLE: f32 = 4.0;
    /// Multiplier just outside the inflated (lethal) footprint
    pub const INFLATION_EDGE: f32 = 20.0;
}

const SQRT2: f32 = std::f32::consts::SQRT_2;

/// Per-cell traversal multipliers plus the obstacle distance field behind
/// them.
#[derive(Clone, Debug)]
pub struct CostMap {
    width: usize,
    height: usize,
    /// Lethal band: within the robot radius of an obstacle (cells)
    inscribed_cells: f32,
    /// Inflation band outer edge: robot radius + safety margin (cells)
    inflation_cells: f32,
    /// Proximity penalty band outer edge (cells)
    penalty_cells: f32,
    /// Chebyshev radius beyond which an occupancy change cannot affect costs
    influence_cells: i32,
    occupied_threshold: u8,
    occupancy_weight: f32,
    /// Traversal multiplier per cell; `INFINITY` = lethal
    cost: Vec<f32>,
    /// Distance to nearest obstacle per cell, in cells
    distance: Vec<f32>,
}

impl CostMap {
    /// Build the cost map for the full grid.
    pub fn from_grid(grid: &OccupancyGrid, config: &PlannerConfig) -> Self {
        let width = grid.width();
        let height = grid.height();
        let resolution = grid.resolution();

        let inscribed_cells = config.robot_radius / resolution;
        let inflation_cells = config.inflation_radius() / resolution;
        let penalty_cells = (config.near_penalty_dist / resolution).max(inflation_cells);
        let influence_cells = penalty_cells.ceil() as i32 + 1;

        let mut map = Self {
            width,
            height,
            inscribed_cells,
            inflation_cells,
            penalty_cells,
            influence_cells,
            occupied_threshold: config.occupied_threshold,
            occupancy_weight: config.occupancy_weight,
            cost: vec![multipliers::FREE; width * height],
            distance: vec![f32::MAX; width * height],
        };
        map.rebuild(grid);
        map
    }

    /// Recompute the distance field and all costs from scratch.
    pub fn rebuild(&mut self, grid: &OccupancyGrid) {
        self.distance.fill(f32::MAX);

        let mut queue = VecDeque::new();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let coord = GridCoord::new(x, y);
                if grid.occupancy(coord) >= self.occupied_threshold {
                    let idx = self.index(coord);
                    self.distance[idx] = 0.0;
                    queue.push_back(coord);
                }
            }
        }

        // Brushfire sweep out from every obstacle cell
        while let Some(coord) = queue.pop_front() {
            let current = self.distance[self.index(coord)];
            for (neighbor, step) in Self::neighbor_steps(coord) {
                if !self.cell_in_bounds(neighbor) {
                    continue;
                }
                let idx = self.index(neighbor);
                let candidate = current + step;
                if candidate < self.distance[idx] {
                    self.distance[idx] = candidate;
                    queue.push_back(neighbor);
                }
            }
        }

        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let coord = GridCoord::new(x, y);
                let idx = self.index(coord);
                self.cost[idx] = self.layered_cost(grid.occupancy(coord), self.distance[idx]);
            }
        }
    }

    /// Recompute costs in a bounded window around each changed cell.
    ///
    /// The window is twice the influence radius: re-seeding obstacles that
    /// far out guarantees the refreshed distances are exact up to the
    /// penalty band even when an obstacle was removed.
    pub fn refresh_around(&mut self, grid: &OccupancyGrid, changed: &[GridCoord]) {
        if changed.is_empty() {
            return;
        }
        let r = self.influence_cells;

        let mut core = HashSet::new();
        let mut expanded = HashSet::new();
        for &c in changed {
            for dy in -2 * r..=2 * r {
                for dx in -2 * r..=2 * r {
                    let coord = GridCoord::new(c.x + dx, c.y + dy);
                    if !self.cell_in_bounds(coord) {
                        continue;
                    }
                    expanded.insert(coord);
                    if dx.abs() <= r && dy.abs() <= r {
                        core.insert(coord);
                    }
                }
            }
        }

        // Local brushfire over the expanded window
        let mut scratch: HashMap<GridCoord, f32> = HashMap::with_capacity(expanded.len());
        let mut queue = VecDeque::new();
        for &coord in &expanded {
            if grid.occupancy(coord) >= self.occupied_threshold {
                scratch.insert(coord, 0.0);
                queue.push_back(coord);
            }
        }
        while let Some(coord) = queue.pop_front() {
            let current = scratch[&coord];
            for (neighbor, step) in Self::neighbor_steps(coord) {
                if !expanded.contains(&neighbor) {
                    continue;
                }
                let candidate = current + step;
                let entry = scratch.entry(neighbor).or_insert(f32::MAX);
                if candidate < *entry {
                    *entry = candidate;
                    queue.push_back(neighbor);
                }
            }
        }

        let mut touched = 0usize;
        for &coord in &core {
            let idx = self.index(coord);
            let dist = scratch.get(&coord).copied().unwrap_or(f32::MAX);
            let cost = self.layered_cost(grid.occupancy(coord), dist);
            if self.distance[idx] != dist || self.cost[idx] != cost {
                touched += 1;
            }
            self.distance[idx] = dist;
            self.cost[idx] = cost;
        }
        tracing::debug!(
            changed = changed.len(),
            window = core.len(),
            touched,
            "cost map refreshed"
        );
    }

    /// Traversal multiplier at a cell; `INFINITY` out of bounds or lethal.
    #[inline]
    pub fn cell_cost(&self, coord: GridCoord) -> f32 {
        if !self.cell_in_bounds(coord) {
            return f32::INFINITY;
        }
        self.cost[self.index(coord)]
    }

    /// Distance to the nearest obstacle, in cells. Out of bounds reads 0.
    #[inline]
    pub fn obstacle_distance(&self, coord: GridCoord) -> f32 {
        if !self.cell_in_bounds(coord) {
            return 0.0;
        }
        self.distance[self.index(coord)]
    }

    /// True when the robot center cannot occupy this cell.
    #[inline]
    pub fn is_lethal(&self, coord: GridCoord) -> bool {
        self.cell_cost(coord).is_infinite()
    }

    /// Chebyshev radius (cells) beyond which an occupancy change cannot
    /// affect any traversal cost.
    #[inline]
    pub fn influence_radius_cells(&self) -> i32 {
        self.influence_cells
    }

    #[inline]
    fn cell_in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    #[inline]
    fn index(&self, coord: GridCoord) -> usize {
        coord.y as usize * self.width + coord.x as usize
    }

    #[inline]
    fn neighbor_steps(coord: GridCoord) -> [(GridCoord, f32); 8] {
        [
            (GridCoord::new(coord.x - 1, coord.y), 1.0),
            (GridCoord::new(coord.x + 1, coord.y), 1.0),
            (GridCoord::new(coord.x, coord.y - 1), 1.0),
            (GridCoord::new(coord.x, coord.y + 1), 1.0),
            (GridCoord::new(coord.x - 1, coord.y - 1), SQRT2),
            (GridCoord::new(coord.x + 1, coord.y - 1), SQRT2),
            (GridCoord::new(coord.x - 1, coord.y + 1), SQRT2),
            (GridCoord::new(coord.x + 1, coord.y + 1), SQRT2),
        ]
    }

    /// Combine the occupancy base cost with the inflation layers.
    fn layered_cost(&self, occupancy: u8, distance: f32) -> f32 {
        if occupancy >= self.occupied_threshold || distance <= self.inscribed_cells {
            return f32::INFINITY;
        }

        let base = multipliers::FREE
            + self.occupancy_weight * (occupancy as f32 / u8::MAX as f32);

        let layer = if distance <= self.inflation_cells {
            // Linear decay across the inflation band
            let span = (self.inflation_cells - self.inscribed_cells).max(f32::EPSILON);
            let ratio = (distance - self.inscribed_cells) / span;
            multipliers::INFLATION_EDGE
                - (multipliers::INFLATION_EDGE - multipliers::NEAR_OBSTACLE) * ratio
        } else if distance <= self.penalty_cells {
            // Linear decay across the proximity penalty band
            let span = (self.penalty_cells - self.inflation_cells).max(f32::EPSILON);
            let ratio = (distance - self.inflation_cells) / span;
            multipliers::NEAR_OBSTACLE - (multipliers::NEAR_OBSTACLE - multipliers::FREE) * ratio
        } else {
            multipliers::FREE
        };

        base.max(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WorldPoint;
    use crate::grid::occupancy::CellUpdate;

    fn test_config() -> PlannerConfig {
        PlannerConfig {
            robot_radius: 0.10,
            safety_margin: 0.05,
            near_penalty_dist: 0.20,
            ..Default::default()
        }
    }

    fn grid_with_wall() -> OccupancyGrid {
        let mut grid = OccupancyGrid::new(20, 20, 0.05, WorldPoint::ZERO);
        for x in 5..15 {
            grid.set_occupancy(GridCoord::new(x, 10), 255);
        }
        grid.take_changed_cells();
        grid
    }

    #[test]
    fn test_layers() {
        let grid = grid_with_wall();
        let cost_map = CostMap::from_grid(&grid, &test_config());

        // Obstacle cells and cells inside the robot radius are lethal
        assert!(cost_map.is_lethal(GridCoord::new(10, 10)));
        assert!(cost_map.is_lethal(GridCoord::new(10, 9)));

        // Cells in the penalty band cost more than free space
        let near = cost_map.cell_cost(GridCoord::new(10, 13));
        assert!(near.is_finite());
        assert!(near > multipliers::FREE);

        // Cells far away are free
        let far = cost_map.cell_cost(GridCoord::new(10, 0));
        assert!((far - multipliers::FREE).abs() < 1e-6);
    }

    #[test]
    fn test_distance_field() {
        let grid = grid_with_wall();
        let cost_map = CostMap::from_grid(&grid, &test_config());

        assert_eq!(cost_map.obstacle_distance(GridCoord::new(10, 10)), 0.0);
        let adjacent = cost_map.obstacle_distance(GridCoord::new(10, 9));
        assert!(adjacent > 0.9 && adjacent < 1.1);
        assert!(cost_map.obstacle_distance(GridCoord::new(10, 0)) > 5.0);
    }

    #[test]
    fn test_refresh_matches_rebuild_on_insert() {
        let mut grid = grid_with_wall();
        let mut incremental = CostMap::from_grid(&grid, &test_config());

        grid.apply_update(&[CellUpdate::new(GridCoord::new(3, 3), 255)]);
        let changed = grid.take_changed_cells();
        incremental.refresh_around(&grid, &changed);

        let full = CostMap::from_grid(&grid, &test_config());
        for y in 0..20 {
            for x in 0..20 {
                let c = GridCoord::new(x, y);
                let a = incremental.cell_cost(c);
                let b = full.cell_cost(c);
                assert!(
                    (a.is_infinite() && b.is_infinite()) || (a - b).abs() < 1e-4,
                    "cost mismatch at ({}, {}): {} vs {}",
                    x,
                    y,
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_refresh_matches_rebuild_on_removal() {
        let mut grid = grid_with_wall();
        let mut incremental = CostMap::from_grid(&grid, &test_config());

        // Knock a hole into the wall; distances around it must grow back
        grid.apply_update(&[CellUpdate::new(GridCoord::new(9, 10), 0)]);
        let changed = grid.take_changed_cells();
        incremental.refresh_around(&grid, &changed);

        let full = CostMap::from_grid(&grid, &test_config());
        for y in 0..20 {
            for x in 0..20 {
                let c = GridCoord::new(x, y);
                let a = incremental.cell_cost(c);
                let b = full.cell_cost(c);
                assert!(
                    (a.is_infinite() && b.is_infinite()) || (a - b).abs() < 1e-4,
                    "cost mismatch at ({}, {}): {} vs {}",
                    x,
                    y,
                    a,
                    b
                );
            }
        }
    }
}
