//! Occupancy grid storage with changed-cell tracking.
//!
//! The grid is the planner's view of the external mapper: a flat array of
//! occupancy values in `[0, 255]`, a resolution, and an origin offset. The
//! mapper pushes deltas through [`OccupancyGrid::apply_update`]; every
//! modified cell lands in a dirty set that the planner drains exactly once
//! per planning cycle.

use std::collections::HashSet;

use crate::core::{GridCoord, GridPoint, WorldPoint};

/// A single changed cell reported by the external mapper.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellUpdate {
    /// Cell coordinate
    pub coord: GridCoord,
    /// New occupancy value in `[0, 255]`
    pub value: u8,
}

impl CellUpdate {
    /// Create a new cell update
    #[inline]
    pub fn new(coord: GridCoord, value: u8) -> Self {
        Self { coord, value }
    }
}

/// Occupancy grid snapshot consumed by the planner.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    /// Grid dimensions in cells
    width: usize,
    height: usize,
    /// Resolution in meters per cell
    resolution: f32,
    /// World position of vertex (0, 0)
    origin: WorldPoint,
    /// Occupancy values: 0 = free, 255 = certainly occupied
    occupancy: Vec<u8>,
    /// Cells modified since the last drain
    changed: HashSet<GridCoord>,
}

impl OccupancyGrid {
    /// Create a grid of `width × height` cells, all free.
    pub fn new(width: usize, height: usize, resolution: f32, origin: WorldPoint) -> Self {
        Self {
            width,
            height,
            resolution,
            origin,
            occupancy: vec![0; width * height],
            changed: HashSet::new(),
        }
    }

    /// Grid width in cells.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Resolution in meters per cell.
    #[inline]
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// World position of vertex (0, 0).
    #[inline]
    pub fn origin(&self) -> WorldPoint {
        self.origin
    }

    /// True if `coord` addresses a cell inside the grid.
    #[inline]
    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    /// Occupancy at a cell. Out-of-bounds reads as certainly occupied so the
    /// planner's hot path needs no bounds branch of its own.
    #[inline]
    pub fn occupancy(&self, coord: GridCoord) -> u8 {
        if !self.in_bounds(coord) {
            return u8::MAX;
        }
        self.occupancy[coord.y as usize * self.width + coord.x as usize]
    }

    /// Set the occupancy of a cell, recording it as changed if the value
    /// differs. Out-of-bounds writes are ignored.
    pub fn set_occupancy(&mut self, coord: GridCoord, value: u8) {
        if !self.in_bounds(coord) {
            return;
        }
        let idx = coord.y as usize * self.width + coord.x as usize;
        if self.occupancy[idx] != value {
            self.occupancy[idx] = value;
            self.changed.insert(coord);
        }
    }

    /// Ingest a delta from the mapper. Returns the number of cells whose
    /// value actually changed.
    pub fn apply_update(&mut self, updates: &[CellUpdate]) -> usize {
        let mut applied = 0;
        for update in updates {
            if self.in_bounds(update.coord) && self.occupancy(update.coord) != update.value {
                self.set_occupancy(update.coord, update.value);
                applied += 1;
            }
        }
        applied
    }

    /// Drain the set of cells changed since the previous drain.
    ///
    /// Called exactly once per planning cycle; the set is cleared by the
    /// call.
    pub fn take_changed_cells(&mut self) -> Vec<GridCoord> {
        self.changed.drain().collect()
    }

    /// Number of cells currently pending in the dirty set.
    #[inline]
    pub fn pending_changes(&self) -> usize {
        self.changed.len()
    }

    /// Convert a world position to continuous grid units (vertex frame).
    #[inline]
    pub fn world_to_grid(&self, point: WorldPoint) -> GridPoint {
        GridPoint::new(
            (point.x - self.origin.x) / self.resolution,
            (point.y - self.origin.y) / self.resolution,
        )
    }

    /// Convert a continuous grid-unit position back to world coordinates.
    #[inline]
    pub fn grid_to_world(&self, point: GridPoint) -> WorldPoint {
        WorldPoint::new(
            self.origin.x + point.x * self.resolution,
            self.origin.y + point.y * self.resolution,
        )
    }
}
