//! Point and coordinate types for the planning grid.
//!
//! The planner works on a cell grid whose *vertices* form the corner
//! lattice: cell `(x, y)` spans `[x, x+1) × [y, y+1)` in grid units, so a
//! `W×H` cell grid carries `(W+1)×(H+1)` vertices. Search runs on vertices;
//! traversal costs live on cells; path output may land anywhere on a lattice
//! edge.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Integer lattice coordinates. Used both for cell indices and for search
/// vertices (the corner lattice).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoord {
    /// X coordinate (column index)
    pub x: i32,
    /// Y coordinate (row index)
    pub y: i32,
}

impl GridCoord {
    /// Create a new grid coordinate
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another coordinate
    #[inline]
    pub fn manhattan_distance(&self, other: &GridCoord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev distance (max of x and y distance) - used for 8-connected grids
    #[inline]
    pub fn chebyshev_distance(&self, other: &GridCoord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Euclidean distance to another coordinate, in grid units
    #[inline]
    pub fn euclidean_distance(&self, other: &GridCoord) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// True if `other` is a diagonal 8-neighbor of this coordinate.
    #[inline]
    pub fn is_diagonal_to(&self, other: &GridCoord) -> bool {
        (self.x - other.x).abs() == 1 && (self.y - other.y).abs() == 1
    }

    /// Get the 8 neighbors in counter-clockwise order starting north.
    ///
    /// The ordering matters: consecutive entries bound the triangles used
    /// for continuous-cost interpolation.
    #[inline]
    pub fn neighbors_8(&self) -> [GridCoord; 8] {
        [
            GridCoord::new(self.x, self.y + 1),     // N
            GridCoord::new(self.x + 1, self.y + 1), // NE
            GridCoord::new(self.x + 1, self.y),     // E
            GridCoord::new(self.x + 1, self.y - 1), // SE
            GridCoord::new(self.x, self.y - 1),     // S
            GridCoord::new(self.x - 1, self.y - 1), // SW
            GridCoord::new(self.x - 1, self.y),     // W
            GridCoord::new(self.x - 1, self.y + 1), // NW
        ]
    }
}

impl Add for GridCoord {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        GridCoord::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for GridCoord {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        GridCoord::new(self.x - other.x, self.y - other.y)
    }
}

/// Continuous position in grid units.
///
/// Path waypoints are `GridPoint`s: they coincide with a lattice vertex or
/// lie somewhere along a lattice edge, which is what distinguishes an
/// any-angle path from a vertex-only one.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct GridPoint {
    /// X coordinate in grid units
    pub x: f32,
    /// Y coordinate in grid units
    pub y: f32,
}

/// Tolerance below which a grid-unit coordinate counts as integral.
const VERTEX_EPS: f32 = 1e-4;

impl GridPoint {
    /// Create a new grid point
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Grid point sitting exactly on a vertex.
    #[inline]
    pub fn from_vertex(v: GridCoord) -> Self {
        Self::new(v.x as f32, v.y as f32)
    }

    /// True when this point coincides with a lattice vertex.
    #[inline]
    pub fn is_vertex(&self) -> bool {
        (self.x - self.x.round()).abs() < VERTEX_EPS
            && (self.y - self.y.round()).abs() < VERTEX_EPS
    }

    /// Nearest lattice vertex.
    #[inline]
    pub fn nearest_vertex(&self) -> GridCoord {
        GridCoord::new(self.x.round() as i32, self.y.round() as i32)
    }

    /// Euclidean distance to another point, in grid units
    #[inline]
    pub fn distance(&self, other: &GridPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Point at fraction `t` along the segment from this point to `other`.
    #[inline]
    pub fn lerp(&self, other: &GridPoint, t: f32) -> GridPoint {
        GridPoint::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

impl From<GridCoord> for GridPoint {
    #[inline]
    fn from(v: GridCoord) -> Self {
        GridPoint::from_vertex(v)
    }
}

/// World coordinates (meters, f32)
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters
    pub y: f32,
}

impl WorldPoint {
    /// Create a new world point
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero point (origin)
    pub const ZERO: WorldPoint = WorldPoint { x: 0.0, y: 0.0 };

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: &WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Add for WorldPoint {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        WorldPoint::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for WorldPoint {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        WorldPoint::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for WorldPoint {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        WorldPoint::new(self.x * scalar, self.y * scalar)
    }
}
