//! Planner-facing view of the grid.
//!
//! Search runs on the corner lattice of the cell grid. `SearchGraph` owns
//! the occupancy snapshot and its cost map and answers the queries the
//! search needs: vertex neighbors, the consecutive neighbor pairs bounding
//! interpolation triangles, and the two cell costs of the Field D* local
//! frame (the crossed cell and the cell on the far side of the shared
//! edge). Out-of-bounds queries answer with infinite cost, never an error.

use crate::config::PlannerConfig;
use crate::core::{GridCoord, GridPoint, WorldPoint};
use crate::grid::cost_map::CostMap;
use crate::grid::occupancy::{CellUpdate, OccupancyGrid};

/// Occupancy grid plus cost map, addressed by search vertices.
#[derive(Clone, Debug)]
pub struct SearchGraph {
    grid: OccupancyGrid,
    cost_map: CostMap,
}

impl SearchGraph {
    /// Wrap an occupancy grid, building its cost map.
    pub fn new(grid: OccupancyGrid, config: &PlannerConfig) -> Self {
        let cost_map = CostMap::from_grid(&grid, config);
        Self { grid, cost_map }
    }

    /// Vertex lattice dimensions: one more than the cell grid in each axis.
    #[inline]
    pub fn vertex_dims(&self) -> (usize, usize) {
        (self.grid.width() + 1, self.grid.height() + 1)
    }

    /// True if `v` is a vertex of the lattice.
    #[inline]
    pub fn vertex_in_bounds(&self, v: GridCoord) -> bool {
        v.x >= 0
            && v.y >= 0
            && (v.x as usize) <= self.grid.width()
            && (v.y as usize) <= self.grid.height()
    }

    /// Flat arena index of a vertex, or `None` outside the lattice.
    #[inline]
    pub fn vertex_index(&self, v: GridCoord) -> Option<usize> {
        if !self.vertex_in_bounds(v) {
            return None;
        }
        Some(v.y as usize * (self.grid.width() + 1) + v.x as usize)
    }

    /// In-bounds lattice neighbors of a vertex (up to 8).
    pub fn neighbors(&self, v: GridCoord) -> impl Iterator<Item = GridCoord> + '_ {
        v.neighbors_8().into_iter().filter(move |n| self.vertex_in_bounds(*n))
    }

    /// The consecutive neighbor pairs of a vertex: each pair is one
    /// orthogonal and one diagonal neighbor bounding a triangle of one
    /// incident cell. Pairs with an out-of-bounds member are skipped.
    pub fn consecutive_neighbors(&self, v: GridCoord) -> Vec<(GridCoord, GridCoord)> {
        let ring = v.neighbors_8();
        let mut pairs = Vec::with_capacity(8);
        for i in 0..8 {
            let a = ring[i];
            let b = ring[(i + 1) % 8];
            if self.vertex_in_bounds(a) && self.vertex_in_bounds(b) {
                pairs.push((a, b));
            }
        }
        pairs
    }

    /// Traversal multiplier of a cell (min-corner addressing).
    #[inline]
    pub fn cell_cost(&self, cell: GridCoord) -> f32 {
        self.cost_map.cell_cost(cell)
    }

    /// The two cell costs of the local interpolation frame at `s`:
    /// `c` for the cell cornered by `s` and its diagonal neighbor `s2`
    /// (the cell a crossing path cuts through), and `b` for the cell on
    /// the other side of the shared edge `s -> s1`.
    pub fn triangle_costs(&self, s: GridCoord, s1: GridCoord, s2: GridCoord) -> (f32, f32) {
        let c_cell = GridCoord::new(s.x.min(s2.x), s.y.min(s2.y));

        let b_cell = if s1.y == s.y {
            // Horizontal edge: flanking cells above and below
            let cx = s.x.min(s1.x);
            if c_cell.y == s.y {
                GridCoord::new(cx, s.y - 1)
            } else {
                GridCoord::new(cx, s.y)
            }
        } else {
            // Vertical edge: flanking cells left and right
            let cy = s.y.min(s1.y);
            if c_cell.x == s.x {
                GridCoord::new(s.x - 1, cy)
            } else {
                GridCoord::new(s.x, cy)
            }
        };

        (self.cell_cost(c_cell), self.cell_cost(b_cell))
    }

    /// Traversal cost between two adjacent vertices: the cheaper flanking
    /// cell for an orthogonal step, the crossed cell times sqrt(2) for a
    /// diagonal step. `INFINITY` for non-adjacent or lethal-only edges.
    pub fn edge_cost(&self, a: GridCoord, b: GridCoord) -> f32 {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        match (dx.abs(), dy.abs()) {
            (1, 1) => {
                let cell = GridCoord::new(a.x.min(b.x), a.y.min(b.y));
                self.cell_cost(cell) * std::f32::consts::SQRT_2
            }
            (1, 0) => {
                let cx = a.x.min(b.x);
                self.cell_cost(GridCoord::new(cx, a.y))
                    .min(self.cell_cost(GridCoord::new(cx, a.y - 1)))
            }
            (0, 1) => {
                let cy = a.y.min(b.y);
                self.cell_cost(GridCoord::new(a.x, cy))
                    .min(self.cell_cost(GridCoord::new(a.x - 1, cy)))
            }
            _ => f32::INFINITY,
        }
    }

    /// True when every cell incident to the vertex is lethal: no finite-cost
    /// motion can pass through it.
    pub fn vertex_is_lethal(&self, v: GridCoord) -> bool {
        self.cost_map.is_lethal(GridCoord::new(v.x, v.y))
            && self.cost_map.is_lethal(GridCoord::new(v.x - 1, v.y))
            && self.cost_map.is_lethal(GridCoord::new(v.x, v.y - 1))
            && self.cost_map.is_lethal(GridCoord::new(v.x - 1, v.y - 1))
    }

    /// Ingest an occupancy delta from the mapper.
    pub fn apply_update(&mut self, updates: &[CellUpdate]) -> usize {
        self.grid.apply_update(updates)
    }

    /// Drain changed cells and refresh the cost map around them. Returns
    /// the drained cells; called once per planning cycle.
    pub fn take_changed_cells(&mut self) -> Vec<GridCoord> {
        let changed = self.grid.take_changed_cells();
        self.cost_map.refresh_around(&self.grid, &changed);
        changed
    }

    /// Chebyshev radius (cells) an occupancy change can influence.
    #[inline]
    pub fn influence_radius_cells(&self) -> i32 {
        self.cost_map.influence_radius_cells()
    }

    /// The occupancy snapshot.
    #[inline]
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// The cost map derived from it.
    #[inline]
    pub fn cost_map(&self) -> &CostMap {
        &self.cost_map
    }

    /// Convert a world position to continuous grid units.
    #[inline]
    pub fn world_to_grid(&self, point: WorldPoint) -> GridPoint {
        self.grid.world_to_grid(point)
    }

    /// Convert a continuous grid-unit position to world coordinates.
    #[inline]
    pub fn grid_to_world(&self, point: GridPoint) -> WorldPoint {
        self.grid.grid_to_world(point)
    }
}
