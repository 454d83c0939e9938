//! Incremental any-angle planner.
//!
//! Field D* search over the grid's corner lattice: a D* Lite expansion
//! loop (goal-rooted, repaired incrementally as the map changes) with
//! continuous-cost interpolation across cell edges, so extracted paths cut
//! corners instead of snapping to the 8 grid directions.
//!
//! One planning cycle is synchronous and mutates the planner in place:
//! drain map deltas, restore local consistency around them, expand the
//! queue until the start vertex is settled, then walk downhill to the
//! goal. `&mut self` on the cycle entry point is what serializes access.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::config::PlannerConfig;
use crate::core::{GridCoord, GridPoint, WorldPoint};
use crate::error::{PlannerError, Result};
use crate::grid::{CellUpdate, OccupancyGrid, SearchGraph};
use crate::planning::interpolation::{edge_crossing, vertex_cost, Crossing, LocalStep};
use crate::planning::key::Key;
use crate::planning::queue::OpenList;

const STEP_EPS: f32 = 1e-4;

/// Outcome of a planning cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanStatus {
    /// A path to the goal was produced
    Ok,
    /// No finite-cost path currently exists; the caller should hold its
    /// previous path
    NoPath,
    /// Start or goal has not been provided yet
    Uninitialized,
}

/// Path and instrumentation returned by [`FieldDStarPlanner::plan_cycle`].
#[derive(Clone, Debug)]
pub struct PlanResult {
    /// Waypoints from start to goal in world coordinates; empty unless
    /// `status` is `Ok`
    pub path: Vec<WorldPoint>,
    /// Vertices expanded during this cycle
    pub expansions: usize,
    /// Cycle outcome
    pub status: PlanStatus,
}

/// Incremental any-angle grid planner.
pub struct FieldDStarPlanner {
    graph: SearchGraph,
    config: PlannerConfig,
    /// `(g, rhs)` per lattice vertex; untouched vertices read as infinite
    cost_state: Vec<[f32; 2]>,
    /// Vertices ever touched by the search, for instrumentation
    touched: Vec<bool>,
    queue: OpenList,
    start: Option<GridCoord>,
    goal: Option<GridCoord>,
    initialized: bool,
}

impl FieldDStarPlanner {
    /// Create a planner over an occupancy grid snapshot.
    pub fn new(grid: OccupancyGrid, config: PlannerConfig) -> Self {
        let graph = SearchGraph::new(grid, &config);
        let (vw, vh) = graph.vertex_dims();
        Self {
            graph,
            config,
            cost_state: vec![[f32::INFINITY; 2]; vw * vh],
            touched: vec![false; vw * vh],
            queue: OpenList::new(),
            start: None,
            goal: None,
            initialized: false,
        }
    }

    /// The graph the planner searches over.
    pub fn graph(&self) -> &SearchGraph {
        &self.graph
    }

    /// Best-known cost from a vertex to the goal.
    #[inline]
    pub fn g(&self, v: GridCoord) -> f32 {
        match self.graph.vertex_index(v) {
            Some(idx) => self.cost_state[idx][0],
            None => f32::INFINITY,
        }
    }

    /// One-step-lookahead cost estimate for a vertex.
    #[inline]
    pub fn rhs(&self, v: GridCoord) -> f32 {
        match self.graph.vertex_index(v) {
            Some(idx) => self.cost_state[idx][1],
            None => f32::INFINITY,
        }
    }

    /// Every vertex the search has touched since the last reinitialize.
    pub fn explored(&self) -> Vec<GridCoord> {
        let (vw, _) = self.graph.vertex_dims();
        self.touched
            .iter()
            .enumerate()
            .filter(|(_, t)| **t)
            .map(|(idx, _)| GridCoord::new((idx % vw) as i32, (idx / vw) as i32))
            .collect()
    }

    /// Set the goal position. Changing the goal clears all search state
    /// and starts the next cycle from scratch.
    pub fn set_goal(&mut self, goal: WorldPoint) {
        let vertex = self.graph.world_to_grid(goal).nearest_vertex();
        if self.goal == Some(vertex) {
            return;
        }
        if self.graph.vertex_is_lethal(vertex) {
            warn!(x = vertex.x, y = vertex.y, "goal vertex is inside an obstacle");
        }
        self.goal = Some(vertex);
        self.reinitialize();
    }

    /// Set the robot position for the next cycle; it is snapped to the
    /// nearest lattice vertex.
    pub fn set_start(&mut self, start: WorldPoint) {
        self.start = Some(self.graph.world_to_grid(start).nearest_vertex());
    }

    /// Ingest an occupancy delta from the mapper. Returns the number of
    /// cells whose value actually changed.
    pub fn update_map(&mut self, updates: &[CellUpdate]) -> usize {
        self.graph.apply_update(updates)
    }

    /// Run one planning cycle: drain map deltas, repair consistency,
    /// expand, and extract the path.
    pub fn plan_cycle(&mut self) -> PlanResult {
        if self.start.is_none() || self.goal.is_none() {
            return PlanResult {
                path: Vec::new(),
                expansions: 0,
                status: PlanStatus::Uninitialized,
            };
        }

        if !self.initialized {
            self.initialize();
        }

        let updated = self.update_changed_vertices();
        let expansions = self.compute_shortest_path();

        let (grid_path, reached) = self.extract_path();
        debug!(
            updated,
            expansions,
            waypoints = grid_path.len(),
            reached,
            "planning cycle"
        );

        if !reached {
            return PlanResult {
                path: Vec::new(),
                expansions,
                status: PlanStatus::NoPath,
            };
        }

        let path = grid_path
            .into_iter()
            .map(|p| self.graph.grid_to_world(p))
            .collect();
        PlanResult {
            path,
            expansions,
            status: PlanStatus::Ok,
        }
    }

    /// Re-extract the path from the current shortest-path tree without
    /// searching. Fails with [`PlannerError::InvalidState`] when no goal
    /// has been set; reports `NoPath` when the tree does not reach the
    /// start.
    pub fn current_path(&self) -> Result<PlanResult> {
        if !self.initialized || self.start.is_none() {
            return Err(PlannerError::InvalidState(
                "path reconstruction requires a start and a goal",
            ));
        }
        let (grid_path, reached) = self.extract_path();
        if !reached {
            return Ok(PlanResult {
                path: Vec::new(),
                expansions: 0,
                status: PlanStatus::NoPath,
            });
        }
        Ok(PlanResult {
            path: grid_path.into_iter().map(|p| self.graph.grid_to_world(p)).collect(),
            expansions: 0,
            status: PlanStatus::Ok,
        })
    }

    /// Seed the search: the goal is the root of the shortest-path tree.
    /// Idempotent while the search state is live.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        let Some(goal) = self.goal else {
            return;
        };
        if let Some(idx) = self.graph.vertex_index(goal) {
            self.cost_state[idx] = [f32::INFINITY, 0.0];
            self.touched[idx] = true;
        }
        let key = self.calculate_key(goal);
        self.queue.insert_or_update(goal, key);
        self.initialized = true;
    }

    /// Clear all search state (cost arena, queue, pending map deltas) and
    /// re-seed from the goal.
    pub fn reinitialize(&mut self) {
        self.cost_state.fill([f32::INFINITY; 2]);
        self.touched.fill(false);
        self.queue.clear();
        // Pending deltas still refresh the cost map; only the node-level
        // bookkeeping is dropped.
        let _ = self.graph.take_changed_cells();
        self.initialized = false;
        self.initialize();
    }

    /// Queue priority for a vertex.
    pub fn calculate_key(&self, s: GridCoord) -> Key {
        let estimate = self.g(s).min(self.rhs(s));
        let h = match self.start {
            Some(start) => start.euclidean_distance(&s),
            None => 0.0,
        };
        Key::new(estimate + h, estimate)
    }

    /// Recompute a vertex's one-step lookahead and restore the invariant
    /// that exactly the locally inconsistent vertices are queued.
    pub fn update_vertex(&mut self, s: GridCoord) {
        let Some(idx) = self.graph.vertex_index(s) else {
            return;
        };

        if Some(s) != self.goal {
            let mut rhs = f32::INFINITY;
            for (a, b) in self.graph.consecutive_neighbors(s) {
                let step = self.pair_cost(s, a, b);
                if step.cost < rhs {
                    rhs = step.cost;
                }
            }
            self.cost_state[idx][1] = rhs;
            self.touched[idx] = true;
        }

        if self.queue.contains(s) {
            self.queue.remove(s);
        }
        if self.cost_state[idx][0] != self.cost_state[idx][1] {
            let key = self.calculate_key(s);
            self.queue.insert_or_update(s, key);
        }
    }

    /// Expand until the start vertex's key dominates the queue minimum and
    /// the start is locally consistent. Returns the number of vertices
    /// popped.
    pub fn compute_shortest_path(&mut self) -> usize {
        let Some(start) = self.start else {
            return 0;
        };

        let mut expansions = 0;
        loop {
            let top = self.queue.top_key();
            let start_key = self.calculate_key(start);
            if !(top < start_key || self.rhs(start) != self.g(start)) {
                break;
            }
            if expansions >= self.config.max_expansions {
                warn!(
                    max_expansions = self.config.max_expansions,
                    "expansion budget exhausted, deferring to next cycle"
                );
                break;
            }
            let Some((u, popped_key)) = self.queue.pop() else {
                break;
            };

            // The heuristic moved with the start since this entry was
            // queued; reorder instead of expanding.
            let fresh_key = self.calculate_key(u);
            if popped_key < fresh_key {
                self.queue.insert_or_update(u, fresh_key);
                continue;
            }

            expansions += 1;
            let Some(idx) = self.graph.vertex_index(u) else {
                continue;
            };
            let [g_u, rhs_u] = self.cost_state[idx];
            let neighbors: Vec<GridCoord> = self.graph.neighbors(u).collect();

            if g_u > rhs_u {
                // Overconsistent: commit the improved estimate
                self.cost_state[idx][0] = rhs_u;
                self.touched[idx] = true;
                for n in neighbors {
                    self.update_vertex(n);
                }
            } else {
                // Underconsistent: invalidate and re-derive
                self.cost_state[idx][0] = f32::INFINITY;
                self.touched[idx] = true;
                self.update_vertex(u);
                for n in neighbors {
                    self.update_vertex(n);
                }
            }
        }
        expansions
    }

    /// Propagate cost changes from the cells modified since the previous
    /// cycle. Every vertex whose lookahead can depend on a changed cell
    /// (the changed region dilated by the inflation influence radius, plus
    /// one ring of neighbors) is re-derived. Returns the number of
    /// vertices updated.
    pub fn update_changed_vertices(&mut self) -> usize {
        let changed = self.graph.take_changed_cells();
        if changed.is_empty() {
            return 0;
        }

        let reach = self.graph.influence_radius_cells() + 1;
        let mut pending: HashSet<GridCoord> = HashSet::new();
        for cell in &changed {
            for dy in -reach..=reach + 1 {
                for dx in -reach..=reach + 1 {
                    let v = GridCoord::new(cell.x + dx, cell.y + dy);
                    if self.graph.vertex_in_bounds(v) {
                        pending.insert(v);
                    }
                }
            }
        }

        // Fixed update order keeps queue tie-breaking, and with it replans,
        // reproducible across runs
        let mut pending: Vec<GridCoord> = pending.into_iter().collect();
        pending.sort_by_key(|v| (v.y, v.x));

        let updated = pending.len();
        for v in pending {
            self.update_vertex(v);
        }
        debug!(cells = changed.len(), vertices = updated, "map delta applied");
        updated
    }

    /// Cost through one consecutive-neighbor pair of `s`.
    fn pair_cost(&self, s: GridCoord, a: GridCoord, b: GridCoord) -> LocalStep {
        let (s1, s2) = if a.is_diagonal_to(&s) { (b, a) } else { (a, b) };
        let (c, side) = self.graph.triangle_costs(s, s1, s2);
        vertex_cost(self.g(s1), self.g(s2), c, side)
    }

    /// Greedy descent from the start vertex. Returns the waypoints in grid
    /// units and whether the goal was reached.
    fn extract_path(&self) -> (Vec<GridPoint>, bool) {
        debug_assert!(self.initialized, "path extraction before initialize");
        let (Some(start), Some(goal)) = (self.start, self.goal) else {
            return (Vec::new(), false);
        };
        if !self.initialized || !self.g(start).is_finite() {
            return (Vec::new(), false);
        }

        let goal_point = GridPoint::from_vertex(goal);
        let mut positions = vec![GridPoint::from_vertex(start)];
        let mut current = positions[0];

        for _ in 0..self.config.max_path_steps {
            if current.distance(&goal_point) <= self.config.goal_dist {
                if current.distance(&goal_point) > STEP_EPS {
                    positions.push(goal_point);
                }
                return (positions, true);
            }

            let Some(next) = self.next_steps(current) else {
                warn!("greedy descent stalled before reaching the goal");
                return (positions, false);
            };
            for p in next {
                positions.push(p);
                current = p;
            }
        }

        warn!(
            max_path_steps = self.config.max_path_steps,
            "path extraction exceeded step budget"
        );
        (positions, false)
    }

    /// The locally cheapest continuation from a path position: either one
    /// interpolated waypoint, or a boundary point followed by the diagonal
    /// vertex. `None` when every continuation is infinite.
    fn next_steps(&self, p: GridPoint) -> Option<Vec<GridPoint>> {
        if p.is_vertex() {
            self.steps_from_vertex(p.nearest_vertex())
        } else {
            self.step_from_edge(p)
        }
    }

    fn steps_from_vertex(&self, s: GridCoord) -> Option<Vec<GridPoint>> {
        let mut best: Option<(LocalStep, GridCoord, GridCoord)> = None;
        for (a, b) in self.graph.consecutive_neighbors(s) {
            let (s1, s2) = if a.is_diagonal_to(&s) { (b, a) } else { (a, b) };
            let (c, side) = self.graph.triangle_costs(s, s1, s2);
            let step = vertex_cost(self.g(s1), self.g(s2), c, side);
            if best.as_ref().map_or(true, |(prev, _, _)| step.cost < prev.cost) {
                best = Some((step, s1, s2));
            }
        }

        let (step, s1, s2) = best?;
        if !step.cost.is_finite() {
            return None;
        }

        let s_point = GridPoint::from_vertex(s);
        let s1_point = GridPoint::from_vertex(s1);
        let s2_point = GridPoint::from_vertex(s2);

        if step.x < 1.0 - STEP_EPS {
            // Boundary travel, then the straight cut to the diagonal
            Some(vec![s_point.lerp(&s1_point, step.x), s2_point])
        } else if step.y <= STEP_EPS {
            Some(vec![s1_point])
        } else if step.y >= 1.0 - STEP_EPS {
            Some(vec![s2_point])
        } else {
            Some(vec![s1_point.lerp(&s2_point, step.y)])
        }
    }

    fn step_from_edge(&self, p: GridPoint) -> Option<Vec<GridPoint>> {
        // Exactly one coordinate is integral for an edge position.
        let horizontal = (p.y - p.y.round()).abs() < STEP_EPS;

        let (a, b) = if horizontal {
            let a = GridCoord::new(p.x.floor() as i32, p.y.round() as i32);
            (a, GridCoord::new(a.x + 1, a.y))
        } else {
            let a = GridCoord::new(p.x.round() as i32, p.y.floor() as i32);
            (a, GridCoord::new(a.x, a.y + 1))
        };

        // The two cells flanking the edge, by min-corner addressing
        let (near_cell, far_cell) = if horizontal {
            (GridCoord::new(a.x, a.y), GridCoord::new(a.x, a.y - 1))
        } else {
            (GridCoord::new(a.x, a.y), GridCoord::new(a.x - 1, a.y))
        };

        let mut best_cost = f32::INFINITY;
        let mut best_point = p;

        // Travel along the edge itself on its cheaper side
        let along = self.graph.cell_cost(near_cell).min(self.graph.cell_cost(far_cell));
        for vertex in [a, b] {
            let g_v = self.g(vertex);
            if along.is_finite() && g_v.is_finite() {
                let point = GridPoint::from_vertex(vertex);
                let cost = along * p.distance(&point) + g_v;
                if cost < best_cost {
                    best_cost = cost;
                    best_point = point;
                }
            }
        }

        // Crossings of the far edges of both flanking cells
        for (cell, away) in [(near_cell, 1), (far_cell, -1)] {
            let c = self.graph.cell_cost(cell);
            if !c.is_finite() {
                continue;
            }
            let offset = if horizontal {
                GridCoord::new(0, away)
            } else {
                GridCoord::new(away, 0)
            };
            let a_far = a + offset;
            let b_far = b + offset;

            for (m, n) in [(a, a_far), (a_far, b_far), (b_far, b)] {
                if !self.graph.vertex_in_bounds(m) || !self.graph.vertex_in_bounds(n) {
                    continue;
                }
                let m_point = GridPoint::from_vertex(m);
                let n_point = GridPoint::from_vertex(n);
                let Crossing { cost, t } =
                    edge_crossing(p, m_point, n_point, self.g(m), self.g(n), c);
                if cost < best_cost {
                    best_cost = cost;
                    best_point = m_point.lerp(&n_point, t);
                }
            }
        }

        if !best_cost.is_finite() || best_point.distance(&p) < STEP_EPS {
            return None;
        }
        Some(vec![best_point])
    }
}
