//! Planner scenario tests.
//!
//! These exercise the planner through its public surface only: goal and
//! start in world coordinates, occupancy deltas in, paths and expansion
//! counts out.

mod common;

use marga_plan::{
    CellUpdate, FieldDStarPlanner, GridCoord, PlanStatus, WorldPoint,
};

const SQRT2: f32 = std::f32::consts::SQRT_2;

fn converged_planner(cells: usize, start: WorldPoint, goal: WorldPoint) -> FieldDStarPlanner {
    let mut planner = common::point_robot_planner(common::open_grid(cells));
    planner.set_start(start);
    planner.set_goal(goal);
    planner
}

// ============================================================================
// Uniform-grid geometry
// ============================================================================

#[test]
fn test_diagonal_path_near_euclidean() {
    let mut planner = converged_planner(10, WorldPoint::new(0.0, 0.0), WorldPoint::new(9.0, 9.0));
    let result = planner.plan_cycle();

    assert_eq!(result.status, PlanStatus::Ok);
    assert!(result.expansions > 0);

    let length = common::path_length(&result.path);
    let euclidean = 9.0 * SQRT2; // 12.73
    assert!(length >= euclidean - 1e-3, "length {} below Euclidean", length);
    assert!(
        length <= euclidean + 0.15,
        "length {} exceeds Euclidean {} by more than tolerance",
        length,
        euclidean
    );

    let first = result.path.first().unwrap();
    let last = result.path.last().unwrap();
    assert!(first.distance(&WorldPoint::new(0.0, 0.0)) < 1e-3);
    assert!(last.distance(&WorldPoint::new(9.0, 9.0)) < 1e-3);
}

#[test]
fn test_misaligned_goal_cuts_edges() {
    let mut planner = converged_planner(10, WorldPoint::new(0.0, 0.0), WorldPoint::new(9.0, 4.0));
    let result = planner.plan_cycle();
    assert_eq!(result.status, PlanStatus::Ok);

    let length = common::path_length(&result.path);
    let euclidean = (81.0f32 + 16.0).sqrt(); // 10.296
    let eight_connected = 4.0 * SQRT2 + 5.0; // 10.657

    assert!(length >= euclidean - 1e-3);
    assert!(
        length <= euclidean * 1.03,
        "length {} outside interpolation tolerance of Euclidean {}",
        length,
        euclidean
    );
    assert!(
        length < eight_connected,
        "length {} not better than the 8-connected path {}",
        length,
        eight_connected
    );
    // Continuous edge cutting must show up as fractional waypoints
    assert!(common::has_fractional_waypoint(&result.path));
}

// ============================================================================
// Incremental behavior
// ============================================================================

#[test]
fn test_unchanged_map_replans_for_free() {
    let mut planner = converged_planner(20, WorldPoint::new(1.0, 1.0), WorldPoint::new(18.0, 18.0));
    let first = planner.plan_cycle();
    assert_eq!(first.status, PlanStatus::Ok);

    let second = planner.plan_cycle();
    assert_eq!(second.status, PlanStatus::Ok);
    assert_eq!(second.expansions, 0, "unchanged map must not expand");
    assert_eq!(first.path, second.path, "replan must be reproducible");
}

#[test]
fn test_distant_change_is_cheaper_than_fresh_search() {
    let start = WorldPoint::new(2.0, 2.0);
    let goal = WorldPoint::new(27.0, 27.0);

    let mut planner = converged_planner(30, start, goal);
    let first = planner.plan_cycle();
    assert_eq!(first.status, PlanStatus::Ok);

    // A change far from the start-goal corridor
    let delta = [CellUpdate::new(GridCoord::new(27, 2), 255)];
    planner.update_map(&delta);
    let replan = planner.plan_cycle();
    assert_eq!(replan.status, PlanStatus::Ok);
    assert_eq!(replan.path, first.path, "distant change must not move the path");

    // The same situation searched from scratch
    let mut grid = common::open_grid(30);
    grid.apply_update(&delta);
    let mut fresh = common::point_robot_planner(grid);
    fresh.set_start(start);
    fresh.set_goal(goal);
    let scratch = fresh.plan_cycle();
    assert_eq!(scratch.status, PlanStatus::Ok);

    assert!(
        replan.expansions < scratch.expansions,
        "incremental replan ({}) must beat a fresh search ({})",
        replan.expansions,
        scratch.expansions
    );
}

#[test]
fn test_blocking_the_corridor_reroutes() {
    let start = WorldPoint::new(1.0, 10.0);
    let goal = WorldPoint::new(19.0, 10.0);

    let mut planner = converged_planner(20, start, goal);
    let first = planner.plan_cycle();
    assert_eq!(first.status, PlanStatus::Ok);
    let first_length = common::path_length(&first.path);

    // Drop a wall across the straight line, leaving gaps at the borders
    let updates: Vec<CellUpdate> = (3..=16)
        .map(|y| CellUpdate::new(GridCoord::new(10, y), 255))
        .collect();
    planner.update_map(&updates);

    let replan = planner.plan_cycle();
    assert_eq!(replan.status, PlanStatus::Ok);
    let replan_length = common::path_length(&replan.path);
    assert!(
        replan_length > first_length + 1.0,
        "detour ({}) should be clearly longer than the straight path ({})",
        replan_length,
        first_length
    );

    // The new path never enters the wall cells (riding their boundary is
    // allowed for a point robot)
    for p in &replan.path {
        assert!(
            (p.x - 10.5).abs() > 0.5 - 1e-3 || p.y <= 3.0 + 1e-3 || p.y >= 17.0 - 1e-3,
            "waypoint ({}, {}) crosses the wall",
            p.x,
            p.y
        );
    }
}

// ============================================================================
// Consistency invariants
// ============================================================================

#[test]
fn test_settled_region_is_locally_consistent() {
    let mut planner = converged_planner(15, WorldPoint::new(1.0, 1.0), WorldPoint::new(13.0, 13.0));
    let result = planner.plan_cycle();
    assert_eq!(result.status, PlanStatus::Ok);

    let start = GridCoord::new(1, 1);
    let g_start = planner.g(start);
    assert!(g_start.is_finite());
    assert_eq!(planner.g(start), planner.rhs(start));

    // Every vertex whose key was dominated by the start's must have been
    // settled: g == rhs throughout the expanded region.
    for v in planner.explored() {
        let g = planner.g(v);
        if g.is_finite() && g + start.euclidean_distance(&v) < g_start - 1e-3 {
            assert!(
                (g - planner.rhs(v)).abs() < 1e-3,
                "vertex ({}, {}) left inconsistent: g={} rhs={}",
                v.x,
                v.y,
                g,
                planner.rhs(v)
            );
        }
    }
}

#[test]
fn test_path_steps_are_single_cell() {
    let mut grid = common::open_grid(20);
    common::horizontal_wall(&mut grid, 10, 4, 15);
    let mut planner = common::point_robot_planner(grid);
    planner.set_start(WorldPoint::new(10.0, 2.0));
    planner.set_goal(WorldPoint::new(10.0, 18.0));

    let result = planner.plan_cycle();
    assert_eq!(result.status, PlanStatus::Ok);

    for w in result.path.windows(2) {
        let step = w[0].distance(&w[1]);
        assert!(
            step <= SQRT2 + 1e-3,
            "step of {} exceeds one cell diagonal",
            step
        );
    }

    // No waypoint sits strictly inside an occupied cell
    for p in &result.path {
        let inside_wall =
            p.y > 10.0 + 1e-3 && p.y < 11.0 - 1e-3 && p.x > 4.0 + 1e-3 && p.x < 16.0 - 1e-3;
        assert!(!inside_wall, "waypoint ({}, {}) is inside the wall", p.x, p.y);
    }
}

// ============================================================================
// Failure semantics
// ============================================================================

#[test]
fn test_enclosed_goal_reports_no_path() {
    let mut grid = common::open_grid(20);
    common::ring_wall(&mut grid, 7, 7, 13, 13);
    let mut planner = common::point_robot_planner(grid);
    planner.set_start(WorldPoint::new(1.0, 1.0));
    planner.set_goal(WorldPoint::new(10.0, 10.0));

    let result = planner.plan_cycle();
    assert_eq!(result.status, PlanStatus::NoPath);
    assert!(result.path.is_empty());

    // Asking again neither crashes nor loops, and expands nothing new
    let again = planner.plan_cycle();
    assert_eq!(again.status, PlanStatus::NoPath);
    assert_eq!(again.expansions, 0);
}

#[test]
fn test_opening_the_enclosure_recovers() {
    let mut grid = common::open_grid(20);
    common::ring_wall(&mut grid, 7, 7, 13, 13);
    let mut planner = common::point_robot_planner(grid);
    planner.set_start(WorldPoint::new(1.0, 1.0));
    planner.set_goal(WorldPoint::new(10.0, 10.0));
    assert_eq!(planner.plan_cycle().status, PlanStatus::NoPath);

    // Breach the ring; the next cycle must find a way in
    planner.update_map(&[
        CellUpdate::new(GridCoord::new(7, 10), 0),
        CellUpdate::new(GridCoord::new(7, 9), 0),
    ]);
    let result = planner.plan_cycle();
    assert_eq!(result.status, PlanStatus::Ok);
    assert!(result.expansions > 0);
    assert!(common::path_length(&result.path) >= WorldPoint::new(1.0, 1.0).distance(&WorldPoint::new(10.0, 10.0)) - 1e-3);
}

#[test]
fn test_goal_change_searches_fresh() {
    let mut planner = converged_planner(20, WorldPoint::new(1.0, 1.0), WorldPoint::new(18.0, 18.0));
    let first = planner.plan_cycle();
    assert_eq!(first.status, PlanStatus::Ok);

    planner.set_goal(WorldPoint::new(18.0, 1.0));
    let second = planner.plan_cycle();
    assert_eq!(second.status, PlanStatus::Ok);
    assert!(second.expansions > 0);

    let last = second.path.last().unwrap();
    assert!(last.distance(&WorldPoint::new(18.0, 1.0)) < 1e-3);
}
