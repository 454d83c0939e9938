//! Configuration loading for the planner

use crate::error::{PlannerError, Result};
use serde::Deserialize;
use std::path::Path;

/// Planner configuration.
///
/// All distances are in meters unless noted; they are converted to cells
/// against the grid resolution when the cost map is built.
#[derive(Clone, Debug, Deserialize)]
pub struct PlannerConfig {
    /// Robot radius for obstacle inflation (meters)
    #[serde(default = "default_robot_radius")]
    pub robot_radius: f32,

    /// Safety margin beyond robot radius (meters)
    #[serde(default = "default_safety_margin")]
    pub safety_margin: f32,

    /// Distance within which to penalize obstacle proximity (meters)
    #[serde(default = "default_near_penalty_dist")]
    pub near_penalty_dist: f32,

    /// Occupancy value at and above which a cell is an obstacle
    #[serde(default = "default_occupied_threshold")]
    pub occupied_threshold: u8,

    /// Weight of raw occupancy on the traversal multiplier of free cells
    #[serde(default = "default_occupancy_weight")]
    pub occupancy_weight: f32,

    /// Distance from the goal at which path extraction stops (grid units)
    #[serde(default = "default_goal_dist")]
    pub goal_dist: f32,

    /// Maximum vertex expansions per planning cycle before giving up
    #[serde(default = "default_max_expansions")]
    pub max_expansions: usize,

    /// Maximum steps of greedy descent during path extraction
    #[serde(default = "default_max_path_steps")]
    pub max_path_steps: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            robot_radius: default_robot_radius(),
            safety_margin: default_safety_margin(),
            near_penalty_dist: default_near_penalty_dist(),
            occupied_threshold: default_occupied_threshold(),
            occupancy_weight: default_occupancy_weight(),
            goal_dist: default_goal_dist(),
            max_expansions: default_max_expansions(),
            max_path_steps: default_max_path_steps(),
        }
    }
}

// Default value functions
fn default_robot_radius() -> f32 {
    0.10
}
fn default_safety_margin() -> f32 {
    0.15
}
fn default_near_penalty_dist() -> f32 {
    0.30
}
fn default_occupied_threshold() -> u8 {
    100
}
fn default_occupancy_weight() -> f32 {
    2.0
}
fn default_goal_dist() -> f32 {
    0.95
}
fn default_max_expansions() -> usize {
    50000
}
fn default_max_path_steps() -> usize {
    2000
}

impl PlannerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlannerError::Config(format!("Failed to read config file: {}", e)))?;
        let config: PlannerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Total clearance from robot center to the inflation boundary (meters)
    pub fn inflation_radius(&self) -> f32 {
        self.robot_radius + self.safety_margin
    }
}
