//! Core geometry types shared across the crate.

mod point;

pub use point::{GridCoord, GridPoint, WorldPoint};
