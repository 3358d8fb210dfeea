//! Utility helpers for tests.
//!
//! [`grids`] builds cost grids from literal tables and checks planner output
//! against a brute-force oracle; [`worlds`] builds small flat worlds, mechs
//! and headless apps.
pub mod grids;
pub mod worlds;

pub use grids::{brute_force_weight, grid_from_rows, open_grid};
pub use worlds::{flat_config, headless_app, mech_at};
