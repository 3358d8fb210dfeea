//! Simulation constants shared across systems.
//!
//! Tuning values that players may want to change live in
//! [`crate::config`]; the values here are structural and stay fixed.

/// Nodes costing more than this are treated as blocked when pruning.
pub const BAD_NODE_COST: f64 = 0.99;
/// Chebyshev radius erased around every blocked node.
pub const BAD_NODE_REMOVE_RADIUS: i32 = 1;
/// Default weight of the slope term in the node cost blend.
pub const DEFAULT_NORMAL_FACTOR: f64 = 2.0;

/// The body stops once it is this close to the final waypoint.
pub const ARRIVAL_DISTANCE: f32 = 4.0;
/// Fraction of the hover error removed from the body height each tick.
pub const BODY_HEIGHT_SMOOTHING: f32 = 0.4;
/// Segment bases never sit closer than this to the terrain surface.
pub const SEGMENT_GROUND_CLEARANCE: f32 = 1.0;
/// Tips closer than this to the surface count as grazing it.
pub const SEGMENT_GRAZE_DISTANCE: f32 = 0.5;
/// Extra distance added whenever a segment is pushed clear of the ground.
pub const SEGMENT_GROUND_MARGIN: f32 = 0.05;
/// Extra slack kept when a foot candidate is pulled back into reach.
pub const REACH_MARGIN: f32 = 0.1;
/// Per-tick displacements longer than this multiple of the move speed are
/// discarded as corrupt.
pub const MAX_DISPLACEMENT_FACTOR: f32 = 4.0;

/// Largest leg count the controller accepts; anything above means no legs.
pub const MAX_LEG_COUNT: usize = 32;

/// Below this angle two orientations are considered identical.
pub const ROTATION_EPSILON: f32 = 1e-5;

/// Props are never placed closer than this to the mech start position.
pub const PROP_EXCLUSION_RADIUS: f32 = 5.0;
/// Props are only considered on every n-th cell along each axis.
pub const PROP_CELL_STRIDE: i32 = 3;
