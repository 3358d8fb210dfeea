#![cfg_attr(docsrs, feature(doc_cfg))]
//! Library crate providing the mechwalk simulation: a multi-legged mech that
//! plans routes over a cost grid and walks them with procedural IK.
//! Re-exports the core types for the binary, the Bevy plugin and the tests.
pub mod components;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod gait;
pub mod grid;
pub mod logging;
pub mod mech;
pub mod numeric;
pub mod pathfinding;
pub mod plugin;
pub mod props;
pub mod terrain;
pub mod vector_math;
pub mod world;
pub use constants::*;

// Re-export commonly used items
pub use components::{LegSegment, MechBody};
pub use config::{ConfigError, SimConfig, WorldConfig};
pub use diagnostics::{DebugDraw, DebugPrimitive, DiagnosticsSink, NoDiagnostics};
pub use gait::{Leg, LegPart, SegmentLengths, SegmentRole};
pub use grid::{CostGrid, GridBounds, GridCoord, GridNode, GridSpacing};
pub use logging::init as init_logging;
pub use mech::{Mech, MechConfig, MechPose, Pose};
pub use pathfinding::{get_path, is_usable, path_weight, Heuristic, PathPlanner};
pub use plugin::{
    DebugOverlay, MechPlugin, PathRequest, SetLegCount, Simulation, SimulationError,
    SimulationErrorContext,
};
pub use props::{ObstacleLookup, Occupant, Prop, PropCosts, PropKind, PropLayout};
pub use terrain::{raycast_ground, FlatGround, HeightField, RollingHills, TerrainKind};
pub use vector_math::{rotate_lookat, rotation_between_vectors};
pub use world::{FixedStep, MechWorld, RouteError};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use mechwalk::prelude::*;
    //! ```

    pub use crate::grid::{CostGrid, GridCoord, GridSpacing};
    pub use crate::mech::{Mech, MechConfig};
    pub use crate::pathfinding::get_path;
    pub use crate::terrain::{FlatGround, HeightField};
    pub use crate::world::MechWorld;
    pub use crate::MechPlugin;
    pub use crate::SimConfig;
}
