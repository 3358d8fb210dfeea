//! The simulated world: terrain, props, cost grid and the mech walking it.
//!
//! [`MechWorld`] owns all mutable simulation state. The terrain is only ever
//! handed out by shared reference, so every consumer sees the same pure
//! height field the cost grid was built from.

use std::time::Duration;

use glam::Vec3;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::config::SimConfig;
use crate::diagnostics::{DiagnosticsSink, GROUND_NORMALS};
use crate::grid::{CostGrid, GridBounds, GridCoord, GridSpacing};
use crate::mech::{Mech, MechPose};
use crate::pathfinding::{is_usable, PathPlanner};
use crate::props::{scatter_props, ObstacleLookup, PropLayout, ScatterParams};
use crate::terrain::{raycast_ground, HeightField};

/// Longest ray [`MechWorld::pick_ground`] follows.
pub const PICK_DISTANCE: f32 = 2000.0;

/// Why a route could not be planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The cell has no node, either outside the bounds or pruned as blocked.
    #[error("cell ({}, {}) is not traversable", .0.x, .0.y)]
    NotOnGrid(GridCoord),
    /// A position could not be mapped to a cell.
    #[error("position cannot be mapped to a grid cell")]
    Unmappable,
    /// Start and goal are the same cell.
    #[error("already at ({}, {})", .0.x, .0.y)]
    AlreadyThere(GridCoord),
    /// Both cells exist but no route connects them.
    #[error("no route from ({}, {}) to ({}, {})", .start.x, .start.y, .goal.x, .goal.y)]
    Unreachable {
        /// Cell the search started from.
        start: GridCoord,
        /// Cell the search was aiming for.
        goal: GridCoord,
    },
}

/// Turns real elapsed time into whole simulation ticks.
///
/// At most `max_ticks` are released per call. Time beyond that is dropped so
/// a long stall does not make the simulation race to catch up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedStep {
    tick: Duration,
    max_ticks: u32,
    accumulated: Duration,
}

impl FixedStep {
    /// Creates an accumulator releasing ticks of length `tick`.
    #[must_use]
    pub const fn new(tick: Duration, max_ticks: u32) -> Self {
        Self {
            tick,
            max_ticks,
            accumulated: Duration::ZERO,
        }
    }

    /// Length of one tick.
    #[must_use]
    pub const fn tick(&self) -> Duration {
        self.tick
    }

    /// Time carried over to the next call.
    #[must_use]
    pub const fn pending(&self) -> Duration {
        self.accumulated
    }

    /// Adds `elapsed` and returns how many ticks to run now.
    pub fn accumulate(&mut self, elapsed: Duration) -> u32 {
        if self.tick.is_zero() {
            return 0;
        }
        self.accumulated = self.accumulated.saturating_add(elapsed);
        let mut ticks = 0;
        while self.accumulated >= self.tick && ticks < self.max_ticks {
            self.accumulated -= self.tick;
            ticks += 1;
        }
        if self.accumulated >= self.tick {
            debug!("dropping {:?} of simulation backlog", self.accumulated);
            self.accumulated = Duration::ZERO;
        }
        ticks
    }
}

/// Builds one node per cell of `bounds` with cost from slope and obstacles.
pub fn build_cost_grid<H, O>(
    terrain: &H,
    obstacles: &O,
    bounds: GridBounds,
    spacing: GridSpacing,
    normal_factor: f64,
    sink: &mut dyn DiagnosticsSink,
) -> CostGrid
where
    H: HeightField + ?Sized,
    O: ObstacleLookup + ?Sized,
{
    let mut grid = CostGrid::new();
    let draw_normals = sink.wants(GROUND_NORMALS);
    for cell in bounds.cells() {
        let flat = spacing.grid_to_world(cell, 0.0);
        let ground = terrain.ground_point(flat.x, flat.z);
        let normal = terrain.normal(flat.x, flat.z);
        let occupant = obstacles.occupant_at(ground);
        grid.add(cell).cost = CostGrid::calculate_cost(normal, normal_factor, occupant.as_ref());
        if draw_normals {
            sink.line(GROUND_NORMALS, ground, ground + normal);
        }
    }
    grid
}

/// Terrain, props, cost grid and mech of one simulation run.
pub struct MechWorld {
    config: SimConfig,
    terrain: Box<dyn HeightField>,
    props: PropLayout,
    grid: CostGrid,
    mech: Mech,
    clock: FixedStep,
    tick_count: u64,
}

impl std::fmt::Debug for MechWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MechWorld")
            .field("nodes", &self.grid.len())
            .field("props", &self.props.props().len())
            .field("mech", &self.mech.position)
            .field("tick_count", &self.tick_count)
            .finish_non_exhaustive()
    }
}

impl MechWorld {
    /// Generates terrain, props and the pruned cost grid, and places the
    /// mech at the configured start.
    #[must_use]
    pub fn generate(config: SimConfig, sink: &mut dyn DiagnosticsSink) -> Self {
        let world = config.world;
        let spacing = world.spacing();
        let bounds = world.bounds();
        let terrain = world.terrain.build();

        let mut props = PropLayout::new(config.props, spacing);
        let params = ScatterParams {
            bounds,
            spacing,
            density: world.prop_density,
            keep_clear: world.start(),
            clear_radius: world.prop_exclusion_radius,
        };
        scatter_props(&*terrain, &mut props, &params, &mut StdRng::seed_from_u64(world.seed));

        let mut grid = build_cost_grid(&*terrain, &props, bounds, spacing, world.normal_factor, sink);
        let generated = grid.len();
        let pruned = grid.clear_bad_nodes(bounds);
        info!(
            "generated world: {generated} nodes, {pruned} pruned, {} props in {} cells",
            props.props().len(),
            props.occupied_cells()
        );

        Self {
            config,
            terrain,
            props,
            grid,
            mech: Mech::new(world.start(), config.mech),
            clock: FixedStep::new(world.tick_duration(), world.max_ticks_per_frame),
            tick_count: 0,
        }
    }

    /// Configuration the world was generated from.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The height field.
    #[must_use]
    pub fn terrain(&self) -> &dyn HeightField {
        &*self.terrain
    }

    /// Placed props.
    #[must_use]
    pub const fn props(&self) -> &PropLayout {
        &self.props
    }

    /// The pruned cost grid.
    #[must_use]
    pub const fn grid(&self) -> &CostGrid {
        &self.grid
    }

    /// The mech.
    #[must_use]
    pub const fn mech(&self) -> &Mech {
        &self.mech
    }

    /// Mutable access to the mech, e.g. to change its leg count.
    pub fn mech_mut(&mut self) -> &mut Mech {
        &mut self.mech
    }

    /// Ticks run since generation.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Body and segment transforms for rendering.
    #[must_use]
    pub fn pose(&self) -> MechPose {
        self.mech.pose()
    }

    /// Grid to world scaling.
    #[must_use]
    pub const fn spacing(&self) -> GridSpacing {
        self.config.world.spacing()
    }

    /// Plans from the mech's cell to the cell containing `goal` and hands
    /// the route to the mech. Returns the number of waypoints.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] when no usable route exists.
    pub fn request_path(&mut self, goal: Vec3) -> Result<usize, RouteError> {
        let spacing = self.spacing();
        let start = spacing
            .world_to_grid(self.mech.position)
            .ok_or(RouteError::Unmappable)?;
        let goal = spacing.world_to_grid(goal).ok_or(RouteError::Unmappable)?;
        self.request_route(start, goal)
    }

    /// Plans from the mech's cell to `goal`.
    ///
    /// # Errors
    ///
    /// As [`request_path`](Self::request_path).
    pub fn route_to(&mut self, goal: GridCoord) -> Result<usize, RouteError> {
        let start = self
            .spacing()
            .world_to_grid(self.mech.position)
            .ok_or(RouteError::Unmappable)?;
        self.request_route(start, goal)
    }

    /// Plans from `start` to `goal` and replaces the mech's route.
    ///
    /// The route is replaced even when planning fails, which stops the mech.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] when the result has fewer than two
    /// waypoints.
    pub fn request_route(&mut self, start: GridCoord, goal: GridCoord) -> Result<usize, RouteError> {
        let mut path = PathPlanner::new(&self.grid).find(start, goal);
        path.reverse();
        let waypoints = path.len();
        let usable = is_usable(&path);
        self.mech.set_path(path);

        if usable {
            info!("route ({}, {}) -> ({}, {}): {waypoints} waypoints", start.x, start.y, goal.x, goal.y);
            return Ok(waypoints);
        }
        let err = if !self.grid.contains(start) {
            RouteError::NotOnGrid(start)
        } else if !self.grid.contains(goal) {
            RouteError::NotOnGrid(goal)
        } else if start == goal {
            RouteError::AlreadyThere(goal)
        } else {
            RouteError::Unreachable { start, goal }
        };
        warn!("route request failed: {err}");
        Err(err)
    }

    /// Terrain point hit by a ray, e.g. a pointer ray from the camera.
    #[must_use]
    pub fn pick_ground(&self, origin: Vec3, direction: Vec3) -> Option<Vec3> {
        raycast_ground(&*self.terrain, origin, direction, PICK_DISTANCE)
    }

    /// Runs one simulation tick.
    pub fn step(&mut self, sink: &mut dyn DiagnosticsSink) {
        let spacing = self.spacing();
        self.mech.tick(&*self.terrain, spacing, sink);
        self.tick_count += 1;
    }

    /// Feeds `elapsed` real time into the fixed-step clock and runs the
    /// ticks it releases. Returns the number of ticks run.
    pub fn advance(&mut self, elapsed: Duration, sink: &mut dyn DiagnosticsSink) -> u32 {
        let ticks = self.clock.accumulate(elapsed);
        for _ in 0..ticks {
            self.step(sink);
        }
        ticks
    }
}
