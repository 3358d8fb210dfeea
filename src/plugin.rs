//! Bevy plugin wiring the mech simulation into the app schedule.
//!
//! The simulation is a plain [`MechWorld`] stored in the [`Simulation`]
//! resource. Every `Update` feeds `Time::delta()` into its fixed-step clock,
//! then copies the resulting poses into the `Transform`s of the marker
//! entities. Rendering reads those transforms and never writes back.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::{error, info};
use thiserror::Error;

use crate::components::{LegSegment, MechBody};
use crate::config::SimConfig;
use crate::diagnostics::DebugDraw;
use crate::gait::SegmentRole;
use crate::grid::GridCoord;
use crate::mech::{MechPose, Pose};
use crate::world::MechWorld;

/// The running simulation.
#[derive(Resource, Debug, Deref, DerefMut)]
pub struct Simulation(pub MechWorld);

/// Debug geometry recorded during simulation ticks.
///
/// No channel is enabled by default; a renderer enables the ones it draws
/// and drains the collector every frame.
#[derive(Resource, Debug, Default, Deref, DerefMut)]
pub struct DebugOverlay(pub DebugDraw);

/// Asks the mech to walk somewhere.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum PathRequest {
    /// Walk to the cell containing a world position.
    ToPoint(Vec3),
    /// Walk to a grid cell.
    ToCell(GridCoord),
    /// Walk to wherever a pointer ray hits the terrain.
    Pick {
        /// Ray origin, usually the camera position.
        origin: Vec3,
        /// Ray direction.
        direction: Vec3,
    },
}

/// Rebuilds the mech with a new number of legs.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetLegCount(pub usize);

/// Context carried by [`SimulationError`] events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationErrorContext {
    /// A pointer ray did not hit the terrain.
    Picking,
    /// The planner found no usable route.
    Route,
}

/// Event raised when a request to the simulation cannot be honoured.
#[derive(Event, Debug, Clone, Error)]
#[error("{context:?}: {detail}")]
pub struct SimulationError {
    /// What was being attempted.
    pub context: SimulationErrorContext,
    /// Description of the failure.
    pub detail: String,
}

impl SimulationError {
    /// Convenience constructor used by observers to emit error events.
    #[must_use]
    pub fn new(context: SimulationErrorContext, detail: impl Into<String>) -> Self {
        Self {
            context,
            detail: detail.into(),
        }
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_simulation_error(event: On<SimulationError>) {
    let SimulationError { context, detail } = event.event();
    error!("simulation error during {context:?}: {detail}");
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn handle_path_request(event: On<PathRequest>, mut sim: ResMut<Simulation>, mut commands: Commands) {
    let result = match *event.event() {
        PathRequest::ToPoint(goal) => sim.request_path(goal),
        PathRequest::ToCell(goal) => sim.route_to(goal),
        PathRequest::Pick { origin, direction } => {
            let Some(goal) = sim.pick_ground(origin, direction) else {
                commands.trigger(SimulationError::new(
                    SimulationErrorContext::Picking,
                    "pointer ray does not hit the terrain",
                ));
                return;
            };
            sim.request_path(goal)
        }
    };
    if let Err(err) = result {
        commands.trigger(SimulationError::new(SimulationErrorContext::Route, err.to_string()));
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn handle_leg_count(
    event: On<SetLegCount>,
    mut sim: ResMut<Simulation>,
    segments: Query<Entity, With<LegSegment>>,
    mut commands: Commands,
) {
    let SetLegCount(count) = *event.event();
    let built = sim.mech_mut().set_leg_count(count);
    info!("mech rebuilt with {built} legs");
    for entity in &segments {
        commands.entity(entity).despawn();
    }
    spawn_segments(&mut commands, &sim.pose());
}

fn transform_of(pose: &Pose) -> Transform {
    Transform::from_translation(pose.position).with_rotation(pose.rotation)
}

fn spawn_segments(commands: &mut Commands, pose: &MechPose) {
    for (leg, parts) in pose.legs.iter().enumerate() {
        for (role, part) in SegmentRole::ALL.into_iter().zip(parts) {
            commands.spawn((LegSegment { leg, role }, transform_of(part)));
        }
    }
}

/// Spawns the body and segment entities for the current mech.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems require parameters by value, not by reference."
)]
pub fn spawn_mech_system(mut commands: Commands, sim: Res<Simulation>) {
    let pose = sim.pose();
    commands.spawn((MechBody, transform_of(&pose.body)));
    spawn_segments(&mut commands, &pose);
}

/// Runs the ticks released by the time elapsed since the last frame.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems require parameters by value, not by reference."
)]
pub fn advance_simulation_system(
    time: Res<Time>,
    mut sim: ResMut<Simulation>,
    mut overlay: ResMut<DebugOverlay>,
) {
    sim.advance(time.delta(), &mut overlay.0);
}

/// Copies body and segment poses into their entities' transforms.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems require parameters by value, not by reference."
)]
pub fn sync_transforms_system(
    sim: Res<Simulation>,
    mut bodies: Query<&mut Transform, (With<MechBody>, Without<LegSegment>)>,
    mut segments: Query<(&LegSegment, &mut Transform), Without<MechBody>>,
) {
    let pose = sim.pose();
    for mut transform in &mut bodies {
        *transform = transform_of(&pose.body);
    }
    for (segment, mut transform) in &mut segments {
        if let Some(part) = pose.legs.get(segment.leg).and_then(|parts| parts.get(segment.slot())) {
            *transform = transform_of(part);
        }
    }
}

/// Bevy plugin generating a world and driving its mech.
#[derive(Debug, Default)]
pub struct MechPlugin {
    /// Configuration the world is generated from.
    pub config: SimConfig,
}

impl MechPlugin {
    /// Creates a plugin generating its world from `config`.
    #[must_use]
    pub const fn new(config: SimConfig) -> Self {
        Self { config }
    }
}

impl Plugin for MechPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(log_simulation_error);
        app.add_observer(handle_path_request);
        app.add_observer(handle_leg_count);

        let mut overlay = DebugOverlay::default();
        let world = MechWorld::generate(self.config, &mut overlay.0);
        app.insert_resource(Simulation(world));
        app.insert_resource(overlay);

        app.add_systems(Startup, spawn_mech_system);
        app.add_systems(
            Update,
            (advance_simulation_system, sync_transforms_system).chain(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainKind;
    use bevy::time::TimeUpdateStrategy;
    use rstest::{fixture, rstest};
    use std::time::Duration;

    #[derive(Resource, Default, Debug)]
    struct CapturedErrors(Vec<SimulationError>);

    #[expect(
        clippy::needless_pass_by_value,
        reason = "Observer systems must take On<T> by value."
    )]
    fn record_error(event: On<SimulationError>, mut errors: ResMut<CapturedErrors>) {
        errors.0.push(event.event().clone());
    }

    #[fixture]
    fn app() -> App {
        let mut config = SimConfig::default();
        config.world.min_x = -8;
        config.world.max_x = 24;
        config.world.min_z = -8;
        config.world.max_z = 8;
        config.world.x_spacing = 1.0;
        config.world.z_spacing = 1.0;
        config.world.prop_density = 0.0;
        config.world.terrain = TerrainKind::Flat { height: 0.0 };

        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(MechPlugin::new(config));
        app.insert_resource(CapturedErrors::default());
        app.add_observer(record_error);
        app.update();
        app
    }

    fn segment_count(app: &mut App) -> usize {
        app.world_mut().query::<&LegSegment>().iter(app.world()).count()
    }

    #[test]
    fn error_message_names_its_context() {
        let err = SimulationError::new(SimulationErrorContext::Route, "no route");
        assert_eq!(err.detail, "no route");
        assert_eq!(err.to_string(), "Route: no route");
    }

    #[rstest]
    fn plugin_spawns_body_and_segments(mut app: App) {
        assert!(app.world().contains_resource::<Simulation>());
        let bodies = app.world_mut().query::<&MechBody>().iter(app.world()).count();
        assert_eq!(bodies, 1);
        assert_eq!(segment_count(&mut app), 12);
    }

    #[rstest]
    fn path_request_hands_route_to_mech(mut app: App) {
        app.world_mut().trigger(PathRequest::ToCell(GridCoord::new(12, 0)));
        let sim = app.world().resource::<Simulation>();
        assert_eq!(sim.mech().path().last(), Some(&GridCoord::new(12, 0)));
        assert!(app.world().resource::<CapturedErrors>().0.is_empty());
    }

    #[rstest]
    #[case::off_grid(PathRequest::ToCell(GridCoord::new(100, 100)), SimulationErrorContext::Route)]
    #[case::sky(
        PathRequest::Pick { origin: Vec3::new(0.0, 10.0, 0.0), direction: Vec3::Y },
        SimulationErrorContext::Picking
    )]
    fn failed_requests_raise_errors(
        mut app: App,
        #[case] request: PathRequest,
        #[case] context: SimulationErrorContext,
    ) {
        app.world_mut().trigger(request);
        app.update();
        let errors = &app.world().resource::<CapturedErrors>().0;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().map(|e| e.context), Some(context));
    }

    #[rstest]
    fn leg_count_change_respawns_segments(mut app: App) {
        app.world_mut().trigger(SetLegCount(6));
        app.update();
        assert_eq!(segment_count(&mut app), 18);
        app.world_mut().trigger(SetLegCount(0));
        app.update();
        assert_eq!(segment_count(&mut app), 0);
    }

    #[rstest]
    fn transforms_follow_the_walking_body(mut app: App) {
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)));
        app.world_mut().trigger(PathRequest::ToPoint(Vec3::new(20.0, 0.0, 0.0)));
        for _ in 0..10 {
            app.update();
        }

        let sim = app.world().resource::<Simulation>();
        assert!(sim.tick_count() > 0);
        let body = sim.mech().position;
        assert!(body.x > 0.0);

        let mut bodies = app.world_mut().query_filtered::<&Transform, With<MechBody>>();
        let transform = bodies.single(app.world()).expect("exactly one body");
        assert_eq!(transform.translation, body);
    }
}
