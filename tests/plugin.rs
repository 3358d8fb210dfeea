//! Headless app tests for the mech plugin.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use mechwalk::components::{LegSegment, MechBody};
use mechwalk::diagnostics::{FOOT_TARGETS, STEERING};
use mechwalk::plugin::{DebugOverlay, PathRequest, SetLegCount, Simulation};
use rstest::{fixture, rstest};
use std::time::Duration;
use test_utils::{flat_config, headless_app};

#[fixture]
fn app() -> App {
    let mut app = headless_app(flat_config(40, 8));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)));
    app
}

fn ticks(app: &App) -> u64 {
    app.world().resource::<Simulation>().tick_count()
}

#[rstest]
fn frames_release_fixed_ticks(mut app: App) {
    let before = ticks(&app);
    app.update();
    assert_eq!(ticks(&app) - before, 3);
}

#[rstest]
fn long_frames_are_capped(mut app: App) {
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(200)));
    let cap = u64::from(app.world().resource::<Simulation>().config().world.max_ticks_per_frame);
    let before = ticks(&app);
    app.update();
    assert_eq!(ticks(&app) - before, cap);
}

#[rstest]
fn enabled_overlay_channels_collect_geometry(mut app: App) {
    app.world_mut().resource_mut::<DebugOverlay>().enable(STEERING);
    app.world_mut().trigger(PathRequest::ToPoint(Vec3::new(30.0, 0.0, 0.0)));
    app.update();

    let primitives = app.world_mut().resource_mut::<DebugOverlay>().drain();
    assert!(!primitives.is_empty());
    assert!(primitives.iter().all(|p| p.channel() == STEERING));
    assert!(!primitives.iter().any(|p| p.channel() == FOOT_TARGETS));
}

#[rstest]
fn mech_walks_to_requested_point(mut app: App) {
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(200)));
    app.world_mut().trigger(PathRequest::ToPoint(Vec3::new(20.0, 0.0, 0.0)));
    for _ in 0..40 {
        app.update();
    }

    let sim = app.world().resource::<Simulation>();
    assert!(sim.mech().has_arrived());
    let reached = sim.mech().position;
    assert!(reached.x > 15.0 && reached.x < 20.0, "stopped at {reached}");

    let mut bodies = app.world_mut().query_filtered::<&Transform, With<MechBody>>();
    let transform = bodies.single(app.world()).expect("exactly one body");
    assert_eq!(transform.translation, reached);
}

#[rstest]
#[case::tripod(3, 9)]
#[case::octopod(8, 24)]
#[case::too_many(40, 0)]
fn leg_count_sets_segment_entities(mut app: App, #[case] legs: usize, #[case] segments: usize) {
    app.world_mut().trigger(SetLegCount(legs));
    app.update();

    let mut query = app.world_mut().query::<&LegSegment>();
    let mut seen: Vec<(usize, usize)> = query
        .iter(app.world())
        .map(|segment| (segment.leg, segment.slot()))
        .collect();
    assert_eq!(seen.len(), segments);
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), segments, "each leg slot is spawned once");
    assert_eq!(app.world().resource::<Simulation>().mech().legs().len(), segments / 3);
}
