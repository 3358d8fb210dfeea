//! Behaviour test for a four-legged mech walking a straight route.
//!
//! The body advances every tick until it is within arrival distance of the
//! goal and then holds still with every foot planted.

#[path = "support/rspec_runner.rs"]
mod rspec_runner;

use glam::Vec3;
use mechwalk::diagnostics::NoDiagnostics;
use mechwalk::grid::{GridCoord, GridSpacing};
use mechwalk::terrain::FlatGround;
use mechwalk::ARRIVAL_DISTANCE;
use rspec_runner::run_serial;
use std::fmt;
use std::sync::{Arc, Mutex};
use test_utils::mech_at;

const GOAL: Vec3 = Vec3::new(10.0, 0.0, 0.0);
const TICKS: usize = 80;

#[derive(Default)]
struct Walk {
    xs: Vec<f32>,
    arrivals: Vec<bool>,
    targets: Vec<Option<Vec3>>,
}

#[derive(Clone, Default)]
struct WalkEnv {
    walk: Arc<Mutex<Walk>>,
}

impl fmt::Debug for WalkEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ticks = self.walk.lock().map_or(0, |w| w.xs.len());
        f.debug_struct("WalkEnv").field("ticks", &ticks).finish()
    }
}

impl WalkEnv {
    fn walk_route(&mut self) {
        let mut walk = self.walk.lock().expect("walk lock");
        if !walk.xs.is_empty() {
            return;
        }
        let ground = FlatGround::new(0.0);
        let mut mech = mech_at(Vec3::ZERO, 4);
        mech.set_path(vec![GridCoord::new(0, 0), GridCoord::new(10, 0)]);
        for _ in 0..TICKS {
            mech.tick(&ground, GridSpacing::default(), &mut NoDiagnostics);
            walk.xs.push(mech.position.x);
            walk.arrivals.push(mech.has_arrived());
            walk.targets
                .extend(mech.legs().iter().map(|leg| leg.target_position));
        }
    }

    fn first_arrival(&self) -> usize {
        let walk = self.walk.lock().expect("walk lock");
        walk.arrivals
            .iter()
            .position(|&arrived| arrived)
            .expect("mech never arrived")
    }
}

#[test]
fn mech_walks_to_goal_and_stops() {
    run_serial(&rspec::given(
        "a four-legged mech on flat ground with a route along x",
        WalkEnv::default(),
        |ctx| {
            ctx.before_each(WalkEnv::walk_route);
            ctx.when("it is ticked repeatedly", |ctx| {
                ctx.then("the body advances every tick until it arrives", |env| {
                    let arrival = env.first_arrival();
                    let walk = env.walk.lock().expect("walk lock");
                    let before = walk.xs.get(..arrival).expect("arrival within history");
                    assert!(before.windows(2).all(|w| matches!(w, [a, b] if b > a)));
                    let last = *before.last().expect("moved before arriving");
                    assert!(Vec3::new(last, 0.0, 0.0).distance(GOAL) < ARRIVAL_DISTANCE + 0.2);
                });
                ctx.then("the body holds still once arrived", |env| {
                    let arrival = env.first_arrival();
                    let walk = env.walk.lock().expect("walk lock");
                    let after = walk.xs.get(arrival..).expect("arrival within history");
                    assert!(after.len() > 10);
                    let held = after.first().copied();
                    assert!(after.iter().all(|&x| Some(x) == held));
                    assert!(walk.arrivals.get(arrival..).is_some_and(|a| a.iter().all(|&b| b)));
                });
                ctx.then("no foothold is ever non-finite", |env| {
                    let walk = env.walk.lock().expect("walk lock");
                    assert!(walk.targets.iter().flatten().all(|t| t.is_finite()));
                    assert!(walk.targets.iter().all(Option::is_some));
                });
            });
        },
    ));
}
