//! Locomotion controller for a walking mech.
//!
//! Each call to [`Mech::tick`] runs four stages in order:
//!
//! 1. follow the active path and re-pin the body above the terrain,
//! 2. offer every leg a new foothold and commit it if a step is due,
//! 3. run the iterative IK solve (inverse pass, then forward pass),
//! 4. settle the body towards hover height above the average foot.
//!
//! None of the stages can fail. Degenerate geometry skips the affected
//! update for the current tick and keeps the previous state.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec3};
use log::{debug, warn};
use serde::Deserialize;

use crate::diagnostics::{DiagnosticsSink, FOOT_TARGETS, LEG_CHAINS, STEERING};
use crate::gait::{Leg, LegPart, SegmentLengths};
use crate::grid::{GridCoord, GridSpacing};
use crate::numeric::count_to_f32;
use crate::terrain::HeightField;
use crate::vector_math::{
    finite_direction, flatten, horizontal_distance, rotate_lookat, rotation_between_vectors,
};
use crate::{
    ARRIVAL_DISTANCE, BODY_HEIGHT_SMOOTHING, MAX_DISPLACEMENT_FACTOR, MAX_LEG_COUNT, REACH_MARGIN,
};

/// Re-projections tried when pulling a foothold back within reach.
const REACH_CLAMP_ITERATIONS: usize = 6;

/// Local axis the body walks along.
pub const BODY_FORWARD: Vec3 = Vec3::X;

/// Tuning parameters of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MechConfig {
    /// Distance travelled per tick while following a path.
    pub move_speed: f32,
    /// Largest body turn per tick, in radians.
    pub rotation_speed: f32,
    /// Height of the body above the ground.
    pub hover_height: f32,
    /// Fraction of half a leg sector the first leg is rotated by.
    pub legs_angle_offset: f32,
    /// Largest segment turn per tick, split across the IK iterations.
    pub legs_rotation_speed: f32,
    /// Sideways distance of foot candidates from the body.
    pub legs_spacing: f32,
    /// A planted foot steps once a candidate is further than this.
    pub legs_max_distance: f32,
    /// How far ahead of the body feet are placed.
    pub next_step_distance: f32,
    /// Distance of the hips from the body centre.
    pub hip_offset: f32,
    /// Inverse/forward pass pairs run every tick.
    pub ik_iterations: u32,
    /// Number of legs built by [`Mech::new`].
    pub leg_count: usize,
    /// Segment lengths per role.
    pub segments: SegmentLengths,
}

impl Default for MechConfig {
    fn default() -> Self {
        Self {
            move_speed: 0.15,
            rotation_speed: 0.05,
            hover_height: 3.0,
            legs_angle_offset: 1.0,
            legs_rotation_speed: 0.4,
            legs_spacing: 4.0,
            legs_max_distance: 2.5,
            next_step_distance: 1.0,
            hip_offset: 1.0,
            ik_iterations: 4,
            leg_count: 4,
            segments: SegmentLengths::default(),
        }
    }
}

/// Position and orientation of a rendered part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// World position.
    pub position: Vec3,
    /// World orientation.
    pub rotation: Quat,
}

/// Read-only snapshot of everything a renderer draws.
#[derive(Debug, Clone, PartialEq)]
pub struct MechPose {
    /// Body transform.
    pub body: Pose,
    /// Per leg, the proximal, middle and distal segment transforms.
    pub legs: Vec<[Pose; 3]>,
}

impl From<&LegPart> for Pose {
    fn from(part: &LegPart) -> Self {
        Self {
            position: part.position,
            rotation: part.rotation,
        }
    }
}

/// A mech body with its legs and active route.
#[derive(Debug, Clone)]
pub struct Mech {
    /// Body centre in world space.
    pub position: Vec3,
    /// Body orientation; [`BODY_FORWARD`] points where it walks.
    pub rotation: Quat,
    /// Tuning values.
    pub config: MechConfig,
    path: Vec<GridCoord>,
    legs: Vec<Leg>,
    velocity: Vec3,
    arrived: bool,
}

impl Mech {
    /// Creates a mech at `position` with `config.leg_count` legs.
    #[must_use]
    pub fn new(position: Vec3, config: MechConfig) -> Self {
        let mut mech = Self {
            position,
            rotation: Quat::IDENTITY,
            config,
            path: Vec::new(),
            legs: Vec::new(),
            velocity: Vec3::ZERO,
            arrived: false,
        };
        mech.set_leg_count(config.leg_count);
        mech
    }

    /// Destroys every leg and builds `count` new ones around the body.
    ///
    /// Zero or more than [`MAX_LEG_COUNT`] legs leaves the mech legless.
    /// Returns the number of legs actually built.
    pub fn set_leg_count(&mut self, count: usize) -> usize {
        self.legs.clear();
        if count == 0 || count > MAX_LEG_COUNT {
            warn!("leg count {count} outside 1..={MAX_LEG_COUNT}; mech has no legs");
            self.config.leg_count = 0;
            return 0;
        }

        self.config.leg_count = count;
        for index in 0..count {
            let hip = self.hip_position(index, count);
            let mut leg = Leg::new(&self.config.segments, hip);
            chain_from(&mut leg, hip);
            self.legs.push(leg);
        }
        count
    }

    /// Replaces the route. `path` runs start first, goal last.
    pub fn set_path(&mut self, path: Vec<GridCoord>) {
        self.path = path;
        self.arrived = false;
    }

    /// The active route, start first.
    #[must_use]
    pub fn path(&self) -> &[GridCoord] {
        &self.path
    }

    /// Legs in anchor-angle order.
    #[must_use]
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Displacement applied during the last tick.
    #[must_use]
    pub const fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Whether the body stopped at the end of the active route.
    #[must_use]
    pub const fn has_arrived(&self) -> bool {
        self.arrived
    }

    /// Anchor angle of leg `index` out of `count` around the vertical axis.
    #[must_use]
    pub fn leg_angle(&self, index: usize, count: usize) -> f32 {
        let n = count_to_f32(count.max(1));
        count_to_f32(index) * (TAU / n) + (PI / n) * self.config.legs_angle_offset
    }

    /// Unit direction in the body frame from the centre towards leg `index`.
    fn leg_direction(&self, index: usize, count: usize) -> Vec3 {
        self.rotation * (Quat::from_rotation_y(self.leg_angle(index, count)) * BODY_FORWARD)
    }

    /// Where the proximal segment of leg `index` attaches to the body.
    #[must_use]
    pub fn hip_position(&self, index: usize, count: usize) -> Vec3 {
        self.position + self.leg_direction(index, count) * self.config.hip_offset
    }

    /// Transforms of the body and every segment.
    #[must_use]
    pub fn pose(&self) -> MechPose {
        MechPose {
            body: Pose {
                position: self.position,
                rotation: self.rotation,
            },
            legs: self
                .legs
                .iter()
                .map(|leg| [Pose::from(&leg.proximal), Pose::from(&leg.middle), Pose::from(&leg.distal)])
                .collect(),
        }
    }

    /// Advances the controller by one fixed tick.
    pub fn tick<H>(&mut self, terrain: &H, spacing: GridSpacing, sink: &mut dyn DiagnosticsSink)
    where
        H: HeightField + ?Sized,
    {
        self.step_path(terrain, spacing, sink);
        if self.legs.is_empty() {
            return;
        }
        self.assign_leg_targets(terrain, sink);
        self.solve_ik(terrain);
        self.settle_body();

        if sink.wants(LEG_CHAINS) {
            for part in self.legs.iter().flat_map(Leg::parts) {
                sink.line(LEG_CHAINS, part.begin(), part.end());
            }
        }
    }

    /// Moves the body one step along the active path and pins it above the
    /// ground.
    ///
    /// Steering aims at the successor of the waypoint horizontally closest
    /// to the body. The body stops once that waypoint is the last one and
    /// lies within [`ARRIVAL_DISTANCE`]. The path itself is never cleared.
    pub fn step_path<H>(&mut self, terrain: &H, spacing: GridSpacing, sink: &mut dyn DiagnosticsSink)
    where
        H: HeightField + ?Sized,
    {
        self.velocity = Vec3::ZERO;
        if let Some(target) = self.steering_target(terrain, spacing) {
            sink.line(STEERING, self.position, target);
            self.advance_towards(target);
        }
        let pinned = terrain.height(self.position.x, self.position.z) + self.config.hover_height;
        if pinned.is_finite() {
            self.position.y = pinned;
        }
    }

    /// The waypoint to walk towards, or `None` when idle or arrived.
    fn steering_target<H>(&mut self, terrain: &H, spacing: GridSpacing) -> Option<Vec3>
    where
        H: HeightField + ?Sized,
    {
        if self.path.len() < 2 {
            return None;
        }
        let points: Vec<Vec3> = self
            .path
            .iter()
            .map(|&coord| {
                let flat = spacing.grid_to_world(coord, 0.0);
                terrain.ground_point(flat.x, flat.z)
            })
            .collect();

        let body = self.position;
        let closest = points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                horizontal_distance(**a, body).total_cmp(&horizontal_distance(**b, body))
            })
            .map(|(index, _)| index)?;
        let target_index = (closest + 1).min(points.len() - 1);
        let target = *points.get(target_index)?;

        if closest == target_index && horizontal_distance(body, target) < ARRIVAL_DISTANCE {
            if !self.arrived {
                debug!("arrived at {target}");
            }
            self.arrived = true;
            return None;
        }
        self.arrived = false;
        Some(target)
    }

    fn advance_towards(&mut self, target: Vec3) {
        let Some(direction) = finite_direction(flatten(target - self.position)) else {
            debug!("steering target coincides with body; holding position");
            return;
        };
        let displacement = direction * self.config.move_speed;
        let limit = self.config.move_speed.abs() * MAX_DISPLACEMENT_FACTOR;
        if !displacement.is_finite() || displacement.length() > limit + f32::EPSILON {
            debug!("discarding displacement {displacement}");
            return;
        }

        self.position += displacement;
        self.velocity = displacement;
        let desired = rotation_between_vectors(BODY_FORWARD, direction);
        let rotation = rotate_lookat(self.rotation, desired, self.config.rotation_speed);
        if rotation.is_finite() {
            self.rotation = rotation;
        }
    }

    /// Offers every leg a foothold ahead of and beside the body.
    fn assign_leg_targets<H>(&mut self, terrain: &H, sink: &mut dyn DiagnosticsSink)
    where
        H: HeightField + ?Sized,
    {
        let count = self.legs.len();
        let forward = self.rotation * BODY_FORWARD;
        let ahead = self.position + forward * (1.0 + self.config.next_step_distance) + self.velocity;
        let directions: Vec<Vec3> = (0..count).map(|i| self.leg_direction(i, count)).collect();

        for (leg, side) in self.legs.iter_mut().zip(directions) {
            let mut candidate = ahead + side * self.config.legs_spacing;
            candidate.y = terrain.height(candidate.x, candidate.z);

            let reach = leg.reach();
            if candidate.distance(self.position) > reach {
                let Some(within) = clamp_to_reach(terrain, self.position, candidate, reach) else {
                    debug!("no foothold within reach of {}", self.position);
                    continue;
                };
                candidate = within;
            }
            if !candidate.is_finite() {
                continue;
            }

            leg.consider_target(candidate, self.position, self.config.legs_max_distance);
            if let Some(planted) = leg.target_position {
                sink.marker(FOOT_TARGETS, planted);
            }
        }
    }

    /// Runs `ik_iterations` inverse and forward passes over every leg.
    ///
    /// A zero iteration count still runs one pass so the chains stay
    /// attached to the body.
    fn solve_ik<H>(&mut self, terrain: &H)
    where
        H: HeightField + ?Sized,
    {
        let iterations = self.config.ik_iterations.max(1);
        #[expect(
            clippy::cast_precision_loss,
            reason = "iteration counts are tiny compared to f32 precision"
        )]
        let max_angle = self.config.legs_rotation_speed / iterations as f32;
        let count = self.legs.len();
        let hips: Vec<Vec3> = (0..count).map(|i| self.hip_position(i, count)).collect();

        for _ in 0..iterations {
            for (leg, &hip) in self.legs.iter_mut().zip(&hips) {
                reach_for_target(leg, terrain, max_angle);
                chain_from(leg, hip);
            }
        }
    }

    /// Moves the body part of the way towards hover height above the
    /// average foot, carrying the legs with it.
    fn settle_body(&mut self) {
        if self.legs.is_empty() {
            return;
        }
        let total: f32 = self.legs.iter().map(|leg| leg.foot().y).sum();
        let average = total / count_to_f32(self.legs.len());
        let delta = (average + self.config.hover_height - self.position.y) * BODY_HEIGHT_SMOOTHING;
        if !delta.is_finite() {
            return;
        }
        self.position.y += delta;
        let offset = Vec3::new(0.0, delta, 0.0);
        for leg in &mut self.legs {
            leg.translate(offset);
        }
    }
}

/// Pulls a ground `candidate` horizontally towards `body` until it lies
/// within `reach` of the body, re-projecting onto the terrain each time.
///
/// Aims for `reach - REACH_MARGIN` so the re-projected height has room to
/// move. Returns `None` when the ground below the body is itself out of
/// reach or the candidate sits straight below the body.
fn clamp_to_reach<H>(terrain: &H, body: Vec3, candidate: Vec3, reach: f32) -> Option<Vec3>
where
    H: HeightField + ?Sized,
{
    let outwards = finite_direction(flatten(candidate - body))?;
    let limit = (reach - REACH_MARGIN).max(0.0);
    let mut clamped = candidate;
    for _ in 0..REACH_CLAMP_ITERATIONS {
        if clamped.distance(body) <= reach {
            return Some(clamped);
        }
        let rise = body.y - clamped.y;
        let radius = (limit * limit - rise * rise).max(0.0).sqrt();
        let flat = flatten(body) + outwards * radius;
        clamped = terrain.ground_point(flat.x, flat.z);
    }
    (clamped.distance(body) <= reach).then_some(clamped)
}

/// Inverse pass: each segment, tip first, turns towards what it must reach.
fn reach_for_target<H>(leg: &mut Leg, terrain: &H, max_angle: f32)
where
    H: HeightField + ?Sized,
{
    if let Some(target) = leg.target_position {
        if leg.distal.chase(target, max_angle) {
            leg.distal.collide_with_ground(terrain);
        }
    }
    let anchor = leg.distal.begin();
    if leg.middle.chase(anchor, max_angle) {
        leg.middle.collide_with_ground(terrain);
    }
    let anchor = leg.middle.begin();
    if leg.proximal.chase(anchor, max_angle) {
        leg.proximal.collide_with_ground(terrain);
    }
}

/// Forward pass: re-attaches every segment to the tip of its parent.
fn chain_from(leg: &mut Leg, hip: Vec3) {
    leg.proximal.position = hip;
    leg.middle.position = leg.proximal.end();
    leg.distal.position = leg.middle.end();
}
