//! Leg segments and the per-leg state driven by the locomotion controller.
//!
//! A leg is a chain of three rigid parts: the proximal part hangs off the
//! body, the middle part hangs off the proximal tip and the distal part ends
//! in the foot. Every part stores its own world transform; connectivity is
//! restored by the controller's forward pass rather than by parenting.

use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::terrain::HeightField;
use crate::vector_math::{finite_direction, flatten, rotate_lookat, rotation_between_vectors};
use crate::{SEGMENT_GRAZE_DISTANCE, SEGMENT_GROUND_CLEARANCE, SEGMENT_GROUND_MARGIN};

/// Local axis along which every segment extends.
pub const SEGMENT_FORWARD: Vec3 = Vec3::X;

/// Position of a segment within its leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentRole {
    /// Attached to the body.
    Proximal,
    /// Between the proximal and distal parts.
    Middle,
    /// Ends in the foot.
    Distal,
}

impl SegmentRole {
    /// All roles, body outwards.
    pub const ALL: [Self; 3] = [Self::Proximal, Self::Middle, Self::Distal];

    /// Axis mask applied to the direction a segment of this role chases.
    ///
    /// The proximal part only swings in the horizontal plane.
    #[must_use]
    pub const fn rotation_scalar(self) -> Vec3 {
        match self {
            Self::Proximal => Vec3::new(1.0, 0.0, 1.0),
            Self::Middle | Self::Distal => Vec3::ONE,
        }
    }
}

/// Lengths of the three segment roles.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SegmentLengths {
    /// Length of proximal parts.
    pub proximal: f32,
    /// Length of middle parts.
    pub middle: f32,
    /// Length of distal parts.
    pub distal: f32,
}

impl Default for SegmentLengths {
    fn default() -> Self {
        Self {
            proximal: 1.5,
            middle: 3.0,
            distal: 4.0,
        }
    }
}

impl SegmentLengths {
    /// Length of a segment playing `role`.
    #[must_use]
    pub const fn of(&self, role: SegmentRole) -> f32 {
        match role {
            SegmentRole::Proximal => self.proximal,
            SegmentRole::Middle => self.middle,
            SegmentRole::Distal => self.distal,
        }
    }

    /// Reach of a fully extended leg.
    #[must_use]
    pub const fn total(&self) -> f32 {
        self.proximal + self.middle + self.distal
    }
}

/// One rigid link of a leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegPart {
    /// Which link of the leg this is.
    pub role: SegmentRole,
    /// Fixed length, set by the role.
    pub length: f32,
    /// World position of the segment's base.
    pub position: Vec3,
    /// World orientation of the segment.
    pub rotation: Quat,
    /// Per-axis mask; a zero component locks that axis out of direction
    /// chasing.
    pub rotation_scalar: Vec3,
}

impl LegPart {
    /// Creates a segment of `role` at `position`, facing along
    /// [`SEGMENT_FORWARD`].
    #[must_use]
    pub const fn new(role: SegmentRole, lengths: &SegmentLengths, position: Vec3) -> Self {
        Self {
            role,
            length: lengths.of(role),
            position,
            rotation: Quat::IDENTITY,
            rotation_scalar: role.rotation_scalar(),
        }
    }

    /// Base of the segment.
    #[must_use]
    pub const fn begin(&self) -> Vec3 {
        self.position
    }

    /// Tip of the segment.
    #[must_use]
    pub fn end(&self) -> Vec3 {
        self.position + self.facing() * self.length
    }

    /// Unit direction the segment extends in.
    #[must_use]
    pub fn facing(&self) -> Vec3 {
        self.rotation * SEGMENT_FORWARD
    }

    /// Turns the segment towards `target` and slides it so its tip lands on
    /// the target along the new facing.
    ///
    /// The direction towards the target is masked by
    /// [`rotation_scalar`](Self::rotation_scalar) and renormalised. Returns
    /// `false`, leaving the segment untouched, when the target coincides
    /// with the base or the masked direction is degenerate.
    pub fn chase(&mut self, target: Vec3, max_angle: f32) -> bool {
        let delta = target - self.position;
        if !delta.is_finite() || delta.length_squared() <= f32::EPSILON {
            return false;
        }
        let Some(direction) = finite_direction(delta * self.rotation_scalar) else {
            return false;
        };

        let desired = rotation_between_vectors(SEGMENT_FORWARD, direction);
        let rotation = rotate_lookat(self.rotation, desired, max_angle);
        if !rotation.is_finite() {
            return false;
        }
        self.rotation = rotation;
        self.position = target - self.facing() * self.length;
        true
    }

    /// Keeps the segment above the terrain.
    ///
    /// A tip below the surface lifts the base by the penetration depth. A
    /// tip still within [`SEGMENT_GRAZE_DISTANCE`] of the surface pulls the
    /// segment back along its horizontal facing by the missing clearance
    /// plus [`SEGMENT_GROUND_MARGIN`]. Finally the base is never left lower
    /// than [`SEGMENT_GROUND_CLEARANCE`] above the ground beneath it.
    pub fn collide_with_ground<H: HeightField + ?Sized>(&mut self, terrain: &H) {
        let tip = self.end();
        let ground = terrain.height(tip.x, tip.z);
        if tip.y < ground {
            self.position.y += ground - tip.y;
        }

        let tip = self.end();
        let gap = tip.y - terrain.height(tip.x, tip.z);
        if gap < SEGMENT_GRAZE_DISTANCE {
            if let Some(back) = finite_direction(flatten(self.facing())) {
                self.position -= back * (SEGMENT_GRAZE_DISTANCE - gap + SEGMENT_GROUND_MARGIN);
            }
        }

        let floor = terrain.height(self.position.x, self.position.z) + SEGMENT_GROUND_CLEARANCE;
        if self.position.y < floor {
            self.position.y = floor;
        }
    }
}

/// The three segments of one leg plus its committed foothold.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    /// Segment attached to the body.
    pub proximal: LegPart,
    /// Segment between proximal and distal.
    pub middle: LegPart,
    /// Segment ending in the foot.
    pub distal: LegPart,
    /// Where the foot is planted; `None` until the first commit.
    pub target_position: Option<Vec3>,
}

impl Leg {
    /// Creates a folded leg with every segment based at `anchor`.
    #[must_use]
    pub const fn new(lengths: &SegmentLengths, anchor: Vec3) -> Self {
        Self {
            proximal: LegPart::new(SegmentRole::Proximal, lengths, anchor),
            middle: LegPart::new(SegmentRole::Middle, lengths, anchor),
            distal: LegPart::new(SegmentRole::Distal, lengths, anchor),
            target_position: None,
        }
    }

    /// Reach of the leg when fully extended.
    #[must_use]
    pub const fn reach(&self) -> f32 {
        self.proximal.length + self.middle.length + self.distal.length
    }

    /// Segments body outwards.
    #[must_use]
    pub const fn parts(&self) -> [&LegPart; 3] {
        [&self.proximal, &self.middle, &self.distal]
    }

    /// Where the foot currently is.
    #[must_use]
    pub fn foot(&self) -> Vec3 {
        self.distal.end()
    }

    /// Offers a new foothold and commits it if a step is due.
    ///
    /// A step is due when there is no foothold yet, when the current one has
    /// drifted further than the leg's reach from `body`, or when `candidate`
    /// lies further than `max_step` from the current one. Otherwise the
    /// planted foothold is kept. Returns whether a commit happened.
    ///
    /// # Examples
    ///
    /// ```
    /// use glam::Vec3;
    /// use mechwalk::gait::{Leg, SegmentLengths};
    /// let mut leg = Leg::new(&SegmentLengths::default(), Vec3::ZERO);
    /// assert!(leg.consider_target(Vec3::X, Vec3::ZERO, 2.0));
    /// assert!(!leg.consider_target(Vec3::new(2.5, 0.0, 0.0), Vec3::ZERO, 2.0));
    /// assert!(leg.consider_target(Vec3::new(3.5, 0.0, 0.0), Vec3::ZERO, 2.0));
    /// ```
    pub fn consider_target(&mut self, candidate: Vec3, body: Vec3, max_step: f32) -> bool {
        if !candidate.is_finite() {
            return false;
        }
        let due = self.target_position.map_or(true, |planted| {
            planted.distance(body) > self.reach() || candidate.distance(planted) > max_step
        });
        if due {
            self.target_position = Some(candidate);
        }
        due
    }

    /// Moves every segment by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        self.proximal.position += offset;
        self.middle.position += offset;
        self.distal.position += offset;
    }
}
