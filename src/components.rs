//! ECS components linking render entities to the simulated mech.
//! The simulation itself lives in [`crate::world::MechWorld`]; these markers
//! only say which pose an entity's `Transform` mirrors.
use bevy::prelude::*;

use crate::gait::SegmentRole;

/// Marks the entity mirroring the mech body.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct MechBody;

/// Marks an entity mirroring one leg segment.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegSegment {
    /// Index of the leg in [`crate::mech::Mech::legs`].
    pub leg: usize,
    /// Which segment of that leg.
    pub role: SegmentRole,
}

impl LegSegment {
    /// Position of the segment in a leg's body-outwards pose array.
    #[must_use]
    pub const fn slot(&self) -> usize {
        match self.role {
            SegmentRole::Proximal => 0,
            SegmentRole::Middle => 1,
            SegmentRole::Distal => 2,
        }
    }
}
