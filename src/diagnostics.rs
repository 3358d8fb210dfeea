//! Optional debug geometry emitted by the simulation.
//!
//! Simulation code never writes to global state for debugging. Instead the
//! controller receives a [`DiagnosticsSink`] and may push labelled lines and
//! markers into it. [`DebugDraw`] records only the channels that have been
//! switched on; [`NoDiagnostics`] discards everything.

use glam::Vec3;
use hashbrown::HashSet;

/// Committed foot targets.
pub const FOOT_TARGETS: &str = "Foot Targets";
/// Segment chains after the final IK iteration.
pub const LEG_CHAINS: &str = "Leg Chains";
/// Body-to-waypoint steering line.
pub const STEERING: &str = "Steering";
/// Surface normals sampled while building the cost grid.
pub const GROUND_NORMALS: &str = "Ground Normals";

/// A labelled piece of debug geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebugPrimitive {
    /// A segment between two points.
    Line {
        /// Channel the line was recorded on.
        channel: &'static str,
        /// Start point.
        from: Vec3,
        /// End point.
        to: Vec3,
    },
    /// A small cube drawn at a point.
    Marker {
        /// Channel the marker was recorded on.
        channel: &'static str,
        /// Marker centre.
        at: Vec3,
    },
}

impl DebugPrimitive {
    /// Channel the primitive belongs to.
    #[must_use]
    pub const fn channel(&self) -> &'static str {
        match self {
            Self::Line { channel, .. } | Self::Marker { channel, .. } => channel,
        }
    }
}

/// Receiver of debug geometry.
pub trait DiagnosticsSink {
    /// Whether anything recorded on `channel` would be kept. Callers may use
    /// this to skip computing geometry nobody wants.
    fn wants(&self, channel: &str) -> bool;

    /// Records a line.
    fn line(&mut self, channel: &'static str, from: Vec3, to: Vec3);

    /// Records a marker.
    fn marker(&mut self, channel: &'static str, at: Vec3);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl DiagnosticsSink for NoDiagnostics {
    fn wants(&self, _channel: &str) -> bool {
        false
    }

    fn line(&mut self, _channel: &'static str, _from: Vec3, _to: Vec3) {}

    fn marker(&mut self, _channel: &'static str, _at: Vec3) {}
}

/// Collects primitives for enabled channels until drained.
#[derive(Debug, Clone, Default)]
pub struct DebugDraw {
    enabled: HashSet<&'static str>,
    primitives: Vec<DebugPrimitive>,
}

impl DebugDraw {
    /// Creates a collector with every channel off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collector with `channels` switched on.
    #[must_use]
    pub fn with_channels(channels: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            enabled: channels.into_iter().collect(),
            primitives: Vec::new(),
        }
    }

    /// Switches `channel` on.
    pub fn enable(&mut self, channel: &'static str) {
        self.enabled.insert(channel);
    }

    /// Switches `channel` off; already recorded primitives stay.
    pub fn disable(&mut self, channel: &'static str) {
        self.enabled.remove(channel);
    }

    /// Primitives recorded since the last drain.
    #[must_use]
    pub fn primitives(&self) -> &[DebugPrimitive] {
        &self.primitives
    }

    /// Takes all recorded primitives.
    pub fn drain(&mut self) -> Vec<DebugPrimitive> {
        std::mem::take(&mut self.primitives)
    }
}

impl DiagnosticsSink for DebugDraw {
    fn wants(&self, channel: &str) -> bool {
        self.enabled.contains(channel)
    }

    fn line(&mut self, channel: &'static str, from: Vec3, to: Vec3) {
        if self.wants(channel) {
            self.primitives.push(DebugPrimitive::Line { channel, from, to });
        }
    }

    fn marker(&mut self, channel: &'static str, at: Vec3) {
        if self.wants(channel) {
            self.primitives.push(DebugPrimitive::Marker { channel, at });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_enabled_channels_are_recorded() {
        let mut draw = DebugDraw::with_channels([FOOT_TARGETS]);
        draw.marker(FOOT_TARGETS, Vec3::ONE);
        draw.line(STEERING, Vec3::ZERO, Vec3::X);
        assert_eq!(draw.primitives().len(), 1);
        assert_eq!(draw.primitives().first().map(DebugPrimitive::channel), Some(FOOT_TARGETS));

        draw.enable(STEERING);
        draw.line(STEERING, Vec3::ZERO, Vec3::X);
        draw.disable(FOOT_TARGETS);
        draw.marker(FOOT_TARGETS, Vec3::ONE);
        assert_eq!(draw.drain().len(), 2);
        assert!(draw.primitives().is_empty());
    }

    #[test]
    fn null_sink_wants_nothing() {
        let mut sink = NoDiagnostics;
        assert!(!sink.wants(LEG_CHAINS));
        sink.line(LEG_CHAINS, Vec3::ZERO, Vec3::ONE);
    }
}
