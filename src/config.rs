//! Simulation configuration loaded from JSON.
//!
//! Every section defaults field by field, so a file only needs to mention
//! the values it changes. Loaded configurations are validated before use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

use crate::grid::{GridBounds, GridSpacing};
use crate::mech::MechConfig;
use crate::props::PropCosts;
use crate::terrain::TerrainKind;
use crate::{DEFAULT_NORMAL_FACTOR, MAX_LEG_COUNT, PROP_EXCLUSION_RADIUS};

const FALLBACK_TICK: Duration = Duration::from_nanos(16_666_667);

/// Reasons a configuration cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The text is not valid configuration JSON.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is outside its accepted range.
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// World generation and scheduling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// First grid column.
    pub min_x: i32,
    /// One past the last grid column.
    pub max_x: i32,
    /// First grid row.
    pub min_z: i32,
    /// One past the last grid row.
    pub max_z: i32,
    /// World distance between grid columns.
    pub x_spacing: f32,
    /// World distance between grid rows.
    pub z_spacing: f32,
    /// Weight of the slope term in node costs.
    pub normal_factor: f64,
    /// Seed for prop placement.
    pub seed: u64,
    /// Simulation ticks per second.
    pub tick_hz: f32,
    /// Most ticks drained by a single frame; the rest is dropped.
    pub max_ticks_per_frame: u32,
    /// Terrain to generate.
    pub terrain: TerrainKind,
    /// Chance that an eligible cell receives a prop.
    pub prop_density: f32,
    /// Radius around the start kept free of props.
    pub prop_exclusion_radius: f32,
    /// Start position of the mech on the x axis.
    pub start_x: f32,
    /// Start position of the mech on the z axis.
    pub start_z: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min_x: -64,
            max_x: 64,
            min_z: -64,
            max_z: 64,
            x_spacing: 2.0,
            z_spacing: 2.0,
            normal_factor: DEFAULT_NORMAL_FACTOR,
            seed: 0,
            tick_hz: 60.0,
            max_ticks_per_frame: 8,
            terrain: TerrainKind::default(),
            prop_density: 0.2,
            prop_exclusion_radius: PROP_EXCLUSION_RADIUS,
            start_x: 0.0,
            start_z: 0.0,
        }
    }
}

impl WorldConfig {
    /// Cells the cost grid covers.
    #[must_use]
    pub const fn bounds(&self) -> GridBounds {
        GridBounds::new(self.min_x, self.max_x, self.min_z, self.max_z)
    }

    /// Grid to world scaling.
    #[must_use]
    pub const fn spacing(&self) -> GridSpacing {
        GridSpacing::new(self.x_spacing, self.z_spacing)
    }

    /// Start position at ground level zero; the controller lifts it on the
    /// first tick.
    #[must_use]
    pub const fn start(&self) -> Vec3 {
        Vec3::new(self.start_x, 0.0, self.start_z)
    }

    /// Length of one simulation tick; falls back to 60 Hz for a rate that
    /// does not describe a duration.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / f64::from(self.tick_hz)).unwrap_or(FALLBACK_TICK)
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World generation and scheduling.
    pub world: WorldConfig,
    /// Mech tuning.
    pub mech: MechConfig,
    /// Obstacle costs per prop kind.
    pub props: PropCosts,
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("expected a positive number, got {value}")))
    }
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("expected zero or more, got {value}")))
    }
}

fn require_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("expected a value in [0, 1], got {value}")))
    }
}

impl SimConfig {
    /// Parses and validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    ///
    /// # Examples
    ///
    /// ```
    /// use mechwalk::config::SimConfig;
    /// let config = SimConfig::from_json_str(r#"{ "mech": { "leg_count": 6 } }"#).unwrap();
    /// assert_eq!(config.mech.leg_count, 6);
    /// assert_eq!(config.world.x_spacing, 2.0);
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks every value against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if world.bounds().is_empty() {
            return Err(invalid("world.bounds", "grid bounds hold no cells"));
        }
        require_positive("world.x_spacing", world.x_spacing)?;
        require_positive("world.z_spacing", world.z_spacing)?;
        require_positive("world.tick_hz", world.tick_hz)?;
        if world.max_ticks_per_frame == 0 {
            return Err(invalid("world.max_ticks_per_frame", "must drain at least one tick"));
        }
        if !world.normal_factor.is_finite() || world.normal_factor < 0.0 {
            return Err(invalid("world.normal_factor", "expected zero or more"));
        }
        if !(0.0..=1.0).contains(&world.prop_density) {
            return Err(invalid("world.prop_density", "expected a probability"));
        }
        require_non_negative("world.prop_exclusion_radius", world.prop_exclusion_radius)?;

        let mech = &self.mech;
        require_non_negative("mech.move_speed", mech.move_speed)?;
        require_non_negative("mech.rotation_speed", mech.rotation_speed)?;
        require_non_negative("mech.hover_height", mech.hover_height)?;
        require_non_negative("mech.legs_rotation_speed", mech.legs_rotation_speed)?;
        require_non_negative("mech.legs_spacing", mech.legs_spacing)?;
        require_positive("mech.legs_max_distance", mech.legs_max_distance)?;
        require_non_negative("mech.next_step_distance", mech.next_step_distance)?;
        require_non_negative("mech.hip_offset", mech.hip_offset)?;
        if !mech.legs_angle_offset.is_finite() {
            return Err(invalid("mech.legs_angle_offset", "expected a finite number"));
        }
        if mech.ik_iterations == 0 {
            return Err(invalid("mech.ik_iterations", "at least one iteration is required"));
        }
        if mech.leg_count > MAX_LEG_COUNT {
            return Err(invalid(
                "mech.leg_count",
                format!("at most {MAX_LEG_COUNT} legs are supported"),
            ));
        }
        require_positive("mech.segments.proximal", mech.segments.proximal)?;
        require_positive("mech.segments.middle", mech.segments.middle)?;
        require_positive("mech.segments.distal", mech.segments.distal)?;

        require_unit("props.tree", self.props.tree)?;
        require_unit("props.house", self.props.house)?;
        require_unit("props.rock", self.props.rock)?;
        require_unit("props.bush", self.props.bush)?;
        Ok(())
    }
}
