//! Small flat worlds, mechs and headless apps.

use bevy::prelude::*;
use mechwalk::config::SimConfig;
use mechwalk::mech::{Mech, MechConfig};
use mechwalk::plugin::MechPlugin;
use mechwalk::terrain::TerrainKind;

/// Configuration for a prop-free flat world at height zero covering
/// `0..width` by `-depth..depth` cells of unit spacing.
///
/// # Examples
/// ```
/// use test_utils::flat_config;
/// let config = flat_config(12, 4);
/// assert_eq!(config.world.bounds().max_x, 12);
/// assert!(config.validate().is_ok());
/// ```
pub fn flat_config(width: i32, depth: i32) -> SimConfig {
    let mut config = SimConfig::default();
    config.world.min_x = 0;
    config.world.max_x = width;
    config.world.min_z = -depth;
    config.world.max_z = depth;
    config.world.x_spacing = 1.0;
    config.world.z_spacing = 1.0;
    config.world.prop_density = 0.0;
    config.world.terrain = TerrainKind::Flat { height: 0.0 };
    config
}

/// A mech with default tuning and `legs` legs at `position`.
pub fn mech_at(position: Vec3, legs: usize) -> Mech {
    let config = MechConfig {
        leg_count: legs,
        ..MechConfig::default()
    };
    Mech::new(position, config)
}

/// An app running [`MechPlugin`] on `config` without any window or
/// renderer, after its first update.
pub fn headless_app(config: SimConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(MechPlugin::new(config));
    app.update();
    app
}
