//! Loading configuration files and generating worlds from them.

use mechwalk::config::{ConfigError, SimConfig};
use mechwalk::diagnostics::NoDiagnostics;
use mechwalk::terrain::TerrainKind;
use mechwalk::world::MechWorld;
use std::path::PathBuf;

struct TempConfig(PathBuf);

impl TempConfig {
    fn new(name: &str, text: &str) -> Self {
        let path = std::env::temp_dir().join(format!("mechwalk-{}-{name}.json", std::process::id()));
        std::fs::write(&path, text).expect("write temporary config");
        Self(path)
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[test]
fn partial_file_keeps_remaining_defaults() {
    let file = TempConfig::new(
        "partial",
        r#"{
            "world": { "min_x": -10, "max_x": 10, "min_z": -10, "max_z": 10,
                       "terrain": { "kind": "hills", "amplitude": 0.02 } },
            "mech": { "leg_count": 6, "segments": { "distal": 5.0 } }
        }"#,
    );
    let config = SimConfig::load(&file.0).expect("valid config");

    assert_eq!(config.world.terrain, TerrainKind::Hills { amplitude: 0.02 });
    assert_eq!(config.world.max_x, 10);
    assert!((config.world.x_spacing - 2.0).abs() < f32::EPSILON);
    assert_eq!(config.mech.leg_count, 6);
    assert!((config.mech.segments.distal - 5.0).abs() < f32::EPSILON);
    assert!((config.mech.segments.middle - 3.0).abs() < f32::EPSILON);
}

#[test]
fn loaded_config_drives_generation() {
    let file = TempConfig::new(
        "generate",
        r#"{ "world": { "min_x": 0, "max_x": 12, "min_z": 0, "max_z": 6,
                        "start_x": 4.0, "start_z": 2.0, "prop_density": 0.0 },
             "mech": { "leg_count": 5 } }"#,
    );
    let config = SimConfig::load(&file.0).expect("valid config");
    let world = MechWorld::generate(config, &mut NoDiagnostics);

    assert_eq!(world.grid().len(), 12 * 6);
    assert!(world.props().props().is_empty());
    assert_eq!(world.mech().legs().len(), 5);
    assert!((world.mech().position.x - 4.0).abs() < f32::EPSILON);
}

#[test]
fn unknown_terrain_kind_is_a_parse_error() {
    let file = TempConfig::new("terrain", r#"{ "world": { "terrain": { "kind": "lava" } } }"#);
    let err = SimConfig::load(&file.0).expect_err("unknown terrain");
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn invalid_values_name_the_field() {
    let file = TempConfig::new("invalid", r#"{ "world": { "prop_density": 2.0 } }"#);
    let err = SimConfig::load(&file.0).expect_err("density above one");
    assert!(err.to_string().contains("world.prop_density"), "{err}");
}
