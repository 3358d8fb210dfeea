//! Cost grid construction and pruning over real terrain and props.

use glam::{Quat, Vec3};
use mechwalk::diagnostics::NoDiagnostics;
use mechwalk::grid::{CostGrid, GridBounds, GridCoord, GridSpacing};
use mechwalk::props::{Prop, PropCosts, PropKind, PropLayout};
use mechwalk::terrain::{FlatGround, HeightField, RollingHills};
use mechwalk::world::{build_cost_grid, MechWorld};
use mechwalk::{SimConfig, BAD_NODE_COST};
use rstest::rstest;

struct Ramp {
    slope: f32,
}

impl HeightField for Ramp {
    fn height(&self, x: f32, _z: f32) -> f32 {
        x * self.slope
    }
}

fn prop(kind: PropKind, x: f32, z: f32) -> Prop {
    Prop {
        kind,
        position: Vec3::new(x, 0.0, z),
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    }
}

#[rstest]
#[case::bush(PropKind::Bush, 0.2)]
#[case::tree(PropKind::Tree, 1.0)]
#[case::house(PropKind::House, 1.0)]
fn occupied_cells_take_the_prop_cost(#[case] kind: PropKind, #[case] expected: f64) {
    let spacing = GridSpacing::new(2.0, 2.0);
    let mut layout = PropLayout::new(PropCosts::default(), spacing);
    layout.place(GridCoord::new(3, 2), prop(kind, 6.5, 4.5));
    let bounds = GridBounds::new(0, 6, 0, 6);
    let grid = build_cost_grid(&FlatGround::new(0.0), &layout, bounds, spacing, 2.0, &mut NoDiagnostics);

    let cost = grid.get(GridCoord::new(3, 2)).map(|n| n.cost);
    assert_eq!(cost, Some(expected));
    assert_eq!(grid.get(GridCoord::new(0, 0)).map(|n| n.cost), Some(0.0));
}

#[rstest]
#[case::gentle(0.1)]
#[case::steep(1.0)]
#[case::cliff(20.0)]
fn slope_raises_cost_within_unit_range(#[case] slope: f32) {
    let terrain = Ramp { slope };
    let layout = PropLayout::new(PropCosts::default(), GridSpacing::default());
    let grid = build_cost_grid(
        &terrain,
        &layout,
        GridBounds::new(-3, 3, -3, 3),
        GridSpacing::default(),
        2.0,
        &mut NoDiagnostics,
    );
    let upness = f64::from(terrain.normal(0.0, 0.0).y);
    let expected = (2.0 * (1.0 - upness)).min(1.0);
    for (_, node) in grid.iter() {
        assert!((0.0..=1.0).contains(&node.cost));
        assert!((node.cost - expected).abs() < 1e-4);
    }
}

#[test]
fn pruned_grid_keeps_away_from_blocked_cells() {
    let spacing = GridSpacing::new(1.0, 1.0);
    let mut layout = PropLayout::new(PropCosts::default(), spacing);
    for (cell, x, z) in [((2, 2), 2.5, 2.5), ((8, 3), 8.5, 3.5), ((9, 3), 9.5, 3.5), ((5, 9), 5.5, 9.5)] {
        layout.place(GridCoord::from(cell), prop(PropKind::Rock, x, z));
    }
    layout.place(GridCoord::new(5, 5), prop(PropKind::Bush, 5.5, 5.5));

    let bounds = GridBounds::new(0, 12, 0, 12);
    let raw = build_cost_grid(&FlatGround::new(0.0), &layout, bounds, spacing, 2.0, &mut NoDiagnostics);
    let mut pruned = raw.clone();
    pruned.clear_bad_nodes(bounds);

    let blocked: Vec<GridCoord> = raw
        .iter()
        .filter(|(_, n)| n.cost > BAD_NODE_COST)
        .map(|(c, _)| c)
        .collect();
    assert_eq!(blocked.len(), 4);
    for coord in blocked {
        assert!(coord.block(1).all(|c| !pruned.contains(c)));
    }
    assert!(pruned.contains(GridCoord::new(5, 5)), "bushes are passable");
    assert!(pruned.iter().all(|(_, n)| n.cost <= BAD_NODE_COST));
}

#[test]
fn generated_world_is_already_fully_pruned() {
    let config = SimConfig::default();
    let world = MechWorld::generate(config, &mut NoDiagnostics);
    let mut again: CostGrid = world.grid().clone();
    assert_eq!(again.clear_bad_nodes(config.world.bounds()), 0);
    assert_eq!(&again, world.grid());
}

#[test]
fn generation_is_reproducible_for_a_seed() {
    let mut config = SimConfig::default();
    config.world.seed = 1234;
    config.world.prop_density = 0.6;
    let first = MechWorld::generate(config, &mut NoDiagnostics);
    let second = MechWorld::generate(config, &mut NoDiagnostics);
    assert_eq!(first.props().props(), second.props().props());
    assert_eq!(first.grid(), second.grid());
}

#[test]
fn hills_stay_mostly_walkable() {
    let hills = RollingHills::default();
    let layout = PropLayout::new(PropCosts::default(), GridSpacing::new(2.0, 2.0));
    let bounds = GridBounds::new(-20, 20, -20, 20);
    let grid = build_cost_grid(&hills, &layout, bounds, GridSpacing::new(2.0, 2.0), 2.0, &mut NoDiagnostics);
    assert_eq!(grid.len(), 40 * 40);
    assert!(grid.iter().all(|(_, n)| n.cost < BAD_NODE_COST));
}
