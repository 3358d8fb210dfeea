//! Static obstacles scattered over the terrain.
//!
//! Props matter to the core only through the cost they add to the grid
//! cell they occupy. Placement follows a fixed stride over the grid with a
//! seeded RNG so that the same seed always yields the same world.

use glam::{Quat, Vec3};
use hashbrown::HashMap;
use rand::Rng;
use serde::Deserialize;

use crate::grid::{GridBounds, GridCoord, GridSpacing};
use crate::terrain::HeightField;
use crate::vector_math::rotation_between_vectors;
use crate::PROP_CELL_STRIDE;

/// Kind of static object standing on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropKind {
    /// Large tree; blocks movement.
    Tree,
    /// Building; blocks movement.
    House,
    /// Boulder; blocks movement.
    Rock,
    /// Sparse vegetation the mech can wade through.
    Bush,
}

/// Obstacle cost contributed by each prop kind.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PropCosts {
    /// Cost of a cell holding a tree.
    pub tree: f64,
    /// Cost of a cell holding a house.
    pub house: f64,
    /// Cost of a cell holding a rock.
    pub rock: f64,
    /// Cost of a cell holding a bush.
    pub bush: f64,
}

impl Default for PropCosts {
    fn default() -> Self {
        Self {
            tree: 1.0,
            house: 1.0,
            rock: 1.0,
            bush: 0.2,
        }
    }
}

impl PropCosts {
    /// Cost contribution of `kind`.
    #[must_use]
    pub const fn cost_of(&self, kind: PropKind) -> f64 {
        match kind {
            PropKind::Tree => self.tree,
            PropKind::House => self.house,
            PropKind::Rock => self.rock,
            PropKind::Bush => self.bush,
        }
    }
}

/// A placed prop.
#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    /// What the prop is.
    pub kind: PropKind,
    /// Base position in world space.
    pub position: Vec3,
    /// Orientation aligning the prop with the local terrain normal.
    pub rotation: Quat,
    /// Render scale.
    pub scale: Vec3,
}

/// Descriptor of whatever occupies a cell, as seen by the cost model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occupant {
    /// Kind of the occupying prop.
    pub kind: PropKind,
    /// Cost the occupant adds to the cell.
    pub cost: f64,
}

/// Looks up the static obstacle standing at a world position.
pub trait ObstacleLookup {
    /// The occupant of the cell containing `position`, if any.
    fn occupant_at(&self, position: Vec3) -> Option<Occupant>;
}

/// Props of a world together with a per-cell occupancy index.
#[derive(Debug, Clone, Default)]
pub struct PropLayout {
    props: Vec<Prop>,
    occupants: HashMap<GridCoord, PropKind>,
    costs: PropCosts,
    spacing: GridSpacing,
}

impl PropLayout {
    /// Creates an empty layout using `costs` for occupancy lookups.
    #[must_use]
    pub fn new(costs: PropCosts, spacing: GridSpacing) -> Self {
        Self {
            props: Vec::new(),
            occupants: HashMap::new(),
            costs,
            spacing,
        }
    }

    /// Adds `prop` on behalf of `cell`; the first prop placed for a cell
    /// becomes its occupant, wherever the prop itself ends up standing.
    pub fn place(&mut self, cell: GridCoord, prop: Prop) {
        self.occupants.entry(cell).or_insert(prop.kind);
        self.props.push(prop);
    }

    /// Every placed prop in placement order.
    #[must_use]
    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    /// Number of cells holding at least one prop.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.occupants.len()
    }

    /// The occupant registered for `cell`.
    #[must_use]
    pub fn occupant_of(&self, cell: GridCoord) -> Option<Occupant> {
        self.occupants.get(&cell).map(|&kind| Occupant {
            kind,
            cost: self.costs.cost_of(kind),
        })
    }
}

impl ObstacleLookup for PropLayout {
    fn occupant_at(&self, position: Vec3) -> Option<Occupant> {
        self.spacing
            .world_to_grid(position)
            .and_then(|cell| self.occupant_of(cell))
    }
}

/// Parameters for [`scatter_props`].
#[derive(Debug, Clone, Copy)]
pub struct ScatterParams {
    /// Cells on which props may appear.
    pub bounds: GridBounds,
    /// Grid spacing used to convert cells to world space.
    pub spacing: GridSpacing,
    /// Chance that an eligible cell receives a prop.
    pub density: f32,
    /// Props keep at least `clear_radius` from this point.
    pub keep_clear: Vec3,
    /// Radius around `keep_clear` left free of props.
    pub clear_radius: f32,
}

/// Oriented so that the prop's up axis follows the terrain normal.
fn upright_on(normal: Vec3) -> Quat {
    rotation_between_vectors(Vec3::Y, normal)
}

/// Scatters props over `params.bounds`.
///
/// Only every [`PROP_CELL_STRIDE`]-th cell on both axes is eligible. The
/// sample point of an eligible cell is jittered by up to a quarter cell.
/// Moderate (0.5..2.0) or deep (< -10) ground receives rocks; elsewhere a
/// tree is planted, often with a bush nearby, or a lone bush.
pub fn scatter_props<H, R>(
    terrain: &H,
    layout: &mut PropLayout,
    params: &ScatterParams,
    rng: &mut R,
) where
    H: HeightField + ?Sized,
    R: Rng + ?Sized,
{
    let spacing = params.spacing;
    for cell in params.bounds.cells() {
        if cell.x % PROP_CELL_STRIDE != 0 || cell.y % PROP_CELL_STRIDE != 0 {
            continue;
        }

        let mut pos = spacing.grid_to_world(cell, 0.0);
        pos.x += (rng.gen::<f32>() - 0.5) * spacing.x / 2.0;
        pos.z += (rng.gen::<f32>() - 0.5) * spacing.z / 2.0;
        pos.y = terrain.height(pos.x, pos.z);

        if rng.gen::<f32>() >= params.density || pos.distance(params.keep_clear) <= params.clear_radius
        {
            continue;
        }

        let normal = terrain.normal(pos.x, pos.z);
        if (pos.y > 0.5 && pos.y < 2.0) || pos.y < -10.0 {
            layout.place(cell, Prop {
                kind: PropKind::Rock,
                position: pos,
                rotation: upright_on(normal),
                scale: Vec3::ONE,
            });
            continue;
        }

        let mut bush_at = None;
        if rng.gen::<f32>() < 0.3 {
            bush_at = Some((pos, normal));
        } else {
            let trunk_normal = Vec3::new(normal.x, normal.y * 8.0, normal.z).normalize_or_zero();
            layout.place(cell, Prop {
                kind: PropKind::Tree,
                position: pos - normal,
                rotation: upright_on(trunk_normal),
                scale: Vec3::ONE,
            });
            if rng.gen::<f32>() < 0.7 {
                let mut bush = pos;
                bush.x += (rng.gen::<f32>() - 0.5) * 10.0;
                bush.z += (rng.gen::<f32>() - 0.5) * 10.0;
                bush.y = terrain.height(bush.x, bush.z);
                bush_at = Some((bush, terrain.normal(bush.x, bush.z)));
            }
        }

        if let Some((bush, bush_normal)) = bush_at {
            layout.place(cell, Prop {
                kind: PropKind::Bush,
                position: bush - bush_normal * 0.2,
                rotation: upright_on(bush_normal),
                scale: Vec3::ONE,
            });
        }
    }
}
