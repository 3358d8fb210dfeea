//! Sparse cost lattice the path planner searches.
//!
//! Each node holds a traversal cost in `[0, 1]`. A node's presence means the
//! cell is potentially traversable with a known cost; absence means it was
//! never generated or has been pruned as blocked.

use glam::Vec3;
use hashbrown::HashMap;
use serde::Deserialize;

use crate::numeric::{cell_to_world, truncate_to_cell};
use crate::props::Occupant;
use crate::{BAD_NODE_COST, BAD_NODE_REMOVE_RADIUS};

/// Integer coordinate in grid space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    /// Column; scaled by the x spacing in world space.
    pub x: i32,
    /// Row; scaled by the z spacing in world space.
    pub y: i32,
}

impl From<(i32, i32)> for GridCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<GridCoord> for (i32, i32) {
    fn from(coord: GridCoord) -> Self {
        (coord.x, coord.y)
    }
}

impl GridCoord {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The eight cells surrounding this one.
    pub fn neighbours(self) -> impl Iterator<Item = Self> {
        self.block(1).filter(move |&c| c != self)
    }

    /// Every cell within Chebyshev distance `radius`, including this one.
    pub fn block(self, radius: i32) -> impl Iterator<Item = Self> {
        (-radius..=radius).flat_map(move |dy| {
            (-radius..=radius).map(move |dx| Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy)))
        })
    }

    /// Straight-line distance to `other` in grid units.
    #[must_use]
    pub fn euclidean(self, other: Self) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        dx.hypot(dy)
    }

    /// Chebyshev distance to `other` in grid units.
    #[must_use]
    pub fn chebyshev(self, other: Self) -> f64 {
        let dx = (f64::from(other.x) - f64::from(self.x)).abs();
        let dy = (f64::from(other.y) - f64::from(self.y)).abs();
        dx.max(dy)
    }
}

/// Half-open rectangle of grid coordinates, `min..max` on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridBounds {
    /// First column.
    pub min_x: i32,
    /// One past the last column.
    pub max_x: i32,
    /// First row.
    pub min_y: i32,
    /// One past the last row.
    pub max_y: i32,
}

impl GridBounds {
    /// Creates bounds covering `min_x..max_x` by `min_y..max_y`.
    #[must_use]
    pub const fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Whether the rectangle holds no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    /// Whether `coord` lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, coord: GridCoord) -> bool {
        coord.x >= self.min_x && coord.x < self.max_x && coord.y >= self.min_y && coord.y < self.max_y
    }

    /// Every cell, column-major like the world generator walks them.
    pub fn cells(self) -> impl Iterator<Item = GridCoord> {
        (self.min_x..self.max_x)
            .flat_map(move |x| (self.min_y..self.max_y).map(move |y| GridCoord::new(x, y)))
    }
}

/// World-space distance between neighbouring cells along each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpacing {
    /// Distance between columns along world x.
    pub x: f32,
    /// Distance between rows along world z.
    pub z: f32,
}

impl Default for GridSpacing {
    fn default() -> Self {
        Self { x: 1.0, z: 1.0 }
    }
}

impl GridSpacing {
    /// Creates a spacing.
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Cell containing a world position, truncating towards zero.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec3) -> Option<GridCoord> {
        Some(GridCoord::new(
            truncate_to_cell(position.x, self.x)?,
            truncate_to_cell(position.z, self.z)?,
        ))
    }

    /// World position of `coord` at elevation `height`.
    #[must_use]
    pub fn grid_to_world(&self, coord: GridCoord, height: f32) -> Vec3 {
        Vec3::new(cell_to_world(coord.x, self.x), height, cell_to_world(coord.y, self.z))
    }
}

/// A traversable cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridNode {
    /// Traversal penalty in `[0, 1]`; `1.0` is impassable.
    pub cost: f64,
}

impl GridNode {
    /// Blends the slope and obstacle terms into a node cost.
    ///
    /// `cost = min(normal_factor * (1 - |normal . up|) + obstacle, 1)`,
    /// clamped into `[0, 1]` even for non-unit normals or negative inputs.
    /// A non-finite blend is treated as impassable.
    ///
    /// # Examples
    ///
    /// ```
    /// use glam::Vec3;
    /// use mechwalk::grid::GridNode;
    /// assert_eq!(GridNode::calculate_cost(Vec3::Y, 2.0, None), 0.0);
    /// ```
    #[must_use]
    pub fn calculate_cost(normal: Vec3, normal_factor: f64, occupant: Option<&Occupant>) -> f64 {
        let obstacle_cost = occupant.map_or(0.0, |o| o.cost);
        let upness = f64::from(normal.dot(Vec3::Y)).abs();
        let cost = normal_factor * (1.0 - upness) + obstacle_cost;
        if cost.is_nan() {
            return 1.0;
        }
        cost.clamp(0.0, 1.0)
    }
}

/// Sparse map from grid coordinates to nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostGrid {
    nodes: HashMap<GridCoord, GridNode>,
}

impl CostGrid {
    /// Creates an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node at `coord` unless one exists, returning the node.
    ///
    /// Re-insertion keeps the existing node and its cost.
    pub fn add(&mut self, coord: impl Into<GridCoord>) -> &mut GridNode {
        self.nodes.entry(coord.into()).or_default()
    }

    /// Shorthand for [`GridNode::calculate_cost`].
    #[must_use]
    pub fn calculate_cost(normal: Vec3, normal_factor: f64, occupant: Option<&Occupant>) -> f64 {
        GridNode::calculate_cost(normal, normal_factor, occupant)
    }

    /// The node at `coord`.
    #[must_use]
    pub fn get(&self, coord: GridCoord) -> Option<&GridNode> {
        self.nodes.get(&coord)
    }

    /// Whether a node exists at `coord`.
    #[must_use]
    pub fn contains(&self, coord: GridCoord) -> bool {
        self.nodes.contains_key(&coord)
    }

    /// Removes the node at `coord`; missing nodes are ignored.
    pub fn remove(&mut self, coord: GridCoord) -> Option<GridNode> {
        self.nodes.remove(&coord)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the grid holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all nodes in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, &GridNode)> {
        self.nodes.iter().map(|(&c, n)| (c, n))
    }

    /// Erases every blocked node inside `bounds` with its neighbourhood.
    ///
    /// A node is blocked when its cost exceeds [`BAD_NODE_COST`]. The whole
    /// `(2r + 1)²` block around it is removed, with `r` the
    /// [`BAD_NODE_REMOVE_RADIUS`], whether or not those neighbours were
    /// blocked themselves. Blocked cells are collected before anything is
    /// erased, so the result does not depend on iteration order and a
    /// second pass changes nothing. Returns the number of nodes removed.
    pub fn clear_bad_nodes(&mut self, bounds: GridBounds) -> usize {
        let blocked: Vec<GridCoord> = bounds
            .cells()
            .filter(|&c| self.get(c).is_some_and(|n| n.cost > BAD_NODE_COST))
            .collect();

        let before = self.nodes.len();
        for coord in blocked {
            for victim in coord.block(BAD_NODE_REMOVE_RADIUS) {
                self.nodes.remove(&victim);
            }
        }
        before - self.nodes.len()
    }
}
