//! A* search over a [`CostGrid`].
//!
//! Moves are 8-connected. Entering a neighbour costs `1 + neighbour.cost`
//! whether the move is orthogonal or diagonal, so diagonal steps are priced
//! the same as straight ones.
//!
//! # Unreachable goals
//!
//! The planner never fails loudly. A missing start or goal node produces an
//! empty path. A goal that exists but cannot be reached produces a path
//! holding only the goal coordinate. Callers must check [`is_usable`]
//! (length ≥ 2) before following a path.
//!
//! # Ordering
//!
//! Paths are returned goal first, start last.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use hashbrown::HashMap;
use log::debug;
use ordered_float::OrderedFloat;

use crate::grid::{CostGrid, GridCoord};

/// Estimate of the remaining cost from a cell to the goal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Heuristic {
    /// Straight-line distance in grid units.
    #[default]
    Euclidean,
    /// Largest per-axis distance. Never overestimates under the unit step
    /// cost, so the search always returns a cheapest path.
    Chebyshev,
}

impl Heuristic {
    fn estimate(self, from: GridCoord, goal: GridCoord) -> f64 {
        match self {
            Self::Euclidean => from.euclidean(goal),
            Self::Chebyshev => from.chebyshev(goal),
        }
    }
}

/// Best-first search over a borrowed grid.
#[derive(Debug, Clone, Copy)]
pub struct PathPlanner<'a> {
    grid: &'a CostGrid,
    heuristic: Heuristic,
}

impl<'a> PathPlanner<'a> {
    /// Creates a planner using the Euclidean heuristic.
    #[must_use]
    pub fn new(grid: &'a CostGrid) -> Self {
        Self {
            grid,
            heuristic: Heuristic::default(),
        }
    }

    /// Replaces the heuristic.
    #[must_use]
    pub const fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// The heuristic in use.
    #[must_use]
    pub const fn heuristic(&self) -> Heuristic {
        self.heuristic
    }

    /// Finds a path from `start` to `goal`, returned goal first.
    ///
    /// See the module documentation for the empty and single-element
    /// results.
    #[must_use]
    pub fn find(&self, start: GridCoord, goal: GridCoord) -> Vec<GridCoord> {
        if !self.grid.contains(start) || !self.grid.contains(goal) {
            debug!("path request {start:?} -> {goal:?} outside the grid");
            return Vec::new();
        }

        let came_from = self.search(start, goal);

        let mut path = vec![goal];
        let mut current = goal;
        while let Some(&previous) = came_from.get(&current) {
            path.push(previous);
            current = previous;
        }
        path
    }

    /// Runs the search and returns the predecessor links it settled on.
    fn search(&self, start: GridCoord, goal: GridCoord) -> HashMap<GridCoord, GridCoord> {
        let mut g_scores: HashMap<GridCoord, f64> = HashMap::new();
        let mut open_f: HashMap<GridCoord, f64> = HashMap::new();
        let mut came_from: HashMap<GridCoord, GridCoord> = HashMap::new();
        let mut frontier = BinaryHeap::new();

        let start_f = self.heuristic.estimate(start, goal);
        g_scores.insert(start, 0.0);
        open_f.insert(start, start_f);
        frontier.push(Reverse((OrderedFloat(start_f), start)));

        while let Some(Reverse((OrderedFloat(f_score), current))) = frontier.pop() {
            // Entries superseded by a cheaper route are left in the heap.
            if open_f.get(&current) != Some(&f_score) {
                continue;
            }
            open_f.remove(&current);

            if current == goal {
                break;
            }

            let Some(&to_current) = g_scores.get(&current) else {
                continue;
            };
            for neighbour in current.neighbours() {
                let Some(node) = self.grid.get(neighbour) else {
                    continue;
                };
                let tentative = to_current + 1.0 + node.cost;
                if g_scores.get(&neighbour).is_some_and(|&known| known <= tentative) {
                    continue;
                }

                let f = tentative + self.heuristic.estimate(neighbour, goal);
                g_scores.insert(neighbour, tentative);
                came_from.insert(neighbour, current);
                open_f.insert(neighbour, f);
                frontier.push(Reverse((OrderedFloat(f), neighbour)));
            }
        }

        came_from
    }
}

/// Finds a path from `(start_x, start_y)` to `(end_x, end_y)`, goal first.
///
/// # Examples
///
/// ```
/// use mechwalk::grid::{CostGrid, GridCoord};
/// use mechwalk::pathfinding::get_path;
///
/// let mut grid = CostGrid::new();
/// for x in 0..4 {
///     grid.add((x, 0));
/// }
/// let path = get_path(&grid, 0, 0, 3, 0);
/// assert_eq!(path.first(), Some(&GridCoord::new(3, 0)));
/// assert_eq!(path.last(), Some(&GridCoord::new(0, 0)));
/// assert_eq!(path.len(), 4);
/// ```
#[must_use]
pub fn get_path(grid: &CostGrid, start_x: i32, start_y: i32, end_x: i32, end_y: i32) -> Vec<GridCoord> {
    PathPlanner::new(grid).find(GridCoord::new(start_x, start_y), GridCoord::new(end_x, end_y))
}

/// Whether `path` holds at least one move.
#[must_use]
pub const fn is_usable(path: &[GridCoord]) -> bool {
    path.len() >= 2
}

/// Total edge weight of walking `path` in order.
///
/// Each step into a node costs `1 + node.cost`, as in the search. Returns
/// `None` if a node is missing from the grid or two consecutive entries are
/// not neighbours.
#[must_use]
pub fn path_weight(grid: &CostGrid, path: &[GridCoord]) -> Option<f64> {
    path.windows(2).try_fold(0.0, |total, pair| {
        let [from, to] = pair else {
            return None;
        };
        if from.chebyshev(*to) != 1.0 || !grid.contains(*from) {
            return None;
        }
        grid.get(*to).map(|node| total + 1.0 + node.cost)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn usability_is_a_const_check() {
        const SINGLE: bool = is_usable(&[GridCoord::new(4, 4)]);
        const STEP: bool = is_usable(&[GridCoord::new(4, 4), GridCoord::new(5, 4)]);
        assert!(!SINGLE);
        assert!(STEP);
    }

    fn open_field(width: i32, height: i32) -> CostGrid {
        let mut grid = CostGrid::new();
        for x in 0..width {
            for y in 0..height {
                grid.add((x, y));
            }
        }
        grid
    }

    #[rstest]
    #[case::start_missing(GridCoord::new(-5, 0), GridCoord::new(2, 2))]
    #[case::goal_missing(GridCoord::new(0, 0), GridCoord::new(9, 9))]
    fn missing_endpoints_give_empty_path(#[case] start: GridCoord, #[case] goal: GridCoord) {
        let grid = open_field(3, 3);
        assert!(PathPlanner::new(&grid).find(start, goal).is_empty());
    }

    #[test]
    fn walled_off_goal_gives_single_coordinate() {
        let mut grid = open_field(3, 3);
        grid.add((10, 10));
        let path = get_path(&grid, 0, 0, 10, 10);
        assert_eq!(path, vec![GridCoord::new(10, 10)]);
        assert!(!is_usable(&path));
    }

    #[test]
    fn start_equal_to_goal_is_not_usable() {
        let grid = open_field(2, 2);
        let path = get_path(&grid, 1, 1, 1, 1);
        assert_eq!(path, vec![GridCoord::new(1, 1)]);
    }

    #[test]
    fn diagonal_costs_the_same_as_straight() {
        let grid = open_field(3, 3);
        let path = get_path(&grid, 0, 0, 2, 2);
        assert_eq!(path, vec![GridCoord::new(2, 2), GridCoord::new(1, 1), GridCoord::new(0, 0)]);
        let mut forward = path.clone();
        forward.reverse();
        assert_eq!(path_weight(&grid, &forward), Some(2.0));
    }

    #[test]
    fn path_steers_around_expensive_cell() {
        let mut grid = open_field(7, 2);
        grid.add((3, 0)).cost = 0.9;
        let mut path = get_path(&grid, 0, 0, 6, 0);
        path.reverse();
        assert!(!path.contains(&GridCoord::new(3, 0)));
        assert_eq!(path_weight(&grid, &path), Some(6.0));
    }

    #[test]
    fn chebyshev_planner_matches_euclidean_on_corridor() {
        let grid = open_field(6, 1);
        let planner = PathPlanner::new(&grid).with_heuristic(Heuristic::Chebyshev);
        assert_eq!(planner.heuristic(), Heuristic::Chebyshev);
        assert_eq!(
            planner.find(GridCoord::new(0, 0), GridCoord::new(5, 0)),
            PathPlanner::new(&grid).find(GridCoord::new(0, 0), GridCoord::new(5, 0))
        );
    }

    #[test]
    fn weight_rejects_gaps() {
        let grid = open_field(4, 1);
        let hop = [GridCoord::new(0, 0), GridCoord::new(2, 0)];
        assert_eq!(path_weight(&grid, &hop), None);
        assert_eq!(path_weight(&grid, &[GridCoord::new(0, 0)]), Some(0.0));
    }
}
