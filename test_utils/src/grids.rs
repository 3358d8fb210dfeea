//! Cost-grid builders and a brute-force shortest-path oracle.

use mechwalk::grid::{CostGrid, GridCoord};

/// Builds a grid from rows of costs. Row `y`, column `x` becomes cell
/// `(x, y)`; `None` leaves the cell out.
///
/// # Examples
/// ```
/// use mechwalk::grid::GridCoord;
/// use test_utils::grid_from_rows;
/// let grid = grid_from_rows(&[&[Some(0.0), None], &[Some(0.5), Some(0.0)]]);
/// assert_eq!(grid.len(), 3);
/// assert!(!grid.contains(GridCoord::new(1, 0)));
/// ```
pub fn grid_from_rows(rows: &[&[Option<f64>]]) -> CostGrid {
    let mut grid = CostGrid::new();
    for (y, row) in (0..).zip(rows) {
        for (x, cost) in (0..).zip(row.iter()) {
            if let Some(cost) = cost {
                grid.add((x, y)).cost = *cost;
            }
        }
    }
    grid
}

/// A `width` by `height` grid with every node at `cost`.
pub fn open_grid(width: i32, height: i32, cost: f64) -> CostGrid {
    let mut grid = CostGrid::new();
    for x in 0..width {
        for y in 0..height {
            grid.add((x, y)).cost = cost;
        }
    }
    grid
}

/// Cheapest walk weight from `start` to `goal` under the planner's edge
/// model, found by relaxing every edge until nothing improves.
///
/// Returns `None` when either end is missing or the goal is unreachable.
pub fn brute_force_weight(grid: &CostGrid, start: GridCoord, goal: GridCoord) -> Option<f64> {
    if !grid.contains(start) || !grid.contains(goal) {
        return None;
    }
    let nodes: Vec<GridCoord> = grid.iter().map(|(coord, _)| coord).collect();
    let mut best = std::collections::HashMap::from([(start, 0.0_f64)]);

    for _ in 0..nodes.len() {
        let mut improved = false;
        for &from in &nodes {
            let Some(&here) = best.get(&from) else {
                continue;
            };
            for to in from.neighbours() {
                let Some(node) = grid.get(to) else {
                    continue;
                };
                let candidate = here + 1.0 + node.cost;
                if best.get(&to).map_or(true, |&known| candidate < known) {
                    best.insert(to, candidate);
                    improved = true;
                }
            }
        }
        if !improved {
            break;
        }
    }
    best.get(&goal).copied()
}
