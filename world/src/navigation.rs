//! Breadth-first path search over the level's walkable cells.

use std::collections::VecDeque;

use delve_core::{CellCoord, GridMetrics, NavGrid, Vec2};

/// Dense walkability grid answering path queries for followers.
///
/// Cells are stored in row-major order. Searches expand neighbours in a fixed
/// order (north, east, south, west, then the diagonals when allowed) so equal
/// length routes always resolve the same way.
#[derive(Clone, Debug)]
pub struct WalkGrid {
    metrics: GridMetrics,
    walkable: Vec<bool>,
}

impl WalkGrid {
    /// Builds the grid by asking `is_walkable` about every cell.
    #[must_use]
    pub fn build_with<F>(metrics: GridMetrics, mut is_walkable: F) -> Self
    where
        F: FnMut(CellCoord) -> bool,
    {
        let mut walkable = Vec::new();
        for row in 0..metrics.rows() {
            for column in 0..metrics.columns() {
                walkable.push(is_walkable(CellCoord::new(column, row)));
            }
        }
        Self { metrics, walkable }
    }

    /// Reports whether the cell exists and can be entered.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        index(self.metrics, cell)
            .and_then(|offset| self.walkable.get(offset).copied())
            .unwrap_or(false)
    }

    /// Finds the shortest route between two cells.
    ///
    /// The route includes both endpoints. The start cell itself need not be
    /// walkable so agents nudged into a wall can still plan their way out.
    #[must_use]
    pub fn route(
        &self,
        start: CellCoord,
        goal: CellCoord,
        allow_diagonal: bool,
    ) -> Option<Vec<CellCoord>> {
        if !self.metrics.contains(start) || !self.is_walkable(goal) {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        let start_index = index(self.metrics, start)?;
        let mut parents: Vec<Option<usize>> = vec![None; self.walkable.len()];
        let mut visited = vec![false; self.walkable.len()];
        visited[start_index] = true;

        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            let current = index(self.metrics, cell)?;

            for neighbor in self.neighbors(cell, allow_diagonal) {
                let Some(offset) = index(self.metrics, neighbor) else {
                    continue;
                };
                if visited[offset] {
                    continue;
                }

                visited[offset] = true;
                parents[offset] = Some(current);

                if neighbor == goal {
                    return Some(self.unwind(&parents, offset));
                }
                queue.push_back(neighbor);
            }
        }

        None
    }

    fn unwind(&self, parents: &[Option<usize>], mut offset: usize) -> Vec<CellCoord> {
        let mut cells = vec![self.cell_at_index(offset)];
        while let Some(parent) = parents.get(offset).copied().flatten() {
            cells.push(self.cell_at_index(parent));
            offset = parent;
        }
        cells.reverse();
        cells
    }

    fn cell_at_index(&self, offset: usize) -> CellCoord {
        let columns = self.metrics.columns().max(1) as usize;
        CellCoord::new((offset % columns) as u32, (offset / columns) as u32)
    }

    fn neighbors(&self, cell: CellCoord, allow_diagonal: bool) -> Vec<CellCoord> {
        let mut candidates = Vec::with_capacity(8);
        let column = i64::from(cell.column());
        let row = i64::from(cell.row());

        for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
            if let Some(next) = self.offset(column + dx, row + dy) {
                candidates.push(next);
            }
        }

        if allow_diagonal {
            for (dx, dy) in [(1, -1), (1, 1), (-1, 1), (-1, -1)] {
                let Some(next) = self.offset(column + dx, row + dy) else {
                    continue;
                };
                let side_a = self.offset(column + dx, row);
                let side_b = self.offset(column, row + dy);
                if side_a.is_some() && side_b.is_some() {
                    candidates.push(next);
                }
            }
        }

        candidates
    }

    fn offset(&self, column: i64, row: i64) -> Option<CellCoord> {
        let cell = CellCoord::new(u32::try_from(column).ok()?, u32::try_from(row).ok()?);
        self.is_walkable(cell).then_some(cell)
    }
}

impl NavGrid for WalkGrid {
    fn metrics(&self) -> GridMetrics {
        self.metrics
    }

    fn find_path(
        &self,
        start: Vec2,
        goal: Vec2,
        allow_diagonal: bool,
    ) -> Option<Vec<CellCoord>> {
        let start = self.metrics.cell_at(start)?;
        let goal = self.metrics.cell_at(goal)?;
        self.route(start, goal, allow_diagonal)
    }
}

fn index(metrics: GridMetrics, cell: CellCoord) -> Option<usize> {
    if !metrics.contains(cell) {
        return None;
    }
    let width = usize::try_from(metrics.columns()).ok()?;
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str]) -> WalkGrid {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |row| row.len()) as u32;
        let metrics = GridMetrics::new(width, height, 16.0);
        WalkGrid::build_with(metrics, |cell| {
            rows[cell.row() as usize].as_bytes()[cell.column() as usize] != b'#'
        })
    }

    #[test]
    fn route_includes_both_endpoints() {
        let grid = grid(&["....", "....", "...."]);
        let route = grid
            .route(CellCoord::new(0, 0), CellCoord::new(2, 0), false)
            .expect("open row");
        assert_eq!(
            route,
            vec![CellCoord::new(0, 0), CellCoord::new(1, 0), CellCoord::new(2, 0)]
        );
        assert_eq!(
            grid.route(CellCoord::new(3, 2), CellCoord::new(3, 2), false),
            Some(vec![CellCoord::new(3, 2)])
        );
    }

    #[test]
    fn route_detours_around_walls() {
        let grid = grid(&["....", ".##.", "...."]);
        let route = grid
            .route(CellCoord::new(0, 1), CellCoord::new(3, 1), false)
            .expect("detour exists");

        assert_eq!(route.len(), 6);
        assert_eq!(route.first(), Some(&CellCoord::new(0, 1)));
        assert_eq!(route.last(), Some(&CellCoord::new(3, 1)));
        assert!(route.iter().all(|cell| grid.is_walkable(*cell)));
        for pair in route.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
    }

    #[test]
    fn unreachable_or_solid_goal_yields_none() {
        let grid = grid(&["..#.", "..#.", "..#."]);
        assert_eq!(
            grid.route(CellCoord::new(0, 0), CellCoord::new(3, 0), false),
            None
        );
        assert_eq!(
            grid.route(CellCoord::new(0, 0), CellCoord::new(2, 1), false),
            None
        );
    }

    #[test]
    fn diagonal_moves_do_not_cut_corners() {
        let ring = grid(&["...", ".#.", "..."]);
        let straight = ring
            .route(CellCoord::new(0, 0), CellCoord::new(2, 2), true)
            .expect("open ring");
        assert_eq!(straight.len(), 5);

        let open = grid(&["...", "...", "..."]);
        let diagonal = open
            .route(CellCoord::new(0, 0), CellCoord::new(2, 2), true)
            .expect("open field");
        assert_eq!(
            diagonal,
            vec![CellCoord::new(0, 0), CellCoord::new(1, 1), CellCoord::new(2, 2)]
        );
    }

    #[test]
    fn find_path_maps_world_positions_to_cells() {
        let grid = grid(&["....", "...."]);
        let route = grid
            .find_path(Vec2::new(4.0, 4.0), Vec2::new(40.0, 20.0), false)
            .expect("route");
        assert_eq!(route.first(), Some(&CellCoord::new(0, 0)));
        assert_eq!(route.last(), Some(&CellCoord::new(2, 1)));
        assert_eq!(grid.find_path(Vec2::new(-4.0, 4.0), Vec2::ZERO, false), None);
    }
}
