//! Single-source A* search over the sector grid.
//!
//! Supports a bounded depth cutoff for cheap local detours and an
//! unbounded search for long-range planning. Identical grid state and
//! endpoints always produce the identical path: the open list orders
//! entries by a full composite key with an insertion-sequence tie-break,
//! and neighbors are enumerated in a fixed order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::env::MapOracle;
use crate::state::{PathSearch, Position, Route};

const STRAIGHT_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

/// How far a search may roam before giving up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchDepth {
    /// Cheap local detour: cost budget of roughly `max_depth` steps.
    Bounded(u32),
    /// Unbounded long-range search.
    Full,
}

impl SearchDepth {
    pub fn is_bounded(self) -> bool {
        matches!(self, SearchDepth::Bounded(_))
    }
}

/// Dense ordered path produced by one A* run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathResult {
    cells: Vec<Position>,
    /// True when the depth bound was hit before the target was reached;
    /// the cells then lead toward the closest reachable sector instead.
    pub exhausted: bool,
}

impl PathResult {
    /// Every cell on the path, start included.
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    /// The movement steps (start excluded).
    pub fn steps(&self) -> &[Position] {
        &self.cells[1..]
    }

    /// Derive the consumable route: one coordinate step per tick.
    pub fn to_route(&self) -> Route {
        Route::new(self.steps().to_vec())
    }

    /// Derive the in-flight search state owned by the fleet.
    pub fn to_search(&self, bounded: bool) -> PathSearch {
        PathSearch::new(self.steps().to_vec(), self.exhausted, bounded)
    }
}

#[derive(Debug)]
struct OpenNode {
    f: u32,
    g: u32,
    cell: Position,
    tie: u64,
}

impl OpenNode {
    fn key(&self) -> (u32, u32, Position, u64) {
        (self.f, self.g, self.cell, self.tie)
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other.key().cmp(&self.key())
    }
}

// Fixed enumeration order for determinism: N, NE, E, SE, S, SW, W, NW.
const NEIGHBOR_DELTAS: [(i32, i32, u32); 8] = [
    (0, -1, STRAIGHT_COST),
    (1, -1, DIAGONAL_COST),
    (1, 0, STRAIGHT_COST),
    (1, 1, DIAGONAL_COST),
    (0, 1, STRAIGHT_COST),
    (-1, 1, DIAGONAL_COST),
    (-1, 0, STRAIGHT_COST),
    (-1, -1, DIAGONAL_COST),
];

/// Exact straight-line distance on an 8-way grid with 10/14 step costs.
fn heuristic(a: Position, b: Position) -> u32 {
    let dx = (a.x - b.x).unsigned_abs();
    let dy = (a.y - b.y).unsigned_abs();
    let diagonal = dx.min(dy);
    let straight = dx.max(dy) - diagonal;
    DIAGONAL_COST * diagonal + STRAIGHT_COST * straight
}

/// Run a single A* search from `start` to `goal`.
///
/// Returns `None` when no path exists at all (or the endpoints are
/// invalid). A bounded search that hits its budget returns the partial
/// path toward the closest expanded sector with `exhausted` set.
pub fn find_path<M>(map: &M, start: Position, goal: Position, depth: SearchDepth) -> Option<PathResult>
where
    M: MapOracle + ?Sized,
{
    let dims = map.dimensions();
    if !dims.contains(start) || !dims.contains(goal) {
        return None;
    }
    if map.is_blocked(start) || map.is_blocked(goal) {
        return None;
    }
    if start == goal {
        return Some(PathResult {
            cells: vec![start],
            exhausted: false,
        });
    }

    let width = dims.width as i32;
    let grid_len = (dims.width * dims.height) as usize;
    let index_of = |cell: Position| (cell.y * width + cell.x) as usize;
    let cell_of = |index: usize| Position::new(index as i32 % width, index as i32 / width);

    let cost_budget = match depth {
        SearchDepth::Bounded(max_depth) => Some(max_depth.saturating_mul(DIAGONAL_COST)),
        SearchDepth::Full => None,
    };

    let mut g_score = vec![u32::MAX; grid_len];
    let mut came_from: Vec<Option<usize>> = vec![None; grid_len];
    let mut open = BinaryHeap::<OpenNode>::new();
    let mut tie: u64 = 0;

    g_score[index_of(start)] = 0;
    let h0 = heuristic(start, goal);
    open.push(OpenNode {
        f: h0,
        g: 0,
        cell: start,
        tie,
    });
    tie += 1;

    // Closest-approach candidate for exhausted bounded searches.
    let mut best = (h0, 0u32, start);

    while let Some(node) = open.pop() {
        if node.cell == goal {
            let cells = reconstruct(&came_from, index_of(goal), cell_of);
            return Some(PathResult {
                cells,
                exhausted: false,
            });
        }

        let node_index = index_of(node.cell);
        if node.g != g_score[node_index] {
            // Stale heap entry.
            continue;
        }

        for (dx, dy, step_cost) in NEIGHBOR_DELTAS {
            let next = Position::new(node.cell.x + dx, node.cell.y + dy);
            if !dims.contains(next) || map.is_blocked(next) {
                continue;
            }

            let tentative = node.g.saturating_add(step_cost);
            if let Some(budget) = cost_budget {
                if tentative > budget {
                    continue;
                }
            }

            let next_index = index_of(next);
            if tentative >= g_score[next_index] {
                continue;
            }

            came_from[next_index] = Some(node_index);
            g_score[next_index] = tentative;
            let h = heuristic(next, goal);
            if (h, tentative, next) < best {
                best = (h, tentative, next);
            }
            open.push(OpenNode {
                f: tentative.saturating_add(h),
                g: tentative,
                cell: next,
                tie,
            });
            tie += 1;
        }
    }

    match depth {
        SearchDepth::Full => None,
        SearchDepth::Bounded(_) => {
            let (_, _, closest) = best;
            if closest == start {
                return None;
            }
            let cells = reconstruct(&came_from, index_of(closest), cell_of);
            Some(PathResult {
                cells,
                exhausted: true,
            })
        }
    }
}

fn reconstruct(
    came_from: &[Option<usize>],
    mut current: usize,
    cell_of: impl Fn(usize) -> Position,
) -> Vec<Position> {
    let mut out = vec![current];
    while let Some(previous) = came_from[current] {
        current = previous;
        out.push(current);
    }
    out.reverse();
    out.into_iter().map(cell_of).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::GridMap;

    #[test]
    fn identical_inputs_produce_identical_paths() {
        let mut map = GridMap::open(12, 12);
        map.block_column(5, 2, 9);

        let first = find_path(&map, Position::new(1, 6), Position::new(10, 6), SearchDepth::Full)
            .unwrap();
        let second = find_path(&map, Position::new(1, 6), Position::new(10, 6), SearchDepth::Full)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn steps_are_always_adjacent() {
        let mut map = GridMap::open(10, 10);
        map.block_column(4, 0, 7);

        let path = find_path(&map, Position::new(1, 1), Position::new(8, 1), SearchDepth::Full)
            .unwrap();
        let cells = path.cells();
        for pair in cells.windows(2) {
            assert!(pair[0].is_adjacent(pair[1]), "{} !~ {}", pair[0], pair[1]);
        }
        assert_eq!(*cells.last().unwrap(), Position::new(8, 1));
    }

    #[test]
    fn full_search_reports_unreachable_as_none() {
        let mut map = GridMap::open(8, 8);
        map.block_column(3, 0, 7);
        assert_eq!(
            find_path(&map, Position::new(1, 1), Position::new(6, 1), SearchDepth::Full),
            None
        );
    }

    #[test]
    fn bounded_search_returns_partial_path_with_flag() {
        let mut map = GridMap::open(20, 3);
        map.block_column(10, 0, 2);
        // The wall seals the corridor; a depth-3 detour cannot reach.
        let path = find_path(
            &map,
            Position::new(0, 1),
            Position::new(19, 1),
            SearchDepth::Bounded(3),
        )
        .unwrap();
        assert!(path.exhausted);
        assert!(!path.steps().is_empty());
        // Cost budget of 3 diagonal steps caps the partial path at 4 cells.
        assert!(path.steps().len() <= 4);
    }

    #[test]
    fn bounded_search_with_no_exit_is_none() {
        let mut map = GridMap::open(5, 5);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx != 0 || dy != 0 {
                    map.block(Position::new(2 + dx, 2 + dy));
                }
            }
        }
        assert_eq!(
            find_path(&map, Position::new(2, 2), Position::new(4, 4), SearchDepth::Bounded(4)),
            None
        );
    }

    #[test]
    fn trivial_search_is_a_single_cell() {
        let map = GridMap::open(4, 4);
        let path = find_path(&map, Position::new(2, 2), Position::new(2, 2), SearchDepth::Full)
            .unwrap();
        assert!(path.steps().is_empty());
        assert!(!path.exhausted);
        assert!(path.to_route().is_exhausted());
    }
}
