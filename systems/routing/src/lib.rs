#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns tile grids into deterministic enemy routes.
//!
//! Routes are computed once per grid with a breadth-first search over the
//! 4-connected walkable tiles. The FIFO frontier makes tie-breaking
//! first-discovered-wins, so the same grid always yields the same routes.

use std::collections::{BTreeMap, VecDeque};

use rampart_core::{RouteId, TileCoord, TileGrid};

/// Neighbor offsets probed in order: up, down, left, right.
const NEIGHBOR_STEPS: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Breadth-first route planner that reuses scratch buffers across searches.
#[derive(Debug, Default)]
pub struct RoutePlanner {
    visited: Vec<bool>,
    parents: Vec<u32>,
    frontier: VecDeque<u32>,
}

impl RoutePlanner {
    /// Creates a new planner with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the shortest-hop route from `start` to `end` over walkable
    /// tiles, returning an empty route when no connection exists.
    ///
    /// Neighbors are expanded up, down, left, right; with the FIFO frontier
    /// this fixes which of several equally short routes is produced.
    pub fn compute_route(
        &mut self,
        grid: &TileGrid,
        start: TileCoord,
        end: TileCoord,
    ) -> Vec<TileCoord> {
        let columns = grid.columns();
        let rows = grid.rows();
        let node_count = match usize::try_from(u64::from(columns) * u64::from(rows)) {
            Ok(count) => count,
            Err(_) => return Vec::new(),
        };
        if node_count == 0 {
            return Vec::new();
        }
        let start_index = match flat_index(start, columns, rows) {
            Some(index) => index,
            None => return Vec::new(),
        };
        let end_index = match flat_index(end, columns, rows) {
            Some(index) => index,
            None => return Vec::new(),
        };

        self.prepare_workspace(node_count);
        self.visited[start_index as usize] = true;
        self.frontier.push_back(start_index);

        while let Some(current) = self.frontier.pop_front() {
            if current == end_index {
                break;
            }
            let column = i64::from(current % columns);
            let row = i64::from(current / columns);
            for (dc, dr) in NEIGHBOR_STEPS {
                let next_column = column + dc;
                let next_row = row + dr;
                if next_column < 0
                    || next_row < 0
                    || next_column >= i64::from(columns)
                    || next_row >= i64::from(rows)
                {
                    continue;
                }
                let next = TileCoord::new(next_column as u32, next_row as u32);
                let next_index = next_row as u32 * columns + next_column as u32;
                if self.visited[next_index as usize] {
                    continue;
                }
                if !grid.is_walkable(next) {
                    continue;
                }
                self.visited[next_index as usize] = true;
                self.parents[next_index as usize] = current;
                self.frontier.push_back(next_index);
            }
        }

        if !self.visited[end_index as usize] {
            return Vec::new();
        }

        let mut route = Vec::new();
        let mut cursor = end_index;
        loop {
            route.push(TileCoord::new(cursor % columns, cursor / columns));
            if cursor == start_index {
                break;
            }
            cursor = self.parents[cursor as usize];
        }
        route.reverse();
        route
    }

    fn prepare_workspace(&mut self, node_count: usize) {
        self.visited.clear();
        self.visited.resize(node_count, false);
        self.parents.clear();
        self.parents.resize(node_count, u32::MAX);
        self.frontier.clear();
    }
}

/// Computes a single route with a throwaway planner.
#[must_use]
pub fn compute_route(grid: &TileGrid, start: TileCoord, end: TileCoord) -> Vec<TileCoord> {
    RoutePlanner::new().compute_route(grid, start, end)
}

/// All routes of a grid, keyed by the label shared by start and end tiles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteSet {
    routes: BTreeMap<RouteId, Vec<TileCoord>>,
}

impl RouteSet {
    /// Computes routes for every start tile whose label has a matching end
    /// tile. An unpaired start or end yields no entry; a pair with no
    /// walkable connection yields an empty route.
    #[must_use]
    pub fn build(grid: &TileGrid) -> Self {
        let ends: BTreeMap<RouteId, TileCoord> = grid.end_tiles().into_iter().collect();
        let mut planner = RoutePlanner::new();
        let mut routes = BTreeMap::new();
        for (route, start) in grid.start_tiles() {
            if let Some(end) = ends.get(&route) {
                let _ = routes.insert(route, planner.compute_route(grid, start, *end));
            }
        }
        Self { routes }
    }

    /// Route tiles for the provided label, if the label is paired.
    #[must_use]
    pub fn route(&self, id: RouteId) -> Option<&[TileCoord]> {
        self.routes.get(&id).map(Vec::as_slice)
    }

    /// Iterator over every route in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (RouteId, &[TileCoord])> {
        self.routes
            .iter()
            .map(|(route, tiles)| (*route, tiles.as_slice()))
    }

    /// Finds the route containing the provided tile, together with the
    /// tile's node index on that route. Routes are probed in ascending
    /// label order so overlapping routes resolve deterministically.
    #[must_use]
    pub fn route_containing(&self, tile: TileCoord) -> Option<(RouteId, usize)> {
        for (route, tiles) in self.routes.iter() {
            if let Some(index) = tiles.iter().position(|node| *node == tile) {
                return Some((*route, index));
            }
        }
        None
    }

    /// True when no route was built at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Selects a contiguous window of `count` route nodes centered on `center`.
///
/// The window is shifted instead of truncated when the center sits within
/// `count / 2` nodes of either route end, so it only shrinks below `count`
/// when the route itself is shorter. Returns the node indices of the first
/// and last covered nodes, or `None` when the route is empty.
#[must_use]
pub fn centered_window(route_len: usize, center: usize, count: usize) -> Option<(usize, usize)> {
    if route_len == 0 || count == 0 || center >= route_len {
        return None;
    }
    let half = count / 2;
    let last = route_len - 1;
    let mut start = center.saturating_sub(half);
    let mut end = start + count - 1;
    if center < half {
        start = 0;
        end = (count - 1).min(last);
    }
    if end > last {
        end = last;
        start = end.saturating_sub(count - 1);
    }
    Some((start, end))
}

fn flat_index(tile: TileCoord, columns: u32, rows: u32) -> Option<u32> {
    if tile.column() < columns && tile.row() < rows {
        Some(tile.row() * columns + tile.column())
    } else {
        None
    }
}
