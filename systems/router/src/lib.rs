#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! A* path router over the apex graph of the hex surface.
//!
//! Units walk along hex edges and straight across clear cells rather than
//! from cell center to cell center, so the search nodes are the top and bottom
//! apexes of each hex. Edge cost and heuristic are both the planar Euclidean
//! distance between apexes, which keeps the heuristic admissible.

mod edges;

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
};

use hexhold_core::{HexVertex, OffsetCoord, SurfaceQuery};
use tracing::trace;

/// Reusable A* search state.
///
/// Scratch buffers are kept between searches to avoid reallocating on every
/// request.
#[derive(Debug, Default)]
pub struct Router {
    open: BinaryHeap<Frontier>,
    best_g: HashMap<HexVertex, f32>,
    parents: HashMap<HexVertex, HexVertex>,
    closed: HashSet<HexVertex>,
    neighbours: Vec<HexVertex>,
}

impl Router {
    /// Creates a router with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the cheapest apex sequence from `start` to `goal`, both inclusive.
    ///
    /// Returns an empty vector when the goal cannot be reached.
    pub fn find_path<S>(&mut self, start: HexVertex, goal: HexVertex, surface: &S) -> Vec<HexVertex>
    where
        S: SurfaceQuery + ?Sized,
    {
        let Self {
            open,
            best_g,
            parents,
            closed,
            neighbours,
        } = self;
        open.clear();
        best_g.clear();
        parents.clear();
        closed.clear();

        let mut sequence = 0_u64;
        let _ = best_g.insert(start, 0.0);
        open.push(Frontier {
            f_cost: start.distance(&goal),
            sequence,
            vertex: start,
        });

        while let Some(Frontier { vertex, .. }) = open.pop() {
            if !closed.insert(vertex) {
                continue;
            }
            if vertex == goal {
                trace!(expanded = closed.len(), "path found");
                return reconstruct(parents, goal);
            }

            let g_cost = best_g.get(&vertex).copied().unwrap_or(f32::INFINITY);
            neighbours.clear();
            edges::expand(vertex, surface, neighbours);
            for next in neighbours.iter().copied() {
                if closed.contains(&next) {
                    continue;
                }
                let tentative = g_cost + vertex.distance(&next);
                if best_g.get(&next).is_some_and(|known| tentative >= *known) {
                    continue;
                }
                let _ = best_g.insert(next, tentative);
                let _ = parents.insert(next, vertex);
                sequence += 1;
                open.push(Frontier {
                    f_cost: tentative + next.distance(&goal),
                    sequence,
                    vertex: next,
                });
            }
        }

        trace!(expanded = closed.len(), "open set exhausted without reaching goal");
        Vec::new()
    }

    /// Routes between two cells using the bottom apex of each as endpoints.
    pub fn find_cell_path<S>(
        &mut self,
        start: OffsetCoord,
        goal: OffsetCoord,
        surface: &S,
    ) -> Vec<HexVertex>
    where
        S: SurfaceQuery + ?Sized,
    {
        self.find_path(
            HexVertex::bottom(start.to_cubic()),
            HexVertex::bottom(goal.to_cubic()),
            surface,
        )
    }
}

/// Total Euclidean length of a routed path.
#[must_use]
pub fn path_length(path: &[HexVertex]) -> f32 {
    path.windows(2)
        .map(|pair| pair[0].distance(&pair[1]))
        .sum()
}

fn reconstruct(parents: &HashMap<HexVertex, HexVertex>, goal: HexVertex) -> Vec<HexVertex> {
    let mut path = vec![goal];
    let mut cursor = goal;
    while let Some(parent) = parents.get(&cursor) {
        path.push(*parent);
        cursor = *parent;
    }
    path.reverse();
    path
}

/// Open-set entry ordered so the heap pops the lowest f-cost first, then the
/// earliest insertion.
#[derive(Clone, Copy, Debug)]
struct Frontier {
    f_cost: f32,
    sequence: u64,
    vertex: HexVertex,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_cost
            .total_cmp(&self.f_cost)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

#[cfg(test)]
mod tests {
    use super::*;
    use hexhold_core::{CubicCoord, StructureId, Tile};

    struct Island {
        radius: u32,
    }

    impl SurfaceQuery for Island {
        fn ground(&self, cell: CubicCoord) -> Tile {
            if cell.distance(CubicCoord::ZERO) <= self.radius {
                Tile::Full
            } else {
                Tile::Empty
            }
        }

        fn is_clear(&self, _cell: CubicCoord) -> bool {
            true
        }

        fn occupant(&self, _cell: CubicCoord) -> Option<StructureId> {
            None
        }
    }

    #[test]
    fn frontier_pops_lowest_cost_then_oldest() {
        let vertex = HexVertex::top(CubicCoord::ZERO);
        let mut heap = BinaryHeap::new();
        heap.push(Frontier { f_cost: 2.0, sequence: 0, vertex });
        heap.push(Frontier { f_cost: 1.0, sequence: 2, vertex });
        heap.push(Frontier { f_cost: 1.0, sequence: 1, vertex });

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|entry| entry.sequence)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn start_equal_to_goal_yields_single_vertex() {
        let mut router = Router::new();
        let vertex = HexVertex::bottom(CubicCoord::ZERO);
        assert_eq!(router.find_path(vertex, vertex, &Island { radius: 1 }), vec![vertex]);
    }

    #[test]
    fn crossing_a_clear_cell_takes_the_direct_line() {
        let mut router = Router::new();
        let cell = CubicCoord::ZERO;
        let path = router.find_path(
            HexVertex::top(cell),
            HexVertex::bottom(cell),
            &Island { radius: 0 },
        );
        assert_eq!(path.len(), 2);
        assert!((path_length(&path) - 2.0).abs() < 1e-4);
    }

    #[test]
    fn off_island_goal_is_unreachable() {
        let mut router = Router::new();
        let path = router.find_path(
            HexVertex::top(CubicCoord::ZERO),
            HexVertex::top(CubicCoord::from_xy(9, -4)),
            &Island { radius: 2 },
        );
        assert!(path.is_empty());
    }
}
