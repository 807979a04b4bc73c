//! Adjacency of the hex apex graph.
//!
//! Each apex touches three hexes. It connects to the three neighbouring
//! lattice points along the hex edges meeting at it, and to the three far
//! corners of each touching hex straight through that hex. All offsets below
//! are relative to the cell owning the apex; the tables for the bottom apex
//! are the point reflection of the top apex tables.

use hexhold_core::{Apex, CubicCoord, HexVertex, SurfaceQuery};

/// Move along a hex edge shared by two cells.
struct EdgeMove {
    target: CubicCoord,
    apex: Apex,
    sides: [CubicCoord; 2],
}

/// Moves straight through a single cell to its three far corners.
struct CellMoves {
    cell: CubicCoord,
    targets: [(CubicCoord, Apex); 3],
}

const fn at(x: i32, y: i32) -> CubicCoord {
    CubicCoord::from_xy(x, y)
}

static TOP_EDGES: [EdgeMove; 3] = [
    EdgeMove {
        target: at(-1, 2),
        apex: Apex::Bottom,
        sides: [at(0, 1), at(-1, 1)],
    },
    EdgeMove {
        target: at(0, 1),
        apex: Apex::Bottom,
        sides: [at(0, 0), at(0, 1)],
    },
    EdgeMove {
        target: at(-1, 1),
        apex: Apex::Bottom,
        sides: [at(0, 0), at(-1, 1)],
    },
];

static TOP_CELLS: [CellMoves; 3] = [
    CellMoves {
        cell: at(0, 0),
        targets: [(at(0, -1), Apex::Top), (at(0, 0), Apex::Bottom), (at(1, -1), Apex::Top)],
    },
    CellMoves {
        cell: at(0, 1),
        targets: [(at(0, 1), Apex::Top), (at(0, 2), Apex::Bottom), (at(1, 0), Apex::Top)],
    },
    CellMoves {
        cell: at(-1, 1),
        targets: [(at(-1, 0), Apex::Top), (at(-2, 2), Apex::Bottom), (at(-1, 1), Apex::Top)],
    },
];

static BOTTOM_EDGES: [EdgeMove; 3] = [
    EdgeMove {
        target: at(1, -2),
        apex: Apex::Top,
        sides: [at(1, -1), at(0, -1)],
    },
    EdgeMove {
        target: at(1, -1),
        apex: Apex::Top,
        sides: [at(0, 0), at(1, -1)],
    },
    EdgeMove {
        target: at(0, -1),
        apex: Apex::Top,
        sides: [at(0, 0), at(0, -1)],
    },
];

static BOTTOM_CELLS: [CellMoves; 3] = [
    CellMoves {
        cell: at(0, 0),
        targets: [(at(-1, 1), Apex::Bottom), (at(0, 0), Apex::Top), (at(0, 1), Apex::Bottom)],
    },
    CellMoves {
        cell: at(1, -1),
        targets: [(at(1, -1), Apex::Bottom), (at(2, -2), Apex::Top), (at(1, 0), Apex::Bottom)],
    },
    CellMoves {
        cell: at(0, -1),
        targets: [(at(-1, 0), Apex::Bottom), (at(0, -2), Apex::Top), (at(0, -1), Apex::Bottom)],
    },
];

/// Appends every traversable neighbour of `vertex` to `out`.
pub(crate) fn expand<S>(vertex: HexVertex, surface: &S, out: &mut Vec<HexVertex>)
where
    S: SurfaceQuery + ?Sized,
{
    let origin = vertex.cell();
    let (edges, cells) = match vertex.apex() {
        Apex::Top => (&TOP_EDGES, &TOP_CELLS),
        Apex::Bottom => (&BOTTOM_EDGES, &BOTTOM_CELLS),
    };

    for edge in edges {
        let [first, second] = edge.sides.map(|side| origin + side);
        if edge_open(surface, first, second) {
            out.push(HexVertex::new(origin + edge.target, edge.apex));
        }
    }

    for moves in cells {
        let cell = origin + moves.cell;
        if surface.ground(cell).is_full() && surface.is_clear(cell) {
            out.extend(
                moves
                    .targets
                    .iter()
                    .map(|(target, apex)| HexVertex::new(origin + *target, *apex)),
            );
        }
    }
}

/// An edge is walkable next to solid ground unless one structure owns both sides.
fn edge_open<S>(surface: &S, first: CubicCoord, second: CubicCoord) -> bool
where
    S: SurfaceQuery + ?Sized,
{
    if !surface.ground(first).is_full() && !surface.ground(second).is_full() {
        return false;
    }
    match surface.occupant(first) {
        Some(owner) => surface.occupant(second) != Some(owner),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexhold_core::{StructureId, Tile};
    use std::collections::BTreeSet;

    struct OpenField;

    impl SurfaceQuery for OpenField {
        fn ground(&self, _cell: CubicCoord) -> Tile {
            Tile::Full
        }

        fn is_clear(&self, _cell: CubicCoord) -> bool {
            true
        }

        fn occupant(&self, _cell: CubicCoord) -> Option<StructureId> {
            None
        }
    }

    fn neighbours(vertex: HexVertex) -> Vec<HexVertex> {
        let mut out = Vec::new();
        expand(vertex, &OpenField, &mut out);
        out
    }

    #[test]
    fn every_apex_has_twelve_distinct_neighbours_in_the_open() {
        for vertex in [
            HexVertex::top(CubicCoord::from_xy(2, -3)),
            HexVertex::bottom(CubicCoord::from_xy(-1, 4)),
        ] {
            let unique: BTreeSet<_> = neighbours(vertex).into_iter().collect();
            assert_eq!(unique.len(), 12);
            assert!(!unique.contains(&vertex));
        }
    }

    #[test]
    fn edge_moves_have_unit_length() {
        let vertex = HexVertex::top(CubicCoord::ZERO);
        let edge_lengths = neighbours(vertex)
            .iter()
            .filter(|next| (vertex.distance(next) - 1.0).abs() < 1e-4)
            .count();
        assert_eq!(edge_lengths, 3);
    }

    #[test]
    fn adjacency_is_symmetric() {
        for vertex in [
            HexVertex::top(CubicCoord::from_xy(0, 0)),
            HexVertex::bottom(CubicCoord::from_xy(3, -1)),
        ] {
            for next in neighbours(vertex) {
                assert!(
                    neighbours(next).contains(&vertex),
                    "{next:?} does not lead back to {vertex:?}"
                );
            }
        }
    }
}
