use hexhold_core::{
    Catalog, CubicCoord, HexVertex, OffsetCoord, StructureKind, StructureTemplate, Tile,
};
use hexhold_system_router::{path_length, Router};
use hexhold_world::{query, World};

fn corridor(columns: i32, rows: i32) -> World {
    let mut world = World::new(Catalog::standard());
    for y in 0..rows {
        for x in 0..columns {
            world
                .set_ground(OffsetCoord::new(x, y), Tile::Full)
                .expect("unowned");
        }
    }
    world
}

fn is_vertex_of(vertex: &HexVertex, cell: OffsetCoord) -> bool {
    let center = cell.to_cubic().center();
    (vertex.position().distance(center) - 1.0).abs() < 1e-4
}

#[test]
fn corridor_paths_exist_in_both_directions_with_equal_length() {
    let world = corridor(8, 3);
    let surface = query::surface(&world);
    let mut router = Router::new();
    let a = OffsetCoord::new(0, 1);
    let b = OffsetCoord::new(7, 1);

    let forward = router.find_cell_path(a, b, &surface);
    let backward = router.find_cell_path(b, a, &surface);

    assert!(!forward.is_empty());
    assert!(!backward.is_empty());
    assert!((path_length(&forward) - path_length(&backward)).abs() < 1e-3);
}

#[test]
fn path_endpoints_touch_the_requested_cells() {
    let world = corridor(6, 2);
    let surface = query::surface(&world);
    let mut router = Router::new();
    let start = OffsetCoord::new(0, 0);
    let goal = OffsetCoord::new(5, 1);

    let path = router.find_cell_path(start, goal, &surface);

    let first = path.first().expect("path");
    let last = path.last().expect("path");
    assert!(is_vertex_of(first, start));
    assert!(is_vertex_of(last, goal));
}

#[test]
fn routes_never_cut_through_structures() {
    let mut world = corridor(9, 4);
    let _ = world
        .place_structure(StructureKind::Dungeon, OffsetCoord::new(4, 1), None)
        .expect("placed");
    let blocked = query::tiles(&world, query::owner(&world, OffsetCoord::new(4, 1)).expect("owner"));
    let surface = query::surface(&world);
    let mut router = Router::new();

    let path = router.find_cell_path(OffsetCoord::new(0, 1), OffsetCoord::new(8, 2), &surface);

    assert!(!path.is_empty());
    for pair in path.windows(2) {
        let step = pair[0].distance(&pair[1]);
        if step <= 1.01 {
            continue;
        }
        let midpoint = (pair[0].position() + pair[1].position()) * 0.5;
        for tile in &blocked {
            let center = tile.to_cubic().center();
            assert!(
                midpoint.distance(center) > 0.6,
                "step {pair:?} crosses occupied cell {tile:?}"
            );
        }
    }
}

#[test]
fn obstacles_only_lengthen_routes() {
    let open = corridor(9, 4);
    let mut blocked = corridor(9, 4);
    let _ = blocked
        .place_structure(StructureKind::Dungeon, OffsetCoord::new(4, 1), None)
        .expect("placed");
    let mut router = Router::new();
    let start = OffsetCoord::new(0, 1);
    let goal = OffsetCoord::new(8, 1);

    let direct = router.find_cell_path(start, goal, &query::surface(&open));
    let detour = router.find_cell_path(start, goal, &query::surface(&blocked));

    assert!(!detour.is_empty());
    assert!(path_length(&detour) + 1e-3 >= path_length(&direct));
}

#[test]
fn edges_inside_a_single_structure_are_blocked() {
    let mut catalog = Catalog::new();
    let ring: Vec<CubicCoord> = hexhold_core::disk(CubicCoord::ZERO, 1).collect();
    let _ = catalog.insert(StructureTemplate::solid(StructureKind::Dungeon, &ring));
    let mut world = World::new(catalog);
    for offset in hexhold_core::disk(CubicCoord::ZERO, 3).map(CubicCoord::to_offset) {
        world.set_ground(offset, Tile::Full).expect("unowned");
    }
    let _ = world
        .place_structure(StructureKind::Dungeon, OffsetCoord::new(0, 0), None)
        .expect("placed");
    let surface = query::surface(&world);
    let mut router = Router::new();

    let into_the_middle = router.find_path(
        HexVertex::top(CubicCoord::from_xy(2, -2)),
        HexVertex::top(CubicCoord::ZERO),
        &surface,
    );

    assert!(into_the_middle.is_empty());
}

#[test]
fn disconnected_islands_have_no_route() {
    let mut world = corridor(3, 3);
    world
        .set_ground(OffsetCoord::new(12, 12), Tile::Full)
        .expect("unowned");
    let surface = query::surface(&world);
    let mut router = Router::new();

    let path = router.find_cell_path(OffsetCoord::new(0, 0), OffsetCoord::new(12, 12), &surface);

    assert!(path.is_empty());
}
