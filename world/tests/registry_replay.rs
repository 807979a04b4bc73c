use std::collections::{BTreeMap, BTreeSet};

use hexhold_core::{
    Catalog, Command, Event, OffsetCoord, RemovalTarget, Stockpile, StructureId, StructureKind,
    Tile,
};
use hexhold_world::{self as world, query, World};
use proptest::prelude::*;

#[test]
fn deterministic_replay_produces_identical_registries() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.structures.len(), 4);
}

#[test]
fn registries_agree_after_scripted_edits() {
    let mut world = World::new(Catalog::standard());
    let mut economy = Stockpile::unlimited();
    for command in scripted_commands() {
        let mut events = Vec::new();
        world::apply(&mut world, &mut economy, command, &mut events);
        assert_registries_consistent(&world);
    }
}

#[test]
fn rejected_commands_leave_registries_unchanged() {
    let mut world = World::new(Catalog::standard());
    let mut economy = Stockpile::unlimited();
    for command in scripted_commands() {
        let mut events = Vec::new();
        world::apply(&mut world, &mut economy, command, &mut events);
    }
    let before = capture(&world);

    let rejected = [
        place(StructureKind::Dungeon, 0, 0),
        place(StructureKind::Hut, 40, 40),
        Command::RemoveStructure {
            target: RemovalTarget::Tile(OffsetCoord::new(-5, -5)),
            settle: true,
        },
        Command::RemoveStructure {
            target: RemovalTarget::Structure(StructureId::new(0)),
            settle: true,
        },
    ];
    for command in rejected {
        let mut events = Vec::new();
        world::apply(&mut world, &mut economy, command, &mut events);
        assert!(
            events.iter().all(|event| matches!(
                event,
                Event::PlacementRejected { .. } | Event::RemovalRejected { .. }
            )),
            "unexpected events: {events:?}"
        );
    }

    assert_eq!(capture(&world), before);
}

proptest! {
    #[test]
    fn placement_is_all_or_nothing(
        voids in proptest::collection::vec((-3i32..=3, -3i32..=3), 0..12),
        attempts in proptest::collection::vec((0usize..6, -3i32..=3, -3i32..=3), 1..24),
    ) {
        let mut world = World::new(Catalog::standard());
        let mut economy = Stockpile::unlimited();
        for y in -3..=3 {
            for x in -3..=3 {
                prop_assert!(world.set_ground(OffsetCoord::new(x, y), Tile::Full).is_ok());
            }
        }
        for (x, y) in voids {
            prop_assert!(world.set_ground(OffsetCoord::new(x, y), Tile::Empty).is_ok());
        }

        for (kind, x, y) in attempts {
            let before = capture(&world);
            let kind = StructureKind::ALL[kind];
            let mut events = Vec::new();
            world::apply(&mut world, &mut economy, place(kind, x, y), &mut events);

            match events.as_slice() {
                [Event::StructurePlaced { tiles, .. }] => {
                    prop_assert!(!tiles.is_empty());
                }
                [Event::PlacementRejected { .. }] => prop_assert_eq!(capture(&world), before),
                other => prop_assert!(false, "unexpected events {:?}", other),
            }
            assert_registries_consistent(&world);
        }
    }
}

fn place(kind: StructureKind, x: i32, y: i32) -> Command {
    Command::PlaceStructure {
        kind,
        anchor: OffsetCoord::new(x, y),
        settle: true,
    }
}

fn scripted_commands() -> Vec<Command> {
    let mut commands = Vec::new();
    for y in -4..=4 {
        for x in -4..=4 {
            commands.push(Command::SetGround {
                offset: OffsetCoord::new(x, y),
                tile: Tile::Full,
            });
        }
    }
    commands.push(Command::SetFeature {
        offset: OffsetCoord::new(3, 3),
        tile: Tile::Full,
    });
    commands.push(place(StructureKind::MainTower, 0, 0));
    commands.push(place(StructureKind::Tavern, -3, 2));
    commands.push(place(StructureKind::Hut, 2, -2));
    commands.push(place(StructureKind::Hut, 3, 3));
    commands.push(place(StructureKind::WizardTower, -2, -2));
    commands.push(place(StructureKind::Farm, 4, 0));
    commands.push(Command::RemoveStructure {
        target: RemovalTarget::Tile(OffsetCoord::new(2, -2)),
        settle: true,
    });
    commands.push(Command::UpgradeStructure {
        structure: StructureId::new(3),
        settle: true,
    });
    commands
}

#[derive(Debug, PartialEq, Eq)]
struct ReplayOutcome {
    structures: Vec<(StructureId, StructureKind, Vec<OffsetCoord>)>,
    events: Vec<String>,
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let mut world = World::new(Catalog::standard());
    let mut economy = Stockpile::unlimited();
    let mut log = Vec::new();
    for command in commands {
        let mut events = Vec::new();
        world::apply(&mut world, &mut economy, command, &mut events);
        log.extend(events.iter().map(|event| format!("{event:?}")));
    }

    let structures = query::structure_view(&world)
        .into_vec()
        .into_iter()
        .map(|snapshot| (snapshot.id, snapshot.kind, snapshot.tiles))
        .collect();
    ReplayOutcome {
        structures,
        events: log,
    }
}

#[derive(Debug, PartialEq, Eq)]
struct RegistryCapture {
    owners: BTreeMap<OffsetCoord, Option<StructureId>>,
    tiles: BTreeMap<StructureId, Vec<OffsetCoord>>,
    kinds: BTreeMap<StructureKind, Vec<StructureId>>,
}

fn capture(world: &World) -> RegistryCapture {
    let view = query::structure_view(world);
    let mut owners = BTreeMap::new();
    let mut tiles = BTreeMap::new();
    for snapshot in view.iter() {
        for tile in &snapshot.tiles {
            let _ = owners.insert(*tile, query::owner(world, *tile));
        }
        let _ = tiles.insert(snapshot.id, query::tiles(world, snapshot.id));
    }
    let kinds = StructureKind::ALL
        .into_iter()
        .map(|kind| (kind, query::structures_of_kind(world, kind).to_vec()))
        .collect();
    RegistryCapture {
        owners,
        tiles,
        kinds,
    }
}

fn assert_registries_consistent(world: &World) {
    let view = query::structure_view(world);
    let mut claimed = BTreeSet::new();
    for snapshot in view.iter() {
        assert!(!snapshot.tiles.is_empty(), "{:?} owns no tiles", snapshot.id);
        for tile in &snapshot.tiles {
            assert_eq!(query::owner(world, *tile), Some(snapshot.id));
            assert!(claimed.insert(*tile), "{tile:?} claimed twice");
        }
        let bucket = query::structures_of_kind(world, snapshot.kind);
        assert_eq!(
            bucket.iter().filter(|id| **id == snapshot.id).count(),
            1,
            "{:?} missing from its kind bucket",
            snapshot.id
        );
    }
    let bucketed: usize = StructureKind::ALL
        .into_iter()
        .map(|kind| query::structures_of_kind(world, kind).len())
        .sum();
    assert_eq!(bucketed, view.iter().count());
}
