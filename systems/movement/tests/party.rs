use std::time::Duration;

use hexhold_core::{Catalog, HexVertex, OffsetCoord, StructureKind, Tile, UnitId};
use hexhold_system_movement::{Config, DispatchError, Movement, MovementEvent};
use hexhold_system_router::{path_length, Router};
use hexhold_world::{query, World};

const FRAME: Duration = Duration::from_millis(50);

fn settlement() -> World {
    let mut world = World::new(Catalog::standard());
    for y in 0..4 {
        for x in 0..10 {
            world
                .set_ground(OffsetCoord::new(x, y), Tile::Full)
                .expect("unowned");
        }
    }
    let _ = world
        .place_structure(StructureKind::Tavern, OffsetCoord::new(0, 1), None)
        .expect("tavern");
    let _ = world
        .place_structure(StructureKind::Dungeon, OffsetCoord::new(7, 1), None)
        .expect("dungeon");
    world
}

fn route(world: &World) -> Vec<HexVertex> {
    let mut router = Router::new();
    router.find_cell_path(
        OffsetCoord::new(0, 1),
        OffsetCoord::new(7, 1),
        &query::surface(world),
    )
}

fn party() -> Vec<UnitId> {
    (0..3).map(UnitId::new).collect()
}

/// Runs frames until the system is idle, recording `(frame, event)` pairs.
fn run_to_completion(movement: &mut Movement) -> Vec<(u32, MovementEvent)> {
    let mut log = Vec::new();
    for frame in 1..=2_000 {
        let mut events = Vec::new();
        movement.advance(FRAME, &mut events);
        log.extend(events.into_iter().map(|event| (frame, event)));
        if movement.is_idle() {
            break;
        }
    }
    log
}

#[test]
fn members_depart_one_delay_apart_and_all_arrive() {
    let world = settlement();
    let path = route(&world);
    assert!(!path.is_empty());
    let mut movement = Movement::new(Config::new(Duration::from_millis(200), 4.0));

    movement.dispatch(&party(), &path).expect("dispatched");
    let log = run_to_completion(&mut movement);

    let departures: Vec<(u32, UnitId)> = log
        .iter()
        .filter_map(|(frame, event)| match event {
            MovementEvent::Departed { unit, .. } => Some((*frame, *unit)),
            MovementEvent::Arrived { .. } => None,
        })
        .collect();
    assert_eq!(
        departures,
        vec![(4, UnitId::new(0)), (8, UnitId::new(1)), (12, UnitId::new(2))]
    );

    let goal = path.last().expect("path").position();
    let arrivals: Vec<UnitId> = log
        .iter()
        .filter_map(|(_, event)| match event {
            MovementEvent::Arrived { unit, at } => {
                assert_eq!(*at, goal);
                Some(*unit)
            }
            MovementEvent::Departed { .. } => None,
        })
        .collect();
    assert_eq!(arrivals, party());
    assert!(movement.is_idle());
}

#[test]
fn walking_time_matches_route_length() {
    let world = settlement();
    let path = route(&world);
    let speed = 2.0;
    let mut movement = Movement::new(Config::new(Duration::ZERO, speed));

    movement.dispatch(&[UnitId::new(7)], &path).expect("dispatched");
    let log = run_to_completion(&mut movement);

    let arrival_frame = log
        .iter()
        .find_map(|(frame, event)| match event {
            MovementEvent::Arrived { .. } => Some(*frame),
            MovementEvent::Departed { .. } => None,
        })
        .expect("arrival");
    let expected_seconds = path_length(&path) / speed;
    let elapsed = arrival_frame as f32 * FRAME.as_secs_f32();
    assert!(elapsed + 0.01 >= expected_seconds);
    assert!(elapsed < expected_seconds + FRAME.as_secs_f32() + 1e-3);
}

#[test]
fn replaying_a_dispatch_is_deterministic() {
    let world = settlement();
    let path = route(&world);

    let mut first = Movement::default();
    first.dispatch(&party(), &path).expect("dispatched");
    let mut second = Movement::default();
    second.dispatch(&party(), &path).expect("dispatched");

    assert_eq!(run_to_completion(&mut first), run_to_completion(&mut second));
}

#[test]
fn empty_paths_are_refused() {
    let mut movement = Movement::default();
    assert_eq!(
        movement.dispatch(&party(), &[]),
        Err(DispatchError::EmptyPath)
    );
    assert!(movement.is_idle());
}

#[test]
fn repeated_members_are_refused() {
    let world = settlement();
    let path = route(&world);
    let mut movement = Movement::default();
    let members = [UnitId::new(4), UnitId::new(5), UnitId::new(4)];

    assert_eq!(
        movement.dispatch(&members, &path),
        Err(DispatchError::DuplicateMember(UnitId::new(4)))
    );
    assert!(movement.is_idle());
}

#[test]
fn travelling_units_cannot_be_dispatched_twice() {
    let world = settlement();
    let path = route(&world);
    let mut movement = Movement::default();
    movement.dispatch(&party(), &path).expect("dispatched");

    assert_eq!(
        movement.dispatch(&[UnitId::new(1)], &path),
        Err(DispatchError::AlreadyTravelling(UnitId::new(1)))
    );
}

#[test]
fn cancelled_units_stop_without_arriving() {
    let world = settlement();
    let path = route(&world);
    let mut movement = Movement::default();
    movement.dispatch(&party(), &path).expect("dispatched");

    let mut events = Vec::new();
    movement.advance(Duration::from_millis(250), &mut events);
    assert!(movement.cancel(UnitId::new(0)));
    assert!(movement.cancel(UnitId::new(2)));
    assert!(!movement.cancel(UnitId::new(9)));

    let log = run_to_completion(&mut movement);
    let arrivals: Vec<UnitId> = log
        .iter()
        .filter_map(|(_, event)| match event {
            MovementEvent::Arrived { unit, .. } => Some(*unit),
            MovementEvent::Departed { .. } => None,
        })
        .collect();
    assert_eq!(arrivals, vec![UnitId::new(1)]);
}
