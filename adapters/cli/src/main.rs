#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that loads a settlement and runs edits and queries against it.

mod layout_transfer;
mod scenario;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hexhold_core::{
    Command, Event, LayoutEntry, OffsetCoord, RemovalTarget, Stockpile, StructureId,
    StructureKind, UnitId,
};
use hexhold_system_bootstrap::Bootstrap;
use hexhold_system_movement::{Config, Movement, MovementEvent};
use hexhold_system_range::{overlay, reachable, RangeValidator};
use hexhold_system_router::{path_length, Router};
use hexhold_world::{self as world, query, World};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::scenario::Scenario;

/// Simulation step used when walking parties along a route.
const FRAME: Duration = Duration::from_millis(50);
/// Upper bound on simulated frames for a single party.
const MAX_FRAMES: u32 = 100_000;

/// Hex settlement sandbox.
#[derive(Debug, Parser)]
#[command(name = "hexhold", version, about = "Build and inspect a hex-grid settlement")]
struct Cli {
    /// TOML scenario describing the map, economy and catalog.
    #[arg(long, short = 's', global = true)]
    scenario: Option<PathBuf>,

    /// Layout string (`hexhold:v1:...`) replayed before the command runs.
    #[arg(long, short = 'l', global = true)]
    layout: Option<String>,

    /// Production ticks credited to the stockpile before the command runs.
    #[arg(long, global = true, default_value_t = 0)]
    ticks: u32,

    /// Raise log verbosity; repeat for more detail.
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Summarise structures, resources and production.
    Show,
    /// Place a structure anchored at a cell (`x,y`).
    Place {
        /// Structure kind, e.g. `hut` or `wizard-tower`.
        kind: StructureKind,
        /// Anchor cell.
        #[arg(value_parser = parse_offset, allow_hyphen_values = true)]
        at: OffsetCoord,
    },
    /// Remove the structure covering a cell (`x,y`).
    Remove {
        /// Any cell of the structure.
        #[arg(value_parser = parse_offset, allow_hyphen_values = true)]
        at: OffsetCoord,
    },
    /// Upgrade the structure covering a cell (`x,y`) to its next tier.
    Upgrade {
        /// Any cell of the structure.
        #[arg(value_parser = parse_offset, allow_hyphen_values = true)]
        at: OffsetCoord,
    },
    /// Find a walking route between two cells and optionally send a party along it.
    Route {
        /// Starting cell.
        #[arg(value_parser = parse_offset, allow_hyphen_values = true)]
        from: OffsetCoord,
        /// Destination cell.
        #[arg(value_parser = parse_offset, allow_hyphen_values = true)]
        to: OffsetCoord,
        /// Number of party members to walk the route.
        #[arg(long, default_value_t = 0)]
        party: u32,
        /// Delay between departing members in milliseconds.
        #[arg(long, default_value_t = 200)]
        delay_ms: u64,
        /// Walking speed in world units per second.
        #[arg(long, default_value_t = 1.0)]
        speed: f32,
    },
    /// List the cells covered by range emitters.
    Coverage,
    /// Print the current layout as a transfer string.
    Export,
}

/// Loaded settlement plus the systems that react to its events.
struct Session {
    world: World,
    economy: Stockpile,
    validator: RangeValidator,
}

impl Session {
    fn new(scenario: &Scenario) -> Result<Self> {
        Ok(Self {
            world: scenario.world()?,
            economy: scenario.stockpile(),
            validator: RangeValidator::new(),
        })
    }

    /// Applies commands and any follow-up removals the range validator requests.
    fn submit(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut log = Vec::new();
        let mut pending = commands;
        while !pending.is_empty() {
            let events = self.apply_all(pending.drain(..));
            self.validator
                .handle(&events, &query::range_view(&self.world), &mut pending);
            log.extend(events);
        }
        log
    }

    fn apply_all(&mut self, commands: impl IntoIterator<Item = Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, &mut self.economy, command, &mut events);
        }
        events
    }

    /// Rebuilds `entries` at their recorded levels without settling, then
    /// prunes whatever the rebuilt range chains no longer support.
    fn restore(&mut self, entries: &[LayoutEntry]) -> Vec<Event> {
        let mut placements = Vec::new();
        Bootstrap.replay(entries, &mut placements);
        let mut log = self.apply_all(placements);

        let mut upgrades = Vec::new();
        Bootstrap.handle(entries, &log, &mut upgrades);
        log.extend(self.apply_all(upgrades));

        let mut pruned = Vec::new();
        self.validator
            .revalidate(&query::range_view(&self.world), &mut pruned);
        log.extend(self.submit(pruned));
        log
    }

    /// Credits `ticks` rounds of the settlement's production to the stockpile.
    fn produce(&mut self, ticks: u32) {
        let yielded = query::production_total(&self.world) * ticks;
        self.economy.deposit(yielded);
        info!(ticks, ?yielded, "production credited");
    }

    fn structure_at(&self, at: OffsetCoord) -> Result<StructureId> {
        query::owner(&self.world, at)
            .with_context(|| format!("no structure covers cell ({}, {})", at.x(), at.y()))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };
    let mut session = Session::new(&scenario)?;

    if let Some(layout) = &cli.layout {
        let entries = layout_transfer::decode(layout).context("failed to decode --layout")?;
        let events = session.restore(&entries);
        let lost = events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::PlacementRejected { .. }
                        | Event::UpgradeRejected { .. }
                        | Event::StructureRemoved { .. }
                )
            })
            .count();
        if lost > 0 {
            warn!(lost, "layout entries could not be rebuilt as recorded");
        }
        info!(entries = entries.len(), "layout replayed");
    }
    if cli.ticks > 0 {
        session.produce(cli.ticks);
    }

    match cli.command {
        Action::Show => show(&session),
        Action::Place { kind, at } => {
            let events = session.submit(vec![Command::PlaceStructure {
                kind,
                anchor: at,
                settle: true,
            }]);
            report(&events);
            print_layout(&session.world)
        }
        Action::Remove { at } => {
            let events = session.submit(vec![Command::RemoveStructure {
                target: RemovalTarget::Tile(at),
                settle: true,
            }]);
            report(&events);
            print_layout(&session.world)
        }
        Action::Upgrade { at } => {
            let structure = session.structure_at(at)?;
            let events = session.submit(vec![Command::UpgradeStructure {
                structure,
                settle: true,
            }]);
            report(&events);
            print_layout(&session.world)
        }
        Action::Route {
            from,
            to,
            party,
            delay_ms,
            speed,
        } => route(
            &session,
            from,
            to,
            party,
            Config::new(Duration::from_millis(delay_ms), speed),
        ),
        Action::Coverage => {
            coverage(&session);
            Ok(())
        }
        Action::Export => print_layout(&session.world),
    }
}

fn init_tracing(verbose: u8) {
    let directive = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| directive.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_offset(value: &str) -> Result<OffsetCoord, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{value}`"))?;
    let x = x
        .trim()
        .parse::<i32>()
        .map_err(|error| format!("invalid column `{x}`: {error}"))?;
    let y = y
        .trim()
        .parse::<i32>()
        .map_err(|error| format!("invalid row `{y}`: {error}"))?;
    Ok(OffsetCoord::new(x, y))
}

fn show(session: &Session) -> Result<()> {
    let world = &session.world;
    println!("{}", Bootstrap.welcome_banner());
    for snapshot in query::structure_view(world).iter() {
        println!(
            "{} {} at ({}, {}) level {} covering {} cell(s)",
            snapshot.id,
            snapshot.kind,
            snapshot.anchor.x(),
            snapshot.anchor.y(),
            snapshot.level,
            snapshot.tiles.len()
        );
    }
    let balance = session.economy.balance();
    println!(
        "stockpile: magic {} wood {} stone {}",
        balance.magic, balance.wood, balance.stone
    );
    let production = query::production_total(world);
    println!(
        "production: magic {} wood {} stone {}",
        production.magic, production.wood, production.stone
    );
    Ok(())
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::StructurePlaced {
                structure,
                kind,
                tiles,
                ..
            } => println!("placed {kind} {structure} on {} cell(s)", tiles.len()),
            Event::StructureRemoved {
                structure, kind, ..
            } => println!("removed {kind} {structure}"),
            Event::StructureUpgraded {
                structure, level, ..
            } => println!("upgraded {structure} to level {level}"),
            Event::PlacementRejected { kind, reason, .. } => {
                println!("cannot place {kind}: {reason}");
            }
            Event::RemovalRejected { reason, .. } => println!("cannot remove: {reason}"),
            Event::UpgradeRejected {
                structure, reason, ..
            } => println!("cannot upgrade {structure}: {reason}"),
            other => println!("{other:?}"),
        }
    }
}

fn print_layout(world: &World) -> Result<()> {
    let encoded = layout_transfer::encode(&Bootstrap.capture(world))
        .context("failed to encode the current layout")?;
    println!("{encoded}");
    Ok(())
}

fn route(
    session: &Session,
    from: OffsetCoord,
    to: OffsetCoord,
    party: u32,
    config: Config,
) -> Result<()> {
    let mut router = Router::new();
    let path = router.find_cell_path(from, to, &query::surface(&session.world));
    if path.is_empty() {
        println!("no route");
        return Ok(());
    }
    for vertex in &path {
        let position = vertex.position();
        println!("{vertex:?} at ({:.3}, {:.3})", position.x, position.y);
    }
    println!("length {:.3}", path_length(&path));
    if party == 0 {
        return Ok(());
    }

    let members: Vec<UnitId> = (0..party).map(UnitId::new).collect();
    let mut movement = Movement::new(config);
    movement
        .dispatch(&members, &path)
        .context("failed to dispatch party")?;
    let mut elapsed = Duration::ZERO;
    for _ in 0..MAX_FRAMES {
        let mut events = Vec::new();
        movement.advance(FRAME, &mut events);
        elapsed += FRAME;
        for event in events {
            match event {
                MovementEvent::Departed { unit, .. } => {
                    println!("{:>8.2}s unit {} departed", elapsed.as_secs_f32(), unit.get());
                }
                MovementEvent::Arrived { unit, .. } => {
                    println!("{:>8.2}s unit {} arrived", elapsed.as_secs_f32(), unit.get());
                }
            }
        }
        if movement.is_idle() {
            return Ok(());
        }
    }
    bail!("party did not arrive within {MAX_FRAMES} frames")
}

fn coverage(session: &Session) {
    let world = &session.world;
    let view = query::range_view(world);
    let cells = overlay(&view, |cell| query::ground(world, cell.to_offset()).is_full());
    let connected = reachable(&view);
    println!(
        "{} emitter(s), {} connected, {} covered cell(s)",
        view.emitters().len(),
        connected.len(),
        cells.len()
    );
    for cell in cells {
        let offset = cell.to_offset();
        println!("({}, {})", offset.x(), offset.y());
    }
}
