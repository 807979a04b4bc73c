#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hexhold settlement engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired edits, the world executes those commands via its
//! `apply` entry point and broadcasts [`Event`] values describing what
//! actually happened. Systems consume event streams, query immutable views,
//! and respond exclusively with new command batches.

pub mod hex;
pub mod resources;

use std::{collections::BTreeMap, fmt, str::FromStr};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use hex::{disk, ring, Apex, CubicCoord, HexDirection, HexVertex, OffsetCoord, Ring};
pub use resources::{Economy, Resources, Stockpile};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Hexhold.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Rewrites the ground layer at a cell.
    SetGround {
        /// Cell whose ground should change.
        offset: OffsetCoord,
        /// New ground tile.
        tile: Tile,
    },
    /// Places or clears a standalone environment feature on the object layer.
    SetFeature {
        /// Cell whose object layer should change.
        offset: OffsetCoord,
        /// `Tile::Full` plants a feature, `Tile::Empty` clears it.
        tile: Tile,
    },
    /// Requests construction of a structure anchored at the provided cell.
    PlaceStructure {
        /// Catalog entry to construct.
        kind: StructureKind,
        /// Cell the template's origin piece lands on.
        anchor: OffsetCoord,
        /// Whether the economy is consulted and charged.
        settle: bool,
    },
    /// Requests removal of a structure.
    RemoveStructure {
        /// Tile or identifier of the structure to remove.
        target: RemovalTarget,
        /// Whether the economy is refunded.
        settle: bool,
    },
    /// Requests that a structure advance to its next upgrade tier.
    UpgradeStructure {
        /// Structure to upgrade.
        structure: StructureId,
        /// Whether the economy is charged for the tier.
        settle: bool,
    },
    /// Reports a plain click on a cell outside of any edit mode.
    Click {
        /// Cell under the pointer.
        offset: OffsetCoord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// The ground layer of a cell changed.
    GroundChanged {
        /// Edited cell.
        offset: OffsetCoord,
        /// Tile now present on the ground layer.
        tile: Tile,
    },
    /// The environment feature layer of a cell changed.
    FeatureChanged {
        /// Edited cell.
        offset: OffsetCoord,
        /// Tile now present on the object layer.
        tile: Tile,
    },
    /// A terrain edit was refused because a structure owns the cell.
    TerrainEditRejected {
        /// Cell that was left untouched.
        offset: OffsetCoord,
        /// Structure occupying the cell.
        owner: StructureId,
    },
    /// A structure was committed to the grid.
    StructurePlaced {
        /// Identifier allocated to the structure.
        structure: StructureId,
        /// Catalog entry that was built.
        kind: StructureKind,
        /// Anchor cell of the structure.
        anchor: OffsetCoord,
        /// Every cell now owned by the structure.
        tiles: Vec<OffsetCoord>,
    },
    /// A structure was removed from every registry.
    StructureRemoved {
        /// Identifier of the removed structure.
        structure: StructureId,
        /// Catalog entry the structure was built from.
        kind: StructureKind,
        /// Anchor cell the structure occupied.
        anchor: OffsetCoord,
        /// Cells released by the removal.
        tiles: Vec<OffsetCoord>,
    },
    /// A placement request was rejected without mutating the world.
    PlacementRejected {
        /// Catalog entry that was requested.
        kind: StructureKind,
        /// Requested anchor cell.
        anchor: OffsetCoord,
        /// Reason the request failed.
        reason: PlacementError,
    },
    /// A removal request was rejected without mutating the world.
    RemovalRejected {
        /// Target that was requested.
        target: RemovalTarget,
        /// Reason the request failed.
        reason: RemovalError,
    },
    /// A structure swapped to its next footprint while keeping its identity.
    StructureUpgraded {
        /// Upgraded structure.
        structure: StructureId,
        /// Level reached after the upgrade.
        level: u32,
        /// Cells owned after the swap.
        tiles: Vec<OffsetCoord>,
    },
    /// An upgrade request was rejected without mutating the world.
    UpgradeRejected {
        /// Structure that was requested.
        structure: StructureId,
        /// Reason the request failed.
        reason: UpgradeError,
    },
    /// A click landed on a structure.
    StructureClicked {
        /// Structure under the pointer.
        structure: StructureId,
        /// Cell that was clicked.
        offset: OffsetCoord,
    },
    /// A click landed on a standalone environment feature.
    FeatureClicked {
        /// Cell that was clicked.
        offset: OffsetCoord,
    },
}

/// Semantic content of a single layer of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// Nothing is present.
    #[default]
    Empty,
    /// The layer is filled.
    Full,
}

impl Tile {
    /// Reports whether the tile is [`Tile::Full`].
    #[must_use]
    pub const fn is_full(self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Unique identifier assigned to a placed structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(u32);

impl StructureId {
    /// Creates a new structure identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique identifier assigned to a mobile unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Types of structures that can be constructed in the settlement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    /// Single-cell dwelling.
    Hut,
    /// Food production plot.
    Farm,
    /// Two-cell gathering hall.
    Tavern,
    /// Three-cell dungeon entrance.
    Dungeon,
    /// The settlement's root range emitter.
    MainTower,
    /// Auxiliary range emitter chained to the main tower.
    WizardTower,
}

impl StructureKind {
    /// Every structure kind in declaration order.
    pub const ALL: [StructureKind; 6] = [
        Self::Hut,
        Self::Farm,
        Self::Tavern,
        Self::Dungeon,
        Self::MainTower,
        Self::WizardTower,
    ];

    /// Reports whether this kind anchors range connectivity.
    #[must_use]
    pub const fn is_range_root(self) -> bool {
        matches!(self, Self::MainTower)
    }

    /// Lowercase name used by text interfaces.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hut => "hut",
            Self::Farm => "farm",
            Self::Tavern => "tavern",
            Self::Dungeon => "dungeon",
            Self::MainTower => "main-tower",
            Self::WizardTower => "wizard-tower",
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when text does not name a structure kind.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown structure kind `{0}`")]
pub struct UnknownStructureKind(pub String);

impl FromStr for StructureKind {
    type Err = UnknownStructureKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized || kind.name().replace('-', "") == normalized)
            .ok_or_else(|| UnknownStructureKind(value.to_owned()))
    }
}

/// Single cell of a structure footprint relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePiece {
    /// Cubic offset from the anchor cell.
    pub offset: CubicCoord,
    /// Object-layer tile the piece writes.
    #[serde(default = "full_tile")]
    pub tile: Tile,
}

fn full_tile() -> Tile {
    Tile::Full
}

impl TemplatePiece {
    /// Creates a solid piece at the provided offset.
    #[must_use]
    pub const fn full(offset: CubicCoord) -> Self {
        Self {
            offset,
            tile: Tile::Full,
        }
    }
}

/// One step of a structure's upgrade table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpgradeTier {
    /// Pieces replacing the current footprint, or `None` to keep it.
    #[serde(default)]
    pub footprint: Option<Vec<TemplatePiece>>,
    /// Cost charged for the upgrade.
    #[serde(default)]
    pub cost: Resources,
    /// Replacement range radius.
    #[serde(default)]
    pub range: Option<u32>,
    /// Replacement production rate.
    #[serde(default)]
    pub production: Option<Resources>,
}

/// Optional capability records attached to a template.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Resources produced per production cycle.
    #[serde(default)]
    pub production: Option<Resources>,
    /// Range coverage radius in hex steps.
    #[serde(default)]
    pub range: Option<u32>,
    /// Ordered upgrade tiers.
    #[serde(default)]
    pub upgrades: Vec<UpgradeTier>,
}

/// Immutable catalog entry describing how a structure is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureTemplate {
    /// Kind tag of the template.
    pub kind: StructureKind,
    /// Ordered footprint pieces; the first piece is conventionally the anchor.
    pub pieces: Vec<TemplatePiece>,
    /// Cost charged on placement and refunded on removal.
    #[serde(default)]
    pub build_cost: Resources,
    /// Whether explicit removal is allowed.
    #[serde(default = "destructible_default")]
    pub destructible: bool,
    /// Capability records of the structure.
    #[serde(default)]
    pub capabilities: Capabilities,
}

fn destructible_default() -> bool {
    true
}

impl StructureTemplate {
    /// Creates a destructible, free template with the provided pieces.
    #[must_use]
    pub fn new(kind: StructureKind, pieces: Vec<TemplatePiece>) -> Self {
        Self {
            kind,
            pieces,
            build_cost: Resources::ZERO,
            destructible: true,
            capabilities: Capabilities::default(),
        }
    }

    /// Creates a template from solid pieces at the given cubic offsets.
    #[must_use]
    pub fn solid(kind: StructureKind, offsets: &[CubicCoord]) -> Self {
        Self::new(
            kind,
            offsets.iter().copied().map(TemplatePiece::full).collect(),
        )
    }

    /// Sets the build cost.
    #[must_use]
    pub fn with_cost(mut self, cost: Resources) -> Self {
        self.build_cost = cost;
        self
    }

    /// Marks the template as indestructible.
    #[must_use]
    pub fn indestructible(mut self) -> Self {
        self.destructible = false;
        self
    }

    /// Attaches a production capability.
    #[must_use]
    pub fn with_production(mut self, production: Resources) -> Self {
        self.capabilities.production = Some(production);
        self
    }

    /// Attaches a range capability.
    #[must_use]
    pub fn with_range(mut self, radius: u32) -> Self {
        self.capabilities.range = Some(radius);
        self
    }

    /// Appends an upgrade tier.
    #[must_use]
    pub fn with_upgrade(mut self, tier: UpgradeTier) -> Self {
        self.capabilities.upgrades.push(tier);
        self
    }
}

/// Read-only structure catalog handed to the world.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    templates: BTreeMap<StructureKind, StructureTemplate>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a template, replacing any previous entry of the same kind.
    pub fn insert(&mut self, template: StructureTemplate) -> Option<StructureTemplate> {
        self.templates.insert(template.kind, template)
    }

    /// Looks up the template for a kind.
    #[must_use]
    pub fn get(&self, kind: StructureKind) -> Option<&StructureTemplate> {
        self.templates.get(&kind)
    }

    /// Iterates templates in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &StructureTemplate> {
        self.templates.values()
    }

    /// Built-in catalog used when no scenario overrides it.
    #[must_use]
    pub fn standard() -> Self {
        let origin = CubicCoord::ZERO;
        let right = HexDirection::Right.offset();
        let top_right = HexDirection::TopRight.offset();
        let mut catalog = Self::new();

        let entries = [
            StructureTemplate::solid(StructureKind::Hut, &[origin])
                .with_cost(Resources::new(0, 5, 0)),
            StructureTemplate::solid(StructureKind::Farm, &[origin])
                .with_cost(Resources::new(0, 10, 2))
                .with_production(Resources::new(0, 1, 0)),
            StructureTemplate::solid(StructureKind::Tavern, &[origin, right])
                .with_cost(Resources::new(0, 20, 10)),
            StructureTemplate::solid(StructureKind::Dungeon, &[origin, right, top_right])
                .with_cost(Resources::new(5, 10, 30)),
            StructureTemplate::solid(StructureKind::MainTower, &[origin, right, top_right])
                .indestructible()
                .with_range(5),
            StructureTemplate::solid(StructureKind::WizardTower, &[origin])
                .with_cost(Resources::new(10, 5, 10))
                .with_range(3)
                .with_production(Resources::new(1, 0, 0))
                .with_upgrade(UpgradeTier {
                    footprint: Some(vec![
                        TemplatePiece::full(origin),
                        TemplatePiece::full(top_right),
                    ]),
                    cost: Resources::new(20, 10, 20),
                    range: Some(5),
                    production: Some(Resources::new(2, 0, 0)),
                }),
        ];
        for template in entries {
            let _ = catalog.insert(template);
        }
        catalog
    }
}

/// Addresses the structure a removal request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalTarget {
    /// Whatever structure owns the provided cell.
    Tile(OffsetCoord),
    /// The structure with the provided identifier.
    Structure(StructureId),
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The catalog holds no usable template for the requested kind.
    #[error("no template is registered for the requested structure")]
    UnknownTemplate,
    /// A footprint cell lacks ground.
    #[error("the footprint does not rest on solid ground")]
    InvalidTerrain,
    /// A footprint cell is already occupied.
    #[error("the footprint overlaps an occupied cell")]
    Overlap,
    /// The economy cannot pay the build cost.
    #[error("insufficient resources")]
    InsufficientFunds,
}

/// Reasons a removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum RemovalError {
    /// No structure matches the target.
    #[error("no structure occupies the target")]
    NotFound,
    /// The structure cannot be removed explicitly.
    #[error("the structure cannot be destroyed")]
    Indestructible,
}

/// Reasons an upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum UpgradeError {
    /// No structure has the provided identifier.
    #[error("no structure has the requested identifier")]
    NotFound,
    /// The structure's template has no upgrade table.
    #[error("the structure cannot be upgraded")]
    NotUpgradeable,
    /// Every tier has already been applied.
    #[error("the structure is already at its highest level")]
    MaxLevel,
    /// The upgraded footprint does not rest on solid ground.
    #[error("the upgraded footprint does not rest on solid ground")]
    InvalidTerrain,
    /// The upgraded footprint overlaps another occupant.
    #[error("the upgraded footprint overlaps an occupied cell")]
    Overlap,
    /// The economy cannot pay the upgrade cost.
    #[error("insufficient resources")]
    InsufficientFunds,
}

impl From<PlacementError> for UpgradeError {
    fn from(error: PlacementError) -> Self {
        match error {
            PlacementError::UnknownTemplate => Self::NotUpgradeable,
            PlacementError::InvalidTerrain => Self::InvalidTerrain,
            PlacementError::Overlap => Self::Overlap,
            PlacementError::InsufficientFunds => Self::InsufficientFunds,
        }
    }
}

/// Immutable representation of a single structure's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureSnapshot {
    /// Identifier allocated to the structure by the world.
    pub id: StructureId,
    /// Kind the structure was built as.
    pub kind: StructureKind,
    /// Anchor cell of the structure.
    pub anchor: OffsetCoord,
    /// Owned cells in ascending order.
    pub tiles: Vec<OffsetCoord>,
    /// Number of upgrade tiers applied.
    pub level: u32,
    /// Whether explicit removal is allowed.
    pub destructible: bool,
    /// Current range radius, if the structure emits range.
    pub range: Option<u32>,
    /// Current production rate, if the structure produces.
    pub production: Option<Resources>,
}

/// Read-only view of every live structure.
#[derive(Clone, Debug, Default)]
pub struct StructureView {
    snapshots: Vec<StructureSnapshot>,
}

impl StructureView {
    /// Creates a new view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<StructureSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &StructureSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<StructureSnapshot> {
        self.snapshots
    }
}

/// Range-emitting structure as seen by the connectivity validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeEmitter {
    /// Emitting structure.
    pub structure: StructureId,
    /// Cubic coordinate of the structure's anchor.
    pub center: CubicCoord,
    /// Coverage radius in hex steps.
    pub radius: u32,
    /// Whether the emitter is a root that is always supported.
    pub root: bool,
}

/// Snapshot of every range emitter in identifier order.
#[derive(Clone, Debug, Default)]
pub struct RangeView {
    emitters: Vec<RangeEmitter>,
}

impl RangeView {
    /// Creates a view from the provided emitters.
    #[must_use]
    pub fn from_emitters(mut emitters: Vec<RangeEmitter>) -> Self {
        emitters.sort_by_key(|emitter| emitter.structure);
        Self { emitters }
    }

    /// Emitters in identifier order.
    #[must_use]
    pub fn emitters(&self) -> &[RangeEmitter] {
        &self.emitters
    }

    /// First root emitter, if any.
    #[must_use]
    pub fn root(&self) -> Option<&RangeEmitter> {
        self.emitters.iter().find(|emitter| emitter.root)
    }
}

/// Persistable `{kind, anchor, level}` record used to reconstruct layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Kind of structure to rebuild.
    pub kind: StructureKind,
    /// Anchor cell of the structure.
    pub anchor: OffsetCoord,
    /// Upgrade tiers applied on top of the base template.
    #[serde(default, skip_serializing_if = "is_base_level")]
    pub level: u32,
}

impl LayoutEntry {
    /// Creates an entry for a structure at its base level.
    #[must_use]
    pub const fn new(kind: StructureKind, anchor: OffsetCoord) -> Self {
        Self {
            kind,
            anchor,
            level: 0,
        }
    }

    /// Returns the entry with `level` upgrade tiers applied.
    #[must_use]
    pub const fn at_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }
}

fn is_base_level(level: &u32) -> bool {
    *level == 0
}

/// Walkability questions the path router asks about the hex surface.
pub trait SurfaceQuery {
    /// Ground tile of the cell.
    fn ground(&self, cell: CubicCoord) -> Tile;

    /// Whether the cell has no structure and no environment feature.
    fn is_clear(&self, cell: CubicCoord) -> bool;

    /// Structure owning the cell, if any.
    fn occupant(&self, cell: CubicCoord) -> Option<StructureId>;
}

/// Screen/camera collaborator mapping pointer positions to cells.
pub trait ScreenProjection {
    /// Cell under the provided screen point, if any.
    fn screen_to_offset(&self, point: Vec2) -> Option<OffsetCoord>;
}
