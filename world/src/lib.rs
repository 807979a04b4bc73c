#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state and placement engine for Hexhold.
//!
//! The world owns the ground and object layers, the structure registries and
//! the catalog the structures are built from. Every mutation goes through
//! [`apply`] or one of the `World` methods it delegates to, and every method
//! either commits completely or leaves the world untouched.

mod registry;
mod terrain;

use std::collections::BTreeSet;

use hexhold_core::{
    Catalog, Command, Economy, Event, OffsetCoord, PlacementError, RemovalError, RemovalTarget,
    StructureId, StructureKind, StructureSnapshot, TemplatePiece, Tile, UpgradeError,
};
use tracing::{debug, warn};

use crate::registry::{StructureRegistry, StructureState};
use crate::terrain::TerrainLayers;

/// Represents the authoritative Hexhold world state.
#[derive(Debug)]
pub struct World {
    catalog: Catalog,
    terrain: TerrainLayers,
    registry: StructureRegistry,
}

impl World {
    /// Creates an empty world that builds structures from `catalog`.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            terrain: TerrainLayers::new(),
            registry: StructureRegistry::new(),
        }
    }

    /// Commits a structure of `kind` anchored at `anchor`.
    ///
    /// Validation runs terrain checks first, then affordability when an
    /// economy is supplied. The economy is charged only after the registries
    /// have been written, and nothing is written on failure.
    pub fn place_structure(
        &mut self,
        kind: StructureKind,
        anchor: OffsetCoord,
        mut economy: Option<&mut dyn Economy>,
    ) -> Result<StructureId, PlacementError> {
        let template = self
            .catalog
            .get(kind)
            .filter(|template| !template.pieces.is_empty())
            .ok_or(PlacementError::UnknownTemplate)?;
        let cells = footprint(anchor, &template.pieces);
        self.validate_footprint(&cells, None)?;

        let cost = template.build_cost;
        if let Some(economy) = economy.as_mut() {
            if !economy.can_afford(&cost) {
                return Err(PlacementError::InsufficientFunds);
            }
        }

        let id = self.registry.allocate_id();
        let tiles: BTreeSet<OffsetCoord> = cells.iter().map(|(offset, _)| *offset).collect();
        let state = StructureState::from_template(id, template, anchor, tiles);
        for (offset, tile) in &cells {
            self.terrain.set_object(*offset, *tile);
        }
        self.registry.insert(state);

        if let Some(economy) = economy {
            economy.charge(&cost);
        }
        debug!(structure = %id, %kind, ?anchor, "structure placed");
        Ok(id)
    }

    /// Removes the structure addressed by `target` from every registry.
    ///
    /// Refunds the template's build cost when an economy is supplied.
    pub fn remove_structure(
        &mut self,
        target: RemovalTarget,
        economy: Option<&mut dyn Economy>,
    ) -> Result<StructureSnapshot, RemovalError> {
        let id = self.resolve(target).ok_or(RemovalError::NotFound)?;
        let state = self.registry.get(id).ok_or(RemovalError::NotFound)?;
        if !state.destructible {
            return Err(RemovalError::Indestructible);
        }

        let state = self.registry.remove(id).ok_or(RemovalError::NotFound)?;
        for offset in &state.tiles {
            self.terrain.set_object(*offset, Tile::Empty);
        }

        if let Some(economy) = economy {
            if let Some(template) = self.catalog.get(state.kind) {
                economy.refund(&template.build_cost);
            }
        }
        debug!(structure = %id, kind = %state.kind, "structure removed");
        Ok(state.snapshot())
    }

    /// Replaces a structure's footprint with `pieces` laid out from its anchor.
    ///
    /// The structure keeps its identifier, kind, level and capabilities. Its own
    /// cells count as free while the new footprint is validated.
    pub fn swap_footprint(
        &mut self,
        structure: StructureId,
        pieces: &[TemplatePiece],
    ) -> Result<Vec<OffsetCoord>, UpgradeError> {
        let anchor = self
            .registry
            .get(structure)
            .map(|state| state.anchor)
            .ok_or(UpgradeError::NotFound)?;
        if pieces.is_empty() {
            return Err(UpgradeError::NotUpgradeable);
        }
        let cells = footprint(anchor, pieces);
        self.validate_footprint(&cells, Some(structure))?;
        Ok(self.commit_footprint(structure, &cells))
    }

    /// Advances a structure to the next tier of its template's upgrade table.
    pub fn upgrade_structure(
        &mut self,
        structure: StructureId,
        mut economy: Option<&mut dyn Economy>,
    ) -> Result<u32, UpgradeError> {
        let state = self
            .registry
            .get(structure)
            .ok_or(UpgradeError::NotFound)?;
        let upgrades = self
            .catalog
            .get(state.kind)
            .map(|template| template.capabilities.upgrades.as_slice())
            .unwrap_or_default();
        if upgrades.is_empty() {
            return Err(UpgradeError::NotUpgradeable);
        }
        let tier = upgrades
            .get(state.level as usize)
            .ok_or(UpgradeError::MaxLevel)?
            .clone();

        let cells = match &tier.footprint {
            Some(pieces) if pieces.is_empty() => return Err(UpgradeError::NotUpgradeable),
            Some(pieces) => {
                let cells = footprint(state.anchor, pieces);
                self.validate_footprint(&cells, Some(structure))?;
                Some(cells)
            }
            None => None,
        };
        if let Some(economy) = economy.as_mut() {
            if !economy.can_afford(&tier.cost) {
                return Err(UpgradeError::InsufficientFunds);
            }
        }

        if let Some(cells) = cells {
            let _ = self.commit_footprint(structure, &cells);
        }
        if let Some(economy) = economy {
            economy.charge(&tier.cost);
        }

        let state = self
            .registry
            .get_mut(structure)
            .ok_or(UpgradeError::NotFound)?;
        state.level += 1;
        if tier.range.is_some() {
            state.range = tier.range;
        }
        if tier.production.is_some() {
            state.production = tier.production;
        }
        debug!(%structure, level = state.level, "structure upgraded");
        Ok(state.level)
    }

    /// Rewrites the ground layer unless a structure owns the cell.
    pub fn set_ground(&mut self, offset: OffsetCoord, tile: Tile) -> Result<(), StructureId> {
        if let Some(owner) = self.registry.owner(offset) {
            return Err(owner);
        }
        self.terrain.set_ground(offset, tile);
        Ok(())
    }

    /// Plants or clears an environment feature unless a structure owns the cell.
    pub fn set_feature(&mut self, offset: OffsetCoord, tile: Tile) -> Result<(), StructureId> {
        if let Some(owner) = self.registry.owner(offset) {
            return Err(owner);
        }
        self.terrain.set_object(offset, tile);
        Ok(())
    }

    /// Describes what a plain click on `offset` hits, if anything.
    #[must_use]
    pub fn click(&self, offset: OffsetCoord) -> Option<Event> {
        if let Some(structure) = self.registry.owner(offset) {
            return Some(Event::StructureClicked { structure, offset });
        }
        self.terrain
            .object(offset)
            .is_full()
            .then_some(Event::FeatureClicked { offset })
    }

    fn resolve(&self, target: RemovalTarget) -> Option<StructureId> {
        match target {
            RemovalTarget::Tile(offset) => self.registry.owner(offset),
            RemovalTarget::Structure(id) => self.registry.get(id).map(|state| state.id),
        }
    }

    fn is_placeable_tile(&self, offset: OffsetCoord) -> bool {
        self.terrain.ground(offset).is_full()
            && !self.terrain.object(offset).is_full()
            && self.registry.owner(offset).is_none()
    }

    /// Checks that every cell rests on ground and is free.
    ///
    /// Cells owned by `ignore` count as free.
    fn validate_footprint(
        &self,
        cells: &[(OffsetCoord, Tile)],
        ignore: Option<StructureId>,
    ) -> Result<(), PlacementError> {
        let mut seen = BTreeSet::new();
        for (offset, _) in cells {
            if !seen.insert(*offset) {
                return Err(PlacementError::Overlap);
            }
            if !self.terrain.ground(*offset).is_full() {
                return Err(PlacementError::InvalidTerrain);
            }
            match self.registry.owner(*offset) {
                Some(owner) if Some(owner) == ignore => {}
                Some(_) => return Err(PlacementError::Overlap),
                None if self.terrain.object(*offset).is_full() => {
                    return Err(PlacementError::Overlap)
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Moves a structure onto pre-validated `cells`, returning the new tiles.
    fn commit_footprint(
        &mut self,
        structure: StructureId,
        cells: &[(OffsetCoord, Tile)],
    ) -> Vec<OffsetCoord> {
        let tiles: BTreeSet<OffsetCoord> = cells.iter().map(|(offset, _)| *offset).collect();
        let listed: Vec<OffsetCoord> = tiles.iter().copied().collect();
        if let Some(previous) = self.registry.replace_tiles(structure, tiles) {
            for offset in previous {
                self.terrain.set_object(offset, Tile::Empty);
            }
        }
        for (offset, tile) in cells {
            self.terrain.set_object(*offset, *tile);
        }
        debug!(%structure, tiles = listed.len(), "footprint swapped");
        listed
    }
}

/// Lays `pieces` out from `anchor` in cubic space.
fn footprint(anchor: OffsetCoord, pieces: &[TemplatePiece]) -> Vec<(OffsetCoord, Tile)> {
    let origin = anchor.to_cubic();
    pieces
        .iter()
        .map(|piece| ((origin + piece.offset).to_offset(), piece.tile))
        .collect()
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// `economy` is consulted only by commands that settle resources.
pub fn apply(
    world: &mut World,
    economy: &mut dyn Economy,
    command: Command,
    out_events: &mut Vec<Event>,
) {
    match command {
        Command::SetGround { offset, tile } => match world.set_ground(offset, tile) {
            Ok(()) => out_events.push(Event::GroundChanged { offset, tile }),
            Err(owner) => {
                debug!(?offset, %owner, "ground edit refused on owned cell");
                out_events.push(Event::TerrainEditRejected { offset, owner });
            }
        },
        Command::SetFeature { offset, tile } => match world.set_feature(offset, tile) {
            Ok(()) => out_events.push(Event::FeatureChanged { offset, tile }),
            Err(owner) => {
                debug!(?offset, %owner, "feature edit refused on owned cell");
                out_events.push(Event::TerrainEditRejected { offset, owner });
            }
        },
        Command::PlaceStructure {
            kind,
            anchor,
            settle,
        } => {
            let economy = if settle { Some(economy) } else { None };
            match world.place_structure(kind, anchor, economy) {
                Ok(structure) => {
                    let tiles = query::tiles(world, structure);
                    out_events.push(Event::StructurePlaced {
                        structure,
                        kind,
                        anchor,
                        tiles,
                    });
                }
                Err(reason) => {
                    debug!(%kind, ?anchor, %reason, "placement rejected");
                    out_events.push(Event::PlacementRejected {
                        kind,
                        anchor,
                        reason,
                    });
                }
            }
        }
        Command::RemoveStructure { target, settle } => {
            let economy = if settle { Some(economy) } else { None };
            match world.remove_structure(target, economy) {
                Ok(snapshot) => out_events.push(Event::StructureRemoved {
                    structure: snapshot.id,
                    kind: snapshot.kind,
                    anchor: snapshot.anchor,
                    tiles: snapshot.tiles,
                }),
                Err(reason) => {
                    debug!(?target, %reason, "removal rejected");
                    out_events.push(Event::RemovalRejected { target, reason });
                }
            }
        }
        Command::UpgradeStructure { structure, settle } => {
            let economy = if settle { Some(economy) } else { None };
            match world.upgrade_structure(structure, economy) {
                Ok(level) => {
                    let tiles = query::tiles(world, structure);
                    out_events.push(Event::StructureUpgraded {
                        structure,
                        level,
                        tiles,
                    });
                }
                Err(reason) => {
                    warn!(%structure, %reason, "upgrade rejected");
                    out_events.push(Event::UpgradeRejected { structure, reason });
                }
            }
        }
        Command::Click { offset } => {
            if let Some(event) = world.click(offset) {
                out_events.push(event);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use hexhold_core::{
        Catalog, CubicCoord, OffsetCoord, RangeEmitter, RangeView, Resources, StructureId,
        StructureKind, StructureSnapshot, StructureView, SurfaceQuery, Tile,
    };

    /// Provides read-only access to the catalog structures are built from.
    #[must_use]
    pub fn catalog(world: &World) -> &Catalog {
        &world.catalog
    }

    /// Ground tile at `offset`.
    #[must_use]
    pub fn ground(world: &World, offset: OffsetCoord) -> Tile {
        world.terrain.ground(offset)
    }

    /// Object tile at `offset`, written by structures and features alike.
    #[must_use]
    pub fn object(world: &World, offset: OffsetCoord) -> Tile {
        world.terrain.object(offset)
    }

    /// Reports whether a structure piece could be built on `offset`.
    #[must_use]
    pub fn is_placeable_tile(world: &World, offset: OffsetCoord) -> bool {
        world.is_placeable_tile(offset)
    }

    /// Reports whether a structure of `kind` fits at `anchor`.
    ///
    /// Kinds missing from the catalog are never placeable.
    #[must_use]
    pub fn is_placeable_structure(world: &World, anchor: OffsetCoord, kind: StructureKind) -> bool {
        world
            .catalog
            .get(kind)
            .filter(|template| !template.pieces.is_empty())
            .is_some_and(|template| {
                let cells = super::footprint(anchor, &template.pieces);
                world.validate_footprint(&cells, None).is_ok()
            })
    }

    /// Structure owning `offset`, if any.
    #[must_use]
    pub fn owner(world: &World, offset: OffsetCoord) -> Option<StructureId> {
        world.registry.owner(offset)
    }

    /// Cells owned by `structure` in ascending order; empty when it is gone.
    #[must_use]
    pub fn tiles(world: &World, structure: StructureId) -> Vec<OffsetCoord> {
        world
            .registry
            .get(structure)
            .map(|state| state.tiles.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Live structures of `kind` in placement order.
    #[must_use]
    pub fn structures_of_kind(world: &World, kind: StructureKind) -> &[StructureId] {
        world.registry.of_kind(kind)
    }

    /// Snapshot of a single structure.
    #[must_use]
    pub fn structure(world: &World, structure: StructureId) -> Option<StructureSnapshot> {
        world.registry.get(structure).map(|state| state.snapshot())
    }

    /// Captures a read-only view of every live structure.
    #[must_use]
    pub fn structure_view(world: &World) -> StructureView {
        StructureView::from_snapshots(world.registry.iter().map(|state| state.snapshot()).collect())
    }

    /// Captures every live structure with a range capability.
    ///
    /// Emitters are centered on their anchor cell.
    #[must_use]
    pub fn range_view(world: &World) -> RangeView {
        RangeView::from_emitters(
            world
                .registry
                .iter()
                .filter_map(|state| {
                    state.range.map(|radius| RangeEmitter {
                        structure: state.id,
                        center: state.anchor.to_cubic(),
                        radius,
                        root: state.kind.is_range_root(),
                    })
                })
                .collect(),
        )
    }

    /// Sums the production rate of every producing structure.
    #[must_use]
    pub fn production_total(world: &World) -> Resources {
        world
            .registry
            .iter()
            .filter_map(|state| state.production)
            .fold(Resources::ZERO, |total, rate| total + rate)
    }

    /// Cells with solid ground in ascending order.
    pub fn ground_cells(world: &World) -> impl Iterator<Item = OffsetCoord> + '_ {
        world.terrain.ground_cells()
    }

    /// Cells holding a standalone environment feature in ascending order.
    pub fn features(world: &World) -> impl Iterator<Item = OffsetCoord> + '_ {
        world
            .terrain
            .object_cells()
            .filter(|offset| world.registry.owner(*offset).is_none())
    }

    /// Exposes the world's surface to the path router.
    #[must_use]
    pub fn surface(world: &World) -> Surface<'_> {
        Surface { world }
    }

    /// Read-only walkability view backed by the world.
    #[derive(Clone, Copy, Debug)]
    pub struct Surface<'a> {
        world: &'a World,
    }

    impl SurfaceQuery for Surface<'_> {
        fn ground(&self, cell: CubicCoord) -> Tile {
            self.world.terrain.ground(cell.to_offset())
        }

        fn is_clear(&self, cell: CubicCoord) -> bool {
            let offset = cell.to_offset();
            !self.world.terrain.object(offset).is_full()
                && self.world.registry.owner(offset).is_none()
        }

        fn occupant(&self, cell: CubicCoord) -> Option<StructureId> {
            self.world.registry.owner(cell.to_offset())
        }
    }
}
