//! Authoritative structure registries and identifier allocation.

use std::collections::{BTreeMap, BTreeSet};

use hexhold_core::{
    OffsetCoord, Resources, StructureId, StructureKind, StructureSnapshot, StructureTemplate,
};

/// Live structure stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct StructureState {
    /// Identifier allocated by the world for the structure.
    pub(crate) id: StructureId,
    /// Kind the structure was built as.
    pub(crate) kind: StructureKind,
    /// Anchor cell the footprint is laid out from.
    pub(crate) anchor: OffsetCoord,
    /// Cells owned by the structure.
    pub(crate) tiles: BTreeSet<OffsetCoord>,
    /// Number of upgrade tiers applied.
    pub(crate) level: u32,
    pub(crate) destructible: bool,
    pub(crate) range: Option<u32>,
    pub(crate) production: Option<Resources>,
}

impl StructureState {
    /// Builds a fresh level-zero structure from its template.
    pub(crate) fn from_template(
        id: StructureId,
        template: &StructureTemplate,
        anchor: OffsetCoord,
        tiles: BTreeSet<OffsetCoord>,
    ) -> Self {
        Self {
            id,
            kind: template.kind,
            anchor,
            tiles,
            level: 0,
            destructible: template.destructible,
            range: template.capabilities.range,
            production: template.capabilities.production,
        }
    }

    pub(crate) fn snapshot(&self) -> StructureSnapshot {
        StructureSnapshot {
            id: self.id,
            kind: self.kind,
            anchor: self.anchor,
            tiles: self.tiles.iter().copied().collect(),
            level: self.level,
            destructible: self.destructible,
            range: self.range,
            production: self.production,
        }
    }
}

/// The three mutually consistent structure registries.
///
/// `owners` maps every owned cell back to its structure, `entries` holds each
/// structure's tile set and `by_kind` buckets identifiers by kind. Callers must
/// check footprint disjointness before [`StructureRegistry::insert`] or
/// [`StructureRegistry::replace_tiles`]; the registry itself never overwrites
/// an existing owner.
#[derive(Debug)]
pub(crate) struct StructureRegistry {
    entries: BTreeMap<StructureId, StructureState>,
    owners: BTreeMap<OffsetCoord, StructureId>,
    by_kind: BTreeMap<StructureKind, Vec<StructureId>>,
    next_id: StructureId,
}

impl StructureRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            owners: BTreeMap::new(),
            by_kind: BTreeMap::new(),
            next_id: StructureId::new(0),
        }
    }

    /// Reserves the next structure identifier.
    pub(crate) fn allocate_id(&mut self) -> StructureId {
        let id = self.next_id;
        self.next_id = StructureId::new(id.get().wrapping_add(1));
        id
    }

    /// Registers a structure in all three registries.
    pub(crate) fn insert(&mut self, state: StructureState) {
        debug_assert!(state.tiles.iter().all(|tile| !self.owners.contains_key(tile)));
        for tile in &state.tiles {
            let _ = self.owners.insert(*tile, state.id);
        }
        self.by_kind.entry(state.kind).or_default().push(state.id);
        let _ = self.entries.insert(state.id, state);
    }

    /// Unregisters a structure from all three registries.
    pub(crate) fn remove(&mut self, id: StructureId) -> Option<StructureState> {
        let state = self.entries.remove(&id)?;
        for tile in &state.tiles {
            let _ = self.owners.remove(tile);
        }
        if let Some(bucket) = self.by_kind.get_mut(&state.kind) {
            bucket.retain(|candidate| *candidate != id);
        }
        Some(state)
    }

    /// Replaces the owned tile set of a structure, returning the previous set.
    pub(crate) fn replace_tiles(
        &mut self,
        id: StructureId,
        tiles: BTreeSet<OffsetCoord>,
    ) -> Option<BTreeSet<OffsetCoord>> {
        let state = self.entries.get_mut(&id)?;
        for tile in &state.tiles {
            let _ = self.owners.remove(tile);
        }
        for tile in &tiles {
            let _ = self.owners.insert(*tile, id);
        }
        Some(std::mem::replace(&mut state.tiles, tiles))
    }

    pub(crate) fn owner(&self, tile: OffsetCoord) -> Option<StructureId> {
        self.owners.get(&tile).copied()
    }

    pub(crate) fn get(&self, id: StructureId) -> Option<&StructureState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: StructureId) -> Option<&mut StructureState> {
        self.entries.get_mut(&id)
    }

    /// Identifiers of live structures of the provided kind in placement order.
    pub(crate) fn of_kind(&self, kind: StructureKind) -> &[StructureId] {
        self.by_kind.get(&kind).map_or(&[][..], Vec::as_slice)
    }

    /// Iterates live structures in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &StructureState> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: StructureId, kind: StructureKind, tiles: &[(i32, i32)]) -> StructureState {
        StructureState {
            id,
            kind,
            anchor: OffsetCoord::new(tiles[0].0, tiles[0].1),
            tiles: tiles
                .iter()
                .map(|(x, y)| OffsetCoord::new(*x, *y))
                .collect(),
            level: 0,
            destructible: true,
            range: None,
            production: None,
        }
    }

    #[test]
    fn registry_starts_empty_with_zero_identifier() {
        let mut registry = StructureRegistry::new();
        assert!(registry.iter().next().is_none());
        assert_eq!(registry.allocate_id(), StructureId::new(0));
        assert_eq!(registry.allocate_id(), StructureId::new(1));
    }

    #[test]
    fn insert_and_remove_keep_registries_in_step() {
        let mut registry = StructureRegistry::new();
        let id = registry.allocate_id();
        registry.insert(state(id, StructureKind::Tavern, &[(0, 0), (1, 0)]));

        assert_eq!(registry.owner(OffsetCoord::new(1, 0)), Some(id));
        assert_eq!(registry.of_kind(StructureKind::Tavern), &[id]);

        let removed = registry.remove(id).expect("structure");
        assert_eq!(removed.tiles.len(), 2);
        assert_eq!(registry.owner(OffsetCoord::new(0, 0)), None);
        assert!(registry.of_kind(StructureKind::Tavern).is_empty());
        assert!(registry.remove(id).is_none());
    }

    #[test]
    fn replacing_tiles_moves_ownership() {
        let mut registry = StructureRegistry::new();
        let id = registry.allocate_id();
        registry.insert(state(id, StructureKind::WizardTower, &[(2, 2)]));

        let next: BTreeSet<_> = [OffsetCoord::new(2, 2), OffsetCoord::new(2, 3)]
            .into_iter()
            .collect();
        let previous = registry.replace_tiles(id, next).expect("structure");

        assert_eq!(previous.len(), 1);
        assert_eq!(registry.owner(OffsetCoord::new(2, 3)), Some(id));
        assert_eq!(registry.get(id).map(|s| s.tiles.len()), Some(2));
    }

    #[test]
    fn unknown_kind_yields_empty_bucket() {
        let registry = StructureRegistry::new();
        assert!(registry.of_kind(StructureKind::Farm).is_empty());
    }
}
