//! Sparse ground and object layers.

use std::collections::BTreeMap;

use hexhold_core::{OffsetCoord, Tile};

/// Two independent per-cell tile layers. Absent cells read as [`Tile::Empty`].
#[derive(Debug, Default)]
pub(crate) struct TerrainLayers {
    ground: BTreeMap<OffsetCoord, Tile>,
    object: BTreeMap<OffsetCoord, Tile>,
}

impl TerrainLayers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ground(&self, offset: OffsetCoord) -> Tile {
        self.ground.get(&offset).copied().unwrap_or_default()
    }

    pub(crate) fn object(&self, offset: OffsetCoord) -> Tile {
        self.object.get(&offset).copied().unwrap_or_default()
    }

    pub(crate) fn set_ground(&mut self, offset: OffsetCoord, tile: Tile) {
        write(&mut self.ground, offset, tile);
    }

    pub(crate) fn set_object(&mut self, offset: OffsetCoord, tile: Tile) {
        write(&mut self.object, offset, tile);
    }

    /// Cells whose ground layer is [`Tile::Full`], in ascending order.
    pub(crate) fn ground_cells(&self) -> impl Iterator<Item = OffsetCoord> + '_ {
        self.ground
            .iter()
            .filter(|(_, tile)| tile.is_full())
            .map(|(offset, _)| *offset)
    }

    /// Cells whose object layer is [`Tile::Full`], in ascending order.
    pub(crate) fn object_cells(&self) -> impl Iterator<Item = OffsetCoord> + '_ {
        self.object
            .iter()
            .filter(|(_, tile)| tile.is_full())
            .map(|(offset, _)| *offset)
    }
}

fn write(layer: &mut BTreeMap<OffsetCoord, Tile>, offset: OffsetCoord, tile: Tile) {
    match tile {
        Tile::Empty => {
            let _ = layer.remove(&offset);
        }
        Tile::Full => {
            let _ = layer.insert(offset, tile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cells_read_as_empty() {
        let layers = TerrainLayers::new();
        assert_eq!(layers.ground(OffsetCoord::new(-4, 9)), Tile::Empty);
        assert_eq!(layers.object(OffsetCoord::new(-4, 9)), Tile::Empty);
    }

    #[test]
    fn clearing_a_cell_drops_it_from_the_layer() {
        let mut layers = TerrainLayers::new();
        let offset = OffsetCoord::new(1, 1);
        layers.set_ground(offset, Tile::Full);
        assert_eq!(layers.ground_cells().collect::<Vec<_>>(), vec![offset]);

        layers.set_ground(offset, Tile::Empty);
        assert!(layers.ground_cells().next().is_none());
    }

    #[test]
    fn layers_are_independent() {
        let mut layers = TerrainLayers::new();
        let offset = OffsetCoord::new(0, 3);
        layers.set_object(offset, Tile::Full);
        assert_eq!(layers.ground(offset), Tile::Empty);
        assert_eq!(layers.object_cells().count(), 1);
    }
}
