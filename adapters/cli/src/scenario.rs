//! Versioned TOML scenario files describing the map, economy and catalog.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use hexhold_core::{Catalog, OffsetCoord, Resources, Stockpile, StructureTemplate, Tile};
use hexhold_world::World;
use serde::Deserialize;

const SUPPORTED_SCENARIO_VERSION: u32 = 1;

/// Settlement setup loaded from a scenario file or the built-in defaults.
#[derive(Debug)]
pub(crate) struct Scenario {
    map: MapSection,
    economy: Option<EconomySection>,
    catalog: Catalog,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    version: u32,
    #[serde(default)]
    map: MapSection,
    #[serde(default)]
    economy: Option<EconomySection>,
    #[serde(default)]
    template: Vec<StructureTemplate>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MapSection {
    columns: u32,
    rows: u32,
    #[serde(default)]
    voids: Vec<[i32; 2]>,
    #[serde(default)]
    features: Vec<[i32; 2]>,
}

impl Default for MapSection {
    fn default() -> Self {
        Self {
            columns: 16,
            rows: 12,
            voids: Vec::new(),
            features: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EconomySection {
    #[serde(default)]
    magic: u32,
    #[serde(default)]
    wood: u32,
    #[serde(default)]
    stone: u32,
    #[serde(default = "full_refund")]
    refund_rate: f32,
}

fn full_refund() -> f32 {
    1.0
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            map: MapSection::default(),
            economy: None,
            catalog: Catalog::standard(),
        }
    }
}

impl Scenario {
    /// Reads and validates the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        parse_scenario(&contents)
            .with_context(|| format!("invalid scenario file {}", path.display()))
    }

    /// Builds the world described by the map section.
    pub(crate) fn world(&self) -> Result<World> {
        let mut world = World::new(self.catalog.clone());
        let columns = i32::try_from(self.map.columns).context("map is too wide")?;
        let rows = i32::try_from(self.map.rows).context("map is too tall")?;
        for y in 0..rows {
            for x in 0..columns {
                set_ground(&mut world, OffsetCoord::new(x, y), Tile::Full)?;
            }
        }
        for [x, y] in &self.map.voids {
            set_ground(&mut world, OffsetCoord::new(*x, *y), Tile::Empty)?;
        }
        for [x, y] in &self.map.features {
            if world.set_feature(OffsetCoord::new(*x, *y), Tile::Full).is_err() {
                bail!("feature at ({x}, {y}) overlaps a structure");
            }
        }
        Ok(world)
    }

    /// Builds the stockpile described by the economy section.
    ///
    /// Scenarios without an economy section build for free.
    pub(crate) fn stockpile(&self) -> Stockpile {
        self.economy.map_or_else(Stockpile::unlimited, |economy| {
            Stockpile::new(
                Resources::new(economy.magic, economy.wood, economy.stone),
                economy.refund_rate,
            )
        })
    }
}

fn set_ground(world: &mut World, offset: OffsetCoord, tile: Tile) -> Result<()> {
    world
        .set_ground(offset, tile)
        .map_err(|owner| anyhow::anyhow!("cell {offset:?} is owned by structure {owner}"))
}

fn parse_scenario(contents: &str) -> Result<Scenario> {
    let file: ScenarioFile =
        toml::from_str(contents).context("failed to parse scenario toml contents")?;
    if file.version != SUPPORTED_SCENARIO_VERSION {
        bail!(
            "unsupported scenario version {}; expected {}",
            file.version,
            SUPPORTED_SCENARIO_VERSION
        );
    }
    if file.map.columns == 0 || file.map.rows == 0 {
        bail!(
            "map dimensions {}x{} must be non-zero",
            file.map.columns,
            file.map.rows
        );
    }

    let catalog = if file.template.is_empty() {
        Catalog::standard()
    } else {
        let mut catalog = Catalog::new();
        for template in file.template {
            let kind = template.kind;
            if template.pieces.is_empty() {
                bail!("template for {kind} has no pieces");
            }
            if kind.is_range_root() && template.destructible {
                bail!(
                    "template for {kind} anchors the settlement and must set destructible = false"
                );
            }
            if catalog.insert(template).is_some() {
                bail!("scenario contains duplicate template for {kind}");
            }
        }
        catalog
    };

    Ok(Scenario {
        map: file.map,
        economy: file.economy,
        catalog,
    })
}
