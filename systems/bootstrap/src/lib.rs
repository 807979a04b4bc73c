#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that re-populates a settlement from a persisted layout.

use hexhold_core::{Command, Event, LayoutEntry, WELCOME_BANNER};
use hexhold_world::{query, World};
use tracing::debug;

/// Produces the commands and data required to bring a settlement back.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the settlement starts.
    #[must_use]
    pub fn welcome_banner(&self) -> &'static str {
        WELCOME_BANNER
    }

    /// Emits one placement per layout entry, in layout order.
    ///
    /// Replayed placements never settle with the economy: the structures
    /// were paid for when they were first built. Upgrade levels are restored
    /// afterwards by [`Bootstrap::handle`].
    pub fn replay(&self, layout: &[LayoutEntry], out: &mut Vec<Command>) {
        out.extend(layout.iter().map(|entry| Command::PlaceStructure {
            kind: entry.kind,
            anchor: entry.anchor,
            settle: false,
        }));
        debug!(entries = layout.len(), "layout replay queued");
    }

    /// Consumes the events of a replayed layout and emits the upgrades that
    /// bring each rebuilt structure back to its recorded level.
    ///
    /// Upgrades never settle with the economy. A structure is matched to its
    /// entry by kind and anchor.
    pub fn handle(&self, layout: &[LayoutEntry], events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            let Event::StructurePlaced {
                structure,
                kind,
                anchor,
                ..
            } = event
            else {
                continue;
            };
            let Some(entry) = layout
                .iter()
                .find(|entry| entry.kind == *kind && entry.anchor == *anchor)
            else {
                continue;
            };
            for _ in 0..entry.level {
                out.push(Command::UpgradeStructure {
                    structure: *structure,
                    settle: false,
                });
            }
            if entry.level > 0 {
                debug!(%structure, level = entry.level, "restoring upgrade level");
            }
        }
    }

    /// Captures the live structures of `world` as a layout in identifier order.
    ///
    /// Replaying the result into an empty world with the same terrain
    /// rebuilds the same structures at the same levels, in the same relative
    /// order.
    #[must_use]
    pub fn capture(&self, world: &World) -> Vec<LayoutEntry> {
        query::structure_view(world)
            .iter()
            .map(|snapshot| {
                LayoutEntry::new(snapshot.kind, snapshot.anchor).at_level(snapshot.level)
            })
            .collect()
    }
}
