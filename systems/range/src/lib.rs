#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Range connectivity validation and range overlay coverage.
//!
//! Auxiliary range emitters only stay standing while a chain of overlapping
//! coverage connects them to a root emitter. Whenever a removal or upgrade
//! may have broken a chain, the validator sweeps the emitters and requests
//! removal of every one that can no longer be reached.

use std::collections::VecDeque;

use hexhold_core::{
    disk, Command, CubicCoord, Event, RangeEmitter, RangeView, RemovalTarget, StructureId,
};
use tracing::{info, warn};

/// Progress of a single emitter through the connectivity sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Visit {
    NotFound,
    Queued,
    Checked,
}

/// Pure system that prunes range emitters cut off from every root.
#[derive(Debug, Default)]
pub struct RangeValidator {
    visits: Vec<Visit>,
    frontier: VecDeque<usize>,
}

impl RangeValidator {
    /// Creates a validator with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and emits removals for unsupported emitters.
    ///
    /// `view` must describe the world after `events` were applied. Only
    /// removals and upgrades can break a chain, so other batches are ignored.
    pub fn handle(&mut self, events: &[Event], view: &RangeView, out: &mut Vec<Command>) {
        let relevant = events.iter().any(|event| {
            matches!(
                event,
                Event::StructureRemoved { .. } | Event::StructureUpgraded { .. }
            )
        });
        if !relevant {
            return;
        }

        self.prune(view, true, out);
    }

    /// Sweeps `view` regardless of what changed and emits unsettled removals
    /// for every unsupported emitter.
    ///
    /// Used once after a layout has been rebuilt without settlement.
    pub fn revalidate(&mut self, view: &RangeView, out: &mut Vec<Command>) {
        self.prune(view, false, out);
    }

    fn prune(&mut self, view: &RangeView, settle: bool, out: &mut Vec<Command>) {
        for structure in self.unsupported(view) {
            out.push(Command::RemoveStructure {
                target: RemovalTarget::Structure(structure),
                settle,
            });
        }
    }

    /// Identifiers of emitters that no coverage chain links to a root.
    ///
    /// Roots are always supported. Without a root nothing is considered
    /// unsupported.
    pub fn unsupported(&mut self, view: &RangeView) -> Vec<StructureId> {
        let emitters = view.emitters();
        if !self.sweep(emitters) {
            if !emitters.is_empty() {
                warn!(
                    emitters = emitters.len(),
                    "no root range emitter; skipping connectivity sweep"
                );
            }
            return Vec::new();
        }

        let pruned: Vec<StructureId> = emitters
            .iter()
            .zip(&self.visits)
            .filter(|(_, visit)| **visit == Visit::NotFound)
            .map(|(emitter, _)| emitter.structure)
            .collect();
        if !pruned.is_empty() {
            info!(count = pruned.len(), "pruning range emitters cut off from every root");
        }
        pruned
    }

    /// Breadth-first expansion from every root over "within radius" links.
    ///
    /// Returns `false` when `emitters` holds no root.
    fn sweep(&mut self, emitters: &[RangeEmitter]) -> bool {
        self.visits.clear();
        self.visits.resize(emitters.len(), Visit::NotFound);
        self.frontier.clear();
        for (index, emitter) in emitters.iter().enumerate() {
            if emitter.root {
                self.visits[index] = Visit::Queued;
                self.frontier.push_back(index);
            }
        }
        if self.frontier.is_empty() {
            return false;
        }

        while let Some(current) = self.frontier.pop_front() {
            let source = emitters[current];
            for (index, candidate) in emitters.iter().enumerate() {
                if self.visits[index] == Visit::NotFound
                    && source.center.distance(candidate.center) <= source.radius
                {
                    self.visits[index] = Visit::Queued;
                    self.frontier.push_back(index);
                }
            }
            self.visits[current] = Visit::Checked;
        }
        true
    }
}

/// Emitters reachable from any root in `view`, in identifier order.
#[must_use]
pub fn reachable(view: &RangeView) -> Vec<StructureId> {
    let mut validator = RangeValidator::new();
    let emitters = view.emitters();
    if !validator.sweep(emitters) {
        return Vec::new();
    }
    emitters
        .iter()
        .zip(&validator.visits)
        .filter(|(_, visit)| **visit == Visit::Checked)
        .map(|(emitter, _)| emitter.structure)
        .collect()
}

/// Cells within `radius` of `center` that pass `is_ground`, ring by ring.
pub fn coverage<F>(center: CubicCoord, radius: u32, mut is_ground: F) -> Vec<CubicCoord>
where
    F: FnMut(CubicCoord) -> bool,
{
    disk(center, radius).filter(|cell| is_ground(*cell)).collect()
}

/// Union of the coverage of every emitter in `view`, sorted and deduplicated.
pub fn overlay<F>(view: &RangeView, mut is_ground: F) -> Vec<CubicCoord>
where
    F: FnMut(CubicCoord) -> bool,
{
    let mut cells: Vec<CubicCoord> = view
        .emitters()
        .iter()
        .flat_map(|emitter| disk(emitter.center, emitter.radius))
        .filter(|cell| is_ground(*cell))
        .collect();
    cells.sort_unstable();
    cells.dedup();
    cells
}
