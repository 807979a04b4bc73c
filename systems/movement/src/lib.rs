#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Unit movement along routed paths.
//!
//! Parties leave one member at a time, `dispatch_delay` apart, through an
//! explicit [`Scheduler`] that the owning loop advances every frame. Each
//! departed member becomes a [`Walker`] that slides from apex to apex at a
//! fixed speed. Movement never touches the world, so dropping a walker is all
//! it takes to cancel it.

mod scheduler;

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use glam::Vec2;
use hexhold_core::{HexVertex, UnitId};
use thiserror::Error;
use tracing::{debug, warn};

pub use scheduler::Scheduler;

/// Distance below which a walker counts as having reached a point.
pub const ARRIVAL_THRESHOLD: f32 = 0.01;

/// Configuration parameters required to construct the movement system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    dispatch_delay: Duration,
    walk_speed: f32,
}

impl Config {
    /// Creates a new configuration from the stagger delay and walking speed.
    #[must_use]
    pub const fn new(dispatch_delay: Duration, walk_speed: f32) -> Self {
        Self {
            dispatch_delay,
            walk_speed,
        }
    }

    /// Delay before each party member departs.
    #[must_use]
    pub const fn dispatch_delay(&self) -> Duration {
        self.dispatch_delay
    }

    /// Walking speed in world units per second.
    #[must_use]
    pub const fn walk_speed(&self) -> f32 {
        self.walk_speed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_millis(200), 1.0)
    }
}

/// Reasons a party cannot be dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The router found no path between the endpoints.
    #[error("no path connects the party to its destination")]
    EmptyPath,
    /// A member is already walking or waiting to depart.
    #[error("unit {0:?} is already travelling")]
    AlreadyTravelling(UnitId),
    /// A member appears more than once in the party.
    #[error("unit {0:?} is listed twice in the party")]
    DuplicateMember(UnitId),
}

/// Notifications emitted while advancing movement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MovementEvent {
    /// A unit left the first point of its path.
    Departed {
        /// Departing unit.
        unit: UnitId,
        /// Position the unit started from.
        at: Vec2,
    },
    /// A unit reached the last point of its path.
    Arrived {
        /// Arriving unit.
        unit: UnitId,
        /// Final position of the unit.
        at: Vec2,
    },
}

/// A unit moving point to point along a fixed route.
#[derive(Clone, Debug, PartialEq)]
pub struct Walker {
    unit: UnitId,
    points: Vec<Vec2>,
    next: usize,
    position: Vec2,
    speed: f32,
}

impl Walker {
    /// Places a walker on the first point of `points`.
    ///
    /// Returns `None` for an empty route.
    #[must_use]
    pub fn new(unit: UnitId, points: Vec<Vec2>, speed: f32) -> Option<Self> {
        let position = *points.first()?;
        Some(Self {
            unit,
            points,
            next: 0,
            position,
            speed,
        })
    }

    /// Unit carried by the walker.
    #[must_use]
    pub const fn unit(&self) -> UnitId {
        self.unit
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Reports whether the final point was reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.next >= self.points.len()
    }

    /// Moves toward the upcoming points for `seconds` of travel.
    ///
    /// Distance left over after reaching a point carries on toward the next
    /// one. Returns `true` once the route is complete.
    pub fn advance(&mut self, seconds: f32) -> bool {
        let mut budget = (self.speed * seconds).max(0.0);
        while let Some(target) = self.points.get(self.next).copied() {
            let remaining = self.position.distance(target);
            if remaining <= budget {
                self.position = target;
                budget -= remaining;
            } else {
                self.position += (target - self.position) / remaining * budget;
                budget = 0.0;
            }

            if self.position.distance(target) < ARRIVAL_THRESHOLD {
                self.position = target;
                self.next += 1;
                continue;
            }
            break;
        }
        self.is_finished()
    }
}

/// Departure waiting in the scheduler.
#[derive(Clone, Debug, PartialEq)]
struct Departure {
    unit: UnitId,
    points: Vec<Vec2>,
}

/// Pure system staggering party departures and moving walkers.
#[derive(Debug)]
pub struct Movement {
    config: Config,
    scheduler: Scheduler<Departure>,
    walkers: BTreeMap<UnitId, Walker>,
}

impl Movement {
    /// Creates a new movement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            scheduler: Scheduler::new(),
            walkers: BTreeMap::new(),
        }
    }

    /// Schedules every member of a party to walk `path`.
    ///
    /// The first member leaves one `dispatch_delay` from now and each
    /// following member one delay after the previous one.
    pub fn dispatch(&mut self, members: &[UnitId], path: &[HexVertex]) -> Result<(), DispatchError> {
        if path.is_empty() {
            warn!(members = members.len(), "no path for party dispatch");
            return Err(DispatchError::EmptyPath);
        }
        if let Some(busy) = members.iter().copied().find(|unit| self.is_travelling(*unit)) {
            return Err(DispatchError::AlreadyTravelling(busy));
        }
        let mut seen = BTreeSet::new();
        if let Some(twice) = members.iter().copied().find(|unit| !seen.insert(*unit)) {
            return Err(DispatchError::DuplicateMember(twice));
        }

        let points: Vec<Vec2> = path.iter().map(HexVertex::position).collect();
        let mut delay = Duration::ZERO;
        for unit in members {
            delay = delay.saturating_add(self.config.dispatch_delay);
            self.scheduler.schedule_after(
                delay,
                Departure {
                    unit: *unit,
                    points: points.clone(),
                },
            );
        }
        debug!(members = members.len(), points = points.len(), "party dispatched");
        Ok(())
    }

    /// Advances the clock, releasing departures and moving every walker.
    ///
    /// Walkers that depart during this step only travel for the time elapsed
    /// since their departure.
    pub fn advance(&mut self, elapsed: Duration, out: &mut Vec<MovementEvent>) {
        let mut released = Vec::new();
        self.scheduler.advance(elapsed, &mut released);
        let now = self.scheduler.now();
        let mut fresh: BTreeMap<UnitId, Duration> = BTreeMap::new();
        for (ready_at, departure) in released {
            if let Some(walker) = Walker::new(departure.unit, departure.points, self.config.walk_speed) {
                out.push(MovementEvent::Departed {
                    unit: walker.unit(),
                    at: walker.position(),
                });
                let _ = fresh.insert(walker.unit(), now.saturating_sub(ready_at));
                let _ = self.walkers.insert(walker.unit(), walker);
            }
        }

        let mut arrived = Vec::new();
        for (unit, walker) in &mut self.walkers {
            let travel = fresh.get(unit).copied().unwrap_or(elapsed);
            if walker.advance(travel.as_secs_f32()) {
                arrived.push(*unit);
            }
        }
        for unit in arrived {
            if let Some(walker) = self.walkers.remove(&unit) {
                out.push(MovementEvent::Arrived {
                    unit,
                    at: walker.position(),
                });
            }
        }
    }

    /// Stops a unit wherever it is, whether walking or waiting to depart.
    pub fn cancel(&mut self, unit: UnitId) -> bool {
        let pending = self.scheduler.cancel_where(|departure| departure.unit == unit);
        self.walkers.remove(&unit).is_some() || pending > 0
    }

    /// Reports whether a unit is walking or waiting to depart.
    #[must_use]
    pub fn is_travelling(&self, unit: UnitId) -> bool {
        self.walkers.contains_key(&unit)
            || self
                .scheduler
                .contains_where(|departure| departure.unit == unit)
    }

    /// Walkers currently on the move in unit order.
    pub fn walkers(&self) -> impl Iterator<Item = &Walker> {
        self.walkers.values()
    }

    /// Reports whether nothing is walking or waiting.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.walkers.is_empty() && self.scheduler.pending() == 0
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walker_carries_leftover_distance_across_points() {
        let points = vec![Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)];
        let mut walker = Walker::new(UnitId::new(0), points, 2.0).expect("route");

        assert!(!walker.advance(0.75));
        assert!((walker.position() - Vec2::new(1.0, 0.5)).length() < 1e-5);

        assert!(walker.advance(0.25));
        assert_eq!(walker.position(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn empty_route_has_no_walker() {
        assert!(Walker::new(UnitId::new(1), Vec::new(), 1.0).is_none());
    }

    #[test]
    fn near_misses_snap_to_the_point() {
        let points = vec![Vec2::ZERO, Vec2::new(1.0, 0.0)];
        let mut walker = Walker::new(UnitId::new(2), points, 1.0).expect("route");

        assert!(walker.advance(0.995));
        assert_eq!(walker.position(), Vec2::new(1.0, 0.0));
    }
}
