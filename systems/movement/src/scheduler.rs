//! Explicit time-ordered task queue advanced by the owning loop.

use std::{collections::BTreeMap, time::Duration};

/// Queue of `(ready_at, action)` entries on a private clock.
///
/// Entries sharing a ready time are released in scheduling order.
#[derive(Clone, Debug)]
pub struct Scheduler<A> {
    now: Duration,
    sequence: u64,
    queue: BTreeMap<(Duration, u64), A>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            sequence: 0,
            queue: BTreeMap::new(),
        }
    }
}

impl<A> Scheduler<A> {
    /// Creates an empty scheduler with its clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scheduler time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of actions still waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queues `action` to become ready `delay` after the current time.
    pub fn schedule_after(&mut self, delay: Duration, action: A) {
        let ready_at = self.now.saturating_add(delay);
        let _ = self.queue.insert((ready_at, self.sequence), action);
        self.sequence = self.sequence.wrapping_add(1);
    }

    /// Moves the clock forward and releases every action that became ready.
    ///
    /// Released entries are appended to `out` together with their ready time.
    pub fn advance(&mut self, elapsed: Duration, out: &mut Vec<(Duration, A)>) {
        self.now = self.now.saturating_add(elapsed);
        while let Some(entry) = self.queue.first_entry() {
            if entry.key().0 > self.now {
                break;
            }
            let ((ready_at, _), action) = entry.remove_entry();
            out.push((ready_at, action));
        }
    }

    /// Reports whether any pending action matches `predicate`.
    pub fn contains_where<F>(&self, predicate: F) -> bool
    where
        F: FnMut(&A) -> bool,
    {
        self.queue.values().any(predicate)
    }

    /// Drops every pending action that matches `predicate`.
    pub fn cancel_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&A) -> bool,
    {
        let before = self.queue.len();
        self.queue.retain(|_, action| !predicate(action));
        before - self.queue.len()
    }
}
