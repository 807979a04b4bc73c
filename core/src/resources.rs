//! Resource cost vectors and the economy collaborator consulted on settlement.

use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Amount of each resource the settlement tracks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    /// Magic essence.
    pub magic: u32,
    /// Timber.
    pub wood: u32,
    /// Quarried stone.
    pub stone: u32,
}

impl Resources {
    /// An empty resource vector.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Creates a resource vector.
    #[must_use]
    pub const fn new(magic: u32, wood: u32, stone: u32) -> Self {
        Self { magic, wood, stone }
    }

    /// Reports whether every component is less than or equal to `other`'s.
    #[must_use]
    pub const fn fits_within(&self, other: &Resources) -> bool {
        self.magic <= other.magic && self.wood <= other.wood && self.stone <= other.stone
    }

    /// Scales every component by `factor`, rounding down.
    #[must_use]
    pub fn scaled(&self, factor: f32) -> Resources {
        let scale = |value: u32| (value as f32 * factor.max(0.0)).floor() as u32;
        Resources::new(scale(self.magic), scale(self.wood), scale(self.stone))
    }
}

impl Add for Resources {
    type Output = Resources;

    fn add(self, rhs: Resources) -> Resources {
        Resources::new(
            self.magic.saturating_add(rhs.magic),
            self.wood.saturating_add(rhs.wood),
            self.stone.saturating_add(rhs.stone),
        )
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, rhs: Resources) {
        *self = *self + rhs;
    }
}

impl Sub for Resources {
    type Output = Resources;

    /// Component-wise subtraction, clamped at zero.
    fn sub(self, rhs: Resources) -> Resources {
        Resources::new(
            self.magic.saturating_sub(rhs.magic),
            self.wood.saturating_sub(rhs.wood),
            self.stone.saturating_sub(rhs.stone),
        )
    }
}

impl SubAssign for Resources {
    fn sub_assign(&mut self, rhs: Resources) {
        *self = *self - rhs;
    }
}

impl Mul<u32> for Resources {
    type Output = Resources;

    fn mul(self, rhs: u32) -> Resources {
        Resources::new(
            self.magic.saturating_mul(rhs),
            self.wood.saturating_mul(rhs),
            self.stone.saturating_mul(rhs),
        )
    }
}

/// Economy collaborator gating and settling structure edits.
pub trait Economy {
    /// Reports whether the provided cost can currently be paid.
    fn can_afford(&self, cost: &Resources) -> bool;

    /// Deducts the provided cost.
    fn charge(&mut self, cost: &Resources);

    /// Returns resources for a structure that was removed.
    fn refund(&mut self, cost: &Resources);
}

/// Simple resource pool that refunds a fixed fraction of removed structures.
#[derive(Clone, Debug, PartialEq)]
pub struct Stockpile {
    balance: Resources,
    refund_rate: f32,
}

impl Stockpile {
    /// Creates a stockpile holding `initial` resources.
    ///
    /// `refund_rate` is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn new(initial: Resources, refund_rate: f32) -> Self {
        Self {
            balance: initial,
            refund_rate: refund_rate.clamp(0.0, 1.0),
        }
    }

    /// A stockpile with effectively unlimited resources and full refunds.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(Resources::new(u32::MAX, u32::MAX, u32::MAX), 1.0)
    }

    /// Currently held resources.
    #[must_use]
    pub const fn balance(&self) -> Resources {
        self.balance
    }

    /// Fraction of the build cost returned on removal.
    #[must_use]
    pub const fn refund_rate(&self) -> f32 {
        self.refund_rate
    }

    /// Adds produced resources to the balance.
    pub fn deposit(&mut self, amount: Resources) {
        self.balance += amount;
    }
}

impl Economy for Stockpile {
    fn can_afford(&self, cost: &Resources) -> bool {
        cost.fits_within(&self.balance)
    }

    fn charge(&mut self, cost: &Resources) {
        self.balance -= *cost;
    }

    fn refund(&mut self, cost: &Resources) {
        self.balance += cost.scaled(self.refund_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affordability_is_component_wise() {
        let stockpile = Stockpile::new(Resources::new(5, 5, 0), 1.0);
        assert!(stockpile.can_afford(&Resources::new(5, 1, 0)));
        assert!(!stockpile.can_afford(&Resources::new(1, 1, 1)));
    }

    #[test]
    fn refunds_apply_the_refund_rate() {
        let mut stockpile = Stockpile::new(Resources::ZERO, 0.5);
        stockpile.refund(&Resources::new(10, 5, 3));
        assert_eq!(stockpile.balance(), Resources::new(5, 2, 1));
    }

    #[test]
    fn charging_never_underflows() {
        let mut stockpile = Stockpile::new(Resources::new(1, 0, 0), 1.0);
        stockpile.charge(&Resources::new(3, 3, 3));
        assert_eq!(stockpile.balance(), Resources::ZERO);
    }
}
