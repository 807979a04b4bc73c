//! Hexagonal coordinate system shared by every Hexhold crate.
//!
//! Per-tile storage is keyed by row-parity shifted [`OffsetCoord`] values,
//! while distance and direction arithmetic happens in symmetric
//! [`CubicCoord`] space. The path router additionally addresses the top and
//! bottom apex of each pointy-top hex through [`HexVertex`].

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Horizontal distance between a hex center and its side vertices.
pub const SQRT_3_OVER_2: f32 = 0.866_025_4;

/// Rectangular storage address of a hex cell with odd rows shifted right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OffsetCoord {
    x: i32,
    y: i32,
}

impl OffsetCoord {
    /// Creates a new offset coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Converts the offset address into cubic space.
    ///
    /// The row shift `(y - (y & 1)) / 2` floors toward negative infinity for
    /// negative rows, which keeps the conversion an exact bijection.
    #[must_use]
    pub const fn to_cubic(self) -> CubicCoord {
        let x = self.x - (self.y - (self.y & 1)) / 2;
        CubicCoord {
            x,
            y: self.y,
            z: -x - self.y,
        }
    }

    /// Hex distance between two offset coordinates.
    #[must_use]
    pub fn distance(self, other: OffsetCoord) -> u32 {
        self.to_cubic().distance(other.to_cubic())
    }
}

/// Symmetric hex coordinate with the invariant `x + y + z == 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "[i32; 3]", into = "[i32; 3]")]
pub struct CubicCoord {
    x: i32,
    y: i32,
    z: i32,
}

impl CubicCoord {
    /// The origin of cubic space.
    pub const ZERO: Self = Self::from_xy(0, 0);

    /// Creates a cubic coordinate, rejecting triples that leave the `x+y+z=0` plane.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Option<Self> {
        if x + y + z == 0 {
            Some(Self { x, y, z })
        } else {
            None
        }
    }

    /// Creates a cubic coordinate from its first two components.
    #[must_use]
    pub const fn from_xy(x: i32, y: i32) -> Self {
        Self { x, y, z: -x - y }
    }

    /// First cubic component.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Second cubic component, equal to the offset row.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Third cubic component.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Converts back into offset storage coordinates.
    #[must_use]
    pub const fn to_offset(self) -> OffsetCoord {
        OffsetCoord {
            x: self.x + (self.y - (self.y & 1)) / 2,
            y: self.y,
        }
    }

    /// Number of single hex steps between two coordinates.
    #[must_use]
    pub fn distance(self, other: CubicCoord) -> u32 {
        let delta = self - other;
        (delta.x.unsigned_abs() + delta.y.unsigned_abs() + delta.z.unsigned_abs()) / 2
    }

    /// Coordinate of the adjacent hex in the provided direction.
    #[must_use]
    pub fn neighbor(self, direction: HexDirection) -> CubicCoord {
        self + direction.offset()
    }

    /// Planar position of the hex center for a hex with unit circumradius.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(
            SQRT_3_OVER_2 * (self.x - self.z) as f32,
            1.5 * self.y as f32,
        )
    }
}

impl TryFrom<[i32; 3]> for CubicCoord {
    type Error = String;

    fn try_from(value: [i32; 3]) -> Result<Self, Self::Error> {
        let [x, y, z] = value;
        Self::new(x, y, z).ok_or_else(|| format!("cubic coordinate {value:?} does not sum to zero"))
    }
}

impl From<CubicCoord> for [i32; 3] {
    fn from(value: CubicCoord) -> Self {
        [value.x, value.y, value.z]
    }
}

impl Add for CubicCoord {
    type Output = CubicCoord;

    fn add(self, rhs: CubicCoord) -> CubicCoord {
        CubicCoord {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl AddAssign for CubicCoord {
    fn add_assign(&mut self, rhs: CubicCoord) {
        *self = *self + rhs;
    }
}

impl Sub for CubicCoord {
    type Output = CubicCoord;

    fn sub(self, rhs: CubicCoord) -> CubicCoord {
        CubicCoord {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Neg for CubicCoord {
    type Output = CubicCoord;

    fn neg(self) -> CubicCoord {
        CubicCoord {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Mul<i32> for CubicCoord {
    type Output = CubicCoord;

    fn mul(self, rhs: i32) -> CubicCoord {
        CubicCoord {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

/// The six unit directions of a pointy-top hex grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexDirection {
    /// Toward increasing `x`, same row.
    Right,
    /// One row up, half a cell right.
    TopRight,
    /// One row up, half a cell left.
    TopLeft,
    /// Toward decreasing `x`, same row.
    Left,
    /// One row down, half a cell left.
    BottomLeft,
    /// One row down, half a cell right.
    BottomRight,
}

impl HexDirection {
    /// Order in which [`Ring`] walks the sides of a ring.
    pub const RING_WALK: [HexDirection; 6] = [
        HexDirection::TopRight,
        HexDirection::TopLeft,
        HexDirection::Left,
        HexDirection::BottomLeft,
        HexDirection::BottomRight,
        HexDirection::Right,
    ];

    /// Unit cubic offset of the direction.
    #[must_use]
    pub const fn offset(self) -> CubicCoord {
        match self {
            Self::Right => CubicCoord::from_xy(1, 0),
            Self::TopRight => CubicCoord::from_xy(0, 1),
            Self::TopLeft => CubicCoord::from_xy(-1, 1),
            Self::Left => CubicCoord::from_xy(-1, 0),
            Self::BottomLeft => CubicCoord::from_xy(0, -1),
            Self::BottomRight => CubicCoord::from_xy(1, -1),
        }
    }
}

/// Which of the two apex points of a hex a [`HexVertex`] addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Apex {
    /// Upper apex, one unit above the hex center.
    Top,
    /// Lower apex, one unit below the hex center.
    Bottom,
}

/// Apex point of a hex, used as a node of the walkable vertex graph.
///
/// Every lattice vertex of a pointy-top hex grid is the top apex of exactly
/// one hex or the bottom apex of exactly one hex, so this addressing is unique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexVertex {
    cell: CubicCoord,
    apex: Apex,
}

impl HexVertex {
    /// Creates a vertex for the given hex and apex.
    #[must_use]
    pub const fn new(cell: CubicCoord, apex: Apex) -> Self {
        Self { cell, apex }
    }

    /// Top apex of the provided hex.
    #[must_use]
    pub const fn top(cell: CubicCoord) -> Self {
        Self::new(cell, Apex::Top)
    }

    /// Bottom apex of the provided hex.
    #[must_use]
    pub const fn bottom(cell: CubicCoord) -> Self {
        Self::new(cell, Apex::Bottom)
    }

    /// Hex owning this apex.
    #[must_use]
    pub const fn cell(&self) -> CubicCoord {
        self.cell
    }

    /// Apex polarity.
    #[must_use]
    pub const fn apex(&self) -> Apex {
        self.apex
    }

    /// Reports whether this is a top apex.
    #[must_use]
    pub const fn is_top(&self) -> bool {
        matches!(self.apex, Apex::Top)
    }

    /// Planar position: hex center shifted one unit up or down.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        let center = self.cell.center();
        match self.apex {
            Apex::Top => Vec2::new(center.x, center.y + 1.0),
            Apex::Bottom => Vec2::new(center.x, center.y - 1.0),
        }
    }

    /// Euclidean distance between the planar positions of two vertices.
    #[must_use]
    pub fn distance(&self, other: &HexVertex) -> f32 {
        self.position().distance(other.position())
    }
}

/// Iterator over the cubic coordinates at an exact hex distance from a center.
///
/// Radius zero yields only the center. Any other radius starts at
/// `center + (r, -r, 0)` and walks [`HexDirection::RING_WALK`], `r` steps per
/// side, yielding `6r` distinct coordinates.
#[derive(Clone, Debug)]
pub struct Ring {
    center: CubicCoord,
    radius: u32,
    cursor: CubicCoord,
    side: usize,
    step: u32,
    finished: bool,
}

impl Ring {
    /// Creates a ring iterator of the given radius.
    #[must_use]
    pub fn new(center: CubicCoord, radius: u32) -> Self {
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        Self {
            center,
            radius,
            cursor: CubicCoord::from_xy(r, -r),
            side: 0,
            step: 0,
            finished: false,
        }
    }
}

impl Iterator for Ring {
    type Item = CubicCoord;

    fn next(&mut self) -> Option<CubicCoord> {
        if self.finished {
            return None;
        }

        if self.radius == 0 {
            self.finished = true;
            return Some(self.center);
        }

        let current = self.center + self.cursor;
        self.cursor += HexDirection::RING_WALK[self.side].offset();
        self.step += 1;
        if self.step == self.radius {
            self.step = 0;
            self.side += 1;
            if self.side == HexDirection::RING_WALK.len() {
                self.finished = true;
            }
        }

        Some(current)
    }
}

/// Enumerates the ring of the given radius around `center`.
#[must_use]
pub fn ring(center: CubicCoord, radius: u32) -> Ring {
    Ring::new(center, radius)
}

/// Enumerates every coordinate within `radius` of `center`, ring by ring.
pub fn disk(center: CubicCoord, radius: u32) -> impl Iterator<Item = CubicCoord> {
    (0..=radius).flat_map(move |r| Ring::new(center, r))
}
