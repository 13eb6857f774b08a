//! World positions and the monitored region.
//!
//! A [`Region`] is an axis-aligned box built from two arbitrary corner
//! points. Containment is inclusive on all six faces and requires the
//! queried position to be in the region's world.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stable identifier of a host world.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorldId(Arc<str>);

impl WorldId {
    /// Creates a new `WorldId` from a name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the world name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Serialize for WorldId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WorldId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// East-west axis
    pub x: f64,
    /// Vertical axis
    pub y: f64,
    /// North-south axis
    pub z: f64,
}

impl Vec3 {
    /// The world origin, used by storage as the "unset corner" sentinel.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise minimum.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Component-wise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }

    /// Returns `true` when all three components are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} {:.0} {:.0}", self.x, self.y, self.z)
    }
}

/// A position: a point qualified by the world it lives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// World the point belongs to
    pub world: WorldId,
    /// Coordinates within that world
    pub point: Vec3,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub fn new(world: WorldId, point: Vec3) -> Self {
        Self { world, point }
    }
}

/// Axis-aligned monitored volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    world: WorldId,
    first: Vec3,
    second: Vec3,
    min: Vec3,
    max: Vec3,
}

impl Region {
    /// Builds a region from two arbitrary corners.
    ///
    /// The min/max corners are derived component-wise, so the corners may be
    /// given in any order.
    #[must_use]
    pub fn from_corners(world: WorldId, first: Vec3, second: Vec3) -> Self {
        Self {
            world,
            first,
            second,
            min: first.min(second),
            max: first.max(second),
        }
    }

    /// World this region belongs to.
    #[must_use]
    pub const fn world(&self) -> &WorldId {
        &self.world
    }

    /// Minimum corner.
    #[must_use]
    pub const fn min(&self) -> Vec3 {
        self.min
    }

    /// Maximum corner.
    #[must_use]
    pub const fn max(&self) -> Vec3 {
        self.max
    }

    /// Corners as they were marked, before min/max normalization.
    #[must_use]
    pub const fn corners(&self) -> (Vec3, Vec3) {
        (self.first, self.second)
    }

    /// Returns `true` if the region has been set.
    ///
    /// Both corners must differ from the origin sentinel and from each
    /// other.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.first != Vec3::ORIGIN && self.second != Vec3::ORIGIN && self.first != self.second
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, position: &Position) -> bool {
        if position.world != self.world {
            return false;
        }
        let p = position.point;
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] .. [{}]", self.world, self.min, self.max)
    }
}
