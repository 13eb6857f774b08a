//! Configuration schema types.
//!
//! These types are deserialized from the YAML game configuration. Region
//! corners accept either the storage format `"x y z"` or a `[x, y, z]`
//! sequence.

use serde::{Deserialize, Serialize};

use crate::engine::phase::PhaseTimings;
use crate::region::{Region, Vec3, WorldId};

/// Default green phase length in seconds.
pub const DEFAULT_GREEN_LIGHT_SECONDS: u32 = 3;

/// Default red phase length in seconds.
pub const DEFAULT_RED_LIGHT_SECONDS: u32 = 5;

/// Default delay between the red cue and arming, in ticks.
pub const DEFAULT_RED_LIGHT_DELAY_TICKS: u32 = 10;

/// Root game configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GameConfig {
    /// World to play in; empty or absent selects the host default world
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<String>,

    /// Region corners
    #[serde(default)]
    pub region: RegionConfig,

    /// Green phase length in seconds
    #[serde(default = "default_green")]
    pub green_light_seconds: u32,

    /// Red phase length in seconds
    #[serde(default = "default_red")]
    pub red_light_seconds: u32,

    /// Delay between the red cue and arming detection, in ticks
    #[serde(default = "default_delay")]
    pub red_light_delay_ticks: u32,

    /// Initial debug mode
    #[serde(default)]
    pub debug: bool,
}

const fn default_green() -> u32 {
    DEFAULT_GREEN_LIGHT_SECONDS
}

const fn default_red() -> u32 {
    DEFAULT_RED_LIGHT_SECONDS
}

const fn default_delay() -> u32 {
    DEFAULT_RED_LIGHT_DELAY_TICKS
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world: None,
            region: RegionConfig::default(),
            green_light_seconds: DEFAULT_GREEN_LIGHT_SECONDS,
            red_light_seconds: DEFAULT_RED_LIGHT_SECONDS,
            red_light_delay_ticks: DEFAULT_RED_LIGHT_DELAY_TICKS,
            debug: false,
        }
    }
}

impl GameConfig {
    /// Configured world name, treating an empty string as absent.
    #[must_use]
    pub fn world_name(&self) -> Option<&str> {
        self.world.as_deref().map(str::trim).filter(|w| !w.is_empty())
    }

    /// Phase timings for this configuration.
    #[must_use]
    pub const fn timings(&self) -> PhaseTimings {
        PhaseTimings::from_seconds(
            self.green_light_seconds,
            self.red_light_seconds,
            self.red_light_delay_ticks,
        )
    }

    /// Builds the region in the resolved world.
    #[must_use]
    pub fn region_in(&self, world: WorldId) -> Region {
        Region::from_corners(world, self.region.first.0, self.region.second.0)
    }
}

/// Region corner pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionConfig {
    /// First marked corner
    #[serde(default)]
    pub first: Corner,
    /// Second marked corner
    #[serde(default)]
    pub second: Corner,
}

/// A region corner.
///
/// Defaults to the origin, which storage uses to mean "not marked".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "CornerRepr", into = "String")]
pub struct Corner(pub Vec3);

#[derive(Deserialize)]
#[serde(untagged)]
enum CornerRepr {
    Text(String),
    Triple([f64; 3]),
}

impl TryFrom<CornerRepr> for Corner {
    type Error = String;

    fn try_from(repr: CornerRepr) -> Result<Self, Self::Error> {
        match repr {
            CornerRepr::Text(text) => parse_corner(&text).map(Self),
            CornerRepr::Triple([x, y, z]) => Ok(Self(Vec3::new(x, y, z))),
        }
    }
}

impl From<Corner> for String {
    fn from(corner: Corner) -> Self {
        let Vec3 { x, y, z } = corner.0;
        format!("{x} {y} {z}")
    }
}

/// Parses the `"x y z"` corner storage format.
///
/// # Errors
///
/// Returns a description of the problem if the text does not hold exactly
/// three numbers.
pub fn parse_corner(text: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!(
            "expected three space-separated coordinates, got '{text}'"
        ));
    };
    let parse = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| format!("'{s}' is not a number in corner '{text}'"))
    };
    Ok(Vec3::new(parse(x)?, parse(y)?, parse(z)?))
}
