//! Planet coordinates.
//!
//! A [`Location`] is a `(galaxy, system, position)` triple. Its string form is
//! `"galaxy_system_position"`, e.g. `"1_42_7"`, which is also how it appears as
//! a map key in serialized views.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Coordinate of a planet slot.
///
/// Ordered lexicographically by galaxy, then system, then position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location {
    /// Galaxy number (1-based).
    pub galaxy: u32,
    /// Solar system number inside the galaxy (1-based).
    pub system: u32,
    /// Planet position inside the system (1-based).
    pub position: u32,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub const fn new(galaxy: u32, system: u32, position: u32) -> Self {
        Self {
            galaxy,
            system,
            position,
        }
    }

    /// Travel distance between two coordinates.
    ///
    /// Crossing galaxies dominates, then crossing systems, then moving
    /// between positions of the same system.
    #[must_use]
    pub fn distance_to(&self, other: &Location) -> f64 {
        if self.galaxy != other.galaxy {
            20_000.0 * f64::from(self.galaxy.abs_diff(other.galaxy))
        } else if self.system != other.system {
            2_700.0 + 95.0 * f64::from(self.system.abs_diff(other.system))
        } else {
            1_000.0 + 5.0 * f64::from(self.position.abs_diff(other.position))
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.galaxy, self.system, self.position)
    }
}

impl FromStr for Location {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || GameError::MalformedLocation(s.to_string());
        let mut parts = s.split('_').map(|p| p.parse::<u32>().map_err(|_| malformed()));
        let (Some(galaxy), Some(system), Some(position), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        Ok(Self::new(galaxy?, system?, position?))
    }
}

impl TryFrom<String> for Location {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.to_string()
    }
}

/// Inclusive 1-based extent of the coordinate space.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseBounds {
    /// Number of galaxies.
    pub galaxies: u32,
    /// Systems per galaxy.
    pub systems: u32,
    /// Positions per system.
    pub positions: u32,
}

impl UniverseBounds {
    /// Number of coordinates inside the bounds.
    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.galaxies as u64 * self.systems as u64 * self.positions as u64
    }

    /// Returns `true` if `location` lies inside the bounds.
    #[must_use]
    pub const fn contains(&self, location: &Location) -> bool {
        location.galaxy >= 1
            && location.galaxy <= self.galaxies
            && location.system >= 1
            && location.system <= self.systems
            && location.position >= 1
            && location.position <= self.positions
    }

    /// Location with the given 0-based linear index, galaxy-major.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn nth(&self, index: u64) -> Location {
        let positions = self.positions as u64;
        let systems = self.systems as u64;
        Location::new(
            (index / (positions * systems)) as u32 + 1,
            ((index / positions) % systems) as u32 + 1,
            (index % positions) as u32 + 1,
        )
    }
}

impl Default for UniverseBounds {
    fn default() -> Self {
        Self {
            galaxies: 5,
            systems: 500,
            positions: 9,
        }
    }
}
