//! Coordinate allocation and ownership lookup.
//!
//! [`LocationIndex`] keeps the coordinate -> planet bijection and, per player,
//! the ordered list of owned coordinates.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::components::PlayerId;
use crate::entity::EntityId;
use crate::error::{GameError, Result};
use crate::location::{Location, UniverseBounds};

/// Random probes before falling back to enumerating the free coordinates.
const MAX_PROBES: u32 = 64;

/// Coordinate index of every planet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationIndex {
    planets: BTreeMap<Location, EntityId>,
    owned: BTreeMap<PlayerId, Vec<Location>>,
}

impl LocationIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a player known to the index before it owns anything.
    pub fn register_player(&mut self, player: PlayerId) {
        self.owned.entry(player).or_default();
    }

    /// Records `planet` at `location`, appending it to the owner's list.
    ///
    /// # Errors
    ///
    /// [`GameError::LocationOccupied`] if a planet is already registered there.
    pub fn register(
        &mut self,
        location: Location,
        planet: EntityId,
        owner: Option<&PlayerId>,
    ) -> Result<()> {
        if self.planets.contains_key(&location) {
            return Err(GameError::LocationOccupied(location));
        }
        self.planets.insert(location, planet);
        if let Some(owner) = owner {
            self.owned.entry(owner.clone()).or_default().push(location);
        }
        Ok(())
    }

    /// Returns `true` if no planet is registered at `location`.
    #[must_use]
    pub fn is_free(&self, location: &Location) -> bool {
        !self.planets.contains_key(location)
    }

    /// Planet registered at `location`.
    #[must_use]
    pub fn planet_at(&self, location: &Location) -> Option<EntityId> {
        self.planets.get(location).copied()
    }

    /// Coordinates owned by `player`, in registration order.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownPlayer`] if the player was never registered.
    pub fn player_planets(&self, player: &PlayerId) -> Result<&[Location]> {
        self.owned
            .get(player)
            .map(Vec::as_slice)
            .ok_or_else(|| GameError::UnknownPlayer(player.to_string()))
    }

    /// Returns `true` if `player` owns the planet at `location`.
    #[must_use]
    pub fn owns(&self, player: &PlayerId, location: &Location) -> bool {
        self.owned
            .get(player)
            .is_some_and(|locations| locations.contains(location))
    }

    /// Number of registered planets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.planets.len()
    }

    /// Returns `true` if no planet is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.planets.is_empty()
    }

    /// Picks a free coordinate uniformly at random inside `bounds`.
    ///
    /// Returns `None` when every coordinate inside `bounds` is taken.
    pub fn random_free_location<R: Rng>(
        &self,
        bounds: &UniverseBounds,
        rng: &mut R,
    ) -> Option<Location> {
        let capacity = bounds.capacity();
        let occupied = self.planets.keys().filter(|l| bounds.contains(l)).count() as u64;
        if capacity == 0 || occupied >= capacity {
            return None;
        }

        for _ in 0..MAX_PROBES {
            let candidate = Location::new(
                rng.gen_range(1..=bounds.galaxies),
                rng.gen_range(1..=bounds.systems),
                rng.gen_range(1..=bounds.positions),
            );
            if self.is_free(&candidate) {
                return Some(candidate);
            }
        }

        // Dense universe: pick the k-th free slot directly.
        let k = rng.gen_range(0..capacity - occupied);
        (0..capacity)
            .map(|i| bounds.nth(i))
            .filter(|l| self.is_free(l))
            .nth(usize::try_from(k).ok()?)
    }
}
