//! Game systems that read and mutate the entity tree.
//!
//! Per-tick systems implement [`System`] and run in a fixed order:
//!
//! 1. [`ProductionSystem`]: storage, energy and resource accrual
//! 2. [`MissionSystem`]: travel countdown and arrivals (combat included)
//! 3. [`FleetMaintenance`]: merge docked fleets, drop empty ones
//!
//! Player actions (upgrades, ship building, mission orders) are plain
//! functions in the same modules, called between ticks.
//!
//! # Invariants
//!
//! - Systems iterate entities in id order so a seeded run is reproducible.
//! - A refused action leaves the state untouched.

pub mod combat;
pub mod mission;
pub mod position;
pub mod production;
pub mod shipyard;
pub mod spawn;
pub mod upgrade;

pub use mission::{FleetMaintenance, MissionSystem};
pub use position::LocationIndex;
pub use production::ProductionSystem;

use rand_chacha::ChaCha8Rng;

use crate::arena::Arena;
use crate::config::SimConfig;
use crate::entity::components::{PlayerId, RequirementsComponent};
use crate::entity::EntityId;
use crate::error::{GameError, Result};
use crate::event::{EventLog, GameEvent};
use crate::location::Location;

/// Mutable view of the simulation handed to systems and actions.
pub struct SimContext<'a> {
    /// Entity storage.
    pub arena: &'a mut Arena,
    /// Coordinate index.
    pub index: &'a mut LocationIndex,
    /// Seeded randomness.
    pub rng: &'a mut ChaCha8Rng,
    /// Event sink.
    pub events: &'a mut EventLog,
    /// Settings and catalog.
    pub config: &'a SimConfig,
    /// Tick counter stamped on events.
    pub tick: u64,
}

impl SimContext<'_> {
    /// Records an event at the current tick.
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(self.tick, event);
    }

    /// Player entity for `player`.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownPlayer`] if nobody registered under that id.
    pub fn player_entity(&self, player: &PlayerId) -> Result<EntityId> {
        player_entity(self.arena, player)
    }

    /// Planet entity at `location`.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownLocation`] if the coordinate is empty.
    pub fn planet_at(&self, location: &Location) -> Result<EntityId> {
        self.index
            .planet_at(location)
            .ok_or(GameError::UnknownLocation(*location))
    }

    /// Planet entity at `location`, checked to belong to `player`.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownPlayer`], [`GameError::UnknownLocation`] or
    /// [`GameError::NotPlanetOwner`].
    pub fn owned_planet(&self, player: &PlayerId, location: &Location) -> Result<EntityId> {
        self.player_entity(player)?;
        let planet = self.planet_at(location)?;
        let owner = self.arena.planet(planet)?.planet.owner.as_ref();
        if owner != Some(player) {
            return Err(GameError::NotPlanetOwner {
                player: player.to_string(),
                location: *location,
            });
        }
        Ok(planet)
    }
}

/// A per-tick step of the simulation.
pub trait System: Send + Sync {
    /// Name used in tracing spans.
    fn name(&self) -> &'static str;

    /// Advances this system by `dt` seconds.
    ///
    /// # Errors
    ///
    /// Only on broken internal references; game-rule outcomes never fail.
    fn run(&self, ctx: &mut SimContext<'_>, dt: f64) -> Result<()>;
}

/// Player entity registered under `player`.
///
/// # Errors
///
/// [`GameError::UnknownPlayer`], or [`GameError::MissingRoot`] on an
/// uninitialized arena.
pub fn player_entity(arena: &Arena, player: &PlayerId) -> Result<EntityId> {
    arena
        .game_state(arena.root()?)?
        .players
        .get(player)
        .copied()
        .ok_or_else(|| GameError::UnknownPlayer(player.to_string()))
}

/// The world entity below the root.
///
/// # Errors
///
/// [`GameError::MissingRoot`] on an uninitialized arena.
pub fn world_entity(arena: &Arena) -> Result<EntityId> {
    Ok(arena.game_state(arena.root()?)?.world)
}

/// Checks building levels on `planet` and research levels of `player`.
///
/// A missing slot or research line counts as level 0.
///
/// # Errors
///
/// Only on broken references.
pub fn requirements_met(
    arena: &Arena,
    planet: EntityId,
    player: EntityId,
    requirements: Option<&RequirementsComponent>,
) -> Result<bool> {
    let Some(requirements) = requirements else {
        return Ok(true);
    };
    let buildings = &arena.planet(planet)?.buildings;
    for (slot, required) in &requirements.buildings {
        let level = match buildings.get(slot) {
            Some(id) => arena.building(*id)?.level(),
            None => 0,
        };
        if level < *required {
            return Ok(false);
        }
    }
    let research = &arena.player(player)?.research;
    for (name, required) in &requirements.research {
        let level = match research.get(name) {
            Some(id) => arena.research(*id)?.research.level,
            None => 0,
        };
        if level < *required {
            return Ok(false);
        }
    }
    Ok(true)
}

/// The player's docked fleet at `location`, oldest first if several exist.
///
/// # Errors
///
/// Only on broken references.
pub fn docked_fleet(arena: &Arena, player: EntityId, location: &Location) -> Result<Option<EntityId>> {
    for fleet in &arena.player(player)?.fleets {
        if arena.fleet(*fleet)?.fleet.current_location() == Some(*location) {
            return Ok(Some(*fleet));
        }
    }
    Ok(None)
}
