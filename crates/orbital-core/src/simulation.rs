//! The simulation context object.
//!
//! `Simulation` owns everything a game needs: the entity arena, the location
//! index, the seeded RNG, the event log and the configuration. Player actions
//! run between ticks; [`Simulation::tick`] runs the per-tick systems in order:
//!
//! 1. **PRODUCTION**: storage, energy and accrual for every planet
//! 2. **MISSIONS**: travel countdown and arrivals, combat included
//! 3. **MAINTENANCE**: merge co-located docked fleets, drop empty ones
//!
//! # Determinism
//!
//! Given the same config (seed included) and the same sequence of actions and
//! tick durations, two simulations produce identical snapshots and events:
//! - Entities are iterated in id order (via `BTreeMap`)
//! - All randomness comes from one `ChaCha8Rng` seeded from the config
//!
//! # Example
//!
//! ```
//! use orbital_core::config::SimConfig;
//! use orbital_core::entity::components::PlayerId;
//! use orbital_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//! let alice = PlayerId::new("alice");
//! assert!(sim.create_player(&alice, "Alice").unwrap().success);
//!
//! for _ in 0..10 {
//!     sim.tick(1.0).unwrap();
//! }
//!
//! assert_eq!(sim.tick_count(), 10);
//! assert_eq!(sim.player_planets(&alice).unwrap().len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace_span};

use crate::arena::Arena;
use crate::config::SimConfig;
use crate::entity::components::{Mission, PlayerId};
use crate::error::{ActionOutcome, Refusal, Result};
use crate::event::{EventLog, EventRecord};
use crate::location::Location;
use crate::resources::ResourceMap;
use crate::systems::{
    self, mission, shipyard, spawn, upgrade, FleetMaintenance, LocationIndex, MissionSystem,
    ProductionSystem, SimContext, System,
};
use crate::view::{FleetView, GameSnapshot, PlanetView};

// =============================================================================
// Simulation
// =============================================================================

/// A running game.
pub struct Simulation {
    arena: Arena,
    index: LocationIndex,
    rng: ChaCha8Rng,
    events: EventLog,
    config: SimConfig,
    /// Completed ticks.
    tick: u64,
    /// Simulated seconds.
    elapsed: f64,
    systems: Vec<Box<dyn System>>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("arena", &self.arena)
            .field("index", &self.index)
            .field("tick", &self.tick)
            .field("elapsed", &self.elapsed)
            .field("events", &self.events.event_count())
            .field("systems", &self.system_names())
            .finish_non_exhaustive()
    }
}

/// Borrows the fields of a `Simulation` as a [`SimContext`].
///
/// A macro rather than a method so `self.systems` stays borrowable.
macro_rules! context {
    ($sim:expr) => {
        SimContext {
            arena: &mut $sim.arena,
            index: &mut $sim.index,
            rng: &mut $sim.rng,
            events: &mut $sim.events,
            config: &$sim.config,
            tick: $sim.tick,
        }
    };
}

impl Simulation {
    /// Creates an empty universe with the game state root in place.
    ///
    /// # Errors
    ///
    /// [`crate::error::GameError::Config`] if `config` fails validation.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let mut arena = Arena::new();
        spawn::game_state(&mut arena, config.universe_speed);
        Ok(Self {
            arena,
            index: LocationIndex::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            events: EventLog::new(),
            config,
            tick: 0,
            elapsed: 0.0,
            systems: vec![
                Box::new(ProductionSystem),
                Box::new(MissionSystem),
                Box::new(FleetMaintenance),
            ],
        })
    }

    /// Advances the game by `dt` seconds.
    ///
    /// # Errors
    ///
    /// Only on broken internal references.
    #[tracing::instrument(level = "trace", skip(self), fields(tick = self.tick))]
    pub fn tick(&mut self, dt: f64) -> Result<()> {
        let mut ctx = context!(self);
        for system in &self.systems {
            let _span = trace_span!("system", name = system.name()).entered();
            system.run(&mut ctx, dt)?;
        }
        self.tick += 1;
        self.elapsed += dt;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Player actions
    // -------------------------------------------------------------------------

    /// Registers a player with a home planet at a random free coordinate.
    ///
    /// # Errors
    ///
    /// Only on broken internal references.
    pub fn create_player(&mut self, player: &PlayerId, name: &str) -> Result<ActionOutcome> {
        if systems::player_entity(&self.arena, player).is_ok() {
            debug!(%player, "player refused: exists");
            return Ok(ActionOutcome::refused(Refusal::PlayerExists));
        }
        let Some(home) = self.index.random_free_location(&self.config.bounds, &mut self.rng) else {
            debug!(%player, "player refused: universe full");
            return Ok(ActionOutcome::refused(Refusal::NoFreeLocation));
        };

        let starting = self.config.starting_resources;
        let mut ctx = context!(self);
        spawn::player(&mut ctx, player, name)?;
        spawn::planet(&mut ctx, home, Some(player), "Homeworld", starting)?;
        ctx.emit(crate::event::GameEvent::PlayerCreated {
            player: player.clone(),
            home,
        });
        info!(%player, %home, "player created");
        Ok(ActionOutcome::ok())
    }

    /// Raises a building on the player's planet by one level.
    ///
    /// # Errors
    ///
    /// Usage errors as in [`upgrade::upgrade_building`].
    pub fn upgrade_building(
        &mut self,
        player: &PlayerId,
        location: &Location,
        building: &str,
    ) -> Result<ActionOutcome> {
        upgrade::upgrade_building(&mut context!(self), player, location, building)
    }

    /// Raises a research line of the player by one level.
    ///
    /// # Errors
    ///
    /// Usage errors as in [`upgrade::upgrade_research`].
    pub fn upgrade_research(
        &mut self,
        player: &PlayerId,
        location: &Location,
        research: &str,
    ) -> Result<ActionOutcome> {
        upgrade::upgrade_research(&mut context!(self), player, location, research)
    }

    /// Builds one ship at the player's planet.
    ///
    /// # Errors
    ///
    /// Usage errors as in [`shipyard::build_ship`].
    pub fn build_ship(&mut self, player: &PlayerId, location: &Location, kind: &str) -> Result<ActionOutcome> {
        shipyard::build_ship(&mut context!(self), player, location, kind)
    }

    /// Sends the player's docked fleet at `location` on a mission.
    ///
    /// # Errors
    ///
    /// Usage errors as in [`mission::send_mission`].
    pub fn send_mission(
        &mut self,
        player: &PlayerId,
        location: &Location,
        mission: Mission,
        destination: Location,
        cargo: ResourceMap,
    ) -> Result<ActionOutcome> {
        mission::send_mission(&mut context!(self), player, location, mission, destination, cargo)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Planets owned by `player`, keyed by location.
    ///
    /// # Errors
    ///
    /// [`crate::error::GameError::UnknownPlayer`].
    pub fn player_planets(&self, player: &PlayerId) -> Result<BTreeMap<Location, PlanetView>> {
        systems::player_entity(&self.arena, player)?;
        let mut planets = BTreeMap::new();
        for location in self.index.player_planets(player)? {
            if let Some(planet) = self.index.planet_at(location) {
                planets.insert(*location, PlanetView::build(&self.arena, planet)?);
            }
        }
        Ok(planets)
    }

    /// Fleets of `player`, oldest first.
    ///
    /// # Errors
    ///
    /// [`crate::error::GameError::UnknownPlayer`].
    pub fn player_fleets(&self, player: &PlayerId) -> Result<Vec<FleetView>> {
        let entity = systems::player_entity(&self.arena, player)?;
        self.arena
            .player(entity)?
            .fleets
            .iter()
            .map(|fleet| FleetView::build(&self.arena, *fleet))
            .collect()
    }

    /// Serializable view of the whole game.
    ///
    /// # Errors
    ///
    /// Only on broken internal references.
    pub fn snapshot(&self) -> Result<GameSnapshot> {
        GameSnapshot::build(&self.arena, self.tick, self.elapsed)
    }

    /// Drains the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<EventRecord> {
        self.events.take_events()
    }

    /// Read-only access to the entity arena.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable access to the entity arena for scripted setups.
    ///
    /// Caches and the location index are not updated; prefer
    /// [`Simulation::with_context`] for anything that spawns planets.
    #[must_use]
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Runs `f` with the full simulation context, as systems see it.
    pub fn with_context<T>(&mut self, f: impl FnOnce(&mut SimContext<'_>) -> T) -> T {
        f(&mut context!(self))
    }

    /// Coordinate index.
    #[must_use]
    pub fn index(&self) -> &LocationIndex {
        &self.index
    }

    /// Settings this game runs with.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Completed ticks.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Names of the per-tick systems, in run order.
    #[must_use]
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
