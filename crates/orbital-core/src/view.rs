//! Read-only projections of the entity tree.
//!
//! Views are plain serializable values built from an [`Arena`]; they never
//! hold references into it, so a snapshot can outlive the lock it was taken
//! under.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::entity::components::{EnergyBalance, FleetState, PlayerId};
use crate::entity::{EntityId, EntityTag};
use crate::error::Result;
use crate::location::Location;
use crate::resources::ResourceMap;
use crate::systems;

/// One building slot of a planet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingView {
    /// Current level.
    pub level: u32,
    /// Price of the next level.
    pub upgrade_cost: ResourceMap,
}

/// A planet with its buildings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetView {
    pub name: String,
    pub location: Location,
    /// Planet size rolled at creation.
    pub size: u32,
    /// `None` for unclaimed planets.
    pub owner: Option<PlayerId>,
    pub resources: ResourceMap,
    pub storage_capacity: ResourceMap,
    /// Production per second.
    pub production_rate: ResourceMap,
    pub energy: EnergyBalance,
    /// Slot name to building.
    pub buildings: BTreeMap<String, BuildingView>,
}

impl PlanetView {
    /// Projects the planet entity `id`.
    ///
    /// # Errors
    ///
    /// [`crate::error::GameError::EntityKindMismatch`] if `id` is not a planet.
    pub fn build(arena: &Arena, id: EntityId) -> Result<Self> {
        let planet = arena.planet(id)?;
        let mut buildings = BTreeMap::new();
        for (slot, building) in &planet.buildings {
            let building = arena.building(*building)?;
            let Some(component) = &building.building else {
                continue;
            };
            buildings.insert(
                slot.clone(),
                BuildingView {
                    level: component.level,
                    upgrade_cost: component.upgrade_cost(),
                },
            );
        }
        let p = &planet.planet;
        Ok(Self {
            name: p.name.clone(),
            location: p.location,
            size: p.size,
            owner: p.owner.clone(),
            resources: p.resources,
            storage_capacity: p.storage_capacity,
            production_rate: p.production_rate,
            energy: p.energy,
            buildings,
        })
    }
}

/// A fleet and its ship counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetView {
    pub id: EntityId,
    pub owner: PlayerId,
    #[serde(flatten)]
    pub state: FleetState,
    pub cargo: ResourceMap,
    /// Ship kind to count; kinds with no ships are left out.
    pub ships: BTreeMap<String, u32>,
}

impl FleetView {
    /// Projects the fleet entity `id`.
    ///
    /// # Errors
    ///
    /// [`crate::error::GameError::EntityKindMismatch`] if `id` is not a fleet.
    pub fn build(arena: &Arena, id: EntityId) -> Result<Self> {
        let fleet = arena.fleet(id)?;
        let mut ships = BTreeMap::new();
        for (kind, ship) in &fleet.ships {
            let count = arena.ship(*ship)?.ship.count;
            if count > 0 {
                ships.insert(kind.clone(), count);
            }
        }
        Ok(Self {
            id,
            owner: fleet.fleet.owner.clone(),
            state: fleet.fleet.state,
            cargo: fleet.fleet.cargo,
            ships,
        })
    }
}

/// A research line of a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchView {
    /// Current level.
    pub level: u32,
    /// Price of the next level.
    pub upgrade_cost: ResourceMap,
}

/// A player with owned planets, fleets and research.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    /// Owned planets in location order.
    pub planets: Vec<Location>,
    pub fleets: Vec<FleetView>,
    pub research: BTreeMap<String, ResearchView>,
}

impl PlayerView {
    /// Projects the player entity `id`.
    ///
    /// # Errors
    ///
    /// [`crate::error::GameError::EntityKindMismatch`] if `id` is not a player.
    pub fn build(arena: &Arena, id: EntityId) -> Result<Self> {
        let player = arena.player(id)?;
        let fleets = player
            .fleets
            .iter()
            .map(|fleet| FleetView::build(arena, *fleet))
            .collect::<Result<Vec<_>>>()?;
        let mut research = BTreeMap::new();
        for (name, line) in &player.research {
            let line = &arena.research(*line)?.research;
            research.insert(
                name.clone(),
                ResearchView {
                    level: line.level,
                    upgrade_cost: line.upgrade_cost(),
                },
            );
        }
        let mut planets = Vec::new();
        for planet in arena.ids_with_tag(EntityTag::Planet) {
            let planet = &arena.planet(planet)?.planet;
            if planet.owner.as_ref() == Some(&player.player.id) {
                planets.push(planet.location);
            }
        }
        planets.sort();
        Ok(Self {
            id: player.player.id.clone(),
            name: player.player.name.clone(),
            planets,
            fleets,
            research,
        })
    }
}

/// Full serializable state of a running game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Ticks run so far.
    pub tick: u64,
    /// Simulated seconds so far.
    pub elapsed: f64,
    pub universe_speed: f64,
    pub players: BTreeMap<PlayerId, PlayerView>,
    pub planets: BTreeMap<Location, PlanetView>,
}

impl GameSnapshot {
    /// Projects everything under the root of `arena`.
    ///
    /// # Errors
    ///
    /// [`crate::error::GameError::MissingRoot`] on an uninitialized arena.
    pub fn build(arena: &Arena, tick: u64, elapsed: f64) -> Result<Self> {
        let state = arena.game_state(arena.root()?)?;
        let world = arena.world(systems::world_entity(arena)?)?;

        let players = state
            .players
            .iter()
            .map(|(id, entity)| Ok((id.clone(), PlayerView::build(arena, *entity)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let planets = world
            .planets
            .iter()
            .map(|(location, entity)| Ok((*location, PlanetView::build(arena, *entity)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            tick,
            elapsed,
            universe_speed: world.universe_speed,
            players,
            planets,
        })
    }

    /// Number of players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}
