//! Creation of players, planets and fleets with their catalog children.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::info;

use crate::arena::{Arena, SpecialSlot};
use crate::entity::components::{
    FleetComponent, PlanetComponent, PlayerComponent, PlayerId, ResearchComponents,
};
use crate::entity::{
    BuildingComponents, Component, EntityId, EntityInner, FleetComponents, GameStateComponents,
    PlanetComponents, PlayerComponents, ShipComponents, WorldComponents,
};
use crate::error::{GameError, Result};
use crate::location::Location;
use crate::resources::ResourceMap;
use crate::systems::{production, world_entity, SimContext};

/// Creates the root game state and its world, binding the special slot.
pub fn game_state(arena: &mut Arena, universe_speed: f64) -> EntityId {
    // The world id is not known before it is spawned, so the root is patched.
    let root = arena.spawn(
        EntityInner::GameState(GameStateComponents {
            world: EntityId::new(u64::MAX),
            players: BTreeMap::new(),
        }),
        None,
    );
    let world = arena.spawn(
        EntityInner::World(WorldComponents {
            universe_speed,
            planets: BTreeMap::new(),
        }),
        Some(root),
    );
    if let Some(state) = arena.get_mut(root).and_then(|e| e.inner_mut().as_game_state_mut()) {
        state.world = world;
    }
    arena.set_special(SpecialSlot::GameState, root);
    root
}

/// Creates a player with one research entity per catalog line.
///
/// # Errors
///
/// Only on a missing root.
pub fn player(ctx: &mut SimContext<'_>, id: &PlayerId, name: &str) -> Result<EntityId> {
    let root = ctx.arena.root()?;
    let player = ctx.arena.spawn(
        EntityInner::Player(PlayerComponents {
            player: PlayerComponent {
                id: id.clone(),
                name: name.to_string(),
            },
            fleets: Vec::new(),
            research: BTreeMap::new(),
        }),
        Some(root),
    );

    for (key, spec) in &ctx.config.catalog.research {
        let research = ctx.arena.spawn(
            EntityInner::Research(ResearchComponents {
                research: spec.research(),
                requirements: None,
            }),
            Some(player),
        );
        if let Some(requirements) = &spec.requirements {
            ctx.arena
                .add_component(research, Component::Requirements(requirements.clone()))?;
        }
        ctx.arena
            .player_mut(player)?
            .research
            .insert(key.clone(), research);
    }

    ctx.arena.game_state_mut(root)?.players.insert(id.clone(), player);
    ctx.index.register_player(id.clone());
    Ok(player)
}

/// Creates a planet with every catalog building at level 0 and registers it.
///
/// # Errors
///
/// [`GameError::LocationOccupied`] if the coordinate already holds a planet.
pub fn planet(
    ctx: &mut SimContext<'_>,
    location: Location,
    owner: Option<&PlayerId>,
    name: &str,
    resources: ResourceMap,
) -> Result<EntityId> {
    if !ctx.index.is_free(&location) {
        return Err(GameError::LocationOccupied(location));
    }
    let world = world_entity(ctx.arena)?;
    let size = ctx.rng.gen_range(150..=250);
    let planet = ctx.arena.spawn(
        EntityInner::Planet(PlanetComponents {
            planet: PlanetComponent {
                name: name.to_string(),
                size,
                location,
                owner: owner.cloned(),
                resources,
                storage_capacity: ResourceMap::zero(),
                production_rate: ResourceMap::zero(),
                energy: Default::default(),
            },
            buildings: BTreeMap::new(),
        }),
        Some(world),
    );

    for (slot, spec) in &ctx.config.catalog.buildings {
        let building = ctx
            .arena
            .spawn(EntityInner::Building(BuildingComponents::default()), Some(planet));
        for component in spec.components() {
            ctx.arena.add_component(building, component)?;
        }
        ctx.arena
            .planet_mut(planet)?
            .buildings
            .insert(slot.clone(), building);
    }

    ctx.index.register(location, planet, owner)?;
    ctx.arena.world_mut(world)?.planets.insert(location, planet);
    production::refresh_planet(ctx.arena, planet, ctx.config.universe_speed)?;

    info!(%location, owner = ?owner.map(PlayerId::as_str), "planet created");
    Ok(planet)
}

/// Creates an empty fleet docked at `location`, one ship entity per catalog
/// kind, and appends it to the player's fleet list.
///
/// # Errors
///
/// Only on broken references.
pub fn fleet(ctx: &mut SimContext<'_>, player: EntityId, location: Location) -> Result<EntityId> {
    let owner = ctx.arena.player(player)?.player.id.clone();
    let fleet = ctx.arena.spawn(
        EntityInner::Fleet(FleetComponents {
            fleet: FleetComponent::docked(owner, location),
            ships: BTreeMap::new(),
        }),
        Some(player),
    );

    for (kind, spec) in &ctx.config.catalog.ships {
        let ship = ctx.arena.spawn(
            EntityInner::Ship(ShipComponents {
                ship: spec.ship(0),
                combat: spec.combat,
                requirements: None,
            }),
            Some(fleet),
        );
        if let Some(requirements) = &spec.requirements {
            ctx.arena
                .add_component(ship, Component::Requirements(requirements.clone()))?;
        }
        ctx.arena.fleet_mut(fleet)?.ships.insert(kind.clone(), ship);
    }

    ctx.arena.player_mut(player)?.fleets.push(fleet);
    Ok(fleet)
}
