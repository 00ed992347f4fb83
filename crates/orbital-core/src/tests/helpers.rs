//! Test helper functions for setting up games.
//!
//! Setup shortcuts go through [`Simulation::with_context`] so caches and the
//! location index stay consistent; game actions under test always go through
//! the public `Simulation` API.

use crate::config::SimConfig;
use crate::entity::components::PlayerId;
use crate::location::Location;
use crate::resources::{Resource, ResourceMap};
use crate::simulation::Simulation;
use crate::systems::{self, production, spawn};
use crate::view::FleetView;

// =============================================================================
// Game Setup
// =============================================================================

/// Config whose catalog has no producing buildings, so balances only move
/// through the actions under test.
pub fn quiet_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.catalog.buildings.retain(|_, spec| spec.producer.is_none());
    config
}

/// Simulation with the default config and the given seed.
pub fn sim_with_seed(seed: u64) -> Simulation {
    Simulation::new(SimConfig {
        seed,
        ..SimConfig::default()
    })
    .unwrap()
}

/// Registers `id` and returns its home planet location.
pub fn add_player(sim: &mut Simulation, id: &str) -> (PlayerId, Location) {
    let player = PlayerId::new(id);
    assert!(sim.create_player(&player, id).unwrap().success);
    let home = *sim.player_planets(&player).unwrap().keys().next().unwrap();
    (player, home)
}

/// Creates a planet at `location`, optionally owned.
pub fn add_planet(sim: &mut Simulation, location: Location, owner: Option<&PlayerId>) {
    sim.with_context(|ctx| spawn::planet(ctx, location, owner, "Scripted", ResourceMap::zero()))
        .unwrap();
}

/// Uniform amount of every resource.
pub fn plenty(amount: f64) -> ResourceMap {
    ResourceMap::from_pairs(&[
        (Resource::Metal, amount),
        (Resource::Crystal, amount),
        (Resource::Deuterium, amount),
    ])
}

// =============================================================================
// State Manipulation
// =============================================================================

/// Overwrites the balance of the planet at `location`.
pub fn set_resources(sim: &mut Simulation, location: Location, resources: ResourceMap) {
    let planet = sim.index().planet_at(&location).unwrap();
    sim.arena_mut().planet_mut(planet).unwrap().planet.resources = resources;
}

/// Sets a building level and refreshes the planet's caches.
pub fn set_building_level(sim: &mut Simulation, location: Location, slot: &str, level: u32) {
    sim.with_context(|ctx| {
        let planet = ctx.planet_at(&location)?;
        let building = ctx.arena.planet(planet)?.buildings[slot];
        if let Some(b) = ctx.arena.building_mut(building)?.building.as_mut() {
            b.level = level;
        }
        production::refresh_planet(ctx.arena, planet, ctx.config.universe_speed)
    })
    .unwrap();
}

/// Adds `count` ships of `kind` to the player's docked fleet at `location`,
/// creating the fleet if needed. Skips shipyard and cost checks.
pub fn dock_ships(sim: &mut Simulation, player: &PlayerId, location: Location, kind: &str, count: u32) {
    sim.with_context(|ctx| {
        let owner = ctx.player_entity(player)?;
        let fleet = match systems::docked_fleet(ctx.arena, owner, &location)? {
            Some(fleet) => fleet,
            None => spawn::fleet(ctx, owner, location)?,
        };
        let ship = ctx.arena.fleet(fleet)?.ships[kind];
        ctx.arena.ship_mut(ship)?.ship.count += count;
        Ok::<_, crate::error::GameError>(())
    })
    .unwrap();
}

// =============================================================================
// State Queries
// =============================================================================

/// Balance of the planet at `location`.
pub fn resources_at(sim: &Simulation, location: Location) -> ResourceMap {
    let planet = sim.index().planet_at(&location).unwrap();
    sim.arena().planet(planet).unwrap().planet.resources
}

/// Level of a building slot.
pub fn building_level(sim: &Simulation, location: Location, slot: &str) -> u32 {
    let planet = sim.index().planet_at(&location).unwrap();
    let building = sim.arena().planet(planet).unwrap().buildings[slot];
    sim.arena().building(building).unwrap().level()
}

/// The player's fleets that are docked at `location`.
pub fn fleets_docked_at(sim: &Simulation, player: &PlayerId, location: Location) -> Vec<FleetView> {
    sim.player_fleets(player)
        .unwrap()
        .into_iter()
        .filter(|f| matches!(f.state, crate::entity::components::FleetState::Docked { location: l } if l == location))
        .collect()
}

/// Ticks with `dt` until `done` holds; returns the ticks run.
///
/// Panics after `max_ticks`.
pub fn run_until(
    sim: &mut Simulation,
    dt: f64,
    max_ticks: u64,
    mut done: impl FnMut(&Simulation) -> bool,
) -> u64 {
    for ticks in 0..max_ticks {
        if done(sim) {
            return ticks;
        }
        sim.tick(dt).unwrap();
    }
    assert!(done(sim), "condition not reached within {max_ticks} ticks");
    max_ticks
}

/// Asserts two balances agree within float noise.
pub fn assert_resources_eq(actual: &ResourceMap, expected: &ResourceMap) {
    for &r in Resource::all() {
        assert!(
            (actual[r] - expected[r]).abs() < 1e-6,
            "{r}: {} != {}",
            actual[r],
            expected[r]
        );
    }
}
