//! Fleet travel state machine.
//!
//! ```text
//!            order_mission                    arrival
//! Docked ──────────────────▶ InTransit ─────────────────▶ Docked
//!                              │   ▲
//!                              └───┘ TRANSPORT / ATTACK / lost COLONIZE
//!                                    flip to RETURN
//! ```
//!
//! Travel time for a leg of distance `d` flown at the speed of the slowest
//! ship kind present:
//!
//! ```text
//! 10 + 35 · sqrt(10 · d / speed) / universe_speed
//! ```
//!
//! [`MissionSystem`] counts legs down and runs arrivals; [`FleetMaintenance`]
//! merges docked fleets of a player that share a location and removes fleets
//! without ships.

use std::collections::BTreeMap;

use tracing::{debug, info, trace};

use crate::catalog::COLONY_SHIP;
use crate::entity::components::{FleetState, Mission, PlayerId, Voyage};
use crate::entity::{EntityId, EntityTag};
use crate::error::{ActionOutcome, GameError, Refusal, Result};
use crate::event::GameEvent;
use crate::location::Location;
use crate::resources::{Resource, ResourceMap};
use crate::systems::combat::{self, Combatant};
use crate::systems::{spawn, SimContext, System};

// =============================================================================
// Fleet queries
// =============================================================================

/// Seconds needed to fly `distance` at `speed`.
#[must_use]
pub fn travel_time(distance: f64, speed: f64, universe_speed: f64) -> f64 {
    10.0 + 35.0 * (10.0 * distance / speed).sqrt() / universe_speed
}

/// Speed of the slowest ship kind with a non-zero count.
///
/// # Errors
///
/// Only on broken references.
pub fn fleet_speed(ctx: &SimContext<'_>, fleet: EntityId) -> Result<Option<f64>> {
    let mut slowest: Option<f64> = None;
    for ship in ctx.arena.fleet(fleet)?.ships.values() {
        let ship = &ctx.arena.ship(*ship)?.ship;
        if ship.count > 0 {
            slowest = Some(slowest.map_or(ship.speed, |s| s.min(ship.speed)));
        }
    }
    Ok(slowest)
}

/// Total cargo the fleet's ships can hold.
///
/// # Errors
///
/// Only on broken references.
pub fn cargo_capacity(ctx: &SimContext<'_>, fleet: EntityId) -> Result<f64> {
    let mut capacity = 0.0;
    for ship in ctx.arena.fleet(fleet)?.ships.values() {
        let ship = &ctx.arena.ship(*ship)?.ship;
        capacity += ship.cargo * f64::from(ship.count);
    }
    Ok(capacity)
}

/// Number of ships of `kind` in the fleet.
///
/// # Errors
///
/// Only on broken references.
pub fn ship_count(ctx: &SimContext<'_>, fleet: EntityId, kind: &str) -> Result<u32> {
    match ctx.arena.fleet(fleet)?.ships.get(kind) {
        Some(ship) => Ok(ctx.arena.ship(*ship)?.ship.count),
        None => Ok(0),
    }
}

/// Returns `true` if every ship count of the fleet is zero.
///
/// # Errors
///
/// Only on broken references.
pub fn is_empty(ctx: &SimContext<'_>, fleet: EntityId) -> Result<bool> {
    for ship in ctx.arena.fleet(fleet)?.ships.values() {
        if ctx.arena.ship(*ship)?.ship.count > 0 {
            return Ok(false);
        }
    }
    Ok(true)
}

fn leg_time(ctx: &SimContext<'_>, fleet: EntityId, from: &Location, to: &Location) -> Result<f64> {
    Ok(fleet_speed(ctx, fleet)?.map_or(0.0, |speed| {
        travel_time(from.distance_to(to), speed, ctx.config.universe_speed)
    }))
}

// =============================================================================
// Orders
// =============================================================================

/// Sends the player's docked fleet at `origin` on a mission.
///
/// # Errors
///
/// [`GameError::UnknownPlayer`], [`GameError::UnknownLocation`] or
/// [`GameError::NotPlanetOwner`] for the origin.
pub fn send_mission(
    ctx: &mut SimContext<'_>,
    player: &PlayerId,
    origin: &Location,
    mission: Mission,
    destination: Location,
    cargo: ResourceMap,
) -> Result<ActionOutcome> {
    ctx.owned_planet(player, origin)?;
    let player_entity = ctx.player_entity(player)?;
    match super::docked_fleet(ctx.arena, player_entity, origin)? {
        Some(fleet) => order_mission(ctx, fleet, mission, destination, cargo),
        None => {
            debug!(%player, %origin, %mission, "mission refused: no fleet at origin");
            Ok(ActionOutcome::refused(Refusal::NoFleetAtOrigin))
        }
    }
}

/// Validates and starts a mission for a docked fleet.
///
/// Cargo is taken from the planet the fleet is docked at.
///
/// # Errors
///
/// Only on broken references.
pub fn order_mission(
    ctx: &mut SimContext<'_>,
    fleet: EntityId,
    mission: Mission,
    destination: Location,
    cargo: ResourceMap,
) -> Result<ActionOutcome> {
    let outcome = validate_order(ctx, fleet, mission, &destination, &cargo)?;
    let origin = match outcome {
        Ok(origin) => origin,
        Err(reason) => {
            debug!(%fleet, %mission, %destination, %reason, "mission refused");
            return Ok(ActionOutcome::refused(reason));
        }
    };

    let origin_planet = ctx.planet_at(&origin)?;
    let balance = &mut ctx.arena.planet_mut(origin_planet)?.planet.resources;
    *balance = balance.debit(&cargo);

    let travel = leg_time(ctx, fleet, &origin, &destination)?;
    let data = &mut ctx.arena.fleet_mut(fleet)?.fleet;
    data.cargo += cargo;
    data.state = FleetState::InTransit(Voyage::new(origin, destination, mission, travel));

    debug!(%fleet, %mission, %origin, %destination, travel, "mission started");
    ctx.emit(GameEvent::MissionStarted {
        fleet,
        mission,
        from: origin,
        to: destination,
        travel_time: travel,
    });
    Ok(ActionOutcome::ok())
}

/// Game-rule checks of an order; `Ok(Ok(origin))` when the order may start.
fn validate_order(
    ctx: &SimContext<'_>,
    fleet: EntityId,
    mission: Mission,
    destination: &Location,
    cargo: &ResourceMap,
) -> Result<std::result::Result<Location, Refusal>> {
    let data = &ctx.arena.fleet(fleet)?.fleet;
    let Some(origin) = data.current_location() else {
        return Ok(Err(Refusal::FleetInTransit));
    };
    if is_empty(ctx, fleet)? {
        return Ok(Err(Refusal::NoShips));
    }

    let target_owner = match ctx.index.planet_at(destination) {
        Some(planet) => Some(ctx.arena.planet(planet)?.planet.owner.clone()),
        None => None,
    };
    match (mission, target_owner) {
        (Mission::Colonize, Some(_)) => return Ok(Err(Refusal::LocationOccupied)),
        (Mission::Colonize, None) => {
            if !ctx.config.bounds.contains(destination) {
                return Ok(Err(Refusal::UnknownDestination));
            }
            if ship_count(ctx, fleet, COLONY_SHIP)? == 0 {
                return Ok(Err(Refusal::NoColonyShip));
            }
        }
        (_, None) => return Ok(Err(Refusal::UnknownDestination)),
        (Mission::Attack, Some(owner)) if owner.as_ref() == Some(&data.owner) => {
            return Ok(Err(Refusal::CannotAttackOwnPlanet));
        }
        (Mission::Return, Some(owner)) if owner.as_ref() != Some(&data.owner) => {
            return Ok(Err(Refusal::DestinationNotOwned));
        }
        _ => {}
    }

    if !cargo.is_non_negative() {
        return Ok(Err(Refusal::InsufficientResources));
    }
    let free = cargo_capacity(ctx, fleet)? - data.cargo.total();
    if cargo.total() > free {
        return Ok(Err(Refusal::InsufficientCargoCapacity));
    }
    let origin_planet = ctx.planet_at(&origin)?;
    if !ctx.arena.planet(origin_planet)?.planet.resources.covers(cargo) {
        return Ok(Err(Refusal::InsufficientResources));
    }
    Ok(Ok(origin))
}

// =============================================================================
// Arrivals
// =============================================================================

fn deposit_cargo(ctx: &mut SimContext<'_>, fleet: EntityId, at: &Location) -> Result<()> {
    let planet = ctx.planet_at(at)?;
    let cargo = std::mem::take(&mut ctx.arena.fleet_mut(fleet)?.fleet.cargo);
    ctx.arena.planet_mut(planet)?.planet.resources += cargo;
    Ok(())
}

fn dock(ctx: &mut SimContext<'_>, fleet: EntityId, location: Location) -> Result<()> {
    ctx.arena.fleet_mut(fleet)?.fleet.state = FleetState::Docked { location };
    Ok(())
}

/// Turns the fleet around towards `voyage.from` on a RETURN leg.
fn start_return(ctx: &mut SimContext<'_>, fleet: EntityId, voyage: &Voyage) -> Result<()> {
    let travel = leg_time(ctx, fleet, &voyage.to, &voyage.from)?;
    ctx.arena.fleet_mut(fleet)?.fleet.state =
        FleetState::InTransit(Voyage::new(voyage.to, voyage.from, Mission::Return, travel));
    Ok(())
}

fn arrive(ctx: &mut SimContext<'_>, fleet: EntityId, voyage: Voyage) -> Result<()> {
    debug!(%fleet, mission = %voyage.mission, location = %voyage.to, "fleet arrived");
    ctx.emit(GameEvent::FleetArrived {
        fleet,
        mission: voyage.mission,
        location: voyage.to,
    });

    match voyage.mission {
        Mission::Transport => {
            deposit_cargo(ctx, fleet, &voyage.to)?;
            start_return(ctx, fleet, &voyage)
        }
        Mission::Return => {
            deposit_cargo(ctx, fleet, &voyage.to)?;
            dock(ctx, fleet, voyage.to)
        }
        Mission::Colonize => colonize(ctx, fleet, &voyage),
        Mission::Attack => attack(ctx, fleet, &voyage),
    }
}

fn colonize(ctx: &mut SimContext<'_>, fleet: EntityId, voyage: &Voyage) -> Result<()> {
    if !ctx.index.is_free(&voyage.to) {
        debug!(%fleet, location = %voyage.to, "colonization target taken, returning");
        ctx.emit(GameEvent::ColonizationAborted {
            fleet,
            location: voyage.to,
        });
        return start_return(ctx, fleet, voyage);
    }

    let colony_ship = ctx
        .arena
        .fleet(fleet)?
        .ships
        .get(COLONY_SHIP)
        .copied()
        .ok_or_else(|| GameError::UnknownShipKind(COLONY_SHIP.to_string()))?;
    let ship = &mut ctx.arena.ship_mut(colony_ship)?.ship;
    if ship.count == 0 {
        // Lost the colony ship on the way; nothing to found.
        return start_return(ctx, fleet, voyage);
    }
    ship.count -= 1;

    let owner = ctx.arena.fleet(fleet)?.fleet.owner.clone();
    let cargo = std::mem::take(&mut ctx.arena.fleet_mut(fleet)?.fleet.cargo);
    spawn::planet(ctx, voyage.to, Some(&owner), "Colony", cargo)?;
    dock(ctx, fleet, voyage.to)?;

    info!(player = %owner, location = %voyage.to, "planet colonized");
    ctx.emit(GameEvent::PlanetColonized {
        player: owner,
        location: voyage.to,
    });
    Ok(())
}

/// Rows of a fleet in ship-kind order, with the ship ids to write back to.
fn fleet_rows(ctx: &SimContext<'_>, fleet: EntityId) -> Result<(Vec<EntityId>, Vec<Combatant>)> {
    let mut ids = Vec::new();
    let mut rows = Vec::new();
    for ship_id in ctx.arena.fleet(fleet)?.ships.values() {
        let ship = ctx.arena.ship(*ship_id)?;
        ids.push(*ship_id);
        rows.push(Combatant {
            hp: ship.combat.hp,
            damage: ship.combat.damage,
            count: ship.ship.count,
        });
    }
    Ok((ids, rows))
}

/// Docked fleets of `player` at `location`, oldest first.
fn docked_fleets(ctx: &SimContext<'_>, player: EntityId, location: &Location) -> Result<Vec<EntityId>> {
    let mut docked = Vec::new();
    for fleet in &ctx.arena.player(player)?.fleets {
        if ctx.arena.fleet(*fleet)?.fleet.current_location() == Some(*location) {
            docked.push(*fleet);
        }
    }
    Ok(docked)
}

/// Moves ships and cargo of every fleet in `fleets` into the first one.
///
/// Emptied fleets stay in place until [`FleetMaintenance`] sweeps them.
fn merge_fleets(
    ctx: &mut SimContext<'_>,
    owner: &PlayerId,
    location: Location,
    fleets: &[EntityId],
) -> Result<Option<EntityId>> {
    let [into, others @ ..] = fleets else { return Ok(None) };
    // Fleets already drained by an earlier merge this tick carry nothing.
    let mut rest = Vec::with_capacity(others.len());
    for other in others {
        if !is_empty(ctx, *other)? || !ctx.arena.fleet(*other)?.fleet.cargo.is_zero() {
            rest.push(*other);
        }
    }
    if rest.is_empty() {
        return Ok(Some(*into));
    }
    for other in &rest {
        let ships: Vec<(String, EntityId)> = ctx
            .arena
            .fleet(*other)?
            .ships
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        for (kind, ship) in ships {
            let moved = std::mem::take(&mut ctx.arena.ship_mut(ship)?.ship.count);
            let target = ctx
                .arena
                .fleet(*into)?
                .ships
                .get(&kind)
                .copied()
                .ok_or(GameError::UnknownShipKind(kind))?;
            ctx.arena.ship_mut(target)?.ship.count += moved;
        }
        let cargo = std::mem::take(&mut ctx.arena.fleet_mut(*other)?.fleet.cargo);
        ctx.arena.fleet_mut(*into)?.fleet.cargo += cargo;
    }
    debug!(player = %owner, %location, into = %into, merged = rest.len(), "fleets merged");
    ctx.emit(GameEvent::FleetsMerged {
        player: owner.clone(),
        location,
        into: *into,
        merged: rest,
    });
    Ok(Some(*into))
}

fn attack(ctx: &mut SimContext<'_>, fleet: EntityId, voyage: &Voyage) -> Result<()> {
    let planet = ctx.planet_at(&voyage.to)?;

    // Every docked fleet of the owner defends, including ones that landed
    // earlier in this pass and have not been merged yet.
    let defender_fleet = match ctx.arena.planet(planet)?.planet.owner.clone() {
        Some(owner) => {
            let owner_entity = ctx.player_entity(&owner)?;
            let docked = docked_fleets(ctx, owner_entity, &voyage.to)?;
            merge_fleets(ctx, &owner, voyage.to, &docked)?
        }
        None => None,
    };
    let (defender_ids, defender_rows) = match defender_fleet {
        Some(id) => fleet_rows(ctx, id)?,
        None => (Vec::new(), Vec::new()),
    };

    let mut building_ids = Vec::new();
    let mut building_rows = Vec::new();
    for id in ctx.arena.planet(planet)?.buildings.values() {
        let building = ctx.arena.building(*id)?;
        if let Some(combat) = &building.combat {
            building_ids.push(*id);
            building_rows.push(Combatant {
                hp: combat.hp,
                damage: combat.damage,
                count: building.level(),
            });
        }
    }

    let (attacker_ids, attacker_rows) = fleet_rows(ctx, fleet)?;
    let outcome = combat::resolve(
        &defender_rows,
        &building_rows,
        &attacker_rows,
        &ctx.config.combat,
        &mut *ctx.rng,
    );

    for (id, count) in defender_ids.iter().zip(&outcome.defender_ships) {
        ctx.arena.ship_mut(*id)?.ship.count = *count;
    }
    for (id, level) in building_ids.iter().zip(&outcome.defender_buildings) {
        if let Some(b) = ctx.arena.building_mut(*id)?.building.as_mut() {
            b.level = *level;
        }
    }
    for (id, count) in attacker_ids.iter().zip(&outcome.attackers) {
        ctx.arena.ship_mut(*id)?.ship.count = *count;
    }

    let mut loot = ResourceMap::zero();
    if outcome.attacker_victory {
        let mut free = cargo_capacity(ctx, fleet)? - ctx.arena.fleet(fleet)?.fleet.cargo.total();
        let stock = &mut ctx.arena.planet_mut(planet)?.planet.resources;
        for &r in Resource::all() {
            let take = stock[r].min(free).max(0.0);
            stock[r] -= take;
            loot[r] = take;
            free -= take;
        }
        ctx.arena.fleet_mut(fleet)?.fleet.cargo += loot;
    }

    debug!(
        %fleet,
        location = %voyage.to,
        victory = outcome.attacker_victory,
        rounds = outcome.rounds,
        "combat resolved"
    );
    ctx.emit(GameEvent::CombatResolved {
        fleet,
        location: voyage.to,
        attacker_victory: outcome.attacker_victory,
        rounds: outcome.rounds,
        loot,
    });
    start_return(ctx, fleet, voyage)
}

// =============================================================================
// Systems
// =============================================================================

/// Counts down travel time and runs arrivals.
#[derive(Debug, Default, Clone, Copy)]
pub struct MissionSystem;

impl System for MissionSystem {
    fn name(&self) -> &'static str {
        "mission"
    }

    fn run(&self, ctx: &mut SimContext<'_>, dt: f64) -> Result<()> {
        let mut arrivals = Vec::new();
        for fleet in ctx.arena.ids_with_tag(EntityTag::Fleet) {
            if let Some(voyage) = ctx.arena.fleet_mut(fleet)?.fleet.voyage_mut() {
                voyage.travel_time_left -= dt;
                if voyage.travel_time_left <= 0.0 {
                    arrivals.push((fleet, *voyage));
                }
            }
        }
        trace!(arrivals = arrivals.len(), "mission pass");
        for (fleet, voyage) in arrivals {
            arrive(ctx, fleet, voyage)?;
        }
        Ok(())
    }
}

/// Merges co-located docked fleets and removes fleets without ships.
#[derive(Debug, Default, Clone, Copy)]
pub struct FleetMaintenance;

impl FleetMaintenance {
    fn merge(ctx: &mut SimContext<'_>, owner: &PlayerId, player: EntityId) -> Result<()> {
        let mut by_location: BTreeMap<Location, Vec<EntityId>> = BTreeMap::new();
        for fleet in &ctx.arena.player(player)?.fleets {
            if let Some(location) = ctx.arena.fleet(*fleet)?.fleet.current_location() {
                by_location.entry(location).or_default().push(*fleet);
            }
        }

        for (location, fleets) in by_location {
            merge_fleets(ctx, owner, location, &fleets)?;
        }
        Ok(())
    }

    fn sweep(ctx: &mut SimContext<'_>, owner: &PlayerId, player: EntityId) -> Result<()> {
        let fleets = ctx.arena.player(player)?.fleets.clone();
        let mut keep = Vec::with_capacity(fleets.len());
        for fleet in fleets {
            if is_empty(ctx, fleet)? {
                ctx.arena.despawn_tree(fleet);
                debug!(player = %owner, %fleet, "empty fleet removed");
                ctx.emit(GameEvent::FleetRemoved {
                    player: owner.clone(),
                    fleet,
                });
            } else {
                keep.push(fleet);
            }
        }
        ctx.arena.player_mut(player)?.fleets = keep;
        Ok(())
    }
}

impl System for FleetMaintenance {
    fn name(&self) -> &'static str {
        "fleet_maintenance"
    }

    fn run(&self, ctx: &mut SimContext<'_>, _dt: f64) -> Result<()> {
        let players: Vec<(PlayerId, EntityId)> = ctx
            .arena
            .game_state(ctx.arena.root()?)?
            .players
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        for (owner, player) in players {
            Self::merge(ctx, &owner, player)?;
            Self::sweep(ctx, &owner, player)?;
        }
        Ok(())
    }
}
