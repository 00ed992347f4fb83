//! Building and research upgrades.
//!
//! Both follow the same sequence: resolve the owned planet, price the next
//! level, check requirements, check funds, then debit and bump the level.
//! A refusal at any step leaves the planet and the level untouched.

use tracing::debug;

use crate::entity::components::PlayerId;
use crate::error::{ActionOutcome, GameError, Refusal, Result};
use crate::event::GameEvent;
use crate::location::Location;
use crate::systems::{production, requirements_met, SimContext};

/// Raises a building on the player's planet by one level.
///
/// # Errors
///
/// [`GameError::UnknownPlayer`], [`GameError::UnknownLocation`],
/// [`GameError::NotPlanetOwner`] or [`GameError::UnknownBuilding`].
pub fn upgrade_building(
    ctx: &mut SimContext<'_>,
    player: &PlayerId,
    location: &Location,
    building: &str,
) -> Result<ActionOutcome> {
    let planet = ctx.owned_planet(player, location)?;
    let player_entity = ctx.player_entity(player)?;
    let building_id = ctx
        .arena
        .planet(planet)?
        .buildings
        .get(building)
        .copied()
        .ok_or_else(|| GameError::UnknownBuilding(building.to_string()))?;

    let slot = ctx.arena.building(building_id)?;
    let Some(component) = slot.building.as_ref() else {
        return Err(GameError::UnknownBuilding(building.to_string()));
    };
    let cost = component.upgrade_cost();

    if !requirements_met(ctx.arena, planet, player_entity, slot.requirements.as_ref())? {
        debug!(%player, %location, building, "upgrade refused: requirements");
        return Ok(ActionOutcome::refused(Refusal::RequirementsNotMet));
    }

    let planet_data = &mut ctx.arena.planet_mut(planet)?.planet;
    if !planet_data.resources.covers(&cost) {
        debug!(%player, %location, building, "upgrade refused: funds");
        return Ok(ActionOutcome::refused(Refusal::InsufficientResources));
    }
    planet_data.resources = planet_data.resources.debit(&cost);

    let level = match ctx.arena.building_mut(building_id)?.building.as_mut() {
        Some(component) => {
            component.level += 1;
            component.level
        }
        None => return Err(GameError::UnknownBuilding(building.to_string())),
    };
    production::refresh_planet(ctx.arena, planet, ctx.config.universe_speed)?;

    debug!(%player, %location, building, level, "building upgraded");
    ctx.emit(GameEvent::BuildingUpgraded {
        location: *location,
        building: building.to_string(),
        level,
    });
    Ok(ActionOutcome::ok())
}

/// Raises a research line of the player by one level, paid from the planet
/// at `location`.
///
/// # Errors
///
/// [`GameError::UnknownPlayer`], [`GameError::UnknownLocation`],
/// [`GameError::NotPlanetOwner`] or [`GameError::UnknownResearch`].
pub fn upgrade_research(
    ctx: &mut SimContext<'_>,
    player: &PlayerId,
    location: &Location,
    research: &str,
) -> Result<ActionOutcome> {
    let planet = ctx.owned_planet(player, location)?;
    let player_entity = ctx.player_entity(player)?;
    let research_id = ctx
        .arena
        .player(player_entity)?
        .research
        .get(research)
        .copied()
        .ok_or_else(|| GameError::UnknownResearch(research.to_string()))?;

    let line = ctx.arena.research(research_id)?;
    let cost = line.research.upgrade_cost();

    if !requirements_met(ctx.arena, planet, player_entity, line.requirements.as_ref())? {
        debug!(%player, research, "research refused: requirements");
        return Ok(ActionOutcome::refused(Refusal::RequirementsNotMet));
    }

    let planet_data = &mut ctx.arena.planet_mut(planet)?.planet;
    if !planet_data.resources.covers(&cost) {
        debug!(%player, research, "research refused: funds");
        return Ok(ActionOutcome::refused(Refusal::InsufficientResources));
    }
    planet_data.resources = planet_data.resources.debit(&cost);

    let line = &mut ctx.arena.research_mut(research_id)?.research;
    line.level += 1;
    let level = line.level;

    debug!(%player, research, level, "research upgraded");
    ctx.emit(GameEvent::ResearchUpgraded {
        player: player.clone(),
        research: research.to_string(),
        level,
    });
    Ok(ActionOutcome::ok())
}
