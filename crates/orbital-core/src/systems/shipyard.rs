//! Ship construction.

use tracing::debug;

use crate::catalog::SHIPYARD;
use crate::entity::components::PlayerId;
use crate::error::{ActionOutcome, GameError, Refusal, Result};
use crate::event::GameEvent;
use crate::location::Location;
use crate::systems::{docked_fleet, requirements_met, spawn, SimContext};

/// Builds one ship of `kind` at the player's planet and adds it to the docked
/// fleet there, creating that fleet if needed.
///
/// # Errors
///
/// [`GameError::UnknownPlayer`], [`GameError::UnknownLocation`],
/// [`GameError::NotPlanetOwner`] or [`GameError::UnknownShipKind`].
pub fn build_ship(
    ctx: &mut SimContext<'_>,
    player: &PlayerId,
    location: &Location,
    kind: &str,
) -> Result<ActionOutcome> {
    let planet = ctx.owned_planet(player, location)?;
    let player_entity = ctx.player_entity(player)?;
    let spec = ctx.config.catalog.ship(kind)?;

    let shipyard_level = match ctx.arena.planet(planet)?.buildings.get(SHIPYARD) {
        Some(id) => ctx.arena.building(*id)?.level(),
        None => 0,
    };
    if shipyard_level == 0 {
        debug!(%player, %location, kind, "ship refused: no shipyard");
        return Ok(ActionOutcome::refused(Refusal::ShipyardRequired));
    }

    if !requirements_met(ctx.arena, planet, player_entity, spec.requirements.as_ref())? {
        debug!(%player, %location, kind, "ship refused: requirements");
        return Ok(ActionOutcome::refused(Refusal::RequirementsNotMet));
    }

    let planet_data = &mut ctx.arena.planet_mut(planet)?.planet;
    if !planet_data.resources.covers(&spec.cost) {
        debug!(%player, %location, kind, "ship refused: funds");
        return Ok(ActionOutcome::refused(Refusal::InsufficientResources));
    }
    planet_data.resources = planet_data.resources.debit(&spec.cost);

    let fleet = match docked_fleet(ctx.arena, player_entity, location)? {
        Some(fleet) => fleet,
        None => spawn::fleet(ctx, player_entity, *location)?,
    };
    let ship = ctx
        .arena
        .fleet(fleet)?
        .ships
        .get(kind)
        .copied()
        .ok_or_else(|| GameError::UnknownShipKind(kind.to_string()))?;
    ctx.arena.ship_mut(ship)?.ship.count += 1;

    debug!(%player, %location, kind, %fleet, "ship built");
    ctx.emit(GameEvent::ShipBuilt {
        fleet,
        location: *location,
        ship_kind: kind.to_string(),
    });
    Ok(ActionOutcome::ok())
}
