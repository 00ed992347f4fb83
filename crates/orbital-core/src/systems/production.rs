//! Storage, energy and resource accrual.
//!
//! Each tick first recomputes, for every planet, the storage ceiling, the
//! energy balance and the per-second production. That phase only reads the
//! arena and runs in parallel with rayon. Accrual then applies `rate × dt`
//! sequentially in planet id order, bounded by the storage ceiling.
//!
//! Production of a building at level `n` with base rate `b`, effect growth
//! `e` and universe speed `s`:
//!
//! ```text
//! b·s + b·s·n·ratio·eⁿ
//! ```
//!
//! where `ratio = min(1, energy_produced / energy_consumed)` (1 without
//! consumption) throttles all producers of the planet alike.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::arena::Arena;
use crate::config::OverflowPolicy;
use crate::entity::components::EnergyBalance;
use crate::entity::{EntityId, EntityTag};
use crate::error::Result;
use crate::event::GameEvent;
use crate::resources::{Resource, ResourceMap};
use crate::systems::{SimContext, System};

/// Derived production figures of one planet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetYield {
    /// Storage ceiling per resource.
    pub storage: ResourceMap,
    /// Production per second.
    pub rate: ResourceMap,
    /// Energy grid.
    pub energy: EnergyBalance,
}

/// Computes storage, energy and production of `planet` from its buildings.
///
/// # Errors
///
/// Only on broken references.
pub fn planet_yield(arena: &Arena, planet: EntityId, universe_speed: f64) -> Result<PlanetYield> {
    let buildings = &arena.planet(planet)?.buildings;

    let mut storage = ResourceMap::zero();
    let mut produced = 0.0;
    let mut consumed = 0.0;
    for id in buildings.values() {
        let b = arena.building(*id)?;
        let level = b.level();
        let effect = b.building.as_ref().map_or(1.0, |c| c.effect_multiplier());
        if let Some(s) = &b.storage {
            storage += s.capacity(level);
        }
        if let Some(p) = &b.producer {
            produced += p.energy_production * f64::from(level) * effect;
            consumed += p.energy_consumption * f64::from(level) * effect;
        }
    }

    let ratio = if consumed == 0.0 {
        1.0
    } else {
        (produced / consumed).min(1.0)
    };

    let mut rate = ResourceMap::zero();
    for id in buildings.values() {
        let b = arena.building(*id)?;
        let Some(p) = &b.producer else { continue };
        let level = f64::from(b.level());
        let effect = b.building.as_ref().map_or(1.0, |c| c.effect_multiplier());
        let base = p.production_rate.scaled(universe_speed);
        rate += base + base.scaled(level * ratio * effect);
    }

    Ok(PlanetYield {
        storage,
        rate,
        energy: EnergyBalance {
            produced,
            consumed,
            ratio,
        },
    })
}

/// Writes freshly computed caches onto `planet` without accruing anything.
///
/// # Errors
///
/// Only on broken references.
pub fn refresh_planet(arena: &mut Arena, planet: EntityId, universe_speed: f64) -> Result<()> {
    let yielded = planet_yield(arena, planet, universe_speed)?;
    let p = &mut arena.planet_mut(planet)?.planet;
    p.storage_capacity = yielded.storage;
    p.production_rate = yielded.rate;
    p.energy = yielded.energy;
    Ok(())
}

/// Adds `rate × dt` to `balance` under `capacity`.
///
/// Returns the new balance and the amount per resource that did not fit.
#[must_use]
pub fn accrue(
    balance: &ResourceMap,
    capacity: &ResourceMap,
    rate: &ResourceMap,
    dt: f64,
    policy: OverflowPolicy,
) -> (ResourceMap, ResourceMap) {
    let mut out = *balance;
    let mut discarded = ResourceMap::zero();
    for &r in Resource::all() {
        let produced = rate[r] * dt;
        if produced <= 0.0 {
            continue;
        }
        let left = capacity[r] - balance[r];
        if left <= 0.0 {
            discarded[r] = produced;
            continue;
        }
        if policy == OverflowPolicy::Reject && produced > left {
            discarded[r] = produced;
            continue;
        }
        out[r] += produced.min(left);
        discarded[r] = (produced - left).max(0.0);
    }
    (out, discarded)
}

/// Per-tick production for every planet.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductionSystem;

impl System for ProductionSystem {
    fn name(&self) -> &'static str {
        "production"
    }

    fn run(&self, ctx: &mut SimContext<'_>, dt: f64) -> Result<()> {
        let speed = ctx.config.universe_speed;
        let planets = ctx.arena.ids_with_tag(EntityTag::Planet);

        let arena: &Arena = ctx.arena;
        let yields = planets
            .par_iter()
            .map(|id| planet_yield(arena, *id, speed).map(|y| (*id, y)))
            .collect::<Result<Vec<_>>>()?;

        for (id, yielded) in yields {
            let planet = &mut ctx.arena.planet_mut(id)?.planet;
            planet.storage_capacity = yielded.storage;
            planet.production_rate = yielded.rate;
            planet.energy = yielded.energy;

            let (balance, discarded) = accrue(
                &planet.resources,
                &yielded.storage,
                &yielded.rate,
                dt,
                ctx.config.overflow_policy,
            );
            planet.resources = balance;
            let location = planet.location;

            if ctx.config.overflow_policy == OverflowPolicy::DiscardAndLog {
                for (resource, amount) in discarded.iter().filter(|(_, q)| *q > 0.0) {
                    debug!(%location, %resource, amount, "production overflow discarded");
                    ctx.emit(GameEvent::ProductionOverflow {
                        location,
                        resource,
                        discarded: amount,
                    });
                }
            }
        }

        trace!(planets = planets.len(), dt, "production pass");
        Ok(())
    }
}
