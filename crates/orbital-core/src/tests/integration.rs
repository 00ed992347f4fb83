//! Integration tests for whole games.
//!
//! These tests drive a `Simulation` through its public API and verify:
//! - Production over simulated time
//! - Upgrade funding and atomicity
//! - Ship building
//! - Transport, colonization and attack missions
//! - Fleet merging and removal
//! - Snapshot shape

use crate::catalog::{COLONY_SHIP, SHIPYARD};
use crate::config::SimConfig;
use crate::entity::components::{FleetState, Mission, PlayerId, Voyage};
use crate::error::{ActionOutcome, GameError, Refusal};
use crate::event::GameEvent;
use crate::location::Location;
use crate::resources::{Resource, ResourceMap};
use crate::simulation::Simulation;
use crate::systems::spawn;

use super::helpers::{
    add_planet, add_player, assert_resources_eq, building_level, dock_ships, fleets_docked_at,
    plenty, quiet_config, resources_at, run_until, set_building_level, set_resources,
};

fn metal(q: f64) -> ResourceMap {
    ResourceMap::from_pairs(&[(Resource::Metal, q)])
}

fn docked(sim: &Simulation, player: &PlayerId) -> bool {
    sim.player_fleets(player)
        .unwrap()
        .iter()
        .all(|f| matches!(f.state, FleetState::Docked { .. }))
}

// =============================================================================
// Production
// =============================================================================

mod production_tests {
    use super::*;

    fn hour_of_production(universe_speed: f64) {
        let mut sim = Simulation::new(SimConfig {
            universe_speed,
            ..SimConfig::default()
        })
        .unwrap();
        let (_, home) = add_player(&mut sim, "miner");
        set_resources(&mut sim, home, ResourceMap::zero());

        for _ in 0..3600 {
            sim.tick(1.0).unwrap();
        }

        let metal = resources_at(&sim, home)[Resource::Metal];
        assert!(
            (metal - 30.0 * universe_speed).abs() < 1e-6,
            "speed {universe_speed}: got {metal}"
        );
    }

    #[test]
    fn level_zero_mine_yields_thirty_metal_per_hour() {
        hour_of_production(1.0);
    }

    #[test]
    fn universe_speed_scales_production() {
        hour_of_production(3.0);
    }

    #[test]
    fn one_long_tick_matches_many_short_ones() {
        let mut short = Simulation::new(SimConfig::default()).unwrap();
        let mut long = Simulation::new(SimConfig::default()).unwrap();
        let (_, a) = add_player(&mut short, "p");
        let (_, b) = add_player(&mut long, "p");
        assert_eq!(a, b);

        for _ in 0..600 {
            short.tick(1.0).unwrap();
        }
        long.tick(600.0).unwrap();
        assert_resources_eq(&resources_at(&short, a), &resources_at(&long, b));
    }

    #[test]
    fn balances_stop_at_storage_capacity() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let (_, home) = add_player(&mut sim, "p");
        set_resources(&mut sim, home, metal(9_999.0));

        sim.tick(3_600.0 * 10.0).unwrap();
        sim.tick(3_600.0).unwrap();
        assert_eq!(resources_at(&sim, home)[Resource::Metal], 10_000.0);
    }

    #[test]
    fn energy_shortage_throttles_upgraded_mines() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        set_building_level(&mut sim, home, "metal_mine", 5);
        let dark = sim.player_planets(&player).unwrap()[&home].clone();
        assert_eq!(dark.energy.ratio, 0.0);

        set_building_level(&mut sim, home, "solar_plant", 10);
        let lit = sim.player_planets(&player).unwrap()[&home].clone();
        assert_eq!(lit.energy.ratio, 1.0);
        assert!(lit.production_rate[Resource::Metal] > dark.production_rate[Resource::Metal]);
    }
}

// =============================================================================
// Upgrades
// =============================================================================

mod upgrade_tests {
    use super::*;

    #[test]
    fn upgrade_waits_for_funds() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        set_resources(&mut sim, home, ResourceMap::zero());

        let refused = sim.upgrade_building(&player, &home, "metal_mine").unwrap();
        assert_eq!(refused, ActionOutcome::refused(Refusal::InsufficientResources));
        assert_eq!(resources_at(&sim, home), ResourceMap::zero());
        assert_eq!(building_level(&sim, home, "metal_mine"), 0);

        // An hour at level 0 yields 30 metal; the first level costs 10.
        sim.tick(3_600.0).unwrap();
        let before = resources_at(&sim, home);
        assert!(sim.upgrade_building(&player, &home, "metal_mine").unwrap().success);
        assert_eq!(building_level(&sim, home, "metal_mine"), 1);
        assert_resources_eq(&resources_at(&sim, home), &(before - metal(10.0)));
    }

    #[test]
    fn upgrade_cost_grows_with_level() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        set_resources(&mut sim, home, plenty(1_000.0));

        assert!(sim.upgrade_building(&player, &home, SHIPYARD).unwrap().success);
        let after_first = resources_at(&sim, home);
        assert!(sim.upgrade_building(&player, &home, SHIPYARD).unwrap().success);
        let after_second = resources_at(&sim, home);

        // ship_yard: 20 metal, growth 1.3
        assert_resources_eq(&after_first, &(plenty(1_000.0) - metal(20.0)));
        assert_resources_eq(&after_second, &(after_first - metal(26.0)));
    }

    #[test]
    fn unmet_requirements_leave_state_untouched() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        set_resources(&mut sim, home, plenty(1_000_000.0));
        let before = sim.snapshot().unwrap();

        let outcome = sim.upgrade_building(&player, &home, "laser_turret").unwrap();
        assert_eq!(outcome.reason, Some(Refusal::RequirementsNotMet));
        assert_eq!(sim.snapshot().unwrap(), before);
    }

    #[test]
    fn research_unlocks_buildings() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        set_resources(&mut sim, home, plenty(1_000_000.0));
        set_building_level(&mut sim, home, SHIPYARD, 2);
        set_building_level(&mut sim, home, "research_lab", 10);

        assert_eq!(
            sim.upgrade_building(&player, &home, "laser_turret").unwrap().reason,
            Some(Refusal::RequirementsNotMet)
        );
        // laser needs energy 2 and a level 2 lab
        assert!(!sim.upgrade_research(&player, &home, "laser").unwrap().success);
        for _ in 0..2 {
            assert!(sim.upgrade_research(&player, &home, "energy").unwrap().success);
        }
        for _ in 0..3 {
            assert!(sim.upgrade_research(&player, &home, "laser").unwrap().success);
        }
        assert_eq!(sim.snapshot().unwrap().players[&player].research["laser"].level, 3);
        assert!(sim.upgrade_building(&player, &home, "laser_turret").unwrap().success);
    }

    #[test]
    fn usage_errors_are_errors() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        let (other, other_home) = add_player(&mut sim, "q");

        assert!(matches!(
            sim.upgrade_building(&player, &home, "moon_base"),
            Err(GameError::UnknownBuilding(_))
        ));
        assert!(matches!(
            sim.upgrade_research(&player, &home, "warp"),
            Err(GameError::UnknownResearch(_))
        ));
        assert!(matches!(
            sim.upgrade_building(&player, &other_home, "metal_mine"),
            Err(GameError::NotPlanetOwner { .. })
        ));
        assert!(matches!(
            sim.upgrade_building(&PlayerId::new("ghost"), &home, "metal_mine"),
            Err(GameError::UnknownPlayer(_))
        ));
        let empty = Location::new(5, 500, 9);
        if sim.index().is_free(&empty) {
            assert!(matches!(
                sim.upgrade_building(&other, &empty, "metal_mine"),
                Err(GameError::UnknownLocation(_))
            ));
        }
    }
}

// =============================================================================
// Ships
// =============================================================================

mod shipyard_tests {
    use super::*;

    #[test]
    fn ships_need_a_shipyard() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        set_resources(&mut sim, home, plenty(10_000.0));

        let outcome = sim.build_ship(&player, &home, "light_fighter").unwrap();
        assert_eq!(outcome.reason, Some(Refusal::ShipyardRequired));
        assert_eq!(resources_at(&sim, home), plenty(10_000.0));
        assert!(sim.player_fleets(&player).unwrap().is_empty());
    }

    #[test]
    fn ships_join_the_docked_fleet() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        set_building_level(&mut sim, home, SHIPYARD, 1);
        set_resources(&mut sim, home, plenty(1_000.0));

        assert!(sim.build_ship(&player, &home, "light_fighter").unwrap().success);
        assert!(sim.build_ship(&player, &home, "light_fighter").unwrap().success);
        assert!(sim.build_ship(&player, &home, "small_cargo").unwrap().success);

        let fleets = sim.player_fleets(&player).unwrap();
        assert_eq!(fleets.len(), 1);
        assert_eq!(fleets[0].ships["light_fighter"], 2);
        assert_eq!(fleets[0].ships["small_cargo"], 1);

        // 2 × (30 m, 10 d) + (20 m, 20 c)
        let spent = ResourceMap::from_pairs(&[
            (Resource::Metal, 80.0),
            (Resource::Crystal, 20.0),
            (Resource::Deuterium, 20.0),
        ]);
        assert_resources_eq(&resources_at(&sim, home), &(plenty(1_000.0) - spent));
    }

    #[test]
    fn refused_ship_creates_no_fleet() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        set_building_level(&mut sim, home, SHIPYARD, 1);
        set_resources(&mut sim, home, ResourceMap::zero());

        let outcome = sim.build_ship(&player, &home, "light_fighter").unwrap();
        assert_eq!(outcome.reason, Some(Refusal::InsufficientResources));
        assert!(sim.player_fleets(&player).unwrap().is_empty());
    }

    #[test]
    fn unknown_ship_kind_is_an_error() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        assert!(matches!(
            sim.build_ship(&player, &home, "death_star"),
            Err(GameError::UnknownShipKind(_))
        ));
    }
}

// =============================================================================
// Missions
// =============================================================================

mod mission_tests {
    use super::*;

    #[test]
    fn transport_round_trip_moves_cargo_once() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        let (_, target) = add_player(&mut sim, "q");
        set_resources(&mut sim, home, plenty(1_000.0));
        set_resources(&mut sim, target, ResourceMap::zero());
        dock_ships(&mut sim, &player, home, "small_cargo", 1);

        let cargo = ResourceMap::from_pairs(&[(Resource::Metal, 300.0), (Resource::Crystal, 200.0)]);
        let outcome = sim
            .send_mission(&player, &home, Mission::Transport, target, cargo)
            .unwrap();
        assert!(outcome.success);
        assert_resources_eq(&resources_at(&sim, home), &(plenty(1_000.0) - cargo));

        run_until(&mut sim, 10.0, 10_000, |s| {
            resources_at(s, target) != ResourceMap::zero()
        });
        assert_resources_eq(&resources_at(&sim, target), &cargo);
        let fleets = sim.player_fleets(&player).unwrap();
        assert!(fleets[0].cargo.is_zero());
        assert!(matches!(
            fleets[0].state,
            FleetState::InTransit(v) if v.mission == Mission::Return && v.to == home
        ));

        run_until(&mut sim, 10.0, 10_000, |s| docked(s, &player));
        let fleets = fleets_docked_at(&sim, &player, home);
        assert_eq!(fleets.len(), 1);
        assert!(fleets[0].cargo.is_zero());
        assert_resources_eq(&resources_at(&sim, home), &(plenty(1_000.0) - cargo));
        assert_resources_eq(&resources_at(&sim, target), &cargo);
    }

    #[test]
    fn order_refusals() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        let (_, target) = add_player(&mut sim, "q");
        set_resources(&mut sim, home, plenty(100_000.0));

        let send = |sim: &mut Simulation, mission, to, cargo| {
            sim.send_mission(&player, &home, mission, to, cargo).unwrap().reason
        };

        assert_eq!(
            send(&mut sim, Mission::Transport, target, ResourceMap::zero()),
            Some(Refusal::NoFleetAtOrigin)
        );

        dock_ships(&mut sim, &player, home, "light_fighter", 1);
        assert_eq!(
            send(&mut sim, Mission::Attack, home, ResourceMap::zero()),
            Some(Refusal::CannotAttackOwnPlanet)
        );
        assert_eq!(
            send(&mut sim, Mission::Return, target, ResourceMap::zero()),
            Some(Refusal::DestinationNotOwned)
        );
        assert_eq!(
            send(&mut sim, Mission::Colonize, target, ResourceMap::zero()),
            Some(Refusal::LocationOccupied)
        );
        let nowhere = Location::new(9, 9, 9);
        assert_eq!(
            send(&mut sim, Mission::Transport, nowhere, ResourceMap::zero()),
            Some(Refusal::UnknownDestination)
        );
        // 100 cargo per light fighter
        assert_eq!(
            send(&mut sim, Mission::Transport, target, metal(101.0)),
            Some(Refusal::InsufficientCargoCapacity)
        );
        assert_eq!(send(&mut sim, Mission::Transport, target, metal(100.0)), None);
        assert_eq!(resources_at(&sim, home), plenty(100_000.0) - metal(100.0));
    }

    #[test]
    fn colonize_requires_a_colony_ship() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        dock_ships(&mut sim, &player, home, "light_fighter", 1);

        let free = (1..=9)
            .map(|p| Location::new(1, 1, p))
            .find(|l| sim.index().is_free(l))
            .unwrap();
        let outcome = sim
            .send_mission(&player, &home, Mission::Colonize, free, ResourceMap::zero())
            .unwrap();
        assert_eq!(outcome.reason, Some(Refusal::NoColonyShip));
    }

    #[test]
    fn colonization_founds_a_planet() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        set_resources(&mut sim, home, plenty(1_000.0));
        dock_ships(&mut sim, &player, home, COLONY_SHIP, 1);
        dock_ships(&mut sim, &player, home, "small_cargo", 1);

        let free = (1..=9)
            .map(|p| Location::new(2, 7, p))
            .find(|l| sim.index().is_free(l))
            .unwrap();
        let cargo = metal(250.0);
        assert!(sim
            .send_mission(&player, &home, Mission::Colonize, free, cargo)
            .unwrap()
            .success);

        run_until(&mut sim, 60.0, 10_000, |s| !s.index().is_free(&free));
        let planets = sim.player_planets(&player).unwrap();
        assert_eq!(planets.len(), 2);
        assert_eq!(planets[&free].resources, cargo);
        assert_eq!(planets[&free].buildings.len(), sim.config().catalog.buildings.len());

        let fleets = fleets_docked_at(&sim, &player, free);
        assert_eq!(fleets.len(), 1);
        assert_eq!(fleets[0].ships.get(COLONY_SHIP), None);
        assert_eq!(fleets[0].ships["small_cargo"], 1);
    }

    #[test]
    fn lone_colony_ship_is_consumed() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        dock_ships(&mut sim, &player, home, COLONY_SHIP, 1);
        let free = (1..=9)
            .map(|p| Location::new(4, 400, p))
            .find(|l| sim.index().is_free(l))
            .unwrap();
        sim.send_mission(&player, &home, Mission::Colonize, free, ResourceMap::zero())
            .unwrap();

        run_until(&mut sim, 60.0, 10_000, |s| !s.index().is_free(&free));
        assert!(sim.player_fleets(&player).unwrap().is_empty());
        assert!(sim
            .take_events()
            .iter()
            .any(|r| matches!(r.event, GameEvent::FleetRemoved { .. })));
    }

    #[test]
    fn colonize_race_turns_into_return() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        set_resources(&mut sim, home, plenty(1_000.0));
        dock_ships(&mut sim, &player, home, COLONY_SHIP, 1);

        let free = (1..=9)
            .map(|p| Location::new(3, 250, p))
            .find(|l| sim.index().is_free(l))
            .unwrap();
        let cargo = metal(400.0);
        assert!(sim
            .send_mission(&player, &home, Mission::Colonize, free, cargo)
            .unwrap()
            .success);

        // Someone else settles first.
        add_planet(&mut sim, free, None);
        let planets = sim.index().len();

        run_until(&mut sim, 60.0, 10_000, |s| {
            s.player_fleets(&player).unwrap().iter().any(|f| {
                matches!(f.state, FleetState::InTransit(v) if v.mission == Mission::Return)
            })
        });
        assert_eq!(sim.index().len(), planets);
        assert!(sim
            .take_events()
            .iter()
            .any(|r| matches!(r.event, GameEvent::ColonizationAborted { location, .. } if location == free)));

        run_until(&mut sim, 60.0, 10_000, |s| docked(s, &player));
        let fleets = fleets_docked_at(&sim, &player, home);
        assert_eq!(fleets.len(), 1);
        assert_eq!(fleets[0].ships[COLONY_SHIP], 1);
        assert_resources_eq(&resources_at(&sim, home), &plenty(1_000.0));
        assert_eq!(sim.player_planets(&player).unwrap().len(), 1);
    }

    #[test]
    fn fleets_landing_together_merge() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        let (_, target) = add_player(&mut sim, "q");

        dock_ships(&mut sim, &player, home, "light_fighter", 2);
        assert!(sim
            .send_mission(&player, &home, Mission::Transport, target, ResourceMap::zero())
            .unwrap()
            .success);
        dock_ships(&mut sim, &player, home, "light_fighter", 3);
        assert!(sim
            .send_mission(&player, &home, Mission::Transport, target, ResourceMap::zero())
            .unwrap()
            .success);
        assert_eq!(sim.player_fleets(&player).unwrap().len(), 2);

        run_until(&mut sim, 10.0, 10_000, |s| docked(s, &player));
        let fleets = sim.player_fleets(&player).unwrap();
        assert_eq!(fleets.len(), 1);
        assert_eq!(fleets[0].ships["light_fighter"], 5);
        assert!(sim
            .take_events()
            .iter()
            .any(|r| matches!(&r.event, GameEvent::FleetsMerged { merged, .. } if merged.len() == 1)));
    }

    #[test]
    fn fleet_in_transit_cannot_be_ordered() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        let (_, target) = add_player(&mut sim, "q");
        dock_ships(&mut sim, &player, home, "light_fighter", 1);
        sim.send_mission(&player, &home, Mission::Transport, target, ResourceMap::zero())
            .unwrap();

        let fleet = sim.player_fleets(&player).unwrap()[0].id;
        let outcome = sim
            .with_context(|ctx| {
                crate::systems::mission::order_mission(
                    ctx,
                    fleet,
                    Mission::Transport,
                    target,
                    ResourceMap::zero(),
                )
            })
            .unwrap();
        assert_eq!(outcome.reason, Some(Refusal::FleetInTransit));
    }
}

// =============================================================================
// Combat
// =============================================================================

mod attack_tests {
    use super::*;

    #[test]
    fn raid_on_undefended_planet_loots_in_resource_order() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (raider, home) = add_player(&mut sim, "raider");
        let (_, target) = add_player(&mut sim, "victim");
        set_resources(&mut sim, home, ResourceMap::zero());
        set_resources(&mut sim, target, plenty(80.0));
        // 2 × 100 cargo
        dock_ships(&mut sim, &raider, home, "light_fighter", 2);

        assert!(sim
            .send_mission(&raider, &home, Mission::Attack, target, ResourceMap::zero())
            .unwrap()
            .success);
        run_until(&mut sim, 10.0, 10_000, |s| docked(s, &raider));

        assert_resources_eq(
            &resources_at(&sim, target),
            &ResourceMap::from_pairs(&[(Resource::Deuterium, 40.0)]),
        );
        assert_resources_eq(
            &resources_at(&sim, home),
            &ResourceMap::from_pairs(&[
                (Resource::Metal, 80.0),
                (Resource::Crystal, 80.0),
                (Resource::Deuterium, 40.0),
            ]),
        );
        let combat = sim
            .take_events()
            .into_iter()
            .find(|r| matches!(r.event, GameEvent::CombatResolved { .. }))
            .unwrap();
        assert!(matches!(combat.event, GameEvent::CombatResolved { attacker_victory: true, rounds: 0, .. }));
    }

    #[test]
    fn crushed_attackers_are_removed() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (raider, home) = add_player(&mut sim, "raider");
        let (defender, target) = add_player(&mut sim, "defender");
        set_resources(&mut sim, target, plenty(500.0));
        dock_ships(&mut sim, &raider, home, "light_fighter", 1);
        dock_ships(&mut sim, &defender, target, "light_fighter", 500);

        sim.send_mission(&raider, &home, Mission::Attack, target, ResourceMap::zero())
            .unwrap();
        run_until(&mut sim, 10.0, 10_000, |s| {
            s.player_fleets(&raider).unwrap().is_empty()
        });

        assert_resources_eq(&resources_at(&sim, target), &plenty(500.0));
        let defenders = fleets_docked_at(&sim, &defender, target);
        assert_eq!(defenders.len(), 1);
        assert!(defenders[0].ships["light_fighter"] > 0);
    }

    #[test]
    fn fleet_landing_in_the_same_tick_joins_the_defense() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (raider, home) = add_player(&mut sim, "raider");
        let (defender, target) = add_player(&mut sim, "defender");
        set_resources(&mut sim, target, plenty(500.0));
        dock_ships(&mut sim, &defender, target, "light_fighter", 1);

        // A second defending fleet one second from home, older than the raid.
        sim.with_context(|ctx| {
            let owner = ctx.player_entity(&defender)?;
            let fleet = spawn::fleet(ctx, owner, target)?;
            let ship = ctx.arena.fleet(fleet)?.ships["light_fighter"];
            ctx.arena.ship_mut(ship)?.ship.count = 500;
            ctx.arena.fleet_mut(fleet)?.fleet.state =
                FleetState::InTransit(Voyage::new(home, target, Mission::Return, 1.0));
            Ok::<_, GameError>(())
        })
        .unwrap();

        dock_ships(&mut sim, &raider, home, "light_fighter", 20);
        assert!(sim
            .send_mission(&raider, &home, Mission::Attack, target, ResourceMap::zero())
            .unwrap()
            .success);
        sim.with_context(|ctx| {
            let owner = ctx.player_entity(&raider)?;
            let fleet = ctx.arena.player(owner)?.fleets[0];
            if let Some(voyage) = ctx.arena.fleet_mut(fleet)?.fleet.voyage_mut() {
                voyage.travel_time_left = 1.0;
            }
            Ok::<_, GameError>(())
        })
        .unwrap();
        sim.take_events();

        sim.tick(5.0).unwrap();

        let events = sim.take_events();
        assert!(events.iter().any(|r| matches!(
            r.event,
            GameEvent::CombatResolved { attacker_victory: false, .. }
        )));
        assert_eq!(
            events
                .iter()
                .filter(|r| matches!(r.event, GameEvent::FleetsMerged { .. }))
                .count(),
            1
        );
        assert_resources_eq(&resources_at(&sim, target), &plenty(500.0));
        let defenders = fleets_docked_at(&sim, &defender, target);
        assert_eq!(defenders.len(), 1);
        assert!(defenders[0].ships["light_fighter"] > 400);
        assert!(sim.player_fleets(&raider).unwrap().is_empty());
    }

    #[test]
    fn defensive_buildings_lose_levels() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let (raider, home) = add_player(&mut sim, "raider");
        let (_, target) = add_player(&mut sim, "defender");
        set_building_level(&mut sim, target, "missile_turret", 1);
        dock_ships(&mut sim, &raider, home, "light_fighter", 2_000);

        sim.send_mission(&raider, &home, Mission::Attack, target, ResourceMap::zero())
            .unwrap();
        run_until(&mut sim, 10.0, 10_000, |s| building_level(s, target, "missile_turret") == 0);
        assert!(sim.take_events().iter().any(|r| matches!(
            r.event,
            GameEvent::CombatResolved { attacker_victory: true, .. }
        )));
    }
}

// =============================================================================
// Snapshots
// =============================================================================

mod snapshot_tests {
    use super::*;

    #[test]
    fn snapshot_json_shape() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let (player, home) = add_player(&mut sim, "p");
        dock_ships(&mut sim, &player, home, "light_fighter", 1);
        sim.tick(1.0).unwrap();

        let json = serde_json::to_value(sim.snapshot().unwrap()).unwrap();
        assert_eq!(json["tick"], 1);
        let key = home.to_string();
        let planet = &json["planets"][&key];
        assert_eq!(planet["owner"], "p");
        assert_eq!(planet["buildings"]["metal_mine"]["level"], 0);
        assert!(planet["resources"]["metal"].is_number());

        let fleet = &json["players"]["p"]["fleets"][0];
        assert_eq!(fleet["state"], "docked");
        assert_eq!(fleet["location"], key.as_str());
        assert_eq!(fleet["ships"]["light_fighter"], 1);
    }

    #[test]
    fn refusal_json_shape() {
        let json = serde_json::to_value(ActionOutcome::refused(Refusal::InsufficientResources)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "reason": "insufficient_resources"})
        );
    }

    #[test]
    fn snapshot_round_trips() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        add_player(&mut sim, "p");
        let snapshot = sim.snapshot().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: crate::view::GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.player_count(), 1);
        assert_eq!(back.planets, snapshot.planets);
    }
}
