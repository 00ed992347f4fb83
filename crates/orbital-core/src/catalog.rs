//! Static game data: building, ship and research definitions.
//!
//! Every planet receives one entity per building entry, every fleet one entity
//! per ship entry and every player one entity per research entry. The default
//! catalog is the stock game; a config file can replace it wholesale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::components::{
    BuildingComponent, CombatComponent, Component, ProducerComponent, RequirementsComponent,
    ResearchComponent, ShipComponent, StorageComponent,
};
use crate::error::{GameError, Result};
use crate::resources::{Resource, ResourceMap};

/// Building slot that gates ship construction.
pub const SHIPYARD: &str = "ship_yard";

/// Ship kind consumed by colonization.
pub const COLONY_SHIP: &str = "colony_ship";

// =============================================================================
// Specs
// =============================================================================

/// Definition of one building slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSpec {
    /// Display name.
    pub name: String,
    /// Cost of the first upgrade.
    pub cost: ResourceMap,
    /// Cost multiplier per level.
    pub cost_growth: f64,
    /// Effect multiplier per level.
    #[serde(default = "one")]
    pub effect_growth: f64,
    /// Resource and energy production.
    #[serde(default)]
    pub producer: Option<ProducerComponent>,
    /// Storage contribution.
    #[serde(default)]
    pub storage: Option<StorageComponent>,
    /// Defensive statistics per level.
    #[serde(default)]
    pub combat: Option<CombatComponent>,
    /// Upgrade prerequisites.
    #[serde(default)]
    pub requirements: Option<RequirementsComponent>,
}

impl BuildingSpec {
    /// Components for a fresh level-0 building entity.
    #[must_use]
    pub fn components(&self) -> Vec<Component> {
        let mut out = vec![Component::Building(BuildingComponent {
            name: self.name.clone(),
            base_cost: self.cost,
            cost_growth: self.cost_growth,
            effect_growth: self.effect_growth,
            level: 0,
        })];
        out.extend(self.producer.clone().map(Component::Producer));
        out.extend(self.storage.clone().map(Component::Storage));
        out.extend(self.combat.map(Component::Combat));
        out.extend(self.requirements.clone().map(Component::Requirements));
        out
    }
}

/// Definition of one ship kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipSpec {
    /// Display name.
    pub name: String,
    /// Cost of one ship.
    pub cost: ResourceMap,
    /// Travel speed.
    pub speed: f64,
    /// Cargo capacity of one ship.
    pub cargo: f64,
    /// Combat statistics of one ship.
    pub combat: CombatComponent,
    /// Construction prerequisites.
    #[serde(default)]
    pub requirements: Option<RequirementsComponent>,
}

impl ShipSpec {
    /// Ship component with `count` ships.
    #[must_use]
    pub fn ship(&self, count: u32) -> ShipComponent {
        ShipComponent {
            name: self.name.clone(),
            count,
            cost: self.cost,
            speed: self.speed,
            cargo: self.cargo,
        }
    }
}

/// Definition of one research line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchSpec {
    /// Display name.
    pub name: String,
    /// Cost of the first level.
    pub cost: ResourceMap,
    /// Cost multiplier per level.
    pub cost_growth: f64,
    /// Prerequisites.
    #[serde(default)]
    pub requirements: Option<RequirementsComponent>,
}

impl ResearchSpec {
    /// Research component at level 0.
    #[must_use]
    pub fn research(&self) -> ResearchComponent {
        ResearchComponent {
            name: self.name.clone(),
            cost: self.cost,
            cost_growth: self.cost_growth,
            level: 0,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// All buildings, ships and research lines, keyed by slot name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Building slot name -> definition.
    pub buildings: BTreeMap<String, BuildingSpec>,
    /// Ship kind -> definition.
    pub ships: BTreeMap<String, ShipSpec>,
    /// Research name -> definition.
    pub research: BTreeMap<String, ResearchSpec>,
}

impl Catalog {
    /// Looks up a building definition.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownBuilding`] for names outside the catalog.
    pub fn building(&self, name: &str) -> Result<&BuildingSpec> {
        self.buildings
            .get(name)
            .ok_or_else(|| GameError::UnknownBuilding(name.to_string()))
    }

    /// Looks up a ship definition.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownShipKind`] for kinds outside the catalog.
    pub fn ship(&self, kind: &str) -> Result<&ShipSpec> {
        self.ships
            .get(kind)
            .ok_or_else(|| GameError::UnknownShipKind(kind.to_string()))
    }

    /// Looks up a research definition.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownResearch`] for names outside the catalog.
    pub fn research(&self, name: &str) -> Result<&ResearchSpec> {
        self.research
            .get(name)
            .ok_or_else(|| GameError::UnknownResearch(name.to_string()))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            buildings: default_buildings(),
            ships: default_ships(),
            research: default_research(),
        }
    }
}

fn one() -> f64 {
    1.0
}

fn cost(metal: f64, crystal: f64, deuterium: f64) -> ResourceMap {
    ResourceMap::from_pairs(&[
        (Resource::Metal, metal),
        (Resource::Crystal, crystal),
        (Resource::Deuterium, deuterium),
    ])
}

fn requires(buildings: &[(&str, u32)], research: &[(&str, u32)]) -> Option<RequirementsComponent> {
    Some(RequirementsComponent {
        buildings: buildings.iter().map(|(k, v)| ((*k).to_string(), *v)).collect(),
        research: research.iter().map(|(k, v)| ((*k).to_string(), *v)).collect(),
    })
}

/// Per-hour amount as a per-second rate.
fn per_hour(resource: Resource, amount: f64) -> ResourceMap {
    ResourceMap::from_pairs(&[(resource, amount / 3600.0)])
}

fn plain(name: &str, cost: ResourceMap, cost_growth: f64) -> BuildingSpec {
    BuildingSpec {
        name: name.to_string(),
        cost,
        cost_growth,
        effect_growth: 1.0,
        producer: None,
        storage: None,
        combat: None,
        requirements: None,
    }
}

fn default_buildings() -> BTreeMap<String, BuildingSpec> {
    let mine = |name: &str, rate: ResourceMap, energy: f64, cost: ResourceMap, growth: f64| {
        BuildingSpec {
            effect_growth: 1.1,
            producer: Some(ProducerComponent {
                production_rate: rate,
                energy_consumption: energy,
                energy_production: 0.0,
            }),
            ..plain(name, cost, growth)
        }
    };
    let hangar = |name: &str, resource: Resource, cost: ResourceMap, growth: f64| BuildingSpec {
        storage: Some(StorageComponent {
            base_storage: ResourceMap::from_pairs(&[(resource, 10_000.0)]),
            growth: 1.5,
        }),
        ..plain(name, cost, growth)
    };
    let turret = |name: &str, combat: CombatComponent, cost: ResourceMap, req| BuildingSpec {
        combat: Some(combat),
        requirements: req,
        ..plain(name, cost, 1.0)
    };

    [
        (
            "metal_mine",
            mine("Metal Mine", per_hour(Resource::Metal, 30.0), 5.0, cost(10.0, 0.0, 0.0), 1.1),
        ),
        (
            "crystal_mine",
            mine("Crystal Mine", per_hour(Resource::Crystal, 15.0), 6.0, cost(20.0, 0.0, 0.0), 1.2),
        ),
        (
            "deuterium_synthesizer",
            mine(
                "Deuterium Synthesizer",
                per_hour(Resource::Deuterium, 10.0),
                7.0,
                cost(20.0, 20.0, 0.0),
                1.3,
            ),
        ),
        (
            "solar_plant",
            BuildingSpec {
                effect_growth: 1.1,
                producer: Some(ProducerComponent {
                    production_rate: ResourceMap::zero(),
                    energy_consumption: 0.0,
                    energy_production: 20.0,
                }),
                ..plain("Solar Plant", cost(10.0, 0.0, 0.0), 1.1)
            },
        ),
        ("metal_hangar", hangar("Metal Hangar", Resource::Metal, cost(5.0, 0.0, 0.0), 1.2)),
        ("crystal_hangar", hangar("Crystal Hangar", Resource::Crystal, cost(8.0, 0.0, 0.0), 1.3)),
        (
            "deuterium_tank",
            hangar("Deuterium Tank", Resource::Deuterium, cost(8.0, 10.0, 0.0), 1.3),
        ),
        (SHIPYARD, plain("Shipyard", cost(20.0, 0.0, 0.0), 1.3)),
        ("research_lab", plain("Research Lab", cost(50.0, 100.0, 50.0), 1.5)),
        (
            "missile_turret",
            turret(
                "Missile Turret",
                CombatComponent { hp: 3_800.0, shield: 34.0, damage: 152.0 },
                cost(2_000.0, 0.0, 0.0),
                requires(&[(SHIPYARD, 1)], &[]),
            ),
        ),
        (
            "laser_turret",
            turret(
                "Laser Turret",
                CombatComponent { hp: 3_800.0, shield: 42.0, damage: 190.0 },
                cost(1_500.0, 500.0, 0.0),
                requires(&[(SHIPYARD, 2)], &[("laser", 3)]),
            ),
        ),
        (
            "heavy_laser",
            turret(
                "Heavy Laser",
                CombatComponent { hp: 15_200.0, shield: 170.0, damage: 475.0 },
                cost(6_000.0, 2_000.0, 0.0),
                requires(&[(SHIPYARD, 4)], &[("energy", 3), ("laser", 6)]),
            ),
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_ships() -> BTreeMap<String, ShipSpec> {
    let ship = |name: &str, cost, speed, cargo, hp, shield, damage, req| ShipSpec {
        name: name.to_string(),
        cost,
        speed,
        cargo,
        combat: CombatComponent { hp, shield, damage },
        requirements: req,
    };

    [
        (
            "light_fighter",
            ship("Light Fighter", cost(30.0, 0.0, 10.0), 10.0, 100.0, 100.0, 20.0, 20.0, None),
        ),
        (
            "heavy_fighter",
            ship(
                "Heavy Fighter",
                cost(100.0, 0.0, 30.0),
                10.0,
                150.0,
                250.0,
                40.0,
                50.0,
                requires(&[(SHIPYARD, 3)], &[("armour_tech", 2)]),
            ),
        ),
        (
            "small_cargo",
            ship("Small Cargo", cost(20.0, 20.0, 0.0), 8.0, 5_000.0, 400.0, 10.0, 5.0, None),
        ),
        (
            COLONY_SHIP,
            ship(
                "Colony Ship",
                cost(1_000.0, 2_000.0, 1_000.0),
                5.0,
                7_500.0,
                3_000.0,
                100.0,
                50.0,
                None,
            ),
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_research() -> BTreeMap<String, ResearchSpec> {
    let line = |name: &str, cost, growth, req| ResearchSpec {
        name: name.to_string(),
        cost,
        cost_growth: growth,
        requirements: req,
    };

    [
        (
            "energy",
            line("Energy Technology", cost(100.0, 200.0, 50.0), 2.0, requires(&[("research_lab", 1)], &[])),
        ),
        (
            "laser",
            line(
                "Laser Technology",
                cost(20.0, 40.0, 0.0),
                1.7,
                requires(&[("research_lab", 2)], &[("energy", 2)]),
            ),
        ),
        (
            "combustion_drive",
            line(
                "Combustion Drive",
                cost(400.0, 0.0, 600.0),
                2.0,
                requires(&[("research_lab", 1)], &[("energy", 1)]),
            ),
        ),
        (
            "impulse_drive",
            line(
                "Impulse Drive",
                cost(2_000.0, 4_000.0, 600.0),
                2.0,
                requires(&[("research_lab", 2)], &[("energy", 1)]),
            ),
        ),
        (
            "armour_tech",
            line("Armour Technology", cost(1_000.0, 0.0, 0.0), 2.0, requires(&[("research_lab", 2)], &[])),
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}
