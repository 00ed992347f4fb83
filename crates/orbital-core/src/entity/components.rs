//! Component structs attached to entities.
//!
//! Each entity kind owns a bundle struct (`PlanetComponents`,
//! `FleetComponents`, ...) holding its mandatory components plus `Option`
//! slots for the optional ones. Child entities are referenced by
//! [`EntityId`]; the arena owns the actual storage.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::GameError;
use crate::location::Location;
use crate::resources::ResourceMap;

// =============================================================================
// Identifiers
// =============================================================================

/// Player identifier chosen by the client at registration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Creates a player id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// =============================================================================
// Component kinds
// =============================================================================

/// Static identity of a building plus its upgrade curve and current level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingComponent {
    /// Display name.
    pub name: String,
    /// Cost of the first upgrade.
    pub base_cost: ResourceMap,
    /// Cost multiplier applied per level.
    pub cost_growth: f64,
    /// Effect multiplier applied per level (production, energy).
    pub effect_growth: f64,
    /// Current level, starting at 0.
    pub level: u32,
}

impl BuildingComponent {
    /// Cost of going from the current level to the next one.
    #[must_use]
    pub fn upgrade_cost(&self) -> ResourceMap {
        self.base_cost.scaled(growth(self.cost_growth, self.level))
    }

    /// Effect multiplier at the current level.
    #[must_use]
    pub fn effect_multiplier(&self) -> f64 {
        growth(self.effect_growth, self.level)
    }
}

/// Resource and energy production of a building at level 1.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProducerComponent {
    /// Units produced per second.
    pub production_rate: ResourceMap,
    /// Energy drawn from the planet grid.
    pub energy_consumption: f64,
    /// Energy fed into the planet grid.
    pub energy_production: f64,
}

/// Storage contributed by a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageComponent {
    /// Capacity at level 0.
    pub base_storage: ResourceMap,
    /// Capacity multiplier applied per level.
    pub growth: f64,
}

impl StorageComponent {
    /// Capacity provided at `level`.
    #[must_use]
    pub fn capacity(&self, level: u32) -> ResourceMap {
        self.base_storage.scaled(growth(self.growth, level))
    }
}

/// Combat statistics of one ship or one level of a defensive building.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatComponent {
    /// Hull points.
    pub hp: f64,
    /// Shield points (carried for display, not used by the resolver).
    pub shield: f64,
    /// Damage dealt per round.
    pub damage: f64,
}

/// Levels that must be reached before an upgrade or construction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequirementsComponent {
    /// Building slot name -> minimum level on the same planet.
    #[serde(default)]
    pub buildings: BTreeMap<String, u32>,
    /// Research name -> minimum level of the player.
    #[serde(default)]
    pub research: BTreeMap<String, u32>,
}

/// A research line of a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchComponent {
    /// Display name.
    pub name: String,
    /// Cost of the first level.
    pub cost: ResourceMap,
    /// Cost multiplier applied per level.
    pub cost_growth: f64,
    /// Current level.
    pub level: u32,
}

impl ResearchComponent {
    /// Cost of going from the current level to the next one.
    #[must_use]
    pub fn upgrade_cost(&self) -> ResourceMap {
        self.cost.scaled(growth(self.cost_growth, self.level))
    }
}

/// One ship type inside a fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipComponent {
    /// Display name.
    pub name: String,
    /// Number of ships of this type.
    pub count: u32,
    /// Construction cost of one ship.
    pub cost: ResourceMap,
    /// Travel speed.
    pub speed: f64,
    /// Cargo capacity of one ship.
    pub cargo: f64,
}

/// Mission flown by a fleet in transit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mission {
    /// Deliver cargo, then return home.
    Transport,
    /// Fly to an own planet and dock there.
    Return,
    /// Found a new planet on a free coordinate.
    Colonize,
    /// Fight the defenders of a foreign planet and loot it.
    Attack,
}

impl Mission {
    /// Uppercase tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "TRANSPORT",
            Self::Return => "RETURN",
            Self::Colonize => "COLONIZE",
            Self::Attack => "ATTACK",
        }
    }
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mission {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRANSPORT" => Ok(Self::Transport),
            "RETURN" => Ok(Self::Return),
            "COLONIZE" => Ok(Self::Colonize),
            "ATTACK" => Ok(Self::Attack),
            _ => Err(GameError::UnknownMission(s.to_string())),
        }
    }
}

/// Travel fields of a fleet in transit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Voyage {
    /// Where the current leg started.
    pub from: Location,
    /// Where the current leg ends.
    pub to: Location,
    /// Purpose of the leg.
    pub mission: Mission,
    /// Duration of the leg in seconds.
    pub travel_time_total: f64,
    /// Seconds until arrival; never above `travel_time_total`.
    pub travel_time_left: f64,
}

impl Voyage {
    /// Starts a leg with the full travel time left.
    #[must_use]
    pub fn new(from: Location, to: Location, mission: Mission, travel_time: f64) -> Self {
        Self {
            from,
            to,
            mission,
            travel_time_total: travel_time,
            travel_time_left: travel_time,
        }
    }
}

/// Where a fleet is.
///
/// Docked fleets have a location and no travel data; fleets in transit have
/// travel data and no location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FleetState {
    /// Parked at a planet.
    Docked {
        /// Planet the fleet sits at.
        location: Location,
    },
    /// Flying a mission.
    InTransit(Voyage),
}

/// Fleet-level data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetComponent {
    /// Owning player.
    pub owner: PlayerId,
    /// Docked or in transit.
    pub state: FleetState,
    /// Resources carried.
    pub cargo: ResourceMap,
}

impl FleetComponent {
    /// An empty-handed fleet docked at `location`.
    #[must_use]
    pub fn docked(owner: PlayerId, location: Location) -> Self {
        Self {
            owner,
            state: FleetState::Docked { location },
            cargo: ResourceMap::zero(),
        }
    }

    /// Returns `true` while a mission is being flown.
    #[must_use]
    pub const fn in_transit(&self) -> bool {
        matches!(self.state, FleetState::InTransit(_))
    }

    /// Docked location, if any.
    #[must_use]
    pub const fn current_location(&self) -> Option<Location> {
        match self.state {
            FleetState::Docked { location } => Some(location),
            FleetState::InTransit(_) => None,
        }
    }

    /// Travel data, if in transit.
    #[must_use]
    pub const fn voyage(&self) -> Option<&Voyage> {
        match &self.state {
            FleetState::InTransit(voyage) => Some(voyage),
            FleetState::Docked { .. } => None,
        }
    }

    /// Mutable travel data, if in transit.
    #[must_use]
    pub fn voyage_mut(&mut self) -> Option<&mut Voyage> {
        match &mut self.state {
            FleetState::InTransit(voyage) => Some(voyage),
            FleetState::Docked { .. } => None,
        }
    }
}

/// Energy grid summary of a planet, refreshed each production pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyBalance {
    /// Energy produced.
    pub produced: f64,
    /// Energy consumed.
    pub consumed: f64,
    /// Production throttle in `[0, 1]`.
    pub ratio: f64,
}

impl Default for EnergyBalance {
    fn default() -> Self {
        Self {
            produced: 0.0,
            consumed: 0.0,
            ratio: 1.0,
        }
    }
}

/// Planet-level data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetComponent {
    /// Display name.
    pub name: String,
    /// Planet size.
    pub size: u32,
    /// Coordinate.
    pub location: Location,
    /// Owning player, if any.
    pub owner: Option<PlayerId>,
    /// Stored resources, never negative.
    pub resources: ResourceMap,
    /// Storage ceiling computed by the last production pass.
    pub storage_capacity: ResourceMap,
    /// Per-second production computed by the last production pass.
    pub production_rate: ResourceMap,
    /// Energy grid computed by the last production pass.
    pub energy: EnergyBalance,
}

/// Player-level data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerComponent {
    /// Identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
}

// =============================================================================
// Per-kind bundles
// =============================================================================

/// Root of the entity tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateComponents {
    /// The world entity.
    pub world: EntityId,
    /// Player id -> player entity.
    pub players: BTreeMap<PlayerId, EntityId>,
}

/// The universe of planets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldComponents {
    /// Simulation speed multiplier.
    pub universe_speed: f64,
    /// Location -> planet entity.
    pub planets: BTreeMap<Location, EntityId>,
}

/// A player with its fleets and research.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerComponents {
    /// Identity.
    pub player: PlayerComponent,
    /// Fleet entities, oldest first.
    pub fleets: Vec<EntityId>,
    /// Research name -> research entity.
    pub research: BTreeMap<String, EntityId>,
}

/// A research line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchComponents {
    /// Level and cost curve.
    pub research: ResearchComponent,
    /// Prerequisites, if any.
    pub requirements: Option<RequirementsComponent>,
}

/// A planet with its building slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetComponents {
    /// Planet data.
    pub planet: PlanetComponent,
    /// Slot name -> building entity.
    pub buildings: BTreeMap<String, EntityId>,
}

/// A building; every component is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildingComponents {
    /// Identity, level and cost curve.
    pub building: Option<BuildingComponent>,
    /// Resource and energy production.
    pub producer: Option<ProducerComponent>,
    /// Storage capacity.
    pub storage: Option<StorageComponent>,
    /// Planetary defense.
    pub combat: Option<CombatComponent>,
    /// Upgrade prerequisites.
    pub requirements: Option<RequirementsComponent>,
}

impl BuildingComponents {
    /// Current level, 0 for buildings without a [`BuildingComponent`].
    #[must_use]
    pub fn level(&self) -> u32 {
        self.building.as_ref().map_or(0, |b| b.level)
    }
}

/// A fleet with one ship entity per ship kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetComponents {
    /// Fleet data.
    pub fleet: FleetComponent,
    /// Ship kind -> ship entity.
    pub ships: BTreeMap<String, EntityId>,
}

/// One ship type of a fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipComponents {
    /// Count, cost and movement.
    pub ship: ShipComponent,
    /// Combat statistics per ship.
    pub combat: CombatComponent,
    /// Construction prerequisites, if any.
    pub requirements: Option<RequirementsComponent>,
}

/// Optional components that can be attached after creation.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// See [`BuildingComponent`].
    Building(BuildingComponent),
    /// See [`ProducerComponent`].
    Producer(ProducerComponent),
    /// See [`StorageComponent`].
    Storage(StorageComponent),
    /// See [`CombatComponent`].
    Combat(CombatComponent),
    /// See [`RequirementsComponent`].
    Requirements(RequirementsComponent),
}

impl Component {
    /// Component kind name used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Building(_) => "building",
            Self::Producer(_) => "producer",
            Self::Storage(_) => "storage",
            Self::Combat(_) => "combat",
            Self::Requirements(_) => "requirements",
        }
    }
}

/// `factor^level`.
fn growth(factor: f64, level: u32) -> f64 {
    factor.powi(i32::try_from(level).unwrap_or(i32::MAX))
}
