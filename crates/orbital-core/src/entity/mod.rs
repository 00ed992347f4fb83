//! Entity types for the game state tree.
//!
//! - [`EntityId`]: unique identifier, assigned monotonically by the arena
//! - [`EntityTag`]: kind of an entity
//! - [`EntityInner`]: tagged variant holding the kind's component bundle
//! - [`Entity`]: id, optional parent link and inner storage
//!
//! Entities form a tree rooted at the game state. Children are referenced by
//! id from the parent's bundle; the child keeps a non-owning `parent` id.
//!
//! # Example
//!
//! ```
//! use orbital_core::entity::{Entity, EntityId, EntityInner, EntityTag};
//! use orbital_core::entity::components::BuildingComponents;
//!
//! let building = Entity::new(
//!     EntityId::new(7),
//!     Some(EntityId::new(3)),
//!     EntityInner::Building(BuildingComponents::default()),
//! );
//!
//! assert_eq!(building.tag(), EntityTag::Building);
//! assert_eq!(building.parent(), Some(EntityId::new(3)));
//! ```

pub mod components;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use components::{
    BuildingComponents, Component, FleetComponents, GameStateComponents, PlanetComponents,
    PlayerComponents, ResearchComponents, ShipComponents, WorldComponents,
};

use crate::error::{GameError, Result};

/// Unique identifier for an entity.
///
/// Ordered by numeric value; arena iteration follows this order.
///
/// ```
/// use orbital_core::entity::EntityId;
///
/// assert!(EntityId::new(1) < EntityId::new(2));
/// assert_eq!(EntityId::new(1).as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Entity kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// Root of the tree.
    GameState,
    /// Holder of all planets.
    World,
    /// A registered player.
    Player,
    /// One research line of a player.
    Research,
    /// A planet at a coordinate.
    Planet,
    /// One building slot of a planet.
    Building,
    /// A group of ships.
    Fleet,
    /// One ship type inside a fleet.
    Ship,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GameState => "GameState",
            Self::World => "World",
            Self::Player => "Player",
            Self::Research => "Research",
            Self::Planet => "Planet",
            Self::Building => "Building",
            Self::Fleet => "Fleet",
            Self::Ship => "Ship",
        };
        f.write_str(name)
    }
}

/// Component storage, one variant per entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityInner {
    /// See [`GameStateComponents`].
    GameState(GameStateComponents),
    /// See [`WorldComponents`].
    World(WorldComponents),
    /// See [`PlayerComponents`].
    Player(PlayerComponents),
    /// See [`ResearchComponents`].
    Research(ResearchComponents),
    /// See [`PlanetComponents`].
    Planet(PlanetComponents),
    /// See [`BuildingComponents`].
    Building(BuildingComponents),
    /// See [`FleetComponents`].
    Fleet(FleetComponents),
    /// See [`ShipComponents`].
    Ship(ShipComponents),
}

/// Generates `as_x` / `as_x_mut` accessors for one variant.
macro_rules! inner_accessors {
    ($variant:ident, $ty:ty, $get:ident, $get_mut:ident) => {
        #[doc = concat!("Returns the ", stringify!($variant), " bundle, if this is one.")]
        #[must_use]
        pub const fn $get(&self) -> Option<&$ty> {
            match self {
                Self::$variant(components) => Some(components),
                _ => None,
            }
        }

        #[doc = concat!("Returns the mutable ", stringify!($variant), " bundle, if this is one.")]
        #[must_use]
        pub fn $get_mut(&mut self) -> Option<&mut $ty> {
            match self {
                Self::$variant(components) => Some(components),
                _ => None,
            }
        }
    };
}

impl EntityInner {
    /// Tag matching this variant.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        match self {
            Self::GameState(_) => EntityTag::GameState,
            Self::World(_) => EntityTag::World,
            Self::Player(_) => EntityTag::Player,
            Self::Research(_) => EntityTag::Research,
            Self::Planet(_) => EntityTag::Planet,
            Self::Building(_) => EntityTag::Building,
            Self::Fleet(_) => EntityTag::Fleet,
            Self::Ship(_) => EntityTag::Ship,
        }
    }

    /// Ids of the entities this one owns, in container order.
    #[must_use]
    pub fn children(&self) -> Vec<EntityId> {
        match self {
            Self::GameState(c) => std::iter::once(c.world)
                .chain(c.players.values().copied())
                .collect(),
            Self::World(c) => c.planets.values().copied().collect(),
            Self::Player(c) => c
                .fleets
                .iter()
                .copied()
                .chain(c.research.values().copied())
                .collect(),
            Self::Planet(c) => c.buildings.values().copied().collect(),
            Self::Fleet(c) => c.ships.values().copied().collect(),
            Self::Research(_) | Self::Building(_) | Self::Ship(_) => Vec::new(),
        }
    }

    inner_accessors!(GameState, GameStateComponents, as_game_state, as_game_state_mut);
    inner_accessors!(World, WorldComponents, as_world, as_world_mut);
    inner_accessors!(Player, PlayerComponents, as_player, as_player_mut);
    inner_accessors!(Research, ResearchComponents, as_research, as_research_mut);
    inner_accessors!(Planet, PlanetComponents, as_planet, as_planet_mut);
    inner_accessors!(Building, BuildingComponents, as_building, as_building_mut);
    inner_accessors!(Fleet, FleetComponents, as_fleet, as_fleet_mut);
    inner_accessors!(Ship, ShipComponents, as_ship, as_ship_mut);
}

/// A node of the game state tree.
///
/// # Invariants
///
/// - The id is unique within an arena.
/// - `parent`, when set, names the entity whose bundle lists this id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    parent: Option<EntityId>,
    inner: EntityInner,
}

impl Entity {
    /// Creates an entity.
    #[must_use]
    pub const fn new(id: EntityId, parent: Option<EntityId>, inner: EntityInner) -> Self {
        Self { id, parent, inner }
    }

    /// Returns the id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the kind, derived from the inner variant.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.inner.tag()
    }

    /// Returns the parent link.
    #[must_use]
    pub const fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Returns the component storage.
    #[must_use]
    pub const fn inner(&self) -> &EntityInner {
        &self.inner
    }

    /// Returns the mutable component storage.
    #[must_use]
    pub fn inner_mut(&mut self) -> &mut EntityInner {
        &mut self.inner
    }

    /// Attaches an optional component.
    ///
    /// # Errors
    ///
    /// [`GameError::DuplicateComponent`] if a component of that kind is
    /// already attached, [`GameError::ComponentNotSupported`] if the entity
    /// kind has no slot for it.
    pub fn add_component(&mut self, component: Component) -> Result<()> {
        let id = self.id;
        let kind = component.kind_name();
        let tag = self.tag();

        fn fill<T>(slot: &mut Option<T>, value: T, id: EntityId, kind: &'static str) -> Result<()> {
            if slot.is_some() {
                return Err(GameError::DuplicateComponent { id, kind });
            }
            *slot = Some(value);
            Ok(())
        }

        match (&mut self.inner, component) {
            (EntityInner::Building(b), Component::Building(c)) => fill(&mut b.building, c, id, kind),
            (EntityInner::Building(b), Component::Producer(c)) => fill(&mut b.producer, c, id, kind),
            (EntityInner::Building(b), Component::Storage(c)) => fill(&mut b.storage, c, id, kind),
            (EntityInner::Building(b), Component::Combat(c)) => fill(&mut b.combat, c, id, kind),
            (EntityInner::Building(b), Component::Requirements(c)) => {
                fill(&mut b.requirements, c, id, kind)
            }
            (EntityInner::Research(r), Component::Requirements(c)) => {
                fill(&mut r.requirements, c, id, kind)
            }
            (EntityInner::Ship(s), Component::Requirements(c)) => {
                fill(&mut s.requirements, c, id, kind)
            }
            _ => Err(GameError::ComponentNotSupported { kind, tag }),
        }
    }
}
