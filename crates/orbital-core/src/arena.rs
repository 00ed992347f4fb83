//! Entity storage for the game state tree.
//!
//! The arena owns every entity in a `BTreeMap` keyed by [`EntityId`], so
//! iteration order is the id order and independent of insertion history. Ids
//! are assigned monotonically and never reused.
//!
//! Parent links are stored as ids on the child. Containers on the parent
//! (building slots, fleet lists, ...) are maintained by the caller; the arena
//! only tracks the upward link and removes whole subtrees on request.
//!
//! # Example
//!
//! ```
//! use orbital_core::arena::Arena;
//! use orbital_core::entity::{EntityInner, BuildingComponents};
//!
//! let mut arena = Arena::new();
//! let a = arena.spawn(EntityInner::Building(BuildingComponents::default()), None);
//! let b = arena.spawn(EntityInner::Building(BuildingComponents::default()), Some(a));
//!
//! assert_eq!(arena.parent(b), Some(a));
//! assert_eq!(arena.entity_ids_sorted().collect::<Vec<_>>(), vec![a, b]);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{
    BuildingComponents, Component, Entity, EntityId, EntityInner, EntityTag, FleetComponents,
    GameStateComponents, PlanetComponents, PlayerComponents, ResearchComponents, ShipComponents,
    WorldComponents,
};
use crate::error::{GameError, Result};

// =============================================================================
// Special slots
// =============================================================================

/// Fixed keys for singleton lookups.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpecialSlot {
    /// The root game state entity.
    GameState,
}

// =============================================================================
// Arena
// =============================================================================

/// Container of all entities of one simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    /// Next id to hand out.
    next_id: u64,
    /// Entity storage in id order.
    entities: BTreeMap<EntityId, Entity>,
    /// Singleton lookups.
    specials: BTreeMap<SpecialSlot, EntityId>,
}

/// Generates typed `Result` accessors for one entity kind.
macro_rules! typed_accessors {
    ($tag:ident, $ty:ty, $get:ident, $get_mut:ident, $as:ident, $as_mut:ident) => {
        #[doc = concat!("Returns the ", stringify!($tag), " bundle of `id`.")]
        ///
        /// # Errors
        ///
        /// [`GameError::EntityNotFound`] or [`GameError::EntityKindMismatch`].
        pub fn $get(&self, id: EntityId) -> Result<&$ty> {
            let entity = self.entity(id)?;
            entity.inner().$as().ok_or(GameError::EntityKindMismatch {
                id,
                expected: EntityTag::$tag,
                actual: entity.tag(),
            })
        }

        #[doc = concat!("Returns the mutable ", stringify!($tag), " bundle of `id`.")]
        ///
        /// # Errors
        ///
        /// [`GameError::EntityNotFound`] or [`GameError::EntityKindMismatch`].
        pub fn $get_mut(&mut self, id: EntityId) -> Result<&mut $ty> {
            let entity = self.entity_mut(id)?;
            let actual = entity.tag();
            entity
                .inner_mut()
                .$as_mut()
                .ok_or(GameError::EntityKindMismatch {
                    id,
                    expected: EntityTag::$tag,
                    actual,
                })
        }
    };
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new entity and returns its id.
    pub fn spawn(&mut self, inner: EntityInner, parent: Option<EntityId>) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entity::new(id, parent, inner));
        id
    }

    /// Removes a single entity. Its children are left in place.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Removes an entity and everything it owns, returning the number of
    /// entities removed.
    ///
    /// The caller detaches `id` from its parent's container.
    pub fn despawn_tree(&mut self, id: EntityId) -> usize {
        let mut stack = vec![id];
        let mut removed = 0;
        while let Some(next) = stack.pop() {
            if let Some(entity) = self.entities.remove(&next) {
                stack.extend(entity.inner().children());
                removed += 1;
            }
        }
        removed
    }

    /// Returns an entity by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable entity by id.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns an entity by id.
    ///
    /// # Errors
    ///
    /// [`GameError::EntityNotFound`] if no entity has this id.
    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(&id).ok_or(GameError::EntityNotFound(id))
    }

    /// Returns a mutable entity by id.
    ///
    /// # Errors
    ///
    /// [`GameError::EntityNotFound`] if no entity has this id.
    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(&id)
            .ok_or(GameError::EntityNotFound(id))
    }

    /// Returns `true` if an entity with this id is registered.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Parent link of `id`, if both exist.
    #[must_use]
    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.entities.get(&id).and_then(Entity::parent)
    }

    /// Ids owned by `id`, empty if the entity is unknown.
    #[must_use]
    pub fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.entities
            .get(&id)
            .map(|e| e.inner().children())
            .unwrap_or_default()
    }

    /// Attaches an optional component to an entity.
    ///
    /// # Errors
    ///
    /// [`GameError::EntityNotFound`], or whatever
    /// [`Entity::add_component`] reports.
    pub fn add_component(&mut self, id: EntityId, component: Component) -> Result<()> {
        self.entity_mut(id)?.add_component(component)
    }

    /// Binds a special slot to an entity.
    pub fn set_special(&mut self, slot: SpecialSlot, id: EntityId) {
        self.specials.insert(slot, id);
    }

    /// Entity bound to a special slot.
    #[must_use]
    pub fn special(&self, slot: SpecialSlot) -> Option<EntityId> {
        self.specials.get(&slot).copied()
    }

    /// The game state root.
    ///
    /// # Errors
    ///
    /// [`GameError::MissingRoot`] before the root has been registered.
    pub fn root(&self) -> Result<EntityId> {
        self.special(SpecialSlot::GameState)
            .ok_or(GameError::MissingRoot)
    }

    /// Entity ids in ascending order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Entities in ascending id order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Ids of every entity of the given kind, ascending.
    #[must_use]
    pub fn ids_with_tag(&self, tag: EntityTag) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.tag() == tag)
            .map(Entity::id)
            .collect()
    }

    /// Number of registered entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    typed_accessors!(GameState, GameStateComponents, game_state, game_state_mut, as_game_state, as_game_state_mut);
    typed_accessors!(World, WorldComponents, world, world_mut, as_world, as_world_mut);
    typed_accessors!(Player, PlayerComponents, player, player_mut, as_player, as_player_mut);
    typed_accessors!(Research, ResearchComponents, research, research_mut, as_research, as_research_mut);
    typed_accessors!(Planet, PlanetComponents, planet, planet_mut, as_planet, as_planet_mut);
    typed_accessors!(Building, BuildingComponents, building, building_mut, as_building, as_building_mut);
    typed_accessors!(Fleet, FleetComponents, fleet, fleet_mut, as_fleet, as_fleet_mut);
    typed_accessors!(Ship, ShipComponents, ship, ship_mut, as_ship, as_ship_mut);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::components::{PlanetComponent, PlayerId, ProducerComponent};
    use crate::location::Location;
    use crate::resources::ResourceMap;
    use std::collections::BTreeMap as Map;

    fn building() -> EntityInner {
        EntityInner::Building(BuildingComponents::default())
    }

    fn planet_with(arena: &mut Arena, slots: usize) -> EntityId {
        let planet = arena.spawn(
            EntityInner::Planet(PlanetComponents {
                planet: PlanetComponent {
                    name: "Test".to_string(),
                    size: 100,
                    location: Location::new(1, 1, 1),
                    owner: Some(PlayerId::from("max")),
                    resources: ResourceMap::zero(),
                    storage_capacity: ResourceMap::zero(),
                    production_rate: ResourceMap::zero(),
                    energy: Default::default(),
                },
                buildings: Map::new(),
            }),
            None,
        );
        for i in 0..slots {
            let b = arena.spawn(building(), Some(planet));
            arena
                .planet_mut(planet)
                .unwrap()
                .buildings
                .insert(format!("slot{i}"), b);
        }
        planet
    }

    mod arena_tests {
        use super::*;

        #[test]
        fn spawn_assigns_sequential_ids() {
            let mut arena = Arena::new();
            let a = arena.spawn(building(), None);
            let b = arena.spawn(building(), None);
            assert_eq!(a, EntityId::new(0));
            assert_eq!(b, EntityId::new(1));
            assert_eq!(arena.entity_count(), 2);
        }

        #[test]
        fn ids_are_not_reused_after_despawn() {
            let mut arena = Arena::new();
            let a = arena.spawn(building(), None);
            arena.despawn(a);
            let b = arena.spawn(building(), None);
            assert_ne!(a, b);
            assert!(arena.get(a).is_none());
        }

        #[test]
        fn parent_links_are_recorded() {
            let mut arena = Arena::new();
            let planet = planet_with(&mut arena, 2);
            let children = arena.children(planet);
            assert_eq!(children.len(), 2);
            assert!(children.iter().all(|c| arena.parent(*c) == Some(planet)));
            assert_eq!(arena.parent(planet), None);
        }

        #[test]
        fn despawn_tree_removes_descendants() {
            let mut arena = Arena::new();
            let planet = planet_with(&mut arena, 3);
            let other = arena.spawn(building(), None);

            assert_eq!(arena.despawn_tree(planet), 4);
            assert_eq!(arena.entity_ids_sorted().collect::<Vec<_>>(), vec![other]);
        }

        #[test]
        fn typed_accessor_reports_kind_mismatch() {
            let mut arena = Arena::new();
            let id = arena.spawn(building(), None);
            assert_eq!(
                arena.planet(id).unwrap_err(),
                GameError::EntityKindMismatch {
                    id,
                    expected: EntityTag::Planet,
                    actual: EntityTag::Building,
                }
            );
            assert_eq!(
                arena.fleet(EntityId::new(99)).unwrap_err(),
                GameError::EntityNotFound(EntityId::new(99))
            );
        }

        #[test]
        fn add_component_goes_through_entity() {
            let mut arena = Arena::new();
            let id = arena.spawn(building(), None);
            arena
                .add_component(id, Component::Producer(ProducerComponent::default()))
                .unwrap();
            assert!(matches!(
                arena.add_component(id, Component::Producer(ProducerComponent::default())),
                Err(GameError::DuplicateComponent { .. })
            ));
        }

        #[test]
        fn root_requires_special_slot() {
            let mut arena = Arena::new();
            assert_eq!(arena.root(), Err(GameError::MissingRoot));
            let id = arena.spawn(building(), None);
            arena.set_special(SpecialSlot::GameState, id);
            assert_eq!(arena.root(), Ok(id));
        }

        #[test]
        fn ids_with_tag_filters_in_order() {
            let mut arena = Arena::new();
            let planet = planet_with(&mut arena, 2);
            assert_eq!(arena.ids_with_tag(EntityTag::Planet), vec![planet]);
            assert_eq!(arena.ids_with_tag(EntityTag::Building).len(), 2);
        }
    }
}
