//! Error types for the simulation engine.
//!
//! Two families of failure exist:
//!
//! - [`GameError`]: precondition violations caused by the caller (unknown
//!   player, unknown location, duplicate component). These abort the
//!   operation and are returned as `Err`.
//! - [`Refusal`]: ordinary game-rule outcomes that players trigger routinely
//!   (not enough resources, mission already running). These are reported
//!   through [`ActionOutcome`] and never abort anything.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{EntityId, EntityTag};
use crate::location::Location;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Usage errors: the caller asked for something that cannot exist.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// No player is registered under this id.
    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    /// No planet exists at this location.
    #[error("no planet at location {0}")]
    UnknownLocation(Location),

    /// The planet exists but belongs to someone else.
    #[error("player {player} does not own the planet at {location}")]
    NotPlanetOwner {
        /// Player that issued the action.
        player: String,
        /// Planet the action targeted.
        location: Location,
    },

    /// The building slot name is not part of the catalog.
    #[error("unknown building: {0}")]
    UnknownBuilding(String),

    /// The research name is not part of the catalog.
    #[error("unknown research: {0}")]
    UnknownResearch(String),

    /// The ship kind is not part of the catalog.
    #[error("unknown ship kind: {0}")]
    UnknownShipKind(String),

    /// A mission tag could not be parsed.
    #[error("unknown mission: {0}")]
    UnknownMission(String),

    /// A location string could not be parsed.
    #[error("malformed location: {0}")]
    MalformedLocation(String),

    /// The arena holds no entity with this id.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The entity exists but is of another kind than requested.
    #[error("entity {id} is a {actual}, expected a {expected}")]
    EntityKindMismatch {
        /// Entity that was looked up.
        id: EntityId,
        /// Kind the caller expected.
        expected: EntityTag,
        /// Kind actually stored.
        actual: EntityTag,
    },

    /// A component of this kind is already attached to the entity.
    #[error("entity {id} already has a {kind} component")]
    DuplicateComponent {
        /// Entity receiving the component.
        id: EntityId,
        /// Component kind name.
        kind: &'static str,
    },

    /// The component kind cannot be attached to this entity kind.
    #[error("a {kind} component cannot be attached to a {tag}")]
    ComponentNotSupported {
        /// Component kind name.
        kind: &'static str,
        /// Entity kind.
        tag: EntityTag,
    },

    /// Registration at a coordinate that already holds a planet.
    #[error("location {0} is already occupied")]
    LocationOccupied(Location),

    /// The root game state is missing from the arena's special slot.
    #[error("game state root is not registered")]
    MissingRoot,

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A thread panicked while holding the game state lock.
    #[error("game state lock poisoned")]
    StatePoisoned,
}

/// Game-rule refusals reported back to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refusal {
    /// The planet balance does not cover the cost.
    #[error("insufficient resources")]
    InsufficientResources,
    /// A required building or research level is missing.
    #[error("requirements not met")]
    RequirementsNotMet,
    /// Ships cannot be built without a shipyard.
    #[error("a shipyard is required")]
    ShipyardRequired,
    /// The player id is already taken.
    #[error("player already exists")]
    PlayerExists,
    /// The universe has no free coordinate left.
    #[error("no free location")]
    NoFreeLocation,
    /// The player has no docked fleet at the origin planet.
    #[error("no fleet at origin")]
    NoFleetAtOrigin,
    /// The fleet already flies a mission.
    #[error("fleet is already in transit")]
    FleetInTransit,
    /// Every ship count of the fleet is zero.
    #[error("fleet has no ships")]
    NoShips,
    /// The requested cargo exceeds the fleet's free capacity.
    #[error("insufficient cargo capacity")]
    InsufficientCargoCapacity,
    /// No planet exists at the destination.
    #[error("unknown destination")]
    UnknownDestination,
    /// The destination belongs to the attacking player.
    #[error("cannot attack own planet")]
    CannotAttackOwnPlanet,
    /// Fleets may only return to planets their owner holds.
    #[error("destination not owned")]
    DestinationNotOwned,
    /// The colonization target already holds a planet.
    #[error("location occupied")]
    LocationOccupied,
    /// Colonization needs at least one colony ship.
    #[error("no colony ship in fleet")]
    NoColonyShip,
}

/// Outcome of a player action, shaped for the request layer.
///
/// Serializes as `{"success": true}` or
/// `{"success": false, "reason": "insufficient_resources"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Whether the action was applied.
    pub success: bool,
    /// Why the action was refused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Refusal>,
}

impl ActionOutcome {
    /// A successful outcome.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            reason: None,
        }
    }

    /// A refused outcome carrying its reason.
    #[must_use]
    pub const fn refused(reason: Refusal) -> Self {
        Self {
            success: false,
            reason: Some(reason),
        }
    }
}

impl From<std::result::Result<(), Refusal>> for ActionOutcome {
    fn from(result: std::result::Result<(), Refusal>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(reason) => Self::refused(reason),
        }
    }
}
