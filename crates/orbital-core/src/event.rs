//! Record of what happened during ticks and player actions.
//!
//! Systems push [`GameEvent`]s into the simulation's [`EventLog`]; the caller
//! drains it with `take_events()`. Events never feed back into game state.

use serde::{Deserialize, Serialize};

use crate::entity::components::{Mission, PlayerId};
use crate::entity::EntityId;
use crate::location::Location;
use crate::resources::{Resource, ResourceMap};

/// Something observable that changed the game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    /// A player registered and received a home planet.
    PlayerCreated {
        /// New player.
        player: PlayerId,
        /// Home planet.
        home: Location,
    },
    /// A building went up one level.
    BuildingUpgraded {
        /// Planet of the building.
        location: Location,
        /// Building slot.
        building: String,
        /// Level after the upgrade.
        level: u32,
    },
    /// A research line went up one level.
    ResearchUpgraded {
        /// Researching player.
        player: PlayerId,
        /// Research name.
        research: String,
        /// Level after the upgrade.
        level: u32,
    },
    /// One ship was added to a docked fleet.
    ShipBuilt {
        /// Receiving fleet.
        fleet: EntityId,
        /// Planet of the shipyard.
        location: Location,
        /// Ship kind.
        ship_kind: String,
    },
    /// A fleet left on a mission.
    MissionStarted {
        /// Departing fleet.
        fleet: EntityId,
        /// Mission flown.
        mission: Mission,
        /// Origin.
        from: Location,
        /// Destination.
        to: Location,
        /// Seconds until arrival.
        travel_time: f64,
    },
    /// A fleet reached the end of a leg.
    FleetArrived {
        /// Arriving fleet.
        fleet: EntityId,
        /// Mission that ended.
        mission: Mission,
        /// Arrival coordinate.
        location: Location,
    },
    /// A fleet founded a planet.
    PlanetColonized {
        /// New owner.
        player: PlayerId,
        /// Coordinate of the new planet.
        location: Location,
    },
    /// A colonization target was taken before the fleet arrived.
    ColonizationAborted {
        /// Fleet heading home.
        fleet: EntityId,
        /// Lost coordinate.
        location: Location,
    },
    /// An attack was fought out.
    CombatResolved {
        /// Attacking fleet.
        fleet: EntityId,
        /// Attacked planet.
        location: Location,
        /// Whether the attacker won.
        attacker_victory: bool,
        /// Rounds fought.
        rounds: u32,
        /// Resources taken from the planet.
        loot: ResourceMap,
    },
    /// Docked fleets at one location were combined.
    FleetsMerged {
        /// Owner.
        player: PlayerId,
        /// Shared location.
        location: Location,
        /// Surviving fleet.
        into: EntityId,
        /// Fleets emptied into it.
        merged: Vec<EntityId>,
    },
    /// A fleet without ships was removed.
    FleetRemoved {
        /// Owner.
        player: PlayerId,
        /// Removed fleet.
        fleet: EntityId,
    },
    /// Production was dropped because storage was full.
    ProductionOverflow {
        /// Planet.
        location: Location,
        /// Resource kind.
        resource: Resource,
        /// Amount dropped.
        discarded: f64,
    },
}

/// A [`GameEvent`] stamped with the tick it happened in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Tick counter at the time of the event; actions between ticks carry
    /// the number of the last completed tick.
    pub tick: u64,
    /// What happened.
    #[serde(flatten)]
    pub event: GameEvent,
}

/// Append-only event buffer.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn push(&mut self, tick: u64, event: GameEvent) {
        self.records.push(EventRecord { tick, event });
    }

    /// Drains and returns every recorded event, oldest first.
    pub fn take_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.records)
    }

    /// Recorded events, oldest first.
    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Number of recorded events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
