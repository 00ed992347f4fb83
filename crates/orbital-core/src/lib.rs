//! # Orbital Core
//!
//! Real-time space economy simulation: planets produce and store resources,
//! players upgrade buildings and research, build ships and send fleets on
//! transport, colonization and attack missions.
//!
//! ## Architecture
//!
//! - **Entities**: game state, world, players, research, planets, buildings,
//!   fleets and ships, held in an [`arena::Arena`] and linked by id
//! - **Systems**: production, missions (with combat) and fleet maintenance,
//!   run once per tick in that order
//! - **Actions**: upgrades, ship building and mission orders, applied between
//!   ticks and answered with an [`error::ActionOutcome`]
//!
//! ## Usage
//!
//! ```
//! use orbital_core::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default())?;
//! let player = PlayerId::new("alice");
//! sim.create_player(&player, "Alice")?;
//!
//! let home = *sim.player_planets(&player)?.keys().next().unwrap();
//! let outcome = sim.upgrade_building(&player, &home, "metal_mine")?;
//! assert!(outcome.success);
//!
//! sim.tick(1.0)?;
//! # Ok::<(), orbital_core::error::GameError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod game_loop;
pub mod location;
pub mod resources;
pub mod simulation;
pub mod systems;
pub mod view;

#[cfg(test)]
mod tests;

/// Commonly used types.
pub mod prelude {
    pub use crate::config::SimConfig;
    pub use crate::entity::components::{Mission, PlayerId};
    pub use crate::error::{ActionOutcome, GameError, Refusal};
    pub use crate::event::{EventRecord, GameEvent};
    pub use crate::game_loop::{GameHandle, GameLoop, GameLoopHandle};
    pub use crate::location::Location;
    pub use crate::resources::{Resource, ResourceMap};
    pub use crate::simulation::Simulation;
    pub use crate::view::{FleetView, GameSnapshot, PlanetView};
}
