//! Simulation configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```
//! use orbital_core::config::{OverflowPolicy, SimConfig};
//!
//! let config = SimConfig::from_json_str(r#"{ "seed": 7, "overflow_policy": "reject" }"#).unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.overflow_policy, OverflowPolicy::Reject);
//! assert_eq!(config.universe_speed, 1.0);
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{GameError, Result};
use crate::location::UniverseBounds;
use crate::resources::{Resource, ResourceMap};

/// What happens to production that does not fit into storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Fill up to the cap and drop the rest silently.
    #[default]
    Discard,
    /// Fill up to the cap and record the dropped amount as an event.
    DiscardAndLog,
    /// Accrue nothing for a resource whose production exceeds the free space.
    Reject,
}

/// Combat resolver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Defensive buildings contribute `hp × level` to the defender's damage
    /// instead of `damage × level`.
    pub building_damage_uses_hp: bool,
    /// Rounds after which the fight stops without a winner.
    pub max_rounds: u32,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            building_damage_uses_hp: true,
            max_rounds: 500,
        }
    }
}

/// Top-level simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for combat randomness and coordinate allocation.
    pub seed: u64,
    /// Multiplier on production and travel.
    pub universe_speed: f64,
    /// Wall-clock period of the game loop.
    pub tick_period_ms: u64,
    /// Coordinate space new planets are allocated in.
    pub bounds: UniverseBounds,
    /// Balance of a new player's home planet.
    pub starting_resources: ResourceMap,
    /// Handling of production beyond storage.
    pub overflow_policy: OverflowPolicy,
    /// Combat settings.
    pub combat: CombatRules,
    /// Building, ship and research definitions.
    pub catalog: Catalog,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            universe_speed: 1.0,
            tick_period_ms: 1_000,
            bounds: UniverseBounds::default(),
            starting_resources: ResourceMap::from_pairs(&[
                (Resource::Metal, 500.0),
                (Resource::Crystal, 500.0),
                (Resource::Deuterium, 0.0),
            ]),
            overflow_policy: OverflowPolicy::default(),
            combat: CombatRules::default(),
            catalog: Catalog::default(),
        }
    }
}

impl SimConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// [`GameError::Config`] if the document is not valid.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| GameError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// [`GameError::Config`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| GameError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&contents)
    }

    /// Game loop period.
    #[must_use]
    pub const fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Checks values a game cannot run with.
    ///
    /// # Errors
    ///
    /// [`GameError::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.universe_speed.is_finite() && self.universe_speed > 0.0) {
            return Err(GameError::Config(format!(
                "universe_speed must be positive, got {}",
                self.universe_speed
            )));
        }
        if self.bounds.capacity() == 0 {
            return Err(GameError::Config("bounds must not be empty".to_string()));
        }
        if self.tick_period_ms == 0 {
            return Err(GameError::Config("tick_period_ms must be positive".to_string()));
        }
        Ok(())
    }
}
