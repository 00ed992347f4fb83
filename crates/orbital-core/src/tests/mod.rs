//! Scenario tests driving whole games through the public API.
//!
//! - `determinism.rs`: same seed and inputs give identical games
//! - `integration.rs`: production, upgrades, missions and combat end to end
//! - `helpers.rs`: setup and query shortcuts

mod helpers;
mod integration;
