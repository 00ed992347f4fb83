//! Fixed-period driver thread and the shared game handle.
//!
//! [`GameHandle`] wraps the simulation in an `Arc<RwLock<_>>`. Player actions
//! and ticks take the write lock for their whole duration, queries take the
//! read lock. [`GameLoop::spawn`] starts a named thread that ticks the
//! simulation every `period`, passing the measured wall time as `dt`. A tick
//! that overruns the period is logged and the next one starts immediately;
//! missed ticks are not caught up.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::entity::components::{Mission, PlayerId};
use crate::error::{ActionOutcome, GameError, Result};
use crate::event::EventRecord;
use crate::location::Location;
use crate::resources::ResourceMap;
use crate::simulation::Simulation;
use crate::view::{FleetView, GameSnapshot, PlanetView};

// =============================================================================
// GameHandle
// =============================================================================

/// Shared, lock-guarded access to a [`Simulation`].
#[derive(Debug, Clone)]
pub struct GameHandle {
    inner: Arc<RwLock<Simulation>>,
}

impl GameHandle {
    /// Wraps `sim` for sharing across threads.
    #[must_use]
    pub fn new(sim: Simulation) -> Self {
        Self {
            inner: Arc::new(RwLock::new(sim)),
        }
    }

    /// Read lock on the simulation.
    ///
    /// # Errors
    ///
    /// [`GameError::StatePoisoned`] if a writer panicked.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, Simulation>> {
        self.inner.read().map_err(|_| GameError::StatePoisoned)
    }

    /// Write lock on the simulation.
    ///
    /// # Errors
    ///
    /// [`GameError::StatePoisoned`] if a writer panicked.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Simulation>> {
        self.inner.write().map_err(|_| GameError::StatePoisoned)
    }

    /// See [`Simulation::tick`].
    ///
    /// # Errors
    ///
    /// [`GameError::StatePoisoned`], or the tick's own error.
    pub fn tick(&self, dt: f64) -> Result<()> {
        self.write()?.tick(dt)
    }

    /// See [`Simulation::create_player`].
    ///
    /// # Errors
    ///
    /// [`GameError::StatePoisoned`], or as the simulation method.
    pub fn create_player(&self, player: &PlayerId, name: &str) -> Result<ActionOutcome> {
        self.write()?.create_player(player, name)
    }

    /// See [`Simulation::upgrade_building`].
    ///
    /// # Errors
    ///
    /// [`GameError::StatePoisoned`], or as the simulation method.
    pub fn upgrade_building(
        &self,
        player: &PlayerId,
        location: &Location,
        building: &str,
    ) -> Result<ActionOutcome> {
        self.write()?.upgrade_building(player, location, building)
    }

    /// See [`Simulation::upgrade_research`].
    ///
    /// # Errors
    ///
    /// [`GameError::StatePoisoned`], or as the simulation method.
    pub fn upgrade_research(
        &self,
        player: &PlayerId,
        location: &Location,
        research: &str,
    ) -> Result<ActionOutcome> {
        self.write()?.upgrade_research(player, location, research)
    }

    /// See [`Simulation::build_ship`].
    ///
    /// # Errors
    ///
    /// [`GameError::StatePoisoned`], or as the simulation method.
    pub fn build_ship(&self, player: &PlayerId, location: &Location, kind: &str) -> Result<ActionOutcome> {
        self.write()?.build_ship(player, location, kind)
    }

    /// See [`Simulation::send_mission`].
    ///
    /// # Errors
    ///
    /// [`GameError::StatePoisoned`], or as the simulation method.
    pub fn send_mission(
        &self,
        player: &PlayerId,
        location: &Location,
        mission: Mission,
        destination: Location,
        cargo: ResourceMap,
    ) -> Result<ActionOutcome> {
        self.write()?
            .send_mission(player, location, mission, destination, cargo)
    }

    /// See [`Simulation::player_planets`].
    ///
    /// # Errors
    ///
    /// [`GameError::StatePoisoned`], or as the simulation method.
    pub fn player_planets(&self, player: &PlayerId) -> Result<BTreeMap<Location, PlanetView>> {
        self.read()?.player_planets(player)
    }

    /// See [`Simulation::player_fleets`].
    ///
    /// # Errors
    ///
    /// [`GameError::StatePoisoned`], or as the simulation method.
    pub fn player_fleets(&self, player: &PlayerId) -> Result<Vec<FleetView>> {
        self.read()?.player_fleets(player)
    }

    /// See [`Simulation::snapshot`].
    ///
    /// # Errors
    ///
    /// [`GameError::StatePoisoned`].
    pub fn snapshot(&self) -> Result<GameSnapshot> {
        self.read()?.snapshot()
    }

    /// See [`Simulation::take_events`].
    ///
    /// # Errors
    ///
    /// [`GameError::StatePoisoned`].
    pub fn take_events(&self) -> Result<Vec<EventRecord>> {
        Ok(self.write()?.take_events())
    }
}

// =============================================================================
// GameLoop
// =============================================================================

/// Commands sent to the loop thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopControl {
    Shutdown,
}

/// Starts loop threads.
#[derive(Debug)]
pub struct GameLoop;

impl GameLoop {
    /// Spawns the `game-loop` thread ticking `handle` every `period`.
    ///
    /// # Errors
    ///
    /// If the OS refuses to create the thread.
    pub fn spawn(handle: GameHandle, period: Duration) -> std::io::Result<GameLoopHandle> {
        let (control_tx, control_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("game-loop".to_string())
            .spawn(move || run(&handle, period, &control_rx))?;
        Ok(GameLoopHandle {
            control_tx,
            thread: Some(thread),
        })
    }
}

/// Owner of a running loop thread; stops it when dropped.
#[derive(Debug)]
pub struct GameLoopHandle {
    control_tx: Sender<LoopControl>,
    thread: Option<JoinHandle<()>>,
}

impl GameLoopHandle {
    /// Returns `true` while the loop thread is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the loop and waits for the thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // The thread may already be gone after a poisoned lock.
        let _ = self.control_tx.send(LoopControl::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("game loop thread panicked");
            }
        }
    }
}

impl Drop for GameLoopHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(handle: &GameHandle, period: Duration, control_rx: &Receiver<LoopControl>) {
    debug!(?period, "game loop started");
    let mut last = Instant::now();
    loop {
        let wait = period.saturating_sub(last.elapsed());
        match control_rx.recv_timeout(wait) {
            Ok(LoopControl::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        match handle.tick(dt) {
            Ok(()) => {}
            Err(GameError::StatePoisoned) => {
                error!("game state poisoned, stopping loop");
                return;
            }
            Err(err) => {
                error!(error = %err, "tick failed, stopping loop");
                return;
            }
        }

        let spent = now.elapsed();
        if spent > period {
            warn!(?spent, ?period, "tick overran its period");
        }
    }
    debug!("game loop stopped");
}
