//! State shared between the main thread and the game loop thread.

use std::sync::{Arc, Mutex};

use stardrift_core::commands::SimCommand;
use stardrift_core::state::SpaceSnapshot;

/// Commands sent from the main thread to the game loop thread.
#[derive(Debug)]
pub enum LoopCommand {
    /// Forward to the simulation engine.
    Sim(SimCommand),
    /// Stop after the current tick.
    Shutdown,
}

/// Latest snapshot, written by the game loop after every tick.
pub type SharedSnapshot = Arc<Mutex<Option<SpaceSnapshot>>>;

pub fn shared_snapshot() -> SharedSnapshot {
    Arc::new(Mutex::new(None))
}
