//! Simulation engine for stardrift.
//!
//! Owns the space (a hecs world with frames and proximity queries), runs
//! systems at a fixed tick, persists to JSON and draws missiles through the
//! renderer contract.

pub mod damage;
pub mod dynamics;
pub mod engine;
pub mod events;
pub mod missile;
pub mod propulsion;
pub mod render;
pub mod save;
pub mod scenario;
pub mod space;
pub mod systems;

pub use engine::{SimConfig, SimulationEngine};
pub use missile::Missile;
pub use space::Space;
pub use stardrift_core as core;

#[cfg(test)]
mod tests;
