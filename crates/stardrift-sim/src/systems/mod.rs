//! Per-tick systems over the space.
//!
//! Systems are free functions over `&mut Space` (or `&Space` when read-only).
//! They own no state; everything lives in components.

pub mod autopilot;
pub mod cleanup;
pub mod ecm;
pub mod missile_flight;
pub mod movement;
pub mod snapshot;

use hecs::Entity;

use stardrift_core::components::Dead;

use crate::missile::Missile;
use crate::space::Space;

/// Live missiles in a stable order, collected so systems can mutate the
/// space while visiting them.
pub(crate) fn live_missiles(space: &Space) -> Vec<Entity> {
    let mut missiles: Vec<Entity> = space
        .world
        .query::<&Missile>()
        .without::<&Dead>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();
    missiles.sort_by_key(|e| e.to_bits());
    missiles
}
