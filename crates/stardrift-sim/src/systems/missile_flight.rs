//! Missile flight system: integration, owner check and proximity fuse.
//!
//! A missile detonated earlier in the pass is skipped; its blast may also
//! have taken out missiles later in the list.

use crate::events::EventQueue;
use crate::missile;
use crate::space::Space;

pub fn run(space: &mut Space, dt: f64, events: &mut EventQueue) {
    for entity in super::live_missiles(space) {
        missile::time_step_update(space, entity, dt, events);
    }
}
