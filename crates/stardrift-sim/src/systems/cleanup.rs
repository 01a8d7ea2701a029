//! Cleanup system: removes bodies killed this tick and tells every missile.

use tracing::info;

use stardrift_core::events::GameEvent;

use crate::events::EventQueue;
use crate::missile::Missile;
use crate::space::Space;

pub fn run(space: &mut Space, events: &mut EventQueue) {
    let removed = space.process_removals();
    if removed.is_empty() {
        return;
    }
    for (entity, missile) in space.world.query_mut::<&mut Missile>() {
        for &body in &removed {
            if missile.notify_removed(body) {
                info!(missile = ?entity, owner = ?body, "missile lost its owner");
                events.raise(GameEvent::OwnerLost { missile: entity });
            }
        }
    }
}
