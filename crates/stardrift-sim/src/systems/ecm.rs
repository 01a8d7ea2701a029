//! ECM bursts against nearby missiles.

use hecs::Entity;
use tracing::debug;

use stardrift_core::components::{Body, Ecm};
use stardrift_core::constants::ECM_RANGE;

use crate::events::EventQueue;
use crate::missile::{self, Missile};
use crate::space::Space;

/// Fire `ship`'s ECM at every missile of its frame within range. Returns
/// false if the ship has no ECM fitted.
pub fn fire(space: &mut Space, ship: Entity, events: &mut EventQueue) -> bool {
    if !space.is_alive(ship) {
        return false;
    }
    let Ok(power) = space.world.get::<&Ecm>(ship).map(|e| e.power) else {
        return false;
    };
    let Some(center) = space.absolute_position(ship) else {
        return false;
    };
    let frame = match space.world.get::<&Body>(ship) {
        Ok(body) => body.frame,
        Err(_) => return false,
    };
    debug!(?ship, power, "ECM burst");

    for target in space.bodies_maybe_near(center, ECM_RANGE) {
        let in_frame = space
            .world
            .get::<&Body>(target)
            .map(|b| b.frame == frame)
            .unwrap_or(false);
        if in_frame && space.world.get::<&Missile>(target).is_ok() {
            missile::ecm_attack(space, target, power, events);
        }
    }
    true
}
