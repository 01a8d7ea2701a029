//! Autopilot system: steps every missile's AI command and emits smoke.

use rand::Rng;

use crate::events::EventQueue;
use crate::missile;
use crate::space::Space;

pub fn run<R: Rng>(space: &mut Space, dt: f64, rng: &mut R, events: &mut EventQueue) {
    for entity in super::live_missiles(space) {
        missile::static_update(space, entity, dt, rng, events);
    }
}
