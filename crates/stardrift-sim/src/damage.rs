//! Damage applied to bodies by warheads and countermeasures.

use hecs::Entity;
use tracing::info;

use stardrift_core::components::Hull;

use crate::missile::Missile;
use crate::space::Space;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The hull took the hit and held.
    Absorbed,
    /// The hull gave out; the body has been killed.
    Destroyed,
    /// The target is a missile and must detonate.
    Detonate,
    /// Nothing there can take damage.
    Ignored,
}

/// Apply `amount` kg of damage to `target`. Missiles are not detonated
/// here; the caller decides when their sweep runs.
pub fn apply(space: &mut Space, target: Entity, attacker: Option<Entity>, amount: f64) -> DamageOutcome {
    if !space.is_alive(target) {
        return DamageOutcome::Ignored;
    }
    if space.world.get::<&Missile>(target).is_ok() {
        return DamageOutcome::Detonate;
    }
    let destroyed = match space.world.get::<&mut Hull>(target) {
        Ok(mut hull) => {
            hull.integrity -= amount;
            hull.integrity <= 0.0
        }
        Err(_) => return DamageOutcome::Ignored,
    };
    if destroyed {
        info!(?target, ?attacker, "hull destroyed");
        space.kill_body(target);
        DamageOutcome::Destroyed
    } else {
        DamageOutcome::Absorbed
    }
}
