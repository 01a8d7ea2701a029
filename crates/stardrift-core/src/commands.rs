//! Commands sent to the simulation by the player, scripts or the app.
//!
//! Commands are queued and processed at the next tick boundary.

use hecs::Entity;

use crate::ship_type::ShipTypeId;

#[derive(Debug, Clone, PartialEq)]
pub enum SimCommand {
    // --- Weapons ---
    /// Launch a missile from `firer`. `power` overrides the type's rank.
    FireMissile {
        firer: Entity,
        ship_type: ShipTypeId,
        power: Option<u8>,
        target: Option<Entity>,
    },
    /// Enable the proximity fuse.
    ArmMissile { missile: Entity },
    /// Disable the proximity fuse.
    DisarmMissile { missile: Entity },
    /// Replace the missile's autopilot with a pursuit-to-impact run.
    Kamikaze { missile: Entity, target: Entity },
    /// Fire the ECM fitted to `ship` at every missile in range.
    FireEcm { ship: Entity },

    // --- Simulation control ---
    /// Set time scale (1.0 = normal, 0.0 = paused).
    SetTimeScale { scale: f64 },
    Pause,
    Resume,
}
