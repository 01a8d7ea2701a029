//! Events emitted by the simulation for scripts, UI and effects.

use glam::DVec3;
use hecs::Entity;

use crate::types::FrameId;

/// Gameplay events queued for the scripting layer.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A ship took warhead damage. `attacker` is the firer, if still alive.
    ShipHit {
        ship: Entity,
        attacker: Option<Entity>,
    },
    /// A missile detonated.
    Detonated {
        missile: Entity,
        position: DVec3,
        frame: FrameId,
    },
    /// A missile's firer left the world; the missile self-destructs.
    OwnerLost { missile: Entity },
    /// An AI command reported completion and was discarded.
    AiCommandComplete { body: Entity },
}

impl GameEvent {
    /// Script-facing event name.
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::ShipHit { .. } => "onShipHit",
            GameEvent::Detonated { .. } => "onMissileDetonated",
            GameEvent::OwnerLost { .. } => "onMissileOwnerLost",
            GameEvent::AiCommandComplete { .. } => "onAICompleted",
        }
    }
}

/// Visual effects requested by the simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SfxEvent {
    /// Smoke puff behind a thrusting body. `offset` is the exhaust position
    /// relative to the body, already rotated by its orientation.
    ThrustSmoke {
        body: Entity,
        speed: f32,
        offset: DVec3,
    },
    /// Warhead explosion.
    Explosion { position: DVec3, frame: FrameId },
}
