//! Pursuit-to-impact autopilot.
//!
//! Flies straight at the target, closing fast but keeping enough margin to
//! correct course. Finishes when the target is gone or fuel runs out.

use hecs::Entity;
use serde_json::{json, Map, Value};
use tracing::debug;

use stardrift_core::constants::NO_BODY_INDEX;
use stardrift_core::error::CorruptSaveError;
use stardrift_core::serial::{self, BodyIndexer};

use crate::command::{AiCommand, CommandKind, SAVE_KEY};
use crate::pilot::{accel_to_velocity, face_direction, PilotContext, PilotUpdate};

/// Seconds of full reverse thrust the impact speed should correspond to.
const COLLISION_SPEED_SECS: f64 = 2.0;

/// Share of forward acceleration reserved for braking on approach.
const BRAKE_SHARE: f64 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Kamikaze {
    target: Option<Entity>,
    /// Saved target index awaiting fixup.
    target_index: Option<i64>,
}

impl Kamikaze {
    pub fn new(target: Entity) -> Self {
        Self {
            target: Some(target),
            target_index: None,
        }
    }

    pub fn load_from_json(cmd: &Value) -> Result<Self, CorruptSaveError> {
        Ok(Self {
            target: None,
            target_index: Some(serial::get_i64(cmd, "index_for_target")?),
        })
    }
}

impl AiCommand for Kamikaze {
    fn kind(&self) -> CommandKind {
        CommandKind::Kamikaze
    }

    fn target(&self) -> Option<Entity> {
        self.target
    }

    fn time_step_update(&mut self, ctx: &PilotContext) -> PilotUpdate {
        let target = match (self.target, ctx.target) {
            (Some(_), Some(state)) => state,
            _ => return PilotUpdate::finished(),
        };
        if ctx.fuel <= 0.0 {
            return PilotUpdate::finished();
        }

        let to_target = target.position - ctx.position;
        let dist = to_target.length();
        let target_dir = to_target.normalize_or_zero();

        let aim_collision_speed = ctx.accel_fwd * COLLISION_SPEED_SECS;
        let brake = ctx.accel_fwd * BRAKE_SHARE;
        let aim_rel_speed = (aim_collision_speed * aim_collision_speed + 2.0 * dist * brake).sqrt();
        let aim_vel = target_dir * aim_rel_speed + target.velocity;
        let accel_dir = (aim_vel - ctx.velocity).normalize_or_zero();

        PilotUpdate {
            lin_thrust: accel_to_velocity(ctx, aim_vel),
            ang_thrust: face_direction(ctx, accel_dir),
            done: false,
        }
    }

    fn on_deleted(&mut self, removed: Entity) {
        if self.target == Some(removed) {
            debug!(?removed, "kamikaze target removed");
            self.target = None;
        }
    }

    fn save_to_json(&self, obj: &mut Map<String, Value>, indexer: &dyn BodyIndexer) {
        obj.insert(
            SAVE_KEY.to_string(),
            json!({
                "command_name": self.kind().as_str(),
                "index_for_target": indexer.index_for_body(self.target),
            }),
        );
    }

    fn post_load_fixup(&mut self, indexer: &dyn BodyIndexer) -> Result<(), CorruptSaveError> {
        if let Some(index) = self.target_index.take() {
            self.target = if index == NO_BODY_INDEX {
                None
            } else {
                indexer.body_by_index(index)?
            };
        }
        Ok(())
    }
}
