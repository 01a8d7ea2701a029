//! The autopilot command contract and its save-file dispatch.

use std::fmt;

use hecs::Entity;
use serde_json::{Map, Value};

use stardrift_core::error::CorruptSaveError;
use stardrift_core::serial::{self, BodyIndexer};

use crate::kamikaze::Kamikaze;
use crate::pilot::{PilotContext, PilotUpdate};

/// Key of the command object inside its owner's save object.
pub const SAVE_KEY: &str = "ai_command";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Kamikaze,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Kamikaze => "kamikaze",
        }
    }
}

/// Last error reported by an autopilot, surfaced to the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AiError {
    #[default]
    None,
    GravityTooHigh,
    ReferenceStationFar,
    OrbitImpossible,
}

impl AiError {
    pub fn code(&self) -> i64 {
        match self {
            AiError::None => 0,
            AiError::GravityTooHigh => 1,
            AiError::ReferenceStationFar => 2,
            AiError::OrbitImpossible => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<AiError> {
        match code {
            0 => Some(AiError::None),
            1 => Some(AiError::GravityTooHigh),
            2 => Some(AiError::ReferenceStationFar),
            3 => Some(AiError::OrbitImpossible),
            _ => None,
        }
    }
}

/// A steppable, cancellable behavior driving one body's thrusters.
///
/// The owner holds the command exclusively. Cancelling is dropping it.
pub trait AiCommand: fmt::Debug + Send + Sync {
    fn kind(&self) -> CommandKind;

    /// Body whose state must be supplied in the next `PilotContext`.
    fn target(&self) -> Option<Entity>;

    /// Advance one step.
    fn time_step_update(&mut self, ctx: &PilotContext) -> PilotUpdate;

    /// A body left the world; drop any reference to it.
    fn on_deleted(&mut self, removed: Entity);

    fn save_to_json(&self, obj: &mut Map<String, Value>, indexer: &dyn BodyIndexer);

    /// Resolve saved body indices once every body is loaded.
    fn post_load_fixup(&mut self, indexer: &dyn BodyIndexer) -> Result<(), CorruptSaveError>;
}

/// Restore the command saved in `obj`, if any.
pub fn load_from_json(obj: &Value) -> Result<Option<Box<dyn AiCommand>>, CorruptSaveError> {
    let Some(cmd) = obj.get(SAVE_KEY) else {
        return Ok(None);
    };
    let name = serial::get_str(cmd, "command_name")?;
    match name {
        "kamikaze" => Ok(Some(Box::new(Kamikaze::load_from_json(cmd)?))),
        other => Err(CorruptSaveError::UnknownAiCommand(other.to_string())),
    }
}
