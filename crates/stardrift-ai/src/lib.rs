//! Autopilot commands for stardrift bodies.
//!
//! An AI command is a steppable, cancellable behavior. Each step it reads a
//! plain-data `PilotContext` and answers with thruster demand. No ECS access:
//! the sim crate gathers the context and applies the result.

pub mod command;
pub mod kamikaze;
pub mod pilot;

pub use command::{load_from_json, AiCommand, AiError, CommandKind};
pub use kamikaze::Kamikaze;
pub use pilot::{PilotContext, PilotUpdate, TargetState};

pub use stardrift_core as core;
