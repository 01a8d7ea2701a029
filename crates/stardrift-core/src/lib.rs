//! Core types and definitions for the stardrift simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! body components, ship types, commands, snapshots, events, constants
//! and the save-file helpers. It has no dependency on any renderer.

pub mod commands;
pub mod components;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod properties;
pub mod serial;
pub mod ship_type;
pub mod state;
pub mod types;

pub use error::CorruptSaveError;

#[cfg(test)]
mod tests;
