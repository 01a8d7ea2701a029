//! Headless stardrift runner.
//!
//! Wires the simulation, the scripted engagement and the headless renderer
//! into a game loop thread driven from the command line.

pub mod game_loop;
pub mod options;
pub mod state;

pub use stardrift_core as core;
