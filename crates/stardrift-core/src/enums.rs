//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Broad category of a body in space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    #[default]
    Ship,
    Missile,
    Star,
    Cargo,
}

impl BodyKind {
    pub fn is_ship(&self) -> bool {
        matches!(self, BodyKind::Ship)
    }
}

/// Direction of a linear thruster, used to look up per-axis thrust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Thruster {
    Forward,
    Reverse,
    Up,
    Down,
    Left,
    Right,
}
