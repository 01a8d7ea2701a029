//! ECS components for hecs entities.
//!
//! Components are plain data. Behavior lives in the sim crate's systems.

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::enums::BodyKind;
use crate::types::FrameId;

/// Kinematic and inertial state of anything that lives in space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub kind: BodyKind,
    pub label: String,
    pub frame: FrameId,
    pub position: DVec3,
    pub velocity: DVec3,
    pub angular_velocity: DVec3,
    /// Body-to-frame rotation. Column 2 is the body's +Z (aft) axis.
    pub orient: DMat3,
    /// Mass in kg.
    pub mass: f64,
    /// Moment of inertia, treated as a uniform sphere.
    pub angular_inertia: f64,
    /// Force accumulated this step, in the body frame.
    #[serde(skip)]
    pub force: DVec3,
    /// Torque accumulated this step, in the body frame.
    #[serde(skip)]
    pub torque: DVec3,
}

impl Body {
    pub fn new(kind: BodyKind, label: impl Into<String>, frame: FrameId, position: DVec3) -> Self {
        Self {
            kind,
            label: label.into(),
            frame,
            position,
            velocity: DVec3::ZERO,
            angular_velocity: DVec3::ZERO,
            orient: DMat3::IDENTITY,
            mass: 1.0,
            angular_inertia: 1.0,
            force: DVec3::ZERO,
            torque: DVec3::ZERO,
        }
    }

    /// Distance to another position in the same frame.
    pub fn distance_to(&self, other: DVec3) -> f64 {
        (other - self.position).length()
    }
}

/// Structural integrity of a ship. Ships are destroyed at zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hull {
    /// Remaining integrity in kg of armour.
    pub integrity: f64,
    pub max_integrity: f64,
}

impl Hull {
    pub fn new(max_integrity: f64) -> Self {
        Self {
            integrity: max_integrity,
            max_integrity,
        }
    }

    pub fn percent(&self) -> f64 {
        if self.max_integrity <= 0.0 {
            return 0.0;
        }
        100.0 * self.integrity / self.max_integrity
    }
}

/// Marks a body killed this tick. It is removed from the world at the end
/// of the tick, after which every listener is notified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dead;

/// Electronic countermeasure fitted to a ship.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ecm {
    /// Strength compared against a missile's power rank.
    pub power: u8,
}
