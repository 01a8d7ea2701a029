//! Space snapshot: the visible state handed to observers each tick.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::BodyKind;
use crate::types::{FrameId, SimTime};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpaceSnapshot {
    pub time: SimTime,
    pub paused: bool,
    pub bodies: Vec<BodyView>,
    /// Script event names raised this tick, in order.
    pub events: Vec<String>,
    /// Property keys changed since the previous snapshot.
    pub property_changes: Vec<PropertyChange>,
}

/// One body property that changed; look the value up in the next save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub body: u64,
    pub key: String,
}

/// A visible body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyView {
    /// Stable entity bits.
    pub id: u64,
    pub kind: BodyKind,
    pub label: String,
    pub frame: FrameId,
    pub position: DVec3,
    pub velocity: DVec3,
    /// Hull integrity percentage for ships.
    pub hull_percent: Option<f64>,
    pub missile: Option<MissileView>,
}

/// Missile-specific display state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissileView {
    pub ship_type: String,
    pub power: u8,
    pub armed: bool,
    pub has_autopilot: bool,
    /// Remaining fuel fraction.
    pub fuel: f64,
}
