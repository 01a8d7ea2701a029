//! Snapshot system: builds the visible state of the space.
//!
//! `build_snapshot` is read-only. `take_property_changes` drains each body's
//! change list so every change is published exactly once.

use stardrift_core::components::{Body, Dead, Hull};
use stardrift_core::events::GameEvent;
use stardrift_core::properties::Properties;
use stardrift_core::state::{BodyView, MissileView, PropertyChange, SpaceSnapshot};
use stardrift_core::types::SimTime;

use crate::missile::Missile;
use crate::propulsion::Propulsion;
use crate::space::Space;

pub fn build_snapshot(
    space: &Space,
    time: &SimTime,
    paused: bool,
    events: &[GameEvent],
    property_changes: Vec<PropertyChange>,
) -> SpaceSnapshot {
    let mut bodies = Vec::with_capacity(space.index().len());
    for entity in space.index().iter() {
        if space.world.get::<&Dead>(entity).is_ok() {
            continue;
        }
        let Ok(body) = space.world.get::<&Body>(entity) else {
            continue;
        };
        let hull_percent = space.world.get::<&Hull>(entity).ok().map(|h| h.percent());
        let missile = space.world.get::<&Missile>(entity).ok().map(|m| MissileView {
            ship_type: m.ship_type().as_str().to_string(),
            power: m.power(),
            armed: m.is_armed(),
            has_autopilot: m.ai().is_some(),
            fuel: space
                .world
                .get::<&Propulsion>(entity)
                .map(|p| p.fuel())
                .unwrap_or(0.0),
        });
        bodies.push(BodyView {
            id: entity.to_bits().get(),
            kind: body.kind,
            label: body.label.clone(),
            frame: body.frame,
            position: body.position,
            velocity: body.velocity,
            hull_percent,
            missile,
        });
    }

    SpaceSnapshot {
        time: *time,
        paused,
        bodies,
        events: events.iter().map(|e| e.name().to_string()).collect(),
        property_changes,
    }
}

/// Drain every body's changed keys, in body index order. A key changed
/// several times since the last drain is reported once.
pub fn take_property_changes(space: &mut Space) -> Vec<PropertyChange> {
    let mut changes = Vec::new();
    for entity in space.index().iter() {
        let Ok(mut props) = space.world.get::<&mut Properties>(entity) else {
            continue;
        };
        let body = entity.to_bits().get();
        for key in props.take_changed() {
            if !changes
                .iter()
                .any(|c: &PropertyChange| c.body == body && c.key == key)
            {
                changes.push(PropertyChange { body, key });
            }
        }
    }
    changes
}
