//! Save and restore a whole space as JSON.
//!
//! Bodies are written in index order so that the 1-based indices used for
//! cross-references stay valid on load. Loading spawns every body first,
//! then runs a fixup pass that resolves those indices. Any missing or
//! mistyped field aborts the whole load.

use hecs::{Entity, EntityBuilder};
use serde_json::{json, Map, Value};
use tracing::warn;

use stardrift_core::components::{Body, Ecm, Hull};
use stardrift_core::enums::BodyKind;
use stardrift_core::error::CorruptSaveError;
use stardrift_core::properties::Properties;
use stardrift_core::serial;
use stardrift_core::ship_type::{ship_type, ShipTypeId};
use stardrift_core::types::FrameId;

use crate::missile::{self, Missile};
use crate::propulsion::{self, Propulsion};
use crate::space::Space;

/// Serialize every body and frame. Call between ticks, when no removals
/// are pending.
pub fn save_space(space: &Space) -> Value {
    let frames: Vec<Value> = space
        .frames()
        .map(|(id, origin)| json!({ "id": id.0, "origin": serial::vec3_to_json(origin) }))
        .collect();
    let bodies: Vec<Value> = space
        .index()
        .iter()
        .filter_map(|entity| save_body(space, entity))
        .collect();
    json!({ "frames": frames, "bodies": bodies })
}

fn save_body(space: &Space, entity: Entity) -> Option<Value> {
    let world = &space.world;
    let body = world.get::<&Body>(entity).ok()?;
    let mut obj = Map::new();
    obj.insert("kind".into(), json!(body.kind));
    obj.insert("label".into(), json!(body.label));
    obj.insert("frame".into(), json!(body.frame.0));
    obj.insert("pos".into(), serial::vec3_to_json(body.position));
    obj.insert("vel".into(), serial::vec3_to_json(body.velocity));
    obj.insert("ang_vel".into(), serial::vec3_to_json(body.angular_velocity));
    obj.insert("orient".into(), serial::mat3_to_json(body.orient));
    obj.insert("mass".into(), json!(body.mass));
    obj.insert("angular_inertia".into(), json!(body.angular_inertia));

    let props = world
        .get::<&Properties>(entity)
        .map(|p| p.to_json())
        .unwrap_or_else(|_| json!({}));
    obj.insert("properties".into(), props);

    if let Ok(hull) = world.get::<&Hull>(entity) {
        obj.insert(
            "hull".into(),
            json!({ "integrity": hull.integrity, "max_integrity": hull.max_integrity }),
        );
    }
    if let Ok(ecm) = world.get::<&Ecm>(entity) {
        obj.insert("ecm".into(), json!({ "power": ecm.power }));
    }
    if let Ok(id) = world.get::<&ShipTypeId>(entity) {
        obj.insert("ship_type".into(), json!(id.as_str()));
    }
    if let Ok(p) = world.get::<&Propulsion>(entity) {
        p.save_to_json(&mut obj);
    }
    if let Ok(m) = world.get::<&Missile>(entity) {
        m.save_to_json(&mut obj, space.index());
    }
    Some(Value::Object(obj))
}

/// Rebuild a space from `save_space` output, references resolved.
pub fn load_space(doc: &Value) -> Result<Space, CorruptSaveError> {
    let mut space = Space::new();
    for frame in array(doc, "frames")? {
        let id = u32::try_from(serial::get_i64(frame, "id")?)
            .map_err(|_| wrong_type("id", "a frame id"))?;
        space.insert_frame(FrameId(id), serial::get_vec3(frame, "origin")?);
    }
    for obj in array(doc, "bodies")? {
        load_body(&mut space, obj).inspect_err(|e| warn!(error = %e, "corrupt body in save"))?;
    }
    post_load_fixup(&mut space)?;
    Ok(space)
}

fn load_body(space: &mut Space, obj: &Value) -> Result<Entity, CorruptSaveError> {
    let kind: BodyKind = serde_json::from_value(serial::field(obj, "kind")?.clone())
        .map_err(|_| wrong_type("kind", "a body kind"))?;
    let frame = u32::try_from(serial::get_i64(obj, "frame")?)
        .map_err(|_| wrong_type("frame", "a frame id"))?;
    let mut body = Body::new(
        kind,
        serial::get_str(obj, "label")?,
        FrameId(frame),
        serial::get_vec3(obj, "pos")?,
    );
    body.velocity = serial::get_vec3(obj, "vel")?;
    body.angular_velocity = serial::get_vec3(obj, "ang_vel")?;
    body.orient = serial::get_mat3(obj, "orient")?;
    body.mass = serial::get_f64(obj, "mass")?;
    body.angular_inertia = serial::get_f64(obj, "angular_inertia")?;

    let mut builder = EntityBuilder::new();
    builder.add(Properties::from_json(serial::field(obj, "properties")?));

    if let Some(hull) = obj.get("hull") {
        builder.add(Hull {
            integrity: serial::get_f64(hull, "integrity")?,
            max_integrity: serial::get_f64(hull, "max_integrity")?,
        });
    }
    if let Some(ecm) = obj.get("ecm") {
        let power = u8::try_from(serial::get_i64(ecm, "power")?)
            .map_err(|_| wrong_type("power", "a power rank"))?;
        builder.add(Ecm { power });
    }
    if let Some(id) = obj.get("ship_type") {
        let id = id.as_str().ok_or_else(|| wrong_type("ship_type", "a string"))?;
        let type_id = ShipTypeId::from_id(id)
            .ok_or_else(|| CorruptSaveError::UnknownShipType(id.to_string()))?;
        builder.add(type_id);
        if obj.get(propulsion::SAVE_KEY).is_some() {
            builder.add(Propulsion::load_from_json(obj, &ship_type(type_id))?);
        }
    }
    if obj.get(missile::SAVE_KEY).is_some() {
        let m = Missile::load_from_json(obj)?;
        builder.add(Propulsion::load_from_json(obj, &ship_type(m.ship_type()))?);
        builder.add(m);
    }

    Ok(space.spawn(body, builder.build()))
}

/// Resolve saved body indices now that every body exists.
pub fn post_load_fixup(space: &mut Space) -> Result<(), CorruptSaveError> {
    let (world, index) = space.world_and_index();
    for (_entity, missile) in world.query_mut::<&mut Missile>() {
        missile.post_load_fixup(index)?;
    }
    Ok(())
}

fn array<'a>(doc: &'a Value, key: &str) -> Result<&'a Vec<Value>, CorruptSaveError> {
    serial::field(doc, key)?
        .as_array()
        .ok_or_else(|| wrong_type(key, "an array"))
}

fn wrong_type(field: &str, expected: &'static str) -> CorruptSaveError {
    CorruptSaveError::WrongType {
        field: field.to_string(),
        expected,
    }
}
