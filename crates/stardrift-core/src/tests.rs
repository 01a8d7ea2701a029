use glam::{DMat3, DVec3};
use serde_json::json;

use crate::components::Hull;
use crate::error::CorruptSaveError;
use crate::serial;
use crate::ship_type::{ship_type, ShipTypeId};
use crate::types::SimTime;

#[test]
fn test_ship_type_ids_resolve() {
    for id in ShipTypeId::ALL {
        assert_eq!(ShipTypeId::from_id(id.as_str()), Some(id));
        assert_eq!(ship_type(id).id, id);
    }
    assert_eq!(ShipTypeId::from_id("missile_photon"), None);
}

#[test]
fn test_default_missile_power_tiers() {
    assert_eq!(ShipTypeId::MissileGuided.default_missile_power(), 1);
    assert_eq!(ShipTypeId::MissileSmart.default_missile_power(), 2);
    assert_eq!(ShipTypeId::MissileNaval.default_missile_power(), 3);
    assert_eq!(ShipTypeId::MissileUnguided.default_missile_power(), 0);
    assert_eq!(ShipTypeId::Shuttle.default_missile_power(), 0);
}

#[test]
fn test_only_missiles_lack_hull() {
    for id in ShipTypeId::ALL {
        let t = ship_type(id);
        assert_eq!(t.is_missile(), t.hull_integrity.is_none(), "{}", id.as_str());
    }
}

#[test]
fn test_sim_time_advance() {
    let mut time = SimTime::default();
    time.advance(0.5);
    time.advance(0.5);
    assert_eq!(time.tick, 2);
    assert!((time.elapsed_secs - 1.0).abs() < 1e-12);
}

#[test]
fn test_hull_percent() {
    let mut hull = Hull::new(200.0);
    hull.integrity = 50.0;
    assert!((hull.percent() - 25.0).abs() < 1e-12);
}

#[test]
fn test_serial_missing_field() {
    let doc = json!({ "power": 1 });
    assert_eq!(
        serial::get_bool(&doc, "armed"),
        Err(CorruptSaveError::MissingField("armed".into()))
    );
}

#[test]
fn test_serial_wrong_type() {
    let doc = json!({ "armed": "yes" });
    assert!(matches!(
        serial::get_bool(&doc, "armed"),
        Err(CorruptSaveError::WrongType { .. })
    ));
    let doc = json!({ "pos": [1.0, 2.0] });
    assert!(serial::get_vec3(&doc, "pos").is_err());
}

#[test]
fn test_serial_vectors_and_matrices() {
    let v = DVec3::new(1.0, -2.0, 3.5);
    let m = DMat3::from_rotation_y(0.3);
    let doc = json!({ "v": serial::vec3_to_json(v), "m": serial::mat3_to_json(m) });
    assert_eq!(serial::get_vec3(&doc, "v").unwrap(), v);
    assert_eq!(serial::get_mat3(&doc, "m").unwrap(), m);
}
