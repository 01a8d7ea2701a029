//! Save-file plumbing shared by every crate that persists state.
//!
//! Saves are `serde_json::Value` documents. Cross-body references are
//! written as dense indices and resolved in a fixup pass once every body
//! has been loaded.

use glam::{DMat3, DVec3};
use hecs::Entity;
use serde_json::Value;

use crate::error::CorruptSaveError;

/// Maps bodies to save indices and back.
pub trait BodyIndexer {
    /// Index for a body, `NO_BODY_INDEX` for `None` or an unknown body.
    fn index_for_body(&self, body: Option<Entity>) -> i64;

    /// Body for a saved index. `NO_BODY_INDEX` resolves to `Ok(None)`.
    fn body_by_index(&self, index: i64) -> Result<Option<Entity>, CorruptSaveError>;
}

pub fn field<'a>(value: &'a Value, key: &str) -> Result<&'a Value, CorruptSaveError> {
    value
        .get(key)
        .ok_or_else(|| CorruptSaveError::MissingField(key.to_string()))
}

pub fn get_i64(value: &Value, key: &str) -> Result<i64, CorruptSaveError> {
    field(value, key)?
        .as_i64()
        .ok_or_else(|| wrong_type(key, "an integer"))
}

pub fn get_f64(value: &Value, key: &str) -> Result<f64, CorruptSaveError> {
    field(value, key)?
        .as_f64()
        .ok_or_else(|| wrong_type(key, "a number"))
}

pub fn get_bool(value: &Value, key: &str) -> Result<bool, CorruptSaveError> {
    field(value, key)?
        .as_bool()
        .ok_or_else(|| wrong_type(key, "a boolean"))
}

pub fn get_str<'a>(value: &'a Value, key: &str) -> Result<&'a str, CorruptSaveError> {
    field(value, key)?
        .as_str()
        .ok_or_else(|| wrong_type(key, "a string"))
}

pub fn get_vec3(value: &Value, key: &str) -> Result<DVec3, CorruptSaveError> {
    let arr = field(value, key)?
        .as_array()
        .filter(|a| a.len() == 3)
        .ok_or_else(|| wrong_type(key, "a 3-vector"))?;
    let mut out = [0.0; 3];
    for (slot, v) in out.iter_mut().zip(arr) {
        *slot = v.as_f64().ok_or_else(|| wrong_type(key, "a 3-vector"))?;
    }
    Ok(DVec3::from_array(out))
}

pub fn get_mat3(value: &Value, key: &str) -> Result<DMat3, CorruptSaveError> {
    let arr = field(value, key)?
        .as_array()
        .filter(|a| a.len() == 9)
        .ok_or_else(|| wrong_type(key, "a 3x3 matrix"))?;
    let mut out = [0.0; 9];
    for (slot, v) in out.iter_mut().zip(arr) {
        *slot = v.as_f64().ok_or_else(|| wrong_type(key, "a 3x3 matrix"))?;
    }
    Ok(DMat3::from_cols_array(&out))
}

pub fn vec3_to_json(v: DVec3) -> Value {
    Value::from(v.to_array().to_vec())
}

pub fn mat3_to_json(m: DMat3) -> Value {
    Value::from(m.to_cols_array().to_vec())
}

fn wrong_type(key: &str, expected: &'static str) -> CorruptSaveError {
    CorruptSaveError::WrongType {
        field: key.to_string(),
        expected,
    }
}
