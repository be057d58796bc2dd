//! Conversion between caller types and stored record bytes
//!
//! Records are stored as JSON. Decoding is lenient about shape: fields the
//! stored document lacks take the target type's `Default` value, and fields
//! the target type lacks are ignored. Bytes that are not JSON at all, or
//! fields whose stored value has an incompatible type, are errors.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use bucketdb_common::error::Result;

/// A value that can be read back out of a table.
///
/// `Default` supplies the value of every field missing from a stored record.
pub trait Record: Serialize + DeserializeOwned + Default {}

impl<T> Record for T where T: Serialize + DeserializeOwned + Default {}

/// Serialize `value` into record bytes
pub fn encode<V: Serialize + ?Sized>(value: &V) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize record bytes into `T`, defaulting missing fields
pub fn decode<T: Record>(bytes: &[u8]) -> Result<T> {
    let stored: Value = serde_json::from_slice(bytes)?;

    // Exact shapes need no overlay.
    if let Ok(value) = T::deserialize(&stored) {
        return Ok(value);
    }

    let mut merged = serde_json::to_value(T::default())?;
    overlay(&mut merged, stored);
    Ok(T::deserialize(&merged)?)
}

/// Write every non-null value of `from` over `into`, recursing through objects
fn overlay(into: &mut Value, from: Value) {
    match (into, from) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(fields)) => {
            for (name, value) in fields {
                match base.get_mut(&name) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(name, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
