//! Interchange (JSON) form of record values.
//!
//! Independent of the binary codec: objects are emitted with keys in
//! lexicographic order no matter what order the descriptor declares, names and
//! symbols become strings, byte strings become lowercase hex.

use crate::descriptor::{FieldKind, RecordDescriptor};
use crate::error::CodecError;
use crate::hex_bytes::HexBytes;
use crate::name::Name;
use crate::value::{Record, Value};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;

/// Convert a value to JSON.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Uint(v) => Json::from(*v),
        Value::Int(v) => Json::from(*v),
        Value::Bool(b) => Json::Bool(*b),
        Value::Name(n) => Json::String(n.to_string()),
        Value::Symbol(s) => Json::String(s.to_string()),
        Value::Bytes(b) => Json::String(hex::encode(b)),
        Value::Str(s) => Json::String(s.clone()),
        Value::Record(r) => record_to_json(r),
        Value::Seq(items) => Json::Array(items.iter().map(value_to_json).collect()),
    }
}

/// Convert a record to a JSON object with sorted keys.
pub fn record_to_json(record: &Record) -> Json {
    let sorted: BTreeMap<&str, Json> = record.iter().map(|(k, v)| (k, value_to_json(v))).collect();
    sorted_object(sorted)
}

/// Build a JSON object from an already-sorted map.
pub(crate) fn sorted_object<K: Into<String>>(sorted: BTreeMap<K, Json>) -> Json {
    let map: Map<String, Json> = sorted.into_iter().map(|(k, v)| (k.into(), v)).collect();
    Json::Object(map)
}

/// Parse a JSON object into a record shaped by `desc`.
///
/// Missing fields take their zero value; size-source fields may be omitted and
/// are then filled at pack time. Keys the descriptor does not declare are
/// rejected.
pub fn record_from_json(desc: &RecordDescriptor, obj: &Map<String, Json>) -> Result<Record, CodecError> {
    if let Some(key) = obj.keys().find(|k| desc.field(k).is_none()) {
        return Err(CodecError::InvalidInterchange {
            reason: format!("'{}' has no field '{key}'", desc.name()),
        });
    }

    let mut record = Record::new();
    for field in desc.fields() {
        match obj.get(&field.name) {
            Some(json) => {
                record.insert(field.name.clone(), value_from_json(&field.name, &field.kind, json)?);
            }
            None if desc.sized_by(&field.name).is_some() => {}
            None => {
                record.insert(field.name.clone(), Value::zero(&field.kind));
            }
        }
    }
    Ok(record)
}

/// Parse one JSON value as `kind`.
///
/// Integers are accepted as JSON numbers or decimal strings, since nodes emit
/// 64-bit quantities as strings.
pub fn value_from_json(field: &str, kind: &FieldKind, json: &Json) -> Result<Value, CodecError> {
    let mismatch = || CodecError::InvalidInterchange {
        reason: format!("field '{field}': expected {kind}, got {json}"),
    };

    let value = match kind {
        FieldKind::Uint(_) | FieldKind::Varuint32 => {
            let v = match json {
                Json::Number(n) => n.as_u64(),
                Json::String(s) => s.parse().ok(),
                _ => None,
            };
            Value::Uint(v.ok_or_else(mismatch)?)
        }
        FieldKind::Int(_) => {
            let v = match json {
                Json::Number(n) => n.as_i64(),
                Json::String(s) => s.parse().ok(),
                _ => None,
            };
            Value::Int(v.ok_or_else(mismatch)?)
        }
        FieldKind::Bool => Value::Bool(json.as_bool().ok_or_else(mismatch)?),
        FieldKind::Name => Value::Name(Name::new(json.as_str().ok_or_else(mismatch)?)?),
        FieldKind::Symbol => Value::Symbol(json.as_str().ok_or_else(mismatch)?.parse()?),
        FieldKind::Bytes | FieldKind::FixedBytes(_) => {
            let s = json.as_str().ok_or_else(mismatch)?;
            Value::Bytes(HexBytes::from_hex(s)?.into_inner())
        }
        FieldKind::Str => Value::Str(json.as_str().ok_or_else(mismatch)?.to_string()),
        FieldKind::Record(desc) => {
            Value::Record(record_from_json(desc, json.as_object().ok_or_else(mismatch)?)?)
        }
        FieldKind::Seq(elem) => {
            let items = json.as_array().ok_or_else(mismatch)?;
            Value::Seq(
                items
                    .iter()
                    .map(|item| value_from_json(field, elem, item))
                    .collect::<Result<_, _>>()?,
            )
        }
    };
    Ok(value)
}
