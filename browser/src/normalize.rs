//! Value normalization for display.
//!
//! Records reach the UI as JSON. Raw byte sequences have no JSON form of their
//! own, so they are rendered as lowercase hex strings prefixed with `0x`.
//! Everything else keeps its shape. Normalization is idempotent: running it
//! over an already normalized value returns the value unchanged.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::model::{BinValue, DisplayRecord, RecordEntry, RecordKey};

/// Canonical, displayable form of a bin value.
pub type DisplayValue = Value;

/// Normalizes a JSON value.
///
/// Buffer-tagged objects (`{"type": "Buffer", "data": [..]}`) become `0x` hex
/// strings. Objects and arrays are normalized recursively, primitives are
/// returned as-is.
pub fn normalize(value: &DisplayValue) -> DisplayValue {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::Object(map) => match buffer_bytes(map) {
            Some(bytes) => Value::String(hex_string(&bytes)),
            None => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize(v)))
                    .collect(),
            ),
        },
        other => other.clone(),
    }
}

/// Normalizes a bin value. A missing bin displays as `null`.
pub fn normalize_bin(value: Option<&BinValue>) -> DisplayValue {
    let Some(value) = value else {
        return Value::Null;
    };
    match value {
        BinValue::Null => Value::Null,
        BinValue::Bool(b) => Value::Bool(*b),
        BinValue::Int(i) => Value::Number((*i).into()),
        // JSON has no representation for NaN or infinities.
        BinValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        BinValue::String(s) => Value::String(s.clone()),
        BinValue::Bytes(bytes) => Value::String(hex_string(bytes)),
        BinValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_bin(Some(v))))
                .collect(),
        ),
        BinValue::List(items) => {
            Value::Array(items.iter().map(|v| normalize_bin(Some(v))).collect())
        }
    }
}

/// Returns the canonical display string of a record key.
///
/// The same string is used everywhere a record is identified, so the key shown
/// in the UI always matches the key seen by pagination.
///
/// String keys are shown verbatim and byte digests as `0x` hex, so a string
/// key that itself reads `0x01af` displays the same as the digest
/// `[0x01, 0xaf]`. The display string is a label, not a unique identity:
/// callers that need to tell the two apart must keep the [`RecordKey`].
pub fn normalize_key(key: &RecordKey) -> String {
    match key {
        RecordKey::String(s) => s.clone(),
        RecordKey::Bytes(bytes) => hex_string(bytes),
    }
}

/// Converts a driver record to its display form.
pub fn normalize_record(record: &RecordEntry) -> DisplayRecord {
    DisplayRecord {
        key: normalize_key(&record.key),
        bins: record
            .bins
            .iter()
            .map(|(name, value)| (name.clone(), normalize_bin(Some(value))))
            .collect(),
    }
}

/// Normalizes every bin of a record that is already in display form.
pub fn renormalize_record(record: &DisplayRecord) -> DisplayRecord {
    DisplayRecord {
        key: record.key.clone(),
        bins: record
            .bins
            .iter()
            .map(|(name, value)| (name.clone(), normalize(value)))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// Returns the union of bin names across a page, in first-seen order.
///
/// Records of one set do not share a fixed schema, so table headers must be
/// derived from every record on the page.
pub fn page_bins(records: &[DisplayRecord]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut bins = Vec::new();
    for record in records {
        for name in record.bins.keys() {
            if seen.insert(name.as_str()) {
                bins.push(name.clone());
            }
        }
    }
    bins
}

/// Extracts the bytes of a Buffer-tagged JSON object.
///
/// Returns `None` unless the object has `"type": "Buffer"` and a `data` array
/// made entirely of byte values.
pub(crate) fn buffer_bytes(map: &Map<String, Value>) -> Option<Vec<u8>> {
    if map.get("type").and_then(Value::as_str) != Some("Buffer") {
        return None;
    }
    map.get("data")?
        .as_array()?
        .iter()
        .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect()
}

fn hex_string(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
