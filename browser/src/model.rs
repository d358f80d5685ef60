//! Core data types for the browser.
//!
//! These types describe what the cluster reports: namespaces, the sets inside
//! them and the records inside a set. Records are sparse. Two records of the
//! same set may carry entirely different bins, so bins are held in a map of
//! tagged [`BinValue`]s rather than a fixed schema.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A top-level partition of the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A snapshot of a set's metadata as reported by the driver at fetch time.
///
/// Counts may be stale. The only way to refresh them is a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDescriptor {
    /// Namespace the set belongs to.
    pub namespace: String,
    /// Set name.
    pub name: String,
    /// Number of objects in the set.
    pub objects: u64,
    /// Estimated bytes used by the set's data.
    pub data_used_bytes: u64,
}

/// The primary key of a record.
///
/// Records written with a user key carry it as a string. Records without one
/// are identified by the cluster-assigned digest, an opaque byte sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    String(String),
    Bytes(Bytes),
}

impl From<&str> for RecordKey {
    fn from(key: &str) -> Self {
        RecordKey::String(key.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(key: String) -> Self {
        RecordKey::String(key)
    }
}

impl From<Bytes> for RecordKey {
    fn from(digest: Bytes) -> Self {
        RecordKey::Bytes(digest)
    }
}

/// A single bin value.
#[derive(Debug, Clone, PartialEq)]
pub enum BinValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Bytes),
    Map(BTreeMap<String, BinValue>),
    List(Vec<BinValue>),
}

impl BinValue {
    /// Builds a bin value from JSON.
    ///
    /// Objects shaped like `{"type": "Buffer", "data": [..bytes..]}` are read
    /// back as raw bytes, which is how byte values look once they have been
    /// serialized by a JavaScript client.
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => BinValue::Null,
            Value::Bool(b) => BinValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => BinValue::Int(i),
                None => BinValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => BinValue::String(s),
            Value::Array(items) => {
                BinValue::List(items.into_iter().map(BinValue::from_json).collect())
            }
            Value::Object(map) => match crate::normalize::buffer_bytes(&map) {
                Some(bytes) => BinValue::Bytes(Bytes::from(bytes)),
                None => BinValue::Map(
                    map.into_iter()
                        .map(|(k, v)| (k, BinValue::from_json(v)))
                        .collect(),
                ),
            },
        }
    }
}

impl From<&str> for BinValue {
    fn from(value: &str) -> Self {
        BinValue::String(value.to_string())
    }
}

impl From<i64> for BinValue {
    fn from(value: i64) -> Self {
        BinValue::Int(value)
    }
}

impl From<bool> for BinValue {
    fn from(value: bool) -> Self {
        BinValue::Bool(value)
    }
}

/// A record as returned by the driver: a key plus its bins.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEntry {
    pub key: RecordKey,
    pub bins: BTreeMap<String, BinValue>,
}

impl RecordEntry {
    pub fn new(key: impl Into<RecordKey>) -> Self {
        Self {
            key: key.into(),
            bins: BTreeMap::new(),
        }
    }

    /// Adds a bin, replacing any previous value under the same name.
    pub fn with_bin(mut self, name: impl Into<String>, value: impl Into<BinValue>) -> Self {
        self.bins.insert(name.into(), value.into());
        self
    }
}

/// A record in display form: the key as its canonical string and every bin
/// passed through the value normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub key: String,
    #[serde(default)]
    pub bins: BTreeMap<String, serde_json::Value>,
}

/// Cluster-wide statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStats {
    /// Server build version.
    pub version: String,
    /// Node uptime in seconds.
    pub uptime: u64,
    /// Sum of objects across all namespaces.
    pub total_objects: u64,
}
