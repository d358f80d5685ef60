//! In-memory cluster driver.
//!
//! [`InMemoryCluster`] holds namespaces, sets and records in memory and
//! answers info commands in the same text format as a real cluster node, so
//! the parsing in [`crate::driver`] is exercised end to end. It is used for
//! local development (seeded from a YAML fixture) and in tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;

use crate::cursor::ScanCursor;
use crate::driver::{ClusterDriver, ConnectParams, Connector, ScanPage};
use crate::error::{Error, Result};
use crate::model::{BinValue, RecordEntry, RecordKey};
use crate::normalize::normalize_record;

/// Build version reported by the in-memory cluster.
const DEFAULT_BUILD: &str = "in-memory";

/// An in-memory cluster: namespace -> set -> records.
#[derive(Debug, Clone)]
pub struct InMemoryCluster {
    build: String,
    namespaces: BTreeMap<String, BTreeMap<String, Vec<RecordEntry>>>,
}

impl Default for InMemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self {
            build: DEFAULT_BUILD.to_string(),
            namespaces: BTreeMap::new(),
        }
    }

    /// Adds an empty namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces.entry(namespace.into()).or_default();
        self
    }

    /// Adds a set, creating its namespace if needed.
    pub fn with_set(
        mut self,
        namespace: impl Into<String>,
        set: impl Into<String>,
        records: Vec<RecordEntry>,
    ) -> Self {
        self.namespaces
            .entry(namespace.into())
            .or_default()
            .insert(set.into(), records);
        self
    }

    /// Loads a cluster from a YAML fixture file.
    pub fn from_fixture<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::InvalidInput(format!("Failed to read fixture file: {}", e))
        })?;
        Self::from_yaml(&contents)
    }

    /// Parses a cluster from a YAML fixture document.
    ///
    /// ```yaml
    /// build: "7.1.0"
    /// namespaces:
    ///   users:
    ///     profiles:
    ///       - key: user_1
    ///         bins: { name: Ada, age: 36 }
    ///       - digest: 01af
    ///         bins: { blob: { type: Buffer, data: [1, 2] } }
    ///   inventory: {}
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let fixture: Fixture = serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidInput(format!("Failed to parse fixture: {}", e)))?;

        let mut cluster = Self::new();
        if let Some(build) = fixture.build {
            cluster.build = build;
        }
        for (namespace, sets) in fixture.namespaces {
            cluster = cluster.with_namespace(namespace.clone());
            for (set, records) in sets {
                let records = records
                    .into_iter()
                    .map(FixtureRecord::into_entry)
                    .collect::<Result<Vec<_>>>()?;
                cluster = cluster.with_set(namespace.clone(), set, records);
            }
        }
        Ok(cluster)
    }

    /// Opens a driver over a shared cluster.
    pub fn driver(self: &Arc<Self>) -> InMemoryDriver {
        InMemoryDriver {
            cluster: self.clone(),
            connected: AtomicBool::new(true),
            started: Instant::now(),
        }
    }

    fn sets_info(&self, namespace: &str) -> String {
        let Some(sets) = self.namespaces.get(namespace) else {
            return String::new();
        };
        sets.iter()
            .map(|(set, records)| {
                format!(
                    "ns={}:set={}:objects={}:data_used_bytes={};",
                    namespace,
                    set,
                    records.len(),
                    estimated_size(records)
                )
            })
            .collect()
    }

    fn namespace_info(&self, namespace: &str) -> Option<String> {
        let sets = self.namespaces.get(namespace)?;
        let objects: usize = sets.values().map(Vec::len).sum();
        Some(format!("objects={};sets={}", objects, sets.len()))
    }
}

/// A driver connected to an [`InMemoryCluster`].
///
/// Scan cursors are `{"namespace", "set", "offset"}` objects.
pub struct InMemoryDriver {
    cluster: Arc<InMemoryCluster>,
    connected: AtomicBool,
    started: Instant,
}

impl InMemoryDriver {
    fn check_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }
}

#[async_trait]
impl ClusterDriver for InMemoryDriver {
    async fn info(&self, command: &str) -> Result<String> {
        self.check_connected()?;
        let cluster = &self.cluster;
        match command.split_once('/') {
            None if command == "namespaces" => Ok(cluster
                .namespaces
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(";")),
            None if command == "build" => Ok(cluster.build.clone()),
            None if command == "statistics" => Ok(format!(
                "cluster_size=1;uptime={}",
                self.started.elapsed().as_secs()
            )),
            Some(("sets", namespace)) => Ok(cluster.sets_info(namespace)),
            Some(("namespace", namespace)) => cluster
                .namespace_info(namespace)
                .ok_or_else(|| Error::Driver(format!("namespace not found: {}", namespace))),
            _ => Err(Error::Driver(format!("unsupported info command: {}", command))),
        }
    }

    async fn scan_page(
        &self,
        namespace: &str,
        set: &str,
        cursor: Option<ScanCursor>,
        limit: usize,
    ) -> Result<ScanPage> {
        self.check_connected()?;
        let sets = self
            .cluster
            .namespaces
            .get(namespace)
            .ok_or_else(|| Error::Driver(format!("namespace not found: {}", namespace)))?;
        let records = sets.get(set).map(Vec::as_slice).unwrap_or_default();

        let offset = match cursor {
            None => 0,
            Some(cursor) => resume_offset(&cursor, namespace, set)?,
        };
        let end = offset.saturating_add(limit).min(records.len());
        let page = records.get(offset..end).unwrap_or_default().to_vec();

        let cursor = if end < records.len() {
            Some(ScanCursor::new(
                json!({"namespace": namespace, "set": set, "offset": end}),
            )?)
        } else {
            None
        };
        Ok(ScanPage {
            records: page,
            cursor,
        })
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::Release);
    }
}

/// Connector that hands out drivers over a shared in-memory cluster.
pub struct InMemoryConnector {
    cluster: Arc<InMemoryCluster>,
}

impl InMemoryConnector {
    pub fn new(cluster: InMemoryCluster) -> Self {
        Self {
            cluster: Arc::new(cluster),
        }
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn connect(&self, params: &ConnectParams) -> Result<Arc<dyn ClusterDriver>> {
        params.validate()?;
        tracing::debug!(host = %params.host, port = params.port, "opening in-memory driver");
        Ok(Arc::new(self.cluster.driver()))
    }
}

fn resume_offset(cursor: &ScanCursor, namespace: &str, set: &str) -> Result<usize> {
    let state = cursor.state();
    if state["namespace"] != namespace || state["set"] != set {
        return Err(Error::Scan(format!(
            "cursor does not belong to {}/{}",
            namespace, set
        )));
    }
    state["offset"]
        .as_u64()
        .and_then(|o| usize::try_from(o).ok())
        .ok_or_else(|| Error::Scan("cursor has no offset".to_string()))
}

fn estimated_size(records: &[RecordEntry]) -> usize {
    records
        .iter()
        .map(|r| {
            let display = normalize_record(r);
            display.key.len() + serde_json::to_vec(&display.bins).map_or(0, |b| b.len())
        })
        .sum()
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    build: Option<String>,
    #[serde(default)]
    namespaces: BTreeMap<String, BTreeMap<String, Vec<FixtureRecord>>>,
}

#[derive(Debug, Deserialize)]
struct FixtureRecord {
    #[serde(default)]
    key: Option<String>,
    /// Hex digest, used when the record has no user key.
    #[serde(default)]
    digest: Option<String>,
    #[serde(default)]
    bins: BTreeMap<String, serde_json::Value>,
}

impl FixtureRecord {
    fn into_entry(self) -> Result<RecordEntry> {
        let key = match (self.key, self.digest) {
            (Some(key), _) => RecordKey::String(key),
            (None, Some(digest)) => RecordKey::Bytes(Bytes::from(
                hex::decode(digest.trim_start_matches("0x"))
                    .map_err(|e| Error::InvalidInput(format!("Invalid digest: {}", e)))?,
            )),
            (None, None) => {
                return Err(Error::InvalidInput(
                    "fixture record needs a key or a digest".to_string(),
                ));
            }
        };
        Ok(RecordEntry {
            key,
            bins: self
                .bins
                .into_iter()
                .map(|(name, value)| (name, BinValue::from_json(value)))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<RecordEntry> {
        (0..n)
            .map(|i| RecordEntry::new(format!("key_{}", i)).with_bin("id", i as i64))
            .collect()
    }

    fn driver(cluster: InMemoryCluster) -> InMemoryDriver {
        Arc::new(cluster).driver()
    }

    #[tokio::test]
    async fn should_answer_namespaces_in_info_format() {
        // given
        let driver = driver(InMemoryCluster::new().with_namespace("test").with_namespace("users"));

        // when
        let namespaces = driver.fetch_namespaces().await.unwrap();

        // then
        assert_eq!(namespaces, vec!["test", "users"]);
    }

    #[tokio::test]
    async fn should_report_set_counts() {
        // given
        let driver = driver(InMemoryCluster::new().with_set("users", "profiles", records(3)));

        // when
        let sets = driver.fetch_sets("users").await.unwrap();

        // then
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, "profiles");
        assert_eq!(sets[0].objects, 3);
        assert!(sets[0].data_used_bytes > 0);
    }

    #[tokio::test]
    async fn should_page_through_a_set() {
        // given
        let driver = driver(InMemoryCluster::new().with_set("users", "profiles", records(5)));

        // when
        let first = driver.scan_page("users", "profiles", None, 3).await.unwrap();
        let second = driver
            .scan_page("users", "profiles", first.cursor.clone(), 3)
            .await
            .unwrap();

        // then
        assert_eq!(first.records.len(), 3);
        assert!(first.cursor.is_some());
        assert_eq!(second.records.len(), 2);
        assert_eq!(second.records[0].key, RecordKey::from("key_3"));
        assert!(second.cursor.is_none());
    }

    #[tokio::test]
    async fn should_end_scan_of_unknown_set_immediately() {
        // given
        let driver = driver(InMemoryCluster::new().with_namespace("users"));

        // when
        let page = driver.scan_page("users", "missing", None, 10).await.unwrap();

        // then
        assert!(page.records.is_empty());
        assert!(page.cursor.is_none());
    }

    #[tokio::test]
    async fn should_reject_cursor_from_another_set() {
        // given
        let driver = driver(
            InMemoryCluster::new()
                .with_set("users", "a", records(4))
                .with_set("users", "b", records(4)),
        );
        let page = driver.scan_page("users", "a", None, 2).await.unwrap();

        // when
        let result = driver.scan_page("users", "b", page.cursor, 2).await;

        // then
        assert!(matches!(result, Err(Error::Scan(_))));
    }

    #[tokio::test]
    async fn should_refuse_commands_after_close() {
        // given
        let driver = driver(InMemoryCluster::new().with_namespace("test"));

        // when
        driver.close().await;

        // then
        assert_eq!(driver.fetch_namespaces().await, Err(Error::NotConnected));
    }

    #[tokio::test]
    async fn should_sum_objects_across_namespaces_in_stats() {
        // given
        let driver = driver(
            InMemoryCluster::new()
                .with_set("users", "profiles", records(4))
                .with_set("inventory", "products", records(6)),
        );

        // when
        let stats = driver.fetch_stats().await.unwrap();

        // then
        assert_eq!(stats.version, DEFAULT_BUILD);
        assert_eq!(stats.total_objects, 10);
    }

    #[test]
    fn should_load_cluster_from_yaml_fixture() {
        // given
        let yaml = r#"
build: "7.1.0"
namespaces:
  users:
    profiles:
      - key: user_1
        bins: { name: Ada, age: 36 }
      - digest: 01af
        bins: { blob: { type: Buffer, data: [1, 2] } }
  inventory: {}
"#;

        // when
        let cluster = InMemoryCluster::from_yaml(yaml).unwrap();

        // then
        assert_eq!(cluster.build, "7.1.0");
        assert!(cluster.namespaces["inventory"].is_empty());
        let profiles = &cluster.namespaces["users"]["profiles"];
        assert_eq!(profiles[0].bins["age"], BinValue::Int(36));
        assert_eq!(
            profiles[1].key,
            RecordKey::Bytes(Bytes::from_static(&[0x01, 0xaf]))
        );
        assert_eq!(
            profiles[1].bins["blob"],
            BinValue::Bytes(Bytes::from_static(&[1, 2]))
        );
    }

    #[test]
    fn should_reject_fixture_record_without_identity() {
        // given
        let yaml = "namespaces: { test: { s: [ { bins: { a: 1 } } ] } }";

        // when
        let result = InMemoryCluster::from_yaml(yaml);

        // then
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
