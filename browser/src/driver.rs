//! The cluster driver boundary.
//!
//! The browser does not talk to cluster nodes itself. A [`ClusterDriver`]
//! answers info commands and runs bounded scans, and a [`Connector`] opens
//! drivers. This module also holds the parsing of info command output into
//! namespaces, set descriptors and cluster statistics.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cursor::ScanCursor;
use crate::error::{Error, Result};
use crate::model::{ClusterStats, RecordEntry, SetDescriptor};

/// One page of a driver scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPage {
    /// Records in driver-reported order.
    pub records: Vec<RecordEntry>,
    /// State to resume from, or `None` once the scan is exhausted.
    pub cursor: Option<ScanCursor>,
}

/// Operations the browser needs from a connected cluster.
///
/// Implementors provide the raw [`info`](ClusterDriver::info) command and the
/// paginated [`scan_page`](ClusterDriver::scan_page) primitive. Namespace,
/// set and statistics lookups are built on top of `info` and may be
/// overridden by drivers that have a cheaper way to answer them.
#[async_trait]
pub trait ClusterDriver: Send + Sync {
    /// Sends an info command to any node and returns its raw response.
    async fn info(&self, command: &str) -> Result<String>;

    /// Fetches up to `limit` records of `namespace`/`set`.
    ///
    /// A `None` cursor starts a new scan. The returned page carries the cursor
    /// to resume from, or `None` when the scan is exhausted.
    async fn scan_page(
        &self,
        namespace: &str,
        set: &str,
        cursor: Option<ScanCursor>,
        limit: usize,
    ) -> Result<ScanPage>;

    /// Releases the driver's connection to the cluster.
    async fn close(&self) {}

    /// Lists namespace names.
    async fn fetch_namespaces(&self) -> Result<Vec<String>> {
        let info = self.info("namespaces").await?;
        tracing::debug!(raw = %info, "namespaces info");
        Ok(parse_namespaces(&info))
    }

    /// Lists the sets of a namespace.
    async fn fetch_sets(&self, namespace: &str) -> Result<Vec<SetDescriptor>> {
        let info = self.info(&format!("sets/{}", namespace)).await?;
        tracing::debug!(namespace, raw = %info, "sets info");
        Ok(parse_sets(namespace, &info))
    }

    /// Collects build version, uptime and total object count.
    ///
    /// The object count is the sum of `objects` over each namespace's
    /// `namespace/<name>` info.
    async fn fetch_stats(&self) -> Result<ClusterStats> {
        let (build, statistics, namespaces) = futures::try_join!(
            self.info("build"),
            self.info("statistics"),
            self.fetch_namespaces(),
        )?;
        let namespace_infos = futures::future::try_join_all(
            namespaces
                .iter()
                .map(|ns| async move { self.info(&format!("namespace/{}", ns)).await }),
        )
        .await?;
        Ok(ClusterStats {
            version: build.trim().to_string(),
            uptime: find_u64(&statistics, "uptime").unwrap_or(0),
            total_objects: namespace_infos
                .iter()
                .filter_map(|info| find_u64(info, "objects"))
                .sum(),
        })
    }
}

/// Parameters for opening a cluster connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    /// Connect through the nodes' alternate access addresses.
    pub use_alternate: bool,
}

impl ConnectParams {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() || self.port == 0 {
            return Err(Error::InvalidInput(
                "Host and port are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Opens cluster drivers.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, params: &ConnectParams) -> Result<Arc<dyn ClusterDriver>>;
}

/// Parses the response of the `namespaces` info command.
///
/// The response is a `;`-separated list. Depending on the node, each element
/// may be prefixed by the command name and a tab; the prefix is dropped, as is
/// the bare `namespaces` token.
pub fn parse_namespaces(info: &str) -> Vec<String> {
    info.split(';')
        .map(|part| match part.split_once('\t') {
            Some((_, name)) => name.trim(),
            None => part.trim(),
        })
        .filter(|name| !name.is_empty() && *name != "namespaces")
        .map(str::to_string)
        .collect()
}

/// Parses the response of the `sets/<namespace>` info command.
///
/// Each `;`-separated entry is a `:`-separated list of `key=value` pairs,
/// e.g. `ns=test:set=users:objects=12:data_used_bytes=4096`. Entries without a
/// `set` field, and internal sets whose name starts with `<`, are skipped.
pub fn parse_sets(namespace: &str, info: &str) -> Vec<SetDescriptor> {
    info.split(';')
        .filter_map(|entry| {
            let mut name = None;
            let mut objects = 0;
            let mut data_used_bytes = 0;
            for (key, value) in entry.split(':').filter_map(|kv| kv.split_once('=')) {
                match key.trim() {
                    "set" | "set_name" => name = Some(value.trim()),
                    "objects" | "n_objects" => objects = value.trim().parse().unwrap_or(0),
                    "data_used_bytes" => data_used_bytes = value.trim().parse().unwrap_or(0),
                    _ => {}
                }
            }
            let name = name.filter(|n| !n.is_empty() && !n.starts_with('<'))?;
            Some(SetDescriptor {
                namespace: namespace.to_string(),
                name: name.to_string(),
                objects,
                data_used_bytes,
            })
        })
        .collect()
}

/// Finds `key=<n>` in an info string and parses `n`.
fn find_u64(info: &str, key: &str) -> Option<u64> {
    info.split([';', ':', '\t'])
        .filter_map(|kv| kv.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .and_then(|(_, v)| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("test;users", vec!["test", "users"])]
    #[case::tab_prefixed("namespaces\ttest;namespaces\tusers", vec!["test", "users"])]
    #[case::trailing_separator("test;users;", vec!["test", "users"])]
    #[case::bare_command("namespaces", vec![])]
    #[case::empty("", vec![])]
    fn should_parse_namespaces(#[case] info: &str, #[case] expected: Vec<&str>) {
        // when
        let namespaces = parse_namespaces(info);

        // then
        assert_eq!(namespaces, expected);
    }

    #[test]
    fn should_parse_set_descriptors() {
        // given
        let info = "ns=users:set=profiles:objects=250:tombstones=0:data_used_bytes=51200;\
                    ns=users:set=activity_log:objects=7:data_used_bytes=896;";

        // when
        let sets = parse_sets("users", info);

        // then
        assert_eq!(
            sets,
            vec![
                SetDescriptor {
                    namespace: "users".to_string(),
                    name: "profiles".to_string(),
                    objects: 250,
                    data_used_bytes: 51200,
                },
                SetDescriptor {
                    namespace: "users".to_string(),
                    name: "activity_log".to_string(),
                    objects: 7,
                    data_used_bytes: 896,
                },
            ]
        );
    }

    #[test]
    fn should_skip_internal_and_nameless_sets() {
        // given
        let info = "ns=test:set=<ERROR>:objects=1;ns=test:objects=3;ns=test:set=events";

        // when
        let sets = parse_sets("test", info);

        // then
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, "events");
        assert_eq!(sets[0].objects, 0);
        assert_eq!(sets[0].data_used_bytes, 0);
    }

    #[test]
    fn should_find_numeric_fields() {
        // given
        let statistics = "cluster_size=3;uptime=86400;objects=12";

        // when/then
        assert_eq!(find_u64(statistics, "uptime"), Some(86400));
        assert_eq!(find_u64(statistics, "missing"), None);
    }

    #[rstest]
    #[case::empty_host("", 3000)]
    #[case::blank_host("   ", 3000)]
    #[case::zero_port("localhost", 0)]
    fn should_reject_incomplete_connect_params(#[case] host: &str, #[case] port: u16) {
        // given
        let params = ConnectParams {
            host: host.to_string(),
            port,
            use_alternate: false,
        };

        // when
        let result = params.validate();

        // then
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
