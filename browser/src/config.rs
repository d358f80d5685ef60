//! Configuration for the browser.
//!
//! Every field has a default, so an empty YAML document (or no file at all)
//! yields a working configuration over an empty in-memory cluster.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::gemini;
use crate::sampler::DEFAULT_SAMPLE_SIZE;
use crate::scan::DEFAULT_PAGE_SIZE;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
}

/// Page size settings for record scans.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScanConfig {
    /// Page size used when a request does not ask for one.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Upper bound on a requested page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl ScanConfig {
    /// Resolves the page size for a request.
    ///
    /// Requested sizes above `max_page_size` are clamped. A requested size of
    /// zero is passed through and rejected by the scan session.
    pub fn page_size_for(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.page_size)
            .min(self.max_page_size.max(1))
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> usize {
    1000
}

/// Settings for schema summaries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SummaryConfig {
    /// Number of records sent to the summarizer.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the generative language API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SummaryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

fn default_model() -> String {
    gemini::DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    gemini::DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Which cluster the browser connects to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClusterConfig {
    /// An in-process cluster, optionally seeded from a YAML fixture.
    InMemory {
        #[serde(default)]
        fixture: Option<PathBuf>,
    },
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig::InMemory { fixture: None }
    }
}

/// Loads configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BrowserConfig> {
    let contents = std::fs::read_to_string(path.as_ref())
        .map_err(|e| Error::InvalidInput(format!("Failed to read config file: {}", e)))?;
    parse_config(&contents)
}

/// Parses configuration from a YAML string.
pub fn parse_config(yaml: &str) -> Result<BrowserConfig> {
    if yaml.trim().is_empty() {
        return Ok(BrowserConfig::default());
    }
    serde_yaml::from_str(yaml)
        .map_err(|e| Error::InvalidInput(format!("Failed to parse config file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn should_default_every_field() {
        // when
        let config = parse_config("").unwrap();

        // then
        assert_eq!(config.scan.page_size, 100);
        assert_eq!(config.scan.max_page_size, 1000);
        assert_eq!(config.summary.sample_size, 10);
        assert_eq!(config.summary.model, "gemini-2.5-flash");
        assert_eq!(config.summary.timeout(), Duration::from_secs(60));
        assert_eq!(config.cluster, ClusterConfig::InMemory { fixture: None });
    }

    #[test]
    fn should_parse_full_config() {
        // given
        let yaml = r#"
scan:
  page_size: 50
  max_page_size: 200
summary:
  sample_size: 5
  model: gemini-2.5-pro
  timeout_secs: 30
cluster:
  type: InMemory
  fixture: fixtures/sample.yaml
"#;

        // when
        let config = parse_config(yaml).unwrap();

        // then
        assert_eq!(config.scan.page_size, 50);
        assert_eq!(config.scan.max_page_size, 200);
        assert_eq!(config.summary.sample_size, 5);
        assert_eq!(config.summary.model, "gemini-2.5-pro");
        assert_eq!(config.summary.endpoint, gemini::DEFAULT_ENDPOINT);
        assert_eq!(config.summary.timeout_secs, 30);
        assert_eq!(
            config.cluster,
            ClusterConfig::InMemory {
                fixture: Some(PathBuf::from("fixtures/sample.yaml"))
            }
        );
    }

    #[test]
    fn should_reject_unknown_cluster_type() {
        // given
        let yaml = "cluster:\n  type: Remote\n";

        // when
        let result = parse_config(yaml);

        // then
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[rstest]
    #[case::default_size(None, 100)]
    #[case::requested(Some(25), 25)]
    #[case::clamped(Some(5000), 1000)]
    #[case::zero_passes_through(Some(0), 0)]
    fn should_resolve_page_size(#[case] requested: Option<usize>, #[case] expected: usize) {
        // given
        let scan = ScanConfig::default();

        // when/then
        assert_eq!(scan.page_size_for(requested), expected);
    }
}
