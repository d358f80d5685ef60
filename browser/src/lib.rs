//! Browser - explore a clustered key-value store over HTTP.
//!
//! The store is organized as namespaces holding named sets of records, where
//! each record is a key plus a sparse map of bins. This crate lets a web UI
//! walk that hierarchy: list namespaces, list the sets of a namespace, page
//! through a set's records, and ask for a prose summary of a set's schema.
//!
//! # Components
//!
//! - **Browser**: the session object. Created empty; `connect` opens a
//!   session and its metadata cache, `disconnect` tears both down.
//! - **MetadataCache**: memoizes set listings per namespace and collapses
//!   concurrent fetches for the same namespace into one.
//! - **ScanSession**: walks a set one bounded page at a time. Pages are
//!   chained by opaque cursor tokens that the client hands back unchanged.
//! - **SchemaSampler**: sends a small prefix of fetched records to a
//!   [`Summarizer`].
//! - **ClusterDriver**: the boundary to the cluster itself. An in-memory
//!   implementation is provided for development and tests.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use browser::{Browser, ConnectParams, InMemoryCluster, InMemoryConnector};
//! use browser::{SchemaSampler, ScanConfig};
//!
//! let connector = InMemoryConnector::new(InMemoryCluster::from_fixture("fixtures/sample.yaml")?);
//! let browser = Browser::new(Arc::new(connector), SchemaSampler::new(None, 10), ScanConfig::default());
//! browser.connect(ConnectParams { host: "localhost".into(), port: 3000, use_alternate: false }).await?;
//!
//! let mut page = browser.records("users", "profiles", None, None).await?;
//! while let Some(token) = page.next_cursor.clone() {
//!     page = browser.records("users", "profiles", Some(&token), None).await?;
//! }
//! ```

mod browser;
mod cache;
pub mod config;
pub mod cursor;
mod driver;
mod error;
mod gemini;
mod memory;
mod model;
pub mod normalize;
mod sampler;
mod scan;
#[cfg(feature = "http-server")]
pub mod server;

pub use browser::{Browser, ConnectOutcome};
pub use cache::MetadataCache;
pub use config::{BrowserConfig, ClusterConfig, ScanConfig, SummaryConfig};
pub use cursor::ScanCursor;
pub use driver::{ClusterDriver, ConnectParams, Connector, ScanPage, parse_namespaces, parse_sets};
pub use error::{Error, Result};
pub use gemini::GeminiSummarizer;
pub use memory::{InMemoryCluster, InMemoryConnector, InMemoryDriver};
pub use model::{
    BinValue, ClusterStats, DisplayRecord, Namespace, RecordEntry, RecordKey, SetDescriptor,
};
pub use sampler::{DEFAULT_SAMPLE_SIZE, EMPTY_SET_MESSAGE, SchemaSampler, Summarizer};
pub use scan::{DEFAULT_PAGE_SIZE, Page, ScanSession, ScanState, start_or_continue};
