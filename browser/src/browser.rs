//! The cluster session and its lifecycle.
//!
//! A [`Browser`] holds at most one live session. Connecting creates the
//! session together with a fresh [`MetadataCache`]; disconnecting closes the
//! driver and drops the cache with it, so cached listings never outlive the
//! connection they were fetched over.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::MetadataCache;
use crate::config::ScanConfig;
use crate::driver::{ClusterDriver, ConnectParams, Connector};
use crate::error::{Error, Result};
use crate::model::{ClusterStats, DisplayRecord, Namespace, SetDescriptor};
use crate::sampler::SchemaSampler;
use crate::scan::{self, Page};

/// Result of a connect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    /// A session already existed and was kept.
    AlreadyConnected,
}

struct Session {
    params: ConnectParams,
    driver: Arc<dyn ClusterDriver>,
    cache: MetadataCache,
}

/// Entry point for every browsing operation.
pub struct Browser {
    connector: Arc<dyn Connector>,
    sampler: SchemaSampler,
    scan: ScanConfig,
    session: RwLock<Option<Arc<Session>>>,
}

impl Browser {
    pub fn new(connector: Arc<dyn Connector>, sampler: SchemaSampler, scan: ScanConfig) -> Self {
        Self {
            connector,
            sampler,
            scan,
            session: RwLock::new(None),
        }
    }

    /// Opens a session unless one is already live.
    pub async fn connect(&self, params: ConnectParams) -> Result<ConnectOutcome> {
        params.validate()?;
        let mut session = self.session.write().await;
        if let Some(existing) = session.as_ref() {
            tracing::debug!(host = %existing.params.host, "already connected");
            return Ok(ConnectOutcome::AlreadyConnected);
        }

        let driver = self.connector.connect(&params).await.inspect_err(|e| {
            tracing::error!(host = %params.host, port = params.port, error = %e, "connect failed");
        })?;
        tracing::info!(host = %params.host, port = params.port, "connected to cluster");
        *session = Some(Arc::new(Session {
            cache: MetadataCache::new(driver.clone()),
            driver,
            params,
        }));
        Ok(ConnectOutcome::Connected)
    }

    /// Closes the live session, if any. Returns whether one was closed.
    pub async fn disconnect(&self) -> bool {
        let Some(session) = self.session.write().await.take() else {
            return false;
        };
        session.driver.close().await;
        tracing::info!(host = %session.params.host, "disconnected from cluster");
        true
    }

    pub async fn is_connected(&self) -> bool {
        self.session.read().await.is_some()
    }

    async fn session(&self) -> Result<Arc<Session>> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(Error::NotConnected)
    }

    pub async fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        self.session().await?.cache.list_namespaces().await
    }

    /// Lists the sets of `namespace`, served from the session's cache after
    /// the first call.
    pub async fn list_sets(&self, namespace: &str) -> Result<Arc<Vec<SetDescriptor>>> {
        self.session().await?.cache.list_sets(namespace).await
    }

    /// Fetches one page of records.
    ///
    /// `token` is the cursor returned with the previous page, or `None` to
    /// start at the beginning of the set.
    pub async fn records(
        &self,
        namespace: &str,
        set: &str,
        token: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Page> {
        let session = self.session().await?;
        let page_size = self.scan.page_size_for(limit);
        scan::start_or_continue(session.driver.clone(), namespace, set, token, page_size).await
    }

    pub async fn stats(&self) -> Result<ClusterStats> {
        self.session().await?.driver.fetch_stats().await
    }

    /// Summarizes the schema of records the caller already holds. Does not
    /// need a live session.
    pub async fn summarize_schema(
        &self,
        records: &[DisplayRecord],
        set_name: &str,
    ) -> Result<String> {
        self.sampler.summarize(records, set_name).await
    }
}
