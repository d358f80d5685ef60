//! Paginated, resumable set scans.
//!
//! A [`ScanSession`] walks one set page by page. Each page is bounded by the
//! session's page size and carries the cursor token to resume from. The scan
//! is over when the driver stops returning a cursor; a page may be non-empty
//! and still be the last one, so callers must stop on a missing cursor rather
//! than on an empty page.
//!
//! # States
//!
//! ```text
//! Idle -> Fetching -> PageReady | Exhausted | Failed
//! PageReady -> Fetching
//! ```
//!
//! `Exhausted` and `Failed` are terminal. Failures are not retried here.
//!
//! Records within a page keep the driver's order. No order is promised across
//! pages. Resuming from cursors visits each record at most once while the set
//! is not being modified.

use std::sync::Arc;

use crate::cursor::{self, ScanCursor};
use crate::driver::ClusterDriver;
use crate::error::{Error, Result};
use crate::model::DisplayRecord;
use crate::normalize::{normalize_record, page_bins};

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// One page of a scan, in display form.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Normalized records in driver order.
    pub records: Vec<DisplayRecord>,
    /// Token to request the next page with, or `None` if this page is the last.
    pub next_cursor: Option<String>,
}

impl Page {
    /// Returns true if no further pages exist.
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }

    /// Union of bin names across the page's records.
    pub fn bins(&self) -> Vec<String> {
        page_bins(&self.records)
    }
}

/// Lifecycle of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Fetching,
    PageReady,
    Exhausted,
    Failed,
}

/// A scan over one set.
pub struct ScanSession {
    driver: Arc<dyn ClusterDriver>,
    namespace: String,
    set: String,
    page_size: usize,
    cursor: Option<ScanCursor>,
    state: ScanState,
    pages: u64,
}

impl ScanSession {
    /// Starts a scan from the beginning of the set.
    pub fn start(
        driver: Arc<dyn ClusterDriver>,
        namespace: impl Into<String>,
        set: impl Into<String>,
        page_size: usize,
    ) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidInput(
                "page size must be positive".to_string(),
            ));
        }
        Ok(Self {
            driver,
            namespace: namespace.into(),
            set: set.into(),
            page_size,
            cursor: None,
            state: ScanState::Idle,
            pages: 0,
        })
    }

    /// Resumes a scan from a cursor token returned with an earlier page.
    ///
    /// Fails with [`Error::MalformedCursor`] if the token does not decode.
    pub fn resume(
        driver: Arc<dyn ClusterDriver>,
        namespace: impl Into<String>,
        set: impl Into<String>,
        token: &str,
        page_size: usize,
    ) -> Result<Self> {
        let cursor = cursor::decode(token)?;
        let mut session = Self::start(driver, namespace, set, page_size)?;
        session.cursor = Some(cursor);
        session.state = ScanState::PageReady;
        Ok(session)
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Number of pages fetched by this session.
    pub fn pages(&self) -> u64 {
        self.pages
    }

    /// Fetches the next page.
    ///
    /// Returns `Ok(None)` once the scan is exhausted. A session that failed
    /// keeps failing; start a new one (or resume from the last good token) to
    /// try again.
    #[tracing::instrument(
        level = "debug",
        skip(self),
        fields(namespace = %self.namespace, set = %self.set, page = self.pages)
    )]
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        match self.state {
            ScanState::Exhausted => return Ok(None),
            ScanState::Failed => {
                return Err(Error::Scan(format!(
                    "scan of {}/{} already failed",
                    self.namespace, self.set
                )));
            }
            // A fetch that was abandoned mid-flight left the cursor untouched,
            // so it is safe to issue it again.
            ScanState::Idle | ScanState::PageReady | ScanState::Fetching => {}
        }

        self.state = ScanState::Fetching;
        let result = self
            .driver
            .scan_page(&self.namespace, &self.set, self.cursor.clone(), self.page_size)
            .await;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.state = ScanState::Failed;
                tracing::warn!(error = %e, "scan page fetch failed");
                return Err(into_scan_error(e));
            }
        };

        let next_cursor = match &page.cursor {
            Some(cursor) => match cursor::encode(cursor) {
                Ok(token) => Some(token),
                Err(e) => {
                    self.state = ScanState::Failed;
                    return Err(e);
                }
            },
            None => None,
        };

        self.pages += 1;
        self.state = if page.cursor.is_some() {
            ScanState::PageReady
        } else {
            ScanState::Exhausted
        };
        self.cursor = page.cursor;

        let records: Vec<DisplayRecord> = page.records.iter().map(normalize_record).collect();
        tracing::debug!(records = records.len(), last = next_cursor.is_none(), "scan page ready");
        Ok(Some(Page {
            records,
            next_cursor,
        }))
    }
}

/// Fetches one page of `namespace`/`set`.
///
/// With no token a new scan starts at the beginning of the set; otherwise the
/// scan resumes from the token. This is the stateless form used by request
/// handlers, where the token is the only state carried between pages.
pub async fn start_or_continue(
    driver: Arc<dyn ClusterDriver>,
    namespace: &str,
    set: &str,
    token: Option<&str>,
    page_size: usize,
) -> Result<Page> {
    let mut session = match token {
        None => ScanSession::start(driver, namespace, set, page_size)?,
        Some(token) => ScanSession::resume(driver, namespace, set, token, page_size)?,
    };
    session
        .next_page()
        .await?
        .ok_or_else(|| Error::Internal("fresh scan session reported exhaustion".to_string()))
}

/// Driver failures during a scan surface as scan errors; protocol errors
/// (no session, bad cursor) keep their own kind.
fn into_scan_error(err: Error) -> Error {
    match err {
        e @ (Error::NotConnected | Error::MalformedCursor(_) | Error::Scan(_)) => e,
        Error::Driver(msg) | Error::Internal(msg) | Error::InvalidInput(msg) => Error::Scan(msg),
        other => Error::Scan(other.to_string()),
    }
}
