//! HTTP response bodies.

use serde::Serialize;

use crate::model::{DisplayRecord, Namespace, SetDescriptor};
use crate::scan::Page;

/// `{"message": ...}`, used for errors and lifecycle acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NamespacesResponse {
    pub namespaces: Vec<String>,
}

impl From<Vec<Namespace>> for NamespacesResponse {
    fn from(namespaces: Vec<Namespace>) -> Self {
        Self {
            namespaces: namespaces.into_iter().map(|ns| ns.name).collect(),
        }
    }
}

/// One set in a sets listing.
#[derive(Debug, Clone, Serialize)]
pub struct SetEntry {
    pub name: String,
    pub objects: u64,
    pub data_used_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetsResponse {
    pub sets: Vec<SetEntry>,
}

impl From<&[SetDescriptor]> for SetsResponse {
    fn from(sets: &[SetDescriptor]) -> Self {
        Self {
            sets: sets
                .iter()
                .map(|s| SetEntry {
                    name: s.name.clone(),
                    objects: s.objects,
                    data_used_bytes: s.data_used_bytes,
                })
                .collect(),
        }
    }
}

/// One page of records. `nextCursor` is `null` on the last page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsResponse {
    pub records: Vec<DisplayRecord>,
    pub next_cursor: Option<String>,
    /// Bin names seen in this page, in first-seen order.
    pub bins: Vec<String>,
}

impl From<Page> for RecordsResponse {
    fn from(page: Page) -> Self {
        let bins = page.bins();
        Self {
            records: page.records,
            next_cursor: page.next_cursor,
            bins,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}
