//! HTTP request types.

use serde::Deserialize;

use crate::driver::ConnectParams;
use crate::model::DisplayRecord;

/// Body of `POST /api/connect`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub use_alternate: bool,
}

impl From<ConnectRequest> for ConnectParams {
    fn from(request: ConnectRequest) -> Self {
        ConnectParams {
            host: request.host,
            port: request.port,
            use_alternate: request.use_alternate,
        }
    }
}

/// Query parameters for `GET /api/namespaces/{namespace}/sets/{set}/records`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordsParams {
    /// Cursor returned with the previous page. Also accepted as `nextToken`.
    #[serde(default, alias = "nextToken")]
    pub cursor: Option<String>,
    /// Page size; bounded by the server's maximum.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl RecordsParams {
    /// The cursor token, treating an empty value as absent.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Body of `POST /api/schema-summary`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    #[serde(default)]
    pub records: Vec<DisplayRecord>,
    pub set_name: String,
}
