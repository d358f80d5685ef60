//! HTTP server exposing the browser to a web UI.
//!
//! All API routes live under `/api` and answer with JSON. Failures carry a
//! `{"message": ...}` body with a 4xx status for caller mistakes (no session,
//! bad cursor, bad input) and a 5xx status for collaborator failures.

mod config;
mod error;
pub mod handlers;
mod http;
pub mod metrics;
mod middleware;
pub mod request;
pub mod response;

pub use config::{CliArgs, ServerConfig};
pub use error::ApiError;
pub use http::{BrowserServer, router};
