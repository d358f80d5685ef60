//! Browser HTTP server binary entry point.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use browser::config::load_config;
use browser::server::{BrowserServer, CliArgs, ServerConfig};
use browser::{
    Browser, BrowserConfig, ClusterConfig, GeminiSummarizer, InMemoryCluster, InMemoryConnector,
    SchemaSampler, Summarizer,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => load_config(path).expect("Failed to load configuration"),
        None => BrowserConfig::default(),
    };
    tracing::info!("Starting browser with config: {:?}", config);

    let cluster = match &config.cluster {
        ClusterConfig::InMemory { fixture: Some(path) } => {
            InMemoryCluster::from_fixture(path).expect("Failed to load cluster fixture")
        }
        ClusterConfig::InMemory { fixture: None } => InMemoryCluster::new(),
    };

    let summarizer: Option<Arc<dyn Summarizer>> = match &args.api_key {
        Some(key) if !key.is_empty() => Some(Arc::new(
            GeminiSummarizer::new(
                config.summary.endpoint.clone(),
                config.summary.model.clone(),
                key.clone(),
                config.summary.timeout(),
            )
            .expect("Failed to create summarizer"),
        )),
        _ => {
            tracing::warn!("API_KEY is not set, schema summaries are disabled");
            None
        }
    };

    let browser = Browser::new(
        Arc::new(InMemoryConnector::new(cluster)),
        SchemaSampler::new(summarizer, config.summary.sample_size),
        config.scan.clone(),
    );

    let server = BrowserServer::new(Arc::new(browser), ServerConfig::from(&args));
    server.run().await.expect("Server failed");
}
