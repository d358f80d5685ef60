//! Command-line arguments and server configuration.

use clap::Parser;

/// CLI arguments for the browser server.
#[derive(Parser, Debug)]
#[command(name = "browser")]
#[command(about = "Browse a clustered key-value store's namespaces, sets and records")]
pub struct CliArgs {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "BROWSER_CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "BROWSER_PORT")]
    pub port: u16,

    /// API key for the schema summarizer; summaries are disabled without one
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl From<&CliArgs> for ServerConfig {
    fn from(args: &CliArgs) -> Self {
        Self { port: args.port }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_cli_args() {
        // given
        let argv = ["browser", "-c", "browser.yaml", "--port", "9000", "--api-key", "k"];

        // when
        let args = CliArgs::try_parse_from(argv).unwrap();

        // then
        assert_eq!(args.config.as_deref(), Some("browser.yaml"));
        assert_eq!(args.api_key.as_deref(), Some("k"));
        assert_eq!(ServerConfig::from(&args).port, 9000);
    }
}
