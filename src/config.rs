//! Server configuration.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Default edge port, shared by every service.
pub const DEFAULT_EDGE_PORT: u16 = 4566;

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Service names this build knows how to serve.
pub const BLOB_SERVICE: &str = "blob";

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(name = "bluestack")]
#[command(about = "Local Azure-style storage emulator")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the edge server.
    Start(Args),
    /// Print the version number.
    Version,
}

/// Arguments for `start`. Every flag can also come from the environment.
#[derive(Parser, Debug, Clone)]
pub struct Args {
    /// Host address to bind to.
    #[arg(long, env = "EDGE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Edge port that receives requests for every service.
    #[arg(long, env = "EDGE_PORT", default_value_t = DEFAULT_EDGE_PORT)]
    pub port: u16,

    /// Base directory for service data.
    #[arg(long, short = 'l', env = "DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Services to enable, comma separated.
    #[arg(long, env = "ENABLED_SERVICES", value_delimiter = ',', default_value = BLOB_SERVICE)]
    pub enabled_services: Vec<String>,

    /// Log level (debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
}

/// Server configuration derived from command-line arguments.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address to bind to.
    pub host: String,
    /// Edge port.
    pub port: u16,
    /// Base directory for service data.
    pub data_dir: PathBuf,
    /// Enabled service names.
    pub enabled_services: Vec<String>,
    pub log_level: String,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_EDGE_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            enabled_services: vec![BLOB_SERVICE.to_string()],
            log_level: "info".to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let enabled_services = args
            .enabled_services
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host: args.host,
            port: args.port,
            data_dir: args.data_dir,
            enabled_services,
            log_level: args.log_level,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
        }
    }
}

/// Configuration rejected by [`Config::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid EDGE_PORT: {0} (must be 1-65535)")]
    InvalidPort(u16),
    #[error("DATA_DIR cannot be empty")]
    EmptyDataDir,
    #[error("ENABLED_SERVICES must name at least one service")]
    NoServices,
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

impl Config {
    /// Checks settings that the argument parser cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }
        if self.enabled_services.is_empty() {
            return Err(ConfigError::NoServices);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Returns whether the named service is enabled.
    pub fn is_service_enabled(&self, name: &str) -> bool {
        self.enabled_services.iter().any(|s| s == name)
    }

    /// Returns the bind address for the edge server.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Start(args) => Config::from(args),
            Command::Version => panic!("expected start"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["bluestack", "start"]);
        assert_eq!(config.port, DEFAULT_EDGE_PORT);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.enabled_services, vec!["blob".to_string()]);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enabled_services_list() {
        let config = parse(&[
            "bluestack",
            "start",
            "--enabled-services",
            "blob, queue,,keyvault",
        ]);
        assert_eq!(config.enabled_services, vec!["blob", "queue", "keyvault"]);
        assert!(config.is_service_enabled("queue"));
        assert!(!config.is_service_enabled("table"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            port: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPort(0))));

        let config = Config {
            data_dir: PathBuf::new(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyDataDir)));

        let config = Config {
            enabled_services: Vec::new(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoServices)));
    }

    #[test]
    fn test_version_subcommand() {
        let cli = Cli::try_parse_from(["bluestack", "version"]).unwrap();
        assert!(matches!(cli.command, Command::Version));
    }
}
