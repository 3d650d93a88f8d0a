//! Configuration for the HMS client
//!
//! Library callers build a [`ClientConfig`] directly or from the environment.
//! The binary parses [`Args`] with clap, which layers CLI flags over the same
//! environment variables.

use crate::error::{ClientError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Origin used when `HMS_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://localhost:8001";

/// Environment variable overriding the API origin
pub const API_URL_ENV: &str = "HMS_API_URL";

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Connection settings for [`crate::ApiClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API origin, e.g. `http://localhost:8001`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    /// Create config with an explicit origin
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url.trim().to_string();
            }
        }

        if let Ok(val) = std::env::var("HMS_REQUEST_TIMEOUT_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                config.timeout = Duration::from_millis(ms);
            }
        }

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("invalid API origin {}: {}", self.base_url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "API origin must be http or https, got {}",
                url.scheme()
            )));
        }

        if self.timeout.is_zero() {
            return Err(ClientError::Config("request timeout must be non-zero".to_string()));
        }

        Ok(())
    }
}

/// hms-client - command line access to the HMS REST API
#[derive(Parser, Debug, Clone)]
#[command(name = "hms-client")]
#[command(about = "Authenticated command line client for the hospital management API")]
pub struct Args {
    /// API origin
    #[arg(long, env = "HMS_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// File holding the persisted session (token and user)
    #[arg(long, env = "HMS_SESSION_FILE", default_value = ".hms-session.json")]
    pub session_file: PathBuf,

    /// Request timeout in milliseconds
    #[arg(long, env = "HMS_REQUEST_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Binary subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in and persist the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "HMS_PASSWORD")]
        password: String,
    },
    /// Clear the persisted session
    Logout,
    /// Show the stored user
    Whoami,
    /// Insurance claims
    #[command(subcommand)]
    Claims(ClaimsCommand),
    /// Server-side search over a list endpoint
    Search {
        /// Endpoint path, e.g. /api/patients
        endpoint: String,
        /// Search term (empty lists everything)
        #[arg(default_value = "")]
        term: String,
    },
    /// Fetch a list and filter it locally
    Filter {
        /// Endpoint path, e.g. /api/users
        endpoint: String,
        /// Search term
        term: String,
        /// Fields to match against (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "name")]
        fields: Vec<String>,
    },
}

/// Claims subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ClaimsCommand {
    /// List claims
    List,
    /// Submit a claim
    Create {
        #[arg(long)]
        patient_id: i64,
        #[arg(long)]
        scheme: String,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change a claim's status or outcome
    Update {
        id: i64,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        outcome: Option<String>,
    },
    /// Delete a claim
    Delete { id: i64 },
}

impl Args {
    /// Client configuration derived from the arguments
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_origin() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_origin() {
        assert!(ClientConfig::new("not a url").validate().is_err());
        assert!(ClientConfig::new("ftp://example.com").validate().is_err());
        assert!(ClientConfig::new("https://hms.example.com").validate().is_ok());
    }

    #[test]
    fn test_args_parse_claims_update() {
        let args = Args::parse_from([
            "hms-client",
            "--api-url",
            "http://api.test",
            "claims",
            "update",
            "7",
            "--status",
            "approved",
        ]);
        assert_eq!(args.client_config().base_url, "http://api.test");
        match args.command {
            Command::Claims(ClaimsCommand::Update { id, status, .. }) => {
                assert_eq!(id, 7);
                assert_eq!(status.as_deref(), Some("approved"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
