use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fallback base address: a same-origin proxy path. Deployments point
/// PARTILIO_API_BASE_URL at the real backend; the relative default avoids
/// cross-origin traffic when the client sits behind the app's own proxy.
pub const DEFAULT_API_BASE_URL: &str = "/api";

/// Partilio client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base address of the Partilio backend API
    #[arg(short = 'u', long, env = "PARTILIO_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Path to the credential store
    #[arg(short = 'c', long, env = "PARTILIO_CREDENTIALS_FILE")]
    pub credentials_file: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "10")]
    pub http_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI operations, each mapping onto one session-pipeline call
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Sign in and persist the session
    Login {
        /// Account email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Create an account and persist the session
    Register,
    /// Invalidate the session locally and (best effort) on the backend
    Logout,
    /// Show the authenticated user's profile
    Profile,
    /// Show the expense dashboard
    Dashboard {
        /// Month to summarize (1-12), requires --year
        #[arg(short, long)]
        month: Option<u32>,
        /// Year to summarize, requires --month
        #[arg(short, long)]
        year: Option<i32>,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Backend base address; paths like `/auth/login` are appended to it
    pub api_base_url: String,

    /// SQLite file holding the persisted credentials
    pub credentials_file: PathBuf,

    /// Per-request timeout in seconds
    pub http_request_timeout: u64,

    pub log_level: String,
}

impl Config {
    /// Load configuration with priority: CLI > ENV > defaults
    pub fn load() -> Result<(Self, Option<Command>)> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let config = Self::from_args(&args);
        Ok((config, args.command.clone()))
    }

    /// Build a config from parsed arguments (separated for tests)
    pub fn from_args(args: &CliArgs) -> Self {
        Config {
            api_base_url: args
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),

            credentials_file: args
                .credentials_file
                .as_deref()
                .map(expand_tilde)
                .unwrap_or_else(default_credentials_file),

            http_request_timeout: args.http_timeout,

            log_level: args.log_level.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            credentials_file: default_credentials_file(),
            http_request_timeout: 10,
            log_level: "info".to_string(),
        }
    }
}

/// Default location of the credential store, under the platform data dir
fn default_credentials_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("partilio")
        .join("credentials.sqlite3")
}

/// Expand tilde (~) in file paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/partilio/creds.sqlite3");
        assert!(path.to_string_lossy().contains("partilio/creds.sqlite3"));
        assert!(!path.to_string_lossy().starts_with("~"));

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_tilde_relative_path() {
        let path = expand_tilde("relative/path");
        assert_eq!(path, PathBuf::from("relative/path"));
    }

    #[test]
    fn test_expand_tilde_just_tilde() {
        // Just "~" without slash should not expand
        let path = expand_tilde("~");
        assert_eq!(path, PathBuf::from("~"));
    }

    #[test]
    fn test_default_base_url() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "/api");
        assert_eq!(config.http_request_timeout, 10);
    }

    #[test]
    fn test_default_credentials_file_location() {
        let path = default_credentials_file();
        assert!(path.ends_with("partilio/credentials.sqlite3"));
    }
}
