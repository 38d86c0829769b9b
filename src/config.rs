//! Configuration management for the asset depot.
//!
//! Configuration is an explicit struct parsed once in `main` from
//! command-line arguments and environment variables, then passed by
//! reference to the components that need it. There is no global lookup.
//!
//! # Environment Variables
//!
//! All options can be set via environment variables with the `DEPOT_`
//! prefix:
//!
//! - `DEPOT_HOST` - Server bind address (default: 0.0.0.0)
//! - `DEPOT_PORT` - Server port (default: 3000)
//! - `DEPOT_API_KEY` - API key clients send in the authorization header
//! - `DEPOT_SECRET` - Shared secret for HMAC signatures
//! - `DEPOT_SEPARATOR` - Separator between signature message elements
//! - `DEPOT_HEADER_SEPARATOR` - Separator inside the authorization header
//! - `DEPOT_HASH_FUNCTION` - Signature hash function (SHA256 or SHA512)
//! - `DEPOT_REQUEST_EXP_TIME` - Replay window, e.g. "30s" or "1h 20m 45s"
//! - `DEPOT_REPOSITORY_CONFIG` - Path to the repository stack YAML file
//! - `DEPOT_ALLOWED_HOSTS` - Remote addresses allowed to upload

use std::net::IpAddr;

use clap::Parser;

use crate::auth::signature::HashFunction;
use crate::interval::Duration;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default separator between signature message elements.
pub const DEFAULT_SEPARATOR: &str = "|";

/// Default separator between key and signature in the authorization header.
pub const DEFAULT_HEADER_SEPARATOR: &str = ":";

/// Default signature hash function.
pub const DEFAULT_HASH_FUNCTION: &str = "SHA512";

/// Default replay window.
pub const DEFAULT_REQUEST_EXP_TIME: &str = "30s";

/// Default path of the repository stack configuration file.
pub const DEFAULT_REPOSITORY_CONFIG: &str = "config/repositories.yaml";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Asset Depot - an authenticated upload gateway for asset repositories.
///
/// Ingests files over signed HTTP requests, fans them out to configured
/// storage repositories, and serves stored assets via image-API redirects.
#[derive(Parser, Debug, Clone)]
#[command(name = "asset-depot")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "DEPOT_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "DEPOT_PORT")]
    pub port: u16,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// API key upload clients must present.
    #[arg(long, env = "DEPOT_API_KEY")]
    pub api_key: String,

    /// Shared secret for HMAC signature verification.
    #[arg(long, env = "DEPOT_SECRET")]
    pub secret: String,

    /// Separator joining the elements of the signed message.
    #[arg(long, default_value = DEFAULT_SEPARATOR, env = "DEPOT_SEPARATOR")]
    pub separator: String,

    /// Separator between the API key and the signature in the
    /// authorization header.
    #[arg(long, default_value = DEFAULT_HEADER_SEPARATOR, env = "DEPOT_HEADER_SEPARATOR")]
    pub header_separator: String,

    /// Hash function for HMAC signatures (SHA256 or SHA512).
    #[arg(long, default_value = DEFAULT_HASH_FUNCTION, env = "DEPOT_HASH_FUNCTION")]
    pub hash_function: String,

    // =========================================================================
    // Replay Window Configuration
    // =========================================================================
    /// How long a request timestamp stays fresh, in `h m s` notation
    /// (e.g. "30s", "1h 20m 45s").
    #[arg(long, default_value = DEFAULT_REQUEST_EXP_TIME, env = "DEPOT_REQUEST_EXP_TIME")]
    pub request_exp_time: String,

    // =========================================================================
    // Repository Configuration
    // =========================================================================
    /// Path to the repository stack configuration file (YAML).
    #[arg(long, default_value = DEFAULT_REPOSITORY_CONFIG, env = "DEPOT_REPOSITORY_CONFIG")]
    pub repository_config: String,

    // =========================================================================
    // Access Configuration
    // =========================================================================
    /// Remote addresses allowed to upload (comma-separated).
    ///
    /// If not specified, any host may upload.
    #[arg(long, env = "DEPOT_ALLOWED_HOSTS", value_delimiter = ',')]
    pub allowed_hosts: Option<Vec<IpAddr>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("API key is required. Set --api-key or DEPOT_API_KEY".to_string());
        }
        if self.secret.is_empty() {
            return Err("HMAC secret is required. Set --secret or DEPOT_SECRET".to_string());
        }
        if self.separator.is_empty() {
            return Err("Element separator must not be empty".to_string());
        }
        if self.header_separator.is_empty() {
            return Err("Header separator must not be empty".to_string());
        }
        if self.hash_function.parse::<HashFunction>().is_err() {
            return Err(format!(
                "Unknown hash function: {} (expected SHA256 or SHA512)",
                self.hash_function
            ));
        }
        if Duration::in_seconds(&self.request_exp_time).is_err() {
            return Err(format!(
                "Cannot parse request expiration time: {} (use e.g. \"30s\" or \"1h 20m 45s\")",
                self.request_exp_time
            ));
        }
        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured hash function (call `validate()` first).
    pub fn parsed_hash_function(&self) -> HashFunction {
        self.hash_function.parse().unwrap_or_default()
    }

    /// The replay window in seconds (call `validate()` first).
    pub fn replay_window_secs(&self) -> u64 {
        Duration::in_seconds(&self.request_exp_time).unwrap_or(30)
    }
}

// =============================================================================
// Tests
// =============================================================================
