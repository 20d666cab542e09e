//! Server configuration module.
//!
//! This module provides configuration loading for the gatehouse server from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `GATEHOUSE_DEBUG`: Enable the debug credential bypass (default: `false`)
//! - `GATEHOUSE_SESSION_SECRET`: Use this literal session secret and skip persistence
//! - `GATEHOUSE_SECRET_DIRECTORY`: Directory holding `session.json` (default: `/var/lib/misc/`)
//! - `GATEHOUSE_LISTEN_PORT`: Port to listen on (default: `8080`)
//! - `GATEHOUSE_PAM_SERVICE`: PAM service used for host logins (default: `system-auth`)
//! - `GATEHOUSE_AUTH_TIMEOUT_SECS`: Deadline for one host identity check (default: `10`)
//!
//! # Invariants
//!
//! - `secret_directory` is always a valid path (may not exist yet)
//! - `secret_override` is never `Some("")`
//! - `auth_timeout` is always greater than zero

use std::path::PathBuf;
use std::time::Duration;

const DEBUG_VAR: &str = "GATEHOUSE_DEBUG";
const SECRET_VAR: &str = "GATEHOUSE_SESSION_SECRET";
const SECRET_DIRECTORY_VAR: &str = "GATEHOUSE_SECRET_DIRECTORY";
const LISTEN_PORT_VAR: &str = "GATEHOUSE_LISTEN_PORT";
const PAM_SERVICE_VAR: &str = "GATEHOUSE_PAM_SERVICE";
const AUTH_TIMEOUT_VAR: &str = "GATEHOUSE_AUTH_TIMEOUT_SECS";

/// Server configuration.
///
/// Contains all configuration parameters needed to run the gatehouse server.
///
/// # Post-conditions
///
/// When constructed via `from_env()` or `from_lookup()`:
/// - `listen_port` is a parsed port number
/// - `auth_timeout` is non-zero
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Accept the fixed `admin`/`admin` login. Local development only.
    pub debug_mode: bool,
    /// Literal session secret supplied by the operator.
    /// When set, nothing is read from or written to `secret_directory`.
    pub secret_override: Option<String>,
    /// Directory where `session.json` is stored.
    pub secret_directory: PathBuf,
    /// Port to listen on for HTTP connections.
    pub listen_port: u16,
    /// PAM service name consulted for host logins.
    pub pam_service: String,
    /// Upper bound on a single host identity check.
    pub auth_timeout: Duration,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 8080;
    /// Default directory for the persisted session secret.
    pub const DEFAULT_SECRET_DIRECTORY: &'static str = "/var/lib/misc/";
    /// Default PAM service.
    pub const DEFAULT_PAM_SERVICE: &'static str = "system-auth";
    /// Default host identity deadline, in seconds.
    pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 10;

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set to a value that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Unset and empty variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `GATEHOUSE_DEBUG` is not a recognized boolean
    /// - `GATEHOUSE_LISTEN_PORT` is not a valid port number
    /// - `GATEHOUSE_AUTH_TIMEOUT_SECS` is not a positive integer
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let debug_mode = match get(DEBUG_VAR) {
            Some(value) => parse_bool(DEBUG_VAR, &value)?,
            None => false,
        };
        let secret_override = get(SECRET_VAR);
        let secret_directory = get(SECRET_DIRECTORY_VAR)
            .map_or_else(|| PathBuf::from(Self::DEFAULT_SECRET_DIRECTORY), PathBuf::from);
        let listen_port = match get(LISTEN_PORT_VAR) {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: LISTEN_PORT_VAR.to_string(),
                message: format!("'{value}' is not a valid port number (must be 1-65535)"),
            })?,
            None => Self::DEFAULT_PORT,
        };
        let pam_service =
            get(PAM_SERVICE_VAR).unwrap_or_else(|| Self::DEFAULT_PAM_SERVICE.to_string());
        let auth_timeout = match get(AUTH_TIMEOUT_VAR) {
            Some(value) => parse_timeout(&value)?,
            None => Duration::from_secs(Self::DEFAULT_AUTH_TIMEOUT_SECS),
        };

        Ok(Self {
            debug_mode,
            secret_override,
            secret_directory,
            listen_port,
            pam_service,
            auth_timeout,
        })
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a boolean"),
        }),
    }
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue {
            name: AUTH_TIMEOUT_VAR.to_string(),
            message: format!("'{value}' is not a positive number of seconds"),
        }),
    }
}
