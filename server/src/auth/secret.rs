//! Session secret lifecycle.
//!
//! The secret keys every session token. It is resolved exactly once at startup:
//! an operator-supplied value wins, otherwise the value persisted in
//! `{storage_directory}/session.json` is reused, otherwise a fresh one is
//! generated and written there.
//!
//! # Post-conditions
//! - The returned `Secret` is non-empty.
//! - A freshly generated secret is on disk (owner read/write only) before it is returned.
//!
//! # Invariants
//! - A readable, non-empty persisted secret is never replaced.
//! - A persisted secret that cannot be read is an error, not an absence.
//! - Secret material never appears in `Debug` output.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::TryRngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// File name of the persisted secret document.
pub const SECRET_FILE_NAME: &str = "session.json";

/// Number of random bytes in a generated secret.
pub const SECRET_LENGTH: usize = 32;

/// The server-wide session signing secret, base64 encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap an existing secret value.
    ///
    /// Returns `None` for an empty value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Generate a new secret from the operating system's random source.
    ///
    /// # Errors
    /// Returns `SecretError::Randomness` if the OS cannot supply random bytes.
    pub fn generate() -> Result<Self, SecretError> {
        let mut bytes = [0u8; SECRET_LENGTH];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SecretError::Randomness(e.to_string()))?;
        Ok(Self(STANDARD.encode(bytes)))
    }

    /// Key material for token signing.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The encoded secret, as stored on disk.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// Where the active secret came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    /// Supplied by configuration; never persisted.
    Override,
    /// Read from an existing `session.json`.
    Loaded,
    /// Generated during this startup and written to `session.json`.
    Generated,
}

/// Error returned when a secret cannot be established.
#[derive(Debug)]
pub enum SecretError {
    /// The OS random source failed.
    Randomness(String),
    /// An existing secret document could not be read.
    Read { path: PathBuf, source: std::io::Error },
    /// The storage directory could not be created.
    CreateDirectory { path: PathBuf, source: std::io::Error },
    /// The secret document could not be serialized.
    Serialize(serde_json::Error),
    /// The secret document could not be written.
    Write { path: PathBuf, source: std::io::Error },
}

impl std::fmt::Display for SecretError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Randomness(reason) => write!(f, "failed to generate random bytes: {reason}"),
            Self::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Self::CreateDirectory { path, source } => {
                write!(f, "failed to create {}: {source}", path.display())
            }
            Self::Serialize(e) => write!(f, "failed to encode secret document: {e}"),
            Self::Write { path, source } => {
                write!(f, "failed to write {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SecretError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Randomness(_) => None,
            Self::Read { source, .. }
            | Self::CreateDirectory { source, .. }
            | Self::Write { source, .. } => Some(source),
            Self::Serialize(e) => Some(e),
        }
    }
}

/// On-disk form of the secret.
#[derive(Debug, Serialize, Deserialize)]
struct SecretDocument {
    secret: String,
}

/// Persistent home of the session secret.
#[derive(Debug, Clone)]
pub struct SecretStore {
    path: PathBuf,
}

impl SecretStore {
    /// Create a store rooted at `storage_directory`.
    #[must_use]
    pub fn new(storage_directory: &Path) -> Self {
        Self {
            path: storage_directory.join(SECRET_FILE_NAME),
        }
    }

    /// Full path of `session.json`.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted secret.
    ///
    /// A missing file, a document that is not valid JSON, or an empty secret
    /// all yield `Ok(None)`.
    ///
    /// # Errors
    /// Returns `SecretError::Read` if the file exists but cannot be read, so an
    /// unreadable secret is never mistaken for an absent one.
    pub fn load(&self) -> Result<Option<Secret>, SecretError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SecretError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        match serde_json::from_slice::<SecretDocument>(&data) {
            Ok(document) => {
                let secret = Secret::new(document.secret);
                if secret.is_none() {
                    tracing::warn!("Ignoring empty session secret in {}", self.path.display());
                }
                Ok(secret)
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed {}: {e}", self.path.display());
                Ok(None)
            }
        }
    }

    /// Write `secret` to `session.json` with owner-only permissions.
    ///
    /// Creates the storage directory if needed.
    ///
    /// # Errors
    /// Returns an error if the directory or the file cannot be written.
    pub fn persist(&self, secret: &Secret) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SecretError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let document = SecretDocument {
            secret: secret.expose().to_string(),
        };
        let data = serde_json::to_vec_pretty(&document).map_err(SecretError::Serialize)?;

        write_private(&self.path, &data).map_err(|source| SecretError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(unix)]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; tighten a pre-existing file too.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(data)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

/// Resolve the process-wide secret.
///
/// # Arguments
/// * `override_value` - Operator-supplied secret. When non-empty it is used as is
///   and `storage_directory` is not touched.
/// * `storage_directory` - Directory holding `session.json`.
///
/// # Errors
/// Returns `SecretError` if an existing `session.json` cannot be read, or if a
/// new secret has to be generated and either generation or persistence fails.
pub fn ensure_secret(
    override_value: Option<&str>,
    storage_directory: &Path,
) -> Result<(Secret, SecretSource), SecretError> {
    if let Some(secret) = override_value.and_then(Secret::new) {
        tracing::info!("Using session secret from configuration");
        return Ok((secret, SecretSource::Override));
    }

    let store = SecretStore::new(storage_directory);
    if let Some(secret) = store.load()? {
        tracing::info!("Using existing session secret from {}", store.path().display());
        return Ok((secret, SecretSource::Loaded));
    }

    let secret = Secret::generate()?;
    store.persist(&secret)?;
    tracing::info!("Generated and saved new session secret to {}", store.path().display());
    Ok((secret, SecretSource::Generated))
}
