//! Credential verification.
//!
//! A login attempt is decided by, in order:
//! 1. rejecting empty usernames or passwords outright,
//! 2. the debug bypass (`admin`/`admin`), only when debug mode is enabled,
//! 3. the injected `CredentialBackend`, normally the host's PAM stack.
//!
//! Backend calls block, so they run on Tokio's blocking pool under a deadline.
//! Any backend failure resolves to a denied login.

use std::sync::Arc;
use std::time::Duration;

/// Username accepted by the debug bypass.
pub const DEBUG_USERNAME: &str = "admin";
/// Password accepted by the debug bypass.
pub const DEBUG_PASSWORD: &str = "admin";

/// Error returned when a backend cannot reach a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The identity service could not be started or reached.
    Unavailable(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "identity service unavailable: {reason}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// A source of truth for username/password pairs.
///
/// Implementations may block; callers run them off the async executor.
pub trait CredentialBackend: Send + Sync {
    /// Check a username/password pair.
    ///
    /// `Ok(false)` is a normal rejection (wrong password, locked account).
    ///
    /// # Errors
    /// Returns `BackendError` when no decision could be made.
    fn verify(&self, username: &str, password: &str) -> Result<bool, BackendError>;
}

/// Host backend used when the crate is built without PAM support.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBackend;

impl CredentialBackend for UnavailableBackend {
    fn verify(&self, _username: &str, _password: &str) -> Result<bool, BackendError> {
        Err(BackendError::Unavailable(
            "built without PAM support".to_string(),
        ))
    }
}

/// Outcome of a login attempt.
///
/// Only `Authorized` grants a session. The other variants exist for server-side
/// logging and for choosing the error code shown on the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Authorized,
    EmptyFields,
    Rejected,
    BackendUnavailable,
}

impl Verdict {
    #[must_use]
    pub const fn is_authorized(self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// Decides whether a username/password pair may log in.
#[derive(Clone)]
pub struct CredentialVerifier {
    backend: Arc<dyn CredentialBackend>,
    debug_mode: bool,
    timeout: Duration,
}

impl CredentialVerifier {
    /// Create a verifier.
    ///
    /// # Arguments
    /// * `backend` - Host identity backend.
    /// * `debug_mode` - Accept `DEBUG_USERNAME`/`DEBUG_PASSWORD` before consulting the backend.
    /// * `timeout` - Deadline for a single backend call.
    #[must_use]
    pub fn new(backend: Arc<dyn CredentialBackend>, debug_mode: bool, timeout: Duration) -> Self {
        Self {
            backend,
            debug_mode,
            timeout,
        }
    }

    /// Whether the debug bypass is active.
    #[must_use]
    pub const fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// Decide a login attempt.
    #[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected
    pub async fn verify(&self, username: &str, password: &str) -> Verdict {
        if username.is_empty() || password.is_empty() {
            tracing::debug!("login rejected: empty username or password");
            return Verdict::EmptyFields;
        }

        if self.debug_bypass(username, password) {
            tracing::warn!("login accepted through debug bypass for '{username}'");
            return Verdict::Authorized;
        }

        let backend = Arc::clone(&self.backend);
        let user = username.to_string();
        let pass = password.to_string();
        let call = tokio::task::spawn_blocking(move || backend.verify(&user, &pass));

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(Ok(true))) => Verdict::Authorized,
            Ok(Ok(Ok(false))) => {
                tracing::warn!("login rejected for '{username}'");
                Verdict::Rejected
            }
            Ok(Ok(Err(e))) => {
                tracing::error!("login for '{username}' failed: {e}");
                Verdict::BackendUnavailable
            }
            Ok(Err(e)) => {
                tracing::error!("credential backend task failed: {e}");
                Verdict::BackendUnavailable
            }
            Err(_) => {
                tracing::error!(
                    "credential backend did not answer within {:?} for '{username}'",
                    self.timeout
                );
                Verdict::BackendUnavailable
            }
        }
    }

    fn debug_bypass(&self, username: &str, password: &str) -> bool {
        self.debug_mode && username == DEBUG_USERNAME && password == DEBUG_PASSWORD
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("debug_mode", &self.debug_mode)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
