//! Authentication module.
//!
//! This module provides the session secret, credential verification, session
//! tokens, and the gate that guards protected routes.
//!
//! # Pre-conditions
//! - The secret is resolved before the server accepts connections.
//!
//! # Post-conditions
//! - All session state is immutable once the server is running.
//!
//! # Invariants
//! - Every token is interpreted against the single active secret.

pub mod credentials;
pub mod gate;
#[cfg(feature = "pam")]
pub mod pam;
pub mod secret;
pub mod session;

pub use credentials::{
    BackendError, CredentialBackend, CredentialVerifier, UnavailableBackend, Verdict,
};
pub use gate::{Identity, LOGIN_PATH, SESSION_COOKIE, require_session};
#[cfg(feature = "pam")]
pub use self::pam::PamBackend;
pub use secret::{Secret, SecretError, SecretSource, SecretStore, ensure_secret};
pub use session::{SessionCodec, SessionError};
