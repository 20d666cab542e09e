//! Session token codec.
//!
//! A session token is an HS256-signed JWT whose only claim is `sub`, the
//! authenticated username, keyed with the active session secret.
//!
//! # Pre-conditions
//! - The codec is built from the secret resolved at startup.
//!
//! # Post-conditions
//! - `decode(mint(u))` yields `u` for any non-empty `u`.
//! - `decode` yields `None` for anything not minted under the same secret.
//!
//! # Invariants
//! - Tokens carry no expiry; lifetime is bounded by the cookie alone.
//! - Decoding is stateless and does not modify any external state.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::Secret;

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// The authenticated username.
    sub: String,
}

/// Error returned when minting or verifying a session token fails.
#[derive(Debug)]
pub enum SessionError {
    /// The token signature does not match the active secret.
    InvalidSignature,
    /// The token is malformed or cannot be parsed.
    MalformedToken,
    /// The token names no user, or minting was asked for an empty username.
    MissingSubject,
    /// The token could not be signed.
    Encoding(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "invalid session signature"),
            Self::MalformedToken => write!(f, "malformed session token"),
            Self::MissingSubject => write!(f, "session token has no subject"),
            Self::Encoding(reason) => write!(f, "failed to sign session token: {reason}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Mints and validates session tokens against one secret.
#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionCodec {
    /// Build a codec bound to `secret`.
    #[must_use]
    pub fn new(secret: &Secret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Produce a session token for `username`.
    ///
    /// # Errors
    /// Returns `SessionError::MissingSubject` for an empty username and
    /// `SessionError::Encoding` if signing fails.
    pub fn mint(&self, username: &str) -> Result<String, SessionError> {
        if username.is_empty() {
            return Err(SessionError::MissingSubject);
        }

        let claims = Claims {
            sub: username.to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Encoding(e.to_string()))
    }

    /// Resolve a presented token to its username.
    ///
    /// Any failure is logged at debug level and reported as `None`.
    #[must_use]
    pub fn decode(&self, token: &str) -> Option<String> {
        match self.verify(token) {
            Ok(username) => Some(username),
            Err(e) => {
                tracing::debug!("rejected session token: {e}");
                None
            }
        }
    }

    /// Verify a token and extract its subject.
    ///
    /// # Errors
    /// Returns `SessionError` describing why the token was rejected.
    pub fn verify(&self, token: &str) -> Result<String, SessionError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?;

        let username = token_data.claims.sub;
        if username.is_empty() {
            return Err(SessionError::MissingSubject);
        }

        Ok(username)
    }
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec").finish_non_exhaustive()
    }
}

/// Maps jsonwebtoken errors to our `SessionError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> SessionError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => SessionError::InvalidSignature,
        ErrorKind::MissingRequiredClaim(_) => SessionError::MissingSubject,
        _ => SessionError::MalformedToken,
    }
}
