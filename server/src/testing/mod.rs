//! Credential backends for tests.

use std::collections::HashMap;
use std::time::Duration;

use crate::auth::{BackendError, CredentialBackend};

/// Accepts exactly the username/password pairs it was given.
#[derive(Debug, Default, Clone)]
pub struct StaticBackend {
    users: HashMap<String, String>,
}

impl StaticBackend {
    #[must_use]
    pub fn with_user(username: &str, password: &str) -> Self {
        Self::default().and_user(username, password)
    }

    #[must_use]
    pub fn and_user(mut self, username: &str, password: &str) -> Self {
        self.users.insert(username.to_string(), password.to_string());
        self
    }
}

impl CredentialBackend for StaticBackend {
    fn verify(&self, username: &str, password: &str) -> Result<bool, BackendError> {
        Ok(self.users.get(username).is_some_and(|p| p == password))
    }
}

/// Behaves like an identity service that cannot be reached.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingBackend;

impl CredentialBackend for FailingBackend {
    fn verify(&self, _username: &str, _password: &str) -> Result<bool, BackendError> {
        Err(BackendError::Unavailable("connection refused".to_string()))
    }
}

/// Blocks for a fixed delay, then accepts everything.
#[derive(Debug, Clone, Copy)]
pub struct SlowBackend {
    delay: Duration,
}

impl SlowBackend {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl CredentialBackend for SlowBackend {
    fn verify(&self, _username: &str, _password: &str) -> Result<bool, BackendError> {
        std::thread::sleep(self.delay);
        Ok(true)
    }
}
