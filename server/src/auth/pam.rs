//! Host identity backend backed by the system PAM stack.
//!
//! Each check opens its own PAM transaction, so the backend holds no state
//! between calls and is safe to share across requests.

use std::ffi::{CStr, CString};

use ::pam::{Authenticator, Conversation};

use super::credentials::{BackendError, CredentialBackend};

/// Verifies credentials through a PAM service such as `system-auth`.
#[derive(Debug, Clone)]
pub struct PamBackend {
    service: String,
}

impl PamBackend {
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl CredentialBackend for PamBackend {
    fn verify(&self, username: &str, password: &str) -> Result<bool, BackendError> {
        let conversation = LoginConversation {
            username: username.to_string(),
            password: password.to_string(),
        };
        let mut authenticator = Authenticator::with_handler(&self.service, conversation)
            .map_err(|e| BackendError::Unavailable(format!("PAM start error: {e:?}")))?;

        // Runs pam_authenticate followed by pam_acct_mgmt, so expired or
        // locked accounts fail here even with the right password.
        match authenticator.authenticate() {
            Ok(()) => Ok(true),
            Err(e) => {
                let code = format!("{e:?}");
                if is_service_failure(&code) {
                    Err(BackendError::Unavailable(format!("PAM error: {code}")))
                } else {
                    tracing::info!("PAM rejected '{username}': {code}");
                    Ok(false)
                }
            }
        }
    }
}

/// PAM return codes that mean the stack itself failed rather than the user.
const SERVICE_FAILURE_CODES: &[&str] = &[
    "AUTHINFO_UNAVAIL",
    "SYSTEM_ERR",
    "ABORT",
    "BUF_ERR",
    "SERVICE_ERR",
    "CONV_ERR",
    "MODULE_UNKNOWN",
    "OPEN_ERR",
    "SYMBOL_ERR",
];

/// Classify a PAM error by the return code name in its debug form.
fn is_service_failure(code: &str) -> bool {
    SERVICE_FAILURE_CODES.iter().any(|name| code.contains(name))
}

/// Answers PAM prompts for a single login attempt.
struct LoginConversation {
    username: String,
    password: String,
}

impl Conversation for LoginConversation {
    fn prompt_echo(&mut self, _msg: &CStr) -> Result<CString, ()> {
        CString::new(self.username.as_str()).map_err(|_| ())
    }

    fn prompt_blind(&mut self, _msg: &CStr) -> Result<CString, ()> {
        CString::new(self.password.as_str()).map_err(|_| ())
    }

    fn info(&mut self, msg: &CStr) {
        tracing::info!("PAM: {}", msg.to_string_lossy());
    }

    fn error(&mut self, msg: &CStr) {
        tracing::warn!("PAM: {}", msg.to_string_lossy());
    }

    fn username(&self) -> &str {
        &self.username
    }
}
