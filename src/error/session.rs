//! Session lifecycle error types.
//!
//! Errors produced while reading, refreshing or transitioning credentials.
//! Every variant is `Clone` so a single refresh outcome can be handed to all
//! of its waiters.

use crate::traits::StoreError;

use super::category::ErrorCategory;

/// Session-specific error variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No refresh token is stored; the session has ended.
    #[error("No refresh token stored")]
    NoRefreshToken,

    /// Backend refused the refresh token (expired or revoked).
    #[error("Refresh token rejected ({status}): {message}")]
    RefreshRejected { status: u16, message: String },

    /// Transport failure or timeout while talking to the auth backend.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Access token could not be decoded.
    #[error("Malformed access token: {message}")]
    Decode { message: String },

    /// Credential store could not be read.
    #[error("Credential read failed: {0}")]
    StoreRead(StoreError),

    /// Credential store could not be written.
    #[error("Credential write failed: {0}")]
    StoreWrite(StoreError),

    /// Login payload carried a role this client does not know.
    #[error("Unknown account role '{role}'")]
    UnknownRole { role: String },
}

impl SessionError {
    /// Whether this error ends the session (forces `Unauthenticated`).
    ///
    /// Only a missing or rejected refresh token is fatal; everything else is
    /// left to the caller's retry policy.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::NoRefreshToken | SessionError::RefreshRejected { .. }
        )
    }

    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SessionError::NoRefreshToken
            | SessionError::RefreshRejected { .. }
            | SessionError::UnknownRole { .. } => ErrorCategory::Auth,
            SessionError::Network { .. } => ErrorCategory::Network,
            SessionError::Decode { .. } => ErrorCategory::Client,
            SessionError::StoreRead(_) | SessionError::StoreWrite(_) => ErrorCategory::Storage,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::NoRefreshToken | SessionError::RefreshRejected { .. } => {
                "Your session has expired. Please sign in again.".to_string()
            }
            SessionError::Network { .. } => {
                "Could not reach the server. Please try again.".to_string()
            }
            SessionError::Decode { .. } => {
                "Your session could not be read. Please sign in again.".to_string()
            }
            SessionError::StoreRead(_) | SessionError::StoreWrite(_) => {
                "Your sign-in could not be saved on this device.".to_string()
            }
            SessionError::UnknownRole { .. } => {
                "This account type is not supported by this version of the app.".to_string()
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::NoRefreshToken => "E_SESSION_NO_REFRESH",
            SessionError::RefreshRejected { .. } => "E_SESSION_REFRESH_REJECTED",
            SessionError::Network { .. } => "E_SESSION_NETWORK",
            SessionError::Decode { .. } => "E_SESSION_DECODE",
            SessionError::StoreRead(_) => "E_SESSION_STORE_READ",
            SessionError::StoreWrite(_) => "E_SESSION_STORE_WRITE",
            SessionError::UnknownRole { .. } => "E_SESSION_UNKNOWN_ROLE",
        }
    }
}
