//! Errors surfaced to callers of the authenticated request pipeline.

use crate::traits::HttpError;

use super::category::ErrorCategory;
use super::session::SessionError;

/// Error returned by [`crate::pipeline::AuthenticatedClient`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The backend rejected the request's credentials and the session could
    /// not be renewed. Callers surface this as "please sign in again".
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized {
        status: u16,
        message: String,
        /// Why the refresh attempt did not help, if one was made.
        cause: Option<SessionError>,
    },

    /// Transport failure.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Non-success response on a typed call.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl ApiError {
    /// True when the user must sign in again before retrying.
    pub fn requires_reauth(&self) -> bool {
        match self {
            ApiError::Unauthorized { cause, .. } => {
                cause.as_ref().map(SessionError::is_fatal).unwrap_or(true)
            }
            _ => false,
        }
    }

    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::Unauthorized { cause: Some(cause), .. } if !cause.is_fatal() => {
                cause.category()
            }
            ApiError::Unauthorized { .. } => ErrorCategory::Auth,
            ApiError::Http(_) => ErrorCategory::Network,
            ApiError::Server { status, .. } if *status >= 500 => ErrorCategory::Server,
            ApiError::Server { .. } | ApiError::Parse(_) => ErrorCategory::Client,
        }
    }
}
