//! Client for the backend's authentication endpoints.
//!
//! Login, registration verification and social login all answer with the
//! same [`LoginResult`] shape. The refresh endpoint answers with a
//! [`RefreshResponse`] whose role fields are optional.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{ApiError, SessionError};
use crate::traits::{Headers, HttpClient, HttpError, Method, Response};

use super::credentials::{Role, SessionSnapshot, TokenPair};

/// Default URL for the LearnPath API
pub const DEFAULT_API_URL: &str = "https://api.learnpath.app";

/// Payload returned by the login, OTP verification and social login endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Role,
    #[serde(default)]
    pub is_goal_set: bool,
    #[serde(default)]
    pub is_placement_test_done: bool,
    #[serde(default)]
    pub message: String,
}

impl LoginResult {
    pub fn token_pair(&self) -> TokenPair {
        TokenPair::new(self.access_token.clone(), self.refresh_token.clone())
    }

    /// Build the session snapshot for this login.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownRole`] if the role is not one this
    /// client can route.
    pub fn snapshot(&self, email: &str) -> Result<SessionSnapshot, SessionError> {
        if let Role::Unknown(role) = &self.role {
            return Err(SessionError::UnknownRole { role: role.clone() });
        }
        Ok(SessionSnapshot {
            role: self.role.clone(),
            is_goal_set: self.is_goal_set,
            is_placement_test_done: self.is_placement_test_done,
            email: email.to_string(),
            display_message: self.message.clone(),
        })
    }
}

/// Payload returned by `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_goal_set: Option<bool>,
    #[serde(default)]
    pub is_placement_test_done: Option<bool>,
}

impl RefreshResponse {
    pub fn token_pair(&self) -> TokenPair {
        TokenPair::new(self.access_token.clone(), self.refresh_token.clone())
    }

    /// Whether the response carries any role-derived field.
    pub fn has_session_fields(&self) -> bool {
        self.role.is_some() || self.is_goal_set.is_some() || self.is_placement_test_done.is_some()
    }

    /// Overwrite the fields of `snapshot` this response carries.
    ///
    /// An unknown role is not copied; the cached role stays in place.
    pub fn apply_to(&self, snapshot: &mut SessionSnapshot) {
        if let Some(role) = &self.role {
            if !matches!(role, Role::Unknown(_)) {
                snapshot.role = role.clone();
            }
        }
        if let Some(is_goal_set) = self.is_goal_set {
            snapshot.is_goal_set = is_goal_set;
        }
        if let Some(done) = self.is_placement_test_done {
            snapshot.is_placement_test_done = done;
        }
    }

    /// Snapshot built from this response alone, when no cached one exists.
    pub fn to_snapshot(&self) -> Option<SessionSnapshot> {
        match &self.role {
            Some(Role::Unknown(_)) | None => None,
            Some(role) => Some(SessionSnapshot {
                role: role.clone(),
                is_goal_set: self.is_goal_set.unwrap_or(false),
                is_placement_test_done: self.is_placement_test_done.unwrap_or(false),
                email: String::new(),
                display_message: String::new(),
            }),
        }
    }
}

/// Pull a readable message out of an error response.
///
/// Uses the `message` field of a JSON body when present, otherwise the
/// first 200 characters of the raw body.
pub(crate) fn error_message(response: &Response) -> String {
    if let Ok(value) = response.json::<serde_json::Value>() {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    let text = response.text();
    if text.is_empty() {
        "Unknown error".to_string()
    } else {
        text.chars().take(200).collect()
    }
}

/// Client for the LearnPath authentication endpoints.
#[derive(Clone)]
pub struct AuthApiClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl AuthApiClient {
    /// Create a client for `base_url` (a trailing slash is ignored).
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Response, HttpError> {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let url = self.url(path);
        debug!(%url, "POST");
        self.http
            .send(Method::Post, &url, Some(&body.to_string()), &headers)
            .await
    }

    async fn login_request(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<LoginResult, ApiError> {
        let response = self.post_json(path, body).await?;
        if !response.is_success() {
            return Err(ApiError::Server {
                status: response.status,
                message: error_message(&response),
            });
        }
        response
            .json::<LoginResult>()
            .map_err(|e| ApiError::Parse(format!("Invalid login response: {}", e)))
    }

    /// Email/password login.
    ///
    /// POST /auth/login
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, ApiError> {
        self.login_request(
            "/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Complete registration by verifying the emailed one-time code.
    ///
    /// POST /auth/verify-otp
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<LoginResult, ApiError> {
        self.login_request(
            "/auth/verify-otp",
            serde_json::json!({ "email": email, "otp": otp }),
        )
        .await
    }

    /// Exchange a federated identity assertion for a session.
    ///
    /// POST /auth/google
    pub async fn social_login(&self, id_token: &str) -> Result<LoginResult, ApiError> {
        self.login_request("/auth/google", serde_json::json!({ "idToken": id_token }))
            .await
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// POST /auth/refresh
    ///
    /// 400, 401 and 403 mean the refresh token itself was refused and map to
    /// [`SessionError::RefreshRejected`]. Anything else that goes wrong is
    /// [`SessionError::Network`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, SessionError> {
        let response = self
            .post_json(
                "/auth/refresh",
                serde_json::json!({ "refreshToken": refresh_token }),
            )
            .await
            .map_err(|e| SessionError::Network {
                message: e.to_string(),
            })?;

        match response.status {
            400 | 401 | 403 => {
                return Err(SessionError::RefreshRejected {
                    status: response.status,
                    message: error_message(&response),
                })
            }
            _ if !response.is_success() => {
                return Err(SessionError::Network {
                    message: format!(
                        "refresh failed ({}): {}",
                        response.status,
                        error_message(&response)
                    ),
                })
            }
            _ => {}
        }

        response
            .json::<RefreshResponse>()
            .map_err(|e| SessionError::Network {
                message: format!("Invalid refresh response: {}", e),
            })
    }
}

impl std::fmt::Debug for AuthApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
