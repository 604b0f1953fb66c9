//! Common test utilities for integration tests.
//!
//! Fixtures for access tokens, login payloads and fully wired session
//! services over in-memory or file-backed storage.
//!
//! # Example
//!
//! ```ignore
//! let (store, services) = mock_services("https://api.test", &http);
//! store.insert(Partition::Secure, "refresh_token", "R1");
//! ```

#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::sync::Arc;
use std::time::Duration;

use learnpath_session::adapters::mock::{InMemoryCredentialStore, MockHttpClient};
use learnpath_session::adapters::ReqwestHttpClient;
use learnpath_session::auth::{LoginResult, Role};
use learnpath_session::config::SessionConfig;
use learnpath_session::startup::SessionServices;
use learnpath_session::traits::{CredentialStore, Partition};

/// A JWT-shaped access token whose `exp` claim is `exp` (unix seconds).
pub fn jwt_with_exp(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"user-1","exp":{}}}"#, exp));
    format!("{}.{}.signature", header, payload)
}

/// Access token valid for the next hour.
pub fn fresh_jwt() -> String {
    jwt_with_exp(chrono::Utc::now().timestamp() + 3600)
}

/// Login payload as the backend returns it.
pub fn login_result(role: Role, is_placement_test_done: bool) -> LoginResult {
    LoginResult {
        access_token: fresh_jwt(),
        refresh_token: "refresh-token-1".to_string(),
        role,
        is_goal_set: true,
        is_placement_test_done,
        message: "Welcome back".to_string(),
    }
}

/// JSON body of a login response.
pub fn login_json(role: &str, is_placement_test_done: bool) -> serde_json::Value {
    serde_json::json!({
        "accessToken": "A1",
        "refreshToken": "R1",
        "role": role,
        "isGoalSet": true,
        "isPlacementTestDone": is_placement_test_done,
        "message": "Welcome back"
    })
}

/// Store a complete token pair plus snapshot JSON directly.
pub fn seed_session(store: &InMemoryCredentialStore, access: &str, refresh: &str, user_data: &str) {
    store.insert(Partition::Secure, "access_token", access);
    store.insert(Partition::Secure, "refresh_token", refresh);
    store.insert(Partition::General, "user_data", user_data);
}

/// Services over a scripted HTTP mock and an in-memory store.
pub fn mock_services(
    base_url: &str,
    http: &MockHttpClient,
) -> (InMemoryCredentialStore, SessionServices) {
    let store = InMemoryCredentialStore::new();
    let config = SessionConfig::default()
        .with_api_base_url(base_url)
        .with_refresh_timeout(Duration::from_secs(2));
    let services = SessionServices::build(config, Arc::new(http.clone()), Arc::new(store.clone()));
    (store, services)
}

/// Services over real HTTP (reqwest) against `base_url`.
pub fn http_services(
    base_url: &str,
    store: Arc<dyn CredentialStore>,
) -> SessionServices {
    let config = SessionConfig::default()
        .with_api_base_url(base_url)
        .with_refresh_timeout(Duration::from_secs(2));
    let http = ReqwestHttpClient::with_timeout(Duration::from_secs(5))
        .expect("reqwest client should build");
    SessionServices::build(config, Arc::new(http), store)
}
