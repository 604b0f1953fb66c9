//! Authenticated request pipeline.
//!
//! Every backend call other than the auth endpoints goes through
//! [`AuthenticatedClient`]. It attaches the stored access token, and when
//! the backend answers 401 it refreshes the session (sharing the refresh
//! with any other request that hit the same 401) and replays the request
//! once with the new token.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::api::error_message;
use crate::auth::{token, CredentialsManager, RefreshCoordinator};
use crate::error::{ApiError, SessionError};
use crate::traits::{Headers, HttpClient, Method, Response};

/// Receives session-ending refresh failures from the pipeline.
///
/// Implemented by [`crate::session::SessionOrchestrator`], which logs out.
#[async_trait]
pub trait SessionExpiryHandler: Send + Sync {
    async fn session_expired(&self, error: &SessionError);
}

/// A request to send through the pipeline.
///
/// # Example
///
/// ```ignore
/// let request = ApiRequest::post("/courses/42/enroll")
///     .with_body(serde_json::json!({ "level": "A2" }));
/// let response = client.send(&request).await?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/courses`.
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub headers: Headers,
    /// Refresh and replay once on 401 (default true).
    pub refresh_on_unauthorized: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Headers::new(),
            refresh_on_unauthorized: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Set a JSON body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Surface a 401 directly instead of refreshing.
    pub fn without_refresh(mut self) -> Self {
        self.refresh_on_unauthorized = false;
        self
    }
}

/// HTTP client that carries the session's bearer token.
pub struct AuthenticatedClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
    credentials: Arc<CredentialsManager>,
    refresher: RefreshCoordinator,
    proactive_refresh_threshold: Option<Duration>,
    expiry_handler: Option<Arc<dyn SessionExpiryHandler>>,
}

impl AuthenticatedClient {
    pub fn new(
        base_url: impl Into<String>,
        http: Arc<dyn HttpClient>,
        credentials: Arc<CredentialsManager>,
        refresher: RefreshCoordinator,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            credentials,
            refresher,
            proactive_refresh_threshold: None,
            expiry_handler: None,
        }
    }

    /// Refresh before sending when the access token expires within `threshold`.
    pub fn with_proactive_refresh(mut self, threshold: Option<Duration>) -> Self {
        self.proactive_refresh_threshold = threshold;
        self
    }

    /// Report fatal refresh failures to `handler`.
    pub fn with_expiry_handler(mut self, handler: Arc<dyn SessionExpiryHandler>) -> Self {
        self.expiry_handler = Some(handler);
        self
    }

    pub fn refresher(&self) -> &RefreshCoordinator {
        &self.refresher
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn stored_access_token(&self) -> Option<String> {
        match self.credentials.access_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read access token, sending without it: {}", e);
                None
            }
        }
    }

    async fn report(&self, error: &SessionError) {
        let category = error.category();
        if !error.is_fatal() {
            warn!(
                error_code = error.error_code(),
                %category,
                retryable = category.is_retryable(),
                "Session refresh failed: {}",
                error
            );
            return;
        }
        warn!(error_code = error.error_code(), %category, "Session ended: {}", error);
        if let Some(handler) = &self.expiry_handler {
            handler.session_expired(error).await;
        }
    }

    /// Refresh ahead of time if the token is about to expire.
    ///
    /// Non-fatal failures keep the current token and let the request run.
    async fn proactive_token(
        &self,
        access_token: Option<String>,
        threshold: Duration,
    ) -> Result<Option<String>, SessionError> {
        let Some(current) = access_token else {
            return Ok(None);
        };
        if !token::expires_within(&current, threshold) {
            return Ok(Some(current));
        }

        debug!("Access token expires soon, refreshing before request");
        match self.refresher.refresh().await {
            Ok(pair) => Ok(Some(pair.access_token)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Proactive refresh failed, using current token: {}", e);
                Ok(Some(current))
            }
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        url: &str,
        body: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let mut headers = request.headers.clone();
        if body.is_some() {
            headers
                .entry("Content-Type".to_string())
                .or_insert_with(|| "application/json".to_string());
        }
        if let Some(access_token) = access_token {
            headers.insert(
                "Authorization".to_string(),
                format!("Bearer {}", access_token),
            );
        }
        Ok(self.http.send(request.method, url, body, &headers).await?)
    }

    /// Send a request, refreshing and replaying once on 401.
    ///
    /// Any non-401 response is returned as-is, whatever its status.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Unauthorized`] when the 401 could not be cleared. If a
    ///   refresh was attempted and failed, `cause` holds its error and
    ///   `message` the body of the original 401.
    /// - [`ApiError::Http`] on transport failure.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let url = self.url(&request.path);
        let body = request.body.as_ref().map(|b| b.to_string());

        let mut access_token = self.stored_access_token().await;
        if let Some(threshold) = self.proactive_refresh_threshold {
            access_token = match self.proactive_token(access_token, threshold).await {
                Ok(token) => token,
                Err(e) => {
                    self.report(&e).await;
                    return Err(ApiError::Unauthorized {
                        status: 401,
                        message: e.user_message(),
                        cause: Some(e),
                    });
                }
            };
        }

        debug!(method = %request.method, path = %request.path, "Sending request");
        let response = self
            .dispatch(request, &url, body.as_deref(), access_token.as_deref())
            .await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        if !request.refresh_on_unauthorized {
            return Err(ApiError::Unauthorized {
                status: response.status,
                message: error_message(&response),
                cause: None,
            });
        }

        // The session may have moved on while this request was in flight,
        // through a refresh that already settled or a login.
        let replay_token = match self.stored_access_token().await {
            Some(current) if access_token.as_deref() != Some(current.as_str()) => {
                debug!(path = %request.path, "Got 401 for a superseded token, replaying");
                current
            }
            _ => {
                debug!(path = %request.path, "Got 401, refreshing session");
                match self.refresher.refresh().await {
                    Ok(pair) => pair.access_token,
                    Err(e) => {
                        self.report(&e).await;
                        return Err(ApiError::Unauthorized {
                            status: response.status,
                            message: error_message(&response),
                            cause: Some(e),
                        });
                    }
                }
            }
        };

        let retried = self
            .dispatch(request, &url, body.as_deref(), Some(&replay_token))
            .await?;
        if retried.is_unauthorized() {
            warn!(path = %request.path, "Request still unauthorized after refresh");
            return Err(ApiError::Unauthorized {
                status: retried.status,
                message: error_message(&retried),
                cause: None,
            });
        }
        Ok(retried)
    }

    /// Send a request and parse a successful JSON body.
    ///
    /// Non-2xx responses become [`ApiError::Server`].
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(ApiError::Server {
                status: response.status,
                message: error_message(&response),
            });
        }
        response
            .json::<T>()
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{InMemoryCredentialStore, MockHttpClient, MockResponse};
    use crate::auth::AuthApiClient;
    use crate::traits::{HttpError, Partition};
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use serde_json::json;
    use std::sync::Mutex;

    const BASE: &str = "https://api.test";
    const REFRESH_URL: &str = "https://api.test/auth/refresh";
    const COURSES_URL: &str = "https://api.test/courses";

    #[derive(Default)]
    struct RecordingHandler {
        errors: Mutex<Vec<SessionError>>,
    }

    #[async_trait]
    impl SessionExpiryHandler for RecordingHandler {
        async fn session_expired(&self, error: &SessionError) {
            self.errors.lock().unwrap().push(error.clone());
        }
    }

    struct Fixture {
        http: MockHttpClient,
        store: InMemoryCredentialStore,
        handler: Arc<RecordingHandler>,
        client: AuthenticatedClient,
    }

    fn fixture() -> Fixture {
        let http = MockHttpClient::new();
        let store = InMemoryCredentialStore::new();
        let credentials = Arc::new(CredentialsManager::new(Arc::new(store.clone())));
        let refresher = RefreshCoordinator::new(
            AuthApiClient::new(BASE, Arc::new(http.clone())),
            Arc::clone(&credentials),
            Duration::from_secs(5),
        );
        let handler = Arc::new(RecordingHandler::default());
        let client = AuthenticatedClient::new(BASE, Arc::new(http.clone()), credentials, refresher)
            .with_expiry_handler(handler.clone());
        Fixture {
            http,
            store,
            handler,
            client,
        }
    }

    fn seed_pair(store: &InMemoryCredentialStore, access: &str, refresh: &str) {
        store.insert(Partition::Secure, "access_token", access);
        store.insert(Partition::Secure, "refresh_token", refresh);
    }

    fn jwt_expiring_in(secs: i64) -> String {
        let exp = chrono::Utc::now().timestamp() + secs;
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp))
        )
    }

    #[test]
    fn test_request_builders() {
        let request = ApiRequest::post("/courses")
            .with_body(json!({"title": "Spanish"}))
            .with_header("X-Locale", "es")
            .without_refresh();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.headers.get("X-Locale").map(String::as_str), Some("es"));
        assert!(!request.refresh_on_unauthorized);
        assert!(ApiRequest::get("/x").refresh_on_unauthorized);
    }

    #[tokio::test]
    async fn test_attaches_bearer_token() {
        let f = fixture();
        seed_pair(&f.store, "A1", "R1");
        f.http.set_response(COURSES_URL, MockResponse::json(200, json!([])));

        let response = f.client.send(&ApiRequest::get("/courses")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(f.http.requests_to(COURSES_URL)[0].bearer_token(), Some("A1"));
    }

    #[tokio::test]
    async fn test_anonymous_when_no_token() {
        let f = fixture();
        f.http.set_response(COURSES_URL, MockResponse::json(200, json!([])));

        f.client.send(&ApiRequest::get("courses")).await.unwrap();
        assert_eq!(f.http.requests_to(COURSES_URL)[0].bearer_token(), None);
    }

    #[tokio::test]
    async fn test_json_body_sets_content_type() {
        let f = fixture();
        f.http.set_response(COURSES_URL, MockResponse::status(201));

        f.client
            .send(&ApiRequest::post("/courses").with_body(json!({"title": "French"})))
            .await
            .unwrap();
        let request = &f.http.requests_to(COURSES_URL)[0];
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(request.body.as_deref(), Some(r#"{"title":"French"}"#));
    }

    #[tokio::test]
    async fn test_401_refreshes_and_retries_with_new_token() {
        let f = fixture();
        seed_pair(&f.store, "A1", "R1");
        f.http.push_response(COURSES_URL, MockResponse::status(401));
        f.http.push_response(COURSES_URL, MockResponse::json(200, json!(["c1"])));
        f.http.set_response(
            REFRESH_URL,
            MockResponse::json(200, json!({"accessToken": "A2", "refreshToken": "R2"})),
        );

        let courses: Vec<String> = f.client.send_json(&ApiRequest::get("/courses")).await.unwrap();
        assert_eq!(courses, vec!["c1".to_string()]);

        let requests = f.http.requests_to(COURSES_URL);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].bearer_token(), Some("A1"));
        assert_eq!(requests[1].bearer_token(), Some("A2"));
        assert_eq!(f.store.value(Partition::Secure, "access_token"), Some("A2".to_string()));
    }

    #[tokio::test]
    async fn test_rejected_refresh_surfaces_original_401_and_ends_session() {
        let f = fixture();
        seed_pair(&f.store, "A1", "R1");
        f.http.set_response(
            COURSES_URL,
            MockResponse::json(401, json!({"message": "Token expired"})),
        );
        f.http.set_response(REFRESH_URL, MockResponse::status(401));

        match f.client.send(&ApiRequest::get("/courses")).await {
            Err(ApiError::Unauthorized {
                status,
                message,
                cause: Some(cause),
            }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Token expired");
                assert!(cause.is_fatal());
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(f.http.request_count(COURSES_URL), 1);
        assert_eq!(f.handler.errors.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_network_refresh_failure_does_not_end_session() {
        let f = fixture();
        seed_pair(&f.store, "A1", "R1");
        f.http.set_response(COURSES_URL, MockResponse::status(401));
        f.http.set_response(
            REFRESH_URL,
            MockResponse::Error(HttpError::ConnectionFailed("offline".to_string())),
        );

        let err = f.client.send(&ApiRequest::get("/courses")).await.unwrap_err();
        assert!(!err.requires_reauth());
        assert!(f.handler.errors.lock().unwrap().is_empty());
        assert_eq!(
            f.store.value(Partition::Secure, "refresh_token"),
            Some("R1".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_refresh_token_is_fatal() {
        let f = fixture();
        f.http.set_response(COURSES_URL, MockResponse::status(401));

        let err = f.client.send(&ApiRequest::get("/courses")).await.unwrap_err();
        assert!(err.requires_reauth());
        assert_eq!(
            f.handler.errors.lock().unwrap().as_slice(),
            &[SessionError::NoRefreshToken]
        );
        assert_eq!(f.http.request_count(REFRESH_URL), 0);
    }

    #[tokio::test]
    async fn test_retries_at_most_once() {
        let f = fixture();
        seed_pair(&f.store, "A1", "R1");
        f.http.set_response(COURSES_URL, MockResponse::status(401));
        f.http.set_response(
            REFRESH_URL,
            MockResponse::json(200, json!({"accessToken": "A2", "refreshToken": "R2"})),
        );

        let err = f.client.send(&ApiRequest::get("/courses")).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { cause: None, .. }));
        assert_eq!(f.http.request_count(COURSES_URL), 2);
        assert_eq!(f.http.request_count(REFRESH_URL), 1);
    }

    #[tokio::test]
    async fn test_without_refresh_skips_refresh() {
        let f = fixture();
        seed_pair(&f.store, "A1", "R1");
        f.http.set_response(COURSES_URL, MockResponse::status(401));

        let err = f
            .client
            .send(&ApiRequest::get("/courses").without_refresh())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { status: 401, .. }));
        assert_eq!(f.http.request_count(REFRESH_URL), 0);
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let f = fixture();
        seed_pair(&f.store, "A1", "R1");
        for _ in 0..5 {
            f.http.push_response(COURSES_URL, MockResponse::status(401));
        }
        f.http.push_response(COURSES_URL, MockResponse::json(200, json!([])));
        f.http.set_response(
            REFRESH_URL,
            MockResponse::json(200, json!({"accessToken": "A2", "refreshToken": "R2"})),
        );
        f.http.set_delay(REFRESH_URL, Duration::from_millis(50));

        let request = ApiRequest::get("/courses");
        let sends = (0..5).map(|_| f.client.send(&request));
        let results = futures::future::join_all(sends).await;

        assert!(results
            .iter()
            .all(|r| matches!(r, Ok(response) if response.status == 200)));
        assert_eq!(f.http.request_count(REFRESH_URL), 1);
        let retries: Vec<_> = f.http.requests_to(COURSES_URL).into_iter().skip(5).collect();
        assert_eq!(retries.len(), 5);
        assert!(retries.iter().all(|r| r.bearer_token() == Some("A2")));
    }

    #[tokio::test]
    async fn test_late_401_replays_with_token_from_settled_refresh() {
        let f = fixture();
        seed_pair(&f.store, "A1", "R1");
        let slow_url = "https://api.test/slow";
        let fast_url = "https://api.test/fast";
        f.http.set_delay(slow_url, Duration::from_millis(100));
        for url in [slow_url, fast_url] {
            f.http.push_response(url, MockResponse::status(401));
            f.http.push_response(url, MockResponse::json(200, json!([])));
        }
        f.http.set_response(
            REFRESH_URL,
            MockResponse::json(200, json!({"accessToken": "A2", "refreshToken": "R2"})),
        );

        let slow_request = ApiRequest::get("/slow");
        let fast_request = ApiRequest::get("/fast");
        let (slow, fast) = tokio::join!(f.client.send(&slow_request), async {
            let response = f.client.send(&fast_request).await;
            // The refresh has settled before the slow 401 arrives.
            assert!(!f.client.refresher().is_refreshing());
            response
        });

        assert_eq!(slow.unwrap().status, 200);
        assert_eq!(fast.unwrap().status, 200);
        assert_eq!(f.http.request_count(REFRESH_URL), 1);
        let slow_tokens: Vec<_> = f
            .http
            .requests_to(slow_url)
            .iter()
            .map(|r| r.bearer_token().map(str::to_string))
            .collect();
        assert_eq!(slow_tokens, vec![Some("A1".to_string()), Some("A2".to_string())]);
        assert_eq!(f.store.value(Partition::Secure, "refresh_token"), Some("R2".to_string()));
        assert!(f.handler.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_401_sent_before_login_replays_with_new_token() {
        let f = fixture();
        f.http.set_delay(COURSES_URL, Duration::from_millis(100));
        f.http.push_response(COURSES_URL, MockResponse::status(401));
        f.http.push_response(COURSES_URL, MockResponse::json(200, json!([])));

        let request = ApiRequest::get("/courses");
        let (response, ()) = tokio::join!(f.client.send(&request), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            seed_pair(&f.store, "A1", "R1");
        });

        assert_eq!(response.unwrap().status, 200);
        let requests = f.http.requests_to(COURSES_URL);
        assert_eq!(requests[0].bearer_token(), None);
        assert_eq!(requests[1].bearer_token(), Some("A1"));
        assert_eq!(f.http.request_count(REFRESH_URL), 0);
        assert!(f.handler.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsaved_refresh_is_used_by_later_requests() {
        let f = fixture();
        seed_pair(&f.store, "A1", "R1");
        f.store.set_write_should_fail(true);
        f.http.push_response(COURSES_URL, MockResponse::status(401));
        f.http.push_response(COURSES_URL, MockResponse::json(200, json!([])));
        f.http.set_response(
            REFRESH_URL,
            MockResponse::json(200, json!({"accessToken": "A2", "refreshToken": "R2"})),
        );

        f.client.send(&ApiRequest::get("/courses")).await.unwrap();
        f.client.send(&ApiRequest::get("/courses")).await.unwrap();

        let requests = f.http.requests_to(COURSES_URL);
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].bearer_token(), Some("A2"));
        assert_eq!(f.http.request_count(REFRESH_URL), 1);
        assert_eq!(f.store.value(Partition::Secure, "access_token"), Some("A1".to_string()));
    }

    #[tokio::test]
    async fn test_send_json_maps_errors() {
        let f = fixture();
        f.http.set_response(
            COURSES_URL,
            MockResponse::json(422, json!({"message": "Invalid level"})),
        );
        let err = f
            .client
            .send_json::<serde_json::Value>(&ApiRequest::get("/courses"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 422, ref message } if message == "Invalid level"));

        f.http
            .set_response(COURSES_URL, MockResponse::Success(Response::new(200, "not json")));
        let err = f
            .client
            .send_json::<serde_json::Value>(&ApiRequest::get("/courses"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let f = fixture();
        f.http.set_response(
            COURSES_URL,
            MockResponse::Error(HttpError::Timeout("30s".to_string())),
        );
        let err = f.client.send(&ApiRequest::get("/courses")).await.unwrap_err();
        assert!(matches!(err, ApiError::Http(HttpError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_proactive_refresh_before_expiry() {
        let f = fixture();
        let expiring = jwt_expiring_in(10);
        seed_pair(&f.store, &expiring, "R1");
        f.http.set_response(
            REFRESH_URL,
            MockResponse::json(200, json!({"accessToken": "A2", "refreshToken": "R2"})),
        );
        f.http.set_response(COURSES_URL, MockResponse::json(200, json!([])));
        let client = f.client.with_proactive_refresh(Some(Duration::from_secs(60)));

        client.send(&ApiRequest::get("/courses")).await.unwrap();
        assert_eq!(f.http.request_count(REFRESH_URL), 1);
        assert_eq!(f.http.requests_to(COURSES_URL)[0].bearer_token(), Some("A2"));
    }

    #[tokio::test]
    async fn test_proactive_refresh_skipped_for_fresh_token() {
        let f = fixture();
        let fresh = jwt_expiring_in(3600);
        seed_pair(&f.store, &fresh, "R1");
        f.http.set_response(COURSES_URL, MockResponse::json(200, json!([])));
        let client = f.client.with_proactive_refresh(Some(Duration::from_secs(60)));

        client.send(&ApiRequest::get("/courses")).await.unwrap();
        assert_eq!(f.http.request_count(REFRESH_URL), 0);
        assert_eq!(
            f.http.requests_to(COURSES_URL)[0].bearer_token(),
            Some(fresh.as_str())
        );
    }

    #[tokio::test]
    async fn test_proactive_network_failure_uses_current_token() {
        let f = fixture();
        let expiring = jwt_expiring_in(10);
        seed_pair(&f.store, &expiring, "R1");
        f.http.set_response(REFRESH_URL, MockResponse::status(502));
        f.http.set_response(COURSES_URL, MockResponse::json(200, json!([])));
        let client = f.client.with_proactive_refresh(Some(Duration::from_secs(60)));

        client.send(&ApiRequest::get("/courses")).await.unwrap();
        assert_eq!(
            f.http.requests_to(COURSES_URL)[0].bearer_token(),
            Some(expiring.as_str())
        );
        assert_eq!(
            f.store.value(Partition::Secure, "refresh_token"),
            Some("R1".to_string())
        );
    }
}
