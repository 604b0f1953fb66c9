//! Mock HTTP client for testing.
//!
//! Responses are scripted per URL as a queue: each call pops the front
//! entry, and the last entry keeps answering once the queue is drained.
//! That makes "401 then 200" sequences easy to express.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::traits::{Headers, HttpClient, HttpError, Method, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
}

impl RecordedRequest {
    /// The bearer token sent with this request, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get("Authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a response (any status)
    Success(Response),
    /// Return a transport error
    Error(HttpError),
}

impl MockResponse {
    /// JSON response with the given status.
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        MockResponse::Success(Response::json_body(status, &value))
    }

    /// Empty-bodied response with the given status.
    pub fn status(status: u16) -> Self {
        MockResponse::Success(Response::new(status, bytes::Bytes::new()))
    }
}

#[derive(Debug, Default)]
struct Inner {
    responses: HashMap<String, VecDeque<MockResponse>>,
    delays: HashMap<String, Duration>,
    default_response: Option<MockResponse>,
    requests: Vec<RecordedRequest>,
}

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// use learnpath_session::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.push_response("https://api.test/courses", MockResponse::status(401));
/// client.push_response("https://api.test/courses", MockResponse::json(200, json!([])));
///
/// // first call sees 401, every later call sees 200
/// assert_eq!(client.request_count("https://api.test/courses"), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    inner: Arc<Mutex<Inner>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the script for `url` with a single response.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut queue = VecDeque::new();
        queue.push_back(response);
        self.lock().responses.insert(url.to_string(), queue);
    }

    /// Append a response to the script for `url`.
    pub fn push_response(&self, url: &str, response: MockResponse) {
        self.lock()
            .responses
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    /// Delay every response for `url` (to hold requests in flight).
    pub fn set_delay(&self, url: &str, delay: Duration) {
        self.lock().delays.insert(url.to_string(), delay);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        self.lock().default_response = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Requests made to exactly `url`.
    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }

    /// Number of requests made to exactly `url`.
    pub fn request_count(&self, url: &str) -> usize {
        self.lock().requests.iter().filter(|r| r.url == url).count()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    fn matching_key(inner: &Inner, url: &str) -> Option<String> {
        if inner.responses.contains_key(url) {
            return Some(url.to_string());
        }
        // Longest prefix wins so "/auth/refresh" beats "/auth".
        inner
            .responses
            .keys()
            .filter(|pattern| url.starts_with(pattern.as_str()))
            .max_by_key(|pattern| pattern.len())
            .cloned()
    }

    fn next_response(&self, url: &str) -> (Option<MockResponse>, Option<Duration>) {
        let mut inner = self.lock();
        let delay = inner.delays.get(url).copied();
        let response = match Self::matching_key(&inner, url) {
            Some(key) => inner.responses.get_mut(&key).and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            }),
            None => inner.default_response.clone(),
        };
        (response, delay)
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
        headers: &Headers,
    ) -> Result<Response, HttpError> {
        self.lock().requests.push(RecordedRequest {
            method,
            url: url.to_string(),
            headers: headers.clone(),
            body: body.map(str::to_string),
        });

        let (response, delay) = self.next_response(url);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match response {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}
