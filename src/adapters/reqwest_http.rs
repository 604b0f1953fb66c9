//! Production transport over reqwest.
//!
//! Every status code comes back as a [`Response`]; only failures to get a
//! response at all become [`HttpError`].

use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

use crate::traits::{Headers, HttpClient, HttpError, Method, Response};

const USER_AGENT: &str = concat!("learnpath-session/", env!("CARGO_PKG_VERSION"));

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            HttpError::Timeout(message)
        } else if err.is_connect() {
            HttpError::ConnectionFailed(message)
        } else if err.is_builder() {
            HttpError::InvalidUrl(message)
        } else {
            HttpError::Other(message)
        }
    }
}

/// [`HttpClient`] backed by a shared `reqwest::Client`.
///
/// # Example
///
/// ```ignore
/// use learnpath_session::adapters::ReqwestHttpClient;
/// use learnpath_session::traits::{Headers, HttpClient, Method};
///
/// let client = ReqwestHttpClient::with_timeout(std::time::Duration::from_secs(30))?;
/// let response = client
///     .send(Method::Get, "https://api.learnpath.app/courses", None, &Headers::new())
///     .await?;
/// println!("Status: {}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Client without a transport timeout.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Client whose requests fail with [`HttpError::Timeout`] after
    /// `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn response_headers(map: &reqwest::header::HeaderMap) -> Headers {
    // Non-UTF-8 header values are dropped.
    map.iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect()
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
        headers: &Headers,
    ) -> Result<Response, HttpError> {
        let mut request = self.client.request(method.into(), url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.body(body.to_owned());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        trace!(%method, url, status, "HTTP exchange");

        let headers = response_headers(response.headers());
        let body = response.bytes().await?;
        Ok(Response::with_headers(status, headers, body))
    }
}
