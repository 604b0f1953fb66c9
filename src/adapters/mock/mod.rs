//! Mock implementations for testing.
//!
//! - [`MockHttpClient`] - HTTP client with scripted per-URL responses
//! - [`InMemoryCredentialStore`] - In-memory partitioned credential storage

pub mod credentials;
pub mod http;

pub use credentials::InMemoryCredentialStore;
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
