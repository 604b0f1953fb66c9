//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP transport used by the auth endpoints and the pipeline
//! - [`CredentialStore`] - Partitioned key/value credential storage

pub mod credentials;
pub mod http;

pub use credentials::{CredentialStore, Partition, StoreError};
pub use http::{Headers, HttpClient, HttpError, Method, Response};
