//! Authentication module.
//!
//! This module provides:
//! - Credential model and transition-safe storage policy
//! - Access token expiry inspection
//! - Client for the backend authentication endpoints
//! - Single-flight token refresh

pub mod api;
pub mod credentials;
pub mod refresh;
pub mod token;

pub use api::{AuthApiClient, LoginResult, RefreshResponse, DEFAULT_API_URL};
pub use credentials::{CredentialKey, CredentialsManager, Role, SessionSnapshot, TokenPair};
pub use refresh::{RefreshCoordinator, SnapshotListener};
