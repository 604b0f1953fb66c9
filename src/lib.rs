//! LearnPath session - authentication and session lifecycle for the
//! LearnPath client.
//!
//! This library exposes modules for use by the app shell and in
//! integration tests.

pub mod adapters;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod startup;
pub mod traits;
