//! Composition root.
//!
//! Builds the single set of session services for the process and wires
//! them together. Nothing here is global; the caller owns the
//! [`SessionServices`] and hands out its parts.
//!
//! # Usage
//!
//! ```ignore
//! use learnpath_session::config::SessionConfig;
//! use learnpath_session::startup::SessionServices;
//!
//! let services = SessionServices::from_config(SessionConfig::from_env())?;
//! let state = services.orchestrator.initialize().await;
//! ```

pub mod services;

pub use services::{SessionServices, StartupError};
