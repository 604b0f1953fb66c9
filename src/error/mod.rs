//! Error handling for the session subsystem.
//!
//! - **Error Categories**: High-level classification for handling decisions
//! - **Session Errors**: refresh, decode and persistence failures (fatal vs recoverable)
//! - **API Errors**: what callers of the authenticated pipeline see
//!
//! | Error                        | Category | Fatal to session |
//! |------------------------------|----------|------------------|
//! | `NoRefreshToken`             | Auth     | Yes              |
//! | `RefreshRejected`            | Auth     | Yes              |
//! | `Network`                    | Network  | No               |
//! | `Decode`                     | Client   | No               |
//! | `StoreRead` / `StoreWrite`   | Storage  | No               |

mod api;
mod category;
mod session;

pub use api::ApiError;
pub use category::ErrorCategory;
pub use session::SessionError;
