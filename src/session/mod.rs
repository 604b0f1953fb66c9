//! Session state machine, broadcaster and orchestrator.
//!
//! - [`SessionOrchestrator`] - initialize, login, logout and re-route
//! - [`SessionBroadcaster`] - app-wide observable [`SessionState`]
//! - [`decide_route`] - which screen tree a signed-in user lands on

pub mod broadcaster;
pub mod orchestrator;
pub mod state;

pub use broadcaster::{SessionBroadcaster, Subscription};
pub use orchestrator::{LoginCredentials, SessionOrchestrator, Transition};
pub use state::{decide_route, resolve_state, RouteDecision, SessionState};
