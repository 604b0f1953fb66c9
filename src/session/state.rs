//! Session state machine values and the route decision.

use std::fmt;

use crate::auth::{Role, SessionSnapshot};

/// Screen tree the navigation layer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteDecision {
    Login,
    PlacementTest,
    MainApp,
    ReviewerMainApp,
}

impl RouteDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::Login => "login",
            RouteDecision::PlacementTest => "placement-test",
            RouteDecision::MainApp => "main-app",
            RouteDecision::ReviewerMainApp => "reviewer-main-app",
        }
    }
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-wide session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been read yet.
    Uninitialized,
    /// Durable state is being read.
    Loading,
    Unauthenticated,
    Authenticated { role: Role, route: RouteDecision },
}

impl SessionState {
    /// Route for this state. Anything but `Authenticated` lands on login.
    pub fn route(&self) -> RouteDecision {
        match self {
            SessionState::Authenticated { route, .. } => *route,
            _ => RouteDecision::Login,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Loading => "loading",
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticated { .. } => "authenticated",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Authenticated { role, route } => {
                write!(f, "authenticated as {} ({})", role, route)
            }
            other => f.write_str(other.name()),
        }
    }
}

/// Route for a signed-in user, or `None` for a role this client cannot route.
pub fn decide_route(snapshot: &SessionSnapshot) -> Option<RouteDecision> {
    match snapshot.role {
        Role::Reviewer => Some(RouteDecision::ReviewerMainApp),
        Role::Learner if snapshot.is_placement_test_done => Some(RouteDecision::MainApp),
        Role::Learner => Some(RouteDecision::PlacementTest),
        Role::Unknown(_) => None,
    }
}

/// State for a given credential picture. Fails closed.
///
/// A snapshot is only trusted next to a stored refresh token.
pub fn resolve_state(has_refresh_token: bool, snapshot: Option<&SessionSnapshot>) -> SessionState {
    if !has_refresh_token {
        return SessionState::Unauthenticated;
    }
    match snapshot.and_then(|s| decide_route(s).map(|route| (s, route))) {
        Some((snapshot, route)) => SessionState::Authenticated {
            role: snapshot.role.clone(),
            route,
        },
        None => SessionState::Unauthenticated,
    }
}
