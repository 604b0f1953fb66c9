//! Session facade used by the rest of the app.
//!
//! [`SessionOrchestrator`] owns the session state machine. Each transition
//! writes durable state through [`CredentialsManager`], updates the
//! in-memory snapshot and broadcasts the resulting [`SessionState`].
//! Transitions are serialized, and a storage failure never stops the
//! in-memory state from advancing; it is reported in the returned
//! [`Transition`] instead.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::auth::{token, CredentialsManager, LoginResult, SessionSnapshot, SnapshotListener};
use crate::error::SessionError;
use crate::pipeline::SessionExpiryHandler;
use crate::traits::StoreError;

use super::broadcaster::{SessionBroadcaster, Subscription};
use super::state::{resolve_state, SessionState};

/// Credentials the user typed for a password login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub email: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// Outcome of a state transition.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State after the transition (already broadcast).
    pub state: SessionState,
    /// Persistence failure, if the durable write did not go through.
    /// Always [`SessionError::StoreWrite`].
    pub store_error: Option<SessionError>,
}

impl Transition {
    pub fn is_persisted(&self) -> bool {
        self.store_error.is_none()
    }
}

#[derive(Default)]
struct Memory {
    snapshot: Option<SessionSnapshot>,
    last_store_error: Option<SessionError>,
}

/// Owns session state for the process.
///
/// Created once by the composition root and shared by `Arc`.
pub struct SessionOrchestrator {
    credentials: Arc<CredentialsManager>,
    broadcaster: SessionBroadcaster,
    transition_lock: tokio::sync::Mutex<()>,
    memory: Mutex<Memory>,
}

impl SessionOrchestrator {
    pub fn new(credentials: Arc<CredentialsManager>, broadcaster: SessionBroadcaster) -> Self {
        Self {
            credentials,
            broadcaster,
            transition_lock: tokio::sync::Mutex::new(()),
            memory: Mutex::new(Memory::default()),
        }
    }

    fn memory(&self) -> MutexGuard<'_, Memory> {
        self.memory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_store_result(&self, result: Result<(), StoreError>) -> Option<SessionError> {
        let store_error = result.err().map(SessionError::StoreWrite);
        if let Some(e) = &store_error {
            warn!(
                error_code = e.error_code(),
                category = %e.category(),
                "Session state advanced but was not persisted: {}",
                e
            );
        }
        self.memory().last_store_error = store_error.clone();
        store_error
    }

    /// Read durable state and derive the session from it. Caller holds the
    /// transition lock.
    async fn load_state(&self) -> SessionState {
        let (state, snapshot) = match self.credentials.load_session().await {
            Ok((refresh_token, snapshot)) => {
                let state = resolve_state(refresh_token.is_some(), snapshot.as_ref());
                let snapshot = if state.is_authenticated() { snapshot } else { None };
                (state, snapshot)
            }
            Err(e) => {
                warn!("Could not read stored session, signing out: {}", e);
                (SessionState::Unauthenticated, None)
            }
        };
        self.memory().snapshot = snapshot;
        state
    }

    /// Read durable state at startup and broadcast the resulting state.
    ///
    /// Broadcasts `Loading` first. Missing tokens, a missing or unknown
    /// role, and read failures all resolve to `Unauthenticated`.
    pub async fn initialize(&self) -> SessionState {
        let _guard = self.transition_lock.lock().await;
        self.broadcaster.broadcast(SessionState::Loading);

        let state = self.load_state().await;
        info!(state = %state, "Session initialized");
        self.broadcaster.broadcast(state.clone());
        state
    }

    /// Recompute the session from durable state and broadcast it.
    ///
    /// Always derives the route from what is stored now, never from the
    /// previous in-memory state, so back-to-back calls settle on the same
    /// answer.
    pub async fn refresh_auth(&self) -> SessionState {
        let _guard = self.transition_lock.lock().await;
        let state = self.load_state().await;
        info!(state = %state, "Session reloaded");
        self.broadcaster.broadcast(state.clone());
        state
    }

    async fn complete(&self, login: &LoginResult, email: &str) -> Result<Transition, SessionError> {
        let snapshot = login.snapshot(email)?;
        let pair = login.token_pair();

        let _guard = self.transition_lock.lock().await;
        let result = self
            .credentials
            .store_transition(&pair, Some(&snapshot))
            .await;
        let store_error = self.record_store_result(result);

        let state = resolve_state(true, Some(&snapshot));
        self.memory().snapshot = Some(snapshot);
        info!(state = %state, "Signed in");
        self.broadcaster.broadcast(state.clone());
        Ok(Transition { state, store_error })
    }

    /// Apply a successful password (or OTP) login.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownRole`] without touching any state if
    /// the login payload carries a role this client cannot route.
    pub async fn complete_login(
        &self,
        login: &LoginResult,
        credentials: &LoginCredentials,
    ) -> Result<Transition, SessionError> {
        self.complete(login, &credentials.email).await
    }

    /// Apply a successful social login.
    ///
    /// The identity provider does not hand us an email, so the snapshot's
    /// email stays empty.
    pub async fn complete_google_login(&self, login: &LoginResult) -> Result<Transition, SessionError> {
        self.complete(login, "").await
    }

    /// Delete every credential key and sign out.
    ///
    /// The state becomes `Unauthenticated` even if some keys could not be
    /// deleted; those are listed in `store_error`.
    pub async fn logout(&self) -> Transition {
        let _guard = self.transition_lock.lock().await;
        self.sign_out().await
    }

    /// Wipe credentials and broadcast `Unauthenticated`. Caller holds the
    /// transition lock.
    async fn sign_out(&self) -> Transition {
        let result = self.credentials.wipe().await;
        if let Err(e) = &result {
            error!("Credential wipe incomplete during logout: {}", e);
        }
        let store_error = self.record_store_result(result);

        self.memory().snapshot = None;
        info!("Signed out");
        self.broadcaster.broadcast(SessionState::Unauthenticated);
        Transition {
            state: SessionState::Unauthenticated,
            store_error,
        }
    }

    async fn update_snapshot<F>(&self, update: F) -> Transition
    where
        F: FnOnce(&mut SessionSnapshot),
    {
        let _guard = self.transition_lock.lock().await;
        let current = self.memory().snapshot.clone();
        let Some(mut snapshot) = current else {
            let state = self.broadcaster.current();
            warn!(state = %state, "No active session to update");
            return Transition {
                state,
                store_error: None,
            };
        };
        update(&mut snapshot);

        let result = self.credentials.store_snapshot(&snapshot).await;
        let store_error = self.record_store_result(result);
        let state = if store_error.is_none() {
            self.load_state().await
        } else {
            let state = resolve_state(true, Some(&snapshot));
            self.memory().snapshot = Some(snapshot);
            state
        };

        self.broadcaster.broadcast(state.clone());
        Transition { state, store_error }
    }

    /// Record that the learner finished the placement test and re-route.
    pub async fn mark_placement_test_done(&self) -> Transition {
        self.update_snapshot(|snapshot| snapshot.is_placement_test_done = true)
            .await
    }

    /// Record that the learner set a goal.
    pub async fn mark_goal_set(&self) -> Transition {
        self.update_snapshot(|snapshot| snapshot.is_goal_set = true).await
    }

    /// Advisory expiry check. Undecodable tokens count as expired.
    pub fn is_expired(&self, access_token: &str) -> bool {
        token::is_expired(access_token)
    }

    pub fn current_state(&self) -> SessionState {
        self.broadcaster.current()
    }

    /// In-memory snapshot of the signed-in user.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.memory().snapshot.clone()
    }

    /// Most recent persistence failure, cleared by the next successful write.
    pub fn last_store_error(&self) -> Option<SessionError> {
        self.memory().last_store_error.clone()
    }

    pub fn broadcaster(&self) -> &SessionBroadcaster {
        &self.broadcaster
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.broadcaster.subscribe(callback)
    }
}

#[async_trait]
impl SessionExpiryHandler for SessionOrchestrator {
    /// Sign out once per expired session. Waiters that shared the same
    /// failed refresh find the session already cleared and return.
    async fn session_expired(&self, error: &SessionError) {
        let _guard = self.transition_lock.lock().await;
        if self.broadcaster.current() == SessionState::Unauthenticated
            && matches!(self.credentials.refresh_token().await, Ok(None))
        {
            debug!(error_code = error.error_code(), "Session already signed out");
            return;
        }

        info!(
            error_code = error.error_code(),
            category = %error.category(),
            "Session expired, signing out"
        );
        let transition = self.sign_out().await;
        if let Some(e) = transition.store_error {
            warn!("Expired session not fully cleared: {}", e);
        }
    }
}

#[async_trait]
impl SnapshotListener for SessionOrchestrator {
    /// Re-route after a refresh delivered new role or onboarding fields.
    /// Ignored unless a session is active.
    async fn snapshot_refreshed(&self, snapshot: &SessionSnapshot) {
        let _guard = self.transition_lock.lock().await;
        if !self.broadcaster.current().is_authenticated() {
            debug!("Refreshed session fields arrived without an active session");
            return;
        }

        let state = resolve_state(true, Some(snapshot));
        if !state.is_authenticated() {
            warn!("Refreshed session cannot be routed; keeping the current route");
            return;
        }
        self.memory().snapshot = Some(snapshot.clone());
        info!(state = %state, "Session fields updated by refresh");
        self.broadcaster.broadcast(state);
    }
}
