//! Single-flight token refresh.
//!
//! [`RefreshCoordinator::refresh`] exchanges the stored refresh token for a
//! new pair. While one exchange is running every other caller joins it and
//! receives the same outcome, so at most one refresh request is ever in
//! flight per process.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::SessionError;

use super::api::AuthApiClient;
use super::credentials::{CredentialsManager, SessionSnapshot, TokenPair};

/// Receives the merged session snapshot when a refresh carries role or
/// onboarding fields.
#[async_trait]
pub trait SnapshotListener: Send + Sync {
    async fn snapshot_refreshed(&self, snapshot: &SessionSnapshot);
}

type RefreshFuture = Shared<BoxFuture<'static, Result<TokenPair, SessionError>>>;

struct InFlight {
    id: u64,
    future: RefreshFuture,
}

struct Inner {
    api: AuthApiClient,
    credentials: Arc<CredentialsManager>,
    timeout: Duration,
    in_flight: Mutex<Option<InFlight>>,
    next_id: AtomicU64,
    network_calls: AtomicUsize,
    listener: Mutex<Option<Arc<dyn SnapshotListener>>>,
}

impl Inner {
    fn slot(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Clear the in-flight slot if it still belongs to refresh `id`.
    fn finish(&self, id: u64) {
        let mut slot = self.slot();
        if slot.as_ref().map(|flight| flight.id) == Some(id) {
            *slot = None;
        }
    }

    async fn run(&self) -> Result<TokenPair, SessionError> {
        let refresh_token = self
            .credentials
            .refresh_token()
            .await
            .map_err(SessionError::StoreRead)?
            .ok_or(SessionError::NoRefreshToken)?;

        self.network_calls.fetch_add(1, Ordering::SeqCst);
        let response = match tokio::time::timeout(self.timeout, self.api.refresh(&refresh_token))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(SessionError::Network {
                    message: format!("refresh timed out after {}s", self.timeout.as_secs_f32()),
                })
            }
        };

        let pair = response.token_pair();
        let snapshot = if response.has_session_fields() {
            match self.credentials.load_snapshot().await {
                Ok(Some(mut cached)) => {
                    response.apply_to(&mut cached);
                    Some(cached)
                }
                Ok(None) => response.to_snapshot(),
                Err(e) => {
                    warn!("Could not read cached session while refreshing: {}", e);
                    None
                }
            }
        } else {
            None
        };

        // The server has already rotated the pair, so a failed write still
        // hands the new pair to the waiters.
        if let Err(e) = self
            .credentials
            .store_transition(&pair, snapshot.as_ref())
            .await
        {
            let e = SessionError::StoreWrite(e);
            warn!(
                error_code = e.error_code(),
                category = %e.category(),
                "Refreshed tokens kept in memory only: {}",
                e
            );
        }

        if let Some(snapshot) = &snapshot {
            let listener = self
                .listener
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone();
            if let Some(listener) = listener {
                listener.snapshot_refreshed(snapshot).await;
            }
        }

        info!("Session tokens refreshed");
        Ok(pair)
    }
}

/// Coordinates refresh-token exchanges so only one runs at a time.
///
/// Cloning is cheap; clones share the in-flight guard.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    /// Create a coordinator. `timeout` bounds each refresh request.
    pub fn new(api: AuthApiClient, credentials: Arc<CredentialsManager>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                credentials,
                timeout,
                in_flight: Mutex::new(None),
                next_id: AtomicU64::new(0),
                network_calls: AtomicUsize::new(0),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Register the listener told about session fields delivered by a
    /// refresh. Replaces any earlier listener.
    pub fn set_snapshot_listener(&self, listener: Arc<dyn SnapshotListener>) {
        *self
            .inner
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(listener);
    }

    /// Refresh the session, or join the refresh already in flight.
    ///
    /// On failure the credential store is left as it was. A timed out
    /// refresh resolves to [`SessionError::Network`] and releases the guard,
    /// so the next call starts over.
    pub async fn refresh(&self) -> Result<TokenPair, SessionError> {
        let future = {
            let mut slot = self.inner.slot();
            match slot.as_ref() {
                Some(flight) if flight.future.peek().is_none() => {
                    debug!("Joining in-flight refresh");
                    flight.future.clone()
                }
                _ => {
                    let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
                    let inner = Arc::clone(&self.inner);
                    let future = async move {
                        let result = inner.run().await;
                        inner.finish(id);
                        result
                    }
                    .boxed()
                    .shared();
                    *slot = Some(InFlight {
                        id,
                        future: future.clone(),
                    });
                    future
                }
            }
        };

        let result = future.await;
        if let Err(e) = &result {
            debug!(error_code = e.error_code(), fatal = e.is_fatal(), "Refresh failed");
        }
        result
    }

    /// Whether a refresh is currently running.
    pub fn is_refreshing(&self) -> bool {
        self.inner
            .slot()
            .as_ref()
            .map(|flight| flight.future.peek().is_none())
            .unwrap_or(false)
    }

    /// Number of refresh requests sent to the backend so far.
    pub fn refresh_count(&self) -> usize {
        self.inner.network_calls.load(Ordering::SeqCst)
    }
}
