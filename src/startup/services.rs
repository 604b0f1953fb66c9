//! Session service construction.

use std::sync::Arc;

use crate::adapters::{FileCredentialStore, ReqwestHttpClient};
use crate::auth::{AuthApiClient, CredentialsManager, RefreshCoordinator, SnapshotListener};
use crate::config::SessionConfig;
use crate::pipeline::{AuthenticatedClient, SessionExpiryHandler};
use crate::session::{SessionBroadcaster, SessionOrchestrator};
use crate::traits::{CredentialStore, HttpClient, HttpError};

/// Error building the session services.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// No storage directory configured and no home directory to default to
    #[error("No credential storage directory available; set LEARNPATH_STORAGE_DIR")]
    NoStorageDir,
    /// HTTP client could not be created
    #[error("Failed to create HTTP client: {0}")]
    Http(#[from] HttpError),
}

/// Every long-lived session component, wired together.
pub struct SessionServices {
    pub config: SessionConfig,
    pub credentials: Arc<CredentialsManager>,
    pub auth_api: AuthApiClient,
    pub refresher: RefreshCoordinator,
    pub orchestrator: Arc<SessionOrchestrator>,
    pub client: AuthenticatedClient,
}

impl SessionServices {
    /// Wire the services over the given transport and store.
    pub fn build(
        config: SessionConfig,
        http: Arc<dyn HttpClient>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let credentials = Arc::new(CredentialsManager::new(store));
        let auth_api = AuthApiClient::new(config.api_base_url.clone(), Arc::clone(&http));
        let refresher = RefreshCoordinator::new(
            auth_api.clone(),
            Arc::clone(&credentials),
            config.refresh_timeout,
        );
        let orchestrator = Arc::new(SessionOrchestrator::new(
            Arc::clone(&credentials),
            SessionBroadcaster::new(),
        ));
        let listener: Arc<dyn SnapshotListener> = orchestrator.clone();
        refresher.set_snapshot_listener(listener);
        let expiry_handler: Arc<dyn SessionExpiryHandler> = orchestrator.clone();
        let client = AuthenticatedClient::new(
            config.api_base_url.clone(),
            http,
            Arc::clone(&credentials),
            refresher.clone(),
        )
        .with_proactive_refresh(config.proactive_refresh_threshold)
        .with_expiry_handler(expiry_handler);

        Self {
            config,
            credentials,
            auth_api,
            refresher,
            orchestrator,
            client,
        }
    }

    /// Production wiring: reqwest transport and file-backed credentials.
    pub fn from_config(config: SessionConfig) -> Result<Self, StartupError> {
        let dir = config
            .storage_dir
            .clone()
            .ok_or(StartupError::NoStorageDir)?;
        let http = ReqwestHttpClient::with_timeout(config.request_timeout)?;
        let store = FileCredentialStore::new(dir);
        Ok(Self::build(config, Arc::new(http), Arc::new(store)))
    }
}
