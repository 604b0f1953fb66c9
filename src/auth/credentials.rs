//! Credential model and transition-safe storage policy.
//!
//! [`CredentialsManager`] sits on top of a [`CredentialStore`] and turns
//! individual key writes into whole transitions: a token pair and its
//! session snapshot become visible together or not at all.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::traits::{CredentialStore, Partition, StoreError};

/// Access/refresh token pair.
///
/// Both halves are always present; a store holding only one of them is
/// read back as "no pair".
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Account role as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Learner,
    Reviewer,
    /// A role this client does not understand. Never routed.
    Unknown(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Learner => "LEARNER",
            Role::Reviewer => "REVIEWER",
            Role::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "learner" => Role::Learner,
            "reviewer" => Role::Reviewer,
            _ => Role::Unknown(raw),
        }
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Role::from(raw.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached user/session facts used for cold start without a network call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub role: Role,
    #[serde(default)]
    pub is_goal_set: bool,
    #[serde(default)]
    pub is_placement_test_done: bool,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_message: String,
}

/// Every key the client has ever stored credentials under.
///
/// Only the current keys are written. The legacy ones exist so logout can
/// remove what older app versions left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
    UserData,
    /// Single-token scheme from before refresh tokens existed.
    LegacyAuthToken,
    /// camelCase spelling once written by the 401-retry path.
    LegacyAccessToken,
    LegacyRefreshToken,
}

impl CredentialKey {
    /// Deletion list for logout.
    pub const ALL: [CredentialKey; 6] = [
        CredentialKey::AccessToken,
        CredentialKey::RefreshToken,
        CredentialKey::UserData,
        CredentialKey::LegacyAuthToken,
        CredentialKey::LegacyAccessToken,
        CredentialKey::LegacyRefreshToken,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "access_token",
            CredentialKey::RefreshToken => "refresh_token",
            CredentialKey::UserData => "user_data",
            CredentialKey::LegacyAuthToken => "auth_token",
            CredentialKey::LegacyAccessToken => "accessToken",
            CredentialKey::LegacyRefreshToken => "refreshToken",
        }
    }

    pub fn partition(&self) -> Partition {
        match self {
            CredentialKey::AccessToken
            | CredentialKey::RefreshToken
            | CredentialKey::LegacyAccessToken
            | CredentialKey::LegacyRefreshToken => Partition::Secure,
            CredentialKey::UserData | CredentialKey::LegacyAuthToken => Partition::General,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            CredentialKey::LegacyAuthToken
                | CredentialKey::LegacyAccessToken
                | CredentialKey::LegacyRefreshToken
        )
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.partition(), self.name())
    }
}

/// State that advanced in memory but could not be written to the store.
#[derive(Default)]
struct Unsaved {
    pair: Option<TokenPair>,
    snapshot: Option<SessionSnapshot>,
}

/// Transition-safe access to stored credentials.
///
/// Readers of the token pair hold the read side of an async lock and
/// transitions hold the write side, so no reader can see a new access token
/// next to a stale refresh token.
///
/// When a transition cannot be persisted, its pair and snapshot are kept in
/// memory and served ahead of the store until a later write succeeds or the
/// session is wiped. A rotated refresh token is therefore never lost to a
/// failed write for the rest of the process.
pub struct CredentialsManager {
    store: Arc<dyn CredentialStore>,
    lock: RwLock<()>,
    unsaved: Mutex<Unsaved>,
}

impl CredentialsManager {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            lock: RwLock::new(()),
            unsaved: Mutex::new(Unsaved::default()),
        }
    }

    fn unsaved(&self) -> MutexGuard<'_, Unsaved> {
        self.unsaved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether some state lives only in memory because a write failed.
    pub fn has_unsaved_state(&self) -> bool {
        let unsaved = self.unsaved();
        unsaved.pair.is_some() || unsaved.snapshot.is_some()
    }

    async fn read(&self, key: CredentialKey) -> Result<Option<String>, StoreError> {
        self.store.get(key.partition(), key.name()).await
    }

    async fn read_refresh_token(&self) -> Result<Option<String>, StoreError> {
        let unsaved = self.unsaved().pair.as_ref().map(|pair| pair.refresh_token.clone());
        match unsaved {
            Some(token) => Ok(Some(token)),
            None => self.read(CredentialKey::RefreshToken).await,
        }
    }

    async fn read_pair(&self) -> Result<Option<TokenPair>, StoreError> {
        let unsaved = self.unsaved().pair.clone();
        if unsaved.is_some() {
            return Ok(unsaved);
        }
        let access = self.read(CredentialKey::AccessToken).await?;
        let refresh = self.read(CredentialKey::RefreshToken).await?;
        match (access, refresh) {
            (Some(access), Some(refresh)) => Ok(Some(TokenPair::new(access, refresh))),
            (None, None) => Ok(None),
            (access, refresh) => {
                debug!(
                    access_present = access.is_some(),
                    refresh_present = refresh.is_some(),
                    "Partial token pair in store, treating as absent"
                );
                Ok(None)
            }
        }
    }

    async fn read_snapshot(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        let unsaved = self.unsaved().snapshot.clone();
        if unsaved.is_some() {
            return Ok(unsaved);
        }
        let Some(raw) = self.read(CredentialKey::UserData).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!("Cached session snapshot is unreadable, ignoring it: {}", e);
                Ok(None)
            }
        }
    }

    /// Load the stored token pair. Partial pairs read as `None`.
    pub async fn load_token_pair(&self) -> Result<Option<TokenPair>, StoreError> {
        let _guard = self.lock.read().await;
        self.read_pair().await
    }

    /// Access token of the stored pair, if a complete pair exists.
    pub async fn access_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.load_token_pair().await?.map(|pair| pair.access_token))
    }

    /// Stored refresh token, regardless of whether an access token exists.
    pub async fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.read().await;
        self.read_refresh_token().await
    }

    /// Load the cached session snapshot. Unparseable JSON reads as `None`.
    pub async fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        let _guard = self.lock.read().await;
        self.read_snapshot().await
    }

    /// Load the refresh token and snapshot as one consistent read.
    ///
    /// The refresh token alone decides whether a session exists; a missing
    /// access token is recovered by the next refresh.
    pub async fn load_session(
        &self,
    ) -> Result<(Option<String>, Option<SessionSnapshot>), StoreError> {
        let _guard = self.lock.read().await;
        let refresh_token = self.read_refresh_token().await?;
        let snapshot = self.read_snapshot().await?;
        Ok((refresh_token, snapshot))
    }

    /// Write a token pair (and optionally a snapshot) as one transition.
    ///
    /// On failure the keys already written are restored to their previous
    /// values. If restoring fails too, both tokens are deleted so the store
    /// never holds a mixed pair. Either way the new pair (and snapshot) is
    /// kept in memory and read back from here on.
    pub async fn store_transition(
        &self,
        pair: &TokenPair,
        snapshot: Option<&SessionSnapshot>,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.write().await;
        let result = self.write_transition(pair, snapshot).await;

        let mut unsaved = self.unsaved();
        match &result {
            Ok(()) => {
                unsaved.pair = None;
                if snapshot.is_some() {
                    unsaved.snapshot = None;
                }
            }
            Err(_) => {
                unsaved.pair = Some(pair.clone());
                if let Some(snapshot) = snapshot {
                    unsaved.snapshot = Some(snapshot.clone());
                }
            }
        }
        result
    }

    async fn write_transition(
        &self,
        pair: &TokenPair,
        snapshot: Option<&SessionSnapshot>,
    ) -> Result<(), StoreError> {

        let mut writes = vec![
            (CredentialKey::RefreshToken, pair.refresh_token.clone()),
            (CredentialKey::AccessToken, pair.access_token.clone()),
        ];
        if let Some(snapshot) = snapshot {
            writes.push((CredentialKey::UserData, encode_snapshot(snapshot)?));
        }

        let mut previous = Vec::with_capacity(writes.len());
        for (key, _) in &writes {
            // An unreadable previous value is rolled back to "absent".
            previous.push((*key, self.read(*key).await.ok().flatten()));
        }

        for (applied, (key, value)) in writes.iter().enumerate() {
            if let Err(e) = self.store.put(key.partition(), key.name(), value).await {
                warn!("Credential transition failed at {}: {}", key, e);
                self.rollback(&previous[..applied]).await;
                return Err(e);
            }
        }

        debug!(with_snapshot = snapshot.is_some(), "Credential transition stored");
        Ok(())
    }

    async fn rollback(&self, applied: &[(CredentialKey, Option<String>)]) {
        let mut restored = true;
        for (key, value) in applied {
            let result = match value {
                Some(value) => self.store.put(key.partition(), key.name(), value).await,
                None => self.store.delete(key.partition(), key.name()).await,
            };
            if let Err(e) = result {
                warn!("Could not restore {} after failed transition: {}", key, e);
                restored = false;
            }
        }

        if !restored {
            for key in [CredentialKey::AccessToken, CredentialKey::RefreshToken] {
                if let Err(e) = self.store.delete(key.partition(), key.name()).await {
                    error!("Could not clear {} after failed rollback: {}", key, e);
                }
            }
        }
    }

    /// Replace the cached snapshot only.
    pub async fn store_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        let _guard = self.lock.write().await;
        let key = CredentialKey::UserData;
        let result = match encode_snapshot(snapshot) {
            Ok(raw) => self.store.put(key.partition(), key.name(), &raw).await,
            Err(e) => Err(e),
        };
        self.unsaved().snapshot = match &result {
            Ok(()) => None,
            Err(_) => Some(snapshot.clone()),
        };
        result
    }

    /// Delete every credential key, current and legacy.
    ///
    /// Keeps going past individual failures and reports the keys that
    /// survived as [`StoreError::PartialWipe`].
    pub async fn wipe(&self) -> Result<(), StoreError> {
        let _guard = self.lock.write().await;
        *self.unsaved() = Unsaved::default();
        let mut failed_keys = Vec::new();

        for key in CredentialKey::ALL {
            if let Err(e) = self.store.delete(key.partition(), key.name()).await {
                error!("Failed to delete {} during logout: {}", key, e);
                failed_keys.push(key.to_string());
            }
        }

        if failed_keys.is_empty() {
            Ok(())
        } else {
            Err(StoreError::PartialWipe { failed_keys })
        }
    }
}

fn encode_snapshot(snapshot: &SessionSnapshot) -> Result<String, StoreError> {
    let key = CredentialKey::UserData;
    serde_json::to_string(snapshot).map_err(|e| StoreError::WriteFailed {
        partition: key.partition(),
        key: key.name().to_string(),
        message: e.to_string(),
    })
}
