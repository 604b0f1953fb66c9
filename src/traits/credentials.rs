//! Credential store trait abstraction.
//!
//! A plain key/value seam over two partitions. It carries no session
//! policy; grouping writes into transitions is done by
//! [`crate::auth::CredentialsManager`].

use async_trait::async_trait;
use std::fmt;

/// Storage tier a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Credential material (access/refresh tokens). Backed by storage that
    /// resists casual inspection.
    Secure,
    /// General app cache (session snapshot, legacy keys).
    General,
}

impl Partition {
    /// Short label used in file names and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Secure => "secure",
            Partition::General => "general",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A key could not be read.
    #[error("Failed to read {partition}/{key}: {message}")]
    ReadFailed {
        partition: Partition,
        key: String,
        message: String,
    },
    /// A key could not be written.
    #[error("Failed to write {partition}/{key}: {message}")]
    WriteFailed {
        partition: Partition,
        key: String,
        message: String,
    },
    /// A key could not be deleted.
    #[error("Failed to delete {partition}/{key}: {message}")]
    DeleteFailed {
        partition: Partition,
        key: String,
        message: String,
    },
    /// Some keys survived a wipe.
    #[error("Credential wipe incomplete, keys left behind: {}", failed_keys.join(", "))]
    PartialWipe { failed_keys: Vec<String> },
}

/// Trait for partitioned credential storage.
///
/// Implementations must be safe for concurrent reads. Each individual call
/// is expected to be atomic for its key; multi-key consistency is the
/// caller's responsibility.
///
/// # Example
///
/// ```ignore
/// use learnpath_session::traits::{CredentialStore, Partition};
///
/// async fn has_session<S: CredentialStore>(store: &S) -> bool {
///     matches!(store.get(Partition::Secure, "refresh_token").await, Ok(Some(_)))
/// }
/// ```
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read a value.
    ///
    /// # Returns
    /// - `Ok(Some(value))` if the key exists
    /// - `Ok(None)` if it does not
    /// - `Err(error)` if the storage layer failed
    async fn get(&self, partition: Partition, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    async fn put(&self, partition: Partition, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value. Deleting a missing key succeeds.
    async fn delete(&self, partition: Partition, key: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        assert_eq!(
            StoreError::ReadFailed {
                partition: Partition::Secure,
                key: "refresh_token".to_string(),
                message: "locked".to_string(),
            }
            .to_string(),
            "Failed to read secure/refresh_token: locked"
        );
        assert_eq!(
            StoreError::WriteFailed {
                partition: Partition::General,
                key: "user_data".to_string(),
                message: "disk full".to_string(),
            }
            .to_string(),
            "Failed to write general/user_data: disk full"
        );
        assert_eq!(
            StoreError::PartialWipe {
                failed_keys: vec!["secure/access_token".to_string(), "general/auth_token".to_string()],
            }
            .to_string(),
            "Credential wipe incomplete, keys left behind: secure/access_token, general/auth_token"
        );
    }

    #[test]
    fn test_partition_labels() {
        assert_eq!(Partition::Secure.to_string(), "secure");
        assert_eq!(Partition::General.as_str(), "general");
    }
}
