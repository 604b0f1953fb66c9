//! File-based credential store adapter.
//!
//! Each partition is one JSON object file under the storage directory
//! (`secure.json`, `general.json`). Files are replaced via temp file and
//! rename, so a crash mid-write leaves the previous map intact. On Unix the
//! secure file is only readable by the owner.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::traits::{CredentialStore, Partition, StoreError};

/// Default storage directory name under the home directory.
const STORAGE_DIR: &str = ".learnpath";

type PartitionMap = BTreeMap<String, String>;

/// File-based credential store.
///
/// # Example
///
/// ```ignore
/// use learnpath_session::adapters::FileCredentialStore;
/// use learnpath_session::traits::{CredentialStore, Partition};
///
/// let store = FileCredentialStore::default_location().expect("home directory");
/// store.put(Partition::General, "user_data", "{}").await?;
/// ```
#[derive(Debug)]
pub struct FileCredentialStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles so concurrent puts don't lose keys.
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store under `~/.learnpath`.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn default_location() -> Option<Self> {
        let home = dirs::home_dir()?;
        Some(Self::new(home.join(STORAGE_DIR)))
    }

    /// Storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `partition`.
    pub fn partition_path(&self, partition: Partition) -> PathBuf {
        self.dir.join(format!("{}.json", partition.as_str()))
    }

    async fn read_map(&self, partition: Partition, key: &str) -> Result<PartitionMap, StoreError> {
        let path = self.partition_path(partition);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PartitionMap::new()),
            Err(e) => {
                return Err(StoreError::ReadFailed {
                    partition,
                    key: key.to_string(),
                    message: e.to_string(),
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(PartitionMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| StoreError::ReadFailed {
            partition,
            key: key.to_string(),
            message: format!("corrupt {}: {}", path.display(), e),
        })
    }

    async fn write_map(
        &self,
        partition: Partition,
        key: &str,
        map: &PartitionMap,
    ) -> Result<(), StoreError> {
        let write_failed = |message: String| StoreError::WriteFailed {
            partition,
            key: key.to_string(),
            message,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| write_failed(e.to_string()))?;

        let path = self.partition_path(partition);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(map).map_err(|e| write_failed(e.to_string()))?;

        write_new_file(&tmp, &json, partition == Partition::Secure)
            .await
            .map_err(|e| write_failed(e.to_string()))?;

        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| write_failed(e.to_string()))
    }
}

/// Create `path` fresh and write `contents`. An owner-only file gets its
/// mode at creation, so the contents are never readable by others.
async fn write_new_file(path: &Path, contents: &[u8], owner_only: bool) -> std::io::Result<()> {
    // A temp file left by a crash may carry looser permissions.
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    if owner_only {
        restrict_to_owner(&mut options);
    }
    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

#[cfg(unix)]
fn restrict_to_owner(options: &mut tokio::fs::OpenOptions) {
    options.mode(0o600);
}

#[cfg(not(unix))]
fn restrict_to_owner(_options: &mut tokio::fs::OpenOptions) {}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, partition: Partition, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.read_map(partition, key).await?;
        Ok(map.get(key).cloned())
    }

    async fn put(&self, partition: Partition, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map(partition, key).await.map_err(|e| match e {
            StoreError::ReadFailed {
                partition,
                key,
                message,
            } => StoreError::WriteFailed {
                partition,
                key,
                message,
            },
            other => other,
        })?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(partition, key, &map).await
    }

    async fn delete(&self, partition: Partition, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let delete_failed = |message: String| StoreError::DeleteFailed {
            partition,
            key: key.to_string(),
            message,
        };

        let mut map = match self.read_map(partition, key).await {
            Ok(map) => map,
            // An unreadable partition cannot be cleaned key by key; remove the file.
            Err(StoreError::ReadFailed { .. }) => {
                return match tokio::fs::remove_file(self.partition_path(partition)).await {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(delete_failed(e.to_string())),
                };
            }
            Err(e) => return Err(e),
        };

        if map.remove(key).is_none() {
            return Ok(());
        }
        self.write_map(partition, key, &map)
            .await
            .map_err(|e| delete_failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(temp_dir: &TempDir) -> FileCredentialStore {
        FileCredentialStore::new(temp_dir.path().join(STORAGE_DIR))
    }

    #[test]
    fn test_default_location() {
        let store = FileCredentialStore::default_location();
        assert!(store.is_some());
        assert!(store.unwrap().dir().ends_with(STORAGE_DIR));
    }

    #[tokio::test]
    async fn test_get_missing_file_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        assert_eq!(store.get(Partition::Secure, "access_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.put(Partition::Secure, "refresh_token", "R1").await.unwrap();
        store.put(Partition::Secure, "access_token", "A1").await.unwrap();

        assert_eq!(
            store.get(Partition::Secure, "refresh_token").await.unwrap(),
            Some("R1".to_string())
        );
        assert_eq!(
            store.get(Partition::Secure, "access_token").await.unwrap(),
            Some("A1".to_string())
        );

        store.delete(Partition::Secure, "access_token").await.unwrap();
        assert_eq!(store.get(Partition::Secure, "access_token").await.unwrap(), None);
        assert_eq!(
            store.get(Partition::Secure, "refresh_token").await.unwrap(),
            Some("R1".to_string())
        );
    }

    #[tokio::test]
    async fn test_partitions_are_separate_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store.put(Partition::Secure, "access_token", "A1").await.unwrap();
        store.put(Partition::General, "user_data", "{}").await.unwrap();

        assert!(store.partition_path(Partition::Secure).exists());
        assert!(store.partition_path(Partition::General).exists());
        assert_eq!(store.get(Partition::General, "access_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_key_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.delete(Partition::General, "auth_token").await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.partition_path(Partition::General), "not json").unwrap();

        let result = store.get(Partition::General, "user_data").await;
        assert!(matches!(result, Err(StoreError::ReadFailed { .. })));

        // Deleting from a corrupt partition removes the file.
        store.delete(Partition::General, "user_data").await.unwrap();
        assert!(!store.partition_path(Partition::General).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_secure_partition_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.put(Partition::Secure, "access_token", "A1").await.unwrap();

        let mode = std::fs::metadata(store.partition_path(Partition::Secure))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stale_temp_file_replaced_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        std::fs::create_dir_all(store.dir()).unwrap();
        let tmp = store.partition_path(Partition::Secure).with_extension("json.tmp");
        std::fs::write(&tmp, "leftover").unwrap();
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644)).unwrap();

        store.put(Partition::Secure, "refresh_token", "R1").await.unwrap();

        assert!(!tmp.exists());
        let mode = std::fs::metadata(store.partition_path(Partition::Secure))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(
            store.get(Partition::Secure, "refresh_token").await.unwrap(),
            Some("R1".to_string())
        );
    }

    #[tokio::test]
    async fn test_concurrent_puts_keep_all_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(store_in(&temp_dir));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .put(Partition::General, &format!("key_{i}"), "v")
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..8 {
            assert!(store
                .get(Partition::General, &format!("key_{i}"))
                .await
                .unwrap()
                .is_some());
        }
    }
}
