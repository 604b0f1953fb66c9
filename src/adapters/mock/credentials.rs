//! In-memory credential store for testing.
//!
//! Stores both partitions in memory and lets tests make individual
//! operations or individual keys fail.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::traits::{CredentialStore, Partition, StoreError};

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<(Partition, String), String>,
    fail_reads: bool,
    fail_writes: bool,
    fail_deletes: bool,
    failing_write_keys: HashSet<(Partition, String)>,
    failing_delete_keys: HashSet<(Partition, String)>,
    write_budget: Option<usize>,
    write_count: usize,
}

/// In-memory credential store for testing.
///
/// Clones share the same underlying storage.
///
/// # Example
///
/// ```ignore
/// use learnpath_session::adapters::mock::InMemoryCredentialStore;
/// use learnpath_session::traits::{CredentialStore, Partition};
///
/// let store = InMemoryCredentialStore::new();
/// store.put(Partition::Secure, "refresh_token", "R1").await?;
/// assert_eq!(store.value(Partition::Secure, "refresh_token"), Some("R1".to_string()));
///
/// // Make the next access-token write fail
/// store.fail_writes_for(Partition::Secure, "access_token");
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Set a value synchronously (for test setup).
    pub fn insert(&self, partition: Partition, key: &str, value: &str) {
        self.lock()
            .values
            .insert((partition, key.to_string()), value.to_string());
    }

    /// Read a value synchronously (for test assertions).
    pub fn value(&self, partition: Partition, key: &str) -> Option<String> {
        self.lock().values.get(&(partition, key.to_string())).cloned()
    }

    /// Keys currently present in `partition`.
    pub fn keys(&self, partition: Partition) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .values
            .keys()
            .filter(|(p, _)| *p == partition)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// True when neither partition holds any key.
    pub fn is_empty(&self) -> bool {
        self.lock().values.is_empty()
    }

    /// Number of successful `put` calls so far.
    pub fn write_count(&self) -> usize {
        self.lock().write_count
    }

    /// Configure whether every read should fail.
    pub fn set_read_should_fail(&self, should_fail: bool) {
        self.lock().fail_reads = should_fail;
    }

    /// Configure whether every write should fail.
    pub fn set_write_should_fail(&self, should_fail: bool) {
        self.lock().fail_writes = should_fail;
    }

    /// Configure whether every delete should fail.
    pub fn set_delete_should_fail(&self, should_fail: bool) {
        self.lock().fail_deletes = should_fail;
    }

    /// Allow only `budget` more successful writes; later writes fail.
    pub fn set_write_budget(&self, budget: Option<usize>) {
        let mut inner = self.lock();
        inner.write_budget = budget.map(|b| inner.write_count + b);
    }

    /// Make writes of one key fail.
    pub fn fail_writes_for(&self, partition: Partition, key: &str) {
        self.lock()
            .failing_write_keys
            .insert((partition, key.to_string()));
    }

    /// Make deletes of one key fail.
    pub fn fail_deletes_for(&self, partition: Partition, key: &str) {
        self.lock()
            .failing_delete_keys
            .insert((partition, key.to_string()));
    }

    /// Clear all injected failures.
    pub fn clear_failures(&self) {
        let mut inner = self.lock();
        inner.fail_reads = false;
        inner.fail_writes = false;
        inner.fail_deletes = false;
        inner.failing_write_keys.clear();
        inner.failing_delete_keys.clear();
        inner.write_budget = None;
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, partition: Partition, key: &str) -> Result<Option<String>, StoreError> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(StoreError::ReadFailed {
                partition,
                key: key.to_string(),
                message: "Mock read failure".to_string(),
            });
        }
        Ok(inner.values.get(&(partition, key.to_string())).cloned())
    }

    async fn put(&self, partition: Partition, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let slot = (partition, key.to_string());
        let over_budget = inner
            .write_budget
            .map(|limit| inner.write_count >= limit)
            .unwrap_or(false);
        if inner.fail_writes || over_budget || inner.failing_write_keys.contains(&slot) {
            return Err(StoreError::WriteFailed {
                partition,
                key: key.to_string(),
                message: "Mock write failure".to_string(),
            });
        }
        inner.values.insert(slot, value.to_string());
        inner.write_count += 1;
        Ok(())
    }

    async fn delete(&self, partition: Partition, key: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let slot = (partition, key.to_string());
        if inner.fail_deletes || inner.failing_delete_keys.contains(&slot) {
            return Err(StoreError::DeleteFailed {
                partition,
                key: key.to_string(),
                message: "Mock delete failure".to_string(),
            });
        }
        inner.values.remove(&slot);
        Ok(())
    }
}
