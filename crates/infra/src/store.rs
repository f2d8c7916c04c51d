//! Versioned document storage.
//!
//! Each document is replaced as a whole and carries a version that is bumped
//! on every successful write. Conditional writes compare against that version
//! so that a stale read can never overwrite a newer document.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use eduhub_core::{DomainError, ExpectedVersion};

/// A stored document plus its current version (1 after insert).
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<V> {
    pub value: V,
    pub version: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The stored version did not match the caller's expectation.
    #[error("{entity} version conflict (expected: {expected:?}, actual: {actual})")]
    Conflict {
        entity: &'static str,
        expected: ExpectedVersion,
        actual: u64,
    },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict { .. } | StoreError::Duplicate(_) => {
                DomainError::conflict(value.to_string())
            }
            StoreError::NotFound(entity) => DomainError::NotFound(entity),
            StoreError::Poisoned => DomainError::Storage(value.to_string()),
        }
    }
}

/// Keyed document store with optimistic concurrency.
pub trait DocumentStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Result<Option<Versioned<V>>, StoreError>;

    /// Insert a new document at version 1. Fails with `Duplicate` if the key exists.
    fn insert(&self, key: K, value: V) -> Result<u64, StoreError>;

    /// Replace a document if its version matches `expected`. Returns the new version.
    fn update(&self, key: &K, value: V, expected: ExpectedVersion) -> Result<u64, StoreError>;

    fn delete(&self, key: &K, expected: ExpectedVersion) -> Result<(), StoreError>;

    fn list(&self) -> Result<Vec<Versioned<V>>, StoreError>;
}

impl<K, V, S> DocumentStore<K, V> for Arc<S>
where
    S: DocumentStore<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> Result<Option<Versioned<V>>, StoreError> {
        (**self).get(key)
    }

    fn insert(&self, key: K, value: V) -> Result<u64, StoreError> {
        (**self).insert(key, value)
    }

    fn update(&self, key: &K, value: V, expected: ExpectedVersion) -> Result<u64, StoreError> {
        (**self).update(key, value, expected)
    }

    fn delete(&self, key: &K, expected: ExpectedVersion) -> Result<(), StoreError> {
        (**self).delete(key, expected)
    }

    fn list(&self) -> Result<Vec<Versioned<V>>, StoreError> {
        (**self).list()
    }
}

/// In-memory document store for tests/dev.
#[derive(Debug)]
pub struct InMemoryDocumentStore<K, V> {
    entity: &'static str,
    inner: RwLock<HashMap<K, Versioned<V>>>,
}

impl<K, V> InMemoryDocumentStore<K, V> {
    /// `entity` names the document kind in errors (`"course"`, `"user"`).
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> DocumentStore<K, V> for InMemoryDocumentStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Result<Option<Versioned<V>>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn insert(&self, key: K, value: V) -> Result<u64, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if map.contains_key(&key) {
            return Err(StoreError::Duplicate(self.entity));
        }
        map.insert(key, Versioned { value, version: 1 });
        Ok(1)
    }

    fn update(&self, key: &K, value: V, expected: ExpectedVersion) -> Result<u64, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let slot = map.get_mut(key).ok_or(StoreError::NotFound(self.entity))?;

        if !expected.matches(slot.version) {
            return Err(StoreError::Conflict {
                entity: self.entity,
                expected,
                actual: slot.version,
            });
        }

        slot.value = value;
        slot.version += 1;
        Ok(slot.version)
    }

    fn delete(&self, key: &K, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let current = map
            .get(key)
            .map(|v| v.version)
            .ok_or(StoreError::NotFound(self.entity))?;

        if !expected.matches(current) {
            return Err(StoreError::Conflict {
                entity: self.entity,
                expected,
                actual: current,
            });
        }

        map.remove(key);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Versioned<V>>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.values().cloned().collect())
    }
}
