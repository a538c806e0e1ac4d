//! Versioned append-only stores.
//!
//! Host registries are modelled as immutable snapshots behind a swappable
//! binding. Readers pin the current snapshot with an `Arc` clone. Writers
//! append through [`Arc::make_mut`], which mutates in place when nobody pins
//! the old snapshot and copies it otherwise, so a pinned snapshot never
//! changes under its reader.
//!
//! ## Ordering hazard
//!
//! A consumer that pinned (or copied out of) a snapshot before an append
//! keeps seeing the old contents. Nothing can push the new entry into such a
//! cache; [`VersionedMap::is_current`] and [`VersionedList::is_current`] only
//! make the staleness observable.

use std::hash::Hash;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use parking_lot::{RwLock, RwLockWriteGuard};
use thiserror::Error;

/// Returned when an append would overwrite an existing key or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("key already present")]
pub struct AlreadyPresent;

// ============================================================================
// Map
// ============================================================================

/// Immutable view of a [`VersionedMap`] at one version.
#[derive(Debug, Clone)]
pub struct MapSnapshot<K, V> {
    /// Entries in insertion order
    entries: Vec<(K, V)>,
    /// Key to position in `entries`
    index: AHashMap<K, usize>,
    /// Number of appends applied so far
    version: u64,
}

impl<K, V> Default for MapSnapshot<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: AHashMap::new(),
            version: 0,
        }
    }
}

impl<K: Eq + Hash, V> MapSnapshot<K, V> {
    /// Gets the value for a key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Checks if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the snapshot version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }
}

impl<K: Eq + Hash + Clone, V> MapSnapshot<K, V> {
    fn push(&mut self, key: K, value: V) -> Result<u64, AlreadyPresent> {
        if self.index.contains_key(&key) {
            return Err(AlreadyPresent);
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        self.version += 1;
        Ok(self.version)
    }
}

/// Append-only map behind a swappable snapshot binding.
#[derive(Debug)]
pub struct VersionedMap<K, V> {
    /// Currently published snapshot
    current: RwLock<Arc<MapSnapshot<K, V>>>,
}

impl<K, V> Default for VersionedMap<K, V> {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(MapSnapshot::default())),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> VersionedMap<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map seeded with initial entries.
    pub fn from_entries<I>(entries: I) -> Result<Self, AlreadyPresent>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut snapshot = MapSnapshot::default();
        for (key, value) in entries {
            snapshot.push(key, value)?;
        }
        Ok(Self {
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Pins the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<MapSnapshot<K, V>> {
        Arc::clone(&self.current.read())
    }

    /// Gets a copy of the value for a key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.current.read().get(key).cloned()
    }

    /// Checks if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.current.read().contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    /// Checks if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    /// Returns the current version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.read().version()
    }

    /// Checks whether a pinned snapshot still reflects the published state.
    #[must_use]
    pub fn is_current(&self, snapshot: &MapSnapshot<K, V>) -> bool {
        snapshot.version() == self.version()
    }

    /// Appends one entry, returning the new version.
    pub fn append_only(&self, key: K, value: V) -> Result<u64, AlreadyPresent> {
        self.write().append(key, value)
    }

    /// Takes the write side of the binding.
    ///
    /// Readers block until the writer is dropped.
    pub fn write(&self) -> MapWriter<'_, K, V> {
        MapWriter {
            guard: self.current.write(),
        }
    }
}

/// Exclusive write access to a [`VersionedMap`].
pub struct MapWriter<'a, K, V> {
    guard: RwLockWriteGuard<'a, Arc<MapSnapshot<K, V>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> MapWriter<'_, K, V> {
    /// Checks if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.guard.contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard.len()
    }

    /// Checks if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    /// Appends one entry, returning the new version.
    pub fn append(&mut self, key: K, value: V) -> Result<u64, AlreadyPresent> {
        if self.guard.contains_key(&key) {
            return Err(AlreadyPresent);
        }
        Arc::make_mut(&mut *self.guard).push(key, value)
    }
}

// ============================================================================
// List
// ============================================================================

/// Immutable view of a [`VersionedList`] at one version.
#[derive(Debug, Clone)]
pub struct ListSnapshot<T> {
    /// Members in insertion order
    items: Vec<T>,
    /// Membership index
    members: AHashSet<T>,
    /// Number of appends applied so far
    version: u64,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            members: AHashSet::new(),
            version: 0,
        }
    }
}

impl<T: Eq + Hash> ListSnapshot<T> {
    /// Checks membership.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the snapshot version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Iterates members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Members as a slice, in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Eq + Hash + Clone> ListSnapshot<T> {
    fn push(&mut self, item: T) -> Result<u64, AlreadyPresent> {
        if !self.members.insert(item.clone()) {
            return Err(AlreadyPresent);
        }
        self.items.push(item);
        self.version += 1;
        Ok(self.version)
    }
}

/// Append-only membership list behind a swappable snapshot binding.
#[derive(Debug)]
pub struct VersionedList<T> {
    /// Currently published snapshot
    current: RwLock<Arc<ListSnapshot<T>>>,
}

impl<T> Default for VersionedList<T> {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(ListSnapshot::default())),
        }
    }
}

impl<T: Eq + Hash + Clone> VersionedList<T> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list seeded with initial members.
    pub fn from_items<I>(items: I) -> Result<Self, AlreadyPresent>
    where
        I: IntoIterator<Item = T>,
    {
        let mut snapshot = ListSnapshot::default();
        for item in items {
            snapshot.push(item)?;
        }
        Ok(Self {
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Pins the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ListSnapshot<T>> {
        Arc::clone(&self.current.read())
    }

    /// Checks membership.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.current.read().contains(item)
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    /// Checks if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    /// Returns the current version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.read().version()
    }

    /// Checks whether a pinned snapshot still reflects the published state.
    #[must_use]
    pub fn is_current(&self, snapshot: &ListSnapshot<T>) -> bool {
        snapshot.version() == self.version()
    }

    /// Appends one member, returning the new version.
    pub fn append_only(&self, item: T) -> Result<u64, AlreadyPresent> {
        self.write().append(item)
    }

    /// Takes the write side of the binding.
    pub fn write(&self) -> ListWriter<'_, T> {
        ListWriter {
            guard: self.current.write(),
        }
    }
}

/// Exclusive write access to a [`VersionedList`].
pub struct ListWriter<'a, T> {
    guard: RwLockWriteGuard<'a, Arc<ListSnapshot<T>>>,
}

impl<T: Eq + Hash + Clone> ListWriter<'_, T> {
    /// Checks membership.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.guard.contains(item)
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard.len()
    }

    /// Checks if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    /// Appends one member, returning the new version.
    pub fn append(&mut self, item: T) -> Result<u64, AlreadyPresent> {
        if self.guard.contains(&item) {
            return Err(AlreadyPresent);
        }
        Arc::make_mut(&mut *self.guard).push(item)
    }
}
