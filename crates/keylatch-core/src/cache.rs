//! Key cache with single-flight miss handling.
//!
//! The cache mirrors keys held by the backend; it is never the source of
//! truth. A miss runs the caller-supplied fetch (a backend READ) with no
//! cache lock held, so lookups of other names proceed while it runs.
//!
//! # Single-flight
//!
//! Concurrent misses on the same name share one fetch. The first caller
//! registers a [`Flight`] and becomes the leader; later callers find the
//! flight and block on it. The leader stores the result in the map before
//! retiring the flight, then wakes every waiter with the same result,
//! success or error.
//!
//! A `put`, `remove` or `clear` that lands while a fetch is running marks
//! that flight stale and detaches it. A stale flight still answers its
//! waiters but does not write into the map, so a slow refill can never
//! resurrect a deleted key or overwrite a newer value.
//!
//! # Lock order
//!
//! `entries` before `in_flight`, never the reverse. Neither is held while
//! the fetch runs.

use std::{
    collections::HashMap,
    sync::{
        Arc, Condvar, Mutex, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use keylatch_crypto::KeyMaterial;

use crate::error::{SdkError, lock, read, write};

/// A named symmetric key held in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    name: String,
    material: KeyMaterial,
}

impl KeyEntry {
    /// Create an entry.
    pub fn new(name: impl Into<String>, material: KeyMaterial) -> Self {
        Self { name: name.into(), material }
    }

    /// Key name, unique within the cache.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key material.
    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }
}

/// One outstanding fetch, shared by the leader and its waiters.
#[derive(Default)]
struct Flight {
    result: Mutex<Option<Result<KeyEntry, SdkError>>>,
    ready: Condvar,
    /// Set when a write to this name overtook the fetch.
    stale: AtomicBool,
}

impl Flight {
    fn finish(&self, result: Result<KeyEntry, SdkError>) {
        // Waiters must always be released, poisoned or not.
        let mut slot = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(result);
        self.ready.notify_all();
    }

    fn wait(&self) -> Result<KeyEntry, SdkError> {
        let slot = self
            .ready
            .wait_while(lock(&self.result)?, |slot| slot.is_none())
            .map_err(|_| SdkError::LockPoisoned)?;

        slot.as_ref().map_or(Err(SdkError::LockPoisoned), Clone::clone)
    }
}

/// Leader's handle on a flight. Dropping it unfinished (the fetch panicked)
/// retires the flight and fails its waiters.
struct Leader<'a> {
    cache: &'a KeyCache,
    name: &'a str,
    flight: Arc<Flight>,
    finished: bool,
}

impl Leader<'_> {
    fn finish(mut self, result: Result<KeyEntry, SdkError>) -> Result<KeyEntry, SdkError> {
        self.finished = true;

        let retired = self.cache.retire(self.name, &self.flight, result.as_ref().ok());
        let result = retired.and(result);

        self.flight.finish(result.clone());
        result
    }
}

impl Drop for Leader<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(key = %self.name, "key fetch aborted");
            let _ = self.cache.retire(self.name, &self.flight, None);
            self.flight.finish(Err(SdkError::LockPoisoned));
        }
    }
}

/// Thread-safe name to key mapping.
///
/// # Invariants
///
/// - At most one fetch per name is outstanding
/// - A failed fetch stores nothing
/// - Evicted key material is zeroized (via [`KeyMaterial`]'s `Drop`)
#[derive(Default)]
pub struct KeyCache {
    entries: RwLock<HashMap<String, KeyEntry>>,
    in_flight: Mutex<HashMap<String, Arc<Flight>>>,
}

impl KeyCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for `name`, fetching it on a miss.
    ///
    /// `fetch` runs at most once per concurrent miss and only in the leading
    /// caller. Its result, success or error, is returned to every caller
    /// that joined the flight.
    ///
    /// # Errors
    ///
    /// - Whatever `fetch` returns
    /// - `LockPoisoned` if a cache lock is poisoned or the fetch panicked
    pub fn get<F>(&self, name: &str, fetch: F) -> Result<KeyEntry, SdkError>
    where
        F: FnOnce(&str) -> Result<KeyMaterial, SdkError>,
    {
        let (flight, leading) = {
            let entries = read(&self.entries)?;
            if let Some(entry) = entries.get(name) {
                tracing::debug!(key = %name, "key cache hit");
                return Ok(entry.clone());
            }

            let mut in_flight = lock(&self.in_flight)?;
            match in_flight.get(name) {
                Some(flight) => (Arc::clone(flight), false),
                None => {
                    let flight = Arc::new(Flight::default());
                    in_flight.insert(name.to_string(), Arc::clone(&flight));
                    (flight, true)
                },
            }
        };

        if !leading {
            tracing::debug!(key = %name, "key cache miss, joining in-flight fetch");
            return flight.wait();
        }

        tracing::debug!(key = %name, "key cache miss, fetching");
        let leader = Leader { cache: self, name, flight, finished: false };
        let result = fetch(name).map(|material| KeyEntry::new(name, material));
        if let Err(e) = &result {
            tracing::warn!(key = %name, error = %e, "key fetch failed");
        }

        leader.finish(result)
    }

    /// Insert or overwrite an entry. Last writer wins.
    pub fn put(&self, entry: KeyEntry) -> Result<(), SdkError> {
        let mut entries = write(&self.entries)?;
        self.detach_flight(&entry.name)?;
        tracing::debug!(key = %entry.name, "key cached");
        entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Evict `name`. Returns true if an entry was present.
    pub fn remove(&self, name: &str) -> Result<bool, SdkError> {
        let mut entries = write(&self.entries)?;
        self.detach_flight(name)?;
        let evicted = entries.remove(name).is_some();
        if evicted {
            tracing::debug!(key = %name, "key evicted");
        }
        Ok(evicted)
    }

    /// Evict every entry. Returns the number evicted.
    pub fn clear(&self) -> Result<usize, SdkError> {
        let mut entries = write(&self.entries)?;
        for (_, flight) in lock(&self.in_flight)?.drain() {
            flight.stale.store(true, Ordering::Release);
        }

        let evicted = entries.len();
        entries.clear();
        Ok(evicted)
    }

    /// Check if `name` is cached. Does not fetch.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().is_ok_and(|entries| entries.contains_key(name))
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or_default()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark the flight for `name` stale and detach it so the next miss
    /// starts a fresh fetch. Caller holds the `entries` write lock.
    fn detach_flight(&self, name: &str) -> Result<(), SdkError> {
        if let Some(flight) = lock(&self.in_flight)?.remove(name) {
            flight.stale.store(true, Ordering::Release);
        }
        Ok(())
    }

    /// Store a successful fetch (unless stale) and unregister the flight.
    fn retire(
        &self,
        name: &str,
        flight: &Arc<Flight>,
        fetched: Option<&KeyEntry>,
    ) -> Result<(), SdkError> {
        let mut entries = write(&self.entries)?;
        if let Some(entry) = fetched {
            if !flight.stale.load(Ordering::Acquire) {
                entries.insert(name.to_string(), entry.clone());
            }
        }

        let mut in_flight = lock(&self.in_flight)?;
        if in_flight.get(name).is_some_and(|current| Arc::ptr_eq(current, flight)) {
            in_flight.remove(name);
        }
        Ok(())
    }
}
