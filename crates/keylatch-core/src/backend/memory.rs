use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use keylatch_crypto::{Algorithm, KeyMaterial};
use serde_json::json;

use super::{Backend, KeyOpResponse};
use crate::{
    config::ConfigBlob, env::Environment, error::BackendError, ops::KeyOp, session::Session,
};

/// Per-call counters for a [`MemoryBackend`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// `fetch_config` calls
    pub fetch_config: usize,
    /// `authenticate` calls
    pub authenticate: usize,
    /// CREATE key operations
    pub create: usize,
    /// READ key operations
    pub read: usize,
    /// UPDATE key operations
    pub update: usize,
    /// DELETE key operations
    pub delete: usize,
}

impl BackendStats {
    /// Total key operations of any kind.
    pub fn key_ops(&self) -> usize {
        self.create + self.read + self.update + self.delete
    }

    fn record(&mut self, op: KeyOp) {
        match op {
            KeyOp::Create => self.create += 1,
            KeyOp::Read => self.read += 1,
            KeyOp::Update => self.update += 1,
            KeyOp::Delete => self.delete += 1,
        }
    }
}

/// In-memory backend for testing, simulation and demos.
///
/// Behaves like a well-formed key service: READ returns what CREATE or
/// UPDATE stored, tokens must have been issued by `authenticate`, and a
/// missing key is `NotFound`. All state is wrapped in `Arc<Mutex<>>`, so
/// clones share the same store; a test keeps one clone to seed keys and
/// inspect [`BackendStats`] while the SDK owns the other.
///
/// Calls are counted before the optional artificial latency is applied,
/// and the latency is slept outside the lock so concurrent calls overlap.
#[derive(Clone)]
pub struct MemoryBackend<E: Environment> {
    env: E,
    inner: Arc<Mutex<MemoryBackendInner>>,
}

struct MemoryBackendInner {
    /// Registered credentials. Empty map accepts any identity.
    users: HashMap<String, String>,

    /// Tokens issued and not revoked
    sessions: HashSet<String>,

    /// Key store
    keys: HashMap<String, KeyMaterial>,

    /// Delay applied to every call
    latency: Option<Duration>,

    stats: BackendStats,
}

impl<E: Environment> MemoryBackend<E> {
    /// Create an empty backend that accepts any credentials.
    pub fn new(env: E) -> Self {
        Self {
            env,
            inner: Arc::new(Mutex::new(MemoryBackendInner {
                users: HashMap::new(),
                sessions: HashSet::new(),
                keys: HashMap::new(),
                latency: None,
                stats: BackendStats::default(),
            })),
        }
    }

    /// Register credentials. Once any user is registered, `authenticate`
    /// only accepts registered pairs.
    #[must_use]
    pub fn with_user(self, identity: impl Into<String>, secret: impl Into<String>) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.users.insert(identity.into(), secret.into());
        }
        self
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.latency = Some(latency);
        }
        self
    }

    /// Store a key directly, bypassing the SDK.
    pub fn insert_key(&self, name: impl Into<String>, material: KeyMaterial) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.keys.insert(name.into(), material);
        }
    }

    /// Remove a key directly, bypassing the SDK.
    pub fn remove_key(&self, name: &str) -> Option<KeyMaterial> {
        self.inner.lock().ok().and_then(|mut inner| inner.keys.remove(name))
    }

    /// Key material currently held for `name`.
    pub fn key(&self, name: &str) -> Option<KeyMaterial> {
        self.inner.lock().ok().and_then(|inner| inner.keys.get(name).cloned())
    }

    /// Check if the backend holds `name`.
    pub fn has_key(&self, name: &str) -> bool {
        self.inner.lock().is_ok_and(|inner| inner.keys.contains_key(name))
    }

    /// Number of keys held.
    pub fn key_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.keys.len()).unwrap_or_default()
    }

    /// Invalidate every issued token.
    pub fn revoke_sessions(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.sessions.clear();
        }
    }

    /// Snapshot of call counters.
    pub fn stats(&self) -> BackendStats {
        self.inner.lock().map(|inner| inner.stats).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryBackendInner>, BackendError> {
        self.inner.lock().map_err(|_| BackendError::Unavailable {
            reason: "memory backend state poisoned".to_string(),
        })
    }

    /// Count the call, then sleep for the configured latency (lock released).
    fn begin_call(
        &self,
        record: impl FnOnce(&mut BackendStats),
    ) -> Result<(), BackendError> {
        let latency = {
            let mut inner = self.lock()?;
            record(&mut inner.stats);
            inner.latency
        };

        if let Some(latency) = latency {
            std::thread::sleep(latency);
        }
        Ok(())
    }
}

impl<E: Environment> Backend for MemoryBackend<E> {
    fn fetch_config(
        &self,
        endpoint: &str,
        registration_token: &str,
    ) -> Result<ConfigBlob, BackendError> {
        self.begin_call(|stats| stats.fetch_config += 1)?;
        tracing::debug!(%endpoint, "memory backend: fetch config");

        if registration_token.is_empty() {
            return Err(BackendError::Rejected {
                reason: "registration token cannot be empty".to_string(),
            });
        }

        let features: Vec<&str> = Algorithm::ALL.iter().map(|algorithm| algorithm.id()).collect();
        Ok(ConfigBlob::new(json!({ "api_version": "1.0", "features": features })))
    }

    fn authenticate(
        &self,
        endpoint: &str,
        identity: &str,
        secret: &str,
    ) -> Result<String, BackendError> {
        self.begin_call(|stats| stats.authenticate += 1)?;
        tracing::debug!(%endpoint, %identity, "memory backend: authenticate");

        let mut inner = self.lock()?;
        if !inner.users.is_empty() && inner.users.get(identity).map(String::as_str) != Some(secret)
        {
            return Err(BackendError::Unauthorized);
        }

        let token = format!("mem.{:016x}{:016x}", self.env.random_u64(), self.env.random_u64());
        inner.sessions.insert(token.clone());
        Ok(token)
    }

    fn key_op(
        &self,
        session: &Session,
        op: KeyOp,
        name: &str,
        data: Option<&KeyMaterial>,
    ) -> Result<KeyOpResponse, BackendError> {
        self.begin_call(|stats| stats.record(op))?;
        tracing::debug!(%op, key = %name, "memory backend: key op");

        let mut inner = self.lock()?;
        if !inner.sessions.contains(session.token()) {
            return Err(BackendError::Unauthorized);
        }

        let not_found = || BackendError::NotFound { name: name.to_string() };

        match op {
            KeyOp::Create => {
                let material = require_data(op, data)?;
                if inner.keys.contains_key(name) {
                    return Err(BackendError::Rejected { reason: format!("key already exists: {name}") });
                }
                inner.keys.insert(name.to_string(), material.clone());
                Ok(KeyOpResponse::Acknowledged)
            },
            KeyOp::Read => inner.keys.get(name).cloned().map(KeyOpResponse::Key).ok_or_else(not_found),
            KeyOp::Update => {
                let material = require_data(op, data)?;
                let slot = inner.keys.get_mut(name).ok_or_else(not_found)?;
                *slot = material.clone();
                Ok(KeyOpResponse::Acknowledged)
            },
            KeyOp::Delete => {
                inner.keys.remove(name).ok_or_else(not_found)?;
                Ok(KeyOpResponse::Acknowledged)
            },
        }
    }
}

fn require_data(op: KeyOp, data: Option<&KeyMaterial>) -> Result<&KeyMaterial, BackendError> {
    data.ok_or_else(|| BackendError::Rejected { reason: format!("{op} requires key data") })
}
