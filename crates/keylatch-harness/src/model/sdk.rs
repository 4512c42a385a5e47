//! Reference model of an SDK context and its backend.
//!
//! Plain maps and flags, no locks, no crypto. The model encodes what each
//! operation must do to lifecycle, session, cache and backend; the real SDK
//! is checked against it.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::operation::{
    ModelKeyId, Operation, OperationError, OperationResult, key_bytes, key_name,
};

/// Observable state, compared between model and real SDK after every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservableState {
    /// Context is initialized
    pub initialized: bool,
    /// A session is active
    pub has_session: bool,
    /// Key names held in the SDK cache
    pub cached: BTreeSet<String>,
    /// Key names held by the backend
    pub backend: BTreeSet<String>,
}

/// Reference SDK plus backend.
#[derive(Debug, Clone, Default)]
pub struct ModelSdk {
    initialized: bool,
    has_session: bool,
    cache: BTreeMap<String, Vec<u8>>,
    backend: BTreeMap<String, Vec<u8>>,
}

impl ModelSdk {
    /// Uninitialized SDK with an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one operation and return the expected result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Init => self.init(),
            Operation::Cleanup => {
                self.initialized = false;
                self.has_session = false;
                self.cache.clear();
                OperationResult::Ok
            },
            Operation::CreateSession { .. } => {
                if !self.initialized {
                    return OperationResult::Error(OperationError::NotInitialized);
                }
                self.has_session = true;
                OperationResult::Ok
            },
            Operation::Create { key, material } => self.create(*key, *material),
            Operation::Read { key } => self.read(*key),
            Operation::Update { key, material } => self.update(*key, *material),
            Operation::Delete { key } => self.delete(*key),
            Operation::Encrypt { key, .. } => self.encrypt(*key),
            Operation::RemoteStore { key, material } => {
                self.backend.insert(key_name(*key), key_bytes(*material));
                OperationResult::Ok
            },
            Operation::RemoteDelete { key } => {
                self.backend.remove(&key_name(*key));
                OperationResult::Ok
            },
        }
    }

    /// Current observable state.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            initialized: self.initialized,
            has_session: self.has_session,
            cached: self.cache.keys().cloned().collect(),
            backend: self.backend.keys().cloned().collect(),
        }
    }

    fn init(&mut self) -> OperationResult {
        if self.initialized {
            return OperationResult::Error(OperationError::AlreadyInitialized);
        }
        self.initialized = true;
        OperationResult::Ok
    }

    /// Lifecycle and session checks shared by all key operations.
    fn ready(&self) -> Result<(), OperationError> {
        if !self.initialized {
            Err(OperationError::NotInitialized)
        } else if !self.has_session {
            Err(OperationError::NoActiveSession)
        } else {
            Ok(())
        }
    }

    fn create(&mut self, key: ModelKeyId, material: u8) -> OperationResult {
        if let Err(e) = self.ready() {
            return OperationResult::Error(e);
        }

        let name = key_name(key);
        if self.backend.contains_key(&name) {
            return OperationResult::Error(OperationError::Rejected);
        }

        let bytes = key_bytes(material);
        self.backend.insert(name.clone(), bytes.clone());
        self.cache.insert(name, bytes.clone());
        OperationResult::Key(bytes)
    }

    fn read(&mut self, key: ModelKeyId) -> OperationResult {
        if let Err(e) = self.ready() {
            return OperationResult::Error(e);
        }

        let name = key_name(key);
        match self.backend.get(&name).cloned() {
            Some(bytes) => {
                self.cache.insert(name, bytes.clone());
                OperationResult::Key(bytes)
            },
            None => OperationResult::Error(OperationError::KeyNotFound),
        }
    }

    fn update(&mut self, key: ModelKeyId, material: u8) -> OperationResult {
        if let Err(e) = self.ready() {
            return OperationResult::Error(e);
        }

        let name = key_name(key);
        if !self.backend.contains_key(&name) {
            return OperationResult::Error(OperationError::KeyNotFound);
        }

        let bytes = key_bytes(material);
        self.backend.insert(name.clone(), bytes.clone());
        self.cache.insert(name, bytes.clone());
        OperationResult::Key(bytes)
    }

    fn delete(&mut self, key: ModelKeyId) -> OperationResult {
        if let Err(e) = self.ready() {
            return OperationResult::Error(e);
        }

        let name = key_name(key);
        if self.backend.remove(&name).is_none() {
            return OperationResult::Error(OperationError::KeyNotFound);
        }
        self.cache.remove(&name);
        OperationResult::Ok
    }

    /// A cached key is used even if the backend changed since; a miss needs
    /// a session and fills the cache from the backend.
    fn encrypt(&mut self, key: ModelKeyId) -> OperationResult {
        if !self.initialized {
            return OperationResult::Error(OperationError::NotInitialized);
        }

        let name = key_name(key);
        if let Some(bytes) = self.cache.get(&name) {
            return OperationResult::Sealed { key: bytes.clone() };
        }

        if let Err(e) = self.ready() {
            return OperationResult::Error(e);
        }
        match self.backend.get(&name).cloned() {
            Some(bytes) => {
                self.cache.insert(name, bytes.clone());
                OperationResult::Sealed { key: bytes }
            },
            None => OperationResult::Error(OperationError::KeyNotFound),
        }
    }
}
