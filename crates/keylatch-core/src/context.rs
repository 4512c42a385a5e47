//! SDK context: lifecycle, sessions, keys and crypto behind one handle.
//!
//! [`SdkContext`] is an explicit object owned by the caller. Share it across
//! threads with `Arc`; every method takes `&self`.
//!
//! # Lifecycle
//!
//! ```text
//!                 init ok
//! Uninitialized ──────────▶ Initialized
//!       ▲                        │
//!       └──────── cleanup ───────┘
//! ```
//!
//! # Locking
//!
//! - `init`, `cleanup` and `create_session` are serialized by a transition
//!   mutex
//! - Key and crypto operations hold a read lock on the lifecycle for their
//!   whole duration; `cleanup` takes the write lock, so it waits for them
//!   and no key written by a racing operation survives it
//! - A cache miss fetches through the backend without touching the
//!   lifecycle lock again

use std::sync::{Mutex, PoisonError, RwLock};

use keylatch_crypto::{Algorithm, KeyMaterial};

use crate::{
    backend::{Backend, KeyOpResponse},
    cache::{KeyCache, KeyEntry},
    cipher::CipherEngine,
    config::{ConfigBlob, SdkConfig},
    env::Environment,
    error::{BackendError, SdkError, lock, read, write},
    ops::{CryptoOp, KeyOp},
    session::SessionManager,
};

/// Lifecycle state of an [`SdkContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkState {
    /// Only `init` (and `cleanup`) are legal.
    Uninitialized,
    /// Configuration fetched; all operations are legal.
    Initialized,
}

struct Lifecycle {
    state: SdkState,
    config_blob: Option<ConfigBlob>,
}

/// Client-side key-management SDK handle.
///
/// # Invariants
///
/// - Every operation except `init` and `cleanup` fails with
///   `NotInitialized` while uninitialized
/// - The cache is never mutated when the backend reports a failure
/// - Cached keys and the session token are scrubbed on `cleanup` and drop
pub struct SdkContext<B: Backend, E: Environment> {
    config: SdkConfig,
    backend: B,
    engine: CipherEngine<E>,
    sessions: SessionManager,
    cache: KeyCache,
    transition: Mutex<()>,
    lifecycle: RwLock<Lifecycle>,
}

impl<B: Backend, E: Environment> SdkContext<B, E> {
    /// Create an uninitialized context.
    pub fn new(config: SdkConfig, backend: B, env: E) -> Self {
        Self {
            config,
            backend,
            engine: CipherEngine::new(env),
            sessions: SessionManager::new(),
            cache: KeyCache::new(),
            transition: Mutex::new(()),
            lifecycle: RwLock::new(Lifecycle { state: SdkState::Uninitialized, config_blob: None }),
        }
    }

    /// Fetch configuration from the backend and become initialized.
    ///
    /// Not idempotent: a second call without `cleanup` fails.
    ///
    /// # Errors
    ///
    /// - `AlreadyInitialized` if already initialized
    /// - `InvalidArgument` if `registration_token` is empty
    /// - `Backend` if the configuration fetch fails; the context stays
    ///   uninitialized
    pub fn init(&self, registration_token: &str) -> Result<(), SdkError> {
        let _transition = lock(&self.transition)?;

        if read(&self.lifecycle)?.state == SdkState::Initialized {
            return Err(SdkError::AlreadyInitialized);
        }
        if registration_token.is_empty() {
            return Err(SdkError::invalid_argument("registration token cannot be empty"));
        }

        let endpoint = &self.config.api_endpoint;
        let config_blob =
            self.backend.fetch_config(endpoint, registration_token).map_err(|e| {
                tracing::warn!(%endpoint, error = %e, "configuration fetch failed");
                SdkError::Backend(e)
            })?;

        tracing::info!(
            %endpoint,
            api_version = config_blob.api_version().unwrap_or("unknown"),
            features = ?config_blob.features(),
            "SDK initialized"
        );

        *write(&self.lifecycle)? =
            Lifecycle { state: SdkState::Initialized, config_blob: Some(config_blob) };
        Ok(())
    }

    /// Drop the session, scrub every cached key and become uninitialized.
    ///
    /// Waits for in-progress key and crypto operations. Idempotent.
    pub fn cleanup(&self) -> Result<(), SdkError> {
        let _transition = lock(&self.transition)?;
        let mut lifecycle = write(&self.lifecycle)?;

        self.sessions.clear()?;
        let evicted = self.cache.clear()?;

        if lifecycle.state == SdkState::Initialized {
            tracing::info!(evicted, "SDK cleaned up");
        }
        lifecycle.state = SdkState::Uninitialized;
        lifecycle.config_blob = None;
        Ok(())
    }

    /// Authenticate and make the issued token the active session.
    ///
    /// Returns the token.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` before `init`
    /// - `InvalidArgument` if `identity` is empty
    /// - `Backend` if authentication fails; any previous session survives
    pub fn create_session(&self, identity: &str, secret: &str) -> Result<String, SdkError> {
        let _transition = lock(&self.transition)?;
        require_initialized(&*read(&self.lifecycle)?)?;

        self.sessions.create_session(&self.backend, &self.config.api_endpoint, identity, secret)
    }

    /// Run a key operation against the backend and mirror it in the cache.
    ///
    /// CREATE and UPDATE send `data` and cache it once the backend
    /// acknowledges. READ caches and returns the backend's material. DELETE
    /// evicts after acknowledgment and returns `None`. `data` is ignored for
    /// READ and DELETE.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` before `init`
    /// - `InvalidArgument` for an empty name, or CREATE/UPDATE without data
    /// - `NoActiveSession` before `create_session`
    /// - `KeyNotFound` if the backend holds no such key
    /// - `Backend` for any other backend failure; the cache is untouched
    pub fn key_operation(
        &self,
        op: KeyOp,
        name: &str,
        data: Option<&[u8]>,
    ) -> Result<Option<KeyEntry>, SdkError> {
        let lifecycle = read(&self.lifecycle)?;
        require_initialized(&lifecycle)?;

        if name.is_empty() {
            return Err(SdkError::invalid_argument("key name cannot be empty"));
        }

        let material = match data {
            Some(bytes) if op.carries_data() && !bytes.is_empty() => Some(KeyMaterial::from(bytes)),
            _ if op.carries_data() => {
                return Err(SdkError::invalid_argument(format!("{op} requires key data")));
            },
            _ => None,
        };

        let session = self.sessions.current_token()?;
        tracing::debug!(%op, key = %name, "key operation");

        let response = self
            .backend
            .key_op(&session, op, name, material.as_ref())
            .map_err(|e| backend_failure(op, name, e))?;

        let entry = match (op, response, material) {
            (KeyOp::Delete, KeyOpResponse::Acknowledged, _) => {
                self.cache.remove(name)?;
                None
            },
            (KeyOp::Read, KeyOpResponse::Key(material), _)
            | (KeyOp::Create | KeyOp::Update, KeyOpResponse::Acknowledged, Some(material)) => {
                let entry = KeyEntry::new(name, material);
                self.cache.put(entry.clone())?;
                Some(entry)
            },
            (op, response, _) => {
                return Err(SdkError::Backend(BackendError::Protocol {
                    reason: format!("unexpected response to {op}: {response:?}"),
                }));
            },
        };

        drop(lifecycle);
        Ok(entry)
    }

    /// Encrypt or decrypt `input` with the named key.
    ///
    /// The key comes from the cache; a miss fetches it from the backend
    /// (which needs an active session) and caches it. Encryption returns
    /// `nonce || ciphertext || tag`.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` before `init`
    /// - `InvalidArgument` for an empty key name
    /// - `Crypto(BadAlgorithm)` for an unknown algorithm, checked before any
    ///   fetch
    /// - `NoActiveSession`, `KeyNotFound` or `Backend` if a fetch is needed
    ///   and fails
    /// - `Crypto` for key length mismatch, truncated blob or authentication
    ///   failure
    pub fn do_crypto(
        &self,
        op: CryptoOp,
        key_name: &str,
        algorithm_id: &str,
        input: &[u8],
    ) -> Result<Vec<u8>, SdkError> {
        let lifecycle = read(&self.lifecycle)?;
        require_initialized(&lifecycle)?;

        if key_name.is_empty() {
            return Err(SdkError::invalid_argument("key name cannot be empty"));
        }
        Algorithm::from_id(algorithm_id)?;

        let entry = self.cache.get(key_name, |name| self.fetch_key(name))?;
        let output = self.engine.apply(op, entry.material(), algorithm_id, input).map_err(|e| {
            tracing::debug!(%op, key = %key_name, error = %e, "crypto operation failed");
            SdkError::Crypto(e)
        })?;

        drop(lifecycle);
        Ok(output)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SdkState {
        self.lifecycle.read().unwrap_or_else(PoisonError::into_inner).state
    }

    /// Configuration fetched by the last successful `init`.
    pub fn config_blob(&self) -> Option<ConfigBlob> {
        self.lifecycle.read().unwrap_or_else(PoisonError::into_inner).config_blob.clone()
    }

    /// Number of keys currently cached.
    pub fn cached_key_count(&self) -> usize {
        self.cache.len()
    }

    /// Check if `name` is cached.
    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains(name)
    }

    /// Check if a session is active.
    pub fn has_session(&self) -> bool {
        self.sessions.has_session()
    }

    /// Caller-supplied configuration.
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Backend this context talks to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Backend READ for a cache miss. Runs under the caller's lifecycle
    /// read lock, which it must not take again.
    fn fetch_key(&self, name: &str) -> Result<KeyMaterial, SdkError> {
        let session = self.sessions.current_token()?;

        match self
            .backend
            .key_op(&session, KeyOp::Read, name, None)
            .map_err(|e| backend_failure(KeyOp::Read, name, e))?
        {
            KeyOpResponse::Key(material) => Ok(material),
            KeyOpResponse::Acknowledged => Err(SdkError::Backend(BackendError::Protocol {
                reason: "READ answered without key material".to_string(),
            })),
        }
    }
}

impl<B: Backend, E: Environment> Drop for SdkContext<B, E> {
    fn drop(&mut self) {
        let _ = self.cache.clear();
        let _ = self.sessions.clear();
    }
}

fn require_initialized(lifecycle: &Lifecycle) -> Result<(), SdkError> {
    match lifecycle.state {
        SdkState::Initialized => Ok(()),
        SdkState::Uninitialized => Err(SdkError::NotInitialized),
    }
}

fn backend_failure(op: KeyOp, name: &str, error: BackendError) -> SdkError {
    tracing::warn!(%op, key = %name, %error, "backend key operation failed");
    match error {
        BackendError::NotFound { .. } => SdkError::KeyNotFound { name: name.to_string() },
        other => SdkError::Backend(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{backend::MemoryBackend, system_env::SystemEnv};

    type Ctx = SdkContext<MemoryBackend<SystemEnv>, SystemEnv>;

    fn context() -> Ctx {
        SdkContext::new(SdkConfig::default(), MemoryBackend::new(SystemEnv::new()), SystemEnv::new())
    }

    fn ready() -> Ctx {
        let ctx = context();
        ctx.init("reg").unwrap();
        ctx.create_session("alice", "pw").unwrap();
        ctx
    }

    #[test]
    fn starts_uninitialized() {
        let ctx = context();

        assert_eq!(ctx.state(), SdkState::Uninitialized);
        assert_eq!(ctx.config_blob(), None);
        assert_eq!(ctx.create_session("alice", "pw"), Err(SdkError::NotInitialized));
        assert_eq!(ctx.key_operation(KeyOp::Read, "k", None), Err(SdkError::NotInitialized));
        assert_eq!(
            ctx.do_crypto(CryptoOp::Encrypt, "k", "AES-GCM", b"x"),
            Err(SdkError::NotInitialized)
        );
    }

    #[test]
    fn init_stores_config_and_rejects_repeat() {
        let ctx = context();
        ctx.init("reg").unwrap();

        assert_eq!(ctx.state(), SdkState::Initialized);
        assert_eq!(ctx.config_blob().unwrap().api_version(), Some("1.0"));
        assert_eq!(ctx.init("reg"), Err(SdkError::AlreadyInitialized));
    }

    #[test]
    fn init_rejects_empty_token_without_backend_call() {
        let ctx = context();

        assert!(matches!(ctx.init(""), Err(SdkError::InvalidArgument { .. })));
        assert_eq!(ctx.backend().stats().fetch_config, 0);
        assert_eq!(ctx.state(), SdkState::Uninitialized);
    }

    #[test]
    fn cleanup_is_idempotent_and_allows_reinit() {
        let ctx = ready();

        ctx.cleanup().unwrap();
        ctx.cleanup().unwrap();
        assert_eq!(ctx.state(), SdkState::Uninitialized);
        assert!(!ctx.has_session());

        ctx.init("reg").unwrap();
        assert_eq!(ctx.state(), SdkState::Initialized);
    }

    #[test]
    fn key_operation_validates_arguments() {
        let ctx = ready();

        assert!(matches!(
            ctx.key_operation(KeyOp::Create, "", Some([0u8; 32].as_slice())),
            Err(SdkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            ctx.key_operation(KeyOp::Create, "k1", None),
            Err(SdkError::InvalidArgument { .. })
        ));
        assert!(matches!(
            ctx.key_operation(KeyOp::Update, "k1", Some(b"".as_slice())),
            Err(SdkError::InvalidArgument { .. })
        ));
        assert_eq!(ctx.backend().stats().key_ops(), 0);
    }

    #[test]
    fn key_operation_requires_session() {
        let ctx = context();
        ctx.init("reg").unwrap();

        let result = ctx.key_operation(KeyOp::Create, "k1", Some([0u8; 32].as_slice()));
        assert_eq!(result, Err(SdkError::NoActiveSession));
    }

    #[test]
    fn create_caches_supplied_material() {
        let ctx = ready();

        let entry = ctx.key_operation(KeyOp::Create, "k1", Some([4u8; 32].as_slice())).unwrap().unwrap();

        assert_eq!(entry.material().as_bytes(), &[4; 32]);
        assert!(ctx.is_cached("k1"));
    }

    #[test]
    fn delete_evicts() {
        let ctx = ready();
        ctx.key_operation(KeyOp::Create, "k1", Some([4u8; 32].as_slice())).unwrap();

        assert_eq!(ctx.key_operation(KeyOp::Delete, "k1", None), Ok(None));
        assert!(!ctx.is_cached("k1"));
        assert_eq!(ctx.cached_key_count(), 0);
    }

    #[test]
    fn read_of_missing_key_is_key_not_found() {
        let ctx = ready();

        let result = ctx.key_operation(KeyOp::Read, "ghost", None);

        assert_eq!(result, Err(SdkError::KeyNotFound { name: "ghost".to_string() }));
        assert!(!ctx.is_cached("ghost"));
    }

    #[test]
    fn backend_failure_leaves_cache_untouched() {
        let ctx = ready();
        ctx.key_operation(KeyOp::Create, "k1", Some([1u8; 32].as_slice())).unwrap();

        // Duplicate CREATE is rejected; the cached value must not change.
        let result = ctx.key_operation(KeyOp::Create, "k1", Some([2u8; 32].as_slice()));

        assert!(matches!(result, Err(SdkError::Backend(BackendError::Rejected { .. }))));
        let blob = ctx.do_crypto(CryptoOp::Encrypt, "k1", "AES-GCM", b"x").unwrap();
        let plain = CipherEngine::new(SystemEnv::new())
            .decrypt(&KeyMaterial::from(vec![1; 32]), "AES-GCM", &blob)
            .unwrap();
        assert_eq!(plain, b"x");
    }

    #[test]
    fn unknown_algorithm_does_not_fetch() {
        let ctx = ready();

        let result = ctx.do_crypto(CryptoOp::Encrypt, "k1", "ROT13", b"x");

        assert!(matches!(result, Err(SdkError::Crypto(_))));
        assert_eq!(ctx.backend().stats().read, 0);
    }

    #[test]
    fn cleanup_scrubs_keys_and_session() {
        let ctx = ready();
        ctx.key_operation(KeyOp::Create, "k1", Some([1u8; 32].as_slice())).unwrap();
        ctx.key_operation(KeyOp::Create, "k2", Some([2u8; 32].as_slice())).unwrap();

        ctx.cleanup().unwrap();

        assert_eq!(ctx.cached_key_count(), 0);
        assert!(!ctx.has_session());
        assert_eq!(ctx.config_blob(), None);
    }
}
