//! Session manager.
//!
//! Holds the bearer token issued by backend authentication. Key operations
//! borrow a copy of the current [`Session`]; they never see a half-updated
//! one because the swap happens under a single write lock.
//!
//! ```text
//!            create_session ok
//! NoSession ──────────────────▶ HasSession ──┐
//!     ▲                             │        │ create_session ok
//!     └──────── clear ──────────────┘ ◀──────┘ (replaces token)
//! ```
//!
//! A failed `create_session` leaves the state untouched: an existing valid
//! session survives a failed re-authentication.

use std::{
    fmt,
    sync::{Mutex, RwLock},
};

use zeroize::Zeroize;

use crate::{
    backend::Backend,
    error::{BackendError, SdkError, lock, read, write},
};

/// An authenticated session with the backend.
///
/// # Security
///
/// - The token is zeroized when the session is dropped
/// - `Debug` never prints the token
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    endpoint: String,
}

impl Session {
    /// Create a session for a token issued by `endpoint`.
    pub fn new(token: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self { token: token.into(), endpoint: endpoint.into() }
    }

    /// Opaque bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Endpoint the token was issued for.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.token.zeroize();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Owns the active session.
///
/// # Invariants
///
/// - At most one session is active
/// - `create_session` calls are serialized
/// - A failed `create_session` never clears an existing session
#[derive(Debug, Default)]
pub struct SessionManager {
    /// Active session, `None` until the first successful authentication.
    current: RwLock<Option<Session>>,

    /// Serializes authentication so concurrent callers swap in turn.
    create_lock: Mutex<()>,
}

impl SessionManager {
    /// Create a manager with no session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate and make the issued token the active session.
    ///
    /// Returns the new token.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `identity` is empty
    /// - `Backend` if authentication fails or returns an empty token
    pub fn create_session<B: Backend>(
        &self,
        backend: &B,
        endpoint: &str,
        identity: &str,
        secret: &str,
    ) -> Result<String, SdkError> {
        if identity.is_empty() {
            return Err(SdkError::invalid_argument("identity cannot be empty"));
        }

        let _serialized = lock(&self.create_lock)?;

        let token = backend.authenticate(endpoint, identity, secret).map_err(|e| {
            tracing::warn!(%identity, error = %e, "authentication failed");
            SdkError::Backend(e)
        })?;

        if token.is_empty() {
            return Err(SdkError::Backend(BackendError::Protocol {
                reason: "backend issued an empty session token".to_string(),
            }));
        }

        *write(&self.current)? = Some(Session::new(token.clone(), endpoint));
        tracing::info!(%identity, %endpoint, "session created");

        Ok(token)
    }

    /// Copy of the active session.
    ///
    /// # Errors
    ///
    /// - `NoActiveSession` if no session exists since the last clear
    pub fn current_token(&self) -> Result<Session, SdkError> {
        read(&self.current)?.clone().ok_or(SdkError::NoActiveSession)
    }

    /// Check if a session is active.
    pub fn has_session(&self) -> bool {
        self.current.read().is_ok_and(|current| current.is_some())
    }

    /// Drop the active session. The token is zeroized.
    pub fn clear(&self) -> Result<(), SdkError> {
        if write(&self.current)?.take().is_some() {
            tracing::debug!("session cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::{ChaoticBackend, MemoryBackend},
        system_env::SystemEnv,
    };

    const ENDPOINT: &str = "https://kms.test/v1";

    #[test]
    fn no_session_initially() {
        let sessions = SessionManager::new();

        assert!(!sessions.has_session());
        assert_eq!(sessions.current_token(), Err(SdkError::NoActiveSession));
    }

    #[test]
    fn create_session_stores_token_and_endpoint() {
        let backend = MemoryBackend::new(SystemEnv::new());
        let sessions = SessionManager::new();

        let token = sessions.create_session(&backend, ENDPOINT, "alice", "pw").unwrap();
        let session = sessions.current_token().unwrap();

        assert!(!token.is_empty());
        assert_eq!(session.token(), token);
        assert_eq!(session.endpoint(), ENDPOINT);
    }

    #[test]
    fn second_session_replaces_first() {
        let backend = MemoryBackend::new(SystemEnv::new());
        let sessions = SessionManager::new();

        let first = sessions.create_session(&backend, ENDPOINT, "alice", "pw").unwrap();
        let second = sessions.create_session(&backend, ENDPOINT, "bob", "pw").unwrap();

        assert_ne!(first, second);
        assert_eq!(sessions.current_token().unwrap().token(), second);
    }

    #[test]
    fn failed_authentication_keeps_existing_session() {
        let backend = MemoryBackend::new(SystemEnv::new()).with_user("alice", "pw");
        let sessions = SessionManager::new();

        let token = sessions.create_session(&backend, ENDPOINT, "alice", "pw").unwrap();
        let result = sessions.create_session(&backend, ENDPOINT, "alice", "wrong");

        assert_eq!(result, Err(SdkError::Backend(BackendError::Unauthorized)));
        assert_eq!(sessions.current_token().unwrap().token(), token);
    }

    #[test]
    fn unavailable_backend_keeps_existing_session() {
        let healthy = MemoryBackend::new(SystemEnv::new());
        let sessions = SessionManager::new();
        let token = sessions.create_session(&healthy, ENDPOINT, "alice", "pw").unwrap();

        let broken = ChaoticBackend::new(healthy, 1.0);
        let result = sessions.create_session(&broken, ENDPOINT, "alice", "pw");

        assert!(result.as_ref().is_err_and(SdkError::is_transient));
        assert_eq!(sessions.current_token().unwrap().token(), token);
    }

    #[test]
    fn empty_identity_is_rejected_before_backend_call() {
        let backend = MemoryBackend::new(SystemEnv::new());
        let sessions = SessionManager::new();

        let result = sessions.create_session(&backend, ENDPOINT, "", "pw");

        assert!(matches!(result, Err(SdkError::InvalidArgument { .. })));
        assert_eq!(backend.stats().authenticate, 0);
    }

    #[test]
    fn clear_drops_session() {
        let backend = MemoryBackend::new(SystemEnv::new());
        let sessions = SessionManager::new();
        sessions.create_session(&backend, ENDPOINT, "alice", "pw").unwrap();

        sessions.clear().unwrap();
        sessions.clear().unwrap();

        assert!(!sessions.has_session());
        assert_eq!(sessions.current_token(), Err(SdkError::NoActiveSession));
    }

    #[test]
    fn debug_redacts_token() {
        let session = Session::new("super-secret-token", ENDPOINT);
        let printed = format!("{session:?}");

        assert!(!printed.contains("super-secret-token"));
        assert!(printed.contains(ENDPOINT));
    }
}
