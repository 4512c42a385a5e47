//! Error types for the keylatch SDK.
//!
//! Every public operation returns a distinct, inspectable error kind so
//! callers can react programmatically: a missing key, a tampered ciphertext
//! and a dead backend are three different things.
//!
//! Errors are `Clone` because one backend fetch may be shared by several
//! concurrent callers waiting on the same key.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use keylatch_crypto::CryptoError;
use thiserror::Error;

/// Failures reported by the backend transport collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend holds no key with this name
    #[error("key not found on backend: {name}")]
    NotFound {
        /// Requested key name
        name: String,
    },

    /// Session token missing, expired or revoked
    #[error("unauthorized: session token rejected")]
    Unauthorized,

    /// Backend understood the request and refused it
    #[error("request rejected: {reason}")]
    Rejected {
        /// Backend-supplied reason
        reason: String,
    },

    /// Backend could not be reached or failed transiently
    #[error("backend unavailable: {reason}")]
    Unavailable {
        /// Transport-level reason
        reason: String,
    },

    /// Backend response did not match the expected shape
    #[error("protocol error: {reason}")]
    Protocol {
        /// What was wrong with the response
        reason: String,
    },
}

/// Errors returned by SDK operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdkError {
    /// Operation requires `init` first
    #[error("SDK is not initialized")]
    NotInitialized,

    /// `init` called twice without `cleanup`
    #[error("SDK is already initialized")]
    AlreadyInitialized,

    /// Caller supplied an unusable argument
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong
        reason: String,
    },

    /// Key operation requires `create_session` first
    #[error("no active session, call create_session first")]
    NoActiveSession,

    /// Neither the cache nor the backend holds the key
    #[error("key not found: {name}")]
    KeyNotFound {
        /// Requested key name
        name: String,
    },

    /// Crypto operation name not recognized
    #[error("unsupported operation: {op}")]
    UnsupportedOperation {
        /// Operation as supplied by the caller
        op: String,
    },

    /// Cipher engine failure
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Backend transport failure
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A thread panicked while holding an SDK lock
    #[error("internal lock poisoned")]
    LockPoisoned,
}

impl SdkError {
    /// Stable numeric status code for FFI-style callers.
    ///
    /// Codes are negative; `0` is reserved for success.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::NotInitialized => -2,
            Self::AlreadyInitialized => -3,
            Self::InvalidArgument { .. } => -4,
            Self::Backend(BackendError::Unavailable { .. }) => -5,
            Self::Backend(_) => -6,
            Self::Crypto(_) => -7,
            Self::NoActiveSession => -9,
            Self::KeyNotFound { .. } => -10,
            Self::UnsupportedOperation { .. } => -11,
            Self::LockPoisoned => -12,
        }
    }

    /// Returns true if this error is transient and may succeed on retry.
    ///
    /// Only backend unavailability qualifies. The SDK never retries on its
    /// own; retry policy belongs to the caller or the transport.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backend(BackendError::Unavailable { .. }))
    }

    /// Returns true if decryption rejected the data as tampered or the key
    /// as wrong.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::Crypto(err) if err.is_authentication_failure())
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument { reason: reason.into() }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, SdkError> {
    mutex.lock().map_err(|_| SdkError::LockPoisoned)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, SdkError> {
    lock.read().map_err(|_| SdkError::LockPoisoned)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, SdkError> {
    lock.write().map_err(|_| SdkError::LockPoisoned)
}
