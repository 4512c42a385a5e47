//! Operations for model-based testing.
//!
//! Operations represent every action a caller (or another client sharing the
//! backend) can take. They are generated randomly by proptest and applied to
//! both the model and the real SDK.

use arbitrary::Arbitrary;
use keylatch_core::{BackendError, SdkError};
use serde::Serialize;

/// Key identifier. Small so sequences revisit the same names often.
pub type ModelKeyId = u8;

/// Number of distinct key names the model distinguishes.
pub const KEY_SPACE: u8 = 4;

/// Name the real SDK uses for a model key.
pub fn key_name(key: ModelKeyId) -> String {
    format!("key-{}", key % KEY_SPACE)
}

/// 32 bytes of key material derived from a one-byte seed.
pub fn key_bytes(seed: u8) -> Vec<u8> {
    (0..32u8).map(|i| seed.wrapping_mul(31).wrapping_add(i)).collect()
}

/// Operations that can be applied to the system.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// `init` with a valid registration token.
    Init,

    /// `cleanup`.
    Cleanup,

    /// `create_session` for a numbered identity.
    CreateSession {
        /// Identity suffix
        identity: u8,
    },

    /// CREATE through the SDK.
    Create {
        /// Target key
        key: ModelKeyId,
        /// Material seed
        material: u8,
    },

    /// READ through the SDK.
    Read {
        /// Target key
        key: ModelKeyId,
    },

    /// UPDATE through the SDK.
    Update {
        /// Target key
        key: ModelKeyId,
        /// Material seed
        material: u8,
    },

    /// DELETE through the SDK.
    Delete {
        /// Target key
        key: ModelKeyId,
    },

    /// Encrypt a message with a key, then decrypt it again.
    Encrypt {
        /// Target key
        key: ModelKeyId,
        /// Message content
        message: SmallMessage,
    },

    /// Another client stores a key on the backend, bypassing this SDK.
    RemoteStore {
        /// Target key
        key: ModelKeyId,
        /// Material seed
        material: u8,
    },

    /// Another client deletes a key on the backend, bypassing this SDK.
    RemoteDelete {
        /// Target key
        key: ModelKeyId,
    },
}

/// Small message content for testing.
#[derive(Debug, Clone, Arbitrary)]
pub struct SmallMessage {
    /// Message seed
    pub seed: u8,
    /// Length hint (0-3 maps to empty/small/medium/large)
    pub size_class: u8,
}

impl SmallMessage {
    /// Expand to actual message bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len: u8 = match self.size_class % 4 {
            0 => 0,
            1 => 5,
            2 => 64,
            _ => 255,
        };

        (0..len).map(|i| self.seed.wrapping_add(i)).collect()
    }
}

/// Result of applying an operation, comparable between model and real SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OperationResult {
    /// Operation succeeded with nothing to report.
    Ok,

    /// Operation returned key material.
    Key(Vec<u8>),

    /// Encryption round-tripped using this key material.
    ///
    /// The model reports the material it expects the SDK to use; the real
    /// side reports the material that actually decrypts the blob.
    Sealed {
        /// Key material used
        key: Vec<u8>,
    },

    /// Operation failed.
    Error(OperationError),
}

/// Error kinds, compared by classification rather than message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationError {
    /// Operation before `init`
    NotInitialized,
    /// Second `init`
    AlreadyInitialized,
    /// Key operation before `create_session`
    NoActiveSession,
    /// Neither cache nor backend holds the key
    KeyNotFound,
    /// Backend refused the request (duplicate CREATE)
    Rejected,
    /// Anything the model does not predict
    Unexpected,
}

impl From<&SdkError> for OperationError {
    fn from(error: &SdkError) -> Self {
        match error {
            SdkError::NotInitialized => Self::NotInitialized,
            SdkError::AlreadyInitialized => Self::AlreadyInitialized,
            SdkError::NoActiveSession => Self::NoActiveSession,
            SdkError::KeyNotFound { .. } => Self::KeyNotFound,
            SdkError::Backend(BackendError::Rejected { .. }) => Self::Rejected,
            _ => Self::Unexpected,
        }
    }
}
