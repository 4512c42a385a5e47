//! Backend abstraction for the key-management service.
//!
//! The SDK never talks to the network itself. Everything remote goes
//! through the synchronous [`Backend`] trait: configuration bootstrap,
//! authentication, and key CRUD. Transport concerns (HTTP, timeouts,
//! retries, wire encoding) belong to the implementation.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryBackend`]: in-memory key store that echoes state, for tests and
//!   demos
//! - [`ChaoticBackend`]: wrapper that injects transient failures at a seeded
//!   rate, for fault-injection tests

mod chaotic;
mod memory;

pub use chaotic::ChaoticBackend;
use keylatch_crypto::KeyMaterial;
pub use memory::{BackendStats, MemoryBackend};

use crate::{config::ConfigBlob, error::BackendError, ops::KeyOp, session::Session};

/// Response to a key operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOpResponse {
    /// CREATE, UPDATE or DELETE succeeded.
    Acknowledged,
    /// READ returned this key material.
    Key(KeyMaterial),
}

/// Remote key-management service.
///
/// Must be `Send + Sync`: one backend serves every thread using the SDK
/// context. Methods block until the backend answers.
pub trait Backend: Send + Sync {
    /// Fetch SDK configuration using a registration token.
    fn fetch_config(
        &self,
        endpoint: &str,
        registration_token: &str,
    ) -> Result<ConfigBlob, BackendError>;

    /// Exchange credentials for an opaque bearer token.
    fn authenticate(
        &self,
        endpoint: &str,
        identity: &str,
        secret: &str,
    ) -> Result<String, BackendError>;

    /// Perform a key operation on behalf of `session`.
    ///
    /// # Invariants
    ///
    /// - `data` is `Some` for CREATE and UPDATE, `None` otherwise
    /// - READ answers with [`KeyOpResponse::Key`], everything else with
    ///   [`KeyOpResponse::Acknowledged`]
    /// - A missing key is reported as [`BackendError::NotFound`]
    fn key_op(
        &self,
        session: &Session,
        op: KeyOp,
        name: &str,
        data: Option<&KeyMaterial>,
    ) -> Result<KeyOpResponse, BackendError>;
}
