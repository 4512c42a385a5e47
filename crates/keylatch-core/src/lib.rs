//! Keylatch Core
//!
//! Client-side key management: an application initializes the SDK with a
//! registration token, authenticates to obtain a session, manages named
//! symmetric keys held by a remote backend, and encrypts or decrypts with
//! them. Keys are mirrored in a local cache so crypto operations avoid a
//! backend round-trip.
//!
//! # Architecture
//!
//! Everything hangs off one explicit [`SdkContext`] handle. There is no
//! process-wide state; two contexts in one process are independent.
//! Side effects go through two traits so tests can replace them:
//!
//! - [`Backend`]: the remote key service (config, authentication, key CRUD)
//! - [`Environment`]: the randomness source for nonces and tokens
//!
//! # Components
//!
//! - [`SdkContext`]: lifecycle state machine and public surface
//! - [`SessionManager`]: holds the bearer token
//! - [`KeyCache`]: name to key mapping with single-flight miss handling
//! - [`CipherEngine`]: AEAD encrypt/decrypt with a fresh nonce per call
//! - [`MemoryBackend`], [`ChaoticBackend`]: in-memory and fault-injecting
//!   backends
//!
//! # Example
//!
//! ```
//! use keylatch_core::{CryptoOp, KeyOp, MemoryBackend, SdkConfig, SdkContext, SystemEnv};
//!
//! let backend = MemoryBackend::new(SystemEnv::new());
//! let sdk = SdkContext::new(SdkConfig::default(), backend, SystemEnv::new());
//!
//! sdk.init("registration-token")?;
//! sdk.create_session("alice", "pw")?;
//! sdk.key_operation(KeyOp::Create, "K1", Some(&[0u8; 32][..]))?;
//!
//! let blob = sdk.do_crypto(CryptoOp::Encrypt, "K1", "AES-GCM", b"hello")?;
//! assert_eq!(blob.len(), 33);
//!
//! let plain = sdk.do_crypto(CryptoOp::Decrypt, "K1", "AES-GCM", &blob)?;
//! assert_eq!(plain, b"hello");
//!
//! sdk.cleanup()?;
//! # Ok::<(), keylatch_core::SdkError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod backend;
pub mod cache;
pub mod cipher;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod ops;
pub mod session;
pub mod system_env;

pub use backend::{Backend, BackendStats, ChaoticBackend, KeyOpResponse, MemoryBackend};
pub use cache::{KeyCache, KeyEntry};
pub use cipher::CipherEngine;
pub use config::{ConfigBlob, DEFAULT_API_ENDPOINT, SdkConfig};
pub use context::{SdkContext, SdkState};
pub use env::Environment;
pub use error::{BackendError, SdkError};
pub use keylatch_crypto::{Algorithm, CryptoError, KeyMaterial};
pub use ops::{CryptoOp, KeyOp};
pub use session::{Session, SessionManager};
pub use system_env::SystemEnv;
