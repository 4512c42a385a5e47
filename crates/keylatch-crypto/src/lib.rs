//! Keylatch Cryptographic Primitives
//!
//! Authenticated-encryption building blocks for the keylatch SDK. Pure
//! functions: callers provide the nonce, so tests can be deterministic and
//! the SDK can route all randomness through its environment.
//!
//! # Blob Framing
//!
//! Every encrypted value travels as a single byte string:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┬──────────────┐
//! │ nonce (12 B) │ ciphertext (len(plaintext))  │ tag (16 B)   │
//! └──────────────┴──────────────────────────────┴──────────────┘
//! ```
//!
//! The nonce is prepended on [`seal`] and split off again on [`open`]. A blob
//! shorter than `nonce + tag` is rejected as malformed before any
//! cryptography runs.
//!
//! # Security
//!
//! Nonce Uniqueness:
//! - A nonce must never repeat under the same key. GCM-family modes lose
//!   both confidentiality and integrity on reuse.
//! - [`seal`] trusts its caller here; production callers draw a fresh
//!   random nonce from a CSPRNG for every call.
//!
//! Authenticity:
//! - Tag mismatch (tampering, wrong key) is reported as
//!   [`CryptoError::AuthenticationFailure`], never as corrupted plaintext
//! - Malformed input ([`CryptoError::Truncated`]) is kept distinct from
//!   authentication failure so callers can tell bad usage from tampering
//!
//! Key Hygiene:
//! - [`KeyMaterial`] zeroizes its bytes on drop and never prints them

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod algorithm;
mod blob;
mod cipher;
mod error;
mod key;

pub use algorithm::{Algorithm, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use blob::EncryptedBlob;
pub use cipher::{open, seal};
pub use error::CryptoError;
pub use key::KeyMaterial;
