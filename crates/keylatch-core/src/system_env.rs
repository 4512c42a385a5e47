//! Production Environment implementation using the OS RNG.
//!
//! `SystemEnv` draws every nonce from getrandom, so production behavior is
//! non-deterministic but security-grade.

use crate::env::Environment;

/// Production environment using cryptographic RNG.
///
/// # Security
///
/// The RNG uses getrandom which provides OS-level cryptographic randomness
/// (e.g., /dev/urandom on Linux, `BCryptGenRandom` on Windows). Suitable for
/// AEAD nonces and session identifiers.
///
/// # Panics
///
/// Panics if the OS RNG fails. An SDK without functioning cryptographic
/// randomness cannot produce safe nonces, and continuing would risk nonce
/// reuse under GCM.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - nonces cannot be generated");
    }
}
