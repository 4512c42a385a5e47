//! Cipher engine.
//!
//! Binds the pure primitives of `keylatch_crypto` to an [`Environment`]: every
//! encryption draws a fresh nonce from the environment RNG. Algorithms are
//! named by opaque identifier strings, resolved case-insensitively.

use keylatch_crypto::{Algorithm, CryptoError, EncryptedBlob, KeyMaterial, NONCE_SIZE, open, seal};

use crate::{env::Environment, ops::CryptoOp};

/// Stateless AEAD engine.
#[derive(Debug, Clone)]
pub struct CipherEngine<E: Environment> {
    env: E,
}

impl<E: Environment> CipherEngine<E> {
    /// Create an engine drawing nonces from `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// Encrypt `plaintext`, returning `nonce || ciphertext || tag`.
    ///
    /// # Errors
    ///
    /// - `BadAlgorithm` if `algorithm_id` is not recognized
    /// - `IncompatibleKeyLength` if the key does not fit the algorithm
    pub fn encrypt(
        &self,
        key: &KeyMaterial,
        algorithm_id: &str,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let algorithm = Algorithm::from_id(algorithm_id)?;

        let mut nonce = [0u8; NONCE_SIZE];
        self.env.random_bytes(&mut nonce);

        seal(key, algorithm, nonce, plaintext).map(EncryptedBlob::into_bytes)
    }

    /// Verify and decrypt a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// - `BadAlgorithm` if `algorithm_id` is not recognized
    /// - `IncompatibleKeyLength` if the key does not fit the algorithm
    /// - `Truncated` if the blob is shorter than nonce plus tag
    /// - `AuthenticationFailure` if the blob was tampered with or the key is
    ///   wrong
    pub fn decrypt(
        &self,
        key: &KeyMaterial,
        algorithm_id: &str,
        blob: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let algorithm = Algorithm::from_id(algorithm_id)?;
        open(key, algorithm, blob)
    }

    /// Dispatch on `op`.
    pub fn apply(
        &self,
        op: CryptoOp,
        key: &KeyMaterial,
        algorithm_id: &str,
        input: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        match op {
            CryptoOp::Encrypt => self.encrypt(key, algorithm_id, input),
            CryptoOp::Decrypt => self.decrypt(key, algorithm_id, input),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::system_env::SystemEnv;

    fn engine() -> CipherEngine<SystemEnv> {
        CipherEngine::new(SystemEnv::new())
    }

    fn zero_key() -> KeyMaterial {
        KeyMaterial::from(vec![0u8; 32])
    }

    #[test]
    fn hello_under_aes_gcm_is_33_bytes() {
        let blob = engine().encrypt(&zero_key(), "AES-GCM", b"hello").unwrap();

        assert_eq!(blob.len(), 12 + 5 + 16);
        assert_eq!(engine().decrypt(&zero_key(), "AES-GCM", &blob).unwrap(), b"hello");
    }

    #[test]
    fn fresh_nonce_per_encryption() {
        let engine = engine();
        let a = engine.encrypt(&zero_key(), "AES-256-GCM", b"same").unwrap();
        let b = engine.encrypt(&zero_key(), "AES-256-GCM", b"same").unwrap();

        assert_ne!(a[..NONCE_SIZE], b[..NONCE_SIZE]);
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let engine = engine();
        let blob = engine.encrypt(&zero_key(), "CHACHA20-POLY1305", b"secret").unwrap();

        let other = KeyMaterial::from(vec![1u8; 32]);
        let result = engine.decrypt(&other, "CHACHA20-POLY1305", &blob);

        assert_eq!(result, Err(CryptoError::AuthenticationFailure));
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let result = engine().encrypt(&zero_key(), "DES", b"x");
        assert_eq!(result, Err(CryptoError::BadAlgorithm { id: "DES".to_string() }));
    }

    #[test]
    fn short_key_is_rejected() {
        let short = KeyMaterial::from(vec![0u8; 16]);
        let result = engine().encrypt(&short, "AES-GCM", b"x");

        assert!(matches!(result, Err(CryptoError::IncompatibleKeyLength { expected: 32, actual: 16, .. })));
    }

    #[test]
    fn truncated_blob_is_malformed_not_tampered() {
        let result = engine().decrypt(&zero_key(), "AES-GCM", &[0u8; 27]);
        assert!(matches!(result, Err(CryptoError::Truncated { len: 27, min: 28 })));
    }

    #[test]
    fn apply_dispatches_on_op() {
        let engine = engine();
        let blob = engine.apply(CryptoOp::Encrypt, &zero_key(), "aes-gcm", b"hi").unwrap();
        let plain = engine.apply(CryptoOp::Decrypt, &zero_key(), "aes-gcm", &blob).unwrap();

        assert_eq!(plain, b"hi");
    }

    proptest! {
        #[test]
        fn roundtrip_any_plaintext(
            key in proptest::collection::vec(any::<u8>(), 32),
            plaintext in proptest::collection::vec(any::<u8>(), 0..512),
            id in prop_oneof![Just("AES-GCM"), Just("CHACHA20-POLY1305")],
        ) {
            let engine = engine();
            let key = KeyMaterial::from(key);

            let blob = engine.encrypt(&key, id, &plaintext).unwrap();
            prop_assert_eq!(blob.len(), plaintext.len() + 28);
            prop_assert_eq!(engine.decrypt(&key, id, &blob).unwrap(), plaintext);
        }
    }
}
