//! Authenticated encryption with AES-256-GCM or ChaCha20-Poly1305.
//!
//! All functions are pure - the nonce must be provided by the caller.

use aes_gcm::Aes256Gcm;
use chacha20poly1305::{
    ChaCha20Poly1305,
    aead::{Aead, KeyInit, Nonce},
};

use crate::{
    algorithm::{Algorithm, NONCE_SIZE},
    blob::EncryptedBlob,
    error::CryptoError,
    key::KeyMaterial,
};

/// Encrypt `plaintext` under `key` with the given nonce.
///
/// Returns the framed blob (`nonce || ciphertext || tag`).
///
/// # Security
///
/// - Caller MUST NOT reuse a nonce with the same key
/// - Caller MUST provide cryptographically secure random bytes in production
///
/// # Errors
///
/// - `IncompatibleKeyLength` if the key does not fit the algorithm
pub fn seal(
    key: &KeyMaterial,
    algorithm: Algorithm,
    nonce: [u8; NONCE_SIZE],
    plaintext: &[u8],
) -> Result<EncryptedBlob, CryptoError> {
    check_key_len(key, algorithm)?;

    let ciphertext = match algorithm {
        Algorithm::Aes256Gcm => seal_with::<Aes256Gcm>(algorithm, key, &nonce, plaintext)?,
        Algorithm::ChaCha20Poly1305 => {
            seal_with::<ChaCha20Poly1305>(algorithm, key, &nonce, plaintext)?
        },
    };

    Ok(EncryptedBlob::new(nonce, ciphertext))
}

/// Decrypt a framed blob under `key`.
///
/// # Errors
///
/// - `IncompatibleKeyLength` if the key does not fit the algorithm
/// - `Truncated` if the blob cannot hold a nonce and a tag
/// - `AuthenticationFailure` if the tag does not verify (tamper or wrong key)
pub fn open(key: &KeyMaterial, algorithm: Algorithm, blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_key_len(key, algorithm)?;
    let blob = EncryptedBlob::parse(algorithm, blob)?;

    match algorithm {
        Algorithm::Aes256Gcm => open_with::<Aes256Gcm>(algorithm, key, &blob),
        Algorithm::ChaCha20Poly1305 => open_with::<ChaCha20Poly1305>(algorithm, key, &blob),
    }
}

fn check_key_len(key: &KeyMaterial, algorithm: Algorithm) -> Result<(), CryptoError> {
    if key.len() == algorithm.key_len() {
        Ok(())
    } else {
        Err(CryptoError::IncompatibleKeyLength {
            algorithm,
            expected: algorithm.key_len(),
            actual: key.len(),
        })
    }
}

fn seal_with<C: Aead + KeyInit>(
    algorithm: Algorithm,
    key: &KeyMaterial,
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = C::new_from_slice(key.as_bytes()).map_err(|_| {
        CryptoError::IncompatibleKeyLength {
            algorithm,
            expected: algorithm.key_len(),
            actual: key.len(),
        }
    })?;

    let Ok(ciphertext) = cipher.encrypt(Nonce::<C>::from_slice(nonce), plaintext) else {
        unreachable!("AEAD encryption cannot fail with a valid key, nonce and in-memory input");
    };

    Ok(ciphertext)
}

fn open_with<C: Aead + KeyInit>(
    algorithm: Algorithm,
    key: &KeyMaterial,
    blob: &EncryptedBlob,
) -> Result<Vec<u8>, CryptoError> {
    let cipher = C::new_from_slice(key.as_bytes()).map_err(|_| {
        CryptoError::IncompatibleKeyLength {
            algorithm,
            expected: algorithm.key_len(),
            actual: key.len(),
        }
    })?;

    cipher
        .decrypt(Nonce::<C>::from_slice(blob.nonce()), blob.ciphertext())
        .map_err(|_| CryptoError::AuthenticationFailure)
}
