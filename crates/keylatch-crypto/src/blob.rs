//! Encrypted blob framing: `nonce || ciphertext || tag`.

use crate::{
    algorithm::{Algorithm, NONCE_SIZE, TAG_SIZE},
    error::CryptoError,
};

/// A parsed encrypted blob.
///
/// # Invariants
///
/// - `ciphertext.len() >= TAG_SIZE` (the tag is always present)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    nonce: [u8; NONCE_SIZE],
    ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Assemble a blob from a nonce and ciphertext-with-tag.
    pub(crate) fn new(nonce: [u8; NONCE_SIZE], ciphertext: Vec<u8>) -> Self {
        debug_assert!(ciphertext.len() >= TAG_SIZE);
        Self { nonce, ciphertext }
    }

    /// Split framed bytes into nonce and ciphertext-with-tag.
    ///
    /// # Errors
    ///
    /// - `Truncated` if `bytes` is shorter than the algorithm's nonce + tag
    pub fn parse(algorithm: Algorithm, bytes: &[u8]) -> Result<Self, CryptoError> {
        let min = algorithm.overhead();
        if bytes.len() < min {
            return Err(CryptoError::Truncated { len: bytes.len(), min });
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(algorithm.nonce_len());
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self { nonce, ciphertext: ciphertext.to_vec() })
    }

    /// Nonce prefix.
    pub fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    /// Ciphertext including the trailing authentication tag.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Plaintext length (ciphertext length minus authentication tag).
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(TAG_SIZE)
    }

    /// Total framed length.
    pub fn len(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }

    /// Always false: a blob carries at least a nonce and a tag.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Serialize to `nonce || ciphertext_and_tag`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Consume into `nonce || ciphertext_and_tag`.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(&self.nonce);
        out.extend(self.ciphertext);
        out
    }
}
