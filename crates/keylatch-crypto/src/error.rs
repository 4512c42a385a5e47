//! Cipher error types.

use thiserror::Error;

use crate::algorithm::Algorithm;

/// Errors from sealing or opening an encrypted blob.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Algorithm identifier is not in the registry
    #[error("unsupported algorithm: {id}")]
    BadAlgorithm {
        /// Identifier as supplied by the caller
        id: String,
    },

    /// Key length does not match the algorithm
    #[error("incompatible key length for {algorithm}: expected {expected} bytes, got {actual}")]
    IncompatibleKeyLength {
        /// Algorithm the key was used with
        algorithm: Algorithm,
        /// Required key length
        expected: usize,
        /// Supplied key length
        actual: usize,
    },

    /// Blob is shorter than nonce plus tag
    #[error("encrypted blob too short: {len} bytes, need at least {min}")]
    Truncated {
        /// Supplied blob length
        len: usize,
        /// Minimum valid length
        min: usize,
    },

    /// Tag did not verify (tampered data or wrong key)
    #[error("authentication failed: data is corrupt or the key is incorrect")]
    AuthenticationFailure,
}

impl CryptoError {
    /// Returns true if the data failed integrity verification.
    ///
    /// Everything else is a usage error (bad algorithm, bad key, malformed
    /// input) that says nothing about whether the data was tampered with.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_tag_mismatch_is_authentication_failure() {
        assert!(CryptoError::AuthenticationFailure.is_authentication_failure());
        assert!(!CryptoError::Truncated { len: 3, min: 28 }.is_authentication_failure());
        assert!(!CryptoError::BadAlgorithm { id: "DES".to_string() }.is_authentication_failure());
    }

    #[test]
    fn display_messages() {
        insta::assert_snapshot!(
            CryptoError::IncompatibleKeyLength {
                algorithm: Algorithm::Aes256Gcm,
                expected: 32,
                actual: 16,
            },
            @"incompatible key length for AES-256-GCM: expected 32 bytes, got 16"
        );
        insta::assert_snapshot!(
            CryptoError::Truncated { len: 10, min: 28 },
            @"encrypted blob too short: 10 bytes, need at least 28"
        );
        insta::assert_snapshot!(
            CryptoError::BadAlgorithm { id: "ROT13".to_string() },
            @"unsupported algorithm: ROT13"
        );
    }
}
