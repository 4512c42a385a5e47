//! Algorithm registry.
//!
//! Algorithm identifiers arrive as opaque strings from SDK callers. They are
//! resolved case-insensitively against a fixed alias table into the closed
//! [`Algorithm`] enum.

use std::{fmt, str::FromStr};

use crate::error::CryptoError;

/// Key size shared by all supported algorithms (256 bits).
pub const KEY_SIZE: usize = 32;

/// Nonce size shared by all supported algorithms (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size shared by all supported algorithms (128 bits).
pub const TAG_SIZE: usize = 16;

/// Aliases accepted for AES-256-GCM.
const AES_256_GCM_ALIASES: &[&str] = &["AES-GCM", "AES-256-GCM", "AES256-GCM", "AES/GCM/NOPADDING"];

/// Aliases accepted for ChaCha20-Poly1305.
const CHACHA20_POLY1305_ALIASES: &[&str] =
    &["CHACHA20-POLY1305", "CHACHA20POLY1305", "CHACHA20/POLY1305"];

/// Supported AEAD algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// AES with a 256-bit key in Galois/Counter Mode.
    Aes256Gcm,
    /// ChaCha20 stream cipher with Poly1305 authenticator.
    ChaCha20Poly1305,
}

impl Algorithm {
    /// All supported algorithms.
    pub const ALL: [Self; 2] = [Self::Aes256Gcm, Self::ChaCha20Poly1305];

    /// Resolve an algorithm identifier.
    ///
    /// Matching ignores ASCII case and surrounding whitespace.
    pub fn from_id(id: &str) -> Result<Self, CryptoError> {
        let normalized = id.trim().to_ascii_uppercase();

        if AES_256_GCM_ALIASES.contains(&normalized.as_str()) {
            return Ok(Self::Aes256Gcm);
        }
        if CHACHA20_POLY1305_ALIASES.contains(&normalized.as_str()) {
            return Ok(Self::ChaCha20Poly1305);
        }

        Err(CryptoError::BadAlgorithm { id: id.to_string() })
    }

    /// Canonical identifier.
    pub fn id(self) -> &'static str {
        match self {
            Self::Aes256Gcm => "AES-256-GCM",
            Self::ChaCha20Poly1305 => "CHACHA20-POLY1305",
        }
    }

    /// Required key length in bytes.
    pub fn key_len(self) -> usize {
        KEY_SIZE
    }

    /// Nonce length in bytes.
    pub fn nonce_len(self) -> usize {
        NONCE_SIZE
    }

    /// Authentication tag length in bytes.
    pub fn tag_len(self) -> usize {
        TAG_SIZE
    }

    /// Framing overhead added to every plaintext (nonce + tag).
    pub fn overhead(self) -> usize {
        self.nonce_len() + self.tag_len()
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Algorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_aes_aliases() {
        for id in ["AES-GCM", "aes-256-gcm", "AES/GCM/NoPadding", " AES256-GCM "] {
            assert_eq!(Algorithm::from_id(id), Ok(Algorithm::Aes256Gcm), "alias {id}");
        }
    }

    #[test]
    fn resolves_chacha_aliases() {
        for id in ["CHACHA20-POLY1305", "ChaCha20Poly1305", "chacha20/poly1305"] {
            assert_eq!(Algorithm::from_id(id), Ok(Algorithm::ChaCha20Poly1305), "alias {id}");
        }
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let result = Algorithm::from_id("RSA");
        assert_eq!(result, Err(CryptoError::BadAlgorithm { id: "RSA".to_string() }));

        assert!(Algorithm::from_id("").is_err());
        assert!(Algorithm::from_id("AES-128-GCM").is_err());
    }

    #[test]
    fn canonical_id_roundtrips() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.id().parse::<Algorithm>(), Ok(algorithm));
            assert_eq!(algorithm.to_string(), algorithm.id());
        }
    }

    #[test]
    fn framing_sizes() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.key_len(), 32);
            assert_eq!(algorithm.nonce_len(), 12);
            assert_eq!(algorithm.tag_len(), 16);
            assert_eq!(algorithm.overhead(), 28);
        }
    }
}
