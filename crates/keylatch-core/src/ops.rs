//! Operation names accepted by the public surface.
//!
//! Driver layers pass operations as strings (`"CREATE"`, `"encrypt"`). They
//! parse case-insensitively into closed enums; unknown names fail with the
//! error kind the corresponding SDK call documents.

use std::{fmt, str::FromStr};

use crate::error::SdkError;

/// Key management operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyOp {
    /// Register new key material on the backend.
    Create,
    /// Fetch key material from the backend.
    Read,
    /// Replace key material on the backend.
    Update,
    /// Remove the key from the backend.
    Delete,
}

impl KeyOp {
    /// All key operations.
    pub const ALL: [Self; 4] = [Self::Create, Self::Read, Self::Update, Self::Delete];

    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Read => "READ",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// True if the operation sends key material to the backend.
    pub fn carries_data(self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

impl fmt::Display for KeyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyOp {
    type Err = SdkError;

    /// Unknown names fail with [`SdkError::InvalidArgument`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SdkError::invalid_argument(format!("unknown key operation: {s}")))
    }
}

/// Cryptographic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CryptoOp {
    /// Produce `nonce || ciphertext || tag`.
    Encrypt,
    /// Verify and strip framing, returning plaintext.
    Decrypt,
}

impl CryptoOp {
    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Encrypt => "ENCRYPT",
            Self::Decrypt => "DECRYPT",
        }
    }
}

impl fmt::Display for CryptoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CryptoOp {
    type Err = SdkError;

    /// Unknown names fail with [`SdkError::UnsupportedOperation`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Encrypt, Self::Decrypt]
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SdkError::UnsupportedOperation { op: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ops_parse_case_insensitively() {
        assert_eq!("create".parse::<KeyOp>(), Ok(KeyOp::Create));
        assert_eq!("Read".parse::<KeyOp>(), Ok(KeyOp::Read));
        assert_eq!("UPDATE".parse::<KeyOp>(), Ok(KeyOp::Update));
        assert_eq!(" delete ".parse::<KeyOp>(), Ok(KeyOp::Delete));
    }

    #[test]
    fn unknown_key_op_is_invalid_argument() {
        let result = "PURGE".parse::<KeyOp>();
        assert!(matches!(result, Err(SdkError::InvalidArgument { reason }) if reason.contains("PURGE")));
    }

    #[test]
    fn unknown_crypto_op_is_unsupported() {
        assert_eq!(
            "SIGN".parse::<CryptoOp>(),
            Err(SdkError::UnsupportedOperation { op: "SIGN".to_string() })
        );
        assert_eq!("decrypt".parse::<CryptoOp>(), Ok(CryptoOp::Decrypt));
    }

    #[test]
    fn only_create_and_update_carry_data() {
        let carrying: Vec<KeyOp> = KeyOp::ALL.into_iter().filter(|op| op.carries_data()).collect();
        assert_eq!(carrying, vec![KeyOp::Create, KeyOp::Update]);
    }
}
