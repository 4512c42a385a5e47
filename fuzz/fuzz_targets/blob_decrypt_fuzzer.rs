//! Fuzz target for encrypted blob decryption
//!
//! # Strategy
//!
//! - Random bytes: arbitrary blobs of any length, including shorter than
//!   nonce plus tag
//! - Bit flips: a genuine blob with one bit flipped at a fuzzer-chosen offset
//! - Wrong key: a genuine blob opened with a different key
//! - Key length: keys of arbitrary length
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Blobs shorter than the overhead are `Truncated`, never
//!   `AuthenticationFailure`
//! - Any modified blob or wrong key is `AuthenticationFailure`
//! - Unmodified blobs round-trip

#![no_main]

use arbitrary::Arbitrary;
use keylatch_crypto::{Algorithm, CryptoError, KeyMaterial, NONCE_SIZE, open, seal};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum BlobAttack {
    RandomBytes { key: [u8; 32], chacha: bool, blob: Vec<u8> },
    BitFlip { key: [u8; 32], nonce: [u8; NONCE_SIZE], chacha: bool, plaintext: Vec<u8>, bit: u16 },
    WrongKey { key: [u8; 32], other: [u8; 32], nonce: [u8; NONCE_SIZE], plaintext: Vec<u8> },
    KeyLength { key: Vec<u8>, blob: Vec<u8> },
}

fn algorithm(chacha: bool) -> Algorithm {
    if chacha { Algorithm::ChaCha20Poly1305 } else { Algorithm::Aes256Gcm }
}

fuzz_target!(|attack: BlobAttack| {
    match attack {
        BlobAttack::RandomBytes { key, chacha, blob } => {
            let algorithm = algorithm(chacha);
            let result = open(&KeyMaterial::from(&key[..]), algorithm, &blob);

            if blob.len() < algorithm.overhead() {
                assert!(matches!(result, Err(CryptoError::Truncated { .. })));
            } else {
                // Forging a tag by chance is not a realistic outcome.
                assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
            }
        },

        BlobAttack::BitFlip { key, nonce, chacha, plaintext, bit } => {
            let algorithm = algorithm(chacha);
            let key = KeyMaterial::from(&key[..]);
            let Ok(sealed) = seal(&key, algorithm, nonce, &plaintext) else {
                panic!("seal failed with a valid key");
            };
            let mut blob = sealed.into_bytes();
            assert_eq!(open(&key, algorithm, &blob).ok(), Some(plaintext));

            let bit = usize::from(bit) % (blob.len() * 8);
            blob[bit / 8] ^= 1 << (bit % 8);
            assert_eq!(open(&key, algorithm, &blob), Err(CryptoError::AuthenticationFailure));
        },

        BlobAttack::WrongKey { key, other, nonce, plaintext } => {
            if key == other {
                return;
            }
            let algorithm = Algorithm::Aes256Gcm;
            let Ok(sealed) = seal(&KeyMaterial::from(&key[..]), algorithm, nonce, &plaintext) else {
                panic!("seal failed with a valid key");
            };

            let result = open(&KeyMaterial::from(&other[..]), algorithm, &sealed.into_bytes());
            assert_eq!(result, Err(CryptoError::AuthenticationFailure));
        },

        BlobAttack::KeyLength { key, blob } => {
            for algorithm in Algorithm::ALL {
                let result = open(&KeyMaterial::from(key.clone()), algorithm, &blob);
                if key.len() != algorithm.key_len() {
                    assert!(matches!(result, Err(CryptoError::IncompatibleKeyLength { .. })));
                }
            }
        },
    }
});
