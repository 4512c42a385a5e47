//! End-to-end demo scenario for the keylatch SDK.
//!
//! Drives one context through the whole public surface: init, session,
//! CREATE, encrypt, decrypt and cleanup. The binary wires it to the
//! in-memory backend; tests run it directly.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use keylatch_core::{Backend, CryptoOp, Environment, KeyOp, SdkContext, SdkError};

/// Inputs of one demo run.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Token passed to `init`
    pub registration_token: String,
    /// Identity passed to `create_session`
    pub identity: String,
    /// Secret passed to `create_session`
    pub secret: String,
    /// Name of the key created on the backend
    pub key_name: String,
    /// Raw key material for CREATE
    pub key: Vec<u8>,
    /// Algorithm identifier, e.g. `AES-GCM`
    pub algorithm: String,
    /// Plaintext to encrypt
    pub message: Vec<u8>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            registration_token: "tok".to_string(),
            identity: "alice".to_string(),
            secret: "pw".to_string(),
            key_name: "K1".to_string(),
            key: vec![0u8; 32],
            algorithm: "AES-GCM".to_string(),
            message: b"hello".to_vec(),
        }
    }
}

/// Outputs of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// `nonce || ciphertext || tag`
    pub ciphertext: Vec<u8>,
    /// Result of decrypting `ciphertext`
    pub plaintext: Vec<u8>,
}

impl Report {
    /// True if decryption returned the original message.
    pub fn round_trips(&self, scenario: &Scenario) -> bool {
        self.plaintext == scenario.message
    }
}

/// Run `scenario` against `sdk`. The context is cleaned up afterwards, also
/// when a step fails.
pub fn run<B: Backend, E: Environment>(
    sdk: &SdkContext<B, E>,
    scenario: &Scenario,
) -> Result<Report, SdkError> {
    let report = run_steps(sdk, scenario);
    sdk.cleanup()?;
    tracing::info!("SDK cleaned up");
    report
}

fn run_steps<B: Backend, E: Environment>(
    sdk: &SdkContext<B, E>,
    scenario: &Scenario,
) -> Result<Report, SdkError> {
    sdk.init(&scenario.registration_token)?;
    if let Some(config) = sdk.config_blob() {
        tracing::info!(%config, "SDK initialized");
    }

    let token = sdk.create_session(&scenario.identity, &scenario.secret)?;
    tracing::info!(identity = %scenario.identity, token_len = token.len(), "session created");

    sdk.key_operation(KeyOp::Create, &scenario.key_name, Some(scenario.key.as_slice()))?;
    tracing::info!(key = %scenario.key_name, "key created");

    let ciphertext =
        sdk.do_crypto(CryptoOp::Encrypt, &scenario.key_name, &scenario.algorithm, &scenario.message)?;
    tracing::info!(
        algorithm = %scenario.algorithm,
        len = ciphertext.len(),
        ciphertext = %hex::encode(&ciphertext),
        "encrypted"
    );

    let plaintext =
        sdk.do_crypto(CryptoOp::Decrypt, &scenario.key_name, &scenario.algorithm, &ciphertext)?;
    tracing::info!(plaintext = %String::from_utf8_lossy(&plaintext), "decrypted");

    Ok(Report { ciphertext, plaintext })
}
