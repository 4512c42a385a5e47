//! Keylatch demo binary.
//!
//! Runs the end-to-end scenario against the in-memory backend.
//!
//! # Usage
//!
//! ```bash
//! # Default scenario: AES-GCM, key K1 of 32 zero bytes, message "hello"
//! keylatch-demo
//!
//! # ChaCha20-Poly1305 with debug logging
//! keylatch-demo --algorithm CHACHA20-POLY1305 --message "attack at dawn" --log-level debug
//! ```

use clap::Parser;
use keylatch_core::{MemoryBackend, SdkConfig, SdkContext, SystemEnv};
use keylatch_demo::Scenario;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keylatch SDK demo
#[derive(Parser, Debug)]
#[command(name = "keylatch-demo")]
#[command(about = "Run the keylatch SDK end to end against an in-memory backend")]
#[command(version)]
struct Args {
    /// Backend endpoint the session is bound to
    #[arg(long, default_value = keylatch_core::DEFAULT_API_ENDPOINT)]
    endpoint: String,

    /// Registration token passed to init
    #[arg(long, default_value = "tok")]
    registration_token: String,

    /// Identity to authenticate as
    #[arg(long, default_value = "alice")]
    identity: String,

    /// Secret for the identity
    #[arg(long, default_value = "pw")]
    secret: String,

    /// Name of the key to create
    #[arg(long, default_value = "K1")]
    key_name: String,

    /// Algorithm identifier (AES-GCM, AES-256-GCM, CHACHA20-POLY1305)
    #[arg(long, default_value = "AES-GCM")]
    algorithm: String,

    /// Message to encrypt
    #[arg(long, default_value = "hello")]
    message: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!(endpoint = %args.endpoint, "keylatch demo starting");

    let backend =
        MemoryBackend::new(SystemEnv::new()).with_user(args.identity.clone(), args.secret.clone());
    let sdk = SdkContext::new(
        SdkConfig::default().with_endpoint(args.endpoint),
        backend,
        SystemEnv::new(),
    );

    let scenario = Scenario {
        registration_token: args.registration_token,
        identity: args.identity,
        secret: args.secret,
        key_name: args.key_name,
        algorithm: args.algorithm,
        message: args.message.into_bytes(),
        ..Scenario::default()
    };

    let report = keylatch_demo::run(&sdk, &scenario)?;

    if report.round_trips(&scenario) {
        tracing::info!("round trip succeeded");
    } else {
        tracing::error!("decrypted plaintext does not match the original message");
        return Err("round trip mismatch".into());
    }

    Ok(())
}
