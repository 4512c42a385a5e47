//! End-to-end SDK scenarios against the in-memory backend.

use keylatch_core::{
    BackendError, CryptoError, CryptoOp, KeyMaterial, KeyOp, MemoryBackend, SdkConfig, SdkContext,
    SdkError, SdkState, SystemEnv,
};

type Sdk = SdkContext<MemoryBackend<SystemEnv>, SystemEnv>;

fn sdk_with(backend: MemoryBackend<SystemEnv>) -> Sdk {
    SdkContext::new(SdkConfig::default(), backend, SystemEnv::new())
}

fn ready_sdk() -> (Sdk, MemoryBackend<SystemEnv>) {
    let backend = MemoryBackend::new(SystemEnv::new());
    let sdk = sdk_with(backend.clone());
    sdk.init("tok").unwrap();
    sdk.create_session("alice", "pw").unwrap();
    (sdk, backend)
}

#[test]
fn hello_roundtrip_scenario() {
    let sdk = sdk_with(MemoryBackend::new(SystemEnv::new()));

    sdk.init("tok").unwrap();
    let token = sdk.create_session("alice", "pw").unwrap();
    assert!(!token.is_empty());

    sdk.key_operation(KeyOp::Create, "K1", Some(&[0u8; 32][..])).unwrap();

    let blob = sdk.do_crypto(CryptoOp::Encrypt, "K1", "AES-GCM", b"hello").unwrap();
    assert_eq!(blob.len(), 33);

    let plain = sdk.do_crypto(CryptoOp::Decrypt, "K1", "AES-GCM", &blob).unwrap();
    assert_eq!(plain, b"hello");

    sdk.cleanup().unwrap();
    assert_eq!(sdk.state(), SdkState::Uninitialized);
}

#[test]
fn operation_names_parse_from_strings() {
    let (sdk, _) = ready_sdk();

    let create: KeyOp = "create".parse().unwrap();
    sdk.key_operation(create, "K1", Some(&[1u8; 32][..])).unwrap();

    let encrypt: CryptoOp = "Encrypt".parse().unwrap();
    let blob = sdk.do_crypto(encrypt, "K1", "aes/gcm/nopadding", b"data").unwrap();

    let decrypt: CryptoOp = "DECRYPT".parse().unwrap();
    assert_eq!(sdk.do_crypto(decrypt, "K1", "AES-256-GCM", &blob).unwrap(), b"data");

    assert_eq!(
        "SIGN".parse::<CryptoOp>(),
        Err(SdkError::UnsupportedOperation { op: "SIGN".to_string() })
    );
    assert!(matches!("PATCH".parse::<KeyOp>(), Err(SdkError::InvalidArgument { .. })));
}

#[test]
fn read_after_create_returns_created_material() {
    let (sdk, backend) = ready_sdk();
    let material = [0xA5u8; 32];

    sdk.key_operation(KeyOp::Create, "K1", Some(&material[..])).unwrap();
    let entry = sdk.key_operation(KeyOp::Read, "K1", None).unwrap().unwrap();

    assert_eq!(entry.name(), "K1");
    assert_eq!(entry.material().as_bytes(), &material);
    assert_eq!(backend.stats().read, 1);
}

#[test]
fn cached_key_needs_no_backend_fetch() {
    let (sdk, backend) = ready_sdk();
    sdk.key_operation(KeyOp::Create, "K1", Some(&[0u8; 32][..])).unwrap();

    for _ in 0..10 {
        sdk.do_crypto(CryptoOp::Encrypt, "K1", "AES-GCM", b"x").unwrap();
    }

    assert_eq!(backend.stats().read, 0);
}

#[test]
fn uncached_key_is_fetched_once() {
    let (sdk, backend) = ready_sdk();
    backend.insert_key("remote", KeyMaterial::from(vec![3u8; 32]));

    sdk.do_crypto(CryptoOp::Encrypt, "remote", "AES-GCM", b"x").unwrap();
    sdk.do_crypto(CryptoOp::Encrypt, "remote", "AES-GCM", b"y").unwrap();

    assert_eq!(backend.stats().read, 1);
    assert!(sdk.is_cached("remote"));
}

#[test]
fn delete_then_crypto_fetches_and_fails() {
    let (sdk, backend) = ready_sdk();
    sdk.key_operation(KeyOp::Create, "K1", Some(&[0u8; 32][..])).unwrap();

    sdk.key_operation(KeyOp::Delete, "K1", None).unwrap();
    let result = sdk.do_crypto(CryptoOp::Encrypt, "K1", "AES-GCM", b"x");

    assert_eq!(result, Err(SdkError::KeyNotFound { name: "K1".to_string() }));
    assert_eq!(backend.stats().read, 1);
    assert!(!sdk.is_cached("K1"));
}

#[test]
fn delete_then_crypto_succeeds_if_backend_still_holds_key() {
    let (sdk, backend) = ready_sdk();
    sdk.key_operation(KeyOp::Create, "K1", Some(&[0u8; 32][..])).unwrap();
    sdk.key_operation(KeyOp::Delete, "K1", None).unwrap();

    // Another client recreated the key behind our back.
    backend.insert_key("K1", KeyMaterial::from(vec![8u8; 32]));

    sdk.do_crypto(CryptoOp::Encrypt, "K1", "AES-GCM", b"x").unwrap();
    assert_eq!(backend.stats().read, 1);
}

#[test]
fn update_replaces_cached_material() {
    let (sdk, _) = ready_sdk();
    sdk.key_operation(KeyOp::Create, "K1", Some(&[1u8; 32][..])).unwrap();
    let old_blob = sdk.do_crypto(CryptoOp::Encrypt, "K1", "AES-GCM", b"x").unwrap();

    sdk.key_operation(KeyOp::Update, "K1", Some(&[2u8; 32][..])).unwrap();

    let result = sdk.do_crypto(CryptoOp::Decrypt, "K1", "AES-GCM", &old_blob);
    assert_eq!(result, Err(SdkError::Crypto(CryptoError::AuthenticationFailure)));
}

#[test]
fn update_of_missing_key_is_not_found_and_not_cached() {
    let (sdk, _) = ready_sdk();

    let result = sdk.key_operation(KeyOp::Update, "ghost", Some(&[1u8; 32][..]));

    assert_eq!(result, Err(SdkError::KeyNotFound { name: "ghost".to_string() }));
    assert_eq!(sdk.cached_key_count(), 0);
}

#[test]
fn tampered_blob_fails_authentication() {
    let (sdk, _) = ready_sdk();
    sdk.key_operation(KeyOp::Create, "K1", Some(&[0u8; 32][..])).unwrap();
    let mut blob = sdk.do_crypto(CryptoOp::Encrypt, "K1", "CHACHA20-POLY1305", b"hello").unwrap();

    blob[15] ^= 0x01;
    let result = sdk.do_crypto(CryptoOp::Decrypt, "K1", "CHACHA20-POLY1305", &blob);

    assert!(result.as_ref().is_err_and(SdkError::is_authentication_failure));
}

#[test]
fn short_blob_is_malformed() {
    let (sdk, _) = ready_sdk();
    sdk.key_operation(KeyOp::Create, "K1", Some(&[0u8; 32][..])).unwrap();

    let result = sdk.do_crypto(CryptoOp::Decrypt, "K1", "AES-GCM", &[0u8; 10]);

    assert_eq!(result, Err(SdkError::Crypto(CryptoError::Truncated { len: 10, min: 28 })));
}

#[test]
fn everything_before_init_is_not_initialized() {
    let sdk = sdk_with(MemoryBackend::new(SystemEnv::new()));

    assert_eq!(sdk.create_session("alice", "pw"), Err(SdkError::NotInitialized));
    assert_eq!(
        sdk.key_operation(KeyOp::Create, "K1", Some(&[0u8; 32][..])),
        Err(SdkError::NotInitialized)
    );
    assert_eq!(
        sdk.do_crypto(CryptoOp::Encrypt, "K1", "AES-GCM", b"x"),
        Err(SdkError::NotInitialized)
    );
    assert_eq!(SdkError::NotInitialized.status_code(), -2);
}

#[test]
fn double_init_is_rejected() {
    let (sdk, backend) = ready_sdk();

    assert_eq!(sdk.init("tok"), Err(SdkError::AlreadyInitialized));
    assert_eq!(backend.stats().fetch_config, 1);
}

#[test]
fn operations_after_cleanup_are_not_initialized() {
    let (sdk, _) = ready_sdk();
    sdk.key_operation(KeyOp::Create, "K1", Some(&[0u8; 32][..])).unwrap();

    sdk.cleanup().unwrap();

    assert_eq!(
        sdk.do_crypto(CryptoOp::Encrypt, "K1", "AES-GCM", b"x"),
        Err(SdkError::NotInitialized)
    );
    assert_eq!(sdk.cached_key_count(), 0);
}

#[test]
fn reinit_requires_new_session() {
    let (sdk, backend) = ready_sdk();
    backend.insert_key("K1", KeyMaterial::from(vec![0u8; 32]));

    sdk.cleanup().unwrap();
    sdk.init("tok").unwrap();

    let result = sdk.do_crypto(CryptoOp::Encrypt, "K1", "AES-GCM", b"x");
    assert_eq!(result, Err(SdkError::NoActiveSession));
}

#[test]
fn revoked_session_surfaces_unauthorized() {
    let (sdk, backend) = ready_sdk();
    backend.revoke_sessions();

    let result = sdk.key_operation(KeyOp::Read, "K1", None);

    assert_eq!(result, Err(SdkError::Backend(BackendError::Unauthorized)));
    assert_eq!(result.unwrap_err().status_code(), -6);
}

#[test]
fn failed_init_stays_uninitialized() {
    let backend = MemoryBackend::new(SystemEnv::new());
    let sdk = SdkContext::new(
        SdkConfig::default(),
        keylatch_core::ChaoticBackend::new(backend, 1.0),
        SystemEnv::new(),
    );

    let result = sdk.init("tok");

    assert!(result.as_ref().is_err_and(SdkError::is_transient));
    assert_eq!(result.unwrap_err().status_code(), -5);
    assert_eq!(sdk.state(), SdkState::Uninitialized);
    assert!(sdk.config_blob().is_none());
}

#[test]
fn custom_endpoint_reaches_sessions() {
    let sdk = SdkContext::new(
        SdkConfig::default().with_endpoint("http://localhost:8080"),
        MemoryBackend::new(SystemEnv::new()),
        SystemEnv::new(),
    );
    sdk.init("tok").unwrap();

    assert_eq!(sdk.config().api_endpoint, "http://localhost:8080");
    assert_eq!(sdk.config_blob().unwrap().features(), vec!["AES-256-GCM", "CHACHA20-POLY1305"]);
}
