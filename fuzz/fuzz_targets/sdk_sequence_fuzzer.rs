//! Fuzz target for SDK operation sequences
//!
//! Applies fuzzer-chosen operation sequences to a real `SdkContext` and to
//! the reference model, the same way the model-based property test does but
//! with coverage guidance.
//!
//! # Invariants
//!
//! - NEVER panic, whatever the order of init, cleanup, sessions and key ops
//! - Error kinds match the model at every step
//! - Cache and backend contents match the model at every step
//! - Nothing is cached while uninitialized

#![no_main]

use keylatch_core::{CryptoOp, KeyOp, MemoryBackend, SdkConfig, SdkContext, SdkState};
use keylatch_harness::{
    KEY_SPACE, ModelSdk, Operation, OperationResult, SimEnv, key_bytes, key_name,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u64, Vec<Operation>)| {
    let (seed, ops) = input;
    let env = SimEnv::with_seed(seed);
    let backend = MemoryBackend::new(env.clone());
    let sdk = SdkContext::new(SdkConfig::default(), backend.clone(), env);
    let mut model = ModelSdk::new();

    for op in ops.iter().take(256) {
        let expected = model.apply(op);

        let actual = match op {
            Operation::Init => sdk.init("tok").map(|()| OperationResult::Ok),
            Operation::Cleanup => sdk.cleanup().map(|()| OperationResult::Ok),
            Operation::CreateSession { identity } => {
                sdk.create_session(&format!("user-{identity}"), "pw").map(|_| OperationResult::Ok)
            },
            Operation::Create { key, material } => sdk
                .key_operation(KeyOp::Create, &key_name(*key), Some(&key_bytes(*material)[..]))
                .map(|_| OperationResult::Key(key_bytes(*material))),
            Operation::Read { key } => sdk
                .key_operation(KeyOp::Read, &key_name(*key), None)
                .map(|entry| {
                    entry.map_or(OperationResult::Ok, |e| {
                        OperationResult::Key(e.material().as_bytes().to_vec())
                    })
                }),
            Operation::Update { key, material } => sdk
                .key_operation(KeyOp::Update, &key_name(*key), Some(&key_bytes(*material)[..]))
                .map(|_| OperationResult::Key(key_bytes(*material))),
            Operation::Delete { key } => {
                sdk.key_operation(KeyOp::Delete, &key_name(*key), None).map(|_| OperationResult::Ok)
            },
            Operation::Encrypt { key, message } => {
                let name = key_name(*key);
                let message = message.to_bytes();
                sdk.do_crypto(CryptoOp::Encrypt, &name, "AES-GCM", &message)
                    .and_then(|blob| sdk.do_crypto(CryptoOp::Decrypt, &name, "AES-GCM", &blob))
                    .map(|plain| {
                        assert_eq!(plain, message);
                        // Which key sealed the blob is checked by the model test.
                        match &expected {
                            OperationResult::Sealed { .. } => expected.clone(),
                            _ => OperationResult::Ok,
                        }
                    })
            },
            Operation::RemoteStore { key, material } => {
                backend.insert_key(key_name(*key), key_bytes(*material).into());
                Ok(OperationResult::Ok)
            },
            Operation::RemoteDelete { key } => {
                backend.remove_key(&key_name(*key));
                Ok(OperationResult::Ok)
            },
        };

        let actual = actual.unwrap_or_else(|e| OperationResult::Error((&e).into()));
        assert_eq!(expected, actual, "diverged on {op:?}");

        let state = model.observable_state();
        assert_eq!(state.initialized, sdk.state() == SdkState::Initialized);
        assert_eq!(state.has_session, sdk.has_session());
        for name in (0..KEY_SPACE).map(key_name) {
            assert_eq!(state.cached.contains(&name), sdk.is_cached(&name), "cache {name}");
            assert_eq!(state.backend.contains(&name), backend.has_key(&name), "backend {name}");
        }
    }
});
