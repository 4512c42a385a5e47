//! Deterministic test harness for the keylatch SDK.
//!
//! # Simulation Environment
//!
//! [`SimEnv`] implements `Environment` over a seeded ChaCha20 RNG, so every
//! nonce and session token in a test is reproducible from its seed.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation of the SDK and its
//! backend. Operations are applied to both the model and the real context,
//! and their results and observable states are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_env;

pub use model::{
    KEY_SPACE, ModelKeyId, ModelSdk, ObservableState, Operation, OperationError, OperationResult,
    SmallMessage, key_bytes, key_name,
};
pub use sim_env::SimEnv;
