//! Reference model for model-based testing.
//!
//! Random [`Operation`] sequences are applied to both [`ModelSdk`] and a real
//! `SdkContext`; results and [`ObservableState`] must agree after every step.

mod operation;
mod sdk;

pub use operation::{
    KEY_SPACE, ModelKeyId, Operation, OperationError, OperationResult, SmallMessage, key_bytes,
    key_name,
};
pub use sdk::{ModelSdk, ObservableState};
