//! Fault-injecting backend wrapper.
//!
//! Delegates to an inner backend but fails calls with
//! [`BackendError::Unavailable`] at a configured rate. The RNG is seeded, so
//! a failing chaos run replays exactly with the same seed.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use keylatch_crypto::KeyMaterial;

use super::{Backend, KeyOpResponse};
use crate::{config::ConfigBlob, error::BackendError, ops::KeyOp, session::Session};

const DEFAULT_SEED: u64 = 0x6B65_796C_6174_6368;

/// Backend wrapper that randomly fails calls.
///
/// Failed calls never reach the inner backend, so its state reflects only
/// the calls that went through.
#[derive(Clone)]
pub struct ChaoticBackend<B: Backend> {
    inner: B,
    /// 0.0 never fails, 1.0 always fails
    failure_rate: f64,
    rng: Arc<Mutex<ChaosRng>>,
    injected: Arc<AtomicUsize>,
}

/// SplitMix64. Deterministic and fast; not for anything secret.
struct ChaosRng {
    state: u64,
}

impl ChaosRng {
    /// Next value in `[0.0, 1.0)`.
    fn next_unit(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;

        // Top 53 bits fill an f64 mantissa exactly.
        (z >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl<B: Backend> ChaoticBackend<B> {
    /// Wrap `inner`, failing calls with probability `failure_rate`.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in `[0.0, 1.0]`.
    pub fn new(inner: B, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, DEFAULT_SEED)
    }

    /// Wrap `inner` with an explicit chaos seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in `[0.0, 1.0]`.
    pub fn with_seed(inner: B, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaosRng { state: seed })),
            injected: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wrapped backend, for checking invariants after a chaos run.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Number of calls failed by injection so far.
    pub fn injected_failures(&self) -> usize {
        self.injected.load(Ordering::Relaxed)
    }

    fn roll(&self, call: &'static str) -> Result<(), BackendError> {
        // A poisoned RNG counts as a failed roll.
        let fail = match self.rng.lock() {
            Ok(mut rng) => rng.next_unit() < self.failure_rate,
            Err(_) => true,
        };
        if fail {
            self.injected.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(call, "chaos: injected backend failure");
            return Err(BackendError::Unavailable {
                reason: format!("injected failure in {call}"),
            });
        }
        Ok(())
    }
}

impl<B: Backend> Backend for ChaoticBackend<B> {
    fn fetch_config(
        &self,
        endpoint: &str,
        registration_token: &str,
    ) -> Result<ConfigBlob, BackendError> {
        self.roll("fetch_config")?;
        self.inner.fetch_config(endpoint, registration_token)
    }

    fn authenticate(
        &self,
        endpoint: &str,
        identity: &str,
        secret: &str,
    ) -> Result<String, BackendError> {
        self.roll("authenticate")?;
        self.inner.authenticate(endpoint, identity, secret)
    }

    fn key_op(
        &self,
        session: &Session,
        op: KeyOp,
        name: &str,
        data: Option<&KeyMaterial>,
    ) -> Result<KeyOpResponse, BackendError> {
        self.roll("key_op")?;
        self.inner.key_op(session, op, name, data)
    }
}
