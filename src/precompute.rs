// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Precomputed exponentiations for encryption and proofs.
//!
//! Every nonce consumed by the encryption pipeline is paid for with two 4096-bit
//! exponentiations, $g^r$ and $K^r$. A [`PrecomputedTriple`] holds both for a random $r$, so they
//! can be produced ahead of time by the background worker of a [`PrecomputeBufferPool`].

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::group::{g_pow_p, ModP, ModQ};

pub use pool::PrecomputeBufferPool;

mod pool;

/// A random exponent $r$ with $g^r$ and $K^r$ for a fixed public key $K$.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrecomputedTriple {
    exponent: ModQ,
    #[zeroize(skip)]
    pub(crate) g_to_exponent: ModP,
    #[zeroize(skip)]
    pub(crate) pubkey_to_exponent: ModP,
}

impl PrecomputedTriple {
    pub fn generate(public_key: &ModP, rng: &mut impl CryptoRngCore) -> Self {
        Self::from_exponent(ModQ::random_non_zero(rng), public_key)
    }

    /// Computes the triple for a known exponent, e.g. one derived from a nonce sequence.
    pub fn from_exponent(exponent: ModQ, public_key: &ModP) -> Self {
        Self {
            exponent,
            g_to_exponent: g_pow_p(&exponent),
            pubkey_to_exponent: public_key.pow(&exponent),
        }
    }

    pub fn exponent(&self) -> &ModQ {
        &self.exponent
    }
}

/// Sizing of the precompute queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecomputeConfig {
    /// Upper bound on any requested queue size; larger requests are clamped.
    pub max_queue_size: usize,
    /// The queue size used when [`PrecomputeBufferPool::start`] is not given one.
    pub default_queue_size: usize,
}

impl Default for PrecomputeConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 5000,
            default_queue_size: 500,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecomputeState {
    NotStarted,
    Running,
    Completed,
    UserStopped,
}

impl PrecomputeState {
    /// Whether the worker of the latest run has exited.
    pub fn is_final(&self) -> bool {
        matches!(self, PrecomputeState::Completed | PrecomputeState::UserStopped)
    }
}

/// A snapshot of the pool's progress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrecomputeStatus {
    pub state: PrecomputeState,
    /// Triples currently buffered.
    pub count: usize,
    /// The queue size the current (or latest) run fills towards.
    pub queue_size: usize,
    /// `count / queue_size`, or zero before the first run.
    pub percentage: f64,
}
