// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::fmt;

use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    group::{g_pow_p, ModP, ModQ},
    Error, Result,
};

/// An ElGamal secret key $s \in [2, q)$, wiped from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ElGamalSecretKey(ModQ);

impl ElGamalSecretKey {
    /// Fails for $s < 2$: zero is not a key and one publishes itself as $K = g$.
    pub fn new(secret: ModQ) -> Result<Self> {
        if secret.is_zero() || secret == ModQ::ONE {
            return Err(Error::InvalidArgument(
                "an ElGamal secret key must be in [2, q)".to_string(),
            ));
        }

        Ok(Self(secret))
    }

    pub fn value(&self) -> &ModQ {
        &self.0
    }
}

impl fmt::Debug for ElGamalSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ElGamalSecretKey(..)")
    }
}

/// A secret key together with its public key $K = g^s \mod p$.
#[derive(Clone, Debug)]
pub struct ElGamalKeyPair {
    secret_key: ElGamalSecretKey,
    public_key: ModP,
}

impl ElGamalKeyPair {
    pub fn from_secret(secret: ModQ) -> Result<Self> {
        let secret_key = ElGamalSecretKey::new(secret)?;
        let public_key = g_pow_p(secret_key.value());

        Ok(Self {
            secret_key,
            public_key,
        })
    }

    pub fn random(rng: &mut impl CryptoRngCore) -> Self {
        // Classic rejection-sampling technique.
        loop {
            if let Ok(key_pair) = Self::from_secret(ModQ::random(rng)) {
                return key_pair;
            }
        }
    }

    pub fn secret_key(&self) -> &ElGamalSecretKey {
        &self.secret_key
    }

    pub fn public_key(&self) -> &ModP {
        &self.public_key
    }
}
