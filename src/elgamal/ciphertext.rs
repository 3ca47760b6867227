// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::ops::Add;

use serde::{Deserialize, Serialize};

use super::ElGamalSecretKey;
use crate::{
    group::{g_pow_p, ModP, ModQ},
    hash::{hash_elems, hash_element_by_crypto_hash, CryptoHashable},
    precompute::PrecomputedTriple,
    Error, Result,
};

/// How far [`ElGamalCiphertext::decrypt`] searches for the discrete log of $g^m$.
///
/// Selection and contest plaintexts are bounded by the number of seats in a contest, so this is
/// far beyond anything the engine encrypts; callers summing larger totals pass their own bound.
pub const DEFAULT_DECRYPTION_BOUND: u64 = 10_000;

/// An exponential ElGamal ciphertext $(\alpha, \beta)$.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElGamalCiphertext {
    pub pad: ModP,
    pub data: ModP,
}

/// Encrypts `plaintext` under `public_key` with `nonce`: $(g^r, g^m K^r)$.
pub fn elgamal_encrypt(plaintext: u64, nonce: &ModQ, public_key: &ModP) -> Result<ElGamalCiphertext> {
    if nonce.is_zero() {
        return Err(Error::InvalidArgument(
            "an ElGamal nonce must be non-zero".to_string(),
        ));
    }

    Ok(ElGamalCiphertext {
        pad: g_pow_p(nonce),
        data: ModP::GENERATOR.pow_u64(plaintext) * public_key.pow(nonce),
    })
}

/// Homomorphically sums `ciphertexts`; fails on an empty slice, which has no encryption nonce.
pub fn elgamal_add(ciphertexts: &[ElGamalCiphertext]) -> Result<ElGamalCiphertext> {
    let (first, rest) = ciphertexts.split_first().ok_or_else(|| {
        Error::InvalidArgument("cannot accumulate an empty list of ciphertexts".to_string())
    })?;

    Ok(rest.iter().fold(*first, |accumulated, ciphertext| accumulated + *ciphertext))
}

impl ElGamalCiphertext {
    /// Encrypts `plaintext` reusing the exponentiations of a precomputed triple, whose exponent
    /// becomes the encryption nonce.
    pub(crate) fn encrypt_precomputed(plaintext: u64, triple: &PrecomputedTriple) -> Self {
        Self {
            pad: triple.g_to_exponent,
            data: ModP::GENERATOR.pow_u64(plaintext) * triple.pubkey_to_exponent,
        }
    }

    /// Decrypts with the secret key, searching $[0, $ [`DEFAULT_DECRYPTION_BOUND`] $]$.
    pub fn decrypt(&self, secret_key: &ElGamalSecretKey) -> Result<u64> {
        self.decrypt_bounded(secret_key, DEFAULT_DECRYPTION_BOUND)
    }

    /// Decrypts with the secret key, searching $[0, bound]$.
    pub fn decrypt_bounded(&self, secret_key: &ElGamalSecretKey, bound: u64) -> Result<u64> {
        // $\beta \cdot \alpha^{-s} = g^m$
        let blinding = self.pad.pow(&-*secret_key.value());

        discrete_log(&(self.data * blinding), bound)
    }

    /// Decrypts with the encryption nonce instead of the secret key.
    pub fn decrypt_known_nonce(&self, public_key: &ModP, nonce: &ModQ) -> Result<u64> {
        // $\beta \cdot K^{-r} = g^m$
        let blinding = public_key.pow(&-*nonce);

        discrete_log(&(self.data * blinding), DEFAULT_DECRYPTION_BOUND)
    }

    pub fn is_valid_residue(&self) -> bool {
        self.pad.is_valid_residue() && self.data.is_valid_residue()
    }
}

/// Finds $m \in [0, bound]$ with $g^m = element$ by walking the powers of $g$.
fn discrete_log(element: &ModP, bound: u64) -> Result<u64> {
    let mut power = ModP::ONE;

    for exponent in 0..=bound {
        if power == *element {
            return Ok(exponent);
        }
        power *= ModP::GENERATOR;
    }

    Err(Error::InvalidArgument(format!(
        "no plaintext in [0, {bound}] matches the ciphertext"
    )))
}

impl Add for ElGamalCiphertext {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn add(self, rhs: Self) -> Self::Output {
        // Adding plaintexts is the group operation of $\mathbb{Z}_p^*$ applied component-wise.
        Self {
            pad: self.pad * rhs.pad,
            data: self.data * rhs.data,
        }
    }
}

impl CryptoHashable for ElGamalCiphertext {
    fn crypto_hash(&self) -> ModQ {
        hash_elems(&[&self.pad, &self.data])
    }
}

hash_element_by_crypto_hash!(ElGamalCiphertext);
