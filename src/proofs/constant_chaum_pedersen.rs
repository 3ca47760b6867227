// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use merlin::Transcript;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::TranscriptProtocol;
use crate::{
    elgamal::ElGamalCiphertext,
    group::{ModP, ModQ},
    hash::Nonces,
    multiexp::multi_exponentiate,
    precompute::PrecomputedTriple,
};

/// A proof that an ElGamal ciphertext $(\alpha, \beta)$, typically the accumulation of every
/// selection in a contest, encrypts the public `constant` $L$.
///
/// With commitment $(a, b) = (g^u, K^u)$, challenge $c = H(Q', \alpha, \beta, a, b)$ and response
/// $v = u + cr$, the verifier checks $g^v = a \alpha^c$ and $g^{cL} K^v = b \beta^c$.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantChaumPedersenProof {
    /// $a$
    pub pad: ModP,
    /// $b$
    pub data: ModP,
    /// $c$
    pub challenge: ModQ,
    /// $v$
    pub response: ModQ,
    /// $L$
    pub constant: u64,
}

impl ConstantChaumPedersenProof {
    /// Builds the proof deterministically from `seed`.
    pub fn make(
        message: &ElGamalCiphertext,
        nonce: &ModQ,
        constant: u64,
        public_key: &ModP,
        extended_base_hash: &ModQ,
        seed: &ModQ,
    ) -> Self {
        let commitment = Nonces::new(seed, &[&"constant-chaum-pedersen-proof"]).get(0);

        Self::make_with(
            message,
            nonce,
            constant,
            extended_base_hash,
            PrecomputedTriple::from_exponent(commitment, public_key),
        )
    }

    /// Builds the proof from fresh randomness.
    pub fn make_random(
        message: &ElGamalCiphertext,
        nonce: &ModQ,
        constant: u64,
        public_key: &ModP,
        extended_base_hash: &ModQ,
        rng: &mut impl CryptoRngCore,
    ) -> Self {
        Self::make_with(
            message,
            nonce,
            constant,
            extended_base_hash,
            PrecomputedTriple::generate(public_key, rng),
        )
    }

    /// Builds the proof with the exponentiations of `commitment` as $(a, b)$.
    pub(crate) fn make_with(
        message: &ElGamalCiphertext,
        nonce: &ModQ,
        constant: u64,
        extended_base_hash: &ModQ,
        commitment: PrecomputedTriple,
    ) -> Self {
        let pad = commitment.g_to_exponent;
        let data = commitment.pubkey_to_exponent;

        let challenge = challenge(extended_base_hash, message, &pad, &data);

        Self {
            pad,
            data,
            challenge,
            response: *commitment.exponent() + challenge * nonce,
            constant,
        }
    }

    /// Checks the proof against `message`, `public_key` and the extended base hash.
    ///
    /// This validates the algebra for the constant the proof carries; callers that expect a
    /// particular constant compare it against [`Self::constant`] themselves.
    pub fn is_valid(
        &self,
        message: &ElGamalCiphertext,
        public_key: &ModP,
        extended_base_hash: &ModQ,
    ) -> bool {
        let ElGamalCiphertext {
            pad: alpha,
            data: beta,
        } = *message;

        let in_bounds = [&alpha, &beta, public_key, &self.pad, &self.data]
            .into_iter()
            .all(ModP::is_valid_residue);
        if !in_bounds {
            return false;
        }

        let consistent_challenge =
            challenge(extended_base_hash, message, &self.pad, &self.data) == self.challenge;

        // $g^v = a \alpha^c$
        let consistent_gv = multi_exponentiate(&[
            (ModP::GENERATOR, self.response),
            (alpha, -self.challenge),
        ]) == self.pad;

        // $g^{cL} K^v = b \beta^c$
        let consistent_kv = multi_exponentiate(&[
            (
                ModP::GENERATOR,
                self.challenge * ModQ::from_u64(self.constant),
            ),
            (*public_key, self.response),
            (beta, -self.challenge),
        ]) == self.data;

        consistent_challenge && consistent_gv && consistent_kv
    }
}

/// $c = H(Q', \alpha, \beta, a, b)$
fn challenge(extended_base_hash: &ModQ, message: &ElGamalCiphertext, pad: &ModP, data: &ModP) -> ModQ {
    let mut transcript = Transcript::new(b"Constant Chaum-Pedersen Proof");
    transcript.append_scalar(b"extended base hash", extended_base_hash);
    transcript.append_element(b"message pad", &message.pad);
    transcript.append_element(b"message data", &message.data);
    transcript.append_element(b"pad", pad);
    transcript.append_element(b"data", data);

    transcript.challenge(b"challenge")
}
