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
    Error, Result,
};

/// A proof that an ElGamal ciphertext $(\alpha, \beta)$ encrypts either zero or one.
///
/// It is the OR-composition of two Chaum-Pedersen proofs: the branch matching the actual
/// plaintext is proven honestly with the encryption nonce $r$, while the other branch is
/// simulated by picking its challenge and response first. The verifier only learns that the
/// branch challenges sum to the Fiat-Shamir challenge $c = H(Q', \alpha, \beta, a_0, b_0, a_1, b_1)$.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisjunctiveChaumPedersenProof {
    /// $a_0$
    pub zero_pad: ModP,
    /// $b_0$
    pub zero_data: ModP,
    /// $a_1$
    pub one_pad: ModP,
    /// $b_1$
    pub one_data: ModP,
    /// $c_0$
    pub zero_challenge: ModQ,
    /// $c_1$
    pub one_challenge: ModQ,
    /// $c$
    pub challenge: ModQ,
    /// $v_0$
    pub zero_response: ModQ,
    /// $v_1$
    pub one_response: ModQ,
}

impl DisjunctiveChaumPedersenProof {
    /// Builds the proof deterministically from `seed`; the same inputs always give the same proof.
    pub fn make(
        message: &ElGamalCiphertext,
        nonce: &ModQ,
        plaintext: u64,
        public_key: &ModP,
        extended_base_hash: &ModQ,
        seed: &ModQ,
    ) -> Result<Self> {
        let nonces = Nonces::new(seed, &[&"disjoint-chaum-pedersen-proof"]);

        Self::make_with(
            message,
            nonce,
            plaintext,
            extended_base_hash,
            PrecomputedTriple::from_exponent(nonces.get(2), public_key),
            PrecomputedTriple::from_exponent(nonces.get(1), public_key),
            nonces.get(0),
        )
    }

    /// Builds the proof from fresh randomness; faster to reason about, but not reproducible.
    pub fn make_random(
        message: &ElGamalCiphertext,
        nonce: &ModQ,
        plaintext: u64,
        public_key: &ModP,
        extended_base_hash: &ModQ,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self> {
        Self::make_with(
            message,
            nonce,
            plaintext,
            extended_base_hash,
            PrecomputedTriple::generate(public_key, rng),
            PrecomputedTriple::generate(public_key, rng),
            ModQ::random(rng),
        )
    }

    /// Builds the proof from a commitment triple for the real branch, a triple whose exponent is
    /// the simulated branch's response, and the simulated branch's challenge.
    pub(crate) fn make_with(
        message: &ElGamalCiphertext,
        nonce: &ModQ,
        plaintext: u64,
        extended_base_hash: &ModQ,
        real: PrecomputedTriple,
        simulated: PrecomputedTriple,
        simulated_challenge: ModQ,
    ) -> Result<Self> {
        let ElGamalCiphertext { pad, data } = *message;

        // $\alpha^{-c}$ and $\beta^{-c}$ for the simulated challenge.
        let pad_to_minus_challenge = pad.pow(&-simulated_challenge);
        let data_to_minus_challenge = data.pow(&-simulated_challenge);

        match plaintext {
            0 => {
                // Real: $a_0 = g^u, b_0 = K^u$.
                // Simulated: $a_1 = g^{v_1} \alpha^{-c_1}, b_1 = g^{c_1} K^{v_1} \beta^{-c_1}$.
                let zero_pad = real.g_to_exponent;
                let zero_data = real.pubkey_to_exponent;
                let one_pad = simulated.g_to_exponent * pad_to_minus_challenge;
                let one_data = ModP::GENERATOR.pow(&simulated_challenge)
                    * simulated.pubkey_to_exponent
                    * data_to_minus_challenge;

                let challenge = challenge(
                    extended_base_hash,
                    message,
                    [&zero_pad, &zero_data, &one_pad, &one_data],
                );
                let zero_challenge = challenge - simulated_challenge;

                Ok(Self {
                    zero_pad,
                    zero_data,
                    one_pad,
                    one_data,
                    zero_challenge,
                    one_challenge: simulated_challenge,
                    challenge,
                    zero_response: *real.exponent() + zero_challenge * nonce,
                    one_response: *simulated.exponent(),
                })
            }
            1 => {
                // Simulated: $a_0 = g^{v_0} \alpha^{-c_0}, b_0 = K^{v_0} \beta^{-c_0}$.
                // Real: $a_1 = g^u, b_1 = K^u$.
                let zero_pad = simulated.g_to_exponent * pad_to_minus_challenge;
                let zero_data = simulated.pubkey_to_exponent * data_to_minus_challenge;
                let one_pad = real.g_to_exponent;
                let one_data = real.pubkey_to_exponent;

                let challenge = challenge(
                    extended_base_hash,
                    message,
                    [&zero_pad, &zero_data, &one_pad, &one_data],
                );
                let one_challenge = challenge - simulated_challenge;

                Ok(Self {
                    zero_pad,
                    zero_data,
                    one_pad,
                    one_data,
                    zero_challenge: simulated_challenge,
                    one_challenge,
                    challenge,
                    zero_response: *simulated.exponent(),
                    one_response: *real.exponent() + one_challenge * nonce,
                })
            }
            _ => Err(Error::InvalidArgument(format!(
                "a disjunctive proof covers plaintexts zero and one, not {plaintext}"
            ))),
        }
    }

    /// Checks the proof against `message`, `public_key` and the extended base hash.
    pub fn is_valid(
        &self,
        message: &ElGamalCiphertext,
        public_key: &ModP,
        extended_base_hash: &ModQ,
    ) -> bool {
        let ElGamalCiphertext { pad, data } = *message;

        // Negative exponents below are only inverses inside the order-$q$ subgroup.
        let in_bounds = [
            &pad,
            &data,
            public_key,
            &self.zero_pad,
            &self.zero_data,
            &self.one_pad,
            &self.one_data,
        ]
        .into_iter()
        .all(ModP::is_valid_residue);
        if !in_bounds {
            return false;
        }

        let recomputed_challenge = challenge(
            extended_base_hash,
            message,
            [&self.zero_pad, &self.zero_data, &self.one_pad, &self.one_data],
        );
        let consistent_challenge = recomputed_challenge == self.challenge
            && self.zero_challenge + self.one_challenge == self.challenge;

        // $g^{v_0} = a_0 \alpha^{c_0}$
        let consistent_gv0 = multi_exponentiate(&[
            (ModP::GENERATOR, self.zero_response),
            (pad, -self.zero_challenge),
        ]) == self.zero_pad;

        // $g^{v_1} = a_1 \alpha^{c_1}$
        let consistent_gv1 = multi_exponentiate(&[
            (ModP::GENERATOR, self.one_response),
            (pad, -self.one_challenge),
        ]) == self.one_pad;

        // $K^{v_0} = b_0 \beta^{c_0}$
        let consistent_kv0 = multi_exponentiate(&[
            (*public_key, self.zero_response),
            (data, -self.zero_challenge),
        ]) == self.zero_data;

        // $g^{c_1} K^{v_1} = b_1 \beta^{c_1}$
        let consistent_gc1kv1 = multi_exponentiate(&[
            (ModP::GENERATOR, self.one_challenge),
            (*public_key, self.one_response),
            (data, -self.one_challenge),
        ]) == self.one_data;

        consistent_challenge
            && consistent_gv0
            && consistent_gv1
            && consistent_kv0
            && consistent_gc1kv1
    }
}

/// $c = H(Q', \alpha, \beta, a_0, b_0, a_1, b_1)$
fn challenge(
    extended_base_hash: &ModQ,
    message: &ElGamalCiphertext,
    commitments: [&ModP; 4],
) -> ModQ {
    let mut transcript = Transcript::new(b"Disjunctive Chaum-Pedersen Proof");
    transcript.append_scalar(b"extended base hash", extended_base_hash);
    transcript.append_element(b"pad", &message.pad);
    transcript.append_element(b"data", &message.data);

    let [zero_pad, zero_data, one_pad, one_data] = commitments;
    transcript.append_element(b"zero pad", zero_pad);
    transcript.append_element(b"zero data", zero_data);
    transcript.append_element(b"one pad", one_pad);
    transcript.append_element(b"one data", one_data);

    transcript.challenge(b"challenge")
}
