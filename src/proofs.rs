// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Non-interactive Chaum-Pedersen proofs over ElGamal ciphertexts.
//!
//! Challenges are derived Fiat-Shamir style from a Merlin transcript that binds the election's
//! extended base hash $Q'$, the ciphertext and the prover's commitments.

use crypto_bigint::{NonZero, U512};
use merlin::Transcript;

use crate::group::{ModP, ModQ, ModQNumber, Q};

pub use constant_chaum_pedersen::ConstantChaumPedersenProof;
pub use disjunctive_chaum_pedersen::DisjunctiveChaumPedersenProof;

mod constant_chaum_pedersen;
mod disjunctive_chaum_pedersen;

/// Defines a `TranscriptProtocol` trait for using a Merlin transcript.
pub trait TranscriptProtocol {
    /// Append an element of $\mathbb{Z}_p$ with the given `label`.
    fn append_element(&mut self, label: &'static [u8], element: &ModP);

    /// Append an element of $\mathbb{Z}_q$ with the given `label`.
    fn append_scalar(&mut self, label: &'static [u8], scalar: &ModQ);

    /// Compute a `label`ed challenge in $\mathbb{Z}_q$.
    fn challenge(&mut self, label: &'static [u8]) -> ModQ;
}

impl TranscriptProtocol for Transcript {
    fn append_element(&mut self, label: &'static [u8], element: &ModP) {
        self.append_message(label, &element.to_be_bytes());
    }

    fn append_scalar(&mut self, label: &'static [u8], scalar: &ModQ) {
        self.append_message(label, &scalar.to_be_bytes());
    }

    fn challenge(&mut self, label: &'static [u8]) -> ModQ {
        // Twice the width of $q$, so that the reduction below is statistically uniform.
        let mut buf = [0u8; U512::BYTES];
        self.challenge_bytes(label, &mut buf);

        let modulus = NonZero::<U512>::from_uint(Q.resize());
        let reduced = U512::from_be_slice(&buf) % modulus;

        ModQ::new_unchecked(reduced.resize::<{ ModQNumber::LIMBS }>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::rand_q;

    #[test]
    fn challenges_bind_the_transcript() {
        let element = ModP::GENERATOR;
        let scalar = rand_q();

        let challenge = |scalar: &ModQ| {
            let mut transcript = Transcript::new(b"test");
            transcript.append_element(b"element", &element);
            transcript.append_scalar(b"scalar", scalar);
            transcript.challenge(b"challenge")
        };

        assert_eq!(challenge(&scalar), challenge(&scalar));
        assert_ne!(challenge(&scalar), challenge(&(scalar + ModQ::ONE)));
        assert!(ModQ::new(*challenge(&scalar).value()).is_ok());
    }
}
