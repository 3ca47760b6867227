// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Exponential ElGamal over the order-$q$ subgroup of $\mathbb{Z}_p^*$.
//!
//! A vote $m$ under nonce $r$ and public key $K = g^s$ encrypts to $(\alpha, \beta) = (g^r, g^m K^r)$.
//! Multiplying ciphertexts component-wise adds the votes they carry, which is how selection
//! ciphertexts are summed into a contest total.

pub use ciphertext::{elgamal_add, elgamal_encrypt, ElGamalCiphertext, DEFAULT_DECRYPTION_BOUND};
pub use keypair::{ElGamalKeyPair, ElGamalSecretKey};

mod ciphertext;
mod keypair;
