// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    group::{to_hex, ModP, ModQ, P, Q},
    hash::hash_elems,
    Error, Result,
};

/// Election-wide switches that shape how ballots are encrypted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfiguration {
    /// When set, a contest with more affirmative selections than seats is encrypted as a voided
    /// contest (every real selection zero); otherwise it is rejected.
    pub allow_overvotes: bool,
    pub max_ballots: u64,
}

impl Default for ContextConfiguration {
    fn default() -> Self {
        Self {
            allow_overvotes: true,
            max_ballots: 1_000_000,
        }
    }
}

/// The public cryptographic context of an election: the joint public key and the base hashes
/// every ballot and proof is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextElectionContext {
    pub number_of_guardians: u64,
    pub quorum: u64,
    pub elgamal_public_key: ModP,
    pub commitment_hash: ModQ,
    pub manifest_hash: ModQ,
    pub crypto_base_hash: ModQ,
    /// $Q'$, the seed of every Fiat-Shamir challenge.
    pub crypto_extended_base_hash: ModQ,
    #[serde(default)]
    pub configuration: ContextConfiguration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_data: Option<BTreeMap<String, String>>,
}

impl CiphertextElectionContext {
    /// Derives the base hashes from the group, the guardian setup and the manifest hash.
    pub fn make(
        number_of_guardians: u64,
        quorum: u64,
        elgamal_public_key: ModP,
        commitment_hash: ModQ,
        manifest_hash: ModQ,
        configuration: ContextConfiguration,
        extended_data: Option<BTreeMap<String, String>>,
    ) -> Result<Self> {
        if quorum == 0 || quorum > number_of_guardians {
            return Err(Error::InvalidArgument(format!(
                "a quorum of {quorum} is impossible with {number_of_guardians} guardians"
            )));
        }
        if !elgamal_public_key.is_valid_residue() {
            return Err(Error::InvalidArgument(
                "the ElGamal public key is not in the order-q subgroup".to_string(),
            ));
        }

        let crypto_base_hash = crypto_base_hash(number_of_guardians, quorum, &manifest_hash);
        let crypto_extended_base_hash = hash_elems(&[&crypto_base_hash, &commitment_hash]);

        Ok(Self {
            number_of_guardians,
            quorum,
            elgamal_public_key,
            commitment_hash,
            manifest_hash,
            crypto_base_hash,
            crypto_extended_base_hash,
            configuration,
            extended_data,
        })
    }

    /// Whether the stored base hashes are the ones [`Self::make`] derives from the other fields.
    pub fn is_valid(&self) -> bool {
        let crypto_base_hash =
            crypto_base_hash(self.number_of_guardians, self.quorum, &self.manifest_hash);

        crypto_base_hash == self.crypto_base_hash
            && hash_elems(&[&crypto_base_hash, &self.commitment_hash])
                == self.crypto_extended_base_hash
            && self.elgamal_public_key.is_valid_residue()
    }
}

/// $H(p, q, g, n, k, H_M)$
fn crypto_base_hash(number_of_guardians: u64, quorum: u64, manifest_hash: &ModQ) -> ModQ {
    hash_elems(&[
        &to_hex(&P),
        &to_hex(&Q),
        &ModP::GENERATOR,
        &number_of_guardians,
        &quorum,
        manifest_hash,
    ])
}
