// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{
    context::CiphertextElectionContext,
    elgamal::{elgamal_add, ElGamalCiphertext},
    group::{ModP, ModQ},
    hash::{hash_elems, CryptoHashable, HashElement},
    manifest::{ContestDescriptionWithPlaceholders, InternalManifest, SelectionDescription},
    proofs::{ConstantChaumPedersenProof, DisjunctiveChaumPedersenProof},
};

/// The encryption of one selection, with a proof that it encrypts zero or one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextBallotSelection {
    pub object_id: String,
    pub sequence_order: u32,
    /// The hash of the [`SelectionDescription`] this selection encrypts a vote for.
    pub description_hash: ModQ,
    pub ciphertext: ElGamalCiphertext,
    pub crypto_hash: ModQ,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_placeholder: bool,
    /// The encryption nonce, until it is discarded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<ModQ>,
    pub proof: DisjunctiveChaumPedersenProof,
}

impl CiphertextBallotSelection {
    pub(crate) fn new(
        description: &SelectionDescription,
        ciphertext: ElGamalCiphertext,
        nonce: ModQ,
        proof: DisjunctiveChaumPedersenProof,
    ) -> Self {
        let description_hash = description.crypto_hash();

        Self {
            object_id: description.object_id.clone(),
            sequence_order: description.sequence_order,
            description_hash,
            ciphertext,
            crypto_hash: selection_hash(&description.object_id, &description_hash, &ciphertext),
            is_placeholder: description.is_placeholder,
            nonce: Some(nonce),
            proof,
        }
    }

    /// Checks the selection against `description`: matching identity and description hash, a
    /// consistent crypto hash, and a valid zero-or-one proof.
    pub fn is_valid_encryption(
        &self,
        description: &SelectionDescription,
        public_key: &ModP,
        extended_base_hash: &ModQ,
    ) -> bool {
        if self.object_id != description.object_id
            || self.sequence_order != description.sequence_order
            || self.is_placeholder != description.is_placeholder
            || self.description_hash != description.crypto_hash()
        {
            debug!("selection {} does not match its description", self.object_id);
            return false;
        }

        if selection_hash(&self.object_id, &self.description_hash, &self.ciphertext)
            != self.crypto_hash
        {
            debug!("selection {} has an inconsistent crypto hash", self.object_id);
            return false;
        }

        if !self
            .proof
            .is_valid(&self.ciphertext, public_key, extended_base_hash)
        {
            debug!("selection {} has an invalid proof", self.object_id);
            return false;
        }

        true
    }

    pub fn discard_nonce(&mut self) {
        if let Some(nonce) = self.nonce.as_mut() {
            nonce.zeroize();
        }
        self.nonce = None;
    }
}

impl HashElement for CiphertextBallotSelection {
    fn hash_text(&self) -> String {
        self.crypto_hash.to_hex()
    }
}

fn selection_hash(object_id: &str, description_hash: &ModQ, ciphertext: &ElGamalCiphertext) -> ModQ {
    hash_elems(&[&object_id, description_hash, ciphertext])
}

/// The encryption of one contest: its selections (placeholders last), their homomorphic sum,
/// and a proof that the sum is the contest's seat count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextBallotContest {
    pub object_id: String,
    pub sequence_order: u32,
    pub description_hash: ModQ,
    pub ballot_selections: Vec<CiphertextBallotSelection>,
    pub ciphertext_accumulation: ElGamalCiphertext,
    pub crypto_hash: ModQ,
    /// The sum of the selection nonces, which is the nonce of the accumulation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<ModQ>,
    pub proof: ConstantChaumPedersenProof,
}

impl CiphertextBallotContest {
    pub(crate) fn new(
        description: &ContestDescriptionWithPlaceholders,
        ballot_selections: Vec<CiphertextBallotSelection>,
        ciphertext_accumulation: ElGamalCiphertext,
        nonce: ModQ,
        proof: ConstantChaumPedersenProof,
    ) -> Self {
        let contest = &description.description;
        let description_hash = description.crypto_hash();

        Self {
            object_id: contest.object_id.clone(),
            sequence_order: contest.sequence_order,
            description_hash,
            crypto_hash: contest_hash(&contest.object_id, &description_hash, &ballot_selections),
            ballot_selections,
            ciphertext_accumulation,
            nonce: Some(nonce),
            proof,
        }
    }

    /// Checks the contest against `description`: every real selection and placeholder present
    /// in order and valid, an accumulation that is the sum of the selections, a consistent
    /// crypto hash, and a valid proof for the contest's seat count.
    pub fn is_valid_encryption(
        &self,
        description: &ContestDescriptionWithPlaceholders,
        public_key: &ModP,
        extended_base_hash: &ModQ,
    ) -> bool {
        let contest = &description.description;
        if self.object_id != contest.object_id
            || self.sequence_order != contest.sequence_order
            || self.description_hash != description.crypto_hash()
        {
            debug!("contest {} does not match its description", self.object_id);
            return false;
        }

        let selection_descriptions: Vec<&SelectionDescription> = description.selections().collect();
        if self.ballot_selections.len() != selection_descriptions.len() {
            debug!(
                "contest {} has {} selections where {} are expected",
                self.object_id,
                self.ballot_selections.len(),
                selection_descriptions.len()
            );
            return false;
        }

        #[cfg(not(feature = "parallel"))]
        let iter = self.ballot_selections.iter().zip(selection_descriptions.iter());
        #[cfg(feature = "parallel")]
        let iter = self
            .ballot_selections
            .par_iter()
            .zip(selection_descriptions.par_iter());

        let selections_valid = iter
            .map(|(selection, selection_description)| {
                selection.is_valid_encryption(selection_description, public_key, extended_base_hash)
            })
            .all(|valid| valid);
        if !selections_valid {
            return false;
        }

        let ciphertexts: Vec<ElGamalCiphertext> = self
            .ballot_selections
            .iter()
            .map(|selection| selection.ciphertext)
            .collect();
        if elgamal_add(&ciphertexts).ok() != Some(self.ciphertext_accumulation) {
            debug!("contest {} has an inconsistent accumulation", self.object_id);
            return false;
        }

        if contest_hash(&self.object_id, &self.description_hash, &self.ballot_selections)
            != self.crypto_hash
        {
            debug!("contest {} has an inconsistent crypto hash", self.object_id);
            return false;
        }

        if self.proof.constant != u64::from(contest.number_elected)
            || !self
                .proof
                .is_valid(&self.ciphertext_accumulation, public_key, extended_base_hash)
        {
            debug!("contest {} has an invalid proof", self.object_id);
            return false;
        }

        true
    }

    pub fn discard_nonces(&mut self) {
        if let Some(nonce) = self.nonce.as_mut() {
            nonce.zeroize();
        }
        self.nonce = None;

        self.ballot_selections
            .iter_mut()
            .for_each(CiphertextBallotSelection::discard_nonce);
    }
}

impl HashElement for CiphertextBallotContest {
    fn hash_text(&self) -> String {
        self.crypto_hash.to_hex()
    }
}

fn contest_hash(
    object_id: &str,
    description_hash: &ModQ,
    ballot_selections: &[CiphertextBallotSelection],
) -> ModQ {
    hash_elems(&[&object_id, description_hash, &ballot_selections])
}

/// `H(seed, timestamp, crypto_hash)`: the tracking code of a ballot, and the seed of the next
/// ballot encrypted on the same device.
pub fn ballot_code(ballot_code_seed: &ModQ, timestamp: i64, crypto_hash: &ModQ) -> ModQ {
    hash_elems(&[ballot_code_seed, &timestamp, crypto_hash])
}

/// An encrypted ballot, bound to its manifest and chained to the device's previous ballot
/// through its ballot code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextBallot {
    pub object_id: String,
    pub style_id: String,
    pub manifest_hash: ModQ,
    pub ballot_code_seed: ModQ,
    /// One contest per contest of the style, in manifest order.
    pub contests: Vec<CiphertextBallotContest>,
    pub ballot_code: ModQ,
    /// Seconds since the unix epoch.
    pub timestamp: i64,
    pub crypto_hash: ModQ,
    /// The ballot nonce every other nonce derives from, until it is discarded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<ModQ>,
}

impl CiphertextBallot {
    /// The seed of a ballot's contest nonces: $H(H_M, id, nonce)$.
    pub fn nonce_seed(manifest_hash: &ModQ, object_id: &str, nonce: &ModQ) -> ModQ {
        hash_elems(&[manifest_hash, &object_id, nonce])
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        object_id: &str,
        style_id: &str,
        manifest_hash: ModQ,
        ballot_code_seed: ModQ,
        contests: Vec<CiphertextBallotContest>,
        timestamp: i64,
        nonce: ModQ,
    ) -> Self {
        let crypto_hash = ballot_hash(object_id, &manifest_hash, &contests);

        Self {
            object_id: object_id.to_string(),
            style_id: style_id.to_string(),
            manifest_hash,
            ballot_code_seed,
            contests,
            ballot_code: ballot_code(&ballot_code_seed, timestamp, &crypto_hash),
            timestamp,
            crypto_hash,
            nonce: Some(nonce),
        }
    }

    /// Zeroizes the ballot nonce and every contest and selection nonce.
    pub fn discard_nonces(&mut self) {
        if let Some(nonce) = self.nonce.as_mut() {
            nonce.zeroize();
        }
        self.nonce = None;

        self.contests
            .iter_mut()
            .for_each(CiphertextBallotContest::discard_nonces);
    }

    /// Whether every contest and selection validates against `manifest`, under the key and
    /// extended base hash of `context`, and the ballot's own hashes are consistent.
    pub fn is_valid_encryption(
        &self,
        manifest: &InternalManifest,
        context: &CiphertextElectionContext,
    ) -> bool {
        self.as_record().is_valid_encryption(manifest, context)
    }

    fn as_record(&self) -> BallotRecord<'_> {
        BallotRecord {
            object_id: &self.object_id,
            style_id: &self.style_id,
            manifest_hash: &self.manifest_hash,
            ballot_code_seed: &self.ballot_code_seed,
            contests: &self.contests,
            ballot_code: &self.ballot_code,
            timestamp: self.timestamp,
            crypto_hash: &self.crypto_hash,
        }
    }
}

impl CryptoHashable for CiphertextBallot {
    fn crypto_hash(&self) -> ModQ {
        self.crypto_hash
    }
}

fn ballot_hash(object_id: &str, manifest_hash: &ModQ, contests: &[CiphertextBallotContest]) -> ModQ {
    hash_elems(&[&object_id, manifest_hash, &contests])
}

/// The publicly verifiable part of an encrypted ballot, shared by ciphertext and submitted
/// ballots.
pub(crate) struct BallotRecord<'a> {
    pub(crate) object_id: &'a str,
    pub(crate) style_id: &'a str,
    pub(crate) manifest_hash: &'a ModQ,
    pub(crate) ballot_code_seed: &'a ModQ,
    pub(crate) contests: &'a [CiphertextBallotContest],
    pub(crate) ballot_code: &'a ModQ,
    pub(crate) timestamp: i64,
    pub(crate) crypto_hash: &'a ModQ,
}

impl BallotRecord<'_> {
    pub(crate) fn is_valid_encryption(
        &self,
        manifest: &InternalManifest,
        context: &CiphertextElectionContext,
    ) -> bool {
        if *self.manifest_hash != manifest.manifest_hash
            || *self.manifest_hash != context.manifest_hash
        {
            debug!("ballot {} was encrypted for another manifest", self.object_id);
            return false;
        }

        let descriptions = manifest.get_contests_for(self.style_id);
        if descriptions.is_empty() || descriptions.len() != self.contests.len() {
            debug!(
                "ballot {} does not carry the contests of style {}",
                self.object_id, self.style_id
            );
            return false;
        }

        #[cfg(not(feature = "parallel"))]
        let iter = self.contests.iter().zip(descriptions.iter());
        #[cfg(feature = "parallel")]
        let iter = self.contests.par_iter().zip(descriptions.par_iter());

        let contests_valid = iter
            .map(|(contest, description)| {
                contest.is_valid_encryption(
                    description,
                    &context.elgamal_public_key,
                    &context.crypto_extended_base_hash,
                )
            })
            .all(|valid| valid);
        if !contests_valid {
            return false;
        }

        let crypto_hash = ballot_hash(self.object_id, self.manifest_hash, self.contests);
        if crypto_hash != *self.crypto_hash
            || ballot_code(self.ballot_code_seed, self.timestamp, &crypto_hash) != *self.ballot_code
        {
            debug!("ballot {} has inconsistent hashes", self.object_id);
            return false;
        }

        true
    }
}
