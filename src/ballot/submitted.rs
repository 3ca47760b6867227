// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{CiphertextBallot, CiphertextBallotContest};
use crate::{
    context::CiphertextElectionContext,
    group::ModQ,
    hash::CryptoHashable,
    manifest::InternalManifest,
    Error, Result,
};

/// What the ballot box decided about a submitted ballot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallotBoxState {
    /// Counted in the tally.
    Cast,
    /// Challenged by the voter; decrypted and published instead of counted.
    Spoiled,
    #[default]
    Unknown,
}

impl fmt::Display for BallotBoxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            BallotBoxState::Cast => "cast",
            BallotBoxState::Spoiled => "spoiled",
            BallotBoxState::Unknown => "unknown",
        };

        write!(f, "{state}")
    }
}

/// An encrypted ballot as the ballot box records it: every nonce gone, and a state that is
/// finalized at most once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedBallot {
    pub object_id: String,
    pub style_id: String,
    pub manifest_hash: ModQ,
    pub ballot_code_seed: ModQ,
    pub contests: Vec<CiphertextBallotContest>,
    pub ballot_code: ModQ,
    pub timestamp: i64,
    pub crypto_hash: ModQ,
    #[serde(default)]
    pub state: BallotBoxState,
}

impl SubmittedBallot {
    /// Strips (and zeroizes) every nonce of `ballot`.
    pub fn from_ciphertext(mut ballot: CiphertextBallot, state: BallotBoxState) -> Self {
        ballot.discard_nonces();

        let CiphertextBallot {
            object_id,
            style_id,
            manifest_hash,
            ballot_code_seed,
            contests,
            ballot_code,
            timestamp,
            crypto_hash,
            nonce: _,
        } = ballot;

        Self {
            object_id,
            style_id,
            manifest_hash,
            ballot_code_seed,
            contests,
            ballot_code,
            timestamp,
            crypto_hash,
            state,
        }
    }

    pub fn cast(&mut self) -> Result<()> {
        self.finalize(BallotBoxState::Cast)
    }

    pub fn spoil(&mut self) -> Result<()> {
        self.finalize(BallotBoxState::Spoiled)
    }

    fn finalize(&mut self, state: BallotBoxState) -> Result<()> {
        if self.state != BallotBoxState::Unknown {
            return Err(Error::AlreadyExists(format!(
                "a {} state for ballot {}",
                self.state, self.object_id
            )));
        }

        self.state = state;

        Ok(())
    }

    pub fn is_valid_encryption(
        &self,
        manifest: &InternalManifest,
        context: &CiphertextElectionContext,
    ) -> bool {
        super::ciphertext::BallotRecord {
            object_id: &self.object_id,
            style_id: &self.style_id,
            manifest_hash: &self.manifest_hash,
            ballot_code_seed: &self.ballot_code_seed,
            contests: &self.contests,
            ballot_code: &self.ballot_code,
            timestamp: self.timestamp,
            crypto_hash: &self.crypto_hash,
        }
        .is_valid_encryption(manifest, context)
    }
}

impl CryptoHashable for SubmittedBallot {
    fn crypto_hash(&self) -> ModQ {
        self.crypto_hash
    }
}
