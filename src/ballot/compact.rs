// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use serde::{Deserialize, Serialize};

use super::{CiphertextBallot, PlaintextBallot, PlaintextBallotContest, PlaintextBallotSelection};
use crate::{group::ModQ, manifest::InternalManifest, Error, Result};

/// A plaintext ballot reduced to one vote per real selection of its style, in manifest order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactPlaintextBallot {
    pub object_id: String,
    pub style_id: String,
    pub selections: Vec<u64>,
    /// Write-in text, keyed by index into `selections`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extended_data: Vec<(u32, String)>,
}

impl CompactPlaintextBallot {
    pub fn new(ballot: &PlaintextBallot, manifest: &InternalManifest) -> Result<Self> {
        ballot.validate(manifest)?;

        let mut selections = Vec::new();
        let mut extended_data = Vec::new();

        for description in manifest.get_contests_for(&ballot.style_id) {
            let skipped;
            let contest = match ballot.contest(&description.description.object_id) {
                Some(contest) => contest,
                None => {
                    skipped = PlaintextBallotContest::empty(description.description.object_id.as_str());
                    &skipped
                }
            };

            for selection in contest.classify(description)?.selections() {
                let index = u32::try_from(selections.len()).map_err(|_| {
                    Error::InvalidArgument(format!("ballot {} is too large", ballot.object_id))
                })?;

                if let Some(data) = selection.and_then(|selection| selection.extended_data.as_ref()) {
                    extended_data.push((index, data.clone()));
                }
                selections.push(selection.map_or(0, |selection| selection.vote));
            }
        }

        Ok(Self {
            object_id: ballot.object_id.clone(),
            style_id: ballot.style_id.clone(),
            selections,
            extended_data,
        })
    }
}

/// Rebuilds the plaintext ballot behind `compact`, listing every real selection of its style.
pub fn expand_compact_plaintext_ballot(
    compact: &CompactPlaintextBallot,
    manifest: &InternalManifest,
) -> Result<PlaintextBallot> {
    if manifest.get_ballot_style(&compact.style_id).is_none() {
        return Err(Error::InvalidArgument(format!(
            "compact ballot {} has unknown style {}",
            compact.object_id, compact.style_id
        )));
    }

    let descriptions = manifest.get_contests_for(&compact.style_id);
    let expected: usize = descriptions
        .iter()
        .map(|description| description.description.ballot_selections.len())
        .sum();
    if compact.selections.len() != expected {
        return Err(Error::InvalidArgument(format!(
            "compact ballot {} has {} selections where style {} has {expected}",
            compact.object_id,
            compact.selections.len(),
            compact.style_id
        )));
    }

    let mut votes = compact.selections.iter().zip(0u32..);
    let contests = descriptions
        .into_iter()
        .map(|description| {
            let ballot_selections = description
                .description
                .ballot_selections
                .iter()
                .zip(votes.by_ref())
                .map(|(selection, (vote, index))| PlaintextBallotSelection {
                    extended_data: compact
                        .extended_data
                        .iter()
                        .find(|(data_index, _)| *data_index == index)
                        .map(|(_, data)| data.clone()),
                    ..PlaintextBallotSelection::new(selection.object_id.as_str(), *vote)
                })
                .collect();

            PlaintextBallotContest::new(description.description.object_id.as_str(), ballot_selections)
        })
        .collect();

    Ok(PlaintextBallot::new(
        compact.object_id.as_str(),
        compact.style_id.as_str(),
        contests,
    ))
}

/// Everything needed to regenerate an encrypted ballot bit for bit: the compact plaintext and
/// the ballot nonce, seed and timestamp, plus the ballot code to check the regeneration against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactCiphertextBallot {
    pub compact_plaintext_ballot: CompactPlaintextBallot,
    pub timestamp: i64,
    pub ballot_code_seed: ModQ,
    pub nonce: ModQ,
    pub ballot_code: ModQ,
}

impl CompactCiphertextBallot {
    /// Pairs `compact_plaintext_ballot` with the encryption of the same ballot, which must
    /// still hold its nonce.
    pub fn new(
        compact_plaintext_ballot: CompactPlaintextBallot,
        ciphertext: &CiphertextBallot,
    ) -> Result<Self> {
        let nonce = ciphertext.nonce.ok_or_else(|| {
            Error::BadAccess(format!(
                "the nonce of ballot {} was already discarded",
                ciphertext.object_id
            ))
        })?;

        Ok(Self {
            compact_plaintext_ballot,
            timestamp: ciphertext.timestamp,
            ballot_code_seed: ciphertext.ballot_code_seed,
            nonce,
            ballot_code: ciphertext.ballot_code,
        })
    }

    pub fn object_id(&self) -> &str {
        &self.compact_plaintext_ballot.object_id
    }
}
