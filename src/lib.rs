// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Encryption of plaintext ballots under an election's joint ElGamal key, with the
//! zero-knowledge proofs that let anyone check each encrypted ballot is well formed without
//! learning its votes.

pub use ballot::{
    BallotBoxState, CiphertextBallot, CiphertextBallotContest, CiphertextBallotSelection,
    CompactCiphertextBallot, CompactPlaintextBallot, ContestVotes, PlaintextBallot,
    PlaintextBallotContest, PlaintextBallotSelection, SubmittedBallot,
};
pub use context::{CiphertextElectionContext, ContextConfiguration};
pub use encrypt::{
    encrypt_ballot, encrypt_compact_ballot, encrypt_contest, encrypt_selection,
    expand_compact_ciphertext_ballot, EncryptOptions,
};
pub use error::{Error, GroupKind, Result};
pub use mediator::{EncryptionDevice, EncryptionMediator};

pub mod ballot;
pub mod context;
pub mod elgamal;
pub mod encrypt;
mod error;
pub mod group;
pub mod hash;
pub mod manifest;
pub mod mediator;
mod multiexp;
pub mod precompute;
pub mod proofs;
pub mod serialization;

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{TimeZone, Utc};
    use rand_core::OsRng;

    use crate::{
        context::{CiphertextElectionContext, ContextConfiguration},
        elgamal::ElGamalKeyPair,
        group::ModQ,
        manifest::{
            BallotStyle, Candidate, ContestDescription, ElectionType, GeopoliticalUnit,
            InternalManifest, Manifest, Party, ReportingUnitType, SelectionDescription,
            VoteVariationType,
        },
    };

    fn unit(object_id: &str, unit_type: ReportingUnitType) -> GeopoliticalUnit {
        GeopoliticalUnit {
            object_id: object_id.to_string(),
            name: object_id.to_string(),
            unit_type,
            contact_information: None,
        }
    }

    fn party(object_id: &str) -> Party {
        Party {
            object_id: object_id.to_string(),
            name: Some(object_id.to_string()),
            abbreviation: None,
            color: None,
            logo_uri: None,
        }
    }

    fn candidate(object_id: &str, party_id: Option<&str>) -> Candidate {
        Candidate {
            object_id: object_id.to_string(),
            name: Some(object_id.to_string()),
            party_id: party_id.map(str::to_string),
            image_uri: None,
            is_write_in: false,
        }
    }

    fn contest(
        object_id: &str,
        sequence_order: u32,
        electoral_district_id: &str,
        number_elected: u32,
        candidate_ids: &[&str],
    ) -> ContestDescription {
        ContestDescription {
            object_id: object_id.to_string(),
            sequence_order,
            electoral_district_id: electoral_district_id.to_string(),
            vote_variation: if number_elected == 1 {
                VoteVariationType::OneOfM
            } else {
                VoteVariationType::NOfM
            },
            number_elected,
            votes_allowed: number_elected,
            name: object_id.to_string(),
            ballot_selections: candidate_ids
                .iter()
                .zip(0..)
                .map(|(candidate_id, sequence_order)| {
                    SelectionDescription::new(
                        &format!("{object_id}-{candidate_id}"),
                        sequence_order,
                        candidate_id,
                    )
                })
                .collect(),
            ballot_title: None,
            ballot_subtitle: None,
        }
    }

    fn style(object_id: &str, geopolitical_unit_ids: &[&str]) -> BallotStyle {
        BallotStyle {
            object_id: object_id.to_string(),
            geopolitical_unit_ids: geopolitical_unit_ids.iter().map(|id| id.to_string()).collect(),
            party_ids: Vec::new(),
            image_uri: None,
        }
    }

    fn manifest(
        election_scope_id: &str,
        geopolitical_units: Vec<GeopoliticalUnit>,
        candidates: Vec<Candidate>,
        contests: Vec<ContestDescription>,
        ballot_styles: Vec<BallotStyle>,
    ) -> Manifest {
        Manifest {
            election_scope_id: election_scope_id.to_string(),
            election_type: ElectionType::General,
            start_date: Utc.with_ymd_and_hms(2024, 11, 5, 7, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 11, 5, 20, 0, 0).unwrap(),
            geopolitical_units,
            parties: vec![party("whigs"), party("tories")],
            candidates,
            contests,
            ballot_styles,
            name: Some(election_scope_id.to_string()),
            contact_information: None,
        }
    }

    /// One district, one single-seat contest between selections `A` and `B`, one style.
    ///
    /// Selection object ids are `"{contest}-{candidate}"`, e.g. `race-A`.
    pub(crate) fn single_contest_manifest() -> Manifest {
        manifest(
            "single-contest",
            vec![unit("district", ReportingUnitType::County)],
            vec![candidate("A", Some("whigs")), candidate("B", Some("tories"))],
            vec![contest("race", 0, "district", 1, &["A", "B"])],
            vec![style("ballot-style", &["district"])],
        )
    }

    /// Three contests over two nested districts:
    /// `mayor` (city, one seat of three), `council` (city, two seats of four) and `referendum`
    /// (county, yes or no). `county-style` sees all three, `city-style` only the city races.
    pub(crate) fn multi_contest_manifest() -> Manifest {
        manifest(
            "multi-contest",
            vec![
                unit("city", ReportingUnitType::City),
                unit("county", ReportingUnitType::County),
            ],
            vec![
                candidate("alice", Some("whigs")),
                candidate("bob", Some("tories")),
                candidate("carol", None),
                candidate("dave", Some("whigs")),
                candidate("erin", None),
                candidate("yes", None),
                candidate("no", None),
            ],
            vec![
                contest("referendum", 2, "county", 1, &["yes", "no"]),
                contest("mayor", 0, "city", 1, &["alice", "bob", "carol"]),
                contest("council", 1, "city", 2, &["alice", "bob", "dave", "erin"]),
            ],
            vec![
                style("county-style", &["city", "county"]),
                style("city-style", &["city"]),
            ],
        )
    }

    /// A fresh key pair and a single-guardian context for `manifest`.
    pub(crate) fn context_for(
        manifest: &InternalManifest,
    ) -> (ElGamalKeyPair, CiphertextElectionContext) {
        context_with(manifest, ContextConfiguration::default())
    }

    pub(crate) fn context_with(
        manifest: &InternalManifest,
        configuration: ContextConfiguration,
    ) -> (ElGamalKeyPair, CiphertextElectionContext) {
        let key_pair = ElGamalKeyPair::random(&mut OsRng);
        let context = CiphertextElectionContext::make(
            1,
            1,
            *key_pair.public_key(),
            ModQ::from_u64(0x5eed),
            manifest.manifest_hash,
            configuration,
            None,
        )
        .unwrap();

        (key_pair, context)
    }
}
