// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! The static structure of an election.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    group::ModQ,
    hash::{hash_elems, CryptoHashable, HashElement},
    Error, Result,
};

pub use entities::{
    BallotStyle, Candidate, ContactInformation, ContestDescription, GeopoliticalUnit, Party,
    ReportingUnitType, SelectionDescription, VoteVariationType,
};
pub use internal_manifest::{ContestDescriptionWithPlaceholders, InternalManifest};

mod entities;
mod internal_manifest;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionType {
    #[default]
    Unknown,
    General,
    PartisanPrimaryClosed,
    PartisanPrimaryOpen,
    Primary,
    Runoff,
    Special,
    Other,
}

impl ElectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElectionType::Unknown => "unknown",
            ElectionType::General => "general",
            ElectionType::PartisanPrimaryClosed => "partisan_primary_closed",
            ElectionType::PartisanPrimaryOpen => "partisan_primary_open",
            ElectionType::Primary => "primary",
            ElectionType::Runoff => "runoff",
            ElectionType::Special => "special",
            ElectionType::Other => "other",
        }
    }
}

impl HashElement for ElectionType {
    fn hash_text(&self) -> String {
        self.as_str().to_string()
    }
}

/// The election manifest: every unit, party, candidate, contest and ballot style of an election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub election_scope_id: String,
    #[serde(rename = "type")]
    pub election_type: ElectionType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub geopolitical_units: Vec<GeopoliticalUnit>,
    pub parties: Vec<Party>,
    pub candidates: Vec<Candidate>,
    pub contests: Vec<ContestDescription>,
    pub ballot_styles: Vec<BallotStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_information: Option<ContactInformation>,
}

impl Manifest {
    /// Whether the manifest is internally consistent; see [`Self::validate`] for the reason when
    /// it is not.
    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(err) => {
                debug!("manifest {} is invalid: {err}", self.election_scope_id);
                false
            }
        }
    }

    /// Checks that object ids are unique, that every reference resolves, and that each contest's
    /// seat and vote counts are coherent.
    pub fn validate(&self) -> Result<()> {
        let unit_ids = unique_ids("geopolitical unit", self.geopolitical_units.iter().map(|unit| &unit.object_id))?;
        let party_ids = unique_ids("party", self.parties.iter().map(|party| &party.object_id))?;
        let candidate_ids = unique_ids(
            "candidate",
            self.candidates.iter().map(|candidate| &candidate.object_id),
        )?;
        unique_ids("contest", self.contests.iter().map(|contest| &contest.object_id))?;
        unique_ids("ballot style", self.ballot_styles.iter().map(|style| &style.object_id))?;

        for style in &self.ballot_styles {
            references(&unit_ids, &style.geopolitical_unit_ids, "ballot style", &style.object_id)?;
            references(&party_ids, &style.party_ids, "ballot style", &style.object_id)?;
        }

        for candidate in &self.candidates {
            if let Some(party_id) = &candidate.party_id {
                references(&party_ids, [party_id], "candidate", &candidate.object_id)?;
            }
        }

        let mut contest_sequence_orders = HashSet::new();
        for contest in &self.contests {
            if !contest_sequence_orders.insert(contest.sequence_order) {
                return Err(Error::InvalidArgument(format!(
                    "sequence order {} is used by more than one contest",
                    contest.sequence_order
                )));
            }

            references(
                &unit_ids,
                [&contest.electoral_district_id],
                "contest",
                &contest.object_id,
            )?;
            validate_contest(contest, &candidate_ids)?;
        }

        Ok(())
    }
}

fn validate_contest(contest: &ContestDescription, candidate_ids: &HashSet<&str>) -> Result<()> {
    if contest.votes_allowed < contest.number_elected {
        return Err(Error::InvalidArgument(format!(
            "contest {} allows {} votes for {} seats",
            contest.object_id, contest.votes_allowed, contest.number_elected
        )));
    }

    if contest.number_elected as usize > contest.ballot_selections.len() {
        return Err(Error::InvalidArgument(format!(
            "contest {} elects {} out of {} selections",
            contest.object_id,
            contest.number_elected,
            contest.ballot_selections.len()
        )));
    }

    unique_ids(
        "selection",
        contest
            .ballot_selections
            .iter()
            .map(|selection| &selection.object_id),
    )?;
    unique_ids(
        "selection candidate",
        contest
            .ballot_selections
            .iter()
            .map(|selection| &selection.candidate_id),
    )?;

    let mut sequence_orders = HashSet::new();
    for selection in &contest.ballot_selections {
        if !sequence_orders.insert(selection.sequence_order) {
            return Err(Error::InvalidArgument(format!(
                "sequence order {} is used by more than one selection of contest {}",
                selection.sequence_order, contest.object_id
            )));
        }
        if selection.is_placeholder {
            return Err(Error::InvalidArgument(format!(
                "contest {} lists placeholder selection {}",
                contest.object_id, selection.object_id
            )));
        }
    }

    references(
        candidate_ids,
        contest
            .ballot_selections
            .iter()
            .map(|selection| &selection.candidate_id),
        "contest",
        &contest.object_id,
    )
}

fn unique_ids<'a>(
    kind: &str,
    ids: impl IntoIterator<Item = &'a String>,
) -> Result<HashSet<&'a str>> {
    let mut seen = HashSet::new();

    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(Error::InvalidArgument(format!(
                "{kind} object id {id} is not unique"
            )));
        }
    }

    Ok(seen)
}

fn references<'a>(
    known: &HashSet<&str>,
    ids: impl IntoIterator<Item = &'a String>,
    referrer_kind: &str,
    referrer: &str,
) -> Result<()> {
    for id in ids {
        if !known.contains(id.as_str()) {
            return Err(Error::InvalidArgument(format!(
                "{referrer_kind} {referrer} references unknown object {id}"
            )));
        }
    }

    Ok(())
}

impl CryptoHashable for Manifest {
    fn crypto_hash(&self) -> ModQ {
        hash_elems(&[
            &self.election_scope_id,
            &self.election_type,
            &self.start_date.to_rfc3339_opts(SecondsFormat::Secs, true),
            &self.end_date.to_rfc3339_opts(SecondsFormat::Secs, true),
            &self.name,
            &self.contact_information,
            &self.geopolitical_units,
            &self.parties,
            &self.candidates,
            &self.contests,
            &self.ballot_styles,
        ])
    }
}
