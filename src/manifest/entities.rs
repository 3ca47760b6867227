// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use serde::{Deserialize, Serialize};

use crate::{
    group::ModQ,
    hash::{hash_elems, hash_element_by_crypto_hash, CryptoHashable, HashElement},
};

/// The kind of jurisdiction a [`GeopoliticalUnit`] represents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingUnitType {
    #[default]
    Unknown,
    BallotBatch,
    BallotStyleArea,
    Borough,
    City,
    CityCouncil,
    CombinedPrecinct,
    Congressional,
    Country,
    County,
    CountyCouncil,
    DropBox,
    Judicial,
    Municipality,
    PollingPlace,
    Precinct,
    School,
    Special,
    SplitPrecinct,
    State,
    StateHouse,
    StateSenate,
    Township,
    Utility,
    Village,
    VoteCenter,
    Ward,
    Water,
    Other,
}

impl ReportingUnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportingUnitType::Unknown => "unknown",
            ReportingUnitType::BallotBatch => "ballot_batch",
            ReportingUnitType::BallotStyleArea => "ballot_style_area",
            ReportingUnitType::Borough => "borough",
            ReportingUnitType::City => "city",
            ReportingUnitType::CityCouncil => "city_council",
            ReportingUnitType::CombinedPrecinct => "combined_precinct",
            ReportingUnitType::Congressional => "congressional",
            ReportingUnitType::Country => "country",
            ReportingUnitType::County => "county",
            ReportingUnitType::CountyCouncil => "county_council",
            ReportingUnitType::DropBox => "drop_box",
            ReportingUnitType::Judicial => "judicial",
            ReportingUnitType::Municipality => "municipality",
            ReportingUnitType::PollingPlace => "polling_place",
            ReportingUnitType::Precinct => "precinct",
            ReportingUnitType::School => "school",
            ReportingUnitType::Special => "special",
            ReportingUnitType::SplitPrecinct => "split_precinct",
            ReportingUnitType::State => "state",
            ReportingUnitType::StateHouse => "state_house",
            ReportingUnitType::StateSenate => "state_senate",
            ReportingUnitType::Township => "township",
            ReportingUnitType::Utility => "utility",
            ReportingUnitType::Village => "village",
            ReportingUnitType::VoteCenter => "vote_center",
            ReportingUnitType::Ward => "ward",
            ReportingUnitType::Water => "water",
            ReportingUnitType::Other => "other",
        }
    }
}

/// How votes in a contest are counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteVariationType {
    #[default]
    Unknown,
    OneOfM,
    Approval,
    Borda,
    Cumulative,
    Majority,
    NOfM,
    Plurality,
    Proportional,
    Range,
    Rcv,
    SuperMajority,
    Other,
}

impl VoteVariationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteVariationType::Unknown => "unknown",
            VoteVariationType::OneOfM => "one_of_m",
            VoteVariationType::Approval => "approval",
            VoteVariationType::Borda => "borda",
            VoteVariationType::Cumulative => "cumulative",
            VoteVariationType::Majority => "majority",
            VoteVariationType::NOfM => "n_of_m",
            VoteVariationType::Plurality => "plurality",
            VoteVariationType::Proportional => "proportional",
            VoteVariationType::Range => "range",
            VoteVariationType::Rcv => "rcv",
            VoteVariationType::SuperMajority => "super_majority",
            VoteVariationType::Other => "other",
        }
    }
}

impl HashElement for ReportingUnitType {
    fn hash_text(&self) -> String {
        self.as_str().to_string()
    }
}

impl HashElement for VoteVariationType {
    fn hash_text(&self) -> String {
        self.as_str().to_string()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInformation {
    pub address_line: Vec<String>,
    pub email: Vec<String>,
    pub phone: Vec<String>,
    pub name: Option<String>,
}

impl CryptoHashable for ContactInformation {
    fn crypto_hash(&self) -> ModQ {
        hash_elems(&[&self.name, &self.address_line, &self.email, &self.phone])
    }
}

/// A physical or political jurisdiction, referenced by contests as their electoral district.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeopoliticalUnit {
    pub object_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub unit_type: ReportingUnitType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_information: Option<ContactInformation>,
}

impl CryptoHashable for GeopoliticalUnit {
    fn crypto_hash(&self) -> ModQ {
        hash_elems(&[
            &self.object_id,
            &self.name,
            &self.unit_type,
            &self.contact_information,
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

impl CryptoHashable for Party {
    fn crypto_hash(&self) -> ModQ {
        hash_elems(&[
            &self.object_id,
            &self.name,
            &self.abbreviation,
            &self.color,
            &self.logo_uri,
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(default)]
    pub is_write_in: bool,
}

impl CryptoHashable for Candidate {
    fn crypto_hash(&self) -> ModQ {
        hash_elems(&[
            &self.object_id,
            &self.name,
            &self.party_id,
            &self.image_uri,
            &self.is_write_in,
        ])
    }
}

/// The set of contests a voter in the listed geopolitical units is entitled to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotStyle {
    pub object_id: String,
    #[serde(default)]
    pub geopolitical_unit_ids: Vec<String>,
    #[serde(default)]
    pub party_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
}

impl CryptoHashable for BallotStyle {
    fn crypto_hash(&self) -> ModQ {
        hash_elems(&[
            &self.object_id,
            &self.geopolitical_unit_ids,
            &self.party_ids,
            &self.image_uri,
        ])
    }
}

/// One option of a contest, pointing at a candidate (or, for placeholders, a synthetic one).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionDescription {
    pub object_id: String,
    pub sequence_order: u32,
    pub candidate_id: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_placeholder: bool,
}

impl SelectionDescription {
    pub fn new(object_id: &str, sequence_order: u32, candidate_id: &str) -> Self {
        Self {
            object_id: object_id.to_string(),
            sequence_order,
            candidate_id: candidate_id.to_string(),
            is_placeholder: false,
        }
    }

    /// A placeholder of `contest` at `sequence_order`.
    pub(crate) fn placeholder(contest: &ContestDescription, sequence_order: u32) -> Self {
        Self {
            object_id: format!("{}-{}-placeholder", contest.object_id, sequence_order),
            sequence_order,
            candidate_id: format!("{}-{}-candidate", contest.object_id, sequence_order),
            is_placeholder: true,
        }
    }
}

impl CryptoHashable for SelectionDescription {
    fn crypto_hash(&self) -> ModQ {
        hash_elems(&[&self.object_id, &self.sequence_order, &self.candidate_id])
    }
}

/// A single race on the ballot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestDescription {
    pub object_id: String,
    pub sequence_order: u32,
    pub electoral_district_id: String,
    pub vote_variation: VoteVariationType,
    /// The number of seats, which is also the number of placeholders the contest receives.
    pub number_elected: u32,
    /// The most selections a voter may mark; never below `number_elected`.
    pub votes_allowed: u32,
    pub name: String,
    pub ballot_selections: Vec<SelectionDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballot_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballot_subtitle: Option<String>,
}

impl CryptoHashable for ContestDescription {
    fn crypto_hash(&self) -> ModQ {
        hash_elems(&[
            &self.object_id,
            &self.sequence_order,
            &self.electoral_district_id,
            &self.vote_variation,
            &self.ballot_title,
            &self.ballot_subtitle,
            &self.name,
            &self.number_elected,
            &self.votes_allowed,
            &self.ballot_selections,
        ])
    }
}

hash_element_by_crypto_hash!(
    ContactInformation,
    GeopoliticalUnit,
    Party,
    Candidate,
    BallotStyle,
    SelectionDescription,
    ContestDescription,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_hash_and_serialize_by_the_same_name() {
        for (variation, name) in [
            (VoteVariationType::OneOfM, "one_of_m"),
            (VoteVariationType::NOfM, "n_of_m"),
            (VoteVariationType::SuperMajority, "super_majority"),
        ] {
            assert_eq!(variation.as_str(), name);
            assert_eq!(
                serde_json::to_string(&variation).unwrap(),
                format!("\"{name}\"")
            );
        }

        assert_eq!(
            serde_json::to_string(&ReportingUnitType::PollingPlace).unwrap(),
            format!("\"{}\"", ReportingUnitType::PollingPlace.as_str())
        );
    }

    #[test]
    fn selection_hash_covers_every_field() {
        let selection = SelectionDescription::new("selection", 1, "candidate");

        let mut reordered = selection.clone();
        reordered.sequence_order = 2;
        let mut other_candidate = selection.clone();
        other_candidate.candidate_id = "other".to_string();

        assert_eq!(
            selection.crypto_hash(),
            SelectionDescription::new("selection", 1, "candidate").crypto_hash()
        );
        assert_ne!(selection.crypto_hash(), reordered.crypto_hash());
        assert_ne!(selection.crypto_hash(), other_candidate.crypto_hash());
    }

    #[test]
    fn optional_fields_are_omitted_and_defaulted() {
        let candidate: Candidate = serde_json::from_str(r#"{"object_id": "c"}"#).unwrap();

        assert_eq!(candidate.name, None);
        assert!(!candidate.is_write_in);
        assert_eq!(
            serde_json::to_string(&candidate).unwrap(),
            r#"{"object_id":"c","is_write_in":false}"#
        );

        let selection: SelectionDescription =
            serde_json::from_str(r#"{"object_id": "s", "sequence_order": 0, "candidate_id": "c"}"#)
                .unwrap();
        assert!(!selection.is_placeholder);
        assert!(!serde_json::to_string(&selection)
            .unwrap()
            .contains("is_placeholder"));
    }
}
