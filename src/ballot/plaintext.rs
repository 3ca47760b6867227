// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    manifest::{ContestDescriptionWithPlaceholders, InternalManifest},
    Error, Result,
};

/// A voter's mark on one selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaintextBallotSelection {
    pub object_id: String,
    /// Zero or one; anything larger is rejected.
    pub vote: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_placeholder: bool,
    /// Write-in text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_data: Option<String>,
}

impl PlaintextBallotSelection {
    pub fn new(object_id: impl Into<String>, vote: u64) -> Self {
        Self {
            object_id: object_id.into(),
            vote,
            is_placeholder: false,
            extended_data: None,
        }
    }

    pub fn with_extended_data(mut self, extended_data: impl Into<String>) -> Self {
        self.extended_data = Some(extended_data.into());
        self
    }

    pub fn is_valid(&self, expected_object_id: &str) -> bool {
        if self.object_id != expected_object_id {
            debug!(
                "selection {} does not match the expected selection {expected_object_id}",
                self.object_id
            );
            return false;
        }

        if self.vote > 1 {
            debug!("selection {} has a vote above one", self.object_id);
            return false;
        }

        true
    }
}

/// A voter's input for one contest, in either of the two shapes a client may submit it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaintextBallotContest {
    pub object_id: String,
    pub ballot_selections: Vec<PlaintextBallotSelection>,
}

/// The votes of a [`PlaintextBallotContest`], lined up with the real selections of its
/// description in manifest order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContestVotes<'a> {
    /// Some real selections were left out and are implicitly zero.
    Partial(Vec<Option<&'a PlaintextBallotSelection>>),
    /// Every real selection was listed.
    Complete(Vec<&'a PlaintextBallotSelection>),
}

impl<'a> ContestVotes<'a> {
    /// The listed selection (if any) behind each real selection.
    pub fn selections(&self) -> Vec<Option<&'a PlaintextBallotSelection>> {
        match self {
            ContestVotes::Partial(selections) => selections.clone(),
            ContestVotes::Complete(selections) => selections.iter().copied().map(Some).collect(),
        }
    }

    /// One vote per real selection, zero where nothing was listed.
    pub fn votes(&self) -> Vec<u64> {
        self.selections()
            .into_iter()
            .map(|selection| selection.map_or(0, |selection| selection.vote))
            .collect()
    }

    pub fn affirmative_count(&self) -> u64 {
        self.votes().into_iter().sum()
    }
}

impl PlaintextBallotContest {
    pub fn new(object_id: impl Into<String>, ballot_selections: Vec<PlaintextBallotSelection>) -> Self {
        Self {
            object_id: object_id.into(),
            ballot_selections,
        }
    }

    /// A contest the voter skipped entirely.
    pub fn empty(object_id: impl Into<String>) -> Self {
        Self::new(object_id, Vec::new())
    }

    /// Lines the listed selections up with `description`.
    ///
    /// Listed placeholders are accepted and ignored, since placeholder votes are always
    /// re-derived from the real ones. Unknown or repeated selections and votes above one are
    /// rejected.
    pub fn classify(
        &self,
        description: &ContestDescriptionWithPlaceholders,
    ) -> Result<ContestVotes<'_>> {
        let contest = &description.description;
        if self.object_id != contest.object_id {
            return Err(Error::InvalidArgument(format!(
                "contest {} does not match the expected contest {}",
                self.object_id, contest.object_id
            )));
        }

        let mut aligned: Vec<Option<&PlaintextBallotSelection>> =
            vec![None; contest.ballot_selections.len()];
        let mut seen = HashSet::new();

        for selection in &self.ballot_selections {
            if !seen.insert(selection.object_id.as_str()) {
                return Err(Error::InvalidArgument(format!(
                    "selection {} is listed twice in contest {}",
                    selection.object_id, self.object_id
                )));
            }

            if let Some(index) = contest
                .ballot_selections
                .iter()
                .position(|expected| expected.object_id == selection.object_id)
            {
                if !selection.is_valid(&contest.ballot_selections[index].object_id) {
                    return Err(Error::InvalidArgument(format!(
                        "selection {} of contest {} has an invalid vote",
                        selection.object_id, self.object_id
                    )));
                }
                aligned[index] = Some(selection);
            } else if !description
                .placeholder_selections
                .iter()
                .any(|placeholder| placeholder.object_id == selection.object_id)
            {
                return Err(Error::InvalidArgument(format!(
                    "contest {} has no selection {}",
                    self.object_id, selection.object_id
                )));
            }
        }

        if aligned.iter().all(Option::is_some) {
            Ok(ContestVotes::Complete(aligned.into_iter().flatten().collect()))
        } else {
            Ok(ContestVotes::Partial(aligned))
        }
    }

    /// Whether the contest is well formed for `description` and marks no more selections than
    /// the contest has seats.
    pub fn is_valid(&self, description: &ContestDescriptionWithPlaceholders) -> bool {
        let votes = match self.classify(description) {
            Ok(votes) => votes,
            Err(err) => {
                debug!("contest {} is invalid: {err}", self.object_id);
                return false;
            }
        };

        let contest = &description.description;
        let limit = u64::from(contest.number_elected.min(contest.votes_allowed));
        if votes.affirmative_count() > limit {
            debug!("contest {} is overvoted", self.object_id);
            return false;
        }

        true
    }
}

/// A voter's complete input, for the ballot style `style_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaintextBallot {
    pub object_id: String,
    pub style_id: String,
    pub contests: Vec<PlaintextBallotContest>,
}

impl PlaintextBallot {
    pub fn new(
        object_id: impl Into<String>,
        style_id: impl Into<String>,
        contests: Vec<PlaintextBallotContest>,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            style_id: style_id.into(),
            contests,
        }
    }

    pub fn contest(&self, object_id: &str) -> Option<&PlaintextBallotContest> {
        self.contests
            .iter()
            .find(|contest| contest.object_id == object_id)
    }

    /// Checks the ballot's structure against `manifest`: a known style, contests that belong
    /// to it at most once, and well-formed selections. Overvotes are left to the encryption,
    /// which may void them.
    pub fn validate(&self, manifest: &InternalManifest) -> Result<()> {
        if manifest.get_ballot_style(&self.style_id).is_none() {
            return Err(Error::InvalidArgument(format!(
                "ballot {} has unknown style {}",
                self.object_id, self.style_id
            )));
        }

        let descriptions = manifest.get_contests_for(&self.style_id);
        let mut seen = HashSet::new();

        for contest in &self.contests {
            if !seen.insert(contest.object_id.as_str()) {
                return Err(Error::InvalidArgument(format!(
                    "contest {} is listed twice in ballot {}",
                    contest.object_id, self.object_id
                )));
            }

            let description = descriptions
                .iter()
                .find(|description| description.description.object_id == contest.object_id)
                .ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "contest {} is not on style {} of ballot {}",
                        contest.object_id, self.style_id, self.object_id
                    ))
                })?;

            contest.classify(description)?;
        }

        Ok(())
    }

    /// Whether the ballot is well formed for `manifest` and free of overvotes.
    pub fn is_valid(&self, manifest: &InternalManifest) -> bool {
        if let Err(err) = self.validate(manifest) {
            debug!("ballot {} is invalid: {err}", self.object_id);
            return false;
        }

        manifest
            .get_contests_for(&self.style_id)
            .into_iter()
            .filter_map(|description| {
                self.contest(&description.description.object_id)
                    .map(|contest| (contest, description))
            })
            .all(|(contest, description)| contest.is_valid(description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{multi_contest_manifest, single_contest_manifest};
    use rand::seq::SliceRandom;
    use rstest::rstest;

    fn race() -> ContestDescriptionWithPlaceholders {
        InternalManifest::new(&single_contest_manifest()).unwrap().contests[0].clone()
    }

    #[test]
    fn classifies_partial_and_complete_contests() {
        let description = race();

        let partial = PlaintextBallotContest::new("race", vec![PlaintextBallotSelection::new("race-B", 1)]);
        let votes = partial.classify(&description).unwrap();
        assert!(matches!(votes, ContestVotes::Partial(_)));
        assert_eq!(votes.votes(), [0, 1]);

        let complete = PlaintextBallotContest::new(
            "race",
            vec![
                PlaintextBallotSelection::new("race-B", 0),
                PlaintextBallotSelection::new("race-A", 1),
                PlaintextBallotSelection {
                    is_placeholder: true,
                    ..PlaintextBallotSelection::new("race-2-placeholder", 0)
                },
            ],
        );
        let votes = complete.classify(&description).unwrap();
        assert!(matches!(votes, ContestVotes::Complete(_)));
        assert_eq!(votes.votes(), [1, 0]);
        assert_eq!(votes.affirmative_count(), 1);

        let skipped = PlaintextBallotContest::empty("race");
        let votes = skipped.classify(&description).unwrap();
        assert_eq!(votes.votes(), [0, 0]);
    }

    #[test]
    fn classification_ignores_listing_order() {
        let manifest = InternalManifest::new(&multi_contest_manifest()).unwrap();
        let council = manifest.get_contest("council").unwrap();
        let mut selections = vec![
            PlaintextBallotSelection::new("council-alice", 0),
            PlaintextBallotSelection::new("council-bob", 1),
            PlaintextBallotSelection::new("council-dave", 0),
            PlaintextBallotSelection::new("council-erin", 1),
        ];
        selections.shuffle(&mut rand::thread_rng());

        let contest = PlaintextBallotContest::new("council", selections);
        let votes = contest.classify(council).unwrap();

        assert!(matches!(votes, ContestVotes::Complete(_)));
        assert_eq!(votes.votes(), [0, 1, 0, 1]);
        assert!(contest.is_valid(council));
    }

    #[rstest]
    #[case::wrong_contest(PlaintextBallotContest::empty("another race"))]
    #[case::unknown_selection(PlaintextBallotContest::new("race", vec![PlaintextBallotSelection::new("race-C", 1)]))]
    #[case::repeated_selection(PlaintextBallotContest::new("race", vec![PlaintextBallotSelection::new("race-A", 1), PlaintextBallotSelection::new("race-A", 0)]))]
    #[case::vote_above_one(PlaintextBallotContest::new("race", vec![PlaintextBallotSelection::new("race-A", 2)]))]
    fn rejects_malformed_contests(#[case] contest: PlaintextBallotContest) {
        let description = race();

        assert!(matches!(
            contest.classify(&description),
            Err(Error::InvalidArgument(_))
        ));
        assert!(!contest.is_valid(&description));
    }

    #[test]
    fn overvotes_are_well_formed_but_invalid() {
        let description = race();
        let overvoted = PlaintextBallotContest::new(
            "race",
            vec![
                PlaintextBallotSelection::new("race-A", 1),
                PlaintextBallotSelection::new("race-B", 1),
            ],
        );

        assert!(overvoted.classify(&description).is_ok());
        assert!(!overvoted.is_valid(&description));
    }

    #[test]
    fn validates_ballots_against_their_style() {
        let manifest = InternalManifest::new(&multi_contest_manifest()).unwrap();

        let ballot = PlaintextBallot::new(
            "ballot",
            "city-style",
            vec![PlaintextBallotContest::new(
                "council",
                vec![
                    PlaintextBallotSelection::new("council-alice", 1),
                    PlaintextBallotSelection::new("council-erin", 1).with_extended_data("write-in"),
                ],
            )],
        );
        assert!(ballot.is_valid(&manifest));

        let off_style = PlaintextBallot::new(
            "ballot",
            "city-style",
            vec![PlaintextBallotContest::empty("referendum")],
        );
        assert!(off_style.validate(&manifest).is_err());

        let unknown_style = PlaintextBallot::new("ballot", "no-such-style", Vec::new());
        assert!(!unknown_style.is_valid(&manifest));

        let repeated = PlaintextBallot::new(
            "ballot",
            "city-style",
            vec![
                PlaintextBallotContest::empty("mayor"),
                PlaintextBallotContest::empty("mayor"),
            ],
        );
        assert!(repeated.validate(&manifest).is_err());
    }

    #[test]
    fn omits_default_fields_from_the_wire_form() {
        let json = serde_json::to_value(PlaintextBallotSelection::new("race-A", 1)).unwrap();

        assert_eq!(json, serde_json::json!({"object_id": "race-A", "vote": 1}));

        let parsed: PlaintextBallotSelection = serde_json::from_value(json).unwrap();
        assert!(!parsed.is_placeholder);
    }
}
