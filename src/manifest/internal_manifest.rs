// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use serde::{Deserialize, Serialize};

use super::{BallotStyle, ContestDescription, GeopoliticalUnit, Manifest, SelectionDescription};
use crate::{group::ModQ, hash::CryptoHashable, Error, Result};

/// A contest together with the `number_elected` placeholder selections that pad every encrypted
/// contest up to its seat count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestDescriptionWithPlaceholders {
    pub description: ContestDescription,
    pub placeholder_selections: Vec<SelectionDescription>,
}

impl ContestDescriptionWithPlaceholders {
    /// Fails when the placeholder sequence orders would not fit in a `u32`.
    pub fn new(description: ContestDescription) -> Result<Self> {
        let out_of_range = || {
            Error::InvalidArgument(format!(
                "the placeholders of contest {} overflow its sequence orders",
                description.object_id
            ))
        };

        // Placeholders continue after the last real selection.
        let first = match description
            .ballot_selections
            .iter()
            .map(|selection| selection.sequence_order)
            .max()
        {
            Some(last) => last.checked_add(1).ok_or_else(out_of_range)?,
            None => 0,
        };
        let end = first
            .checked_add(description.number_elected)
            .ok_or_else(out_of_range)?;

        let placeholder_selections = (first..end)
            .map(|sequence_order| SelectionDescription::placeholder(&description, sequence_order))
            .collect();

        Ok(Self {
            description,
            placeholder_selections,
        })
    }

    /// Real selections in manifest order, followed by the placeholders.
    pub fn selections(&self) -> impl Iterator<Item = &SelectionDescription> {
        self.description
            .ballot_selections
            .iter()
            .chain(&self.placeholder_selections)
    }

    /// The real selection or placeholder with `object_id`.
    pub fn selection(&self, object_id: &str) -> Option<&SelectionDescription> {
        self.selections()
            .find(|selection| selection.object_id == object_id)
    }
}

impl CryptoHashable for ContestDescriptionWithPlaceholders {
    /// Placeholders are derived from the description, so the hash is the description's.
    fn crypto_hash(&self) -> ModQ {
        self.description.crypto_hash()
    }
}

/// The view of a [`Manifest`] the encryption pipeline works from: contests carry their
/// placeholders, and the manifest hash is captured once for binding ballots to the election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalManifest {
    pub manifest_hash: ModQ,
    pub geopolitical_units: Vec<GeopoliticalUnit>,
    pub contests: Vec<ContestDescriptionWithPlaceholders>,
    pub ballot_styles: Vec<BallotStyle>,
}

impl InternalManifest {
    /// Validates `manifest` and derives its placeholders.
    pub fn new(manifest: &Manifest) -> Result<Self> {
        manifest.validate()?;

        let mut contests = manifest
            .contests
            .iter()
            .cloned()
            .map(ContestDescriptionWithPlaceholders::new)
            .collect::<Result<Vec<_>>>()?;
        contests.sort_by_key(|contest| contest.description.sequence_order);

        Ok(Self {
            manifest_hash: manifest.crypto_hash(),
            geopolitical_units: manifest.geopolitical_units.clone(),
            contests,
            ballot_styles: manifest.ballot_styles.clone(),
        })
    }

    pub fn get_ballot_style(&self, style_id: &str) -> Option<&BallotStyle> {
        self.ballot_styles
            .iter()
            .find(|style| style.object_id == style_id)
    }

    /// The contests, in sequence order, whose electoral district belongs to the ballot style.
    /// Empty for an unknown style.
    pub fn get_contests_for(&self, style_id: &str) -> Vec<&ContestDescriptionWithPlaceholders> {
        let Some(style) = self.get_ballot_style(style_id) else {
            return Vec::new();
        };

        self.contests
            .iter()
            .filter(|contest| {
                style
                    .geopolitical_unit_ids
                    .contains(&contest.description.electoral_district_id)
            })
            .collect()
    }

    pub fn get_contest(&self, object_id: &str) -> Option<&ContestDescriptionWithPlaceholders> {
        self.contests
            .iter()
            .find(|contest| contest.description.object_id == object_id)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::tests::{multi_contest_manifest, single_contest_manifest};

    #[test]
    fn appends_number_elected_placeholders() {
        let manifest = multi_contest_manifest();
        let internal_manifest = InternalManifest::new(&manifest).unwrap();

        for contest in &internal_manifest.contests {
            let description = &contest.description;
            assert_eq!(
                contest.placeholder_selections.len(),
                description.number_elected as usize
            );
            assert_eq!(
                contest.selections().count(),
                description.ballot_selections.len() + description.number_elected as usize
            );

            let last_real = description
                .ballot_selections
                .iter()
                .map(|selection| selection.sequence_order)
                .max()
                .unwrap();
            for (offset, placeholder) in contest.placeholder_selections.iter().enumerate() {
                assert!(placeholder.is_placeholder);
                assert_eq!(placeholder.sequence_order, last_real + 1 + offset as u32);
                assert_eq!(
                    contest.selection(&placeholder.object_id),
                    Some(placeholder)
                );
            }
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let manifest = single_contest_manifest();

        let first = InternalManifest::new(&manifest).unwrap();
        let second = InternalManifest::new(&manifest).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.manifest_hash, manifest.crypto_hash());
        assert_eq!(first.contests[0].placeholder_selections.len(), 1);
        assert_eq!(first.contests[0].selections().count(), 3);
    }

    #[test]
    fn resolves_contests_by_ballot_style() {
        let internal_manifest = InternalManifest::new(&multi_contest_manifest()).unwrap();

        let county: Vec<&str> = internal_manifest
            .get_contests_for("county-style")
            .into_iter()
            .map(|contest| contest.description.object_id.as_str())
            .collect();
        assert_eq!(county, ["mayor", "council", "referendum"]);

        let city: Vec<&str> = internal_manifest
            .get_contests_for("city-style")
            .into_iter()
            .map(|contest| contest.description.object_id.as_str())
            .collect();
        assert_eq!(city, ["mayor", "council"]);

        assert!(internal_manifest.get_contests_for("no-such-style").is_empty());
        assert!(internal_manifest.get_ballot_style("city-style").is_some());
        assert!(internal_manifest.get_contest("referendum").is_some());
    }

    #[rstest]
    #[case::last_selection(u32::MAX)]
    #[case::placeholder_range(u32::MAX - 1)]
    fn rejects_placeholders_past_the_last_sequence_order(#[case] sequence_order: u32) {
        let mut manifest = single_contest_manifest();
        manifest.contests[0].ballot_selections[1].sequence_order = sequence_order;

        assert!(manifest.is_valid());
        assert!(matches!(
            InternalManifest::new(&manifest),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_an_invalid_manifest() {
        let mut manifest = multi_contest_manifest();
        manifest.contests[1].electoral_district_id = "nowhere".to_string();

        assert!(matches!(
            InternalManifest::new(&manifest),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn placeholders_do_not_change_the_contest_hash() {
        let manifest = single_contest_manifest();
        let internal_manifest = InternalManifest::new(&manifest).unwrap();

        assert_eq!(
            internal_manifest.contests[0].crypto_hash(),
            manifest.contests[0].crypto_hash()
        );
    }
}
