// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::time::Duration;

use ballotcrypt::{
    elgamal::{elgamal_encrypt, ElGamalKeyPair},
    encrypt_ballot,
    group::rand_q,
    manifest::{
        BallotStyle, Candidate, ContestDescription, ElectionType, GeopoliticalUnit,
        InternalManifest, Manifest, ReportingUnitType, SelectionDescription, VoteVariationType,
    },
    precompute::{PrecomputeBufferPool, PrecomputeConfig},
    proofs::{ConstantChaumPedersenProof, DisjunctiveChaumPedersenProof},
    CiphertextElectionContext, ContextConfiguration, EncryptOptions, PlaintextBallot,
    PlaintextBallotContest, PlaintextBallotSelection,
};
use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand_core::OsRng;

fn manifest() -> Manifest {
    let candidates = ["alice", "bob", "carol"];

    Manifest {
        election_scope_id: "bench".to_string(),
        election_type: ElectionType::General,
        start_date: Utc.with_ymd_and_hms(2024, 11, 5, 7, 0, 0).unwrap(),
        end_date: Utc.with_ymd_and_hms(2024, 11, 5, 20, 0, 0).unwrap(),
        geopolitical_units: vec![GeopoliticalUnit {
            object_id: "district".to_string(),
            name: "district".to_string(),
            unit_type: ReportingUnitType::County,
            contact_information: None,
        }],
        parties: Vec::new(),
        candidates: candidates
            .iter()
            .map(|candidate| Candidate {
                object_id: candidate.to_string(),
                name: None,
                party_id: None,
                image_uri: None,
                is_write_in: false,
            })
            .collect(),
        contests: vec![ContestDescription {
            object_id: "race".to_string(),
            sequence_order: 0,
            electoral_district_id: "district".to_string(),
            vote_variation: VoteVariationType::NOfM,
            number_elected: 2,
            votes_allowed: 2,
            name: "race".to_string(),
            ballot_selections: candidates
                .iter()
                .zip(0..)
                .map(|(candidate, sequence_order)| {
                    SelectionDescription::new(candidate, sequence_order, candidate)
                })
                .collect(),
            ballot_title: None,
            ballot_subtitle: None,
        }],
        ballot_styles: vec![BallotStyle {
            object_id: "style".to_string(),
            geopolitical_unit_ids: vec!["district".to_string()],
            party_ids: Vec::new(),
            image_uri: None,
        }],
        name: None,
        contact_information: None,
    }
}

pub fn proof_benches(c: &mut Criterion) {
    let mut g = c.benchmark_group("proof benches");
    let key_pair = ElGamalKeyPair::random(&mut OsRng);
    let public_key = *key_pair.public_key();
    let extended_base_hash = rand_q();

    g.bench_function("disjunctive chaum-pedersen make()", |bench| {
        bench.iter_batched(
            || {
                let nonce = rand_q();
                (elgamal_encrypt(1, &nonce, &public_key).unwrap(), nonce, rand_q())
            },
            |(ciphertext, nonce, seed)| {
                DisjunctiveChaumPedersenProof::make(
                    &ciphertext,
                    &nonce,
                    1,
                    &public_key,
                    &extended_base_hash,
                    &seed,
                )
            },
            BatchSize::SmallInput,
        );
    });

    g.bench_function("disjunctive chaum-pedersen is_valid()", |bench| {
        bench.iter_batched(
            || {
                let nonce = rand_q();
                let ciphertext = elgamal_encrypt(0, &nonce, &public_key).unwrap();
                let proof = DisjunctiveChaumPedersenProof::make(
                    &ciphertext,
                    &nonce,
                    0,
                    &public_key,
                    &extended_base_hash,
                    &rand_q(),
                )
                .unwrap();

                (ciphertext, proof)
            },
            |(ciphertext, proof)| proof.is_valid(&ciphertext, &public_key, &extended_base_hash),
            BatchSize::SmallInput,
        );
    });

    g.bench_function("constant chaum-pedersen make()", |bench| {
        bench.iter_batched(
            || {
                let nonce = rand_q();
                (elgamal_encrypt(2, &nonce, &public_key).unwrap(), nonce, rand_q())
            },
            |(ciphertext, nonce, seed)| {
                ConstantChaumPedersenProof::make(
                    &ciphertext,
                    &nonce,
                    2,
                    &public_key,
                    &extended_base_hash,
                    &seed,
                )
            },
            BatchSize::SmallInput,
        );
    });

    g.finish();
}

pub fn encryption_benches(c: &mut Criterion) {
    let mut g = c.benchmark_group("ballot encryption benches");
    let manifest = InternalManifest::new(&manifest()).unwrap();
    let key_pair = ElGamalKeyPair::random(&mut OsRng);
    let context = CiphertextElectionContext::make(
        1,
        1,
        *key_pair.public_key(),
        rand_q(),
        manifest.manifest_hash,
        ContextConfiguration::default(),
        None,
    )
    .unwrap();
    let ballot = PlaintextBallot::new(
        "ballot",
        "style",
        vec![PlaintextBallotContest::new(
            "race",
            vec![PlaintextBallotSelection::new("bob", 1)],
        )],
    );
    let options = EncryptOptions {
        should_verify_proofs: false,
        ..EncryptOptions::default()
    };

    g.bench_function("encrypt_ballot()", |bench| {
        bench.iter_batched(
            rand_q,
            |seed| encrypt_ballot(&ballot, &manifest, &context, &seed, options),
            BatchSize::SmallInput,
        );
    });

    // A two-seat contest of three candidates takes 16 triples per ballot.
    let pool = PrecomputeBufferPool::new(PrecomputeConfig::default());
    g.bench_function("encrypt_ballot() with precompute", |bench| {
        bench.iter_batched(
            || {
                pool.start(key_pair.public_key(), Some(16)).unwrap();
                pool.subscribe().recv().unwrap();
                rand_q()
            },
            |seed| {
                encrypt_ballot(
                    &ballot,
                    &manifest,
                    &context,
                    &seed,
                    EncryptOptions {
                        precompute: Some(&pool),
                        ..options
                    },
                )
            },
            BatchSize::SmallInput,
        );
    });

    g.finish();
}

criterion_group! {
  name = benches;
  config = Criterion::default().measurement_time(Duration::from_secs(10));
  targets = proof_benches, encryption_benches
}

criterion_main!(benches);
