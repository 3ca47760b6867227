// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! The encryption pipeline: selections into contests into ballots.
//!
//! Every nonce of a ballot derives from one ballot nonce. The contest nonce is
//! $H(H(H_C, seed), i_C)$ for the ballot's nonce seed and the contest's description hash and
//! sequence order, and selection nonces derive from their contest's nonce the same way. Proof
//! commitments derive from index zero of the same sequences, so a ballot nonce (with the
//! timestamp and ballot code seed) reproduces the whole ballot.

use chrono::Utc;
use log::{debug, error};
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::{
    ballot::{
        expand_compact_plaintext_ballot, CiphertextBallot, CiphertextBallotContest,
        CiphertextBallotSelection, CompactCiphertextBallot, CompactPlaintextBallot,
        PlaintextBallot, PlaintextBallotContest, PlaintextBallotSelection,
    },
    context::{CiphertextElectionContext, ContextConfiguration},
    elgamal::{elgamal_add, elgamal_encrypt, ElGamalCiphertext},
    group::{rand_q, ModP, ModQ},
    hash::{CryptoHashable, Nonces},
    manifest::{ContestDescriptionWithPlaceholders, InternalManifest, SelectionDescription},
    precompute::{PrecomputeBufferPool, PrecomputedTriple},
    proofs::{ConstantChaumPedersenProof, DisjunctiveChaumPedersenProof},
    Error, Result,
};

/// How [`encrypt_ballot`] obtains its randomness and whether it checks its own output.
#[derive(Clone, Copy)]
pub struct EncryptOptions<'a> {
    /// The ballot nonce; random when absent.
    pub nonce: Option<ModQ>,
    /// Seconds since the unix epoch; the current time when absent.
    pub timestamp: Option<i64>,
    /// Re-verify every proof and hash of the result before returning it.
    pub should_verify_proofs: bool,
    /// Precomputed exponentiations to draw from. Only consulted when `nonce` is absent, since
    /// a ballot built from pooled exponents cannot be regenerated from its nonce.
    pub precompute: Option<&'a PrecomputeBufferPool>,
}

impl Default for EncryptOptions<'_> {
    fn default() -> Self {
        Self {
            nonce: None,
            timestamp: None,
            should_verify_proofs: true,
            precompute: None,
        }
    }
}

/// Where the exponentiations of an encryption come from.
#[derive(Clone, Copy)]
enum Randomness<'a> {
    /// Derived from the ballot nonce.
    Derived,
    /// Drawn from a pool, and computed on the spot once it runs dry.
    Precomputed(&'a PrecomputeBufferPool),
}

fn pooled_triple(pool: &PrecomputeBufferPool, public_key: &ModP) -> PrecomputedTriple {
    pool.take_triple(public_key)
        .unwrap_or_else(|| PrecomputedTriple::generate(public_key, &mut OsRng))
}

/// Encrypts one selection with a nonce derived from `nonce_seed`, proving it encrypts zero or
/// one.
pub fn encrypt_selection(
    selection: &PlaintextBallotSelection,
    description: &SelectionDescription,
    public_key: &ModP,
    extended_base_hash: &ModQ,
    nonce_seed: &ModQ,
    should_verify_proofs: bool,
) -> Result<CiphertextBallotSelection> {
    if !selection.is_valid(&description.object_id) {
        return Err(Error::InvalidArgument(format!(
            "selection {} cannot be encrypted for {}",
            selection.object_id, description.object_id
        )));
    }

    let encrypted = encrypt_vote(
        selection.vote,
        description,
        public_key,
        extended_base_hash,
        nonce_seed,
        Randomness::Derived,
    )?;

    if should_verify_proofs
        && !encrypted.is_valid_encryption(description, public_key, extended_base_hash)
    {
        error!("selection {} failed to verify after encryption", encrypted.object_id);
        return Err(Error::InternalError);
    }

    Ok(encrypted)
}

fn encrypt_vote(
    vote: u64,
    description: &SelectionDescription,
    public_key: &ModP,
    extended_base_hash: &ModQ,
    nonce_seed: &ModQ,
    randomness: Randomness<'_>,
) -> Result<CiphertextBallotSelection> {
    let (ciphertext, nonce, proof) = match randomness {
        Randomness::Derived => {
            let nonces = Nonces::new(&description.crypto_hash(), &[nonce_seed]);
            let nonce = Zeroizing::new(nonces.get(u64::from(description.sequence_order)));
            let proof_seed = Zeroizing::new(nonces.get(0));

            let ciphertext = elgamal_encrypt(vote, &nonce, public_key)?;
            let proof = DisjunctiveChaumPedersenProof::make(
                &ciphertext,
                &nonce,
                vote,
                public_key,
                extended_base_hash,
                &proof_seed,
            )?;

            (ciphertext, *nonce, proof)
        }
        Randomness::Precomputed(pool) => {
            let encryption = pooled_triple(pool, public_key);
            let nonce = Zeroizing::new(*encryption.exponent());

            let ciphertext = ElGamalCiphertext::encrypt_precomputed(vote, &encryption);
            let proof = DisjunctiveChaumPedersenProof::make_with(
                &ciphertext,
                &nonce,
                vote,
                extended_base_hash,
                pooled_triple(pool, public_key),
                pooled_triple(pool, public_key),
                rand_q(),
            )?;

            (ciphertext, *nonce, proof)
        }
    };

    Ok(CiphertextBallotSelection::new(
        description,
        ciphertext,
        nonce,
        proof,
    ))
}

/// Encrypts one contest, padding it with placeholders so that it always sums to its seat
/// count.
///
/// Real selections the voter left out encrypt zero. An overvoted contest is rejected unless
/// `configuration` allows overvotes, in which case every real selection encrypts zero.
#[allow(clippy::too_many_arguments)]
pub fn encrypt_contest(
    contest: &PlaintextBallotContest,
    description: &ContestDescriptionWithPlaceholders,
    public_key: &ModP,
    extended_base_hash: &ModQ,
    nonce_seed: &ModQ,
    configuration: &ContextConfiguration,
    should_verify_proofs: bool,
) -> Result<CiphertextBallotContest> {
    let encrypted = encrypt_contest_with(
        contest,
        description,
        public_key,
        extended_base_hash,
        nonce_seed,
        configuration,
        Randomness::Derived,
    )?;

    if should_verify_proofs
        && !encrypted.is_valid_encryption(description, public_key, extended_base_hash)
    {
        error!("contest {} failed to verify after encryption", encrypted.object_id);
        return Err(Error::InternalError);
    }

    Ok(encrypted)
}

fn encrypt_contest_with(
    contest: &PlaintextBallotContest,
    description: &ContestDescriptionWithPlaceholders,
    public_key: &ModP,
    extended_base_hash: &ModQ,
    nonce_seed: &ModQ,
    configuration: &ContextConfiguration,
    randomness: Randomness<'_>,
) -> Result<CiphertextBallotContest> {
    let number_elected = u64::from(description.description.number_elected);

    let mut votes = contest.classify(description)?.votes();
    let affirmative: u64 = votes.iter().sum();
    if affirmative > number_elected {
        if !configuration.allow_overvotes {
            debug!("rejecting overvoted contest {}", contest.object_id);
            return Err(Error::InvalidArgument(format!(
                "contest {} marks more selections than it has seats",
                contest.object_id
            )));
        }

        debug!("voiding overvoted contest {}", contest.object_id);
        votes.iter_mut().for_each(|vote| *vote = 0);
    }

    // Placeholders make up the undervote, so every contest sums to its seat count.
    let mut undervotes = number_elected - votes.iter().sum::<u64>();
    for _ in &description.placeholder_selections {
        let vote = u64::from(undervotes > 0);
        undervotes -= vote;
        votes.push(vote);
    }

    let nonces = Nonces::new(&description.crypto_hash(), &[nonce_seed]);
    let contest_nonce = Zeroizing::new(nonces.get(u64::from(description.description.sequence_order)));
    let proof_seed = Zeroizing::new(nonces.get(0));

    let ballot_selections = description
        .selections()
        .zip(votes)
        .map(|(selection, vote)| {
            encrypt_vote(
                vote,
                selection,
                public_key,
                extended_base_hash,
                &contest_nonce,
                randomness,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let ciphertexts: Vec<ElGamalCiphertext> = ballot_selections
        .iter()
        .map(|selection| selection.ciphertext)
        .collect();
    let accumulation = elgamal_add(&ciphertexts)?;
    let aggregate_nonce = Zeroizing::new(
        ballot_selections
            .iter()
            .filter_map(|selection| selection.nonce)
            .sum::<ModQ>(),
    );

    let proof = match randomness {
        Randomness::Derived => ConstantChaumPedersenProof::make(
            &accumulation,
            &aggregate_nonce,
            number_elected,
            public_key,
            extended_base_hash,
            &proof_seed,
        ),
        Randomness::Precomputed(pool) => ConstantChaumPedersenProof::make_with(
            &accumulation,
            &aggregate_nonce,
            number_elected,
            extended_base_hash,
            pooled_triple(pool, public_key),
        ),
    };

    Ok(CiphertextBallotContest::new(
        description,
        ballot_selections,
        accumulation,
        *aggregate_nonce,
        proof,
    ))
}

/// Encrypts `ballot` for the election of `manifest` and `context`, chaining its ballot code
/// from `ballot_code_seed`.
///
/// Contests of the ballot's style that the voter skipped are encrypted as all zero. The
/// result keeps its nonces; see [`CiphertextBallot::discard_nonces`].
pub fn encrypt_ballot(
    ballot: &PlaintextBallot,
    manifest: &InternalManifest,
    context: &CiphertextElectionContext,
    ballot_code_seed: &ModQ,
    options: EncryptOptions<'_>,
) -> Result<CiphertextBallot> {
    if manifest.manifest_hash != context.manifest_hash {
        return Err(Error::ManifestHashMismatch {
            expected: context.manifest_hash.to_hex(),
            actual: manifest.manifest_hash.to_hex(),
        });
    }

    if let Err(err) = ballot.validate(manifest) {
        debug!("rejecting ballot {}: {err}", ballot.object_id);
        return Err(err);
    }

    let randomness = match (options.nonce, options.precompute) {
        (None, Some(pool)) => Randomness::Precomputed(pool),
        _ => Randomness::Derived,
    };
    let nonce = options.nonce.unwrap_or_else(rand_q);
    let nonce_seed = Zeroizing::new(CiphertextBallot::nonce_seed(
        &manifest.manifest_hash,
        &ballot.object_id,
        &nonce,
    ));

    let contests = manifest
        .get_contests_for(&ballot.style_id)
        .into_iter()
        .map(|description| {
            let object_id = &description.description.object_id;
            let skipped;
            let contest = match ballot.contest(object_id) {
                Some(contest) => contest,
                None => {
                    skipped = PlaintextBallotContest::empty(object_id.as_str());
                    &skipped
                }
            };

            encrypt_contest_with(
                contest,
                description,
                &context.elgamal_public_key,
                &context.crypto_extended_base_hash,
                &nonce_seed,
                &context.configuration,
                randomness,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let encrypted = CiphertextBallot::new(
        &ballot.object_id,
        &ballot.style_id,
        manifest.manifest_hash,
        *ballot_code_seed,
        contests,
        options.timestamp.unwrap_or_else(|| Utc::now().timestamp()),
        nonce,
    );

    if options.should_verify_proofs && !encrypted.is_valid_encryption(manifest, context) {
        error!("ballot {} failed to verify after encryption", encrypted.object_id);
        return Err(Error::InternalError);
    }

    Ok(encrypted)
}

/// Encrypts `ballot` and keeps only what is needed to regenerate it: the compact plaintext,
/// the ballot nonce, the timestamp and the ballot code chain.
///
/// The precompute pool of `options` is ignored, since pooled exponents cannot be regenerated.
pub fn encrypt_compact_ballot(
    ballot: &PlaintextBallot,
    manifest: &InternalManifest,
    context: &CiphertextElectionContext,
    ballot_code_seed: &ModQ,
    options: EncryptOptions<'_>,
) -> Result<CompactCiphertextBallot> {
    let options = EncryptOptions {
        nonce: Some(options.nonce.unwrap_or_else(rand_q)),
        precompute: None,
        ..options
    };

    let compact = CompactPlaintextBallot::new(ballot, manifest)?;
    let encrypted = encrypt_ballot(ballot, manifest, context, ballot_code_seed, options)?;

    CompactCiphertextBallot::new(compact, &encrypted)
}

/// Regenerates the encrypted ballot behind `compact`, failing when its ballot code differs
/// from the stored one.
pub fn expand_compact_ciphertext_ballot(
    compact: &CompactCiphertextBallot,
    manifest: &InternalManifest,
    context: &CiphertextElectionContext,
) -> Result<CiphertextBallot> {
    let plaintext = expand_compact_plaintext_ballot(&compact.compact_plaintext_ballot, manifest)?;

    let encrypted = encrypt_ballot(
        &plaintext,
        manifest,
        context,
        &compact.ballot_code_seed,
        EncryptOptions {
            nonce: Some(compact.nonce),
            timestamp: Some(compact.timestamp),
            should_verify_proofs: false,
            precompute: None,
        },
    )?;

    if encrypted.ballot_code != compact.ballot_code {
        return Err(Error::InvalidArgument(format!(
            "ballot {} does not regenerate its ballot code",
            compact.object_id()
        )));
    }

    Ok(encrypted)
}
