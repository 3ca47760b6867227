// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Ballots at every stage of their life: the voter's plaintext input, its encryption, the
//! submitted record a ballot box keeps, and the compact form an encryption device stores.

pub use ciphertext::{
    ballot_code, CiphertextBallot, CiphertextBallotContest, CiphertextBallotSelection,
};
pub use compact::{
    expand_compact_plaintext_ballot, CompactCiphertextBallot, CompactPlaintextBallot,
};
pub use plaintext::{
    ContestVotes, PlaintextBallot, PlaintextBallotContest, PlaintextBallotSelection,
};
pub use submitted::{BallotBoxState, SubmittedBallot};

mod ciphertext;
mod compact;
mod plaintext;
mod submitted;
