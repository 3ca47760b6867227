// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    ballot::{CiphertextBallot, CompactCiphertextBallot, PlaintextBallot},
    context::CiphertextElectionContext,
    encrypt::{encrypt_ballot, encrypt_compact_ballot, EncryptOptions},
    group::ModQ,
    hash::hash_elems,
    manifest::InternalManifest,
    precompute::PrecomputeBufferPool,
    Error, Result,
};

/// The device ballots are encrypted on. Its hash seeds the first ballot code of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionDevice {
    pub device_id: u64,
    pub session_id: u64,
    pub launch_code: u64,
    pub location: String,
}

impl EncryptionDevice {
    pub fn new(device_id: u64, session_id: u64, launch_code: u64, location: impl Into<String>) -> Self {
        Self {
            device_id,
            session_id,
            launch_code,
            location: location.into(),
        }
    }

    pub fn get_hash(&self) -> ModQ {
        hash_elems(&[
            &self.device_id,
            &self.session_id,
            &self.launch_code,
            &self.location,
        ])
    }
}

/// Encrypts a device's ballots one after another, chaining each ballot code into the seed of
/// the next.
pub struct EncryptionMediator {
    manifest: InternalManifest,
    context: CiphertextElectionContext,
    device: EncryptionDevice,
    ballot_code_seed: ModQ,
    should_verify_proofs: bool,
    precompute: Option<Arc<PrecomputeBufferPool>>,
}

impl EncryptionMediator {
    /// Fails with [`Error::ManifestHashMismatch`] when `context` was built for another manifest.
    pub fn new(
        manifest: InternalManifest,
        context: CiphertextElectionContext,
        device: EncryptionDevice,
    ) -> Result<Self> {
        if manifest.manifest_hash != context.manifest_hash {
            return Err(Error::ManifestHashMismatch {
                expected: context.manifest_hash.to_hex(),
                actual: manifest.manifest_hash.to_hex(),
            });
        }

        info!(
            "encryption mediator ready for device {} at {}",
            device.device_id, device.location
        );

        Ok(Self {
            manifest,
            context,
            ballot_code_seed: device.get_hash(),
            device,
            should_verify_proofs: true,
            precompute: None,
        })
    }

    /// Whether each ballot's proofs are re-verified after encryption; on by default.
    pub fn with_verification(mut self, should_verify_proofs: bool) -> Self {
        self.should_verify_proofs = should_verify_proofs;
        self
    }

    /// Draws exponentiations from `pool` for ballots encrypted with [`Self::encrypt`].
    pub fn use_precompute(mut self, pool: Arc<PrecomputeBufferPool>) -> Self {
        self.precompute = Some(pool);
        self
    }

    pub fn device(&self) -> &EncryptionDevice {
        &self.device
    }

    /// The seed of the next ballot's code: the previous ballot's code, or the device hash.
    pub fn ballot_code_seed(&self) -> &ModQ {
        &self.ballot_code_seed
    }

    /// Encrypts `ballot` with a fresh random nonce.
    pub fn encrypt(&mut self, ballot: &PlaintextBallot) -> Result<CiphertextBallot> {
        let encrypted = encrypt_ballot(
            ballot,
            &self.manifest,
            &self.context,
            &self.ballot_code_seed,
            EncryptOptions {
                should_verify_proofs: self.should_verify_proofs,
                precompute: self.precompute.as_deref(),
                ..EncryptOptions::default()
            },
        )?;

        self.ballot_code_seed = encrypted.ballot_code;
        info!(
            "encrypted ballot {} with code {}",
            encrypted.object_id, encrypted.ballot_code
        );

        Ok(encrypted)
    }

    /// Encrypts `ballot` and returns only its compact form.
    pub fn compact_encrypt(&mut self, ballot: &PlaintextBallot) -> Result<CompactCiphertextBallot> {
        let compact = encrypt_compact_ballot(
            ballot,
            &self.manifest,
            &self.context,
            &self.ballot_code_seed,
            EncryptOptions {
                should_verify_proofs: self.should_verify_proofs,
                ..EncryptOptions::default()
            },
        )?;

        self.ballot_code_seed = compact.ballot_code;
        info!(
            "encrypted compact ballot {} with code {}",
            compact.object_id(),
            compact.ballot_code
        );

        Ok(compact)
    }
}
