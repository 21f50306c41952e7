pub mod array;
pub mod config;
pub mod error;
pub mod records;
pub mod service;
pub mod store;
pub mod verify;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::Mutex;
use typenum::Unsigned;
use types::config::Config as ChainConfig;
use types::primitives::{Epoch, Slot, ValidatorIndex, H256};
use types::types::{
    AttesterSlashing, IndexedAttestation, ProposerSlashing, SignedBeaconBlockHeader,
};

use crate::array::{apply_attestation_for_validator, Chunk, ChunkKind};
use crate::config::Config;
use crate::error::Error;
use crate::records::{AttesterRecord, ProposalRecord};
use crate::store::{ChunkKey, ChunkStore, KvStore, WriteBatch};
use crate::verify::SignatureVerifier;

pub use crate::error::Error as SlasherError;

/// A detected offence, either flavour, together with the artefact pair that
/// proves it.
#[derive(Clone, PartialEq, Debug)]
pub enum Slashing<C: ChainConfig> {
    Attester(AttesterSlashing<C>),
    Proposer(ProposerSlashing),
}

impl<C: ChainConfig> Slashing<C> {
    /// The validators this slashing is evidence against, in increasing order.
    pub fn validator_indices(&self) -> Vec<ValidatorIndex> {
        match self {
            Slashing::Attester(slashing) => {
                let first: HashSet<u64> =
                    slashing.attestation_1.attesting_indices.iter().copied().collect();
                let mut indices: Vec<u64> = slashing
                    .attestation_2
                    .attesting_indices
                    .iter()
                    .copied()
                    .filter(|index| first.contains(index))
                    .collect();
                indices.sort_unstable();
                indices
            }
            Slashing::Proposer(slashing) => vec![slashing.proposer_index()],
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum AttesterSlashingStatus<C: ChainConfig> {
    NotSlashable,
    DoubleVote(Box<IndexedAttestation<C>>),
    SurroundsExisting(Box<IndexedAttestation<C>>),
    SurroundedByExisting(Box<IndexedAttestation<C>>),
}

impl<C: ChainConfig> AttesterSlashingStatus<C> {
    pub fn existing_attestation(&self) -> Option<&IndexedAttestation<C>> {
        match self {
            AttesterSlashingStatus::NotSlashable => None,
            AttesterSlashingStatus::DoubleVote(existing)
            | AttesterSlashingStatus::SurroundsExisting(existing)
            | AttesterSlashingStatus::SurroundedByExisting(existing) => Some(existing),
        }
    }

    /// Builds the slashing object so that `attestation_1` is the offender
    /// under `is_slashable_attestation_data(data_1, data_2)`.
    pub fn into_slashing(self, new: &IndexedAttestation<C>) -> Option<AttesterSlashing<C>> {
        match self {
            AttesterSlashingStatus::NotSlashable => None,
            AttesterSlashingStatus::DoubleVote(existing)
            | AttesterSlashingStatus::SurroundedByExisting(existing) => Some(AttesterSlashing {
                attestation_1: *existing,
                attestation_2: new.clone(),
            }),
            AttesterSlashingStatus::SurroundsExisting(existing) => Some(AttesterSlashing {
                attestation_1: new.clone(),
                attestation_2: *existing,
            }),
        }
    }
}

/// Key of an already-emitted slashing: `(target epoch or slot, existing
/// signing root, incoming signing root)`. Re-detections of the same pair are
/// suppressed, which is what makes repeated submission idempotent.
type EmittedKey = (u64, H256, H256);

/// The online slashing detector: double votes and double proposals through
/// per-validator records, surround votes through min/max span chunks.
///
/// Both entry points are total on well-formed input; malformed input is
/// silently dropped and counted. Storage failures surface as retriable
/// errors. Record writes for one validator chunk go through a single
/// transaction, and the span cache is only updated once that transaction
/// lands; chunk durability follows at eviction or the epoch-boundary flush.
pub struct Slasher<C: ChainConfig, S: KvStore, V: SignatureVerifier<C>> {
    db: ChunkStore<S>,
    verifier: V,
    current_epoch: AtomicU64,
    chunk_locks: Mutex<HashMap<usize, Arc<Mutex<()>>>>,
    emitted: Mutex<HashSet<EmittedKey>>,
    integrity_rejects: AtomicU64,
    signature_rejects: AtomicU64,
    batch_timeouts: AtomicU64,
    _phantom: PhantomData<C>,
}

impl<C: ChainConfig, S: KvStore, V: SignatureVerifier<C>> Slasher<C, S, V> {
    pub fn open(store: Arc<S>, config: Config, verifier: V) -> Result<Self, Error> {
        let config = Arc::new(config.validate()?);
        Ok(Self {
            db: ChunkStore::new(store, config),
            verifier,
            current_epoch: AtomicU64::new(0),
            chunk_locks: Mutex::new(HashMap::new()),
            emitted: Mutex::new(HashSet::new()),
            integrity_rejects: AtomicU64::new(0),
            signature_rejects: AtomicU64::new(0),
            batch_timeouts: AtomicU64::new(0),
            _phantom: PhantomData,
        })
    }

    pub fn db(&self) -> &ChunkStore<S> {
        &self.db
    }

    pub fn current_epoch(&self) -> Epoch {
        self.current_epoch.load(Ordering::Relaxed)
    }

    pub fn update_current_epoch(&self, epoch: Epoch) {
        self.current_epoch.fetch_max(epoch, Ordering::Relaxed);
    }

    /// Epoch-boundary housekeeping: dirty chunks are made durable and
    /// everything outside the history window is pruned, including the
    /// emitted-slashing dedup set.
    pub fn process_epoch_boundary(&self, epoch: Epoch) -> Result<(), Error> {
        self.update_current_epoch(epoch);
        self.db.flush()?;
        self.db.prune(epoch, C::SlotsPerEpoch::to_u64())?;

        let earliest_epoch = self.db.config().earliest_tracked_epoch(epoch);
        let earliest_slot = earliest_epoch * C::SlotsPerEpoch::to_u64();
        self.emitted
            .lock()
            .retain(|(ordinal, _, _)| *ordinal >= earliest_epoch.min(earliest_slot));
        Ok(())
    }

    pub fn integrity_reject_count(&self) -> u64 {
        self.integrity_rejects.load(Ordering::Relaxed)
    }

    pub fn signature_reject_count(&self) -> u64 {
        self.signature_rejects.load(Ordering::Relaxed)
    }

    pub fn batch_timeout_count(&self) -> u64 {
        self.batch_timeouts.load(Ordering::Relaxed)
    }

    /// Checks one attestation against the signer's lifetime history and
    /// records it. Returns every newly detected, signature-verified offence.
    pub fn check_attestation(
        &self,
        attestation: &IndexedAttestation<C>,
    ) -> Result<Vec<Slashing<C>>, Error> {
        let current_epoch = self.current_epoch();
        if !self.is_integrity_valid(attestation, current_epoch) {
            self.integrity_rejects.fetch_add(1, Ordering::Relaxed);
            return Ok(vec![]);
        }

        let signing_root = attestation.data.canonical_root();
        let mut statuses = Vec::new();

        for validator_chunk_index in self.db.config().validator_chunk_indices(attestation) {
            let lock = self.chunk_lock(validator_chunk_index);
            let _guard = lock.lock();
            statuses.extend(self.process_validator_chunk(
                attestation,
                signing_root,
                validator_chunk_index,
                current_epoch,
            )?);
        }

        Ok(self.emit_attester_slashings(attestation, signing_root, statuses))
    }

    /// Checks one signed block header for a conflicting proposal at the same
    /// slot and records it.
    pub fn check_proposal(
        &self,
        header: &SignedBeaconBlockHeader,
    ) -> Result<Option<Slashing<C>>, Error> {
        let proposer_index = header.message.proposer_index;
        let slot: Slot = header.message.slot;
        let signing_root = header.message.canonical_root();

        let existing_record = match self.db.proposal_record(proposer_index, slot)? {
            Some(record) => record,
            None => {
                let mut batch = WriteBatch::new();
                ChunkStore::<S>::stage_proposal_record(
                    &mut batch,
                    proposer_index,
                    ProposalRecord { slot, signing_root },
                    header,
                );
                self.db.commit(batch, vec![])?;
                return Ok(None);
            }
        };

        if existing_record.signing_root == signing_root {
            return Ok(None);
        }

        let existing_header = match self.db.proposal_header(proposer_index, slot)? {
            Some(existing) => existing,
            None => {
                debug!(
                    "proposal record for validator {} at slot {} has no stored header",
                    proposer_index, slot,
                );
                return Ok(None);
            }
        };

        let key: EmittedKey = (slot, existing_record.signing_root, signing_root);
        if self.emitted.lock().contains(&key) {
            return Ok(None);
        }

        if !self.verifier.verify_block_header(&existing_header)
            || !self.verifier.verify_block_header(header)
        {
            debug!(
                "suppressing proposer slashing for validator {}: signature invalid",
                proposer_index,
            );
            self.signature_rejects.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }

        self.emitted.lock().insert(key);
        Ok(Some(Slashing::Proposer(ProposerSlashing {
            signed_header_1: existing_header,
            signed_header_2: header.clone(),
        })))
    }

    /// An attestation is integrity-valid iff its source precedes its target,
    /// its index list is well-formed, and its target is still inside the
    /// indexed history window.
    fn is_integrity_valid(&self, attestation: &IndexedAttestation<C>, current_epoch: Epoch) -> bool {
        let data = &attestation.data;
        data.source.epoch < data.target.epoch
            && helper_functions::predicates::validate_indexed_attestation(attestation).is_ok()
            && data.target.epoch >= self.db.config().earliest_tracked_epoch(current_epoch)
    }

    fn process_validator_chunk(
        &self,
        attestation: &IndexedAttestation<C>,
        signing_root: H256,
        validator_chunk_index: usize,
        current_epoch: Epoch,
    ) -> Result<Vec<AttesterSlashingStatus<C>>, Error> {
        let data = &attestation.data;
        let config = self.db.config().clone();

        let mut updated_min: BTreeMap<usize, Chunk> = BTreeMap::new();
        let mut updated_max: BTreeMap<usize, Chunk> = BTreeMap::new();
        let mut batch = WriteBatch::new();
        let mut statuses = Vec::new();

        let validator_indices: Vec<ValidatorIndex> = config
            .attesting_validators_for_chunk(attestation, validator_chunk_index)
            .collect();

        for validator_index in validator_indices {
            match self.db.attester_record(validator_index, data.target.epoch)? {
                // The same vote again. The record stays, but the spans are
                // still refreshed: they may postdate the record, e.g. after a
                // partial restore.
                Some(record) if record.signing_root == signing_root => {
                    let status = apply_attestation_for_validator(
                        &self.db,
                        &mut updated_min,
                        &mut updated_max,
                        validator_chunk_index,
                        validator_index,
                        attestation,
                        current_epoch,
                    )?;
                    statuses.push(status);
                }
                // Conflicting vote for the same target. The existing record
                // is kept and the spans stay untouched.
                Some(record) => {
                    match self
                        .db
                        .indexed_attestation::<C>(data.target.epoch, record.signing_root)?
                    {
                        Some(existing) => {
                            statuses.push(AttesterSlashingStatus::DoubleVote(Box::new(existing)));
                        }
                        None => debug!(
                            "double vote by validator {} at target {} has no recoverable artefact",
                            validator_index, data.target.epoch,
                        ),
                    }
                }
                None => {
                    let status = apply_attestation_for_validator(
                        &self.db,
                        &mut updated_min,
                        &mut updated_max,
                        validator_chunk_index,
                        validator_index,
                        attestation,
                        current_epoch,
                    )?;
                    if status == AttesterSlashingStatus::NotSlashable {
                        ChunkStore::<S>::stage_attester_record(
                            &mut batch,
                            validator_index,
                            AttesterRecord {
                                source: data.source.epoch,
                                target: data.target.epoch,
                                signing_root,
                            },
                            attestation,
                        );
                    }
                    statuses.push(status);
                }
            }
        }

        let chunks: Vec<(ChunkKey, Chunk)> = updated_min
            .into_iter()
            .map(|(chunk_index, chunk)| {
                ((ChunkKind::MinSpan, validator_chunk_index, chunk_index), chunk)
            })
            .chain(updated_max.into_iter().map(|(chunk_index, chunk)| {
                ((ChunkKind::MaxSpan, validator_chunk_index, chunk_index), chunk)
            }))
            .collect();

        if !batch.is_empty() || !chunks.is_empty() {
            self.db.commit(batch, chunks)?;
        }

        Ok(statuses)
    }

    /// Deduplicates detections against everything already emitted and runs
    /// batched signature verification over both artefacts of each pair.
    /// Verification failure suppresses the slashing.
    fn emit_attester_slashings(
        &self,
        attestation: &IndexedAttestation<C>,
        signing_root: H256,
        statuses: Vec<AttesterSlashingStatus<C>>,
    ) -> Vec<Slashing<C>> {
        let target = attestation.data.target.epoch;

        let mut fresh: Vec<(EmittedKey, AttesterSlashingStatus<C>)> = Vec::new();
        {
            let emitted = self.emitted.lock();
            for status in statuses {
                let existing = match status.existing_attestation() {
                    Some(existing) => existing,
                    None => continue,
                };
                let key: EmittedKey = (target, existing.data.canonical_root(), signing_root);
                if !emitted.contains(&key) && !fresh.iter().any(|(seen, _)| *seen == key) {
                    fresh.push((key, status));
                }
            }
        }

        if fresh.is_empty() {
            return vec![];
        }

        let deadline = self.verification_deadline();
        let mut to_verify: Vec<&IndexedAttestation<C>> = vec![attestation];
        for (_, status) in &fresh {
            if let Some(existing) = status.existing_attestation() {
                to_verify.push(existing);
            }
        }
        let results = self
            .verifier
            .verify_indexed_attestation_batch(&to_verify, Some(deadline));
        if Instant::now() >= deadline {
            self.batch_timeouts.fetch_add(1, Ordering::Relaxed);
        }

        let new_attestation_valid = results.first().copied().unwrap_or(false);
        let mut slashings = Vec::new();
        for ((key, status), existing_valid) in
            fresh.into_iter().zip(results.into_iter().skip(1))
        {
            if !new_attestation_valid || !existing_valid {
                debug!("suppressing attester slashing: signature invalid");
                self.signature_rejects.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            if let Some(slashing) = status.into_slashing(attestation) {
                self.emitted.lock().insert(key);
                slashings.push(Slashing::Attester(slashing));
            }
        }
        slashings
    }

    fn verification_deadline(&self) -> Instant {
        Instant::now() + Duration::from_secs(C::seconds_per_slot()) / 3
    }

    fn chunk_lock(&self, validator_chunk_index: usize) -> Arc<Mutex<()>> {
        self.chunk_locks
            .lock()
            .entry(validator_chunk_index)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
