//! Dedup / inclusion-gated queue of pending slashings feeding block
//! production. Entries are kept sorted by the validator they slash, so
//! duplicate suppression is a binary search and retrieval order is
//! deterministic.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use parking_lot::RwLock;
use thiserror::Error;
use types::{
    beacon_state::BeaconState,
    config::Config,
    primitives::ValidatorIndex,
    types::{AttesterSlashing, ProposerSlashing},
};

use helper_functions::beacon_state_accessors::get_current_epoch;
use helper_functions::predicates::is_slashable_attestation_data;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("validator {0} cannot be slashed")]
    CannotSlash(ValidatorIndex),
    #[error("the slashing object does not prove an offence")]
    NotSlashable,
    #[error("the slashing pair has no overlapping validators")]
    NoSlashableIndices,
}

/// The capability every pending entry exposes: which validator it slashes.
/// That index is both the ordering key and the dedup key.
pub trait PendingSlashing {
    fn validator_to_slash(&self) -> ValidatorIndex;
}

#[derive(Clone, PartialEq, Debug)]
pub struct PendingAttesterSlashing<C: Config> {
    pub validator_to_slash: ValidatorIndex,
    pub slashing: AttesterSlashing<C>,
}

impl<C: Config> PendingSlashing for PendingAttesterSlashing<C> {
    fn validator_to_slash(&self) -> ValidatorIndex {
        self.validator_to_slash
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct PendingProposerSlashing {
    pub validator_to_slash: ValidatorIndex,
    pub slashing: ProposerSlashing,
}

impl PendingSlashing for PendingProposerSlashing {
    fn validator_to_slash(&self) -> ValidatorIndex {
        self.validator_to_slash
    }
}

/// Signature verification of whole slashing objects against a state. BLS
/// internals stay behind this hook.
pub trait SlashingSignatureVerifier<C: Config>: Send + Sync {
    fn verify_attester_slashing(
        &self,
        state: &BeaconState<C>,
        slashing: &AttesterSlashing<C>,
    ) -> bool;

    fn verify_proposer_slashing(
        &self,
        state: &BeaconState<C>,
        slashing: &ProposerSlashing,
    ) -> bool;
}

pub struct AcceptAllSlashings;

impl<C: Config> SlashingSignatureVerifier<C> for AcceptAllSlashings {
    fn verify_attester_slashing(&self, _: &BeaconState<C>, _: &AttesterSlashing<C>) -> bool {
        true
    }

    fn verify_proposer_slashing(&self, _: &BeaconState<C>, _: &ProposerSlashing) -> bool {
        true
    }
}

struct Inner<C: Config> {
    pending_attester_slashings: Vec<PendingAttesterSlashing<C>>,
    pending_proposer_slashings: Vec<PendingProposerSlashing>,
    included: BTreeSet<ValidatorIndex>,
}

pub struct SlashingPool<C: Config, V: SlashingSignatureVerifier<C>> {
    inner: RwLock<Inner<C>>,
    verifier: V,
    verification_failures: AtomicU64,
}

impl<C: Config, V: SlashingSignatureVerifier<C>> SlashingPool<C, V> {
    pub fn new(verifier: V) -> Self {
        Self {
            inner: RwLock::new(Inner {
                pending_attester_slashings: Vec::new(),
                pending_proposer_slashings: Vec::new(),
                included: BTreeSet::new(),
            }),
            verifier,
            verification_failures: AtomicU64::new(0),
        }
    }

    pub fn verification_failure_count(&self) -> u64 {
        self.verification_failures.load(Ordering::Relaxed)
    }

    /// Queues one pending entry per slashable validator of the pair. Every
    /// slashable validator must pass the precondition; any violation fails
    /// the whole insertion. Re-inserting an already-queued validator is a
    /// no-op.
    pub fn insert_attester_slashing(
        &self,
        state: &BeaconState<C>,
        slashing: AttesterSlashing<C>,
    ) -> Result<(), Error> {
        if !is_slashable_attestation_data(
            &slashing.attestation_1.data,
            &slashing.attestation_2.data,
        ) {
            return Err(Error::NotSlashable);
        }

        let slashable = slashable_indices(&slashing);
        if slashable.is_empty() {
            return Err(Error::NoSlashableIndices);
        }

        let mut inner = self.inner.write();
        for validator_index in &slashable {
            check_can_slash(state, &inner.included, *validator_index)?;
        }

        for validator_index in slashable {
            insert_sorted(
                &mut inner.pending_attester_slashings,
                PendingAttesterSlashing {
                    validator_to_slash: validator_index,
                    slashing: slashing.clone(),
                },
            );
        }
        Ok(())
    }

    pub fn insert_proposer_slashing(
        &self,
        state: &BeaconState<C>,
        slashing: ProposerSlashing,
    ) -> Result<(), Error> {
        let header_1 = &slashing.signed_header_1.message;
        let header_2 = &slashing.signed_header_2.message;
        if header_1.slot != header_2.slot
            || header_1.proposer_index != header_2.proposer_index
            || header_1 == header_2
        {
            return Err(Error::NotSlashable);
        }

        let validator_index = slashing.proposer_index();
        let mut inner = self.inner.write();
        check_can_slash(state, &inner.included, validator_index)?;

        insert_sorted(
            &mut inner.pending_proposer_slashings,
            PendingProposerSlashing {
                validator_to_slash: validator_index,
                slashing,
            },
        );
        Ok(())
    }

    /// Up to `limit` attester slashings, in increasing validator order,
    /// whose signatures verify against the supplied state. Entries failing
    /// verification are evicted after the sweep.
    pub fn pending_attester_slashings(
        &self,
        state: &BeaconState<C>,
        limit: usize,
    ) -> Vec<AttesterSlashing<C>> {
        let mut results = Vec::new();
        let mut evict = Vec::new();

        {
            let inner = self.inner.read();
            for entry in &inner.pending_attester_slashings {
                if results.len() == limit {
                    break;
                }
                if self.verifier.verify_attester_slashing(state, &entry.slashing) {
                    if !results.contains(&entry.slashing) {
                        results.push(entry.slashing.clone());
                    }
                } else {
                    debug!(
                        "evicting attester slashing for validator {}: signature no longer valid",
                        entry.validator_to_slash,
                    );
                    evict.push(entry.validator_to_slash);
                }
            }
        }

        if !evict.is_empty() {
            self.verification_failures
                .fetch_add(evict.len() as u64, Ordering::Relaxed);
            let mut inner = self.inner.write();
            remove_validators(&mut inner.pending_attester_slashings, &evict);
        }

        results
    }

    pub fn pending_proposer_slashings(
        &self,
        state: &BeaconState<C>,
        limit: usize,
    ) -> Vec<ProposerSlashing> {
        let mut results = Vec::new();
        let mut evict = Vec::new();

        {
            let inner = self.inner.read();
            for entry in &inner.pending_proposer_slashings {
                if results.len() == limit {
                    break;
                }
                if self.verifier.verify_proposer_slashing(state, &entry.slashing) {
                    results.push(entry.slashing.clone());
                } else {
                    debug!(
                        "evicting proposer slashing for validator {}: signature no longer valid",
                        entry.validator_to_slash,
                    );
                    evict.push(entry.validator_to_slash);
                }
            }
        }

        if !evict.is_empty() {
            self.verification_failures
                .fetch_add(evict.len() as u64, Ordering::Relaxed);
            let mut inner = self.inner.write();
            remove_validators(&mut inner.pending_proposer_slashings, &evict);
        }

        results
    }

    /// Drops every entry the included slashing covers and guards the slashed
    /// validators against re-insertion.
    pub fn mark_included_attester_slashing(&self, slashing: &AttesterSlashing<C>) {
        let indices = slashable_indices(slashing);
        let mut inner = self.inner.write();
        remove_validators(&mut inner.pending_attester_slashings, &indices);
        inner.included.extend(indices);
    }

    pub fn mark_included_proposer_slashing(&self, slashing: &ProposerSlashing) {
        let validator_index = slashing.proposer_index();
        let mut inner = self.inner.write();
        remove_validators(&mut inner.pending_proposer_slashings, &[validator_index]);
        inner.included.insert(validator_index);
    }
}

/// Validators named by both attestations, in increasing order.
pub fn slashable_indices<C: Config>(slashing: &AttesterSlashing<C>) -> Vec<ValidatorIndex> {
    let first: HashSet<u64> = slashing
        .attestation_1
        .attesting_indices
        .iter()
        .copied()
        .collect();
    let mut indices: Vec<u64> = slashing
        .attestation_2
        .attesting_indices
        .iter()
        .copied()
        .filter(|index| first.contains(index))
        .collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}

fn check_can_slash<C: Config>(
    state: &BeaconState<C>,
    included: &BTreeSet<ValidatorIndex>,
    validator_index: ValidatorIndex,
) -> Result<(), Error> {
    if included.contains(&validator_index) {
        return Err(Error::CannotSlash(validator_index));
    }
    let validator = state
        .validator(validator_index)
        .map_err(|_| Error::CannotSlash(validator_index))?;
    if validator.slashed || validator.exit_epoch < get_current_epoch(state) {
        return Err(Error::CannotSlash(validator_index));
    }
    Ok(())
}

fn insert_sorted<P: PendingSlashing>(list: &mut Vec<P>, entry: P) -> bool {
    match list.binary_search_by_key(&entry.validator_to_slash(), PendingSlashing::validator_to_slash)
    {
        // Already queued for this validator.
        Ok(_) => false,
        Err(position) => {
            list.insert(position, entry);
            true
        }
    }
}

fn remove_validators<P: PendingSlashing>(list: &mut Vec<P>, indices: &[ValidatorIndex]) {
    list.retain(|entry| !indices.contains(&entry.validator_to_slash()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssz_types::VariableList;
    use types::config::MainnetConfig;
    use types::consts::FAR_FUTURE_EPOCH;
    use types::primitives::{Epoch, H256};
    use types::types::{
        AttestationData, BeaconBlockHeader, Checkpoint, IndexedAttestation,
        SignedBeaconBlockHeader, Validator,
    };

    fn state(validators: usize) -> BeaconState<MainnetConfig> {
        let validator = Validator {
            activation_epoch: 0,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
            ..Validator::default()
        };
        BeaconState {
            validators: VariableList::from(vec![validator; validators]),
            ..BeaconState::default()
        }
    }

    fn attestation(
        validators: &[u64],
        source: Epoch,
        target: Epoch,
        root: u8,
    ) -> IndexedAttestation<MainnetConfig> {
        IndexedAttestation {
            attesting_indices: VariableList::from(validators.to_vec()),
            data: AttestationData {
                beacon_block_root: H256::repeat_byte(root),
                source: Checkpoint {
                    epoch: source,
                    ..Checkpoint::default()
                },
                target: Checkpoint {
                    epoch: target,
                    ..Checkpoint::default()
                },
                ..AttestationData::default()
            },
            ..IndexedAttestation::default()
        }
    }

    fn attester_slashing(validators: &[u64]) -> AttesterSlashing<MainnetConfig> {
        AttesterSlashing {
            attestation_1: attestation(validators, 3, 5, 0xaa),
            attestation_2: attestation(validators, 3, 5, 0xbb),
        }
    }

    fn proposer_slashing(proposer: u64, slot: u64) -> ProposerSlashing {
        let header = |body: u8| SignedBeaconBlockHeader {
            message: BeaconBlockHeader {
                slot,
                proposer_index: proposer,
                body_root: H256::repeat_byte(body),
                ..BeaconBlockHeader::default()
            },
            ..SignedBeaconBlockHeader::default()
        };
        ProposerSlashing {
            signed_header_1: header(0x01),
            signed_header_2: header(0x02),
        }
    }

    fn pool() -> SlashingPool<MainnetConfig, AcceptAllSlashings> {
        SlashingPool::new(AcceptAllSlashings)
    }

    #[test]
    fn pending_entries_stay_sorted_without_duplicates() {
        let pool = pool();
        let state = state(8);

        pool.insert_attester_slashing(&state, attester_slashing(&[5]))
            .expect("insertion succeeds");
        pool.insert_attester_slashing(&state, attester_slashing(&[2]))
            .expect("insertion succeeds");
        pool.insert_attester_slashing(&state, attester_slashing(&[7, 2]))
            .expect("insertion succeeds");

        let inner = pool.inner.read();
        let order: Vec<u64> = inner
            .pending_attester_slashings
            .iter()
            .map(|entry| entry.validator_to_slash)
            .collect();
        assert_eq!(order, vec![2, 5, 7]);
    }

    #[test]
    fn disjoint_attestations_are_rejected() {
        let pool = pool();
        let state = state(8);
        let slashing = AttesterSlashing {
            attestation_1: attestation(&[1], 3, 5, 0xaa),
            attestation_2: attestation(&[2], 3, 5, 0xbb),
        };
        assert_eq!(
            pool.insert_attester_slashing(&state, slashing),
            Err(Error::NoSlashableIndices),
        );
    }

    #[test]
    fn structurally_sound_pairs_only() {
        let pool = pool();
        let state = state(8);
        let not_slashable = AttesterSlashing {
            attestation_1: attestation(&[1], 3, 5, 0xaa),
            attestation_2: attestation(&[1], 4, 6, 0xbb),
        };
        assert_eq!(
            pool.insert_attester_slashing(&state, not_slashable),
            Err(Error::NotSlashable),
        );
    }

    #[test]
    fn already_slashed_validators_cannot_be_queued() {
        let pool = pool();
        let mut state = state(8);
        state.validators[3].slashed = true;

        assert_eq!(
            pool.insert_attester_slashing(&state, attester_slashing(&[2, 3])),
            Err(Error::CannotSlash(3)),
        );
        // The violation fails the whole insertion: validator 2 is not queued.
        assert!(pool
            .pending_attester_slashings(&state, usize::max_value())
            .is_empty());
    }

    #[test]
    fn exited_validators_cannot_be_queued() {
        let pool = pool();
        let mut state = state(8);
        state.slot = 64 * 32;
        state.validators[1].exit_epoch = 2;

        assert_eq!(
            pool.insert_proposer_slashing(&state, proposer_slashing(1, 4)),
            Err(Error::CannotSlash(1)),
        );
    }

    #[test]
    fn retrieval_respects_the_limit() {
        let pool = pool();
        let state = state(8);
        for validator in 0..4 {
            pool.insert_attester_slashing(&state, attester_slashing(&[validator]))
                .expect("insertion succeeds");
        }

        assert_eq!(pool.pending_attester_slashings(&state, 2).len(), 2);
        assert_eq!(pool.pending_attester_slashings(&state, 10).len(), 4);
    }

    #[test]
    fn one_pair_slashing_many_validators_is_returned_once() {
        let pool = pool();
        let state = state(8);
        pool.insert_attester_slashing(&state, attester_slashing(&[1, 2, 3]))
            .expect("insertion succeeds");

        assert_eq!(pool.pending_attester_slashings(&state, 10).len(), 1);
    }

    struct RejectAllSlashings;

    impl SlashingSignatureVerifier<MainnetConfig> for RejectAllSlashings {
        fn verify_attester_slashing(
            &self,
            _: &BeaconState<MainnetConfig>,
            _: &AttesterSlashing<MainnetConfig>,
        ) -> bool {
            false
        }

        fn verify_proposer_slashing(
            &self,
            _: &BeaconState<MainnetConfig>,
            _: &ProposerSlashing,
        ) -> bool {
            false
        }
    }

    #[test]
    fn failing_signatures_evict_entries() {
        let pool: SlashingPool<MainnetConfig, RejectAllSlashings> =
            SlashingPool::new(RejectAllSlashings);
        let state = state(8);

        pool.insert_attester_slashing(&state, attester_slashing(&[1]))
            .expect("insertion succeeds");

        assert!(pool.pending_attester_slashings(&state, 10).is_empty());
        assert_eq!(pool.verification_failure_count(), 1);
        assert!(pool.inner.read().pending_attester_slashings.is_empty());
    }

    #[test]
    fn included_slashings_are_removed_and_guarded() {
        let pool = pool();
        let state = state(8);
        let slashing = attester_slashing(&[2, 3]);

        pool.insert_attester_slashing(&state, slashing.clone())
            .expect("insertion succeeds");
        pool.mark_included_attester_slashing(&slashing);

        assert!(pool.pending_attester_slashings(&state, 10).is_empty());
        assert_eq!(
            pool.insert_attester_slashing(&state, attester_slashing(&[3])),
            Err(Error::CannotSlash(3)),
        );
    }

    #[test]
    fn proposer_entries_are_deduplicated() {
        let pool = pool();
        let state = state(8);

        pool.insert_proposer_slashing(&state, proposer_slashing(1, 4))
            .expect("insertion succeeds");
        pool.insert_proposer_slashing(&state, proposer_slashing(1, 4))
            .expect("re-insertion is a no-op");

        assert_eq!(pool.pending_proposer_slashings(&state, 10).len(), 1);
    }
}
