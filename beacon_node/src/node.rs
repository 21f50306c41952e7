use std::sync::Arc;

use anyhow::{ensure, Result};
use helper_functions::misc::compute_epoch_at_slot;
use log::{debug, info};
use slasher::config::Config as SlasherConfig;
use slasher::store::KvStore;
use slasher::verify::AcceptAllVerifier;
use slasher::{Slasher, Slashing};
use slashing_pool::{AcceptAllSlashings, Error as PoolError, SlashingPool};
use transition_functions::epochs::process_epoch;
use typenum::Unsigned;
use types::{
    beacon_state::BeaconState,
    config::Config,
    primitives::{Epoch, Gwei, Slot},
    types::{AttesterSlashing, IndexedAttestation, ProposerSlashing, SignedBeaconBlockHeader},
};

/// Wires the epoch-transition engine, the slashing detector and the slashing
/// pool around one beacon state. Signature verification hooks accept
/// everything here; a full node replaces them with its BLS stack.
pub struct Node<C: Config, S: KvStore> {
    state: BeaconState<C>,
    slasher: Arc<Slasher<C, S, AcceptAllVerifier>>,
    pool: SlashingPool<C, AcceptAllSlashings>,
}

impl<C: Config, S: KvStore> Node<C, S> {
    pub fn new(
        genesis_state: BeaconState<C>,
        store: Arc<S>,
        slasher_config: SlasherConfig,
    ) -> Result<Self> {
        let slasher = Arc::new(Slasher::open(store, slasher_config, AcceptAllVerifier)?);
        Ok(Self {
            state: genesis_state,
            slasher,
            pool: SlashingPool::new(AcceptAllSlashings),
        })
    }

    pub fn head_state(&self) -> &BeaconState<C> {
        &self.state
    }

    pub fn slasher(&self) -> &Arc<Slasher<C, S, AcceptAllVerifier>> {
        &self.slasher
    }

    /// Advances the node clock. Entering a new epoch first runs the epoch
    /// transition for the epoch that just ended, then flushes and prunes the
    /// detector's history.
    pub fn handle_slot_start(&mut self, slot: Slot) -> Result<()> {
        ensure!(
            self.state.slot < slot,
            "slot {} is not later than {}",
            slot,
            self.state.slot,
        );
        info!("slot {} started", slot);

        let slots_per_epoch = C::SlotsPerEpoch::to_u64();
        if slot % slots_per_epoch == 0 {
            self.state.slot = slot - 1;
            let summary = process_epoch(&mut self.state)?;
            let epoch = compute_epoch_at_slot::<C>(slot);
            self.slasher.process_epoch_boundary(epoch)?;
            info!(
                "epoch {} processed ({} validators, {} active gwei)",
                epoch - 1,
                summary.summaries.len(),
                summary.totals.active_current_epoch(),
            );
        }

        self.state.slot = slot;
        self.slasher
            .update_current_epoch(compute_epoch_at_slot::<C>(slot));
        Ok(())
    }

    /// Feeds one observed attestation to the detector and queues whatever it
    /// finds.
    pub fn accept_indexed_attestation(&self, attestation: IndexedAttestation<C>) -> Result<()> {
        debug!("received indexed attestation: {:?}", attestation.data);
        let slashings = self.slasher.check_attestation(&attestation)?;
        self.queue_slashings(slashings);
        Ok(())
    }

    pub fn accept_block_header(&self, header: SignedBeaconBlockHeader) -> Result<()> {
        debug!("received signed block header: {:?}", header.message);
        if let Some(slashing) = self.slasher.check_proposal(&header)? {
            self.queue_slashings(vec![slashing]);
        }
        Ok(())
    }

    pub fn pending_attester_slashings(&self, limit: usize) -> Vec<AttesterSlashing<C>> {
        self.pool.pending_attester_slashings(&self.state, limit)
    }

    pub fn pending_proposer_slashings(&self, limit: usize) -> Vec<ProposerSlashing> {
        self.pool.pending_proposer_slashings(&self.state, limit)
    }

    pub fn mark_included(&self, slashing: &Slashing<C>) {
        match slashing {
            Slashing::Attester(slashing) => self.pool.mark_included_attester_slashing(slashing),
            Slashing::Proposer(slashing) => self.pool.mark_included_proposer_slashing(slashing),
        }
    }

    pub fn total_balance(&self) -> Gwei {
        self.state.balances().iter().sum()
    }

    pub fn current_epoch(&self) -> Epoch {
        compute_epoch_at_slot::<C>(self.state.slot)
    }

    /// Queues externally detected slashings, e.g. ones coming back from the
    /// background detector service.
    pub fn queue_slashings(&self, slashings: Vec<Slashing<C>>) {
        for slashing in slashings {
            info!(
                "slashing detected for validators {:?}",
                slashing.validator_indices(),
            );
            let outcome = match &slashing {
                Slashing::Attester(slashing) => self
                    .pool
                    .insert_attester_slashing(&self.state, slashing.clone()),
                Slashing::Proposer(slashing) => self
                    .pool
                    .insert_proposer_slashing(&self.state, slashing.clone()),
            };
            match outcome {
                Ok(()) => {}
                // Expected when the validator was slashed or exited since.
                Err(PoolError::CannotSlash(validator_index)) => {
                    debug!("validator {} is no longer slashable", validator_index);
                }
                Err(error) => debug!("slashing not queued: {}", error),
            }
        }
    }
}
