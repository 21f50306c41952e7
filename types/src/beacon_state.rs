use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{BitVector, FixedVector, VariableList};
use std::convert::TryFrom;
use tree_hash_derive::TreeHash;

use crate::{config::*, consts, primitives::*, types::*};

#[derive(PartialEq, Debug)]
pub enum Error {
    IndexOutOfRange,
    RegistryLengthMismatch,
    SlotOutOfRange,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconState<C: Config> {
    pub slot: Slot,

    // History
    pub block_roots: FixedVector<H256, C::SlotsPerHistoricalRoot>,
    pub state_roots: FixedVector<H256, C::SlotsPerHistoricalRoot>,
    pub historical_roots: VariableList<H256, C::HistoricalRootsLimit>,

    // Eth1 Data
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: VariableList<Eth1Data, C::SlotsPerEth1VotingPeriod>,

    // Registry
    pub validators: VariableList<Validator, C::ValidatorRegistryLimit>,
    pub balances: VariableList<Gwei, C::ValidatorRegistryLimit>,

    // Shuffling
    pub randao_mixes: FixedVector<H256, C::EpochsPerHistoricalVector>,

    // Slashings
    pub slashings: FixedVector<Gwei, C::EpochsPerSlashingsVector>,

    // Attestations
    pub previous_epoch_attestations:
        VariableList<PendingAttestation<C>, C::MaxAttestationsPerEpoch>,
    pub current_epoch_attestations: VariableList<PendingAttestation<C>, C::MaxAttestationsPerEpoch>,

    // Finality
    pub justification_bits: BitVector<consts::JustificationBitsLength>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
}

impl<C: Config> BeaconState<C> {
    pub fn num_validators(&self) -> usize {
        self.validators.len()
    }

    pub fn validator(&self, index: ValidatorIndex) -> Result<&Validator, Error> {
        match usize::try_from(index) {
            Err(_err) => Err(Error::IndexOutOfRange),
            Ok(id) => self.validators.get(id).ok_or(Error::IndexOutOfRange),
        }
    }

    pub fn balances(&self) -> &[Gwei] {
        &self.balances
    }

    /// Replaces the whole balance vector. Callers compute new balances against
    /// a snapshot and write them back in one step, so concurrent readers never
    /// observe a half-applied epoch transition.
    pub fn set_balances(&mut self, balances: Vec<Gwei>) -> Result<(), Error> {
        if balances.len() != self.balances.len() {
            return Err(Error::RegistryLengthMismatch);
        }
        self.balances = VariableList::from(balances);
        Ok(())
    }
}
