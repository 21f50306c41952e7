use std::cmp;
use std::convert::TryFrom;

use ssz_types::BitList;
use typenum::marker_traits::Unsigned;
use types::{beacon_state::BeaconState, config::Config, primitives::*, types::*};

use crate::{
    crypto::hash,
    error::Error,
    math::int_to_bytes,
    misc::{compute_committee, compute_epoch_at_slot, compute_start_slot_at_epoch},
    predicates::is_active_validator,
};

pub fn get_current_epoch<C: Config>(state: &BeaconState<C>) -> Epoch {
    compute_epoch_at_slot::<C>(state.slot)
}

pub fn get_previous_epoch<C: Config>(state: &BeaconState<C>) -> Epoch {
    let current_epoch = get_current_epoch(state);
    let genesis_epoch = C::genesis_epoch();

    if current_epoch > genesis_epoch {
        current_epoch - 1
    } else {
        genesis_epoch
    }
}

pub fn get_block_root<C: Config>(state: &BeaconState<C>, epoch: Epoch) -> Result<H256, Error> {
    get_block_root_at_slot(state, compute_start_slot_at_epoch::<C>(epoch))
}

pub fn get_block_root_at_slot<C: Config>(
    state: &BeaconState<C>,
    slot: Slot,
) -> Result<H256, Error> {
    if !(slot < state.slot && state.slot <= slot + C::SlotsPerHistoricalRoot::to_u64()) {
        return Err(Error::SlotOutOfRange);
    }

    match usize::try_from(slot % C::SlotsPerHistoricalRoot::to_u64()) {
        Err(_err) => Err(Error::IndexOutOfRange),
        Ok(id) => Ok(state.block_roots[id]),
    }
}

pub fn get_randao_mix<C: Config>(state: &BeaconState<C>, epoch: Epoch) -> Result<H256, Error> {
    match usize::try_from(epoch % C::EpochsPerHistoricalVector::to_u64()) {
        Err(_err) => Err(Error::IndexOutOfRange),
        Ok(id) => Ok(state.randao_mixes[id]),
    }
}

pub fn get_active_validator_indices<C: Config>(
    state: &BeaconState<C>,
    epoch: Epoch,
) -> Vec<ValidatorIndex> {
    let mut active_validator_indices = Vec::new();
    for (i, v) in state.validators.iter().enumerate() {
        if is_active_validator(v, epoch) {
            active_validator_indices.push(i as u64);
        }
    }
    active_validator_indices
}

pub fn get_validator_churn_limit<C: Config>(state: &BeaconState<C>) -> u64 {
    let active_validator_indices = get_active_validator_indices(state, get_current_epoch(state));

    cmp::max(
        C::min_per_epoch_churn_limit(),
        active_validator_indices.len() as u64 / C::churn_limit_quotient(),
    )
}

pub fn get_total_balance<C: Config>(
    state: &BeaconState<C>,
    indices: &[ValidatorIndex],
) -> Result<Gwei, Error> {
    let mut sum = 0;
    for index in indices {
        match usize::try_from(*index) {
            Err(_err) => return Err(Error::IndexOutOfRange),
            Ok(id) => sum += state.validators[id].effective_balance,
        }
    }
    Ok(sum)
}

pub fn get_total_active_balance<C: Config>(state: &BeaconState<C>) -> Result<Gwei, Error> {
    get_total_balance(
        state,
        &get_active_validator_indices(state, get_current_epoch(state)),
    )
}

pub fn get_seed<C: Config>(
    state: &BeaconState<C>,
    epoch: Epoch,
    domain_type: DomainType,
) -> Result<H256, Error> {
    let lookahead_epoch =
        epoch + C::EpochsPerHistoricalVector::to_u64() - C::min_seed_lookahead() - 1;
    let mix = get_randao_mix(state, lookahead_epoch)?;

    let mut preimage = int_to_bytes(u64::from(domain_type), 4);
    preimage.append(&mut int_to_bytes(epoch, 8));
    preimage.extend_from_slice(mix.as_ref());

    Ok(H256::from_slice(&hash(&preimage)))
}

pub fn get_committee_count_at_slot<C: Config>(
    state: &BeaconState<C>,
    slot: Slot,
) -> Result<u64, Error> {
    let epoch = compute_epoch_at_slot::<C>(slot);
    let active = get_active_validator_indices(state, epoch).len() as u64;

    let committees_per_slot = cmp::min(
        C::max_committees_per_slot(),
        active / C::SlotsPerEpoch::to_u64() / C::target_committee_size(),
    );

    Ok(cmp::max(1, committees_per_slot))
}

pub fn get_beacon_committee<C: Config>(
    state: &BeaconState<C>,
    slot: Slot,
    index: CommitteeIndex,
) -> Result<Vec<ValidatorIndex>, Error> {
    let epoch = compute_epoch_at_slot::<C>(slot);
    let committees_per_slot = get_committee_count_at_slot(state, slot)?;
    let seed = get_seed(state, epoch, C::domain_attestation())?;

    compute_committee::<C>(
        &get_active_validator_indices(state, epoch),
        &seed,
        (slot % C::SlotsPerEpoch::to_u64()) * committees_per_slot + index,
        committees_per_slot * C::SlotsPerEpoch::to_u64(),
    )
}

pub fn get_attesting_indices<C: Config>(
    state: &BeaconState<C>,
    data: &AttestationData,
    bits: &BitList<C::MaxValidatorsPerCommittee>,
) -> Result<Vec<ValidatorIndex>, Error> {
    let committee = get_beacon_committee(state, data.slot, data.index)?;

    if bits.len() != committee.len() {
        return Err(Error::AttestationBitsInvalid);
    }

    let mut attesting = Vec::new();
    for (position, validator_index) in committee.into_iter().enumerate() {
        if bits.get(position).map_err(|_| Error::AttestationBitsInvalid)? {
            attesting.push(validator_index);
        }
    }
    Ok(attesting)
}
