use std::cmp::max;
use std::convert::TryFrom;

use typenum::marker_traits::Unsigned;
use types::config::Config;
use types::primitives::*;

use crate::{
    crypto::hash,
    error::Error,
    math::{bytes_to_int, int_to_bytes},
};

pub fn compute_epoch_at_slot<C: Config>(slot: Slot) -> Epoch {
    slot / C::SlotsPerEpoch::to_u64()
}

pub fn compute_start_slot_at_epoch<C: Config>(epoch: Epoch) -> Slot {
    epoch * C::SlotsPerEpoch::to_u64()
}

pub fn compute_activation_exit_epoch<C: Config>(epoch: Epoch) -> Epoch {
    epoch + 1 + C::activation_exit_delay()
}

pub fn compute_shuffled_index<C: Config>(
    mut index: ValidatorIndex,
    index_count: u64,
    seed: H256,
) -> Result<ValidatorIndex, Error> {
    if index >= index_count {
        return Err(Error::IndexOutOfRange);
    }
    for current_round in 0..C::shuffle_round_count() {
        let pivot = bytes_to_int(hash_seed_current_round(&seed[..], current_round)) % index_count;
        let flip = (pivot + index_count - index) % index_count;
        let position = max(index, flip);
        let source = hash_seed_current_round_position(&seed[..], current_round, position);
        let byte = source[((position % 256) / 8) as usize];
        let bit = (byte >> (position % 8)) % 2;
        index = if bit == 0 { index } else { flip };
    }
    Ok(index)
}

fn hash_seed_current_round(seed: &[u8], current_round: u64) -> [u8; 8] {
    let mut seed = seed.to_vec();
    seed.append(&mut int_to_bytes(current_round, 1));
    let mut bytes = [0; 8];
    bytes.copy_from_slice(&hash(&seed[..])[..8]);
    bytes
}

fn hash_seed_current_round_position(seed: &[u8], current_round: u64, position: u64) -> Vec<u8> {
    let mut seed = seed.to_vec();
    seed.append(&mut int_to_bytes(current_round, 1));
    seed.append(&mut int_to_bytes(position / 256, 4));
    hash(&seed[..])
}

pub fn compute_committee<C: Config>(
    indices: &[ValidatorIndex],
    seed: &H256,
    index: u64,
    count: u64,
) -> Result<Vec<ValidatorIndex>, Error> {
    let total = indices.len() as u64;
    let start = total * index / count;
    let end = total * (index + 1) / count;

    let mut committee = Vec::with_capacity((end - start) as usize);

    for i in start..end {
        let shuffled = compute_shuffled_index::<C>(i, total, *seed)?;
        let position = usize::try_from(shuffled).map_err(|_| Error::ConversionToUsize)?;
        committee.push(indices[position]);
    }

    Ok(committee)
}
