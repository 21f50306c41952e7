use helper_functions::beacon_state_accessors::{
    get_block_root, get_current_epoch, get_previous_epoch,
};
use types::{beacon_state::BeaconState, config::Config, types::Checkpoint};

use crate::error::Error;
use crate::precompute::BalanceTotals;

/// Updates the justification bits and the justified/finalized checkpoints
/// from the target-attested balance totals. Supermajority is two thirds of
/// the active balance.
pub fn process_justification_and_finalization<C: Config>(
    state: &mut BeaconState<C>,
    totals: &BalanceTotals,
) -> Result<(), Error> {
    let current_epoch = get_current_epoch(state);
    if current_epoch <= C::genesis_epoch() + 1 {
        return Ok(());
    }

    let previous_epoch = get_previous_epoch(state);
    let old_previous_justified = state.previous_justified_checkpoint;
    let old_current_justified = state.current_justified_checkpoint;

    // Shift the justification bits; bit 0 is the newest epoch.
    state.previous_justified_checkpoint = state.current_justified_checkpoint;
    let bits: Vec<bool> = (0..state.justification_bits.len())
        .map(|i| state.justification_bits.get(i).unwrap_or(false))
        .collect();
    for i in (1..bits.len()).rev() {
        set_bit(state, i, bits[i - 1])?;
    }
    set_bit(state, 0, false)?;

    if totals.prev_epoch_target_attested() * 3 >= totals.active_prev_epoch() * 2 {
        state.current_justified_checkpoint = Checkpoint {
            epoch: previous_epoch,
            root: get_block_root(state, previous_epoch)?,
        };
        set_bit(state, 1, true)?;
    }
    if totals.current_epoch_target_attested() * 3 >= totals.active_current_epoch() * 2 {
        state.current_justified_checkpoint = Checkpoint {
            epoch: current_epoch,
            root: get_block_root(state, current_epoch)?,
        };
        set_bit(state, 0, true)?;
    }

    let bit = |i: usize| state.justification_bits.get(i).unwrap_or(false);

    // The 2nd/3rd/4th most recent epochs are justified, anchored at the right
    // distance from the current epoch.
    if bit(1) && bit(2) && bit(3) && old_previous_justified.epoch + 3 == current_epoch {
        state.finalized_checkpoint = old_previous_justified;
    }
    if bit(1) && bit(2) && old_previous_justified.epoch + 2 == current_epoch {
        state.finalized_checkpoint = old_previous_justified;
    }
    if bit(0) && bit(1) && bit(2) && old_current_justified.epoch + 2 == current_epoch {
        state.finalized_checkpoint = old_current_justified;
    }
    if bit(0) && bit(1) && old_current_justified.epoch + 1 == current_epoch {
        state.finalized_checkpoint = old_current_justified;
    }

    Ok(())
}

fn set_bit<C: Config>(state: &mut BeaconState<C>, index: usize, value: bool) -> Result<(), Error> {
    state
        .justification_bits
        .set(index, value)
        .map_err(|_| Error::JustificationBitsOutOfBounds)
}
