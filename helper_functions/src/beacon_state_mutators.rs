use std::cmp;
use std::convert::TryFrom;

use types::{beacon_state::BeaconState, config::Config, primitives::*};

use crate::{
    beacon_state_accessors::{get_current_epoch, get_validator_churn_limit},
    error::Error,
    misc::compute_activation_exit_epoch,
};

pub fn increase_balance<C: Config>(
    state: &mut BeaconState<C>,
    index: ValidatorIndex,
    delta: Gwei,
) -> Result<(), Error> {
    match usize::try_from(index) {
        Err(_err) => Err(Error::IndexOutOfRange),
        Ok(id) => {
            state.balances[id] = state.balances[id].saturating_add(delta);
            Ok(())
        }
    }
}

pub fn decrease_balance<C: Config>(
    state: &mut BeaconState<C>,
    index: ValidatorIndex,
    delta: Gwei,
) -> Result<(), Error> {
    match usize::try_from(index) {
        Err(_err) => Err(Error::IndexOutOfRange),
        Ok(id) => {
            state.balances[id] = state.balances[id].saturating_sub(delta);
            Ok(())
        }
    }
}

pub fn initiate_validator_exit<C: Config>(
    state: &mut BeaconState<C>,
    index: ValidatorIndex,
) -> Result<(), Error> {
    let id = usize::try_from(index).map_err(|_| Error::IndexOutOfRange)?;
    if id >= state.validators.len() {
        return Err(Error::IndexOutOfRange);
    }

    if state.validators[id].exit_epoch != C::far_future_epoch() {
        return Err(Error::ValidatorExitAlreadyInitiated);
    }

    // Exit epochs form a queue bounded by the churn limit.
    let mut exit_queue_epoch = state
        .validators
        .iter()
        .map(|validator| validator.exit_epoch)
        .filter(|exit_epoch| *exit_epoch != C::far_future_epoch())
        .fold(
            compute_activation_exit_epoch::<C>(get_current_epoch(state)),
            cmp::max,
        );

    let exit_queue_churn = state
        .validators
        .iter()
        .filter(|validator| validator.exit_epoch == exit_queue_epoch)
        .count() as u64;
    if exit_queue_churn >= get_validator_churn_limit(state) {
        exit_queue_epoch += 1;
    }

    let validator = &mut state.validators[id];
    validator.exit_epoch = exit_queue_epoch;
    validator.withdrawable_epoch = exit_queue_epoch + C::min_validator_withdrawability_delay();

    Ok(())
}
