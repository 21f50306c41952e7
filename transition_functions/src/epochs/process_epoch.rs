use std::{cmp, mem};

use helper_functions::{
    beacon_state_accessors::{
        get_current_epoch, get_randao_mix, get_total_active_balance, get_validator_churn_limit,
    },
    beacon_state_mutators::{decrease_balance, initiate_validator_exit},
    crypto::hash_tree_root,
    misc::compute_activation_exit_epoch,
    predicates::is_active_validator,
};
use itertools::{Either, Itertools};
use log::debug;
use ssz_types::VariableList;
use typenum::Unsigned;
use types::{
    beacon_state::BeaconState,
    config::Config,
    primitives::{Epoch, Gwei, ValidatorIndex},
    types::{HistoricalBatch, Validator},
};

use crate::error::Error;
use crate::justification::process_justification_and_finalization;
use crate::precompute::{precompute, BalanceTotals, ValidatorSummary};
use crate::rewards_and_penalties::process_rewards_and_penalties;

/// Output of one epoch transition, handed back for logging and inspection.
pub struct EpochSummary {
    pub summaries: Vec<ValidatorSummary>,
    pub totals: BalanceTotals,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Idle,
    Precomputing,
    RewardingPenalising,
    BalancesWritten,
}

/// Runs the whole epoch transition in order. Any error leaves the caller's
/// state exactly as it was handed in only for the failing sub-step's scope;
/// the balance write in particular happens in one step or not at all.
pub fn process_epoch<C: Config>(state: &mut BeaconState<C>) -> Result<EpochSummary, Error> {
    let mut phase = Phase::Idle;
    let advance = |phase: &mut Phase, next: Phase| {
        debug!("epoch transition phase {:?} -> {:?}", phase, next);
        *phase = next;
    };

    advance(&mut phase, Phase::Precomputing);
    let (mut summaries, totals) = precompute(state)?;

    process_justification_and_finalization(state, &totals)?;

    advance(&mut phase, Phase::RewardingPenalising);
    process_rewards_and_penalties(state, &totals, &mut summaries)?;
    advance(&mut phase, Phase::BalancesWritten);

    process_registry_updates(state)?;
    process_slashings(state)?;
    process_final_updates(state)?;

    advance(&mut phase, Phase::Idle);
    Ok(EpochSummary { summaries, totals })
}

fn process_registry_updates<C: Config>(state: &mut BeaconState<C>) -> Result<(), Error> {
    let current_epoch = get_current_epoch(state);
    let churn_limit = get_validator_churn_limit(state);

    let is_eligible = |validator: &Validator| {
        validator.activation_eligibility_epoch == C::far_future_epoch()
            && validator.effective_balance == C::max_effective_balance()
    };

    let is_ejectable = |validator: &Validator| {
        is_active_validator(validator, current_epoch)
            && validator.effective_balance <= C::ejection_balance()
            && validator.exit_epoch == C::far_future_epoch()
    };

    let (eligible, ejectable): (Vec<_>, Vec<_>) = state
        .validators
        .iter()
        .enumerate()
        .filter(|(_, validator)| is_eligible(validator) || is_ejectable(validator))
        .partition_map(|(index, validator)| {
            if is_eligible(validator) {
                Either::Left(index)
            } else {
                Either::Right(index)
            }
        });

    for index in eligible {
        state.validators[index].activation_eligibility_epoch = current_epoch;
    }
    for index in ejectable {
        initiate_validator_exit(state, index as ValidatorIndex)?;
    }

    // Queue validators eligible for activation and not dequeued for
    // activation prior to the finalized epoch.
    let activation_queue = state
        .validators
        .iter()
        .enumerate()
        .filter(|(_, validator)| {
            validator.activation_eligibility_epoch != C::far_future_epoch()
                && validator.activation_epoch
                    >= compute_activation_exit_epoch::<C>(state.finalized_checkpoint.epoch)
        })
        .sorted_by_key(|(_, validator)| validator.activation_eligibility_epoch)
        .map(|(index, _)| index)
        .collect_vec();

    // Dequeue up to the churn limit, without resetting set activation epochs.
    let delayed_activation_epoch = compute_activation_exit_epoch::<C>(current_epoch);
    for index in activation_queue.into_iter().take(churn_limit as usize) {
        let validator = &mut state.validators[index];
        if validator.activation_epoch == C::far_future_epoch() {
            validator.activation_epoch = delayed_activation_epoch;
        }
    }

    Ok(())
}

fn process_slashings<C: Config>(state: &mut BeaconState<C>) -> Result<(), Error> {
    let epoch = get_current_epoch(state);
    let total_balance = get_total_active_balance(state)?;
    let slashings_sum = state.slashings.iter().sum::<Gwei>();

    let mut penalties: Vec<(ValidatorIndex, Gwei)> = Vec::new();
    for (index, validator) in state.validators.iter().enumerate() {
        if validator.slashed
            && epoch + C::EpochsPerSlashingsVector::to_u64() / 2 == validator.withdrawable_epoch
        {
            let increment = C::effective_balance_increment();
            let penalty_numerator = validator.effective_balance / increment
                * cmp::min(slashings_sum * 3, total_balance);
            let penalty = penalty_numerator / cmp::max(total_balance, increment) * increment;
            penalties.push((index as ValidatorIndex, penalty));
        }
    }

    for (index, penalty) in penalties {
        decrease_balance(state, index, penalty)?;
    }

    Ok(())
}

fn process_final_updates<C: Config>(state: &mut BeaconState<C>) -> Result<(), Error> {
    let current_epoch = get_current_epoch(state);
    let next_epoch: Epoch = current_epoch + 1;

    // Reset eth1 data votes
    if (state.slot + 1) % C::SlotsPerEth1VotingPeriod::to_u64() == 0 {
        state.eth1_data_votes = VariableList::from(vec![]);
    }

    // Update effective balances with hysteresis
    for (index, validator) in state.validators.iter_mut().enumerate() {
        let balance = state.balances[index];
        let half_increment = C::effective_balance_increment() / 2;
        if balance < validator.effective_balance
            || validator.effective_balance + 3 * half_increment < balance
        {
            validator.effective_balance = cmp::min(
                balance - balance % C::effective_balance_increment(),
                C::max_effective_balance(),
            );
        }
    }

    // Reset slashings
    let slashings_index = (next_epoch % C::EpochsPerSlashingsVector::to_u64()) as usize;
    state.slashings[slashings_index] = 0;

    // Set randao mix
    let mix = get_randao_mix(state, current_epoch)?;
    let mix_index = (next_epoch % C::EpochsPerHistoricalVector::to_u64()) as usize;
    state.randao_mixes[mix_index] = mix;

    // Set historical root accumulator
    let slots_per_historical_root = C::SlotsPerHistoricalRoot::to_u64();
    if next_epoch % (slots_per_historical_root / C::SlotsPerEpoch::to_u64()) == 0 {
        let historical_batch = HistoricalBatch::<C> {
            block_roots: state.block_roots.clone(),
            state_roots: state.state_roots.clone(),
        };
        state
            .historical_roots
            .push(hash_tree_root(&historical_batch))
            .map_err(|_| types::BeaconStateError::IndexOutOfRange)?;
    }

    // Rotate current/previous epoch attestations
    state.previous_epoch_attestations = mem::replace(
        &mut state.current_epoch_attestations,
        VariableList::from(vec![]),
    );

    Ok(())
}
