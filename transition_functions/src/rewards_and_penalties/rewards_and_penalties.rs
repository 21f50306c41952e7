use std::cmp;

use helper_functions::{
    beacon_state_accessors::{get_current_epoch, get_previous_epoch},
    math::integer_squareroot,
};
use types::{
    beacon_state::BeaconState,
    config::Config,
    primitives::{Gwei, ValidatorIndex},
};

use crate::error::Error;
use crate::precompute::{BalanceTotals, ValidatorSummary};

/// Per-validator reward unit. The divisor is the integer square root of the
/// active balance, floored by the `BalanceTotals` accessor so it can never be
/// zero.
pub fn get_base_reward<C: Config>(effective_balance: Gwei, totals: &BalanceTotals) -> Gwei {
    effective_balance * C::base_reward_factor()
        / integer_squareroot(totals.active_current_epoch())
        / C::base_rewards_per_epoch()
}

/// Applies the attestation deltas to the balance vector. The deltas are
/// computed against a snapshot and written back in one step; observers see
/// either the pre- or the post-transition balances.
pub fn process_rewards_and_penalties<C: Config>(
    state: &mut BeaconState<C>,
    totals: &BalanceTotals,
    summaries: &mut [ValidatorSummary],
) -> Result<(), Error> {
    if get_current_epoch(state) == C::genesis_epoch() {
        return Ok(());
    }

    if summaries.len() != state.num_validators() {
        return Err(Error::RegistryLengthMismatch {
            summaries: summaries.len(),
            validators: state.num_validators(),
        });
    }

    let (rewards, penalties) = get_attestation_deltas(state, totals, summaries)?;

    let mut balances = state.balances().to_vec();
    for (index, summary) in summaries.iter_mut().enumerate() {
        summary.before_epoch_transition_balance = balances[index];
        balances[index] = balances[index]
            .saturating_add(rewards[index])
            .saturating_sub(penalties[index]);
        summary.after_epoch_transition_balance = balances[index];
    }

    state.set_balances(balances)?;
    Ok(())
}

/// Non-negative reward and penalty per validator: the three flag awards, the
/// inclusion-delay award with its proposer cut, and the inactivity penalties.
pub fn get_attestation_deltas<C: Config>(
    state: &BeaconState<C>,
    totals: &BalanceTotals,
    summaries: &[ValidatorSummary],
) -> Result<(Vec<Gwei>, Vec<Gwei>), Error> {
    let previous_epoch = get_previous_epoch(state);
    let finality_delay = previous_epoch.saturating_sub(state.finalized_checkpoint.epoch);
    let in_inactivity_leak = finality_delay > C::min_epochs_to_inactivity_penalty();

    let mut rewards = vec![0 as Gwei; summaries.len()];
    let mut penalties = vec![0 as Gwei; summaries.len()];

    for (index, summary) in summaries.iter().enumerate() {
        if !summary.is_eligible {
            continue;
        }

        let base_reward = get_base_reward::<C>(summary.current_epoch_effective_balance, totals);
        let proposer_reward = base_reward / C::proposer_reward_quotient();

        let flags = [
            (summary.is_prev_epoch_attester, totals.prev_epoch_attested()),
            (
                summary.is_prev_epoch_target_attester,
                totals.prev_epoch_target_attested(),
            ),
            (
                summary.is_prev_epoch_head_attester,
                totals.prev_epoch_head_attested(),
            ),
        ];

        for (attested, attested_total) in flags.iter().copied() {
            if attested && !summary.is_slashed {
                if in_inactivity_leak {
                    // The leak penalty below cancels this exactly, so optimal
                    // participation nets zero rather than negative.
                    rewards[index] += base_reward;
                } else {
                    let increment = C::effective_balance_increment();
                    rewards[index] += base_reward * (attested_total / increment)
                        / (totals.active_current_epoch() / increment);
                }
            } else {
                penalties[index] += base_reward;
            }
        }

        if summary.is_prev_epoch_attester && !summary.is_slashed {
            let proposer_index = summary.proposer_index;
            if proposer_index as usize >= summaries.len() {
                return Err(Error::ProposerOutOfRange {
                    index: proposer_index as ValidatorIndex,
                    validators: summaries.len(),
                });
            }
            let max_attester_reward = base_reward - proposer_reward;
            // Valid pending attestations carry an inclusion delay of at
            // least one slot.
            rewards[index] += max_attester_reward / cmp::max(summary.inclusion_distance, 1);
            rewards[proposer_index as usize] += proposer_reward;
        }

        if in_inactivity_leak {
            penalties[index] += C::base_rewards_per_epoch() * base_reward - proposer_reward;
            if summary.is_slashed || !summary.is_prev_epoch_target_attester {
                penalties[index] += summary.current_epoch_effective_balance * finality_delay
                    / C::inactivity_penalty_quotient();
            }
        }
    }

    Ok((rewards, penalties))
}
