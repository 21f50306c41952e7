use std::cmp;
use std::convert::TryFrom;

use helper_functions::{
    beacon_state_accessors::{
        get_attesting_indices, get_block_root, get_block_root_at_slot, get_current_epoch,
        get_previous_epoch,
    },
    predicates::is_active_validator,
};
use types::{
    beacon_state::BeaconState,
    config::Config,
    consts::FAR_FUTURE_EPOCH,
    primitives::{Epoch, Gwei, Slot, ValidatorIndex},
    types::PendingAttestation,
};

use crate::error::Error;

/// Everything the reward engine needs to know about one validator for one
/// epoch transition. Built once per transition, never persisted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ValidatorSummary {
    pub is_slashed: bool,
    pub is_eligible: bool,
    pub is_withdrawable_current_epoch: bool,
    pub is_active_current_epoch: bool,
    pub is_active_prev_epoch: bool,
    pub is_prev_epoch_attester: bool,
    pub is_prev_epoch_target_attester: bool,
    pub is_prev_epoch_head_attester: bool,
    pub is_current_epoch_target_attester: bool,
    pub current_epoch_effective_balance: Gwei,
    pub inclusion_slot: Slot,
    pub inclusion_distance: Slot,
    pub proposer_index: ValidatorIndex,
    pub before_epoch_transition_balance: Gwei,
    pub after_epoch_transition_balance: Gwei,
}

impl Default for ValidatorSummary {
    fn default() -> Self {
        Self {
            is_slashed: false,
            is_eligible: false,
            is_withdrawable_current_epoch: false,
            is_active_current_epoch: false,
            is_active_prev_epoch: false,
            is_prev_epoch_attester: false,
            is_prev_epoch_target_attester: false,
            is_prev_epoch_head_attester: false,
            is_current_epoch_target_attester: false,
            current_epoch_effective_balance: 0,
            inclusion_slot: FAR_FUTURE_EPOCH,
            inclusion_distance: FAR_FUTURE_EPOCH,
            proposer_index: 0,
            before_epoch_transition_balance: 0,
            after_epoch_transition_balance: 0,
        }
    }
}

/// Effective-balance sums over the six participation categories. The raw sums
/// are private; the accessors floor at `EFFECTIVE_BALANCE_INCREMENT` so they
/// are always usable as divisors.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct BalanceTotals {
    pub(crate) effective_balance_increment: Gwei,
    pub(crate) active_current_epoch: Gwei,
    pub(crate) active_prev_epoch: Gwei,
    pub(crate) current_epoch_target_attested: Gwei,
    pub(crate) prev_epoch_attested: Gwei,
    pub(crate) prev_epoch_target_attested: Gwei,
    pub(crate) prev_epoch_head_attested: Gwei,
}

impl BalanceTotals {
    pub fn new<C: Config>() -> Self {
        Self {
            effective_balance_increment: C::effective_balance_increment(),
            ..Self::default()
        }
    }

    pub fn active_current_epoch(&self) -> Gwei {
        cmp::max(self.active_current_epoch, self.effective_balance_increment)
    }

    pub fn active_prev_epoch(&self) -> Gwei {
        cmp::max(self.active_prev_epoch, self.effective_balance_increment)
    }

    pub fn current_epoch_target_attested(&self) -> Gwei {
        cmp::max(
            self.current_epoch_target_attested,
            self.effective_balance_increment,
        )
    }

    pub fn prev_epoch_attested(&self) -> Gwei {
        cmp::max(self.prev_epoch_attested, self.effective_balance_increment)
    }

    pub fn prev_epoch_target_attested(&self) -> Gwei {
        cmp::max(
            self.prev_epoch_target_attested,
            self.effective_balance_increment,
        )
    }

    pub fn prev_epoch_head_attested(&self) -> Gwei {
        cmp::max(self.prev_epoch_head_attested, self.effective_balance_increment)
    }
}

/// One sweep over the registry and one sweep over the pending attestations of
/// both epochs, producing the per-validator summaries and the category sums.
pub fn precompute<C: Config>(
    state: &BeaconState<C>,
) -> Result<(Vec<ValidatorSummary>, BalanceTotals), Error> {
    let current_epoch = get_current_epoch(state);
    let previous_epoch = get_previous_epoch(state);

    let mut totals = BalanceTotals::new::<C>();
    let mut summaries = Vec::with_capacity(state.num_validators());

    for validator in state.validators.iter() {
        let summary = ValidatorSummary {
            is_slashed: validator.slashed,
            is_eligible: is_active_validator(validator, previous_epoch)
                || (validator.slashed && previous_epoch + 1 < validator.withdrawable_epoch),
            is_withdrawable_current_epoch: current_epoch >= validator.withdrawable_epoch,
            is_active_current_epoch: is_active_validator(validator, current_epoch),
            is_active_prev_epoch: is_active_validator(validator, previous_epoch),
            current_epoch_effective_balance: validator.effective_balance,
            ..ValidatorSummary::default()
        };

        if summary.is_active_current_epoch {
            totals.active_current_epoch += validator.effective_balance;
        }
        if summary.is_active_prev_epoch {
            totals.active_prev_epoch += validator.effective_balance;
        }

        summaries.push(summary);
    }

    let pending = state
        .previous_epoch_attestations
        .iter()
        .chain(state.current_epoch_attestations.iter());

    for attestation in pending {
        process_pending_attestation(
            state,
            attestation,
            current_epoch,
            previous_epoch,
            &mut summaries,
        )?;
    }

    for summary in &summaries {
        if summary.is_slashed {
            continue;
        }
        let effective_balance = summary.current_epoch_effective_balance;
        if summary.is_current_epoch_target_attester {
            totals.current_epoch_target_attested += effective_balance;
        }
        if summary.is_prev_epoch_attester {
            totals.prev_epoch_attested += effective_balance;
        }
        if summary.is_prev_epoch_target_attester {
            totals.prev_epoch_target_attested += effective_balance;
        }
        if summary.is_prev_epoch_head_attester {
            totals.prev_epoch_head_attested += effective_balance;
        }
    }

    Ok((summaries, totals))
}

fn process_pending_attestation<C: Config>(
    state: &BeaconState<C>,
    attestation: &PendingAttestation<C>,
    current_epoch: Epoch,
    previous_epoch: Epoch,
    summaries: &mut [ValidatorSummary],
) -> Result<(), Error> {
    let data = &attestation.data;

    let is_current_target = data.target.epoch == current_epoch;
    let is_previous = data.target.epoch == previous_epoch;
    if !is_current_target && !is_previous {
        return Ok(());
    }

    let matches_target =
        is_previous && get_block_root(state, previous_epoch).ok() == Some(data.target.root);
    let matches_head = is_previous
        && get_block_root_at_slot(state, data.slot).ok() == Some(data.beacon_block_root);

    let inclusion_slot = data.slot + attestation.inclusion_delay;

    for validator_index in get_attesting_indices(state, data, &attestation.aggregation_bits)? {
        let id = usize::try_from(validator_index)
            .map_err(|_| helper_functions::Error::ConversionToUsize)?;
        let summary = summaries
            .get_mut(id)
            .ok_or(helper_functions::Error::IndexOutOfRange)?;

        if is_current_target {
            summary.is_current_epoch_target_attester = true;
        }

        if is_previous {
            summary.is_prev_epoch_attester = true;
            if matches_target {
                summary.is_prev_epoch_target_attester = true;
            }
            if matches_head {
                summary.is_prev_epoch_head_attester = true;
            }
            // Strictly lower only: on a tie the earliest-inserted
            // attestation keeps the proposer credit.
            if inclusion_slot < summary.inclusion_slot {
                summary.inclusion_slot = inclusion_slot;
                summary.inclusion_distance = attestation.inclusion_delay;
                summary.proposer_index = attestation.proposer_index;
            }
        }
    }

    Ok(())
}
