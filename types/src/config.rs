use core::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};
use typenum::marker_traits::Unsigned;

use crate::consts::FAR_FUTURE_EPOCH;
use crate::primitives::{DomainType, Epoch, Gwei, Slot, UnixSeconds};

/// Protocol constants, threaded through every container and function that
/// needs them as an ordinary type parameter. Lengths that appear in SSZ list
/// types must be known at compile time and are expressed with `typenum`;
/// everything else is a plain function with a mainnet default.
///
/// There is deliberately no way to override a value at runtime. Tests that
/// need small committees or short epochs use `MinimalConfig`.
pub trait Config:
    Clone + Copy + PartialEq + Eq + Debug + Default + Send + Sync + Serialize + DeserializeOwned + 'static
{
    type EpochsPerHistoricalVector: Unsigned + Clone + Eq + Debug;
    type EpochsPerSlashingsVector: Unsigned + Clone + Eq + Debug;
    type HistoricalRootsLimit: Unsigned + Clone + Eq + Debug;
    type MaxAttestationsPerEpoch: Unsigned + Clone + Eq + Debug;
    type MaxValidatorsPerCommittee: Unsigned + Clone + Eq + Debug;
    type SlotsPerEpoch: Unsigned + Clone + Eq + Debug;
    type SlotsPerEth1VotingPeriod: Unsigned + Clone + Eq + Debug;
    type SlotsPerHistoricalRoot: Unsigned + Clone + Eq + Debug;
    type ValidatorRegistryLimit: Unsigned + Clone + Eq + Debug;

    fn activation_exit_delay() -> u64 {
        4
    }

    fn base_reward_factor() -> u64 {
        64
    }

    fn base_rewards_per_epoch() -> u64 {
        4
    }

    fn churn_limit_quotient() -> u64 {
        65_536
    }

    fn domain_attestation() -> DomainType {
        1
    }

    fn domain_beacon_proposer() -> DomainType {
        0
    }

    fn effective_balance_increment() -> Gwei {
        1_000_000_000
    }

    fn ejection_balance() -> Gwei {
        16_000_000_000
    }

    fn far_future_epoch() -> Epoch {
        FAR_FUTURE_EPOCH
    }

    fn genesis_epoch() -> Epoch {
        0
    }

    fn inactivity_penalty_quotient() -> u64 {
        33_554_432
    }

    fn max_committees_per_slot() -> u64 {
        64
    }

    fn max_effective_balance() -> Gwei {
        32_000_000_000
    }

    fn min_attestation_inclusion_delay() -> Slot {
        1
    }

    fn min_epochs_to_inactivity_penalty() -> u64 {
        4
    }

    fn min_per_epoch_churn_limit() -> u64 {
        4
    }

    fn min_seed_lookahead() -> u64 {
        1
    }

    fn min_slashing_penalty_quotient() -> u64 {
        32
    }

    fn min_validator_withdrawability_delay() -> u64 {
        256
    }

    fn proposer_reward_quotient() -> u64 {
        8
    }

    fn seconds_per_slot() -> UnixSeconds {
        12
    }

    fn shuffle_round_count() -> u64 {
        90
    }

    fn target_committee_size() -> u64 {
        128
    }

    fn whistleblower_reward_quotient() -> u64 {
        512
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, serde::Deserialize, Serialize)]
pub struct MainnetConfig;

impl Config for MainnetConfig {
    type EpochsPerHistoricalVector = typenum::U65536;
    type EpochsPerSlashingsVector = typenum::U8192;
    type HistoricalRootsLimit = typenum::U16777216;
    type MaxAttestationsPerEpoch = typenum::U4096;
    type MaxValidatorsPerCommittee = typenum::U2048;
    type SlotsPerEpoch = typenum::U32;
    type SlotsPerEth1VotingPeriod = typenum::U1024;
    type SlotsPerHistoricalRoot = typenum::U8192;
    type ValidatorRegistryLimit = typenum::U1099511627776;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, serde::Deserialize, Serialize)]
pub struct MinimalConfig;

impl Config for MinimalConfig {
    type EpochsPerHistoricalVector = typenum::U64;
    type EpochsPerSlashingsVector = typenum::U64;
    type HistoricalRootsLimit = typenum::U16777216;
    type MaxAttestationsPerEpoch = typenum::U1024;
    type MaxValidatorsPerCommittee = typenum::U2048;
    type SlotsPerEpoch = typenum::U8;
    type SlotsPerEth1VotingPeriod = typenum::U16;
    type SlotsPerHistoricalRoot = typenum::U64;
    type ValidatorRegistryLimit = typenum::U1099511627776;

    fn max_committees_per_slot() -> u64 {
        4
    }

    fn seconds_per_slot() -> UnixSeconds {
        6
    }

    fn shuffle_round_count() -> u64 {
        10
    }

    fn target_committee_size() -> u64 {
        4
    }
}
