pub mod rewards_and_penalties;

pub use self::rewards_and_penalties::{get_attestation_deltas, get_base_reward, process_rewards_and_penalties};
