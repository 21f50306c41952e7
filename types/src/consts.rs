pub use crate::primitives::{Epoch, Slot};

pub const BASE_REWARDS_PER_EPOCH: u64 = 4;
pub const FAR_FUTURE_EPOCH: Epoch = u64::max_value();
pub const GENESIS_EPOCH: Epoch = 0;
pub const GENESIS_SLOT: Slot = 0;
pub const JUSTIFICATION_BITS_LENGTH: usize = 4;

pub type JustificationBitsLength = typenum::U4;
