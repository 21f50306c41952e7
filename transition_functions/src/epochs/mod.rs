pub mod process_epoch;

pub use self::process_epoch::{process_epoch, EpochSummary};
