pub mod precompute;

pub use self::precompute::{precompute, BalanceTotals, ValidatorSummary};
