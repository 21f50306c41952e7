use thiserror::Error;
use types::primitives::ValidatorIndex;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("precomputed summaries cover {summaries} validators, registry holds {validators}")]
    RegistryLengthMismatch { summaries: usize, validators: usize },
    #[error("summary names proposer {index} but the registry holds {validators} validators")]
    ProposerOutOfRange {
        index: ValidatorIndex,
        validators: usize,
    },
    #[error("justification bit index out of bounds")]
    JustificationBitsOutOfBounds,
    #[error("helper function failed: {0:?}")]
    Helper(helper_functions::Error),
    #[error("beacon state access failed: {0:?}")]
    BeaconState(types::BeaconStateError),
}

impl From<helper_functions::Error> for Error {
    fn from(error: helper_functions::Error) -> Self {
        Error::Helper(error)
    }
}

impl From<types::BeaconStateError> for Error {
    fn from(error: types::BeaconStateError) -> Self {
        Error::BeaconState(error)
    }
}
