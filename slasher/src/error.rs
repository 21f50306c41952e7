use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("stored chunk holds {len} bytes, the configured layout needs {expected}")]
    ChunkCorrupt { len: usize, expected: usize },
    #[error("attester record holds {len} bytes instead of {expected}")]
    AttesterRecordCorrupt { len: usize, expected: usize },
    #[error("proposal record holds {len} bytes instead of {expected}")]
    ProposalRecordCorrupt { len: usize, expected: usize },
    #[error("chunk cell {0} is out of bounds")]
    CellIndexOutOfBounds(usize),
    #[error("epoch distance {distance} does not fit the span representation")]
    DistanceTooLarge { distance: u64 },
    #[error("epoch distance underflowed")]
    DistanceCalculationOverflow,
    #[error("invalid slasher configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("stored artefact failed to decode: {0:?}")]
    Decode(ssz::DecodeError),
    #[error("storage backend failed (retryable: {retryable}): {message}")]
    Storage { retryable: bool, message: String },
}

impl Error {
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Storage { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

impl From<ssz::DecodeError> for Error {
    fn from(error: ssz::DecodeError) -> Self {
        Error::Decode(error)
    }
}
