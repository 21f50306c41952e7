use types::config::Config as ChainConfig;
use types::primitives::{Epoch, ValidatorIndex};
use types::types::IndexedAttestation;

use crate::error::Error;

pub const DEFAULT_HISTORY_LENGTH: usize = 4096;
pub const DEFAULT_CHUNK_SIZE: usize = 16;
pub const DEFAULT_VALIDATOR_CHUNK_SIZE: usize = 256;
pub const DEFAULT_CHUNK_CACHE_SIZE: usize = 64;

/// Runtime indexing parameters of the chunked history.
///
/// Let
///     H = history_length
///     C = chunk_size
///     K = validator_chunk_size
///
/// Then
///
/// `chunk_index` numbers C-epoch columns of the 2D span matrix,
/// `validator_chunk_index` numbers K-validator rows,
/// `chunk_offset` in [0..C) is the epoch offset of a cell within a chunk,
/// `validator_offset` in [0..K) is the validator offset of a cell.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Config {
    pub history_length: usize,
    pub chunk_size: usize,
    pub validator_chunk_size: usize,
    pub chunk_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_length: DEFAULT_HISTORY_LENGTH,
            chunk_size: DEFAULT_CHUNK_SIZE,
            validator_chunk_size: DEFAULT_VALIDATOR_CHUNK_SIZE,
            chunk_cache_size: DEFAULT_CHUNK_CACHE_SIZE,
        }
    }
}

impl Config {
    pub fn validate(self) -> Result<Self, Error> {
        if self.chunk_size == 0 || self.validator_chunk_size == 0 || self.history_length == 0 {
            return Err(Error::InvalidConfig(
                "chunk size, validator chunk size and history length must be non-zero",
            ));
        }
        if self.history_length % self.chunk_size != 0 {
            return Err(Error::InvalidConfig(
                "history length must be a multiple of the chunk size",
            ));
        }
        if self.chunk_cache_size == 0 {
            return Err(Error::InvalidConfig("chunk cache must hold at least one chunk"));
        }
        Ok(self)
    }

    pub fn chunk_index(&self, epoch: Epoch) -> usize {
        (epoch / self.chunk_size as u64) as usize
    }

    pub fn validator_chunk_index(&self, validator_index: ValidatorIndex) -> usize {
        (validator_index / self.validator_chunk_size as u64) as usize
    }

    pub fn chunk_offset(&self, epoch: Epoch) -> usize {
        (epoch % self.chunk_size as u64) as usize
    }

    pub fn validator_offset(&self, validator_index: ValidatorIndex) -> usize {
        (validator_index % self.validator_chunk_size as u64) as usize
    }

    /// Cells are laid out validator-major: all C epochs of one validator are
    /// contiguous.
    pub fn cell_index(&self, validator_offset: usize, chunk_offset: usize) -> usize {
        validator_offset * self.chunk_size + chunk_offset
    }

    pub fn chunk_byte_len(&self) -> usize {
        2 * self.chunk_size * self.validator_chunk_size
    }

    /// Oldest epoch still covered by the history window.
    pub fn earliest_tracked_epoch(&self, current_epoch: Epoch) -> Epoch {
        current_epoch.saturating_sub(self.history_length as u64 - 1)
    }

    pub fn attesting_validators_for_chunk<'a, C: ChainConfig>(
        &'a self,
        attestation: &'a IndexedAttestation<C>,
        validator_chunk_index: usize,
    ) -> impl Iterator<Item = ValidatorIndex> + 'a {
        attestation
            .attesting_indices
            .iter()
            .copied()
            .filter(move |index| self.validator_chunk_index(*index) == validator_chunk_index)
    }

    pub fn validator_chunk_indices<C: ChainConfig>(
        &self,
        attestation: &IndexedAttestation<C>,
    ) -> Vec<usize> {
        let mut indices: Vec<usize> = attestation
            .attesting_indices
            .iter()
            .map(|index| self.validator_chunk_index(*index))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
