use std::collections::{btree_map::Entry, BTreeMap};
use std::convert::TryFrom;

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use types::config::Config as ChainConfig;
use types::primitives::{Epoch, ValidatorIndex};
use types::types::IndexedAttestation;

use crate::config::Config;
use crate::error::Error;
use crate::store::{ChunkStore, KvStore};
use crate::AttesterSlashingStatus;

/// Min-span cells start out at the neutral "unknown" value and only ever
/// decrease; max-span cells start at zero and only ever increase.
pub const NEUTRAL_MIN: u16 = u16::max_value();
pub const NEUTRAL_MAX: u16 = 0;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ChunkKind {
    MinSpan,
    MaxSpan,
}

/// A dense `u16` matrix covering `chunk_size` epochs for
/// `validator_chunk_size` validators, addressed validator-major.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Chunk {
    data: Vec<u16>,
}

impl Chunk {
    pub fn empty(kind: ChunkKind, config: &Config) -> Self {
        let neutral = match kind {
            ChunkKind::MinSpan => NEUTRAL_MIN,
            ChunkKind::MaxSpan => NEUTRAL_MAX,
        };
        Self {
            data: vec![neutral; config.chunk_size * config.validator_chunk_size],
        }
    }

    /// Chunks are persisted as raw little-endian `u16` arrays. A length that
    /// disagrees with the configured layout is a fatal integrity error.
    pub fn from_bytes(bytes: &[u8], config: &Config) -> Result<Self, Error> {
        if bytes.len() != config.chunk_byte_len() {
            return Err(Error::ChunkCorrupt {
                len: bytes.len(),
                expected: config.chunk_byte_len(),
            });
        }
        let mut data = vec![0; bytes.len() / 2];
        LittleEndian::read_u16_into(bytes, &mut data);
        Ok(Self { data })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; self.data.len() * 2];
        LittleEndian::write_u16_into(&self.data, &mut bytes);
        bytes
    }

    pub fn distance(
        &self,
        validator_index: ValidatorIndex,
        epoch: Epoch,
        config: &Config,
    ) -> Result<u16, Error> {
        let cell_index =
            config.cell_index(config.validator_offset(validator_index), config.chunk_offset(epoch));
        self.data
            .get(cell_index)
            .copied()
            .ok_or(Error::CellIndexOutOfBounds(cell_index))
    }

    pub fn set_distance(
        &mut self,
        validator_index: ValidatorIndex,
        epoch: Epoch,
        distance: u16,
        config: &Config,
    ) -> Result<(), Error> {
        let cell_index =
            config.cell_index(config.validator_offset(validator_index), config.chunk_offset(epoch));
        let cell = self
            .data
            .get_mut(cell_index)
            .ok_or(Error::CellIndexOutOfBounds(cell_index))?;
        *cell = distance;
        Ok(())
    }

    /// Distance between two epochs, bounded below the neutral min value so
    /// the sentinel can never be produced by a real attestation.
    pub fn epoch_distance(target: Epoch, base: Epoch) -> Result<u16, Error> {
        let distance = target
            .checked_sub(base)
            .ok_or(Error::DistanceCalculationOverflow)?;
        match u16::try_from(distance) {
            Ok(distance) if distance < NEUTRAL_MIN => Ok(distance),
            _ => Err(Error::DistanceTooLarge { distance }),
        }
    }
}

/// The two span arrays share their chunk walk; only the direction, the
/// comparison and the slashing flavour differ.
pub trait SpanChunk {
    const KIND: ChunkKind;

    fn check<C: ChainConfig, S: KvStore>(
        chunk: &Chunk,
        db: &ChunkStore<S>,
        validator_index: ValidatorIndex,
        attestation: &IndexedAttestation<C>,
    ) -> Result<AttesterSlashingStatus<C>, Error>;

    /// Updates cells of one chunk, returning whether the walk continues into
    /// the neighbouring chunk.
    fn update(
        chunk: &mut Chunk,
        chunk_index: usize,
        validator_index: ValidatorIndex,
        start_epoch: Epoch,
        new_target_epoch: Epoch,
        current_epoch: Epoch,
        config: &Config,
    ) -> Result<bool, Error>;

    fn first_start_epoch(source_epoch: Epoch, current_epoch: Epoch) -> Option<Epoch>;

    fn next_chunk_index_and_start_epoch(
        chunk_index: usize,
        start_epoch: Epoch,
        config: &Config,
    ) -> (usize, Epoch);
}

pub struct MinSpan;

impl SpanChunk for MinSpan {
    const KIND: ChunkKind = ChunkKind::MinSpan;

    fn check<C: ChainConfig, S: KvStore>(
        chunk: &Chunk,
        db: &ChunkStore<S>,
        validator_index: ValidatorIndex,
        attestation: &IndexedAttestation<C>,
    ) -> Result<AttesterSlashingStatus<C>, Error> {
        let source = attestation.data.source.epoch;
        let target = attestation.data.target.epoch;
        let distance = chunk.distance(validator_index, source, db.config())?;

        if distance == NEUTRAL_MIN || u64::from(distance) >= target - source {
            return Ok(AttesterSlashingStatus::NotSlashable);
        }

        // A past attestation with a higher source reaches a lower target, so
        // the incoming attestation surrounds it.
        let min_target = source + u64::from(distance);
        match existing_attestation(db, validator_index, min_target)? {
            Some(existing) => Ok(AttesterSlashingStatus::SurroundsExisting(Box::new(existing))),
            None => Ok(AttesterSlashingStatus::NotSlashable),
        }
    }

    fn update(
        chunk: &mut Chunk,
        chunk_index: usize,
        validator_index: ValidatorIndex,
        start_epoch: Epoch,
        new_target_epoch: Epoch,
        current_epoch: Epoch,
        config: &Config,
    ) -> Result<bool, Error> {
        let min_epoch = config.earliest_tracked_epoch(current_epoch);
        let mut epoch = start_epoch;
        while config.chunk_index(epoch) == chunk_index {
            let new_distance = Chunk::epoch_distance(new_target_epoch, epoch)?;
            if new_distance < chunk.distance(validator_index, epoch, config)? {
                chunk.set_distance(validator_index, epoch, new_distance, config)?;
            } else {
                // Every older cell already holds a tighter bound.
                return Ok(false);
            }
            if epoch == min_epoch {
                return Ok(false);
            }
            epoch -= 1;
        }
        debug_assert_ne!(chunk_index, 0);
        Ok(true)
    }

    fn first_start_epoch(source_epoch: Epoch, _current_epoch: Epoch) -> Option<Epoch> {
        if source_epoch > 0 {
            Some(source_epoch - 1)
        } else {
            None
        }
    }

    fn next_chunk_index_and_start_epoch(
        chunk_index: usize,
        start_epoch: Epoch,
        config: &Config,
    ) -> (usize, Epoch) {
        let chunk_size = config.chunk_size as u64;
        (
            chunk_index.saturating_sub(1),
            start_epoch / chunk_size * chunk_size - 1,
        )
    }
}

pub struct MaxSpan;

impl SpanChunk for MaxSpan {
    const KIND: ChunkKind = ChunkKind::MaxSpan;

    fn check<C: ChainConfig, S: KvStore>(
        chunk: &Chunk,
        db: &ChunkStore<S>,
        validator_index: ValidatorIndex,
        attestation: &IndexedAttestation<C>,
    ) -> Result<AttesterSlashingStatus<C>, Error> {
        let source = attestation.data.source.epoch;
        let target = attestation.data.target.epoch;
        let distance = chunk.distance(validator_index, source, db.config())?;

        if u64::from(distance) <= target - source {
            return Ok(AttesterSlashingStatus::NotSlashable);
        }

        // A past attestation with a lower source reaches past the incoming
        // target, so the incoming attestation is surrounded by it.
        let max_target = source + u64::from(distance);
        match existing_attestation(db, validator_index, max_target)? {
            Some(existing) => Ok(AttesterSlashingStatus::SurroundedByExisting(Box::new(
                existing,
            ))),
            None => Ok(AttesterSlashingStatus::NotSlashable),
        }
    }

    fn update(
        chunk: &mut Chunk,
        chunk_index: usize,
        validator_index: ValidatorIndex,
        start_epoch: Epoch,
        new_target_epoch: Epoch,
        current_epoch: Epoch,
        config: &Config,
    ) -> Result<bool, Error> {
        let mut epoch = start_epoch;
        while config.chunk_index(epoch) == chunk_index {
            let new_distance = Chunk::epoch_distance(new_target_epoch, epoch)?;
            if new_distance > chunk.distance(validator_index, epoch, config)? {
                chunk.set_distance(validator_index, epoch, new_distance, config)?;
            } else {
                // Every younger cell already holds a wider bound.
                return Ok(false);
            }
            if epoch == current_epoch {
                return Ok(false);
            }
            epoch += 1;
        }
        Ok(true)
    }

    fn first_start_epoch(source_epoch: Epoch, current_epoch: Epoch) -> Option<Epoch> {
        if source_epoch < current_epoch {
            Some(source_epoch + 1)
        } else {
            None
        }
    }

    fn next_chunk_index_and_start_epoch(
        chunk_index: usize,
        start_epoch: Epoch,
        config: &Config,
    ) -> (usize, Epoch) {
        let chunk_size = config.chunk_size as u64;
        (chunk_index + 1, (start_epoch / chunk_size + 1) * chunk_size)
    }
}

fn existing_attestation<C: ChainConfig, S: KvStore>(
    db: &ChunkStore<S>,
    validator_index: ValidatorIndex,
    target: Epoch,
) -> Result<Option<IndexedAttestation<C>>, Error> {
    let record = match db.attester_record(validator_index, target)? {
        Some(record) => record,
        None => {
            debug!(
                "span hit for validator {} at target {} has no matching record",
                validator_index, target,
            );
            return Ok(None);
        }
    };
    let existing = db.indexed_attestation::<C>(target, record.signing_root)?;
    if existing.is_none() {
        debug!(
            "attester record for validator {} at target {} has no stored attestation",
            validator_index, target,
        );
    }
    Ok(existing)
}

pub fn get_chunk_for_update<'a, S: KvStore>(
    db: &ChunkStore<S>,
    updated_chunks: &'a mut BTreeMap<usize, Chunk>,
    kind: ChunkKind,
    validator_chunk_index: usize,
    chunk_index: usize,
    config: &Config,
) -> Result<&'a mut Chunk, Error> {
    Ok(match updated_chunks.entry(chunk_index) {
        Entry::Occupied(occupied) => occupied.into_mut(),
        Entry::Vacant(vacant) => {
            let chunk = match db.chunk(kind, validator_chunk_index, chunk_index)? {
                Some(disk_chunk) => disk_chunk,
                None => Chunk::empty(kind, config),
            };
            vacant.insert(chunk)
        }
    })
}

/// Runs both surround checks for one validator and, only when neither fires,
/// walks the chunk neighbourhood updating both span arrays. Updated chunks
/// accumulate in the caller's maps and are committed per validator chunk.
#[allow(clippy::too_many_arguments)]
pub fn apply_attestation_for_validator<C: ChainConfig, S: KvStore>(
    db: &ChunkStore<S>,
    updated_min: &mut BTreeMap<usize, Chunk>,
    updated_max: &mut BTreeMap<usize, Chunk>,
    validator_chunk_index: usize,
    validator_index: ValidatorIndex,
    attestation: &IndexedAttestation<C>,
    current_epoch: Epoch,
) -> Result<AttesterSlashingStatus<C>, Error> {
    let config = db.config().clone();
    let source = attestation.data.source.epoch;
    let source_chunk_index = config.chunk_index(source);

    // The surrounding check wins ties, so the min array goes first.
    let chunk = get_chunk_for_update(
        db,
        updated_min,
        ChunkKind::MinSpan,
        validator_chunk_index,
        source_chunk_index,
        &config,
    )?;
    let status = MinSpan::check(chunk, db, validator_index, attestation)?;
    if status != AttesterSlashingStatus::NotSlashable {
        return Ok(status);
    }

    let chunk = get_chunk_for_update(
        db,
        updated_max,
        ChunkKind::MaxSpan,
        validator_chunk_index,
        source_chunk_index,
        &config,
    )?;
    let status = MaxSpan::check(chunk, db, validator_index, attestation)?;
    if status != AttesterSlashingStatus::NotSlashable {
        return Ok(status);
    }

    update_span_walk::<MinSpan, C, S>(
        db,
        updated_min,
        validator_chunk_index,
        validator_index,
        attestation,
        current_epoch,
        &config,
    )?;
    update_span_walk::<MaxSpan, C, S>(
        db,
        updated_max,
        validator_chunk_index,
        validator_index,
        attestation,
        current_epoch,
        &config,
    )?;

    Ok(AttesterSlashingStatus::NotSlashable)
}

fn update_span_walk<T: SpanChunk, C: ChainConfig, S: KvStore>(
    db: &ChunkStore<S>,
    updated_chunks: &mut BTreeMap<usize, Chunk>,
    validator_chunk_index: usize,
    validator_index: ValidatorIndex,
    attestation: &IndexedAttestation<C>,
    current_epoch: Epoch,
    config: &Config,
) -> Result<(), Error> {
    let source = attestation.data.source.epoch;
    let target = attestation.data.target.epoch;

    let mut start_epoch = match T::first_start_epoch(source, current_epoch) {
        Some(start_epoch) => start_epoch,
        None => return Ok(()),
    };
    let mut chunk_index = config.chunk_index(start_epoch);

    loop {
        let chunk = get_chunk_for_update(
            db,
            updated_chunks,
            T::KIND,
            validator_chunk_index,
            chunk_index,
            config,
        )?;
        let keep_going = T::update(
            chunk,
            chunk_index,
            validator_index,
            start_epoch,
            target,
            current_epoch,
            config,
        )?;
        if !keep_going {
            break;
        }
        let (next_chunk_index, next_start_epoch) =
            T::next_chunk_index_and_start_epoch(chunk_index, start_epoch, config);
        chunk_index = next_chunk_index;
        start_epoch = next_start_epoch;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use types::config::MainnetConfig;

    fn small_config() -> Config {
        Config {
            history_length: 64,
            chunk_size: 4,
            validator_chunk_size: 4,
            chunk_cache_size: 8,
        }
        .validate()
        .expect("config is valid")
    }

    fn db() -> ChunkStore<MemoryStore> {
        ChunkStore::new(Arc::new(MemoryStore::new()), Arc::new(small_config()))
    }

    fn attestation(source: Epoch, target: Epoch) -> IndexedAttestation<MainnetConfig> {
        use types::types::Checkpoint;
        IndexedAttestation {
            data: types::types::AttestationData {
                source: Checkpoint {
                    epoch: source,
                    ..Checkpoint::default()
                },
                target: Checkpoint {
                    epoch: target,
                    ..Checkpoint::default()
                },
                ..Default::default()
            },
            ..IndexedAttestation::default()
        }
    }

    #[test]
    fn chunk_bytes_round_trip() {
        let config = small_config();
        let mut chunk = Chunk::empty(ChunkKind::MaxSpan, &config);
        chunk.set_distance(1, 2, 9, &config).expect("in bounds");

        let bytes = chunk.to_bytes();
        assert_eq!(bytes.len(), config.chunk_byte_len());
        assert_eq!(Chunk::from_bytes(&bytes, &config), Ok(chunk));
    }

    #[test]
    fn epoch_distance_rejects_the_sentinel() {
        assert_eq!(Chunk::epoch_distance(5, 3), Ok(2));
        assert!(Chunk::epoch_distance(3, 5).is_err());
        assert!(Chunk::epoch_distance(u64::from(NEUTRAL_MIN), 0).is_err());
    }

    // After processing (s, t): minSpan[e] <= t - e below s, maxSpan[e] >= t - e
    // in (s, t]; tighter pre-existing bounds survive.
    #[test]
    fn span_updates_are_monotonic() {
        let store = db();
        let config = store.config().clone();
        let mut updated_min = BTreeMap::new();
        let mut updated_max = BTreeMap::new();

        let att = attestation(4, 10);
        let status = apply_attestation_for_validator(
            &store,
            &mut updated_min,
            &mut updated_max,
            0,
            1,
            &att,
            12,
        )
        .expect("span update succeeds");
        assert_eq!(status, AttesterSlashingStatus::NotSlashable);

        for epoch in 0..4 {
            let chunk = &updated_min[&config.chunk_index(epoch)];
            assert_eq!(
                u64::from(chunk.distance(1, epoch, &config).expect("in bounds")),
                10 - epoch,
            );
        }
        for epoch in 5..=10 {
            let chunk = &updated_max[&config.chunk_index(epoch)];
            assert_eq!(
                u64::from(chunk.distance(1, epoch, &config).expect("in bounds")),
                10 - epoch,
            );
        }

        // A second, tighter attestation must not loosen any bound.
        let tighter = attestation(5, 8);
        apply_attestation_for_validator(
            &store,
            &mut updated_min,
            &mut updated_max,
            0,
            1,
            &tighter,
            12,
        )
        .expect("span update succeeds");

        let chunk = &updated_min[&config.chunk_index(3)];
        assert_eq!(chunk.distance(1, 3, &config), Ok(5));
        let chunk = &updated_max[&config.chunk_index(6)];
        assert_eq!(chunk.distance(1, 6, &config), Ok(4));
    }

    #[test]
    fn walk_crosses_chunk_boundaries() {
        let store = db();
        let config = store.config().clone();
        let mut updated_min = BTreeMap::new();
        let mut updated_max = BTreeMap::new();

        // chunk_size is 4, so a span from 1 to 14 touches four chunks.
        let att = attestation(1, 14);
        apply_attestation_for_validator(
            &store,
            &mut updated_min,
            &mut updated_max,
            0,
            0,
            &att,
            14,
        )
        .expect("span update succeeds");

        assert_eq!(updated_min[&config.chunk_index(0)].distance(0, 0, &config), Ok(14));
        assert_eq!(updated_max.len(), 4);
    }
}
