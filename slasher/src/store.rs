use std::collections::BTreeMap;
use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use ssz::{Decode, Encode};
use types::config::Config as ChainConfig;
use types::primitives::{Epoch, Slot, ValidatorIndex, H256};
use types::types::{IndexedAttestation, SignedBeaconBlockHeader};

use crate::array::{Chunk, ChunkKind};
use crate::config::Config;
use crate::error::Error;
use crate::records::{AttesterRecord, ProposalRecord};

/// Tables of the slasher database.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Column {
    MinSpanChunks,
    MaxSpanChunks,
    AttesterRecords,
    ProposerRecords,
    IndexedAttestations,
    ProposalHeaders,
}

impl Column {
    pub fn for_chunk_kind(kind: ChunkKind) -> Self {
        match kind {
            ChunkKind::MinSpan => Column::MinSpanChunks,
            ChunkKind::MaxSpan => Column::MaxSpanChunks,
        }
    }
}

/// A set of writes applied atomically: all of them land or none do.
#[derive(Default, Debug)]
pub struct WriteBatch {
    pub(crate) puts: Vec<(Column, Vec<u8>, Vec<u8>)>,
    pub(crate) deletes: Vec<(Column, Vec<u8>)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, column: Column, key: Vec<u8>, value: Vec<u8>) {
        self.puts.push((column, key, value));
    }

    pub fn delete(&mut self, column: Column, key: Vec<u8>) {
        self.deletes.push((column, key));
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.deletes.is_empty()
    }
}

/// The transactional key/value engine the chunk store is written against.
/// Engine internals are out of scope; `MemoryStore` backs the tests and any
/// disk-backed engine with atomic batch writes can be dropped in.
pub trait KvStore: Send + Sync {
    fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>, Error>;
    fn write(&self, batch: WriteBatch) -> Result<(), Error>;
    fn keys(&self, column: Column) -> Result<Vec<Vec<u8>>, Error>;
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<Column, BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(self
            .tables
            .read()
            .get(&column)
            .and_then(|table| table.get(key))
            .cloned())
    }

    fn write(&self, batch: WriteBatch) -> Result<(), Error> {
        let mut tables = self.tables.write();
        for (column, key, value) in batch.puts {
            tables.entry(column).or_default().insert(key, value);
        }
        for (column, key) in batch.deletes {
            if let Some(table) = tables.get_mut(&column) {
                table.remove(&key);
            }
        }
        Ok(())
    }

    fn keys(&self, column: Column) -> Result<Vec<Vec<u8>>, Error> {
        Ok(self
            .tables
            .read()
            .get(&column)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default())
    }
}

pub type ChunkKey = (ChunkKind, usize, usize);

struct CachedChunk {
    chunk: Chunk,
    dirty: bool,
}

/// Write-back persistence of span chunks, write-through persistence of
/// detection records. Record batches land in the backing store immediately;
/// updated chunks are staged dirty in an LRU whose eviction hook persists
/// them, and `flush` is invoked at every epoch boundary to make the whole
/// cache clean and durable.
pub struct ChunkStore<S: KvStore> {
    store: Arc<S>,
    config: Arc<Config>,
    cache: Mutex<LruCache<ChunkKey, CachedChunk>>,
}

fn chunk_disk_key(validator_chunk_index: usize, chunk_index: usize) -> [u8; 16] {
    let mut key = [0; 16];
    BigEndian::write_u64(&mut key[..8], validator_chunk_index as u64);
    BigEndian::write_u64(&mut key[8..], chunk_index as u64);
    key
}

fn parse_chunk_disk_key(key: &[u8]) -> Result<(usize, usize), Error> {
    if key.len() != 16 {
        return Err(Error::ChunkCorrupt {
            len: key.len(),
            expected: 16,
        });
    }
    Ok((
        BigEndian::read_u64(&key[..8]) as usize,
        BigEndian::read_u64(&key[8..]) as usize,
    ))
}

fn indexed_attestation_key(target: Epoch, signing_root: H256) -> Vec<u8> {
    let mut key = vec![0; 40];
    BigEndian::write_u64(&mut key[..8], target);
    key[8..].copy_from_slice(signing_root.as_bytes());
    key
}

impl<S: KvStore> ChunkStore<S> {
    pub fn new(store: Arc<S>, config: Arc<Config>) -> Self {
        let cache = Mutex::new(LruCache::new(config.chunk_cache_size));
        Self {
            store,
            config,
            cache,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn chunk(
        &self,
        kind: ChunkKind,
        validator_chunk_index: usize,
        chunk_index: usize,
    ) -> Result<Option<Chunk>, Error> {
        let key = (kind, validator_chunk_index, chunk_index);
        if let Some(cached) = self.cache.lock().get(&key) {
            return Ok(Some(cached.chunk.clone()));
        }

        let disk_key = chunk_disk_key(validator_chunk_index, chunk_index);
        let bytes = match self.store.get(Column::for_chunk_kind(kind), &disk_key)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let chunk = Chunk::from_bytes(&bytes, &self.config)?;
        self.insert_cached(key, chunk.clone(), false)?;
        Ok(Some(chunk))
    }

    /// Applies the record batch atomically, then stages the updated chunks
    /// as dirty cache entries. Nothing is staged if the record write fails,
    /// so the in-memory spans never run ahead of a failed transaction. Chunk
    /// durability comes from eviction and the epoch-boundary flush.
    pub fn commit(
        &self,
        batch: WriteBatch,
        chunks: Vec<(ChunkKey, Chunk)>,
    ) -> Result<(), Error> {
        if !batch.is_empty() {
            self.store.write(batch)?;
        }
        for (key, chunk) in chunks {
            self.insert_cached(key, chunk, true)?;
        }
        Ok(())
    }

    pub fn flush(&self) -> Result<(), Error> {
        let mut cache = self.cache.lock();
        let dirty_keys: Vec<ChunkKey> = cache
            .iter()
            .filter(|(_, cached)| cached.dirty)
            .map(|(key, _)| *key)
            .collect();

        let mut batch = WriteBatch::new();
        for (kind, validator_chunk_index, chunk_index) in dirty_keys.iter().copied() {
            if let Some(cached) = cache.peek(&(kind, validator_chunk_index, chunk_index)) {
                batch.put(
                    Column::for_chunk_kind(kind),
                    chunk_disk_key(validator_chunk_index, chunk_index).to_vec(),
                    cached.chunk.to_bytes(),
                );
            }
        }
        if !batch.is_empty() {
            self.store.write(batch)?;
        }
        for key in dirty_keys {
            if let Some(cached) = cache.get_mut(&key) {
                cached.dirty = false;
            }
        }
        Ok(())
    }

    fn insert_cached(&self, key: ChunkKey, chunk: Chunk, dirty: bool) -> Result<(), Error> {
        let mut cache = self.cache.lock();
        while cache.len() >= self.config.chunk_cache_size {
            match cache.pop_lru() {
                Some(((kind, validator_chunk_index, chunk_index), evicted)) if evicted.dirty => {
                    let mut batch = WriteBatch::new();
                    batch.put(
                        Column::for_chunk_kind(kind),
                        chunk_disk_key(validator_chunk_index, chunk_index).to_vec(),
                        evicted.chunk.to_bytes(),
                    );
                    self.store.write(batch)?;
                }
                Some(_) => {}
                None => break,
            }
        }
        cache.put(key, CachedChunk { chunk, dirty });
        Ok(())
    }

    pub fn attester_record(
        &self,
        validator_index: ValidatorIndex,
        target: Epoch,
    ) -> Result<Option<AttesterRecord>, Error> {
        self.store
            .get(
                Column::AttesterRecords,
                &AttesterRecord::key(validator_index, target),
            )?
            .map(|bytes| AttesterRecord::from_bytes(&bytes))
            .transpose()
    }

    pub fn proposal_record(
        &self,
        validator_index: ValidatorIndex,
        slot: Slot,
    ) -> Result<Option<ProposalRecord>, Error> {
        self.store
            .get(
                Column::ProposerRecords,
                &ProposalRecord::key(validator_index, slot),
            )?
            .map(|bytes| ProposalRecord::from_bytes(&bytes))
            .transpose()
    }

    pub fn indexed_attestation<C: ChainConfig>(
        &self,
        target: Epoch,
        signing_root: H256,
    ) -> Result<Option<IndexedAttestation<C>>, Error> {
        self.store
            .get(
                Column::IndexedAttestations,
                &indexed_attestation_key(target, signing_root),
            )?
            .map(|bytes| IndexedAttestation::from_ssz_bytes(&bytes).map_err(Error::from))
            .transpose()
    }

    pub fn proposal_header(
        &self,
        validator_index: ValidatorIndex,
        slot: Slot,
    ) -> Result<Option<SignedBeaconBlockHeader>, Error> {
        self.store
            .get(
                Column::ProposalHeaders,
                &ProposalRecord::key(validator_index, slot),
            )?
            .map(|bytes| SignedBeaconBlockHeader::from_ssz_bytes(&bytes).map_err(Error::from))
            .transpose()
    }

    pub fn stage_attester_record<C: ChainConfig>(
        batch: &mut WriteBatch,
        validator_index: ValidatorIndex,
        record: AttesterRecord,
        attestation: &IndexedAttestation<C>,
    ) {
        batch.put(
            Column::AttesterRecords,
            AttesterRecord::key(validator_index, record.target).to_vec(),
            record.to_bytes().to_vec(),
        );
        batch.put(
            Column::IndexedAttestations,
            indexed_attestation_key(record.target, record.signing_root),
            attestation.as_ssz_bytes(),
        );
    }

    pub fn stage_proposal_record(
        batch: &mut WriteBatch,
        validator_index: ValidatorIndex,
        record: ProposalRecord,
        header: &SignedBeaconBlockHeader,
    ) {
        batch.put(
            Column::ProposerRecords,
            ProposalRecord::key(validator_index, record.slot).to_vec(),
            record.to_bytes().to_vec(),
        );
        batch.put(
            Column::ProposalHeaders,
            ProposalRecord::key(validator_index, record.slot).to_vec(),
            header.as_ssz_bytes(),
        );
    }

    /// Deletes everything that fell out of the history window. Deletions are
    /// collected first and applied in one batch afterwards.
    pub fn prune(&self, current_epoch: Epoch, slots_per_epoch: u64) -> Result<(), Error> {
        let earliest_epoch = self.config.earliest_tracked_epoch(current_epoch);
        let earliest_slot = earliest_epoch * slots_per_epoch;
        let earliest_chunk = self.config.chunk_index(earliest_epoch);

        let mut batch = WriteBatch::new();
        let mut stale_chunk_keys = Vec::new();

        for column in &[Column::MinSpanChunks, Column::MaxSpanChunks] {
            for key in self.store.keys(*column)? {
                let (validator_chunk_index, chunk_index) = parse_chunk_disk_key(&key)?;
                if chunk_index < earliest_chunk {
                    stale_chunk_keys.push((
                        chunk_kind_for_column(*column),
                        validator_chunk_index,
                        chunk_index,
                    ));
                    batch.delete(*column, key);
                }
            }
        }

        for key in self.store.keys(Column::AttesterRecords)? {
            let (_, target) = AttesterRecord::parse_key(&key)?;
            if target < earliest_epoch {
                batch.delete(Column::AttesterRecords, key);
            }
        }

        for key in self.store.keys(Column::IndexedAttestations)? {
            if key.len() == 40 && BigEndian::read_u64(&key[..8]) < earliest_epoch {
                batch.delete(Column::IndexedAttestations, key);
            }
        }

        for column in &[Column::ProposerRecords, Column::ProposalHeaders] {
            for key in self.store.keys(*column)? {
                let (_, slot) = ProposalRecord::parse_key(&key)?;
                if slot < earliest_slot {
                    batch.delete(*column, key);
                }
            }
        }

        if !batch.is_empty() {
            self.store.write(batch)?;
        }

        let mut cache = self.cache.lock();
        for key in stale_chunk_keys {
            cache.pop(&key);
        }

        Ok(())
    }
}

fn chunk_kind_for_column(column: Column) -> ChunkKind {
    match column {
        Column::MaxSpanChunks => ChunkKind::MaxSpan,
        _ => ChunkKind::MinSpan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::config::MainnetConfig;

    fn chunk_store() -> ChunkStore<MemoryStore> {
        ChunkStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Config::default().validate().expect("default config is valid")),
        )
    }

    #[test]
    fn missing_chunks_read_as_none() {
        let store = chunk_store();
        assert_eq!(store.chunk(ChunkKind::MinSpan, 0, 0), Ok(None));
    }

    #[test]
    fn committed_chunks_read_back() {
        let store = chunk_store();
        let config = store.config().clone();
        let mut chunk = Chunk::empty(ChunkKind::MaxSpan, &config);
        chunk
            .set_distance(3, 7, 9, &config)
            .expect("cell is in bounds");

        store
            .commit(
                WriteBatch::new(),
                vec![((ChunkKind::MaxSpan, 0, 0), chunk.clone())],
            )
            .expect("commit succeeds");

        assert_eq!(store.chunk(ChunkKind::MaxSpan, 0, 0), Ok(Some(chunk)));
    }

    #[test]
    fn flush_makes_staged_chunks_durable() {
        let memory = Arc::new(MemoryStore::new());
        let config = Arc::new(Config::default().validate().expect("default config is valid"));
        let store = ChunkStore::new(Arc::clone(&memory), Arc::clone(&config));

        let mut chunk = Chunk::empty(ChunkKind::MinSpan, &config);
        chunk
            .set_distance(0, 1, 4, &config)
            .expect("cell is in bounds");
        store
            .commit(
                WriteBatch::new(),
                vec![((ChunkKind::MinSpan, 0, 0), chunk.clone())],
            )
            .expect("commit succeeds");

        // Staged only: the backing store has not seen the chunk yet.
        assert_eq!(
            memory.get(Column::MinSpanChunks, &chunk_disk_key(0, 0)),
            Ok(None),
        );

        store.flush().expect("flush succeeds");
        assert_eq!(
            memory.get(Column::MinSpanChunks, &chunk_disk_key(0, 0)),
            Ok(Some(chunk.to_bytes())),
        );

        // A fresh store over the same engine reads the flushed chunk back.
        let reopened = ChunkStore::new(memory, config);
        assert_eq!(reopened.chunk(ChunkKind::MinSpan, 0, 0), Ok(Some(chunk)));
    }

    #[test]
    fn evicting_a_dirty_chunk_persists_it() {
        let memory = Arc::new(MemoryStore::new());
        let config = Arc::new(
            Config {
                chunk_cache_size: 1,
                ..Config::default()
            }
            .validate()
            .expect("config is valid"),
        );
        let store = ChunkStore::new(Arc::clone(&memory), Arc::clone(&config));

        let mut first = Chunk::empty(ChunkKind::MaxSpan, &config);
        first
            .set_distance(2, 3, 7, &config)
            .expect("cell is in bounds");
        let second = Chunk::empty(ChunkKind::MaxSpan, &config);

        store
            .commit(
                WriteBatch::new(),
                vec![((ChunkKind::MaxSpan, 0, 0), first.clone())],
            )
            .expect("commit succeeds");
        store
            .commit(
                WriteBatch::new(),
                vec![((ChunkKind::MaxSpan, 0, 1), second)],
            )
            .expect("commit succeeds");

        // The first chunk was evicted to make room and survived on disk.
        assert_eq!(
            memory.get(Column::MaxSpanChunks, &chunk_disk_key(0, 0)),
            Ok(Some(first.to_bytes())),
        );
        assert_eq!(store.chunk(ChunkKind::MaxSpan, 0, 0), Ok(Some(first)));
    }

    #[test]
    fn undersized_chunk_bytes_are_a_fatal_integrity_error() {
        let memory = Arc::new(MemoryStore::new());
        let config = Arc::new(Config::default().validate().expect("valid"));
        let mut batch = WriteBatch::new();
        batch.put(
            Column::MinSpanChunks,
            chunk_disk_key(0, 0).to_vec(),
            vec![0; 3],
        );
        memory.write(batch).expect("write succeeds");

        let store = ChunkStore::new(memory, config.clone());
        assert_eq!(
            store.chunk(ChunkKind::MinSpan, 0, 0),
            Err(Error::ChunkCorrupt {
                len: 3,
                expected: config.chunk_byte_len(),
            }),
        );
    }

    #[test]
    fn records_survive_the_round_trip() {
        let store = chunk_store();
        let record = AttesterRecord {
            source: 3,
            target: 5,
            signing_root: H256::repeat_byte(0xaa),
        };
        let attestation: IndexedAttestation<MainnetConfig> = IndexedAttestation::default();

        let mut batch = WriteBatch::new();
        ChunkStore::<MemoryStore>::stage_attester_record(&mut batch, 7, record, &attestation);
        store.commit(batch, vec![]).expect("commit succeeds");

        assert_eq!(store.attester_record(7, 5), Ok(Some(record)));
        assert_eq!(store.attester_record(7, 6), Ok(None));
        assert_eq!(
            store.indexed_attestation::<MainnetConfig>(5, record.signing_root),
            Ok(Some(attestation)),
        );
    }

    #[test]
    fn prune_deletes_expired_records() {
        let store = chunk_store();
        let old = AttesterRecord {
            source: 0,
            target: 1,
            signing_root: H256::zero(),
        };
        let fresh = AttesterRecord {
            source: 9_000,
            target: 9_001,
            signing_root: H256::zero(),
        };
        let attestation: IndexedAttestation<MainnetConfig> = IndexedAttestation::default();

        let mut batch = WriteBatch::new();
        ChunkStore::<MemoryStore>::stage_attester_record(&mut batch, 1, old, &attestation);
        ChunkStore::<MemoryStore>::stage_attester_record(&mut batch, 1, fresh, &attestation);
        store.commit(batch, vec![]).expect("commit succeeds");

        store.prune(9_001, 32).expect("prune succeeds");

        assert_eq!(store.attester_record(1, 1), Ok(None));
        assert_eq!(store.attester_record(1, 9_001), Ok(Some(fresh)));
    }
}
