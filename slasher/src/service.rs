use std::cmp;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};
use rayon::prelude::*;
use types::config::Config as ChainConfig;
use types::primitives::Epoch;
use types::types::{IndexedAttestation, SignedBeaconBlockHeader};

use crate::error::Error;
use crate::store::KvStore;
use crate::verify::SignatureVerifier;
use crate::{Slasher, Slashing};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const MAX_BATCH: usize = 1024;
const MAX_RETRIES: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const MAX_BACKOFF: Duration = Duration::from_secs(1);

/// Cooperative cancellation observed by every long-running loop. In-flight
/// work finishes its current transaction; nothing further is emitted.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

pub enum SlasherMessage<C: ChainConfig> {
    Attestation(Box<IndexedAttestation<C>>),
    BlockHeader(Box<SignedBeaconBlockHeader>),
    EpochBoundary(Epoch),
}

/// Background ingest queue in front of the detector. Inputs arrive over a
/// bounded channel and are drained in batches; attestations of one batch are
/// processed in parallel, with the detector's per-chunk mutexes serialising
/// work that lands on the same validator chunk.
pub struct SlasherService<C: ChainConfig, S: KvStore + 'static, V: SignatureVerifier<C> + 'static> {
    slasher: Arc<Slasher<C, S, V>>,
    sender: SyncSender<SlasherMessage<C>>,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl<C: ChainConfig, S: KvStore + 'static, V: SignatureVerifier<C> + 'static>
    SlasherService<C, S, V>
{
    pub fn spawn(
        slasher: Arc<Slasher<C, S, V>>,
        slashing_sink: SyncSender<Slashing<C>>,
        queue_depth: usize,
    ) -> std::io::Result<Self> {
        let (sender, receiver) = sync_channel(queue_depth);
        let token = CancellationToken::new();

        let worker_slasher = Arc::clone(&slasher);
        let worker_token = token.clone();
        let handle = thread::Builder::new()
            .name("slasher".to_string())
            .spawn(move || run(worker_slasher, receiver, slashing_sink, worker_token))?;

        Ok(Self {
            slasher,
            sender,
            token,
            handle: Some(handle),
        })
    }

    pub fn slasher(&self) -> &Arc<Slasher<C, S, V>> {
        &self.slasher
    }

    /// Queues an attestation, reporting back-pressure instead of blocking the
    /// caller's task.
    pub fn accept_attestation(&self, attestation: IndexedAttestation<C>) -> bool {
        self.accept(SlasherMessage::Attestation(Box::new(attestation)))
    }

    pub fn accept_block_header(&self, header: SignedBeaconBlockHeader) -> bool {
        self.accept(SlasherMessage::BlockHeader(Box::new(header)))
    }

    pub fn notify_epoch_boundary(&self, epoch: Epoch) -> bool {
        self.accept(SlasherMessage::EpochBoundary(epoch))
    }

    fn accept(&self, message: SlasherMessage<C>) -> bool {
        match self.sender.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("slasher queue full, dropping input");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        info!("slasher service stopped");
    }
}

fn run<C: ChainConfig, S: KvStore, V: SignatureVerifier<C>>(
    slasher: Arc<Slasher<C, S, V>>,
    receiver: Receiver<SlasherMessage<C>>,
    slashing_sink: SyncSender<Slashing<C>>,
    token: CancellationToken,
) {
    while !token.is_cancelled() {
        let first = match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(message) => message,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let mut batch = vec![first];
        while batch.len() < MAX_BATCH {
            match receiver.try_recv() {
                Ok(message) => batch.push(message),
                Err(_) => break,
            }
        }

        process_batch(&slasher, batch, &slashing_sink, &token);
    }
}

fn process_batch<C: ChainConfig, S: KvStore, V: SignatureVerifier<C>>(
    slasher: &Slasher<C, S, V>,
    batch: Vec<SlasherMessage<C>>,
    slashing_sink: &SyncSender<Slashing<C>>,
    token: &CancellationToken,
) {
    let mut attestations = Vec::new();
    let mut headers = Vec::new();
    let mut epoch_boundary: Option<Epoch> = None;

    for message in batch {
        match message {
            SlasherMessage::Attestation(attestation) => attestations.push(attestation),
            SlasherMessage::BlockHeader(header) => headers.push(header),
            SlasherMessage::EpochBoundary(epoch) => {
                epoch_boundary = Some(epoch_boundary.map_or(epoch, |seen| cmp::max(seen, epoch)));
            }
        }
    }

    let mut slashings: Vec<Slashing<C>> = attestations
        .par_iter()
        .flat_map_iter(|attestation| {
            if token.is_cancelled() {
                return vec![];
            }
            match retry_with_backoff(|| slasher.check_attestation(attestation), token) {
                Ok(slashings) => slashings,
                Err(error) => {
                    warn!("attestation dropped after retries: {}", error);
                    vec![]
                }
            }
        })
        .collect();

    for header in headers {
        if token.is_cancelled() {
            break;
        }
        match retry_with_backoff(|| slasher.check_proposal(&header), token) {
            Ok(Some(slashing)) => slashings.push(slashing),
            Ok(None) => {}
            Err(error) => warn!("block header dropped after retries: {}", error),
        }
    }

    for slashing in slashings {
        if slashing_sink.send(slashing).is_err() {
            warn!("slashing sink closed, stopping emission");
            break;
        }
    }

    if let Some(epoch) = epoch_boundary {
        if let Err(error) =
            retry_with_backoff(|| slasher.process_epoch_boundary(epoch), token)
        {
            warn!("epoch boundary housekeeping failed: {}", error);
        }
    }
}

/// Retries retryable storage failures with bounded exponential backoff.
/// Non-retryable errors and cancellation surface immediately.
fn retry_with_backoff<T>(
    operation: impl Fn() -> Result<T, Error>,
    token: &CancellationToken,
) -> Result<T, Error> {
    let mut delay = INITIAL_BACKOFF;
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempt += 1;
                if !error.is_retryable() || attempt >= MAX_RETRIES || token.is_cancelled() {
                    return Err(error);
                }
                warn!("retrying after storage failure: {}", error);
                thread::sleep(delay);
                delay = cmp::min(delay * 2, MAX_BACKOFF);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::{Column, MemoryStore, WriteBatch};
    use crate::verify::AcceptAllVerifier;
    use std::sync::atomic::AtomicU64;
    use types::config::MainnetConfig;
    use types::primitives::H256;
    use types::types::{AttestationData, Checkpoint};

    fn attestation(
        validator: u64,
        source: Epoch,
        target: Epoch,
        root: u8,
    ) -> IndexedAttestation<MainnetConfig> {
        IndexedAttestation {
            attesting_indices: ssz_types::VariableList::from(vec![validator]),
            data: AttestationData {
                beacon_block_root: H256::repeat_byte(root),
                source: Checkpoint {
                    epoch: source,
                    ..Checkpoint::default()
                },
                target: Checkpoint {
                    epoch: target,
                    ..Checkpoint::default()
                },
                ..AttestationData::default()
            },
            ..IndexedAttestation::default()
        }
    }

    #[test]
    fn service_detects_a_double_vote_end_to_end() {
        let slasher = Arc::new(
            Slasher::<MainnetConfig, _, _>::open(
                Arc::new(MemoryStore::new()),
                Config::default(),
                AcceptAllVerifier,
            )
            .expect("slasher opens"),
        );
        let (sink, slashings) = sync_channel(16);
        let service = SlasherService::spawn(slasher, sink, 64).expect("service spawns");

        service.slasher().update_current_epoch(6);
        assert!(service.accept_attestation(attestation(7, 3, 5, 0xaa)));
        assert!(service.accept_attestation(attestation(7, 3, 5, 0xbb)));

        let slashing = slashings
            .recv_timeout(Duration::from_secs(5))
            .expect("a slashing is emitted");
        assert_eq!(slashing.validator_indices(), vec![7]);

        service.shutdown();
    }

    /// Fails every write a fixed number of times with a retryable error.
    struct FlakyStore {
        inner: MemoryStore,
        failures_left: AtomicU64,
    }

    impl KvStore for FlakyStore {
        fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
            self.inner.get(column, key)
        }

        fn write(&self, batch: WriteBatch) -> Result<(), Error> {
            let left = self.failures_left.load(Ordering::Relaxed);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::Relaxed);
                return Err(Error::Storage {
                    retryable: true,
                    message: "transient write failure".to_string(),
                });
            }
            self.inner.write(batch)
        }

        fn keys(&self, column: Column) -> Result<Vec<Vec<u8>>, Error> {
            self.inner.keys(column)
        }
    }

    #[test]
    fn retryable_storage_failures_are_retried() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            failures_left: AtomicU64::new(2),
        });
        let slasher = Arc::new(
            Slasher::<MainnetConfig, _, _>::open(store, Config::default(), AcceptAllVerifier)
                .expect("slasher opens"),
        );
        slasher.update_current_epoch(6);

        let token = CancellationToken::new();
        let attestation = attestation(1, 3, 5, 0xaa);
        retry_with_backoff(|| slasher.check_attestation(&attestation), &token)
            .expect("retries succeed eventually");

        assert_eq!(
            slasher.db().attester_record(1, 5).expect("record readable"),
            Some(crate::records::AttesterRecord {
                source: 3,
                target: 5,
                signing_root: attestation.data.canonical_root(),
            }),
        );
    }

    #[test]
    fn cancellation_stops_retries() {
        let token = CancellationToken::new();
        token.cancel();

        let calls = AtomicU64::new(0);
        let result: Result<(), Error> = retry_with_backoff(
            || {
                calls.fetch_add(1, Ordering::Relaxed);
                Err(Error::Storage {
                    retryable: true,
                    message: "always failing".to_string(),
                })
            },
            &token,
        );

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
