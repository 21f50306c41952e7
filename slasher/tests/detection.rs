use std::sync::Arc;

use slasher::config::Config;
use slasher::records::AttesterRecord;
use slasher::store::{ChunkStore, MemoryStore, WriteBatch};
use slasher::verify::{AcceptAllVerifier, SignatureVerifier};
use slasher::{Slasher, Slashing};
use ssz_types::VariableList;
use types::config::MainnetConfig;
use types::primitives::{Epoch, Slot, ValidatorIndex, H256};
use types::types::{
    AttestationData, BeaconBlockHeader, Checkpoint, IndexedAttestation, SignedBeaconBlockHeader,
};

type TestSlasher<V> = Slasher<MainnetConfig, MemoryStore, V>;

fn slasher() -> TestSlasher<AcceptAllVerifier> {
    let detector = Slasher::open(
        Arc::new(MemoryStore::new()),
        Config::default(),
        AcceptAllVerifier,
    )
    .expect("slasher opens");
    detector.update_current_epoch(10);
    detector
}

fn attestation(
    validators: &[ValidatorIndex],
    source: Epoch,
    target: Epoch,
    root: u8,
) -> IndexedAttestation<MainnetConfig> {
    IndexedAttestation {
        attesting_indices: VariableList::from(validators.to_vec()),
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

fn header(proposer: ValidatorIndex, slot: Slot, body: u8) -> SignedBeaconBlockHeader {
    SignedBeaconBlockHeader {
        message: BeaconBlockHeader {
            slot,
            proposer_index: proposer,
            body_root: H256::repeat_byte(body),
            ..BeaconBlockHeader::default()
        },
        ..SignedBeaconBlockHeader::default()
    }
}

#[test]
fn fresh_attestation_is_not_slashable() {
    let detector = slasher();
    let slashings = detector
        .check_attestation(&attestation(&[1], 3, 5, 0xaa))
        .expect("detection succeeds");
    assert!(slashings.is_empty());
}

#[test]
fn malformed_attestations_are_silently_dropped() {
    let detector = slasher();

    // source >= target
    let inverted = attestation(&[1], 5, 3, 0xaa);
    assert_eq!(detector.check_attestation(&inverted), Ok(vec![]));

    // empty attesting indices
    let empty = attestation(&[], 3, 5, 0xaa);
    assert_eq!(detector.check_attestation(&empty), Ok(vec![]));

    assert_eq!(detector.integrity_reject_count(), 2);
}

// Conflicting roots at the same target are a double vote, detected regardless
// of insertion order.
#[test]
fn double_vote_detection_is_symmetric() {
    for (first_root, second_root) in &[(0xaa, 0xbb), (0xbb, 0xaa)] {
        let detector = slasher();
        let first = attestation(&[7], 3, 5, *first_root);
        let second = attestation(&[7], 3, 5, *second_root);

        assert_eq!(detector.check_attestation(&first), Ok(vec![]));
        let slashings = detector
            .check_attestation(&second)
            .expect("detection succeeds");

        assert_eq!(slashings.len(), 1);
        assert_eq!(slashings[0].validator_indices(), vec![7]);
        match &slashings[0] {
            Slashing::Attester(slashing) => {
                assert_eq!(slashing.attestation_1, first);
                assert_eq!(slashing.attestation_2, second);
            }
            Slashing::Proposer(_) => panic!("expected an attester slashing"),
        }
    }
}

#[test]
fn double_vote_emission_is_idempotent() {
    let detector = slasher();
    let first = attestation(&[7], 3, 5, 0xaa);
    let second = attestation(&[7], 3, 5, 0xbb);

    assert_eq!(detector.check_attestation(&first), Ok(vec![]));
    assert_eq!(
        detector
            .check_attestation(&second)
            .expect("detection succeeds")
            .len(),
        1,
    );
    // The same offending attestation again: the slashable set was already
    // yielded on the first call.
    assert_eq!(detector.check_attestation(&second), Ok(vec![]));
}

// An attestation enclosing a previously signed one is a surrounding vote; the
// emitted pair puts the surrounding attestation first.
#[test]
fn surrounding_vote_is_detected() {
    let detector = slasher();
    let existing = attestation(&[1], 4, 5, 0x01);
    let surrounding = attestation(&[1], 2, 7, 0x02);

    assert_eq!(detector.check_attestation(&existing), Ok(vec![]));
    let slashings = detector
        .check_attestation(&surrounding)
        .expect("detection succeeds");

    assert_eq!(slashings.len(), 1);
    match &slashings[0] {
        Slashing::Attester(slashing) => {
            assert_eq!(slashing.attestation_1, surrounding);
            assert_eq!(slashing.attestation_2, existing);
            // Soundness: attestation_1 strictly encloses attestation_2.
            assert!(slashing.attestation_1.data.source.epoch < slashing.attestation_2.data.source.epoch);
            assert!(slashing.attestation_2.data.target.epoch < slashing.attestation_1.data.target.epoch);
        }
        Slashing::Proposer(_) => panic!("expected an attester slashing"),
    }
}

#[test]
fn surrounded_vote_is_detected() {
    let detector = slasher();
    let existing = attestation(&[1], 2, 7, 0x01);
    let surrounded = attestation(&[1], 4, 5, 0x02);

    assert_eq!(detector.check_attestation(&existing), Ok(vec![]));
    let slashings = detector
        .check_attestation(&surrounded)
        .expect("detection succeeds");

    assert_eq!(slashings.len(), 1);
    match &slashings[0] {
        Slashing::Attester(slashing) => {
            assert_eq!(slashing.attestation_1, existing);
            assert_eq!(slashing.attestation_2, surrounded);
        }
        Slashing::Proposer(_) => panic!("expected an attester slashing"),
    }
}

// A record persisted without its spans (a partially restored database) must
// not fire on its own: detection is driven by the span arrays. Once spans
// exist on either side of the pair, the offence surfaces.
#[test]
fn surround_detection_requires_populated_spans() {
    let detector = slasher();
    let recorded = attestation(&[1], 1, 2, 0x01);
    let surrounding = attestation(&[1], 0, 3, 0x02);

    let mut batch = WriteBatch::new();
    ChunkStore::<MemoryStore>::stage_attester_record(
        &mut batch,
        1,
        AttesterRecord {
            source: 1,
            target: 2,
            signing_root: recorded.data.canonical_root(),
        },
        &recorded,
    );
    detector.db().commit(batch, vec![]).expect("commit succeeds");

    // The record alone does not make the surrounding vote detectable.
    assert_eq!(detector.check_attestation(&surrounding), Ok(vec![]));

    // Resubmitting the recorded attestation runs against spans that now
    // cover the surrounding vote, so the pair is finally detected.
    let slashings = detector
        .check_attestation(&recorded)
        .expect("detection succeeds");
    assert_eq!(slashings.len(), 1);
    match &slashings[0] {
        Slashing::Attester(slashing) => {
            assert_eq!(slashing.attestation_1, surrounding);
            assert_eq!(slashing.attestation_2, recorded);
        }
        Slashing::Proposer(_) => panic!("expected an attester slashing"),
    }
}

#[test]
fn resubmitting_the_same_attestation_is_a_no_op() {
    let detector = slasher();
    let vote = attestation(&[3], 3, 5, 0xaa);

    assert_eq!(detector.check_attestation(&vote), Ok(vec![]));
    assert_eq!(detector.check_attestation(&vote), Ok(vec![]));

    assert_eq!(
        detector.db().attester_record(3, 5).expect("record readable"),
        Some(AttesterRecord {
            source: 3,
            target: 5,
            signing_root: vote.data.canonical_root(),
        }),
    );
}

// Two conflicting headers at the same slot produce one proposer slashing; a
// third header identical to the first produces none.
#[test]
fn double_proposal_is_detected_once() {
    let detector = slasher();
    let first = header(1, 4, 0x01);
    let second = header(1, 4, 0x02);

    assert_eq!(detector.check_proposal(&first), Ok(None));

    let slashing = detector
        .check_proposal(&second)
        .expect("detection succeeds")
        .expect("a slashing is emitted");
    assert_eq!(slashing.validator_indices(), vec![1]);
    match slashing {
        Slashing::Proposer(slashing) => {
            assert_eq!(slashing.signed_header_1, first);
            assert_eq!(slashing.signed_header_2, second);
        }
        Slashing::Attester(_) => panic!("expected a proposer slashing"),
    }

    assert_eq!(detector.check_proposal(&first), Ok(None));
    // And the offending header resubmitted stays quiet as well.
    assert_eq!(detector.check_proposal(&second), Ok(None));
}

#[test]
fn distinct_proposers_at_one_slot_are_independent() {
    let detector = slasher();
    assert_eq!(detector.check_proposal(&header(1, 4, 0x01)), Ok(None));
    assert_eq!(detector.check_proposal(&header(2, 4, 0x02)), Ok(None));
}

// Only the validators present in both attestations are slashed.
#[test]
fn slashable_set_is_the_intersection() {
    let detector = slasher();
    let first = attestation(&[1, 2, 3], 3, 5, 0xaa);
    let second = attestation(&[2, 3, 4], 3, 5, 0xbb);

    assert_eq!(detector.check_attestation(&first), Ok(vec![]));
    let slashings = detector
        .check_attestation(&second)
        .expect("detection succeeds");

    assert_eq!(slashings.len(), 1);
    assert_eq!(slashings[0].validator_indices(), vec![2, 3]);
}

struct RejectAllVerifier;

impl SignatureVerifier<MainnetConfig> for RejectAllVerifier {
    fn verify_indexed_attestation(&self, _: &IndexedAttestation<MainnetConfig>) -> bool {
        false
    }

    fn verify_block_header(&self, _: &SignedBeaconBlockHeader) -> bool {
        false
    }
}

#[test]
fn signature_failures_suppress_slashings() {
    let detector: TestSlasher<RejectAllVerifier> = Slasher::open(
        Arc::new(MemoryStore::new()),
        Config::default(),
        RejectAllVerifier,
    )
    .expect("slasher opens");
    detector.update_current_epoch(10);

    assert_eq!(
        detector.check_attestation(&attestation(&[7], 3, 5, 0xaa)),
        Ok(vec![]),
    );
    assert_eq!(
        detector.check_attestation(&attestation(&[7], 3, 5, 0xbb)),
        Ok(vec![]),
    );
    assert_eq!(detector.check_proposal(&header(1, 4, 0x01)), Ok(None));
    assert_eq!(detector.check_proposal(&header(1, 4, 0x02)), Ok(None));

    assert!(detector.signature_reject_count() >= 2);
}

#[test]
fn epoch_boundary_prunes_expired_history() {
    let detector = slasher();
    let old = attestation(&[1], 3, 5, 0xaa);
    assert_eq!(detector.check_attestation(&old), Ok(vec![]));

    let far_future = 5 + Config::default().history_length as u64;
    detector
        .process_epoch_boundary(far_future)
        .expect("housekeeping succeeds");

    assert_eq!(detector.db().attester_record(1, 5), Ok(None));
}
