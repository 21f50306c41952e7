use std::sync::mpsc::sync_channel;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use beacon_node::Node;
use log::info;
use slasher::config::Config as SlasherConfig;
use slasher::service::SlasherService;
use slasher::store::MemoryStore;
use ssz_types::VariableList;
use types::{
    beacon_state::BeaconState,
    config::MinimalConfig,
    consts::FAR_FUTURE_EPOCH,
    primitives::H256,
    types::{AttestationData, Checkpoint, IndexedAttestation, Validator},
};

fn interop_state(validators: usize) -> BeaconState<MinimalConfig> {
    let validator = Validator {
        activation_epoch: 0,
        exit_epoch: FAR_FUTURE_EPOCH,
        withdrawable_epoch: FAR_FUTURE_EPOCH,
        effective_balance: 32_000_000_000,
        ..Validator::default()
    };
    BeaconState {
        validators: VariableList::from(vec![validator; validators]),
        balances: VariableList::from(vec![32_000_000_000; validators]),
        ..BeaconState::default()
    }
}

fn vote(validator: u64, target: u64, root: u8) -> IndexedAttestation<MinimalConfig> {
    IndexedAttestation {
        attesting_indices: VariableList::from(vec![validator]),
        data: AttestationData {
            beacon_block_root: H256::repeat_byte(root),
            source: Checkpoint {
                epoch: target - 1,
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

fn main() -> Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;

    let mut node = Node::new(
        interop_state(8),
        Arc::new(MemoryStore::new()),
        SlasherConfig::default(),
    )?;

    let (sink, detected) = sync_channel(64);
    let service = SlasherService::spawn(Arc::clone(node.slasher()), sink, 256)?;

    for slot in 1..=16 {
        node.handle_slot_start(slot)?;
        service.notify_epoch_boundary(node.current_epoch());
    }

    // A validator votes twice for the same target with different roots.
    service.accept_attestation(vote(3, 1, 0xaa));
    service.accept_attestation(vote(3, 1, 0xbb));

    match detected.recv_timeout(Duration::from_secs(5)) {
        Ok(slashing) => node.queue_slashings(vec![slashing]),
        Err(_) => info!("no slashing detected"),
    }

    info!(
        "{} attester slashings pending for inclusion",
        node.pending_attester_slashings(16).len(),
    );

    service.shutdown();
    Ok(())
}
