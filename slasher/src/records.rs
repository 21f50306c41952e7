use byteorder::{BigEndian, ByteOrder};
use types::primitives::{Epoch, Slot, ValidatorIndex, H256};

use crate::error::Error;

const ATTESTER_RECORD_LEN: usize = 48;
const PROPOSAL_RECORD_LEN: usize = 40;
const RECORD_KEY_LEN: usize = 16;

/// Compact per-validator attestation record, keyed `(validator, target)`.
/// Stored as `(source_epoch_u64_be, target_epoch_u64_be, signing_root_32B)`;
/// the layout is fixed and reproduced byte for byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AttesterRecord {
    pub source: Epoch,
    pub target: Epoch,
    pub signing_root: H256,
}

impl AttesterRecord {
    pub fn key(validator_index: ValidatorIndex, target: Epoch) -> [u8; RECORD_KEY_LEN] {
        record_key(validator_index, target)
    }

    pub fn parse_key(key: &[u8]) -> Result<(ValidatorIndex, Epoch), Error> {
        parse_record_key(key)
    }

    pub fn to_bytes(&self) -> [u8; ATTESTER_RECORD_LEN] {
        let mut bytes = [0; ATTESTER_RECORD_LEN];
        BigEndian::write_u64(&mut bytes[..8], self.source);
        BigEndian::write_u64(&mut bytes[8..16], self.target);
        bytes[16..].copy_from_slice(self.signing_root.as_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != ATTESTER_RECORD_LEN {
            return Err(Error::AttesterRecordCorrupt {
                len: bytes.len(),
                expected: ATTESTER_RECORD_LEN,
            });
        }
        Ok(Self {
            source: BigEndian::read_u64(&bytes[..8]),
            target: BigEndian::read_u64(&bytes[8..16]),
            signing_root: H256::from_slice(&bytes[16..]),
        })
    }
}

/// Compact per-validator proposal record, keyed `(validator, slot)`.
/// Stored as `(slot_u64_be, signing_root_32B)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProposalRecord {
    pub slot: Slot,
    pub signing_root: H256,
}

impl ProposalRecord {
    pub fn key(validator_index: ValidatorIndex, slot: Slot) -> [u8; RECORD_KEY_LEN] {
        record_key(validator_index, slot)
    }

    pub fn parse_key(key: &[u8]) -> Result<(ValidatorIndex, Slot), Error> {
        parse_record_key(key)
    }

    pub fn to_bytes(&self) -> [u8; PROPOSAL_RECORD_LEN] {
        let mut bytes = [0; PROPOSAL_RECORD_LEN];
        BigEndian::write_u64(&mut bytes[..8], self.slot);
        bytes[8..].copy_from_slice(self.signing_root.as_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != PROPOSAL_RECORD_LEN {
            return Err(Error::ProposalRecordCorrupt {
                len: bytes.len(),
                expected: PROPOSAL_RECORD_LEN,
            });
        }
        Ok(Self {
            slot: BigEndian::read_u64(&bytes[..8]),
            signing_root: H256::from_slice(&bytes[8..]),
        })
    }
}

fn record_key(validator_index: ValidatorIndex, ordinal: u64) -> [u8; RECORD_KEY_LEN] {
    let mut key = [0; RECORD_KEY_LEN];
    BigEndian::write_u64(&mut key[..8], validator_index);
    BigEndian::write_u64(&mut key[8..], ordinal);
    key
}

fn parse_record_key(key: &[u8]) -> Result<(ValidatorIndex, u64), Error> {
    if key.len() != RECORD_KEY_LEN {
        return Err(Error::AttesterRecordCorrupt {
            len: key.len(),
            expected: RECORD_KEY_LEN,
        });
    }
    Ok((
        BigEndian::read_u64(&key[..8]),
        BigEndian::read_u64(&key[8..]),
    ))
}
