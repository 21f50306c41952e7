use typenum::marker_traits::Unsigned;
use types::{
    config::Config,
    primitives::*,
    types::{AttestationData, IndexedAttestation, Validator},
};

use crate::error::Error;

pub fn is_active_validator(validator: &Validator, epoch: Epoch) -> bool {
    validator.activation_epoch <= epoch && epoch < validator.exit_epoch
}

pub fn is_slashable_validator(validator: &Validator, epoch: Epoch) -> bool {
    !validator.slashed
        && validator.activation_epoch <= epoch
        && epoch < validator.withdrawable_epoch
}

pub fn is_slashable_attestation_data(data_1: &AttestationData, data_2: &AttestationData) -> bool {
    // Double vote
    (data_1 != data_2 && data_1.target.epoch == data_2.target.epoch) ||
    // Surround vote
    (data_1.source.epoch < data_2.source.epoch && data_2.target.epoch < data_1.target.epoch)
}

/// Structural validity of an indexed attestation. Signature verification is a
/// separate concern handled by the caller's verifier hook.
pub fn validate_indexed_attestation<C: Config>(
    indexed_attestation: &IndexedAttestation<C>,
) -> Result<(), Error> {
    let indices = &indexed_attestation.attesting_indices;

    if indices.is_empty() {
        return Err(Error::EmptyValidatorIndices);
    }

    if indices.len() > C::MaxValidatorsPerCommittee::to_usize() {
        return Err(Error::MaxIndicesExceeded);
    }

    let is_sorted = indices.windows(2).all(|pair| pair[0] < pair[1]);
    if !is_sorted {
        return Err(Error::BadValidatorIndicesOrdering);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssz_types::VariableList;
    use types::config::MainnetConfig;
    use types::consts::FAR_FUTURE_EPOCH;
    use types::types::Checkpoint;

    fn validator(activation: Epoch, exit: Epoch, withdrawable: Epoch, slashed: bool) -> Validator {
        Validator {
            activation_epoch: activation,
            exit_epoch: exit,
            withdrawable_epoch: withdrawable,
            slashed,
            ..Validator::default()
        }
    }

    #[test]
    fn test_is_active_validator() {
        let v = validator(2, 10, FAR_FUTURE_EPOCH, false);
        assert!(!is_active_validator(&v, 1));
        assert!(is_active_validator(&v, 2));
        assert!(is_active_validator(&v, 9));
        assert!(!is_active_validator(&v, 10));
    }

    #[test]
    fn test_is_slashable_validator() {
        let v = validator(2, 10, 20, false);
        assert!(is_slashable_validator(&v, 5));
        assert!(!is_slashable_validator(&v, 1));
        assert!(!is_slashable_validator(&v, 20));
    }

    #[test]
    fn test_is_slashable_validator_already_slashed() {
        let v = validator(2, 10, 20, true);
        assert!(!is_slashable_validator(&v, 5));
    }

    fn data(source: Epoch, target: Epoch) -> AttestationData {
        AttestationData {
            source: Checkpoint {
                epoch: source,
                ..Checkpoint::default()
            },
            target: Checkpoint {
                epoch: target,
                ..Checkpoint::default()
            },
            ..AttestationData::default()
        }
    }

    #[test]
    fn test_is_slashable_attestation_data_double_vote() {
        let mut other = data(3, 5);
        other.index = 1;
        assert!(is_slashable_attestation_data(&data(3, 5), &other));
        assert!(!is_slashable_attestation_data(&data(3, 5), &data(3, 5)));
    }

    #[test]
    fn test_is_slashable_attestation_data_surround_vote() {
        assert!(is_slashable_attestation_data(&data(1, 6), &data(2, 5)));
        assert!(!is_slashable_attestation_data(&data(2, 5), &data(1, 6)));
    }

    #[test]
    fn test_validate_indexed_attestation_empty_indices() {
        let attestation: IndexedAttestation<MainnetConfig> = IndexedAttestation::default();
        assert_eq!(
            validate_indexed_attestation(&attestation),
            Err(Error::EmptyValidatorIndices)
        );
    }

    #[test]
    fn test_validate_indexed_attestation_bad_ordering() {
        let attestation: IndexedAttestation<MainnetConfig> = IndexedAttestation {
            attesting_indices: VariableList::from(vec![3, 1, 2]),
            ..IndexedAttestation::default()
        };
        assert_eq!(
            validate_indexed_attestation(&attestation),
            Err(Error::BadValidatorIndicesOrdering)
        );
    }

    #[test]
    fn test_validate_indexed_attestation_sorted() {
        let attestation: IndexedAttestation<MainnetConfig> = IndexedAttestation {
            attesting_indices: VariableList::from(vec![1, 2, 3]),
            ..IndexedAttestation::default()
        };
        assert_eq!(validate_indexed_attestation(&attestation), Ok(()));
    }
}
