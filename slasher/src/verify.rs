use std::time::Instant;

use types::config::Config as ChainConfig;
use types::types::{IndexedAttestation, SignedBeaconBlockHeader};

/// Signature verification consumed by the detector. BLS pairing internals are
/// out of scope; the node wires its crypto stack in through this trait.
pub trait SignatureVerifier<C: ChainConfig>: Send + Sync {
    fn verify_indexed_attestation(&self, attestation: &IndexedAttestation<C>) -> bool;

    fn verify_block_header(&self, header: &SignedBeaconBlockHeader) -> bool;

    /// Batched verification to amortise pairing cost. The default falls back
    /// to per-signature verification and preserves the accept/reject decision
    /// of the single-item hook; entries past the deadline are rejected.
    fn verify_indexed_attestation_batch(
        &self,
        attestations: &[&IndexedAttestation<C>],
        deadline: Option<Instant>,
    ) -> Vec<bool> {
        attestations
            .iter()
            .map(|attestation| {
                if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                    false
                } else {
                    self.verify_indexed_attestation(attestation)
                }
            })
            .collect()
    }
}

/// Accepts every signature. Used where verification is delegated to an
/// earlier pipeline stage, and by tests.
pub struct AcceptAllVerifier;

impl<C: ChainConfig> SignatureVerifier<C> for AcceptAllVerifier {
    fn verify_indexed_attestation(&self, _attestation: &IndexedAttestation<C>) -> bool {
        true
    }

    fn verify_block_header(&self, _header: &SignedBeaconBlockHeader) -> bool {
        true
    }
}
