use fabric_crypto::CryptoSuite;
use rand::RngCore;

/// Fresh 24-byte nonce for a proposal.
pub fn new_nonce() -> Vec<u8> {
    let mut nonce = vec![0u8; 24];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// `hex(hash(nonce || creator))` using the channel's configured hash
///. `nonce` and `creator` must be the exact bytes later
/// placed in the proposal's `SignatureHeader`, or commit matching
/// breaks.
pub fn compute_tx_id(suite: &CryptoSuite, nonce: &[u8], creator: &[u8]) -> String {
    let mut preimage = Vec::with_capacity(nonce.len() + creator.len());
    preimage.extend_from_slice(nonce);
    preimage.extend_from_slice(creator);
    hex::encode(suite.hash(&preimage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_crypto::CryptoSuiteOptions;

    #[test]
    fn nonce_is_24_bytes_and_varies() {
        let a = new_nonce();
        let b = new_nonce();
        assert_eq!(a.len(), 24);
        assert_ne!(a, b);
    }

    #[test]
    fn tx_id_is_deterministic_for_same_nonce_and_creator() {
        let suite = CryptoSuite::new(CryptoSuiteOptions::default());
        let nonce = vec![1u8; 24];
        let creator = b"Org1MSP::admin".to_vec();
        assert_eq!(
            compute_tx_id(&suite, &nonce, &creator),
            compute_tx_id(&suite, &nonce, &creator)
        );
        assert_ne!(
            compute_tx_id(&suite, &nonce, &creator),
            compute_tx_id(&suite, &vec![2u8; 24], &creator)
        );
    }
}
