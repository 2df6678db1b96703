//! SHA-256 and Keccak-256 helpers.

use sha2::{Digest, Sha256};
use sha3::Keccak256;
use tron_types::TxId;

/// Compute SHA-256 of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Sha256::digest(data));
    output
}

/// SHA-256 applied twice; the base58check checksum is its first four bytes.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute Keccak-256 (the pre-standard SHA-3 padding) of arbitrary data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Keccak256::digest(data));
    output
}

/// Hash serialized raw transaction bytes to produce the transaction id,
/// which is also the digest every signature commits to.
pub fn hash_raw_transaction(raw_data: &[u8]) -> TxId {
    TxId::new(sha256(raw_data))
}
