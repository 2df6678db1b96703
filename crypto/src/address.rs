//! Account address derivation and the base58check codec.
//!
//! Address: `0x41 ‖ keccak256(X ‖ Y)[12..32]`, 21 bytes.
//!
//! Text form: base58(payload ‖ checksum) where checksum is the first 4 bytes of
//! SHA-256(SHA-256(payload)). Mainnet addresses render with a leading `T`.

use tron_types::{Address, PublicKey};

use crate::{double_sha256, keccak256, AddressError, CryptoError};

/// Number of checksum bytes appended before base58 encoding.
const CHECKSUM_LEN: usize = 4;

/// Derive the account address of an uncompressed public point.
///
/// Fails with [`CryptoError::InvalidPublicKey`] if the bytes are not an
/// uncompressed point on the curve.
pub fn address_from_public_key(public_key: &PublicKey) -> Result<Address, CryptoError> {
    if public_key.0[0] != PublicKey::UNCOMPRESSED_TAG {
        return Err(CryptoError::InvalidPublicKey(format!(
            "expected uncompressed tag 0x04, got 0x{:02x}",
            public_key.0[0]
        )));
    }
    k256::PublicKey::from_sec1_bytes(public_key.as_bytes())
        .map_err(|_| CryptoError::InvalidPublicKey("point is not on the curve".into()))?;

    let hash = keccak256(public_key.xy());
    let mut account_hash = [0u8; 20];
    account_hash.copy_from_slice(&hash[12..]);
    Ok(Address::from_account_hash(account_hash))
}

/// Append a 4-byte double-SHA-256 checksum and base58-encode.
pub fn encode_base58_check(payload: &[u8]) -> String {
    let checksum = double_sha256(payload);
    let mut buf = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    bs58::encode(buf).into_string()
}

/// Base58-decode and verify the trailing checksum, returning the payload.
///
/// Fails closed: a bad checksum never yields partial bytes.
pub fn decode_base58_check(text: &str) -> Result<Vec<u8>, AddressError> {
    let mut buf = bs58::decode(text)
        .into_vec()
        .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;
    if buf.len() <= CHECKSUM_LEN {
        return Err(AddressError::InvalidEncoding(format!(
            "decoded {} bytes, too short to carry a checksum",
            buf.len()
        )));
    }

    let split = buf.len() - CHECKSUM_LEN;
    let expected = double_sha256(&buf[..split]);
    if buf[split..] != expected[..CHECKSUM_LEN] {
        return Err(AddressError::ChecksumMismatch);
    }
    buf.truncate(split);
    Ok(buf)
}

/// Render an address in its checksummed base58 form.
pub fn to_base58(address: &Address) -> String {
    encode_base58_check(address.as_bytes())
}

/// Parse a checksummed base58 address.
pub fn from_base58(text: &str) -> Result<Address, AddressError> {
    let payload = decode_base58_check(text.trim())?;
    let address = Address::from_slice(&payload).ok_or(AddressError::InvalidLength {
        expected: Address::LEN,
        actual: payload.len(),
    })?;
    if address.version() != Address::VERSION {
        return Err(AddressError::InvalidVersion(address.version()));
    }
    Ok(address)
}

/// Validate that a string is a well-formed base58 address with a correct checksum.
pub fn validate_address(text: &str) -> bool {
    from_base58(text).is_ok()
}
