use proptest::prelude::*;

use tron_crypto::{decode_base58_check, encode_base58_check, from_base58, to_base58, AddressError};
use tron_types::Address;

proptest! {
    /// decode(encode(p)) == p for every 21-byte payload.
    #[test]
    fn base58_check_roundtrip(payload in prop::array::uniform21(0u8..)) {
        let text = encode_base58_check(&payload);
        prop_assert_eq!(decode_base58_check(&text).unwrap(), payload.to_vec());
    }

    /// Versioned addresses survive the text form.
    #[test]
    fn address_text_roundtrip(hash in prop::array::uniform20(0u8..)) {
        let addr = Address::from_account_hash(hash);
        prop_assert_eq!(from_base58(&to_base58(&addr)).unwrap(), addr);
    }

    /// Flipping any single byte of the payload or checksum makes decoding
    /// fail with a checksum mismatch.
    #[test]
    fn single_byte_flip_rejected(
        payload in prop::array::uniform21(0u8..),
        position in 0usize..25,
        mask in 1u8..=255,
    ) {
        let text = encode_base58_check(&payload);
        let mut raw = bs58::decode(&text).into_vec().unwrap();
        prop_assert_eq!(raw.len(), 25);
        raw[position] ^= mask;
        let tampered = bs58::encode(&raw).into_string();
        prop_assert_eq!(decode_base58_check(&tampered), Err(AddressError::ChecksumMismatch));
    }
}
