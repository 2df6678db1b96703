//! Cryptographic primitives for the TRON wallet toolkit.
//!
//! - **secp256k1** key pairs and recoverable ECDSA signatures (RFC 6979, low-S)
//! - **Keccak-256** for address derivation, **SHA-256** for transaction ids and checksums
//! - **BIP-39** mnemonics and **BIP-32** hierarchical derivation along `m/…` paths
//! - Base58check address codec with the `0x41` version byte

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod mnemonic;
pub mod sign;

pub use address::{
    address_from_public_key, decode_base58_check, encode_base58_check, from_base58, to_base58,
    validate_address,
};
pub use error::{AddressError, CryptoError};
pub use hash::{double_sha256, hash_raw_transaction, keccak256, sha256};
pub use keys::{generate_keypair, keypair_from_hex, keypair_from_private, public_from_private};
pub use mnemonic::{
    generate_mnemonic, keypair_from_mnemonic, keypair_from_seed, validate_mnemonic, ChildIndex,
    DerivationPath, DEFAULT_DERIVATION_PATH,
};
pub use sign::{recover_address, recover_public_key, sign_digest, verify_digest};
