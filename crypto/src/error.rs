//! Error types for key handling and the address codec.

use thiserror::Error;

/// Failures in key generation, import, derivation and signing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid private key: {0}")]
    InvalidKeyFormat(String),

    #[error("invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    #[error("invalid derivation path segment '{0}'")]
    InvalidPath(String),

    #[error("key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("system entropy unavailable: {0}")]
    EntropyUnavailable(String),
}

/// Failures decoding a textual address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58 encoding: {0}")]
    InvalidEncoding(String),

    #[error("address checksum mismatch")]
    ChecksumMismatch,

    #[error("address must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unexpected address version byte 0x{0:02x}")]
    InvalidVersion(u8),
}
