use thiserror::Error;
use tron_crypto::{AddressError, CryptoError};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("key error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("invalid address: {0}")]
    Address(#[from] AddressError),

    #[error("a permission may hold at most {max} keys, got {actual}")]
    TooManyKeys { max: usize, actual: usize },

    #[error("an account may hold at most {max} active permissions, got {actual}")]
    TooManyActivePermissions { max: usize, actual: usize },

    #[error("key {0} appears more than once in one permission")]
    DuplicateKey(String),

    #[error("key {address} has non-positive weight {weight}")]
    InvalidWeight { address: String, weight: i64 },

    #[error("threshold must be positive, got {0}")]
    InvalidThreshold(i64),

    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    #[error("threshold {threshold} exceeds total key weight {total_weight}")]
    ThresholdUnreachable { threshold: i64, total_weight: i64 },

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("rejected by node ({code}): {message}")]
    RemoteRejected { code: String, message: String },

    #[error("node returned an empty transaction")]
    EmptyTransaction,

    #[error("transaction id {claimed} does not match raw data hash {computed}")]
    TxIdMismatch { claimed: String, computed: String },

    #[error("no signing keys supplied")]
    NoSigners,

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("node RPC error: {0}")]
    Node(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl WalletError {
    pub(crate) fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteRejected {
            code: code.into(),
            message: message.into(),
        }
    }
}
