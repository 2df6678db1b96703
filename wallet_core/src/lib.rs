//! Wallet core library for TRON-style ledgers.
//!
//! Provides everything a wallet application needs on top of the key and
//! address primitives in `tron-crypto`:
//! - Wallet identity from random keys, private keys or mnemonics
//! - Account permissions with weighted keys, thresholds and capability masks
//! - Transaction signing, single and multi-signature
//! - Native and token transfers, balances and fee estimates
//! - An HTTP client for a full node, behind the [`LedgerService`] trait

pub mod config;
pub mod error;
pub mod fee;
pub mod multisig;
pub mod node_client;
pub mod permission;
pub mod service;
pub mod token;
pub mod transaction;
pub mod wallet;

pub use config::ClientConfig;
pub use error::WalletError;
pub use fee::FeeSchedule;
pub use multisig::{
    create_and_broadcast_multi_signed_token_transfer, create_and_broadcast_multi_signed_transfer,
};
pub use node_client::HttpLedgerClient;
pub use permission::{
    build_permission, build_permission_update, update_account_permission, ActivePermissionSpec,
    Capability, KeySpec, OperationMask, OwnerPermissionSpec, Permission, PermissionKind,
    PermissionSet, PermissionUpdate, WeightedKey, WitnessPermissionSpec,
};
pub use service::{AccountInfo, AccountResources, LedgerService};
pub use token::Token;
pub use transaction::{
    broadcast_signed, sign_with_all, BroadcastResult, SignedTransaction, TransactionEnvelope,
    UnsignedTransaction,
};
pub use wallet::Wallet;
