//! Fundamental types for the TRON wallet toolkit.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, key material, signatures, transaction identifiers, and network identifiers.

pub mod address;
pub mod hash;
pub mod keys;
pub mod network;

pub use address::Address;
pub use hash::TxId;
pub use keys::{KeyPair, PrivateKey, PublicKey, RecoverableSignature};
pub use network::NetworkId;
