//! Binary account address: version byte followed by a 20-byte account hash.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 21-byte network address.
///
/// The textual base58check form lives in `tron_crypto::address`; this type only
/// carries the raw bytes. `Display` renders the raw lower-case hex form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; Address::LEN]);

impl Address {
    /// Length of the binary address in bytes.
    pub const LEN: usize = 21;

    /// Version byte prepended to every account hash on this network.
    pub const VERSION: u8 = 0x41;

    /// Wrap raw address bytes. The version byte is not checked.
    pub fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Build an address from the 20-byte account hash, prepending [`Self::VERSION`].
    pub fn from_account_hash(hash: [u8; 20]) -> Self {
        let mut bytes = [0u8; Self::LEN];
        bytes[0] = Self::VERSION;
        bytes[1..].copy_from_slice(&hash);
        Self(bytes)
    }

    /// Parse from a byte slice. Returns `None` on a length mismatch.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; Self::LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Parse the raw hex form (`41…`, 42 characters, optional `0x`).
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).ok()?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    pub fn version(&self) -> u8 {
        self.0[0]
    }

    /// The 20-byte account hash without the version byte.
    pub fn account_hash(&self) -> &[u8] {
        &self.0[1..]
    }

    /// Lower-case hex rendering of all 21 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}
