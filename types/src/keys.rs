//! Cryptographic key types for wallet identity and signing.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// An uncompressed secp256k1 public point: `0x04 ‖ X ‖ Y`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 65]);

/// A 32-byte secp256k1 private scalar (big-endian).
///
/// This type intentionally does not implement `Debug`, `Serialize`, or `Clone`
/// to prevent accidental exposure. Key bytes are zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(pub [u8; 32]);

/// A 65-byte recoverable ECDSA signature: `r ‖ s ‖ v` with `v ∈ {0, 1}`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSignature(pub [u8; 65]);

/// A secp256k1 key pair (public + private).
///
/// Use `tron_crypto::generate_keypair()` or `tron_crypto::keypair_from_private()`
/// to construct key pairs. This struct is intentionally just data.
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl PublicKey {
    /// Leading tag byte of an uncompressed SEC1 point.
    pub const UNCOMPRESSED_TAG: u8 = 0x04;

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// The 64-byte `X ‖ Y` encoding without the tag byte.
    pub fn xy(&self) -> &[u8] {
        &self.0[1..]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}…)", hex::encode(&self.0[..9]))
    }
}

impl PrivateKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lower-case hex of the scalar. Callers own where this ends up.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl RecoverableSignature {
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// The recovery identifier byte.
    pub fn recovery_id(&self) -> u8 {
        self.0[64]
    }

    /// The 64-byte `r ‖ s` part.
    pub fn rs(&self) -> &[u8] {
        &self.0[..64]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RecoverableSignature({}…, v={})",
            hex::encode(&self.0[..8]),
            self.0[64]
        )
    }
}
