//! secp256k1 key generation and import.

use k256::ecdsa::{SigningKey, VerifyingKey};
use tron_types::{KeyPair, PrivateKey, PublicKey};
use zeroize::Zeroizing;

use crate::CryptoError;

/// Generate a new key pair from the operating system's entropy source.
///
/// Fails only if the entropy source is unavailable.
pub fn generate_keypair() -> Result<KeyPair, CryptoError> {
    loop {
        let mut candidate = Zeroizing::new([0u8; 32]);
        getrandom::getrandom(&mut candidate[..])
            .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;
        // Zero or >= n: draw again.
        if SigningKey::from_slice(&candidate[..]).is_ok() {
            return keypair_from_private(PrivateKey(*candidate));
        }
    }
}

/// Derive the uncompressed public point from a private scalar.
pub fn public_from_private(private: &PrivateKey) -> Result<PublicKey, CryptoError> {
    let signing_key = signing_key(private)?;
    Ok(encode_public(signing_key.verifying_key()))
}

/// Reconstruct a full key pair from a private key.
pub fn keypair_from_private(private: PrivateKey) -> Result<KeyPair, CryptoError> {
    let public = public_from_private(&private)?;
    Ok(KeyPair { public, private })
}

/// Parse a 64-character hex scalar (optional `0x`) into a key pair.
pub fn keypair_from_hex(hex_key: &str) -> Result<KeyPair, CryptoError> {
    let hex_key = hex_key.trim();
    let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
    let bytes = Zeroizing::new(
        hex::decode(hex_key).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?,
    );
    if bytes.len() != 32 {
        return Err(CryptoError::InvalidKeyFormat(format!(
            "private key must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    let mut scalar = [0u8; 32];
    scalar.copy_from_slice(&bytes);
    keypair_from_private(PrivateKey(scalar))
}

/// Build a signing key, rejecting zero and scalars at or above the curve order.
pub(crate) fn signing_key(private: &PrivateKey) -> Result<SigningKey, CryptoError> {
    SigningKey::from_slice(private.as_bytes()).map_err(|_| {
        CryptoError::InvalidKeyFormat("scalar is zero or not below the curve order".into())
    })
}

pub(crate) fn encode_public(verifying_key: &VerifyingKey) -> PublicKey {
    let point = verifying_key.to_encoded_point(false);
    let mut bytes = [0u8; 65];
    bytes.copy_from_slice(point.as_bytes());
    PublicKey(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // secp256k1 group order n.
    const CURVE_ORDER_HEX: &str =
        "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";

    #[test]
    fn generate_produces_valid_keypair() {
        let kp = generate_keypair().unwrap();
        assert_ne!(kp.private.0, [0u8; 32]);
        assert_eq!(kp.public.0[0], PublicKey::UNCOMPRESSED_TAG);
    }

    #[test]
    fn generated_keys_are_unique() {
        let kp1 = generate_keypair().unwrap();
        let kp2 = generate_keypair().unwrap();
        assert_ne!(kp1.private.0, kp2.private.0);
    }

    #[test]
    fn public_from_private_is_deterministic() {
        let kp = generate_keypair().unwrap();
        let pub2 = public_from_private(&kp.private).unwrap();
        assert_eq!(kp.public, pub2);
    }

    #[test]
    fn scalar_one_maps_to_generator() {
        let mut one = [0u8; 32];
        one[31] = 1;
        let kp = keypair_from_private(PrivateKey(one)).unwrap();
        assert_eq!(
            hex::encode(&kp.public.0[1..33]),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn keypair_from_hex_roundtrip() {
        let kp1 = generate_keypair().unwrap();
        let kp2 = keypair_from_hex(&kp1.private.to_hex()).unwrap();
        assert_eq!(kp1.public, kp2.public);
        let kp3 = keypair_from_hex(&format!("0x{}", kp1.private.to_hex())).unwrap();
        assert_eq!(kp1.public, kp3.public);
    }

    #[test]
    fn zero_scalar_rejected() {
        let err = keypair_from_hex(&"00".repeat(32)).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyFormat(_)));
    }

    #[test]
    fn scalar_at_curve_order_rejected() {
        let err = keypair_from_hex(CURVE_ORDER_HEX).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyFormat(_)));
    }

    #[test]
    fn malformed_hex_rejected() {
        assert!(matches!(
            keypair_from_hex("invalid"),
            Err(CryptoError::InvalidKeyFormat(_))
        ));
        assert!(matches!(
            keypair_from_hex("abcd"),
            Err(CryptoError::InvalidKeyFormat(_))
        ));
    }
}
