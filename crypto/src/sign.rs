//! Recoverable ECDSA signing over 32-byte digests.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use tron_types::{Address, PrivateKey, PublicKey, RecoverableSignature};

use crate::address::address_from_public_key;
use crate::keys::{encode_public, signing_key};
use crate::CryptoError;

/// Sign a 32-byte digest, returning `r ‖ s ‖ v`.
///
/// Nonces follow RFC 6979, so the same key and digest always produce the
/// same signature. `s` is normalized to the lower half of the curve order.
pub fn sign_digest(
    digest: &[u8; 32],
    private_key: &PrivateKey,
) -> Result<RecoverableSignature, CryptoError> {
    let key = signing_key(private_key)?;
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    let mut bytes = [0u8; 65];
    bytes[..64].copy_from_slice(&signature.to_bytes());
    bytes[64] = recovery_id.to_byte();
    Ok(RecoverableSignature(bytes))
}

/// Recover the public point that produced `signature` over `digest`.
pub fn recover_public_key(
    digest: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<PublicKey, CryptoError> {
    let sig = Signature::from_slice(signature.rs()).map_err(|_| CryptoError::InvalidSignature)?;
    let recovery_id =
        RecoveryId::from_byte(signature.recovery_id()).ok_or(CryptoError::InvalidSignature)?;
    let verifying_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| CryptoError::InvalidSignature)?;
    Ok(encode_public(&verifying_key))
}

/// Recover the signer's account address.
pub fn recover_address(
    digest: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<Address, CryptoError> {
    let public = recover_public_key(digest, signature)?;
    address_from_public_key(&public)
}

/// Check that `signature` over `digest` was produced by `public_key`.
pub fn verify_digest(
    digest: &[u8; 32],
    signature: &RecoverableSignature,
    public_key: &PublicKey,
) -> bool {
    matches!(recover_public_key(digest, signature), Ok(recovered) if recovered == *public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_keypair, keypair_from_hex};
    use crate::sha256;

    const FIXED_KEY: &str = "88414dbb373a211bc157265a267f3de6a4cec210f3a5da12e89630f2c447ad27";

    #[test]
    fn sign_and_recover() {
        let kp = generate_keypair().unwrap();
        let digest = sha256(b"transfer 10000 sun");
        let sig = sign_digest(&digest, &kp.private).unwrap();
        assert_eq!(recover_public_key(&digest, &sig).unwrap(), kp.public);
        assert!(verify_digest(&digest, &sig, &kp.public));
    }

    #[test]
    fn recovery_id_is_zero_or_one() {
        let kp = generate_keypair().unwrap();
        for i in 0u8..8 {
            let sig = sign_digest(&sha256(&[i]), &kp.private).unwrap();
            assert!(sig.recovery_id() <= 1);
        }
    }

    #[test]
    fn signature_deterministic() {
        let kp = keypair_from_hex(FIXED_KEY).unwrap();
        let digest = sha256(b"deterministic");
        let sig1 = sign_digest(&digest, &kp.private).unwrap();
        let sig2 = sign_digest(&digest, &kp.private).unwrap();
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn wrong_digest_recovers_other_key() {
        let kp = generate_keypair().unwrap();
        let sig = sign_digest(&sha256(b"right"), &kp.private).unwrap();
        assert!(!verify_digest(&sha256(b"wrong"), &sig, &kp.public));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = generate_keypair().unwrap();
        let kp2 = generate_keypair().unwrap();
        let digest = sha256(b"msg");
        let sig = sign_digest(&digest, &kp1.private).unwrap();
        assert!(!verify_digest(&digest, &sig, &kp2.public));
    }

    #[test]
    fn recover_address_matches_derived() {
        let kp = generate_keypair().unwrap();
        let digest = sha256(b"who signed");
        let sig = sign_digest(&digest, &kp.private).unwrap();
        assert_eq!(
            recover_address(&digest, &sig).unwrap(),
            address_from_public_key(&kp.public).unwrap()
        );
    }

    #[test]
    fn garbage_signature_rejected() {
        let digest = sha256(b"x");
        let zero = RecoverableSignature([0u8; 65]);
        assert_eq!(
            recover_public_key(&digest, &zero),
            Err(CryptoError::InvalidSignature)
        );
        let mut bad_v = [1u8; 65];
        bad_v[64] = 9;
        assert_eq!(
            recover_public_key(&digest, &RecoverableSignature(bad_v)),
            Err(CryptoError::InvalidSignature)
        );
    }
}
