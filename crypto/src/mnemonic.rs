//! BIP-39 mnemonics and BIP-32 hierarchical derivation.
//!
//! A mnemonic plus optional passphrase is stretched into a 64-byte seed
//! (PBKDF2-HMAC-SHA512, 2048 rounds). The seed becomes the BIP-32 master
//! extended key, which is then walked one child at a time along a path such
//! as `m/44'/195'/0'/0/0` (195 = TRON coin type). A trailing `'` marks a
//! hardened child.

use bip32::{ChildNumber, XPrv};
use bip39::Mnemonic;
use std::fmt;
use std::str::FromStr;
use tron_types::{KeyPair, PrivateKey};
use zeroize::Zeroizing;

use crate::keys::keypair_from_private;
use crate::CryptoError;

/// BIP-44 path for the first TRON account.
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/195'/0'/0/0";

/// One step of a derivation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildIndex {
    pub index: u32,
    pub hardened: bool,
}

/// A parsed `m/…` derivation path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DerivationPath(Vec<ChildIndex>);

impl DerivationPath {
    pub fn children(&self) -> &[ChildIndex] {
        &self.0
    }
}

impl FromStr for DerivationPath {
    type Err = CryptoError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let mut segments = path.trim().split('/');
        match segments.next() {
            Some("m") | Some("M") => {}
            other => return Err(CryptoError::InvalidPath(other.unwrap_or_default().into())),
        }

        let mut children = Vec::new();
        for segment in segments {
            let (digits, hardened) = match segment.strip_suffix('\'') {
                Some(digits) => (digits, true),
                None => (segment, false),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CryptoError::InvalidPath(segment.into()));
            }
            // All digits by now, so the only parse failure is overflow.
            let index = digits.parse::<u32>().map_err(|_| {
                CryptoError::DerivationFailed(format!("child index out of range: {segment}"))
            })?;
            children.push(ChildIndex { index, hardened });
        }
        Ok(Self(children))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for child in &self.0 {
            write!(f, "/{}", child.index)?;
            if child.hardened {
                f.write_str("'")?;
            }
        }
        Ok(())
    }
}

/// Generate a new BIP-39 mnemonic with 12, 15, 18, 21 or 24 words.
pub fn generate_mnemonic(word_count: usize) -> Result<String, CryptoError> {
    let entropy_bits = match word_count {
        12 => 128,
        15 => 160,
        18 => 192,
        21 => 224,
        24 => 256,
        other => {
            return Err(CryptoError::InvalidMnemonic(format!(
                "unsupported word count {other}"
            )))
        }
    };
    let mut entropy = Zeroizing::new(vec![0u8; entropy_bits / 8]);
    getrandom::getrandom(&mut entropy[..])
        .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;
    let mnemonic = Mnemonic::from_entropy(&entropy[..])
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
    Ok(mnemonic.to_string())
}

/// Validate that a phrase is a well-formed BIP-39 mnemonic.
pub fn validate_mnemonic(mnemonic: &str) -> bool {
    Mnemonic::parse_normalized(mnemonic).is_ok()
}

/// Walk `path` from the BIP-32 master key of `seed`.
///
/// `seed` must be 16 to 64 bytes, as BIP-32 requires.
pub fn keypair_from_seed(seed: &[u8], path: &DerivationPath) -> Result<KeyPair, CryptoError> {
    let mut xprv = XPrv::new(seed).map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;

    for child in path.children() {
        let number = ChildNumber::new(child.index, child.hardened).map_err(|e| {
            CryptoError::DerivationFailed(format!("child index {}: {e}", child.index))
        })?;
        xprv = xprv
            .derive_child(number)
            .map_err(|e| CryptoError::DerivationFailed(format!("at index {}: {e}", child.index)))?;
    }

    let mut scalar = [0u8; 32];
    scalar.copy_from_slice(&xprv.to_bytes());
    keypair_from_private(PrivateKey(scalar))
}

/// Derive a key pair from a mnemonic, a derivation path and a passphrase.
///
/// Deterministic: the same three inputs always yield the same key pair.
pub fn keypair_from_mnemonic(
    mnemonic: &str,
    derivation_path: &str,
    passphrase: &str,
) -> Result<KeyPair, CryptoError> {
    let path: DerivationPath = derivation_path.parse()?;
    let mnemonic = Mnemonic::parse_normalized(mnemonic)
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
    let seed = Zeroizing::new(mnemonic.to_seed_normalized(passphrase));
    keypair_from_seed(&seed[..], &path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_12: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn bip32_vector1_seed() -> Vec<u8> {
        hex::decode("000102030405060708090a0b0c0d0e0f").unwrap()
    }

    #[test]
    fn parse_default_path() {
        let path: DerivationPath = DEFAULT_DERIVATION_PATH.parse().unwrap();
        assert_eq!(
            path.children(),
            &[
                ChildIndex { index: 44, hardened: true },
                ChildIndex { index: 195, hardened: true },
                ChildIndex { index: 0, hardened: true },
                ChildIndex { index: 0, hardened: false },
                ChildIndex { index: 0, hardened: false },
            ]
        );
        assert_eq!(path.to_string(), DEFAULT_DERIVATION_PATH);
    }

    #[test]
    fn bare_master_path_has_no_children() {
        let path: DerivationPath = "m".parse().unwrap();
        assert!(path.children().is_empty());
    }

    #[test]
    fn non_numeric_segment_rejected() {
        let err = "m/44'/abc/0".parse::<DerivationPath>().unwrap_err();
        assert_eq!(err, CryptoError::InvalidPath("abc".into()));
        assert!(matches!(
            "m/44'/-1".parse::<DerivationPath>(),
            Err(CryptoError::InvalidPath(_))
        ));
        assert!(matches!(
            "m/44''".parse::<DerivationPath>(),
            Err(CryptoError::InvalidPath(_))
        ));
        assert!(matches!(
            "m//0".parse::<DerivationPath>(),
            Err(CryptoError::InvalidPath(_))
        ));
    }

    #[test]
    fn oversized_numeric_segment_fails_derivation() {
        assert!(matches!(
            "m/4294967296".parse::<DerivationPath>(),
            Err(CryptoError::DerivationFailed(_))
        ));
        assert!(matches!(
            keypair_from_mnemonic(ABANDON_12, "m/44'/99999999999'", ""),
            Err(CryptoError::DerivationFailed(_))
        ));
    }

    #[test]
    fn missing_master_marker_rejected() {
        assert!(matches!(
            "44'/195'".parse::<DerivationPath>(),
            Err(CryptoError::InvalidPath(_))
        ));
    }

    #[test]
    fn out_of_range_child_index_fails_derivation() {
        let path: DerivationPath = "m/2147483648'".parse().unwrap();
        let err = keypair_from_seed(&bip32_vector1_seed(), &path).unwrap_err();
        assert!(matches!(err, CryptoError::DerivationFailed(_)));
    }

    #[test]
    fn bip32_vector1_master_key() {
        let path: DerivationPath = "m".parse().unwrap();
        let kp = keypair_from_seed(&bip32_vector1_seed(), &path).unwrap();
        assert_eq!(
            kp.private.to_hex(),
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
        );
    }

    #[test]
    fn bip32_vector1_hardened_child() {
        let path: DerivationPath = "m/0'".parse().unwrap();
        let kp = keypair_from_seed(&bip32_vector1_seed(), &path).unwrap();
        assert_eq!(
            kp.private.to_hex(),
            "edb2e14f9ee77d26dd93b4ecede8d16ed408ce149b6cd80b0715a2d911a0afea"
        );
    }

    #[test]
    fn mnemonic_derivation_is_deterministic() {
        let kp1 = keypair_from_mnemonic(ABANDON_12, DEFAULT_DERIVATION_PATH, "").unwrap();
        let kp2 = keypair_from_mnemonic(ABANDON_12, DEFAULT_DERIVATION_PATH, "").unwrap();
        assert_eq!(kp1.private.0, kp2.private.0);
        assert_eq!(kp1.public, kp2.public);
    }

    #[test]
    fn passphrase_changes_key() {
        let plain = keypair_from_mnemonic(ABANDON_12, DEFAULT_DERIVATION_PATH, "").unwrap();
        let salted = keypair_from_mnemonic(ABANDON_12, DEFAULT_DERIVATION_PATH, "TREZOR").unwrap();
        assert_ne!(plain.public, salted.public);
    }

    #[test]
    fn path_changes_key() {
        let first = keypair_from_mnemonic(ABANDON_12, "m/44'/195'/0'/0/0", "").unwrap();
        let second = keypair_from_mnemonic(ABANDON_12, "m/44'/195'/0'/0/1", "").unwrap();
        assert_ne!(first.public, second.public);
    }

    #[test]
    fn invalid_path_reported_before_mnemonic() {
        let err = keypair_from_mnemonic(ABANDON_12, "m/x", "").unwrap_err();
        assert_eq!(err, CryptoError::InvalidPath("x".into()));
    }

    #[test]
    fn invalid_mnemonic_rejected() {
        assert!(matches!(
            keypair_from_mnemonic("not a valid mnemonic", DEFAULT_DERIVATION_PATH, ""),
            Err(CryptoError::InvalidMnemonic(_))
        ));
        assert!(!validate_mnemonic(""));
    }

    #[test]
    fn generate_supported_word_counts() {
        for count in [12, 15, 18, 21, 24] {
            let phrase = generate_mnemonic(count).unwrap();
            assert_eq!(phrase.split_whitespace().count(), count);
            assert!(validate_mnemonic(&phrase));
        }
    }

    #[test]
    fn generate_rejects_unsupported_word_count() {
        assert!(matches!(
            generate_mnemonic(13),
            Err(CryptoError::InvalidMnemonic(_))
        ));
    }
}
