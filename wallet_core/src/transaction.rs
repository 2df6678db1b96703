//! Unsigned and signed transactions.
//!
//! The transaction id is the SHA-256 of the raw-data bytes and doubles as
//! the signing digest. Signing never changes the raw data, so the id is
//! stable from construction to broadcast.

use serde::{Deserialize, Serialize};
use tron_types::{Address, KeyPair, RecoverableSignature, TxId};

use crate::service::LedgerService;
use crate::WalletError;

/// A transaction as built by the ledger service, before any signature.
#[derive(Clone, Debug, PartialEq)]
pub struct UnsignedTransaction {
    txid: TxId,
    raw_data: serde_json::Value,
    raw_data_bytes: Vec<u8>,
}

impl UnsignedTransaction {
    /// Wrap raw data and compute its id.
    pub fn new(raw_data: serde_json::Value, raw_data_hex: &str) -> Result<Self, WalletError> {
        let raw_data_bytes = hex::decode(raw_data_hex)
            .map_err(|e| WalletError::Node(format!("raw_data_hex is not hex: {e}")))?;
        if raw_data_bytes.is_empty() {
            return Err(WalletError::EmptyTransaction);
        }
        let txid = tron_crypto::hash_raw_transaction(&raw_data_bytes);
        Ok(Self {
            txid,
            raw_data,
            raw_data_bytes,
        })
    }

    /// Like [`UnsignedTransaction::new`], but also checks the id the node
    /// claimed against the one computed locally.
    pub fn with_claimed_txid(
        raw_data: serde_json::Value,
        raw_data_hex: &str,
        claimed: &str,
    ) -> Result<Self, WalletError> {
        let tx = Self::new(raw_data, raw_data_hex)?;
        let computed = tx.txid.to_hex();
        if !claimed.eq_ignore_ascii_case(&computed) {
            return Err(WalletError::TxIdMismatch {
                claimed: claimed.to_string(),
                computed,
            });
        }
        Ok(tx)
    }

    pub fn txid(&self) -> &TxId {
        &self.txid
    }

    /// The digest every signer signs.
    pub fn signing_hash(&self) -> &[u8; 32] {
        self.txid.as_bytes()
    }

    pub fn raw_data(&self) -> &serde_json::Value {
        &self.raw_data
    }

    pub fn raw_data_bytes(&self) -> &[u8] {
        &self.raw_data_bytes
    }

    pub fn raw_data_hex(&self) -> String {
        hex::encode(&self.raw_data_bytes)
    }

    /// Add the first signature.
    pub fn sign(self, key: &KeyPair) -> Result<SignedTransaction, WalletError> {
        let mut signed = SignedTransaction {
            tx: self,
            signatures: Vec::new(),
        };
        signed.sign(key)?;
        Ok(signed)
    }
}

/// A transaction carrying one or more signatures, in signing order.
#[derive(Clone, Debug, PartialEq)]
pub struct SignedTransaction {
    tx: UnsignedTransaction,
    signatures: Vec<RecoverableSignature>,
}

impl SignedTransaction {
    /// Append another signature over the same digest.
    pub fn sign(&mut self, key: &KeyPair) -> Result<(), WalletError> {
        let signature = tron_crypto::sign_digest(self.tx.signing_hash(), &key.private)?;
        tracing::debug!(
            txid = %self.tx.txid,
            signer = %tron_crypto::address_from_public_key(&key.public)
                .map(|a| tron_crypto::to_base58(&a))
                .unwrap_or_default(),
            position = self.signatures.len(),
            "signed transaction"
        );
        self.signatures.push(signature);
        Ok(())
    }

    pub fn txid(&self) -> &TxId {
        self.tx.txid()
    }

    pub fn signing_hash(&self) -> &[u8; 32] {
        self.tx.signing_hash()
    }

    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.tx
    }

    pub fn signatures(&self) -> &[RecoverableSignature] {
        &self.signatures
    }

    /// Addresses recovered from each signature, in signing order.
    pub fn signers(&self) -> Result<Vec<Address>, WalletError> {
        self.signatures
            .iter()
            .map(|sig| {
                tron_crypto::recover_address(self.signing_hash(), sig).map_err(WalletError::from)
            })
            .collect()
    }

    /// Broadcast body in the node's JSON format.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "txID": self.tx.txid.to_hex(),
            "raw_data": self.tx.raw_data,
            "raw_data_hex": self.tx.raw_data_hex(),
            "signature": self.signatures.iter().map(RecoverableSignature::to_hex).collect::<Vec<_>>(),
            "visible": false,
        })
    }
}

/// Sign `tx` with every key in order.
pub fn sign_with_all(
    tx: UnsignedTransaction,
    keys: &[&KeyPair],
) -> Result<SignedTransaction, WalletError> {
    let (first, rest) = keys.split_first().ok_or(WalletError::NoSigners)?;
    let mut signed = tx.sign(first)?;
    for key in rest {
        signed.sign(key)?;
    }
    Ok(signed)
}

/// A node reply that may carry a transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionEnvelope {
    pub ok: bool,
    pub code: String,
    pub message: String,
    pub transaction: Option<UnsignedTransaction>,
}

impl TransactionEnvelope {
    pub fn success(transaction: UnsignedTransaction) -> Self {
        Self::accepted(Some(transaction))
    }

    /// An accepted reply, which may still lack a transaction.
    pub fn accepted(transaction: Option<UnsignedTransaction>) -> Self {
        Self {
            ok: true,
            code: "SUCCESS".to_string(),
            message: String::new(),
            transaction,
        }
    }

    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code.into(),
            message: message.into(),
            transaction: None,
        }
    }

    /// The enclosed transaction, or the rejection as an error.
    pub fn into_transaction(self) -> Result<UnsignedTransaction, WalletError> {
        if !self.ok {
            return Err(WalletError::rejected(self.code, self.message));
        }
        self.transaction.ok_or(WalletError::EmptyTransaction)
    }
}

/// The node's answer to a broadcast.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub accepted: bool,
    pub code: String,
    pub message: String,
}

impl BroadcastResult {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            code: "SUCCESS".to_string(),
            message: String::new(),
        }
    }

    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Broadcast a signed transaction and return its id as lowercase hex.
pub fn broadcast_signed(
    service: &impl LedgerService,
    tx: &SignedTransaction,
) -> Result<String, WalletError> {
    let result = service.broadcast(tx)?;
    if !result.accepted {
        tracing::warn!(txid = %tx.txid(), code = %result.code, message = %result.message, "broadcast rejected");
        return Err(WalletError::rejected(result.code, result.message));
    }
    tracing::info!(txid = %tx.txid(), signatures = tx.signatures().len(), "transaction broadcast");
    Ok(tx.txid().to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> KeyPair {
        tron_crypto::keypair_from_hex(&hex::encode([byte; 32])).unwrap()
    }

    fn address(key: &KeyPair) -> Address {
        tron_crypto::address_from_public_key(&key.public).unwrap()
    }

    fn sample_tx() -> UnsignedTransaction {
        let raw = serde_json::json!({ "contract": [], "timestamp": 1 });
        UnsignedTransaction::new(raw, "0a0b0c0d").unwrap()
    }

    #[test]
    fn txid_is_sha256_of_raw_bytes() {
        let tx = sample_tx();
        let expected = tron_crypto::sha256(&[0x0a, 0x0b, 0x0c, 0x0d]);
        assert_eq!(tx.txid().as_bytes(), &expected);
        assert_eq!(tx.signing_hash(), &expected);
        assert_eq!(tx.raw_data_hex(), "0a0b0c0d");
    }

    #[test]
    fn claimed_txid_checked() {
        let good = sample_tx().txid().to_hex();
        let raw = serde_json::json!({});
        assert!(UnsignedTransaction::with_claimed_txid(raw.clone(), "0a0b0c0d", &good).is_ok());
        assert!(matches!(
            UnsignedTransaction::with_claimed_txid(raw, "0a0b0c0d", &"00".repeat(32)),
            Err(WalletError::TxIdMismatch { .. })
        ));
    }

    #[test]
    fn empty_or_bad_raw_data_rejected() {
        assert!(matches!(
            UnsignedTransaction::new(serde_json::json!({}), ""),
            Err(WalletError::EmptyTransaction)
        ));
        assert!(matches!(
            UnsignedTransaction::new(serde_json::json!({}), "zz"),
            Err(WalletError::Node(_))
        ));
    }

    #[test]
    fn signatures_appended_in_order_and_recoverable() {
        let (k1, k2) = (key(1), key(2));
        let tx = sample_tx();
        let txid = *tx.txid();

        let mut signed = tx.sign(&k1).unwrap();
        signed.sign(&k2).unwrap();

        assert_eq!(signed.txid(), &txid);
        assert_eq!(signed.signatures().len(), 2);
        assert_eq!(signed.signers().unwrap(), vec![address(&k1), address(&k2)]);
    }

    #[test]
    fn signing_is_deterministic() {
        let k = key(7);
        let a = sample_tx().sign(&k).unwrap();
        let b = sample_tx().sign(&k).unwrap();
        assert_eq!(a.signatures(), b.signatures());
    }

    #[test]
    fn sign_with_all_requires_keys() {
        assert!(matches!(
            sign_with_all(sample_tx(), &[]),
            Err(WalletError::NoSigners)
        ));
        let (k1, k2, k3) = (key(1), key(2), key(3));
        let signed = sign_with_all(sample_tx(), &[&k1, &k2, &k3]).unwrap();
        assert_eq!(signed.signatures().len(), 3);
    }

    #[test]
    fn broadcast_json_shape() {
        let signed = sample_tx().sign(&key(1)).unwrap();
        let json = signed.to_json();
        assert_eq!(json["txID"].as_str().unwrap().len(), 64);
        assert_eq!(json["raw_data_hex"], "0a0b0c0d");
        assert_eq!(json["signature"][0].as_str().unwrap().len(), 130);
    }

    #[test]
    fn envelope_outcomes() {
        assert!(TransactionEnvelope::success(sample_tx()).into_transaction().is_ok());
        assert!(matches!(
            TransactionEnvelope::rejected("CONTRACT_VALIDATE_ERROR", "no").into_transaction(),
            Err(WalletError::RemoteRejected { code, .. }) if code == "CONTRACT_VALIDATE_ERROR"
        ));
        assert!(matches!(
            TransactionEnvelope::accepted(None).into_transaction(),
            Err(WalletError::EmptyTransaction)
        ));
    }
}
