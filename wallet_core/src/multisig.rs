//! Multi-signature submission: build once, sign with every key, broadcast once.

use tron_types::KeyPair;

use crate::service::LedgerService;
use crate::token::Token;
use crate::transaction::{broadcast_signed, sign_with_all, UnsignedTransaction};
use crate::WalletError;

/// Native transfer from `from` signed by every key in `keys`, in order.
///
/// Fails with [`WalletError::NoSigners`] before contacting the ledger when
/// `keys` is empty. Whether the signatures satisfy the sender's permission
/// threshold is the ledger's decision.
pub fn create_and_broadcast_multi_signed_transfer(
    service: &impl LedgerService,
    from: &str,
    to: &str,
    amount: u64,
    keys: &[&KeyPair],
) -> Result<String, WalletError> {
    if keys.is_empty() {
        return Err(WalletError::NoSigners);
    }
    let from = tron_crypto::from_base58(from)?;
    let to = tron_crypto::from_base58(to)?;
    let tx = service.build_unsigned_transfer(&from, &to, amount)?;
    submit(service, tx, keys)
}

/// Token transfer from `from` signed by every key in `keys`, in order.
pub fn create_and_broadcast_multi_signed_token_transfer(
    service: &impl LedgerService,
    from: &str,
    token: &Token,
    to: &str,
    amount: u128,
    keys: &[&KeyPair],
) -> Result<String, WalletError> {
    if keys.is_empty() {
        return Err(WalletError::NoSigners);
    }
    let from = tron_crypto::from_base58(from)?;
    let to = tron_crypto::from_base58(to)?;
    let tx = service.build_unsigned_token_transfer(&from, &token.contract, &to, amount)?;
    submit(service, tx, keys)
}

fn submit(
    service: &impl LedgerService,
    tx: UnsignedTransaction,
    keys: &[&KeyPair],
) -> Result<String, WalletError> {
    tracing::debug!(txid = %tx.txid(), signers = keys.len(), "collecting signatures");
    let signed = sign_with_all(tx, keys)?;
    broadcast_signed(service, &signed)
}
