//! The remote ledger service seam.
//!
//! Every wallet operation takes its ledger service as a parameter, so the
//! HTTP client and in-memory test doubles are interchangeable.

use serde::{Deserialize, Serialize};
use tron_types::Address;

use crate::permission::PermissionUpdate;
use crate::transaction::{BroadcastResult, SignedTransaction, TransactionEnvelope, UnsignedTransaction};
use crate::WalletError;

/// Account record as reported by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    /// Native balance in sun.
    pub balance: u64,
}

/// Bandwidth and energy an account can spend without burning balance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResources {
    pub free_net_used: u64,
    pub free_net_limit: u64,
    pub net_used: u64,
    pub net_limit: u64,
    pub energy_used: u64,
    pub energy_limit: u64,
}

impl AccountResources {
    pub fn available_bandwidth(&self) -> u64 {
        self.free_net_limit.saturating_sub(self.free_net_used)
            + self.net_limit.saturating_sub(self.net_used)
    }

    pub fn available_energy(&self) -> u64 {
        self.energy_limit.saturating_sub(self.energy_used)
    }
}

pub trait LedgerService {
    /// Fails with [`WalletError::AccountNotFound`] when the ledger has no
    /// record for `address`.
    fn get_account(&self, address: &Address) -> Result<AccountInfo, WalletError>;

    fn get_account_resources(&self, address: &Address) -> Result<AccountResources, WalletError>;

    fn build_unsigned_transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<UnsignedTransaction, WalletError>;

    fn build_unsigned_token_transfer(
        &self,
        from: &Address,
        token: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<UnsignedTransaction, WalletError>;

    fn token_balance(&self, token: &Address, owner: &Address) -> Result<u128, WalletError>;

    /// Sun the sender would burn for a native transfer.
    fn estimate_transfer_fee(
        &self,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<u64, WalletError>;

    /// Sun the sender would burn for a token transfer.
    fn estimate_token_transfer_fee(
        &self,
        from: &Address,
        token: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<u64, WalletError>;

    fn submit_permission_update(
        &self,
        update: &PermissionUpdate,
    ) -> Result<TransactionEnvelope, WalletError>;

    fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastResult, WalletError>;
}

/// Reject a record that describes some other account.
pub fn ensure_account_matches(
    queried: &Address,
    info: AccountInfo,
) -> Result<AccountInfo, WalletError> {
    if info.address != *queried {
        tracing::warn!(queried = %queried, returned = %info.address, "account record mismatch");
        return Err(WalletError::AccountNotFound(tron_crypto::to_base58(queried)));
    }
    Ok(info)
}
