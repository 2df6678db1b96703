//! Nullable ledger: an in-memory ledger service.
//!
//! Transactions are registered when built and executed when broadcast. A
//! broadcast is accepted only if the recovered signers satisfy the sending
//! account's owner permission, or an active permission whose mask allows
//! the operation.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};
use tron_types::{Address, TxId};
use tron_wallet_core::fee::{transaction_bandwidth, FeeSchedule};
use tron_wallet_core::token;
use tron_wallet_core::{
    AccountInfo, AccountResources, BroadcastResult, Capability, LedgerService, Permission,
    PermissionUpdate, SignedTransaction, TransactionEnvelope, UnsignedTransaction, WalletError,
};

/// Daily free bandwidth every account starts with.
pub const FREE_BANDWIDTH: u64 = 600;

/// Energy a token transfer to an existing holder consumes.
pub const TOKEN_TRANSFER_ENERGY: u64 = 31_895;

/// Energy a token transfer consumes when the recipient holds none yet.
pub const TOKEN_TRANSFER_NEW_HOLDER_ENERGY: u64 = 64_285;

const BASE_TIMESTAMP_MS: u64 = 1_700_000_000_000;
const EXPIRATION_MS: u64 = 60_000;

struct AccountState {
    balance: u64,
    owner: Permission,
    witness: Option<Permission>,
    actives: Vec<Permission>,
    resources: AccountResources,
}

impl AccountState {
    fn new(address: Address) -> Self {
        Self {
            balance: 0,
            owner: Permission::single_key_owner(address),
            witness: None,
            actives: Vec::new(),
            resources: AccountResources {
                free_net_limit: FREE_BANDWIDTH,
                ..AccountResources::default()
            },
        }
    }

    fn authorizes(&self, capability: Capability, signers: &[Address]) -> bool {
        self.owner.is_satisfied_by(signers)
            || self
                .actives
                .iter()
                .any(|p| p.allows(capability) && p.is_satisfied_by(signers))
    }
}

#[derive(Clone, Debug)]
enum Operation {
    Transfer {
        from: Address,
        to: Address,
        amount: u64,
    },
    TokenTransfer {
        from: Address,
        token: Address,
        to: Address,
        amount: u128,
    },
    PermissionUpdate(PermissionUpdate),
}

impl Operation {
    fn sender(&self) -> Address {
        match self {
            Self::Transfer { from, .. } | Self::TokenTransfer { from, .. } => *from,
            Self::PermissionUpdate(update) => update.owner_address,
        }
    }

    fn capability(&self) -> Capability {
        match self {
            Self::Transfer { .. } => Capability::Transfer,
            Self::TokenTransfer { .. } => Capability::TriggerSmartContract,
            Self::PermissionUpdate(_) => Capability::AccountPermissionUpdate,
        }
    }

    fn parameters(&self) -> Value {
        match self {
            Self::Transfer { from, to, amount } => json!({
                "owner_address": from.to_hex(),
                "to_address": to.to_hex(),
                "amount": amount,
            }),
            Self::TokenTransfer {
                from,
                token: contract,
                to,
                amount,
            } => json!({
                "owner_address": from.to_hex(),
                "contract_address": contract.to_hex(),
                "data": hex::encode(token::encode_transfer_call(to, *amount)),
            }),
            Self::PermissionUpdate(update) => update.to_json(),
        }
    }
}

/// A test ledger that keeps accounts in memory.
pub struct NullLedger {
    accounts: RefCell<HashMap<Address, AccountState>>,
    /// Token balances keyed by (contract, holder).
    tokens: RefCell<HashMap<(Address, Address), u128>>,
    pending: RefCell<HashMap<TxId, Operation>>,
    applied: RefCell<HashSet<TxId>>,
    broadcasts: RefCell<Vec<SignedTransaction>>,
    nonce: Cell<u64>,
    broadcast_rejection: RefCell<Option<(String, String)>>,
    permission_rejection: RefCell<Option<(String, String)>>,
    empty_permission_reply: Cell<bool>,
    fees: FeeSchedule,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::with_fees(FeeSchedule::default())
    }

    pub fn with_fees(fees: FeeSchedule) -> Self {
        Self {
            accounts: RefCell::new(HashMap::new()),
            tokens: RefCell::new(HashMap::new()),
            pending: RefCell::new(HashMap::new()),
            applied: RefCell::new(HashSet::new()),
            broadcasts: RefCell::new(Vec::new()),
            nonce: Cell::new(0),
            broadcast_rejection: RefCell::new(None),
            permission_rejection: RefCell::new(None),
            empty_permission_reply: Cell::new(false),
            fees,
        }
    }

    /// Credit `amount` sun, creating the account if needed.
    pub fn fund(&self, address: &Address, amount: u64) {
        let mut accounts = self.accounts.borrow_mut();
        let account = accounts
            .entry(*address)
            .or_insert_with(|| AccountState::new(*address));
        account.balance = account.balance.saturating_add(amount);
    }

    pub fn create_account(&self, address: &Address) {
        self.fund(address, 0);
    }

    /// Credit `amount` of `token` to `holder`.
    pub fn fund_token(&self, token: &Address, holder: &Address, amount: u128) {
        let mut tokens = self.tokens.borrow_mut();
        let held = tokens.entry((*token, *holder)).or_insert(0);
        *held = held.saturating_add(amount);
    }

    pub fn set_resources(&self, address: &Address, resources: AccountResources) {
        if let Some(account) = self.accounts.borrow_mut().get_mut(address) {
            account.resources = resources;
        }
    }

    /// Make the next broadcast fail with `code` and `message`.
    pub fn reject_next_broadcast(&self, code: &str, message: &str) {
        *self.broadcast_rejection.borrow_mut() = Some((code.to_string(), message.to_string()));
    }

    /// Make the next permission-update request fail with `code` and `message`.
    pub fn reject_next_permission_update(&self, code: &str, message: &str) {
        *self.permission_rejection.borrow_mut() = Some((code.to_string(), message.to_string()));
    }

    /// Make the next permission-update request succeed without a transaction.
    pub fn respond_empty_to_next_permission_update(&self) {
        self.empty_permission_reply.set(true);
    }

    pub fn balance_of(&self, address: &Address) -> u64 {
        self.accounts
            .borrow()
            .get(address)
            .map_or(0, |account| account.balance)
    }

    pub fn token_balance_of(&self, token: &Address, holder: &Address) -> u128 {
        self.tokens
            .borrow()
            .get(&(*token, *holder))
            .copied()
            .unwrap_or(0)
    }

    pub fn owner_permission(&self, address: &Address) -> Option<Permission> {
        self.accounts
            .borrow()
            .get(address)
            .map(|account| account.owner.clone())
    }

    pub fn witness_permission(&self, address: &Address) -> Option<Permission> {
        self.accounts
            .borrow()
            .get(address)
            .and_then(|account| account.witness.clone())
    }

    pub fn active_permissions(&self, address: &Address) -> Vec<Permission> {
        self.accounts
            .borrow()
            .get(address)
            .map(|account| account.actives.clone())
            .unwrap_or_default()
    }

    /// Every transaction handed to `broadcast`, accepted or not.
    pub fn broadcasts(&self) -> Vec<SignedTransaction> {
        self.broadcasts.borrow().clone()
    }

    /// Number of transactions built so far.
    pub fn built(&self) -> u64 {
        self.nonce.get()
    }

    fn has_account(&self, address: &Address) -> bool {
        self.accounts.borrow().contains_key(address)
    }

    fn render(&self, op: &Operation, nonce: u64) -> Result<UnsignedTransaction, WalletError> {
        let timestamp = BASE_TIMESTAMP_MS + nonce;
        let raw_data = json!({
            "contract": [{
                "type": op.capability().name(),
                "parameter": { "value": op.parameters() },
            }],
            "ref_block_num": nonce,
            "timestamp": timestamp,
            "expiration": timestamp + EXPIRATION_MS,
        });
        let bytes = serde_json::to_vec(&raw_data)
            .map_err(|e| WalletError::Node(format!("failed to encode raw data: {e}")))?;
        UnsignedTransaction::new(raw_data, &hex::encode(bytes))
    }

    /// Build and register a transaction for `op`.
    fn issue(&self, op: Operation) -> Result<UnsignedTransaction, WalletError> {
        let nonce = self.nonce.get() + 1;
        self.nonce.set(nonce);
        let tx = self.render(&op, nonce)?;
        tracing::debug!(txid = %tx.txid(), capability = %op.capability(), "null ledger built transaction");
        self.pending.borrow_mut().insert(*tx.txid(), op);
        Ok(tx)
    }

    fn check_transfer(&self, from: &Address, to: &Address, amount: u64) -> Result<(), WalletError> {
        let balance = self
            .accounts
            .borrow()
            .get(from)
            .map(|account| account.balance)
            .ok_or_else(|| validate_error("owner account does not exist"))?;
        if amount == 0 {
            return Err(validate_error("amount must be greater than 0"));
        }
        if from == to {
            return Err(validate_error("cannot transfer to yourself"));
        }
        if balance < amount {
            return Err(validate_error("balance is not sufficient"));
        }
        Ok(())
    }

    fn apply(&self, op: Operation) -> Result<(), String> {
        match op {
            Operation::Transfer { from, to, amount } => {
                let mut accounts = self.accounts.borrow_mut();
                let sender = accounts.get_mut(&from).ok_or("owner account does not exist")?;
                if sender.balance < amount {
                    return Err("balance is not sufficient".into());
                }
                sender.balance -= amount;
                let recipient = accounts
                    .entry(to)
                    .or_insert_with(|| AccountState::new(to));
                recipient.balance = recipient.balance.saturating_add(amount);
            }
            Operation::TokenTransfer {
                from,
                token,
                to,
                amount,
            } => {
                let mut tokens = self.tokens.borrow_mut();
                let held = tokens.entry((token, from)).or_insert(0);
                if *held < amount {
                    return Err("REVERT opcode executed".into());
                }
                *held -= amount;
                let received = tokens.entry((token, to)).or_insert(0);
                *received = received.saturating_add(amount);
            }
            Operation::PermissionUpdate(update) => {
                let mut accounts = self.accounts.borrow_mut();
                let account = accounts
                    .get_mut(&update.owner_address)
                    .ok_or("owner account does not exist")?;
                account.owner = update.owner;
                account.witness = update.witness;
                account.actives = update.actives;
            }
        }
        Ok(())
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_error(message: &str) -> WalletError {
    WalletError::RemoteRejected {
        code: "CONTRACT_VALIDATE_ERROR".to_string(),
        message: message.to_string(),
    }
}

fn has_duplicates(signers: &[Address]) -> bool {
    let mut seen = HashSet::with_capacity(signers.len());
    !signers.iter().all(|s| seen.insert(*s))
}

impl LedgerService for NullLedger {
    fn get_account(&self, address: &Address) -> Result<AccountInfo, WalletError> {
        self.accounts
            .borrow()
            .get(address)
            .map(|account| AccountInfo {
                address: *address,
                balance: account.balance,
            })
            .ok_or_else(|| WalletError::AccountNotFound(tron_crypto::to_base58(address)))
    }

    fn get_account_resources(&self, address: &Address) -> Result<AccountResources, WalletError> {
        Ok(self
            .accounts
            .borrow()
            .get(address)
            .map(|account| account.resources)
            .unwrap_or_default())
    }

    fn build_unsigned_transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<UnsignedTransaction, WalletError> {
        self.check_transfer(from, to, amount)?;
        self.issue(Operation::Transfer {
            from: *from,
            to: *to,
            amount,
        })
    }

    fn build_unsigned_token_transfer(
        &self,
        from: &Address,
        token: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<UnsignedTransaction, WalletError> {
        if !self.has_account(from) {
            return Err(validate_error("owner account does not exist"));
        }
        self.issue(Operation::TokenTransfer {
            from: *from,
            token: *token,
            to: *to,
            amount,
        })
    }

    fn token_balance(&self, token: &Address, owner: &Address) -> Result<u128, WalletError> {
        Ok(self.token_balance_of(token, owner))
    }

    fn estimate_transfer_fee(
        &self,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<u64, WalletError> {
        self.check_transfer(from, to, amount)?;
        let op = Operation::Transfer {
            from: *from,
            to: *to,
            amount,
        };
        let tx = self.render(&op, self.nonce.get() + 1)?;
        let bandwidth = transaction_bandwidth(tx.raw_data_bytes().len(), 1);
        let resources = self.get_account_resources(from)?;
        Ok(self
            .fees
            .transfer_fee(bandwidth, &resources, self.has_account(to)))
    }

    fn estimate_token_transfer_fee(
        &self,
        from: &Address,
        token: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<u64, WalletError> {
        if !self.has_account(from) {
            return Err(validate_error("owner account does not exist"));
        }
        let op = Operation::TokenTransfer {
            from: *from,
            token: *token,
            to: *to,
            amount,
        };
        let tx = self.render(&op, self.nonce.get() + 1)?;
        let bandwidth = transaction_bandwidth(tx.raw_data_bytes().len(), 1);
        let energy = if self.token_balance_of(token, to) == 0 {
            TOKEN_TRANSFER_NEW_HOLDER_ENERGY
        } else {
            TOKEN_TRANSFER_ENERGY
        };
        let resources = self.get_account_resources(from)?;
        Ok(self.fees.contract_call_fee(bandwidth, energy, &resources))
    }

    fn submit_permission_update(
        &self,
        update: &PermissionUpdate,
    ) -> Result<TransactionEnvelope, WalletError> {
        if let Some((code, message)) = self.permission_rejection.borrow_mut().take() {
            return Ok(TransactionEnvelope::rejected(code, message));
        }
        if self.empty_permission_reply.replace(false) {
            return Ok(TransactionEnvelope::accepted(None));
        }
        if !self.has_account(&update.owner_address) {
            return Ok(TransactionEnvelope::rejected(
                "CONTRACT_VALIDATE_ERROR",
                "owner account does not exist",
            ));
        }
        let tx = self.issue(Operation::PermissionUpdate(update.clone()))?;
        Ok(TransactionEnvelope::success(tx))
    }

    fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastResult, WalletError> {
        self.broadcasts.borrow_mut().push(tx.clone());

        if let Some((code, message)) = self.broadcast_rejection.borrow_mut().take() {
            return Ok(BroadcastResult::rejected(code, message));
        }

        let txid = *tx.txid();
        if self.applied.borrow().contains(&txid) {
            return Ok(BroadcastResult::rejected("DUP_TRANSACTION_ERROR", "dup transaction"));
        }
        let Some(op) = self.pending.borrow().get(&txid).cloned() else {
            return Ok(BroadcastResult::rejected(
                "TRANSACTION_EXPIRATION_ERROR",
                "transaction unknown or expired",
            ));
        };

        let Ok(signers) = tx.signers() else {
            return Ok(BroadcastResult::rejected("SIGERROR", "cannot recover signer"));
        };
        if has_duplicates(&signers) {
            return Ok(BroadcastResult::rejected("SIGERROR", "duplicate signature"));
        }

        let authorized = self
            .accounts
            .borrow()
            .get(&op.sender())
            .is_some_and(|account| account.authorizes(op.capability(), &signers));
        if !authorized {
            tracing::debug!(%txid, signers = signers.len(), "null ledger: threshold not met");
            return Ok(BroadcastResult::rejected(
                "SIGERROR",
                "signature weight is below the permission threshold",
            ));
        }

        if let Err(reason) = self.apply(op) {
            return Ok(BroadcastResult::rejected("CONTRACT_VALIDATE_ERROR", reason));
        }
        self.pending.borrow_mut().remove(&txid);
        self.applied.borrow_mut().insert(txid);
        Ok(BroadcastResult::accepted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tron_types::KeyPair;

    fn key(byte: u8) -> KeyPair {
        tron_crypto::keypair_from_hex(&hex::encode([byte; 32])).unwrap()
    }

    fn address(key: &KeyPair) -> Address {
        tron_crypto::address_from_public_key(&key.public).unwrap()
    }

    #[test]
    fn txids_are_unique_and_deterministic() {
        let (a, b) = (key(1), key(2));
        let build = || {
            let ledger = NullLedger::new();
            ledger.fund(&address(&a), 100);
            let first = ledger
                .build_unsigned_transfer(&address(&a), &address(&b), 10)
                .unwrap();
            let second = ledger
                .build_unsigned_transfer(&address(&a), &address(&b), 10)
                .unwrap();
            (*first.txid(), *second.txid())
        };
        let (one, two) = build();
        assert_ne!(one, two);
        assert_eq!(build(), (one, two));
    }

    #[test]
    fn transfer_moves_balance() {
        let (a, b) = (key(1), key(2));
        let ledger = NullLedger::new();
        ledger.fund(&address(&a), 100);
        let tx = ledger
            .build_unsigned_transfer(&address(&a), &address(&b), 40)
            .unwrap();
        let result = ledger.broadcast(&tx.sign(&a).unwrap()).unwrap();
        assert!(result.accepted);
        assert_eq!(ledger.balance_of(&address(&a)), 60);
        assert_eq!(ledger.balance_of(&address(&b)), 40);
    }

    #[test]
    fn wrong_signer_rejected() {
        let (a, b) = (key(1), key(2));
        let ledger = NullLedger::new();
        ledger.fund(&address(&a), 100);
        let tx = ledger
            .build_unsigned_transfer(&address(&a), &address(&b), 40)
            .unwrap();
        let result = ledger.broadcast(&tx.sign(&b).unwrap()).unwrap();
        assert!(!result.accepted);
        assert_eq!(result.code, "SIGERROR");
        assert_eq!(ledger.balance_of(&address(&a)), 100);
    }

    #[test]
    fn replay_rejected() {
        let (a, b) = (key(1), key(2));
        let ledger = NullLedger::new();
        ledger.fund(&address(&a), 100);
        let signed = ledger
            .build_unsigned_transfer(&address(&a), &address(&b), 40)
            .unwrap()
            .sign(&a)
            .unwrap();
        assert!(ledger.broadcast(&signed).unwrap().accepted);
        let again = ledger.broadcast(&signed).unwrap();
        assert_eq!(again.code, "DUP_TRANSACTION_ERROR");
        assert_eq!(ledger.balance_of(&address(&b)), 40);
        assert_eq!(ledger.broadcasts().len(), 2);
    }

    #[test]
    fn build_validates_like_a_node() {
        let (a, b) = (key(1), key(2));
        let ledger = NullLedger::new();
        assert!(matches!(
            ledger.build_unsigned_transfer(&address(&a), &address(&b), 1),
            Err(WalletError::RemoteRejected { .. })
        ));
        ledger.fund(&address(&a), 5);
        assert!(ledger
            .build_unsigned_transfer(&address(&a), &address(&b), 6)
            .is_err());
        assert!(ledger
            .build_unsigned_transfer(&address(&a), &address(&a), 1)
            .is_err());
        assert!(ledger
            .build_unsigned_transfer(&address(&a), &address(&b), 0)
            .is_err());
        assert_eq!(ledger.built(), 0);
    }

    #[test]
    fn token_transfer_without_funds_reverts() {
        let (a, b) = (key(1), key(2));
        let token = Address::from_account_hash([9; 20]);
        let ledger = NullLedger::new();
        ledger.create_account(&address(&a));
        let tx = ledger
            .build_unsigned_token_transfer(&address(&a), &token, &address(&b), 1)
            .unwrap();
        let result = ledger.broadcast(&tx.sign(&a).unwrap()).unwrap();
        assert!(!result.accepted);
        assert!(result.message.contains("REVERT"));
    }

    #[test]
    fn injected_broadcast_rejection_applies_once() {
        let (a, b) = (key(1), key(2));
        let ledger = NullLedger::new();
        ledger.fund(&address(&a), 100);
        ledger.reject_next_broadcast("SERVER_BUSY", "busy");
        let signed = ledger
            .build_unsigned_transfer(&address(&a), &address(&b), 1)
            .unwrap()
            .sign(&a)
            .unwrap();
        assert_eq!(ledger.broadcast(&signed).unwrap().code, "SERVER_BUSY");
        assert!(ledger.broadcast(&signed).unwrap().accepted);
    }

    #[test]
    fn estimate_does_not_register_transactions() {
        let (a, b) = (key(1), key(2));
        let ledger = NullLedger::new();
        ledger.fund(&address(&a), 100);
        let fee = ledger
            .estimate_transfer_fee(&address(&a), &address(&b), 1)
            .unwrap();
        assert_eq!(fee, FeeSchedule::default().account_activation_fee_sun);
        assert_eq!(ledger.built(), 0);
    }
}
